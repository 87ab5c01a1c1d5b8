//! MJPEG server listener
//!
//! Owns the listening socket, the producer threads and the shutdown signal.
//! Connections are served by axum; this module ties their lifetime to the
//! producers and to the caller's shutdown future.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use crate::error::{Error, ProducerError, Result};
use crate::producer::{self, CapturePipeline, FrameEncoder, FrameSource, ProducerConfig, ProducerHandle};
use crate::registry::StreamRegistry;
use crate::server::config::ServerConfig;
use crate::server::page::render_index;
use crate::server::router::{router, AppState};
use crate::server::shutdown::Shutdown;

/// MJPEG streaming server
pub struct MjpegServer {
    config: ServerConfig,
    registry: Arc<StreamRegistry>,
    notify_shutdown: watch::Sender<bool>,
    producers: Vec<ProducerHandle>,
    failures_tx: mpsc::UnboundedSender<ProducerError>,
    failures_rx: Option<mpsc::UnboundedReceiver<ProducerError>>,
}

impl MjpegServer {
    /// Create a new server serving the streams of `registry`
    pub fn new(config: ServerConfig, registry: Arc<StreamRegistry>) -> Self {
        let (notify_shutdown, _) = watch::channel(false);
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();

        Self {
            config,
            registry,
            notify_shutdown,
            producers: Vec::new(),
            failures_tx,
            failures_rx: Some(failures_rx),
        }
    }

    /// Start a supervised producer thread tied to this server's lifetime
    ///
    /// The producer stops when the server shuts down; if it fails for good,
    /// the server shuts down with its error.
    pub fn spawn_producer<F, S, E>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        config: ProducerConfig,
    ) -> Result<()>
    where
        F: FnMut() -> std::result::Result<CapturePipeline<S, E>, ProducerError> + Send + 'static,
        S: FrameSource,
        E: FrameEncoder,
    {
        let handle = producer::spawn_producer(
            name,
            factory,
            config,
            Shutdown::new(self.notify_shutdown.subscribe()),
            self.failures_tx.clone(),
        )?;
        self.producers.push(handle);
        Ok(())
    }

    /// Run the server
    ///
    /// This method blocks until a producer fails permanently.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes
    pub async fn serve<F>(mut self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            streams = self.registry.stream_count(),
            "MJPEG server listening"
        );

        let state = AppState::new(
            Arc::clone(&self.registry),
            render_index(&self.config.page_title, &self.registry),
            self.config.max_connections,
            self.notify_shutdown.subscribe(),
        );
        let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

        let mut stopping = self.notify_shutdown.subscribe();
        let server = axum::serve(listener, app)
            .tcp_nodelay(self.config.tcp_nodelay)
            .with_graceful_shutdown(async move {
                let _ = stopping.wait_for(|stop| *stop).await;
            })
            .into_future();
        tokio::pin!(server);

        let mut failures = self.failures_rx.take();
        let producer_failure = async {
            match failures.as_mut() {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };

        let (result, stopped) = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                (Ok(()), false)
            }
            Some(err) = producer_failure => {
                tracing::error!(error = %err, "Producer failed, shutting down");
                (Err(Error::Producer(err)), false)
            }
            served = &mut server => (served.map_err(Error::from), true),
        };

        self.log_stream_stats();

        // Stop accepting, end every session and wake the producers
        self.notify_shutdown.send_replace(true);
        self.registry.close_all();

        if !stopped {
            match tokio::time::timeout(self.config.shutdown_timeout, &mut server).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "Server error while draining"),
                Err(_) => tracing::warn!("Timed out waiting for connections to close"),
            }
        }

        self.join_producers().await;

        tracing::info!("MJPEG server stopped");
        result
    }

    fn log_stream_stats(&self) {
        for entry in self.registry.entries() {
            if let Some(stats) = self.registry.get_stream_stats(&entry.path) {
                tracing::debug!(
                    stream = %entry.path,
                    subscribers = stats.subscriber_count,
                    version = stats.version,
                    last_frame_size = stats.last_frame_size,
                    "Stream stats"
                );
            }
        }
    }

    async fn join_producers(&mut self) {
        let producers = std::mem::take(&mut self.producers);
        if producers.is_empty() {
            return;
        }

        let joined = tokio::task::spawn_blocking(move || {
            producers
                .into_iter()
                .map(|handle| (handle.name().to_string(), handle.join()))
                .collect::<Vec<_>>()
        })
        .await;

        match joined {
            Ok(all) => {
                for (name, stats) in all {
                    tracing::debug!(
                        producer = %name,
                        captures = stats.captures,
                        restarts = stats.restarts,
                        "Producer joined"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to join producers"),
        }
    }
}
