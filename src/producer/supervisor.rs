//! Producer supervision
//!
//! Each producer runs on its own OS thread because captures block. When a
//! pipeline fails it is rebuilt (reopening the source) after a backoff.
//! Once the restart budget is used up, the failure is reported to the
//! server, which shuts every stream down.
//!
//! Viewers never influence any of this: publishing does not wait on them.

use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::ProducerError;
use crate::server::shutdown::Shutdown;
use crate::stats::ProducerStats;

use super::encoder::FrameEncoder;
use super::pipeline::{CapturePipeline, ProducerConfig};
use super::source::FrameSource;

/// Handle to a running producer thread
#[derive(Debug)]
pub struct ProducerHandle {
    name: String,
    thread: JoinHandle<ProducerStats>,
}

impl ProducerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the thread exits
    pub fn join(self) -> ProducerStats {
        match self.thread.join() {
            Ok(stats) => stats,
            Err(_) => {
                tracing::error!(producer = %self.name, "Producer thread panicked");
                ProducerStats::default()
            }
        }
    }
}

/// Start a supervised producer thread
///
/// `factory` builds a fresh pipeline; it is called again after every
/// failure. A fatal failure is sent on `failures`.
pub fn spawn_producer<F, S, E>(
    name: impl Into<String>,
    mut factory: F,
    config: ProducerConfig,
    shutdown: Shutdown,
    failures: mpsc::UnboundedSender<ProducerError>,
) -> std::io::Result<ProducerHandle>
where
    F: FnMut() -> Result<CapturePipeline<S, E>, ProducerError> + Send + 'static,
    S: FrameSource,
    E: FrameEncoder,
{
    let name = name.into();
    let thread_name = name.clone();

    let thread = std::thread::Builder::new()
        .name(format!("producer-{}", name))
        .spawn(move || supervise(&thread_name, &mut factory, &config, &shutdown, &failures))?;

    Ok(ProducerHandle { name, thread })
}

fn supervise<F, S, E>(
    name: &str,
    factory: &mut F,
    config: &ProducerConfig,
    shutdown: &Shutdown,
    failures: &mpsc::UnboundedSender<ProducerError>,
) -> ProducerStats
where
    F: FnMut() -> Result<CapturePipeline<S, E>, ProducerError>,
    S: FrameSource,
    E: FrameEncoder,
{
    let mut total = ProducerStats::new();
    let mut backoff = config.restart_backoff;
    // Failures since the last run that captured anything
    let mut consecutive = 0u32;

    tracing::info!(producer = %name, "Producer started");

    loop {
        let mut healthy = false;
        let result = factory().and_then(|mut pipeline| {
            let result = pipeline.run(shutdown);
            healthy = pipeline.stats().captures > 0;
            accumulate(&mut total, pipeline.stats());
            result
        });

        let err = match result {
            Ok(()) => break,
            Err(_) if shutdown.is_shutdown() => break,
            Err(err) => err,
        };

        if healthy {
            consecutive = 0;
            backoff = config.restart_backoff;
        }

        if consecutive >= config.max_restarts {
            tracing::error!(
                producer = %name,
                restarts = consecutive,
                error = %err,
                "Producer failed permanently"
            );
            let report = ProducerError::RestartsExhausted {
                restarts: consecutive,
                last: err.to_string(),
            };
            if failures.send(report).is_err() {
                tracing::debug!(producer = %name, "Server gone, failure not reported");
            }
            break;
        }

        consecutive += 1;
        total.restarts += 1;
        tracing::warn!(
            producer = %name,
            attempt = consecutive,
            backoff_ms = backoff.as_millis() as u64,
            error = %err,
            "Producer failed, restarting"
        );

        if sleep_unless_shutdown(backoff, shutdown) {
            break;
        }
        backoff = backoff.saturating_mul(2);
    }

    tracing::info!(
        producer = %name,
        captures = total.captures,
        primary_frames = total.primary_frames,
        crop_frames = total.crop_frames,
        restarts = total.restarts,
        "Producer stopped"
    );

    total
}

fn accumulate(total: &mut ProducerStats, run: &ProducerStats) {
    total.captures += run.captures;
    total.primary_frames += run.primary_frames;
    total.crop_frames += run.crop_frames;
    total.bytes_published += run.bytes_published;
}

/// Sleep in short steps; returns true if shutdown was signalled
fn sleep_unless_shutdown(duration: Duration, shutdown: &Shutdown) -> bool {
    const STEP: Duration = Duration::from_millis(50);
    let mut remaining = duration;

    while !remaining.is_zero() {
        if shutdown.is_shutdown() {
            return true;
        }
        let step = remaining.min(STEP);
        std::thread::sleep(step);
        remaining -= step;
    }

    shutdown.is_shutdown()
}
