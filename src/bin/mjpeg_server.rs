//! MJPEG streaming server
//!
//! Serves a synthetic test pattern so the server can be tried without a
//! camera.
//!
//! ```text
//! mjpeg-server                               # single 480x270 stream on 0.0.0.0:8000
//! mjpeg-server --preset focus                # full view plus five focus crops
//! mjpeg-server --bind 127.0.0.1:8080 --fps 30
//! ```
//!
//! Then open `http://<host>:8000/` in a browser.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use mjpeg_rs::producer::{
    CapturePipeline, FocusLayout, JpegEncoder, ProducerConfig, StreamLayout, TestPatternSource,
};
use mjpeg_rs::{MjpegServer, ProducerError, ServerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// One scaled-down full-frame stream
    Single,
    /// Full-frame stream plus corner and center-strip crops
    Focus,
}

#[derive(Debug, Parser)]
#[command(name = "mjpeg-server")]
#[command(about = "Live MJPEG streaming server")]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "MJPEG_BIND", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Stream layout
    #[arg(short, long, value_enum, default_value_t = Preset::Single)]
    preset: Preset,

    /// Sensor (capture) width
    #[arg(long, default_value_t = 2028)]
    sensor_width: u32,

    /// Sensor (capture) height
    #[arg(long, default_value_t = 1520)]
    sensor_height: u32,

    /// Primary stream width (defaults depend on the preset)
    #[arg(long)]
    width: Option<u32>,

    /// Primary stream height (defaults depend on the preset)
    #[arg(long)]
    height: Option<u32>,

    /// Height of the center strip crop
    #[arg(long, default_value_t = 190)]
    strip_height: u32,

    /// Capture rate of the test pattern
    #[arg(long, default_value_t = 15.0)]
    fps: f64,

    /// Refresh crops on every Nth capture
    #[arg(long, default_value_t = 4)]
    crop_interval: u32,

    /// JPEG quality of the primary stream
    #[arg(long, default_value_t = 80)]
    quality: u8,

    /// JPEG quality of crop streams
    #[arg(long, default_value_t = 65)]
    crop_quality: u8,

    /// Maximum concurrent stream viewers (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_connections: usize,

    /// Producer restarts before giving up
    #[arg(long, default_value_t = 3)]
    max_restarts: u32,

    /// Index page title
    #[arg(long, default_value = "Live Streams")]
    title: String,
}

impl Args {
    fn layout(&self) -> StreamLayout {
        match self.preset {
            Preset::Single => {
                let (width, height) = StreamLayout::default().primary_size();
                StreamLayout::Single {
                    width: self.width.unwrap_or(width),
                    height: self.height.unwrap_or(height),
                }
            }
            Preset::Focus => {
                let defaults = FocusLayout::default();
                StreamLayout::Focus(FocusLayout {
                    sensor_width: self.sensor_width,
                    sensor_height: self.sensor_height,
                    stream_width: self.width.unwrap_or(defaults.stream_width),
                    stream_height: self.height.unwrap_or(defaults.stream_height),
                    strip_height: self.strip_height,
                })
            }
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig::with_addr(self.bind)
            .max_connections(self.max_connections)
            .page_title(self.title.clone())
    }

    fn producer_config(&self) -> ProducerConfig {
        ProducerConfig::default()
            .crop_interval(self.crop_interval)
            .quality(self.quality, self.crop_quality)
            .max_restarts(self.max_restarts)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mjpeg_rs=info".parse()?)
                .add_directive("mjpeg_server=info".parse()?),
        )
        .init();

    let layout = args.layout();
    let registry = Arc::new(layout.registry()?);
    let mut server = MjpegServer::new(args.server_config(), Arc::clone(&registry));

    let (sensor_width, sensor_height, fps) = (args.sensor_width, args.sensor_height, args.fps);
    let producer_config = args.producer_config();
    let pipeline_config = producer_config.clone();
    server.spawn_producer(
        "test-pattern",
        move || {
            let source = TestPatternSource::new(sensor_width, sensor_height, fps);
            CapturePipeline::for_layout(
                &layout,
                &registry,
                source,
                JpegEncoder::new(),
                pipeline_config.clone(),
            )
            .map_err(|e| ProducerError::Capture(e.to_string()))
        },
        producer_config,
    )?;

    tracing::info!(
        addr = %args.bind,
        preset = ?args.preset,
        "Open http://{}/ in a browser",
        args.bind
    );

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
