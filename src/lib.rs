//! Live MJPEG streaming server
//!
//! Serves one or more live camera streams over plain HTTP as
//! `multipart/x-mixed-replace` responses, viewable in any browser.
//!
//! Each stream is a [`FrameSlot`]: a single-frame mailbox that always holds
//! the newest JPEG. Producers overwrite it; every viewer waits for a version
//! newer than the last one it sent, so slow viewers drop frames instead of
//! queueing them and never slow the camera down.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mjpeg_rs::producer::{CapturePipeline, JpegEncoder, ProducerConfig, StreamLayout, TestPatternSource};
//! use mjpeg_rs::{MjpegServer, ServerConfig};
//!
//! # async fn run() -> mjpeg_rs::Result<()> {
//! let layout = StreamLayout::default();
//! let registry = Arc::new(layout.registry()?);
//! let mut server = MjpegServer::new(ServerConfig::default(), Arc::clone(&registry));
//!
//! server.spawn_producer(
//!     "camera",
//!     move || {
//!         CapturePipeline::for_layout(
//!             &layout,
//!             &registry,
//!             TestPatternSource::new(640, 360, 15.0),
//!             JpegEncoder::new(),
//!             ProducerConfig::default(),
//!         )
//!         .map_err(|e| mjpeg_rs::ProducerError::Capture(e.to_string()))
//!     },
//!     ProducerConfig::default(),
//! )?;
//!
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await
//! # }
//! ```

pub mod error;
pub mod producer;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, ProducerError, Result};
pub use registry::{Frame, FrameSlot, StreamRegistry};
pub use server::{MjpegServer, ServerConfig};
