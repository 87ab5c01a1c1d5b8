//! Frame producers
//!
//! A producer owns a [`FrameSource`] and a [`FrameEncoder`] and publishes
//! into the registry's frame slots:
//!
//! ```text
//!  FrameSource ──capture──► CapturePipeline ──encode──► FrameSlot (primary)
//!                                  │
//!                                  └── every Nth capture ──► FrameSlot (crop) × N
//! ```
//!
//! Producers run on dedicated OS threads under a supervisor that restarts
//! them after failures.

pub mod encoder;
pub mod layout;
pub mod pipeline;
pub mod source;
pub mod supervisor;

pub use encoder::{FrameEncoder, JpegEncoder};
pub use layout::{CropSpec, CropWindow, FocusLayout, StreamLayout, PRIMARY_PATH};
pub use pipeline::{CapturePipeline, ProducerConfig};
pub use source::{Capture, FrameSource, TestPatternSource};
pub use supervisor::{spawn_producer, ProducerHandle};
