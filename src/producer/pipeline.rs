//! Capture → encode → publish loop
//!
//! Every capture feeds the primary stream. Every `crop_interval`-th capture
//! additionally feeds each crop stream, which bounds the extra encode work
//! to a fixed fraction of the primary frame rate.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::ProducerError;
use crate::registry::{FrameSlot, RegistryError, StreamRegistry};
use crate::server::shutdown::Shutdown;
use crate::stats::ProducerStats;

use super::encoder::FrameEncoder;
use super::layout::{CropWindow, StreamLayout, PRIMARY_PATH};
use super::source::{Capture, FrameSource};

/// Producer configuration options
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Crop streams are refreshed on every Nth capture (0 = never)
    pub crop_interval: u32,

    /// JPEG quality of the primary stream
    pub primary_quality: u8,

    /// JPEG quality of crop streams
    pub crop_quality: u8,

    /// Restarts allowed before the failure becomes fatal
    pub max_restarts: u32,

    /// Delay before the first restart; doubles on each further restart
    pub restart_backoff: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            crop_interval: 4,
            primary_quality: 80,
            crop_quality: 65,
            max_restarts: 3,
            restart_backoff: Duration::from_millis(500),
        }
    }
}

impl ProducerConfig {
    /// Set crop interval
    pub fn crop_interval(mut self, interval: u32) -> Self {
        self.crop_interval = interval;
        self
    }

    /// Set primary and crop JPEG quality
    pub fn quality(mut self, primary: u8, crop: u8) -> Self {
        self.primary_quality = primary.clamp(1, 100);
        self.crop_quality = crop.clamp(1, 100);
        self
    }

    /// Set restart budget
    pub fn max_restarts(mut self, restarts: u32) -> Self {
        self.max_restarts = restarts;
        self
    }

    /// Set initial restart delay
    pub fn restart_backoff(mut self, backoff: Duration) -> Self {
        self.restart_backoff = backoff;
        self
    }
}

/// Full-frame output
struct PrimaryTarget {
    slot: Arc<FrameSlot>,
    width: u32,
    height: u32,
}

/// Cropped output
struct CropTarget {
    slot: Arc<FrameSlot>,
    window: CropWindow,
}

/// One producer: a source, an encoder, and the slots it feeds
pub struct CapturePipeline<S, E> {
    source: S,
    encoder: E,
    config: ProducerConfig,
    primary: PrimaryTarget,
    crops: Vec<CropTarget>,
    counter: u64,
    stats: ProducerStats,
}

impl<S, E> CapturePipeline<S, E>
where
    S: FrameSource,
    E: FrameEncoder,
{
    /// Wire a pipeline to the slots of `layout` in `registry`
    pub fn for_layout(
        layout: &StreamLayout,
        registry: &StreamRegistry,
        source: S,
        encoder: E,
        config: ProducerConfig,
    ) -> Result<Self, RegistryError> {
        layout.validate()?;
        let missing = |path: &str| RegistryError::InvalidPath(path.to_string());

        let (width, height) = layout.primary_size();
        let primary = PrimaryTarget {
            slot: registry.slot(PRIMARY_PATH).ok_or_else(|| missing(PRIMARY_PATH))?,
            width,
            height,
        };

        let crops = layout
            .crops()
            .into_iter()
            .map(|crop| {
                registry
                    .slot(&crop.path)
                    .map(|slot| CropTarget {
                        slot,
                        window: crop.window,
                    })
                    .ok_or_else(|| missing(&crop.path))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source,
            encoder,
            config,
            primary,
            crops,
            counter: 0,
            stats: ProducerStats::new(),
        })
    }

    /// Statistics so far
    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }

    /// Capture until shutdown or the first error
    pub fn run(&mut self, shutdown: &Shutdown) -> Result<(), ProducerError> {
        while !shutdown.is_shutdown() {
            let capture = self.source.next_capture()?;
            self.process(&capture)?;
        }
        Ok(())
    }

    /// Encode and publish one capture
    pub fn process(&mut self, capture: &Capture) -> Result<(), ProducerError> {
        self.stats.captures += 1;

        let primary = self.primary_image(capture);
        let jpeg = self.encoder.encode(&primary, self.config.primary_quality)?;
        self.stats.bytes_published += jpeg.len() as u64;
        self.primary.slot.publish(jpeg);
        self.stats.primary_frames += 1;

        let interval = u64::from(self.config.crop_interval);
        if interval > 0 && self.counter % interval == 0 {
            for target in &self.crops {
                let w = target.window;
                let region = imageops::crop_imm(&capture.main, w.x, w.y, w.width, w.height).to_image();
                let jpeg = self.encoder.encode(&region, self.config.crop_quality)?;
                self.stats.bytes_published += jpeg.len() as u64;
                target.slot.publish(jpeg);
                self.stats.crop_frames += 1;
            }
        }

        self.counter += 1;

        tracing::trace!(
            sequence = capture.sequence,
            latency_us = capture.captured_at.elapsed().as_micros() as u64,
            "Capture published"
        );

        Ok(())
    }

    fn primary_image<'a>(&self, capture: &'a Capture) -> Cow<'a, RgbImage> {
        let (width, height) = (self.primary.width, self.primary.height);

        match &capture.lores {
            Some(lores) => Cow::Borrowed(lores),
            None if capture.main.dimensions() == (width, height) => Cow::Borrowed(&capture.main),
            None => Cow::Owned(imageops::resize(
                &capture.main,
                width,
                height,
                FilterType::Triangle,
            )),
        }
    }
}
