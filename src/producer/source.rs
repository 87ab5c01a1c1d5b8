//! Frame sources
//!
//! A [`FrameSource`] is the camera collaborator: a blocking call that yields
//! the next raw capture. [`TestPatternSource`] stands in for real hardware.

use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};

use crate::error::ProducerError;

/// One raw capture from the sensor
#[derive(Debug, Clone)]
pub struct Capture {
    /// Full-resolution image
    pub main: RgbImage,
    /// Optional hardware-scaled preview at stream size
    pub lores: Option<RgbImage>,
    /// Monotonic capture counter from the source
    pub sequence: u64,
    /// When the capture completed
    pub captured_at: Instant,
}

/// Blocking source of captures
///
/// Runs on the producer's own thread, so blocking here never stalls
/// viewers.
pub trait FrameSource: Send {
    /// Block until the next capture is available
    fn next_capture(&mut self) -> Result<Capture, ProducerError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_capture(&mut self) -> Result<Capture, ProducerError> {
        (**self).next_capture()
    }
}

/// Synthetic moving test pattern paced at a fixed frame rate
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    interval: Duration,
    sequence: u64,
    next_due: Option<Instant>,
    limit: Option<u64>,
}

impl TestPatternSource {
    /// Pattern of `width`×`height` delivered at `fps` frames per second
    ///
    /// `fps <= 0` disables pacing.
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        let interval = if fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };

        Self {
            width,
            height,
            interval,
            sequence: 0,
            next_due: None,
            limit: None,
        }
    }

    /// Stop with [`ProducerError::SourceExhausted`] after `frames` captures
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    fn pace(&mut self) {
        if self.interval.is_zero() {
            return;
        }
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        // Don't try to catch up after a stall
        self.next_due = Some(due.max(now) + self.interval);
    }

    fn render(&self) -> RgbImage {
        let width = self.width.max(1);
        let shift = ((self.sequence * 4) % u64::from(width)) as u32;
        let bar = ((self.sequence * 8) % u64::from(width)) as u32;

        RgbImage::from_fn(self.width, self.height, |x, y| {
            if x.abs_diff(bar) < 4 {
                return Rgb([255, 255, 255]);
            }
            let r = ((x + shift) % width * 255 / width) as u8;
            let g = (y * 255 / self.height.max(1)) as u8;
            let b = if (x / 32 + y / 32) % 2 == 0 { 64 } else { 160 };
            Rgb([r, g, b])
        })
    }
}

impl FrameSource for TestPatternSource {
    fn next_capture(&mut self) -> Result<Capture, ProducerError> {
        if self.limit.is_some_and(|limit| self.sequence >= limit) {
            return Err(ProducerError::SourceExhausted);
        }

        self.pace();
        let main = self.render();
        self.sequence += 1;

        Ok(Capture {
            main,
            lores: None,
            sequence: self.sequence,
            captured_at: Instant::now(),
        })
    }
}
