//! JPEG encoding
//!
//! The server itself never looks inside a frame; encoders turn raw captures
//! into the bytes that get published.

use bytes::Bytes;
use image::codecs::jpeg;
use image::{ExtendedColorType, RgbImage};

use crate::error::ProducerError;

/// Turns an RGB image into publishable JPEG bytes
pub trait FrameEncoder: Send {
    fn encode(&mut self, image: &RgbImage, quality: u8) -> Result<Bytes, ProducerError>;
}

impl<E: FrameEncoder + ?Sized> FrameEncoder for Box<E> {
    fn encode(&mut self, image: &RgbImage, quality: u8) -> Result<Bytes, ProducerError> {
        (**self).encode(image, quality)
    }
}

/// Software JPEG encoder backed by the `image` crate
#[derive(Debug, Default)]
pub struct JpegEncoder {
    /// Reused output buffer capacity hint
    last_size: usize,
}

impl JpegEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&mut self, image: &RgbImage, quality: u8) -> Result<Bytes, ProducerError> {
        let mut out = Vec::with_capacity(self.last_size.max(16 * 1024));

        jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| ProducerError::Encode(e.to_string()))?;

        self.last_size = out.len();
        Ok(Bytes::from(out))
    }
}
