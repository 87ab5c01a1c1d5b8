//! Encoded frame type
//!
//! A [`Frame`] is one finished JPEG image. It is never mutated after it is
//! published, so every session reading it shares the same allocation.

use bytes::Bytes;

/// One encoded JPEG image
///
/// Cheap to clone: the payload is a reference-counted `Bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    /// Wrap already-encoded JPEG bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Encoded payload
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload length in bytes (the multipart `Content-Length`)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }
}

impl From<&'static [u8]> for Frame {
    fn from(data: &'static [u8]) -> Self {
        Self {
            data: Bytes::from_static(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_payload() {
        let frame = Frame::new(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let copy = frame.clone();

        assert_eq!(frame.len(), 4);
        assert_eq!(frame.data().as_ptr(), copy.data().as_ptr());
    }
}
