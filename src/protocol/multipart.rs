//! `multipart/x-mixed-replace` part encoding
//!
//! Each frame on a live stream is one self-contained part:
//!
//! ```text
//! --FRAME\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <n>\r\n
//! \r\n
//! <n bytes of JPEG>\r\n
//! ```
//!
//! The browser replaces the displayed image with every new part.

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::{BOUNDARY, CRLF, PART_CONTENT_TYPE};
use crate::registry::Frame;

/// Encode the boundary and headers that precede a payload of `len` bytes
pub fn encode_part_header(len: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(80);

    buf.put_slice(b"--");
    buf.put_slice(BOUNDARY.as_bytes());
    buf.put_slice(CRLF);
    buf.put_slice(b"Content-Type: ");
    buf.put_slice(PART_CONTENT_TYPE.as_bytes());
    buf.put_slice(CRLF);
    buf.put_slice(b"Content-Length: ");
    buf.put_slice(len.to_string().as_bytes());
    buf.put_slice(CRLF);
    buf.put_slice(CRLF);

    buf.freeze()
}

/// One encoded part, ready to be handed to the response body
///
/// The payload is the shared frame buffer itself; it is not copied into a
/// per-session buffer.
#[derive(Debug, Clone)]
pub struct Part {
    header: Bytes,
    payload: Bytes,
}

impl Part {
    pub fn new(frame: &Frame) -> Self {
        Self {
            header: encode_part_header(frame.len()),
            payload: frame.data().clone(),
        }
    }

    /// Bytes the part occupies on the wire
    pub fn encoded_len(&self) -> usize {
        self.header.len() + self.payload.len() + CRLF.len()
    }

    /// Header, payload and trailing CRLF, in wire order
    pub fn into_chunks(self) -> [Bytes; 3] {
        [self.header, self.payload, Bytes::from_static(CRLF)]
    }
}
