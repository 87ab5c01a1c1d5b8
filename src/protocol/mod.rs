//! MJPEG wire format
//!
//! Request parsing and response framing are left to axum and hyper; this
//! module only owns what is specific to MJPEG:
//! - Route and header constants
//! - `multipart/x-mixed-replace` part encoding

pub mod constants;
pub mod multipart;

pub use multipart::Part;
