//! HTTP and multipart wire constants

/// Multipart boundary token (without the leading `--`)
pub const BOUNDARY: &str = "FRAME";

/// `Content-Type` of a live stream response
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=FRAME";

/// `Content-Type` of each part
pub const PART_CONTENT_TYPE: &str = "image/jpeg";

/// Path that redirects to the index page
pub const ROOT_PATH: &str = "/";

/// Path of the generated index page
pub const INDEX_PATH: &str = "/index.html";

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8000;
