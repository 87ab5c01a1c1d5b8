//! HTTP server
//!
//! Routes requests with axum, answers the index page and redirects, and
//! turns stream requests into a [`StreamSession`](crate::session::StreamSession)
//! response body.

pub mod config;
pub mod listener;
pub mod page;
pub mod router;
pub mod shutdown;

pub use config::ServerConfig;
pub use listener::MjpegServer;
pub use shutdown::Shutdown;
