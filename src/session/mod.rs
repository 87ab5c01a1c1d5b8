//! Viewer sessions
//!
//! A session is created for every request for a registered stream path,
//! and lives until the viewer disconnects or the server shuts down.

pub mod context;
pub mod stream;

pub use context::SessionContext;
pub use stream::{SessionEnd, StreamSession};
