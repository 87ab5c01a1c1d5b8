//! Session context
//!
//! Identity of one viewer connection, carried through log output.

use std::net::SocketAddr;

/// Per-connection identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Unique session ID
    pub session_id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Requested stream path
    pub path: String,
}

impl SessionContext {
    /// Create a new context
    pub fn new(session_id: u64, peer_addr: SocketAddr, path: impl Into<String>) -> Self {
        Self {
            session_id,
            peer_addr,
            path: path.into(),
        }
    }
}
