//! Error types
//!
//! A single crate-wide [`Error`] wraps the per-layer error enums so that
//! server and producer code can propagate with `?`.

use std::fmt;
use std::io;

use crate::registry::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug)]
pub enum Error {
    /// Socket or file I/O failure
    Io(io::Error),
    /// Stream registry misconfiguration
    Registry(RegistryError),
    /// Capture or encode failure
    Producer(ProducerError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Producer(e) => write!(f, "Producer error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Producer(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<ProducerError> for Error {
    fn from(e: ProducerError) -> Self {
        Error::Producer(e)
    }
}

/// Capture pipeline errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerError {
    /// The frame source failed to deliver a capture
    Capture(String),
    /// JPEG encoding failed
    Encode(String),
    /// The frame source has no more frames
    SourceExhausted,
    /// Restart budget used up
    RestartsExhausted { restarts: u32, last: String },
}

impl fmt::Display for ProducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProducerError::Capture(msg) => write!(f, "Capture failed: {}", msg),
            ProducerError::Encode(msg) => write!(f, "Encode failed: {}", msg),
            ProducerError::SourceExhausted => write!(f, "Frame source exhausted"),
            ProducerError::RestartsExhausted { restarts, last } => {
                write!(f, "Gave up after {} restarts: {}", restarts, last)
            }
        }
    }
}

impl std::error::Error for ProducerError {}
