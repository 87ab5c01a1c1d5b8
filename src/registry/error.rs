//! Registry error types
//!
//! Errors raised while building the stream registry. The registry is
//! immutable once built, so these only occur at startup.

/// Error type for registry construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two streams registered under the same path
    DuplicatePath(String),
    /// Path collides with a built-in route
    ReservedPath(String),
    /// Path does not start with `/`, or contains whitespace or one of `:*?`
    InvalidPath(String),
    /// Stream or crop sizes that cannot produce an image
    InvalidLayout(String),
    /// No streams registered
    Empty,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicatePath(path) => write!(f, "Duplicate stream path: {}", path),
            RegistryError::ReservedPath(path) => write!(f, "Reserved path: {}", path),
            RegistryError::InvalidPath(path) => write!(f, "Invalid stream path: {:?}", path),
            RegistryError::InvalidLayout(reason) => write!(f, "Invalid layout: {}", reason),
            RegistryError::Empty => write!(f, "No streams registered"),
        }
    }
}

impl std::error::Error for RegistryError {}
