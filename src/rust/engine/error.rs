use std::io;
use std::path::PathBuf;

/// Errors reported by a model backend.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The crate was built without a native fastText backend
    #[error("fastText backend is not available in this build (enable the `fasttext` feature)")]
    Unavailable,
    /// The native library rejected the operation
    #[error("Backend error: {0}")]
    Backend(String),
    /// The native library only accepts UTF-8 paths
    #[error("Path is not valid UTF-8: {0:?}")]
    InvalidPath(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
