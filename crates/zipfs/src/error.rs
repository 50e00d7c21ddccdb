use thiserror::Error;

/// Errors returned by file-system operations on a zip container.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write without overwrite permission targeted an existing entry.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A required argument is missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not implemented for zip containers.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The file system backing a link has been dropped.
    #[error("file system is closed")]
    Closed,

    /// Error from the container layer.
    #[error("archive error: {0}")]
    Archive(#[from] zipfs_archive::Error),

    /// I/O error while copying content.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for zipfs operations.
pub type Result<T> = std::result::Result<T, Error>;
