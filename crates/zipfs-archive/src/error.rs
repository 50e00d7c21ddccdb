use thiserror::Error;

/// Errors that can occur when working with a zip container.
#[derive(Debug, Error)]
pub enum Error {
    /// No entry with the given name exists in the container.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The entry name cannot be stored in a zip container.
    #[error("invalid entry name: {0}")]
    InvalidName(String),

    /// The container was replaced but could not be loaded again.
    #[error("container must be reloaded before use: {0}")]
    StaleHandle(std::path::PathBuf),

    /// Error from the zip library.
    #[error("zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for zipfs-archive operations.
pub type Result<T> = std::result::Result<T, Error>;
