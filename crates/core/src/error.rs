//! Error types for subset orchestration.
//!
//! Only conditions that abort an operation live here. Malformed range tokens,
//! empty subsets and per-subset build failures are reported as values
//! (see [`crate::unicode_range::ParseWarning`] and
//! [`crate::scheduler::SubsetStatus`]).

use std::path::PathBuf;

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a family build, a metadata load or a config load.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source font for a family does not exist.
    #[error("Font file not found: '{}'", path.display())]
    MissingFontFile { path: PathBuf },

    /// Failed to read a source font file.
    #[error("Failed to read font file '{}': {source}", path.display())]
    ReadFont {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The font could not be parsed or has no usable cmap.
    #[error("Failed to parse font '{}': {message}", path.display())]
    ParseFont { path: PathBuf, message: String },

    /// A metadata record is unreadable or corrupt.
    #[error("Failed to read metadata '{}': {message}", path.display())]
    MetadataRead { path: PathBuf, message: String },

    /// Failed to write an artifact, a metadata record or a directory.
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration or subset table.
    #[error("Invalid config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// The build worker pool could not be created.
    #[error("Failed to create worker pool: {0}")]
    WorkerPool(String),
}

impl Error {
    pub(crate) fn metadata(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::MetadataRead { path: path.into(), message: message.to_string() }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write { path: path.into(), source }
    }
}
