//! Error types shared by the gallery operations.
//!
//! Most of these never abort a run: the orchestrator turns them into report
//! entries and console messages. Only configuration errors and a media
//! directory that cannot be created propagate out of `run_cli`.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while tidying a gallery.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// A required folder was missing and could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A category or target path exists but is not a directory.
    #[error("Path exists but is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// A folder could not be listed.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A legacy file could not be moved into the target folder.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An emptied legacy folder could not be removed.
    #[error("Failed to remove folder {}: {source}", .path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file could not be renamed to its sequential name.
    #[error("Failed to rename {} to {}: {source}", .from.display(), .to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The sequential name is already taken by something that is not part of the rename set.
    #[error("Target name is already taken: {}", .path.display())]
    TargetOccupied { path: PathBuf },

    /// The manifest could not be written.
    #[error("Could not write manifest {}: {source}", .path.display())]
    ManifestWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The manifest could not be serialized.
    #[error("Manifest serialization failed: {0}")]
    ManifestSerialize(#[from] serde_json::Error),

    /// The configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for gallery operations.
pub type GalleryResult<T> = Result<T, GalleryError>;
