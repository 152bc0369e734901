//! Error types for ytpl core operations.
//!
//! Most failures in a run never surface as an `Error`: bad references, missing
//! videos and failed per-item mutations are turned into data (unavailable
//! entries and `Failed` outcomes) where they happen. The variants below are what
//! remains once a failure has to cross a component boundary.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of remote resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A single video.
    Video,
    /// A playlist (remote collection).
    Playlist,
    /// A playlist membership (playlist item).
    PlaylistItem,
    /// The video category list of a region.
    CategoryRegion,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Playlist => write!(f, "playlist"),
            Self::PlaylistItem => write!(f, "playlist item"),
            Self::CategoryRegion => write!(f, "category region"),
        }
    }
}

/// Errors that can occur in ytpl core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A video or playlist reference could not be parsed.
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference {
        /// The raw reference as supplied.
        reference: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The remote service reported the resource as absent or inaccessible.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// What was being looked up.
        resource: ResourceKind,
        /// Identifier that was looked up.
        id: String,
    },

    /// The remote service rejected a call.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the API error body.
        message: String,
    },

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The destination playlist of a bulk operation cannot be used.
    #[error("Invalid destination playlist '{url}': {reason}")]
    InvalidDestination {
        /// Destination URL as supplied.
        url: String,
        /// Why it cannot be used.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A report could not be written.
    #[error("Failed to write report {path}: {reason}")]
    ReportWrite {
        /// Target path.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error category for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed user input.
    Parse,
    /// Remote resource absent.
    NotFound,
    /// Remote call failed.
    Remote,
    /// Destination unusable; fatal for bulk workflows.
    Destination,
    /// Local configuration or environment problem.
    Configuration,
    /// Local I/O or serialization problem.
    Local,
}

impl Error {
    /// Category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidReference { .. } => ErrorKind::Parse,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Api { .. } | Self::Transport(_) => ErrorKind::Remote,
            Self::InvalidDestination { .. } => ErrorKind::Destination,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ReportWrite { .. } | Self::Io(_) | Self::Serialization(_) => ErrorKind::Local,
        }
    }

    /// Whether the remote service reported the resource as missing.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Shorthand for a missing video.
    pub fn video_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: ResourceKind::Video,
            id: id.into(),
        }
    }

    /// Shorthand for a missing playlist.
    pub fn playlist_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: ResourceKind::Playlist,
            id: id.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
