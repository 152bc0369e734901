//! Video and playlist reference resolution.
//!
//! Classifies a user supplied reference as a playlist or a single video and
//! extracts its canonical identifier. A reference carrying a `list=` query
//! parameter is a playlist, even when it also names a video; otherwise a `v=`
//! parameter (or a `youtu.be/<id>` short link) makes it a video.
//!
//! # Supported formats
//!
//! - `https://www.youtube.com/playlist?list=PLxxxxxxxx`
//! - `https://www.youtube.com/watch?v=xxxxx&list=PLxxxxxxxx` (playlist)
//! - `https://www.youtube.com/watch?v=xxxxx`
//! - `https://youtu.be/xxxxx`
//!
//! ```rust
//! use ytpl_core::url::{ReferenceKind, resolve};
//!
//! let reference = resolve("https://www.youtube.com/watch?v=abc123").unwrap();
//! assert_eq!(reference.kind, ReferenceKind::Video);
//! assert_eq!(reference.id, "abc123");
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[allow(clippy::expect_used)]
static PLAYLIST_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&])list=([^&]+)").expect("valid playlist pattern"));

#[allow(clippy::expect_used)]
static VIDEO_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&])v=([^&]+)").expect("valid video pattern"));

#[allow(clippy::expect_used)]
static SHORT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([^?&/#]+)").expect("valid short link pattern"));

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// A single video.
    Video,
    /// A whole playlist.
    Playlist,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Playlist => write!(f, "playlist"),
        }
    }
}

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    /// Reference as supplied (whitespace trimmed).
    pub raw_url: String,
    /// Playlist or video.
    pub kind: ReferenceKind,
    /// Extracted video or playlist id.
    pub id: String,
}

impl VideoRef {
    /// Canonical URL for the referenced resource.
    pub fn canonical_url(&self) -> String {
        match self.kind {
            ReferenceKind::Video => video_url(&self.id),
            ReferenceKind::Playlist => playlist_url(&self.id),
        }
    }
}

/// Resolve a raw reference into a classified [`VideoRef`].
///
/// # Errors
///
/// Returns [`Error::InvalidReference`] when neither a playlist nor a video id
/// can be found.
pub fn resolve(raw_url: &str) -> Result<VideoRef> {
    let raw = raw_url.trim();
    if raw.is_empty() {
        return Err(Error::InvalidReference {
            reference: raw_url.to_string(),
            reason: "reference is empty".to_string(),
        });
    }

    let (kind, id) = if let Some(id) = capture(&PLAYLIST_PARAM, raw) {
        (ReferenceKind::Playlist, id)
    } else if let Some(id) = capture(&VIDEO_PARAM, raw).or_else(|| capture(&SHORT_LINK, raw)) {
        (ReferenceKind::Video, id)
    } else {
        return Err(Error::InvalidReference {
            reference: raw.to_string(),
            reason: "no playlist or video id found".to_string(),
        });
    };

    Ok(VideoRef {
        raw_url: raw.to_string(),
        kind,
        id,
    })
}

/// Extract the playlist id from a reference that must be a playlist.
///
/// # Errors
///
/// Returns [`Error::InvalidReference`] when the reference is malformed or names
/// a single video.
pub fn extract_playlist_id(url: &str) -> Result<String> {
    let reference = resolve(url)?;
    match reference.kind {
        ReferenceKind::Playlist => Ok(reference.id),
        ReferenceKind::Video => Err(Error::InvalidReference {
            reference: reference.raw_url,
            reason: "URL is a single video, not a playlist".to_string(),
        }),
    }
}

/// Split a comma separated reference list, dropping blank entries.
pub fn split_references(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Watch URL for a video id.
pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Playlist URL for a playlist id.
pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}

fn capture(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|id| !id.is_empty())
}
