//! Remote playlist service abstraction.
//!
//! [`PlaylistClient`] is the only way the rest of the crate talks to the
//! remote service. Every call is a single blocking round-trip; nothing here
//! retries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::CategoryLookup;

/// Maximum number of ids a single metadata batch request may carry.
pub const MAX_BATCH_SIZE: usize = 50;

/// One video's membership in a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMember {
    /// Membership (playlist item) id.
    pub membership_id: String,
    /// Member video id.
    pub video_id: String,
}

/// One page of playlist members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPage {
    /// Members on this page.
    pub items: Vec<PlaylistMember>,
    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Video metadata needed to build a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title.
    pub title: String,
    /// Numeric category code, as a string.
    pub category_code: String,
}

/// A newly created playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPlaylist {
    /// Playlist id.
    pub playlist_id: String,
    /// Public URL of the playlist.
    pub playlist_url: String,
}

/// Playlist metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    /// Playlist title.
    pub title: String,
}

/// Remote playlist service.
///
/// Lookups of absent resources fail with [`crate::Error::NotFound`]; any other
/// rejected call fails with [`crate::Error::Api`] or
/// [`crate::Error::Transport`].
#[cfg_attr(test, mockall::automock)]
pub trait PlaylistClient {
    /// Fetch one page of a playlist's members.
    fn list_members(&self, playlist_id: &str, page_token: Option<String>) -> Result<MemberPage>;

    /// Fetch metadata for a single video.
    fn get_video_metadata(&self, video_id: &str) -> Result<VideoMetadata>;

    /// Fetch metadata for up to [`MAX_BATCH_SIZE`] videos in one request.
    ///
    /// Videos that could not be fetched are absent from the returned map.
    fn get_video_metadata_batch(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoMetadata>>;

    /// Add a video to a playlist, returning the new membership id.
    fn insert_member(&self, playlist_id: &str, video_id: &str) -> Result<String>;

    /// Delete a playlist membership.
    fn delete_member(&self, membership_id: &str) -> Result<()>;

    /// Create a playlist with the given title.
    fn create_playlist(&self, title: &str) -> Result<CreatedPlaylist>;

    /// Fetch the category code to label mapping for a region.
    fn list_categories(&self, region_code: &str) -> Result<CategoryLookup>;

    /// Fetch a playlist's metadata.
    fn get_playlist_metadata(&self, playlist_id: &str) -> Result<PlaylistMetadata>;
}
