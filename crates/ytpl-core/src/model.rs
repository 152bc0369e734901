//! Records shared by the builder, reconciler and categorizer.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Label used for category codes the lookup does not know.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// A resolved video.
///
/// `source_item_id` is the playlist membership id and is only present when the
/// video was discovered as a member of a playlist. Deleting a video from a
/// playlist targets that membership, not the video itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Video id; identity of the record.
    pub video_id: String,
    /// URL the video was reached through.
    pub video_url: String,
    /// Video title.
    pub title: String,
    /// Human readable category label.
    pub category: String,
    /// Playlist membership id, when discovered through a playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_item_id: Option<String>,
}

/// Set of videos keyed by video id.
///
/// Keys always equal the `video_id` of their record. The first record inserted
/// for an id is kept. Iteration is ordered by id so reports built from a set are
/// stable.
///
/// Deserializing re-keys every record by its own `video_id`; the keys found in
/// the input are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VideoSet {
    videos: BTreeMap<String, VideoRecord>,
}

impl VideoSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its id is already present.
    ///
    /// Returns `true` when the record was added.
    pub fn insert(&mut self, record: VideoRecord) -> bool {
        match self.videos.entry(record.video_id.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Whether a video id is in the set.
    pub fn contains(&self, video_id: &str) -> bool {
        self.videos.contains_key(video_id)
    }

    /// Look up a record by video id.
    pub fn get(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.get(video_id)
    }

    /// Remove a record by video id.
    pub fn remove(&mut self, video_id: &str) -> Option<VideoRecord> {
        self.videos.remove(video_id)
    }

    /// Number of videos.
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Iterate records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &VideoRecord> {
        self.videos.values()
    }

    /// Iterate video ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.videos.keys().map(String::as_str)
    }
}

impl FromIterator<VideoRecord> for VideoSet {
    fn from_iter<I: IntoIterator<Item = VideoRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl<'de> Deserialize<'de> for VideoSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keyed = BTreeMap::<String, VideoRecord>::deserialize(deserializer)?;
        Ok(keyed.into_values().collect())
    }
}

impl Extend<VideoRecord> for VideoSet {
    fn extend<I: IntoIterator<Item = VideoRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl IntoIterator for VideoSet {
    type Item = VideoRecord;
    type IntoIter = btree_map::IntoValues<String, VideoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.videos.into_values()
    }
}

impl<'a> IntoIterator for &'a VideoSet {
    type Item = &'a VideoRecord;
    type IntoIter = btree_map::Values<'a, String, VideoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.videos.values()
    }
}

/// An input that resolved to a reference whose video could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableEntry {
    /// Video id, or the raw reference when it could not be parsed.
    pub video_id_or_url: String,
    /// Playlist membership id when the video was found inside a playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_item_id: Option<String>,
}

impl UnavailableEntry {
    /// Entry for a standalone reference.
    pub fn standalone(video_id_or_url: impl Into<String>) -> Self {
        Self {
            video_id_or_url: video_id_or_url.into(),
            source_item_id: None,
        }
    }

    /// Entry for a dangling playlist member.
    pub fn member(video_id: impl Into<String>, source_item_id: impl Into<String>) -> Self {
        Self {
            video_id_or_url: video_id.into(),
            source_item_id: Some(source_item_id.into()),
        }
    }
}

/// Maps numeric category codes to labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryLookup {
    labels: HashMap<String, String>,
}

impl CategoryLookup {
    /// Build a lookup from code/label pairs.
    pub const fn new(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    /// Label for a category code, or [`UNKNOWN_CATEGORY`].
    pub fn label(&self, code: &str) -> &str {
        self.labels.get(code).map_or(UNKNOWN_CATEGORY, String::as_str)
    }

    /// Number of known categories.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no categories are known.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CategoryLookup {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
