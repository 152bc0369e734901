//! Grouping videos by category and naming the playlists built from them.

use std::collections::BTreeMap;

use crate::model::VideoSet;

/// Videos grouped by category label, ordered by label.
pub type CategoryGroups = BTreeMap<String, VideoSet>;

/// Partition a video set by each record's category label.
pub fn categorize(videos: &VideoSet) -> CategoryGroups {
    let mut groups = CategoryGroups::new();
    for video in videos {
        groups
            .entry(video.category.clone())
            .or_default()
            .insert(video.clone());
    }
    groups
}

/// Automatic name for a category's playlist.
///
/// `<base>_<category>` when a base name is given, otherwise
/// `<category>_<timestamp>`.
pub fn auto_playlist_name(base: Option<&str>, category: &str, timestamp: &str) -> String {
    match base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) => format!("{base}_{category}"),
        None => format!("{category}_{timestamp}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::VideoRecord;

    fn record(id: &str, category: &str) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            video_url: format!("https://www.youtube.com/watch?v={id}"),
            title: id.to_uppercase(),
            category: category.to_string(),
            source_item_id: None,
        }
    }

    #[test]
    fn test_every_video_in_exactly_one_group() {
        let videos: VideoSet = [
            record("a", "Music"),
            record("b", "Gaming"),
            record("c", "Music"),
            record("d", "Unknown"),
        ]
        .into_iter()
        .collect();

        let groups = categorize(&videos);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups.values().map(VideoSet::len).sum::<usize>(), videos.len());
        for (label, group) in &groups {
            for video in group {
                assert_eq!(&video.category, label);
            }
        }
        assert!(groups["Music"].contains("a"));
        assert!(groups["Music"].contains("c"));
    }

    #[test]
    fn test_empty_input() {
        assert!(categorize(&VideoSet::new()).is_empty());
    }

    #[test]
    fn test_auto_name_with_base() {
        assert_eq!(
            auto_playlist_name(Some("Mix"), "Music", "2024-01-01-00-00-00"),
            "Mix_Music"
        );
    }

    #[test]
    fn test_auto_name_without_base() {
        assert_eq!(
            auto_playlist_name(None, "Gaming", "2024-01-01-00-00-00"),
            "Gaming_2024-01-01-00-00-00"
        );
        assert_eq!(
            auto_playlist_name(Some("  "), "Gaming", "ts"),
            "Gaming_ts"
        );
    }
}
