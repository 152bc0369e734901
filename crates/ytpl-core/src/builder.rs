//! Video set construction.
//!
//! Turns a list of raw references into a deduplicated [`VideoSet`], walking
//! playlists page by page and fetching video metadata in batches. Nothing that
//! goes wrong with a single reference stops the build: bad references and
//! missing videos land in `unavailable`, unreadable playlists land in
//! `unavailable_playlists`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::{PlaylistClient, PlaylistMember, VideoMetadata};
use crate::error::Result;
use crate::model::{CategoryLookup, UnavailableEntry, VideoRecord, VideoSet};
use crate::url::{self, ReferenceKind};

/// Number of video ids sent per metadata batch request.
pub const METADATA_BATCH_SIZE: usize = crate::client::MAX_BATCH_SIZE;

/// Output of [`VideoSetBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedVideos {
    /// Videos that resolved successfully.
    pub videos: VideoSet,
    /// Inputs whose video could not be fetched, keyed by video id or raw reference.
    pub unavailable: BTreeMap<String, UnavailableEntry>,
    /// Playlists that could not be read at all.
    pub unavailable_playlists: BTreeSet<String>,
}

impl ResolvedVideos {
    fn mark_unavailable(&mut self, entry: UnavailableEntry) {
        self.unavailable
            .entry(entry.video_id_or_url.clone())
            .or_insert(entry);
    }
}

/// Full contents of one playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistSnapshot {
    /// Members whose metadata could be fetched, with their membership ids.
    pub videos: VideoSet,
    /// Members whose video is gone or private.
    pub unavailable: Vec<UnavailableEntry>,
}

/// Resolves references into video sets through a [`PlaylistClient`].
pub struct VideoSetBuilder<'a, C: PlaylistClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: PlaylistClient + ?Sized> VideoSetBuilder<'a, C> {
    /// Create a builder over `client`.
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Resolve every reference, isolating failures per reference.
    pub fn build(&self, references: &[String], categories: &CategoryLookup) -> ResolvedVideos {
        let mut resolved = ResolvedVideos::default();

        for raw in references {
            let reference = match url::resolve(raw) {
                Ok(reference) => reference,
                Err(e) => {
                    warn!("Skipping reference: {}", e);
                    resolved.mark_unavailable(UnavailableEntry::standalone(raw.trim()));
                    continue;
                }
            };

            match reference.kind {
                ReferenceKind::Playlist => match self.snapshot_playlist(&reference.id, categories) {
                    Ok(snapshot) => {
                        info!(
                            "Playlist {}: {} video(s), {} unavailable",
                            reference.id,
                            snapshot.videos.len(),
                            snapshot.unavailable.len()
                        );
                        resolved.videos.extend(snapshot.videos);
                        for entry in snapshot.unavailable {
                            resolved.mark_unavailable(entry);
                        }
                    }
                    Err(e) => {
                        warn!("Playlist {} is unavailable: {}", reference.id, e);
                        resolved.unavailable_playlists.insert(reference.id);
                    }
                },
                ReferenceKind::Video => match self.client.get_video_metadata(&reference.id) {
                    Ok(metadata) => {
                        resolved.videos.insert(record_from(
                            &reference.id,
                            reference.raw_url.clone(),
                            &metadata,
                            categories,
                            None,
                        ));
                    }
                    Err(e) => {
                        warn!("Video {} is unavailable: {}", reference.id, e);
                        resolved.mark_unavailable(UnavailableEntry::standalone(reference.id));
                    }
                },
            }
        }

        // A video reachable through one reference is not unavailable just
        // because another reference to it dangles.
        let videos = &resolved.videos;
        resolved.unavailable.retain(|id, _| !videos.contains(id));

        debug!(
            "Resolved {} reference(s) into {} video(s), {} unavailable, {} unreadable playlist(s)",
            references.len(),
            resolved.videos.len(),
            resolved.unavailable.len(),
            resolved.unavailable_playlists.len()
        );
        resolved
    }

    /// Read the full contents of one playlist.
    ///
    /// Records carry their membership id in `source_item_id`.
    ///
    /// # Errors
    ///
    /// Returns the client's error when the playlist cannot be read.
    pub fn snapshot_playlist(
        &self,
        playlist_id: &str,
        categories: &CategoryLookup,
    ) -> Result<PlaylistSnapshot> {
        let members = self.list_all_members(playlist_id)?;
        let ids: Vec<String> = members.iter().map(|m| m.video_id.clone()).collect();
        let metadata = self.fetch_metadata(&ids);

        let mut snapshot = PlaylistSnapshot::default();
        for member in members {
            match metadata.get(&member.video_id) {
                Some(meta) => {
                    snapshot.videos.insert(record_from(
                        &member.video_id,
                        url::video_url(&member.video_id),
                        meta,
                        categories,
                        Some(member.membership_id),
                    ));
                }
                None => {
                    warn!(
                        "Video {} (playlist item {}) in {} is unavailable: no metadata",
                        member.video_id, member.membership_id, playlist_id
                    );
                    snapshot
                        .unavailable
                        .push(UnavailableEntry::member(member.video_id, member.membership_id));
                }
            }
        }
        Ok(snapshot)
    }

    /// Follow page tokens until the whole membership list is read.
    ///
    /// # Errors
    ///
    /// Returns the first page error; members read before it are discarded.
    pub fn list_all_members(&self, playlist_id: &str) -> Result<Vec<PlaylistMember>> {
        let mut members = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .client
                .list_members(playlist_id, page_token.take())?;
            pages += 1;
            members.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "Read {} member(s) of {} in {} page(s)",
            members.len(),
            playlist_id,
            pages
        );
        Ok(members)
    }

    /// Fetch metadata for many videos, batching requests.
    ///
    /// A failed batch falls back to one request per video so a single bad id
    /// cannot hide the rest. Videos that cannot be fetched are absent.
    pub fn fetch_metadata(&self, video_ids: &[String]) -> HashMap<String, VideoMetadata> {
        let mut found = HashMap::with_capacity(video_ids.len());
        for chunk in video_ids.chunks(METADATA_BATCH_SIZE) {
            match self.client.get_video_metadata_batch(chunk) {
                Ok(batch) => found.extend(batch),
                Err(e) => {
                    warn!(
                        "Metadata batch of {} failed ({}), fetching individually",
                        chunk.len(),
                        e
                    );
                    for id in chunk {
                        match self.client.get_video_metadata(id) {
                            Ok(meta) => {
                                found.insert(id.clone(), meta);
                            }
                            Err(e) => warn!("Video {} is unavailable: {}", id, e),
                        }
                    }
                }
            }
        }
        found
    }
}

fn record_from(
    video_id: &str,
    video_url: String,
    metadata: &VideoMetadata,
    categories: &CategoryLookup,
    source_item_id: Option<String>,
) -> VideoRecord {
    VideoRecord {
        video_id: video_id.to_string(),
        video_url,
        title: metadata.title.clone(),
        category: categories.label(&metadata.category_code).to_string(),
        source_item_id,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::client::{MemberPage, MockPlaylistClient};
    use crate::error::Error;
    use crate::memory::MemoryClient;
    use mockall::predicate::eq;

    fn categories() -> CategoryLookup {
        [("10", "Music"), ("20", "Gaming")].into_iter().collect()
    }

    fn refs(urls: &[&str]) -> Vec<String> {
        urls.iter().map(ToString::to_string).collect()
    }

    mod build_tests {
        use super::*;

        #[test]
        fn test_single_video() {
            let client = MemoryClient::new().with_video("abc123", "Song", "10");
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(
                &refs(&["https://www.youtube.com/watch?v=abc123"]),
                &categories(),
            );

            let record = resolved.videos.get("abc123").unwrap();
            assert_eq!(record.title, "Song");
            assert_eq!(record.category, "Music");
            assert_eq!(record.video_url, "https://www.youtube.com/watch?v=abc123");
            assert!(record.source_item_id.is_none());
            assert!(resolved.unavailable.is_empty());
        }

        #[test]
        fn test_malformed_reference_is_unavailable() {
            let client = MemoryClient::new().with_video("abc123", "Song", "10");
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(
                &refs(&["not a url", "https://www.youtube.com/watch?v=abc123"]),
                &categories(),
            );

            assert_eq!(resolved.videos.len(), 1);
            let entry = resolved.unavailable.get("not a url").unwrap();
            assert!(entry.source_item_id.is_none());
        }

        #[test]
        fn test_missing_video_is_unavailable() {
            let client = MemoryClient::new();
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(
                &refs(&["https://www.youtube.com/watch?v=gone"]),
                &categories(),
            );

            assert!(resolved.videos.is_empty());
            assert_eq!(
                resolved.unavailable.get("gone"),
                Some(&UnavailableEntry::standalone("gone"))
            );
        }

        #[test]
        fn test_playlist_members_carry_membership_ids() {
            let client = MemoryClient::new()
                .with_video("a", "A", "10")
                .with_video("b", "B", "20")
                .with_playlist("PLsrc", "Source", &["a", "b", "deleted"]);
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(
                &refs(&["https://www.youtube.com/playlist?list=PLsrc"]),
                &categories(),
            );

            assert_eq!(resolved.videos.len(), 2);
            assert!(resolved.videos.get("a").unwrap().source_item_id.is_some());
            assert_eq!(resolved.videos.get("b").unwrap().category, "Gaming");

            let dangling = resolved.unavailable.get("deleted").unwrap();
            assert!(dangling.source_item_id.is_some());
        }

        #[test]
        fn test_unreadable_playlist_is_isolated() {
            let client = MemoryClient::new().with_video("abc123", "Song", "10");
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(
                &refs(&[
                    "https://www.youtube.com/playlist?list=PLmissing",
                    "https://www.youtube.com/watch?v=abc123",
                ]),
                &categories(),
            );

            assert!(resolved.unavailable_playlists.contains("PLmissing"));
            assert_eq!(resolved.videos.len(), 1);
        }

        #[test]
        fn test_access_denied_playlist_is_isolated() {
            let client = MemoryClient::new()
                .with_video("a", "A", "10")
                .with_video("b", "B", "20")
                .with_playlist("PLprivate", "Private", &["a"])
                .with_playlist("PLopen", "Open", &["b"])
                .deny_read_of("PLprivate");
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(
                &refs(&[
                    "https://www.youtube.com/playlist?list=PLprivate",
                    "https://www.youtube.com/playlist?list=PLopen",
                ]),
                &categories(),
            );

            assert_eq!(
                resolved.unavailable_playlists.iter().collect::<Vec<_>>(),
                vec!["PLprivate"]
            );
            assert_eq!(resolved.videos.ids().collect::<Vec<_>>(), vec!["b"]);
            assert!(resolved.unavailable.is_empty());
        }

        #[test]
        fn test_duplicates_collapse() {
            let client = MemoryClient::new()
                .with_video("a", "A", "10")
                .with_playlist("PL1", "One", &["a"])
                .with_playlist("PL2", "Two", &["a"]);
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(
                &refs(&[
                    "https://www.youtube.com/watch?v=a",
                    "https://www.youtube.com/playlist?list=PL1",
                    "https://www.youtube.com/playlist?list=PL2",
                ]),
                &categories(),
            );

            assert_eq!(resolved.videos.len(), 1);
            for id in resolved.videos.ids() {
                assert_eq!(resolved.videos.get(id).unwrap().video_id, id);
            }
        }

        #[test]
        fn test_unmapped_category_is_unknown() {
            let client = MemoryClient::new().with_video("x", "X", "99");
            let builder = VideoSetBuilder::new(&client);

            let resolved = builder.build(&refs(&["https://youtu.be/x"]), &categories());
            assert_eq!(resolved.videos.get("x").unwrap().category, "Unknown");
        }
    }

    #[test]
    fn test_list_all_members_follows_tokens() {
        let client = MemoryClient::new()
            .with_page_size(2)
            .with_playlist("PL", "Big", &["1", "2", "3", "4", "5"]);
        let builder = VideoSetBuilder::new(&client);

        let members = builder.list_all_members("PL").unwrap();
        let ids: Vec<&str> = members.iter().map(|m| m.video_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_page_error_aborts_walk() {
        let mut client = MockPlaylistClient::new();
        client
            .expect_list_members()
            .withf(|_, token| token.is_none())
            .returning(|_, _| {
                Ok(MemberPage {
                    items: vec![PlaylistMember {
                        membership_id: "m1".to_string(),
                        video_id: "v1".to_string(),
                    }],
                    next_page_token: Some("next".to_string()),
                })
            });
        client
            .expect_list_members()
            .withf(|_, token| token.as_deref() == Some("next"))
            .returning(|_, _| {
                Err(Error::Api {
                    status: 500,
                    message: "backendError".to_string(),
                })
            });

        let builder = VideoSetBuilder::new(&client);
        assert!(builder.list_all_members("PL").is_err());
    }

    #[test]
    fn test_metadata_is_batched() {
        let ids: Vec<String> = (0..120).map(|i| format!("v{i}")).collect();

        let mut client = MockPlaylistClient::new();
        client
            .expect_get_video_metadata_batch()
            .times(3)
            .returning(|chunk| {
                assert!(chunk.len() <= METADATA_BATCH_SIZE);
                Ok(chunk
                    .iter()
                    .map(|id| {
                        (
                            id.clone(),
                            VideoMetadata {
                                title: id.clone(),
                                category_code: "10".to_string(),
                            },
                        )
                    })
                    .collect())
            });
        client.expect_get_video_metadata().never();

        let builder = VideoSetBuilder::new(&client);
        assert_eq!(builder.fetch_metadata(&ids).len(), 120);
    }

    #[test]
    fn test_failed_batch_falls_back_to_single_fetches() {
        let client = MemoryClient::new()
            .with_video("a", "A", "10")
            .with_video("b", "B", "10")
            .fail_batches();
        let builder = VideoSetBuilder::new(&client);

        let found = builder.fetch_metadata(&refs(&["a", "b", "gone"]));
        assert_eq!(found.len(), 2);
        assert!(!found.contains_key("gone"));
    }

    #[test]
    fn test_single_video_uses_single_fetch() {
        let mut client = MockPlaylistClient::new();
        client
            .expect_get_video_metadata()
            .with(eq("abc"))
            .times(1)
            .returning(|_| {
                Ok(VideoMetadata {
                    title: "T".to_string(),
                    category_code: "20".to_string(),
                })
            });

        let builder = VideoSetBuilder::new(&client);
        let resolved = builder.build(&refs(&["https://www.youtube.com/watch?v=abc"]), &categories());
        assert_eq!(resolved.videos.get("abc").unwrap().category, "Gaming");
    }

    mod logging_tests {
        use std::io::{self, Write};
        use std::sync::{Arc, Mutex};

        use tracing::Level;

        use super::*;

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        /// Run `f` with a subscriber that keeps warnings and above.
        fn warnings_during(f: impl FnOnce()) -> String {
            let captured = Captured::default();
            let writer = captured.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(Level::WARN)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();
            tracing::subscriber::with_default(subscriber, f);
            let bytes = captured.0.lock().unwrap().clone();
            String::from_utf8(bytes).unwrap()
        }

        #[test]
        fn test_member_without_metadata_is_warned() {
            let client = MemoryClient::new()
                .with_video("a", "A", "10")
                .with_playlist("PLsrc", "Source", &["a", "deleted"]);
            let membership = client.members("PLsrc")[1].membership_id.clone();
            let builder = VideoSetBuilder::new(&client);

            let logs = warnings_during(|| {
                builder.snapshot_playlist("PLsrc", &categories()).unwrap();
            });

            assert!(logs.contains("WARN"));
            assert!(logs.contains("deleted"));
            assert!(logs.contains(&membership));
        }

        #[test]
        fn test_failed_single_fetch_is_warned() {
            let client = MemoryClient::new().with_video("a", "A", "10").fail_batches();
            let builder = VideoSetBuilder::new(&client);

            let logs = warnings_during(|| {
                builder.fetch_metadata(&refs(&["a", "gone"]));
            });

            assert!(logs.contains("Video gone is unavailable"));
        }
    }
}
