//! In-memory playlist service.
//!
//! `MemoryClient` keeps videos, playlists and categories in process and
//! implements [`PlaylistClient`] on top of them. It pages member listings like
//! the real service, can be told to fail specific calls, and records every
//! mutating call it receives so callers can assert on what was attempted.
//!
//! ```rust
//! use ytpl_core::client::PlaylistClient;
//! use ytpl_core::memory::MemoryClient;
//!
//! let client = MemoryClient::new()
//!     .with_category("10", "Music")
//!     .with_video("abc123", "Song", "10")
//!     .with_playlist("PLdest", "Destination", &[]);
//!
//! client.insert_member("PLdest", "abc123").unwrap();
//! assert_eq!(client.member_video_ids("PLdest"), vec!["abc123".to_string()]);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::client::{
    CreatedPlaylist, MAX_BATCH_SIZE, MemberPage, PlaylistClient, PlaylistMember, PlaylistMetadata,
    VideoMetadata,
};
use crate::error::{Error, ResourceKind, Result};
use crate::model::CategoryLookup;
use crate::url::playlist_url;

/// Default number of members returned per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// A mutating call received by [`MemoryClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `insert_member` was called.
    Insert {
        /// Target playlist.
        playlist_id: String,
        /// Video to add.
        video_id: String,
    },
    /// `delete_member` was called.
    Delete {
        /// Membership to delete.
        membership_id: String,
    },
    /// `create_playlist` was called.
    Create {
        /// Requested title.
        title: String,
    },
}

#[derive(Debug, Clone, Default)]
struct StoredPlaylist {
    title: String,
    members: Vec<PlaylistMember>,
}

#[derive(Debug, Default)]
struct State {
    videos: HashMap<String, VideoMetadata>,
    playlists: BTreeMap<String, StoredPlaylist>,
    categories: HashMap<String, String>,
    next_id: u64,
    failing_inserts: HashSet<String>,
    failing_deletes: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_batches: bool,
    unreadable_playlists: HashSet<String>,
    mutations: Vec<Mutation>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }
}

/// In-memory [`PlaylistClient`].
#[derive(Debug)]
pub struct MemoryClient {
    state: RefCell<State>,
    page_size: usize,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    /// Create an empty service.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the number of members returned per page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Register a category label.
    #[must_use]
    pub fn with_category(self, code: &str, label: &str) -> Self {
        self.state
            .borrow_mut()
            .categories
            .insert(code.to_string(), label.to_string());
        self
    }

    /// Register a video.
    #[must_use]
    pub fn with_video(self, video_id: &str, title: &str, category_code: &str) -> Self {
        self.state.borrow_mut().videos.insert(
            video_id.to_string(),
            VideoMetadata {
                title: title.to_string(),
                category_code: category_code.to_string(),
            },
        );
        self
    }

    /// Register a playlist holding the given videos, in order.
    ///
    /// Video ids do not have to be registered videos; unregistered members
    /// behave like deleted or private videos.
    #[must_use]
    pub fn with_playlist(self, playlist_id: &str, title: &str, video_ids: &[&str]) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let mut members = Vec::with_capacity(video_ids.len());
            for video_id in video_ids {
                let membership_id = state.next_id(&format!("{playlist_id}-item-"));
                members.push(PlaylistMember {
                    membership_id,
                    video_id: (*video_id).to_string(),
                });
            }
            state.playlists.insert(
                playlist_id.to_string(),
                StoredPlaylist {
                    title: title.to_string(),
                    members,
                },
            );
        }
        self
    }

    /// Make inserts of this video fail.
    #[must_use]
    pub fn fail_insert_of(self, video_id: &str) -> Self {
        self.state
            .borrow_mut()
            .failing_inserts
            .insert(video_id.to_string());
        self
    }

    /// Make deletes of this membership fail.
    #[must_use]
    pub fn fail_delete_of(self, membership_id: &str) -> Self {
        self.state
            .borrow_mut()
            .failing_deletes
            .insert(membership_id.to_string());
        self
    }

    /// Make creation of a playlist with this title fail.
    #[must_use]
    pub fn fail_create_of(self, title: &str) -> Self {
        self.state
            .borrow_mut()
            .failing_creates
            .insert(title.to_string());
        self
    }

    /// Make every batch metadata request fail.
    #[must_use]
    pub fn fail_batches(self) -> Self {
        self.state.borrow_mut().failing_batches = true;
        self
    }

    /// Make a registered playlist unreadable (access denied).
    #[must_use]
    pub fn deny_read_of(self, playlist_id: &str) -> Self {
        self.state
            .borrow_mut()
            .unreadable_playlists
            .insert(playlist_id.to_string());
        self
    }

    /// Video ids currently in a playlist, in membership order.
    pub fn member_video_ids(&self, playlist_id: &str) -> Vec<String> {
        self.state
            .borrow()
            .playlists
            .get(playlist_id)
            .map(|p| p.members.iter().map(|m| m.video_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Memberships currently in a playlist.
    pub fn members(&self, playlist_id: &str) -> Vec<PlaylistMember> {
        self.state
            .borrow()
            .playlists
            .get(playlist_id)
            .map(|p| p.members.clone())
            .unwrap_or_default()
    }

    /// Ids and titles of every playlist, ordered by id.
    pub fn playlists(&self) -> Vec<(String, String)> {
        self.state
            .borrow()
            .playlists
            .iter()
            .map(|(id, p)| (id.clone(), p.title.clone()))
            .collect()
    }

    /// Id of the playlist with the given title.
    pub fn playlist_id_by_title(&self, title: &str) -> Option<String> {
        self.state
            .borrow()
            .playlists
            .iter()
            .find(|(_, p)| p.title == title)
            .map(|(id, _)| id.clone())
    }

    /// Every mutating call received so far.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.borrow().mutations.clone()
    }

    /// Number of mutating calls received so far.
    pub fn mutation_count(&self) -> usize {
        self.state.borrow().mutations.len()
    }

    /// Remove a member behind the client's back, as a manual edit would.
    pub fn remove_externally(&self, playlist_id: &str, video_id: &str) {
        if let Some(playlist) = self.state.borrow_mut().playlists.get_mut(playlist_id) {
            playlist.members.retain(|m| m.video_id != video_id);
        }
    }
}

impl PlaylistClient for MemoryClient {
    fn list_members(&self, playlist_id: &str, page_token: Option<String>) -> Result<MemberPage> {
        let state = self.state.borrow();
        if state.unreadable_playlists.contains(playlist_id) {
            return Err(Error::Api {
                status: 403,
                message: format!("playlistItemsNotAccessible: {playlist_id}"),
            });
        }
        let playlist = state
            .playlists
            .get(playlist_id)
            .ok_or_else(|| Error::playlist_not_found(playlist_id))?;

        let offset = match page_token {
            Some(token) => token.parse::<usize>().map_err(|_| Error::Api {
                status: 400,
                message: format!("invalidPageToken: {token}"),
            })?,
            None => 0,
        };
        let end = offset.saturating_add(self.page_size).min(playlist.members.len());
        let items = playlist
            .members
            .get(offset..end)
            .map(<[PlaylistMember]>::to_vec)
            .unwrap_or_default();
        let next_page_token = (end < playlist.members.len()).then(|| end.to_string());

        debug!(
            "Listed {} member(s) of {} from offset {}",
            items.len(),
            playlist_id,
            offset
        );
        Ok(MemberPage {
            items,
            next_page_token,
        })
    }

    fn get_video_metadata(&self, video_id: &str) -> Result<VideoMetadata> {
        self.state
            .borrow()
            .videos
            .get(video_id)
            .cloned()
            .ok_or_else(|| Error::video_not_found(video_id))
    }

    fn get_video_metadata_batch(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoMetadata>> {
        let state = self.state.borrow();
        if state.failing_batches {
            return Err(Error::Api {
                status: 503,
                message: "backendError".to_string(),
            });
        }
        if video_ids.len() > MAX_BATCH_SIZE {
            return Err(Error::Api {
                status: 400,
                message: format!("too many ids in one request: {}", video_ids.len()),
            });
        }
        Ok(video_ids
            .iter()
            .filter_map(|id| state.videos.get(id).map(|m| (id.clone(), m.clone())))
            .collect())
    }

    fn insert_member(&self, playlist_id: &str, video_id: &str) -> Result<String> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(Mutation::Insert {
            playlist_id: playlist_id.to_string(),
            video_id: video_id.to_string(),
        });

        if state.failing_inserts.contains(video_id) {
            return Err(Error::Api {
                status: 500,
                message: "backendError".to_string(),
            });
        }
        if !state.playlists.contains_key(playlist_id) {
            return Err(Error::playlist_not_found(playlist_id));
        }
        if !state.videos.contains_key(video_id) {
            return Err(Error::video_not_found(video_id));
        }

        let membership_id = state.next_id(&format!("{playlist_id}-item-"));
        if let Some(playlist) = state.playlists.get_mut(playlist_id) {
            playlist.members.push(PlaylistMember {
                membership_id: membership_id.clone(),
                video_id: video_id.to_string(),
            });
        }
        Ok(membership_id)
    }

    fn delete_member(&self, membership_id: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(Mutation::Delete {
            membership_id: membership_id.to_string(),
        });

        if state.failing_deletes.contains(membership_id) {
            return Err(Error::Api {
                status: 500,
                message: "backendError".to_string(),
            });
        }
        for playlist in state.playlists.values_mut() {
            if let Some(pos) = playlist
                .members
                .iter()
                .position(|m| m.membership_id == membership_id)
            {
                playlist.members.remove(pos);
                return Ok(());
            }
        }
        Err(Error::NotFound {
            resource: ResourceKind::PlaylistItem,
            id: membership_id.to_string(),
        })
    }

    fn create_playlist(&self, title: &str) -> Result<CreatedPlaylist> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(Mutation::Create {
            title: title.to_string(),
        });

        if state.failing_creates.contains(title) {
            return Err(Error::Api {
                status: 403,
                message: "playlistCreationFailed".to_string(),
            });
        }
        let playlist_id = state.next_id("PLmem");
        state.playlists.insert(
            playlist_id.clone(),
            StoredPlaylist {
                title: title.to_string(),
                members: Vec::new(),
            },
        );
        Ok(CreatedPlaylist {
            playlist_url: playlist_url(&playlist_id),
            playlist_id,
        })
    }

    fn list_categories(&self, _region_code: &str) -> Result<CategoryLookup> {
        Ok(self
            .state
            .borrow()
            .categories
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn get_playlist_metadata(&self, playlist_id: &str) -> Result<PlaylistMetadata> {
        self.state
            .borrow()
            .playlists
            .get(playlist_id)
            .map(|p| PlaylistMetadata {
                title: p.title.clone(),
            })
            .ok_or_else(|| Error::playlist_not_found(playlist_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_follow_tokens() {
        let client = MemoryClient::new()
            .with_page_size(2)
            .with_playlist("PL1", "One", &["a", "b", "c"]);

        let first = client.list_members("PL1", None).unwrap();
        assert_eq!(first.items.len(), 2);
        let token = first.next_page_token.unwrap();

        let second = client.list_members("PL1", Some(token)).unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].video_id, "c");
        assert!(second.next_page_token.is_none());
    }

    #[test]
    fn test_page_token_past_the_end_is_empty() {
        let client = MemoryClient::new()
            .with_page_size(2)
            .with_playlist("PL1", "One", &["a", "b", "c"]);

        let page = client
            .list_members("PL1", Some(usize::MAX.to_string()))
            .unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_unknown_playlist_not_found() {
        let client = MemoryClient::new();
        let err = client.list_members("PLnope", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_insert_then_delete() {
        let client = MemoryClient::new()
            .with_video("v1", "Video", "10")
            .with_playlist("PL1", "One", &[]);

        let membership = client.insert_member("PL1", "v1").unwrap();
        assert_eq!(client.member_video_ids("PL1"), vec!["v1".to_string()]);

        client.delete_member(&membership).unwrap();
        assert!(client.member_video_ids("PL1").is_empty());
        assert_eq!(client.mutation_count(), 2);
    }

    #[test]
    fn test_injected_insert_failure_is_recorded() {
        let client = MemoryClient::new()
            .with_video("v1", "Video", "10")
            .with_playlist("PL1", "One", &[])
            .fail_insert_of("v1");

        assert!(client.insert_member("PL1", "v1").is_err());
        assert!(client.member_video_ids("PL1").is_empty());
        assert_eq!(client.mutation_count(), 1);
    }

    #[test]
    fn test_batch_omits_unknown_videos() {
        let client = MemoryClient::new().with_video("v1", "Video", "10");
        let found = client
            .get_video_metadata_batch(&["v1".to_string(), "gone".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("v1"));
    }

    #[test]
    fn test_create_playlist_registers_title() {
        let client = MemoryClient::new();
        let created = client.create_playlist("Music_mix").unwrap();
        assert_eq!(
            client.playlist_id_by_title("Music_mix"),
            Some(created.playlist_id.clone())
        );
        assert!(created.playlist_url.ends_with(&created.playlist_id));
    }
}
