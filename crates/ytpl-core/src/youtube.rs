//! YouTube Data API v3 implementation of [`PlaylistClient`].
//!
//! Every method is one blocking HTTPS round-trip authorized with an OAuth
//! bearer token. Obtaining the token is left to the caller.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use crate::client::{
    CreatedPlaylist, MAX_BATCH_SIZE, MemberPage, PlaylistClient, PlaylistMember, PlaylistMetadata,
    VideoMetadata,
};
use crate::config::{AppConfig, PlaylistPrivacy};
use crate::error::{Error, ResourceKind, Result};
use crate::model::CategoryLookup;
use crate::url::playlist_url;

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemResource {
    id: String,
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct InsertedResource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    category_id: String,
}

#[derive(Debug, Deserialize)]
struct TitledListResponse {
    #[serde(default)]
    items: Vec<TitledResource>,
}

#[derive(Debug, Deserialize)]
struct TitledResource {
    id: String,
    snippet: TitledSnippet,
}

#[derive(Debug, Deserialize)]
struct TitledSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

// =============================================================================
// Client
// =============================================================================

/// Blocking YouTube Data API client.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: String,
    access_token: String,
    privacy: PlaylistPrivacy,
}

impl YouTubeClient {
    /// Create a client against `base_url` with the given bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ytpl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            privacy: PlaylistPrivacy::default(),
        })
    }

    /// Create a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, access_token: &str) -> Result<Self> {
        let client = Self::new(
            &config.api_base_url,
            access_token,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(client.with_privacy(config.new_playlist_privacy))
    }

    /// Set the privacy status of playlists this client creates.
    #[must_use]
    pub const fn with_privacy(mut self, privacy: PlaylistPrivacy) -> Self {
        self.privacy = privacy;
        self
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{resource}", self.base_url)
    }

    /// Send a request and map non-success statuses to errors.
    ///
    /// A 404 becomes [`Error::NotFound`] for `(resource, id)`.
    fn send(&self, request: RequestBuilder, resource: ResourceKind, id: &str) -> Result<Response> {
        let response = request.bearer_auth(&self.access_token).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(error_from_status(status, &body, resource, id))
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: ResourceKind,
        id: &str,
    ) -> Result<T> {
        let body = self.send(request, resource, id)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Map an unsuccessful HTTP status and its body to an [`Error`].
fn error_from_status(status: StatusCode, body: &str, resource: ResourceKind, id: &str) -> Error {
    if status == StatusCode::NOT_FOUND {
        return Error::NotFound {
            resource,
            id: id.to_string(),
        };
    }
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

impl PlaylistClient for YouTubeClient {
    fn list_members(&self, playlist_id: &str, page_token: Option<String>) -> Result<MemberPage> {
        let max_results = MAX_BATCH_SIZE.to_string();
        let mut query = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token.as_deref() {
            query.push(("pageToken", token));
        }

        let request = self.http.get(self.endpoint("playlistItems")).query(&query);
        let response: PlaylistItemListResponse =
            self.send_json(request, ResourceKind::Playlist, playlist_id)?;

        debug!(
            "Fetched {} member(s) of {} (more: {})",
            response.items.len(),
            playlist_id,
            response.next_page_token.is_some()
        );
        Ok(MemberPage {
            items: response
                .items
                .into_iter()
                .map(|item| PlaylistMember {
                    membership_id: item.id,
                    video_id: item.content_details.video_id,
                })
                .collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    fn get_video_metadata(&self, video_id: &str) -> Result<VideoMetadata> {
        let mut found = self.get_video_metadata_batch(&[video_id.to_string()])?;
        found
            .remove(video_id)
            .ok_or_else(|| Error::video_not_found(video_id))
    }

    fn get_video_metadata_batch(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoMetadata>> {
        let mut found = HashMap::with_capacity(video_ids.len());
        for chunk in video_ids.chunks(MAX_BATCH_SIZE) {
            let ids = chunk.join(",");
            let request = self
                .http
                .get(self.endpoint("videos"))
                .query(&[("part", "snippet"), ("id", ids.as_str())]);
            let response: VideoListResponse =
                self.send_json(request, ResourceKind::Video, &ids)?;

            debug!(
                "Fetched metadata for {}/{} video(s)",
                response.items.len(),
                chunk.len()
            );
            found.extend(response.items.into_iter().map(|video| {
                (
                    video.id,
                    VideoMetadata {
                        title: video.snippet.title,
                        category_code: video.snippet.category_id,
                    },
                )
            }));
        }
        Ok(found)
    }

    fn insert_member(&self, playlist_id: &str, video_id: &str) -> Result<String> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": video_id },
            }
        });
        let request = self
            .http
            .post(self.endpoint("playlistItems"))
            .query(&[("part", "snippet")])
            .json(&body);
        let inserted: InsertedResource =
            self.send_json(request, ResourceKind::Playlist, playlist_id)?;
        Ok(inserted.id)
    }

    fn delete_member(&self, membership_id: &str) -> Result<()> {
        let request = self
            .http
            .delete(self.endpoint("playlistItems"))
            .query(&[("id", membership_id)]);
        self.send(request, ResourceKind::PlaylistItem, membership_id)?;
        Ok(())
    }

    fn create_playlist(&self, title: &str) -> Result<CreatedPlaylist> {
        let body = json!({
            "snippet": { "title": title },
            "status": { "privacyStatus": self.privacy.as_api_str() },
        });
        let request = self
            .http
            .post(self.endpoint("playlists"))
            .query(&[("part", "snippet,status")])
            .json(&body);
        let created: InsertedResource = self.send_json(request, ResourceKind::Playlist, title)?;

        info!("Created {} playlist '{}' ({})", self.privacy, title, created.id);
        Ok(CreatedPlaylist {
            playlist_url: playlist_url(&created.id),
            playlist_id: created.id,
        })
    }

    fn list_categories(&self, region_code: &str) -> Result<CategoryLookup> {
        let request = self
            .http
            .get(self.endpoint("videoCategories"))
            .query(&[("part", "snippet"), ("regionCode", region_code)]);
        let response: TitledListResponse =
            self.send_json(request, ResourceKind::CategoryRegion, region_code)?;
        Ok(response
            .items
            .into_iter()
            .map(|c| (c.id, c.snippet.title))
            .collect())
    }

    fn get_playlist_metadata(&self, playlist_id: &str) -> Result<PlaylistMetadata> {
        let request = self
            .http
            .get(self.endpoint("playlists"))
            .query(&[("part", "snippet"), ("id", playlist_id)]);
        let response: TitledListResponse =
            self.send_json(request, ResourceKind::Playlist, playlist_id)?;
        response
            .items
            .into_iter()
            .find(|p| p.id == playlist_id)
            .map(|p| PlaylistMetadata {
                title: p.snippet.title,
            })
            .ok_or_else(|| Error::playlist_not_found(playlist_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod error_mapping_tests {
        use super::*;

        #[test]
        fn test_404_is_not_found() {
            let err = error_from_status(
                StatusCode::NOT_FOUND,
                "",
                ResourceKind::Playlist,
                "PLmissing",
            );
            assert!(err.is_not_found());
            assert_eq!(err.to_string(), "playlist not found: PLmissing");
        }

        #[test]
        fn test_missing_category_region_names_the_region() {
            let err = error_from_status(
                StatusCode::NOT_FOUND,
                "",
                ResourceKind::CategoryRegion,
                "ZZ",
            );
            assert_eq!(err.to_string(), "category region not found: ZZ");
        }

        #[test]
        fn test_api_body_message_is_used() {
            let body = r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota."}}"#;
            let err = error_from_status(StatusCode::FORBIDDEN, body, ResourceKind::Video, "v");
            match err {
                Error::Api { status, message } => {
                    assert_eq!(status, 403);
                    assert!(message.contains("quota"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_unparseable_body_falls_back_to_reason() {
            let err = error_from_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "<html>oops</html>",
                ResourceKind::Video,
                "v",
            );
            assert_eq!(err.to_string(), "API error (HTTP 500): Internal Server Error");
        }
    }

    mod wire_tests {
        use super::*;

        #[test]
        fn test_parse_playlist_items_page() {
            let body = r#"{
                "kind": "youtube#playlistItemListResponse",
                "nextPageToken": "CDIQAA",
                "items": [
                    {"id": "UExpdGVtMQ", "contentDetails": {"videoId": "abc123"}},
                    {"id": "UExpdGVtMg", "contentDetails": {"videoId": "def456"}}
                ]
            }"#;
            let page: PlaylistItemListResponse = serde_json::from_str(body).unwrap();
            assert_eq!(page.items.len(), 2);
            assert_eq!(page.items[1].content_details.video_id, "def456");
            assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
        }

        #[test]
        fn test_parse_last_page_without_token() {
            let page: PlaylistItemListResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
            assert!(page.next_page_token.is_none());
        }

        #[test]
        fn test_parse_video_snippet() {
            let body = r#"{"items": [{"id": "abc123", "snippet": {"title": "Song", "categoryId": "10"}}]}"#;
            let videos: VideoListResponse = serde_json::from_str(body).unwrap();
            assert_eq!(videos.items[0].snippet.title, "Song");
            assert_eq!(videos.items[0].snippet.category_id, "10");
        }

        #[test]
        fn test_parse_categories() {
            let body = r#"{"items": [
                {"id": "10", "snippet": {"title": "Music"}},
                {"id": "20", "snippet": {"title": "Gaming"}}
            ]}"#;
            let response: TitledListResponse = serde_json::from_str(body).unwrap();
            let lookup: CategoryLookup = response
                .items
                .into_iter()
                .map(|c| (c.id, c.snippet.title))
                .collect();
            assert_eq!(lookup.label("20"), "Gaming");
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = YouTubeClient::new(
            "https://example.test/youtube/v3/",
            "token",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("videos"),
            "https://example.test/youtube/v3/videos"
        );
    }
}
