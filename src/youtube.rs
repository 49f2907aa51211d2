//! YouTube Data API v3 client.
//!
//! Only three endpoints are used: `channels` for the channel header and its
//! uploads playlist, `playlistItems` for the upload list and `videos` for
//! durations. Calls are blocking (`ureq`); async callers go through
//! `spawn_blocking`.

use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::catalog::{Channel, VideoItem};
use crate::error::{MirrorError, MirrorResult};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
/// Largest `maxResults` / id batch the Data API accepts.
pub const PAGE_SIZE: usize = 50;
const API_TIMEOUT: Duration = Duration::from_secs(10);
const SERVICE: &str = "youtube";

/// How the mirrored channel is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(String),
    Handle(String),
}

impl ChannelRef {
    /// `@name` is a handle, anything else a channel id.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.starts_with('@') {
            Self::Handle(trimmed.to_string())
        } else {
            Self::Id(trimmed.to_string())
        }
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Handle(handle) => f.write_str(handle),
        }
    }
}

/// One page of the uploads playlist.
#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<VideoItem>,
    pub next_page_token: Option<String>,
}

/// The calls the fetcher and classifier make against the video platform.
pub trait VideoPlatform: Send + Sync {
    fn channel(&self, channel: &ChannelRef) -> MirrorResult<Option<Channel>>;

    fn playlist_page(&self, playlist_id: &str, page_token: Option<&str>)
    -> MirrorResult<PlaylistPage>;

    /// Raw ISO-8601 durations keyed by video id. Ids the platform does not
    /// know are simply absent from the map.
    fn durations(&self, video_ids: &[String]) -> MirrorResult<HashMap<String, String>>;
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelResource {
    snippet: ChannelSnippet,
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    duration: Option<String>,
}

impl From<PlaylistItem> for VideoItem {
    fn from(item: PlaylistItem) -> Self {
        let PlaylistItemSnippet {
            title,
            description,
            published_at,
            thumbnails,
        } = item.snippet;
        let thumbnail = thumbnails
            .high
            .or(thumbnails.default)
            .map(|thumb| thumb.url)
            .unwrap_or_default();
        VideoItem {
            title,
            description,
            video_id: item.content_details.video_id,
            thumbnail,
            published_at,
        }
    }
}

/// Data API client authenticated with a plain API key.
#[derive(Clone)]
pub struct YouTubeClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(API_TIMEOUT).build(),
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE.to_string(),
        }
    }

    /// Points the client at another API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> MirrorResult<T> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let mut request = self
            .agent
            .get(&url)
            .timeout(API_TIMEOUT)
            .query("key", &self.api_key);
        for (key, value) in query {
            request = request.query(key, value);
        }
        debug!(endpoint, "calling YouTube Data API");
        let response = request
            .call()
            .map_err(|err| MirrorError::from_ureq(SERVICE, err))?;
        response
            .into_json::<T>()
            .map_err(|err| MirrorError::decode(endpoint, err))
    }
}

impl VideoPlatform for YouTubeClient {
    fn channel(&self, channel: &ChannelRef) -> MirrorResult<Option<Channel>> {
        let (selector, value) = match channel {
            ChannelRef::Id(id) => ("id", id.as_str()),
            ChannelRef::Handle(handle) => ("forHandle", handle.as_str()),
        };
        let response: ListResponse<ChannelResource> =
            self.get_json("channels", &[("part", "snippet,contentDetails"), (selector, value)])?;
        Ok(response.items.into_iter().next().map(|resource| Channel {
            title: resource.snippet.title,
            description: resource.snippet.description,
            uploads_playlist_id: resource.content_details.related_playlists.uploads,
        }))
    }

    fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> MirrorResult<PlaylistPage> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let response: ListResponse<PlaylistItem> = self.get_json("playlistItems", &query)?;
        Ok(PlaylistPage {
            items: response.items.into_iter().map(VideoItem::from).collect(),
            next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }

    fn durations(&self, video_ids: &[String]) -> MirrorResult<HashMap<String, String>> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = video_ids.join(",");
        let response: ListResponse<VideoResource> =
            self.get_json("videos", &[("part", "contentDetails"), ("id", ids.as_str())])?;
        Ok(response
            .items
            .into_iter()
            .filter_map(|video| {
                let duration = video.content_details?.duration?;
                Some((video.id, duration))
            })
            .collect())
    }
}
