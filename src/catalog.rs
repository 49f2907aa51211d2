//! Catalog records shared by the fetcher, the cache stores and the renderer.
//!
//! Field names mirror the JSON kept in the cache document so older documents
//! written by other tools stay readable.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Channel metadata looked up once per cache miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub description: String,
    /// Identifier of the channel's uploads playlist.
    pub uploads_playlist_id: String,
}

/// One public upload of the mirrored channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_id: String,
    #[serde(default)]
    pub thumbnail: String,
    pub published_at: String,
}

/// JSON blob persisted in the cache stores.
///
/// `regular_videos` and `shorts` partition `videos`. Documents written by
/// older tools sometimes break that; [`CacheDocument::repair_partition`]
/// restores it after a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDocument {
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub channel_description: String,
    #[serde(default)]
    pub videos: Vec<VideoItem>,
    #[serde(default)]
    pub shorts: Vec<VideoItem>,
    #[serde(default)]
    pub regular_videos: Vec<VideoItem>,
    #[serde(default)]
    pub last_update: String,
}

impl CacheDocument {
    pub fn new(
        channel: &Channel,
        videos: Vec<VideoItem>,
        regular_videos: Vec<VideoItem>,
        shorts: Vec<VideoItem>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            channel_title: channel.title.clone(),
            channel_description: channel.description.clone(),
            videos,
            shorts,
            regular_videos,
            last_update: format_timestamp(now),
        }
    }

    /// True when every item of `videos` appears in exactly one of the two
    /// classified lists and nothing else does.
    pub fn is_partitioned(&self) -> bool {
        if self.shorts.len() + self.regular_videos.len() != self.videos.len() {
            return false;
        }
        let all: HashSet<&str> = self.videos.iter().map(|v| v.video_id.as_str()).collect();
        if all.len() != self.videos.len() {
            return false;
        }
        let mut seen = HashSet::new();
        self.shorts
            .iter()
            .chain(&self.regular_videos)
            .all(|v| all.contains(v.video_id.as_str()) && seen.insert(v.video_id.as_str()))
    }

    /// Rebuilds the classified lists so they partition `videos` again.
    ///
    /// Shorts are trusted when they belong to the full list; every other item
    /// becomes regular. Both lists follow the full-list order. Returns whether
    /// anything changed.
    pub fn repair_partition(&mut self) -> bool {
        if self.is_partitioned() {
            return false;
        }

        let mut seen = HashSet::new();
        self.videos.retain(|v| seen.insert(v.video_id.clone()));

        let short_ids: HashSet<&str> = self.shorts.iter().map(|v| v.video_id.as_str()).collect();
        let (shorts, regular): (Vec<_>, Vec<_>) = self
            .videos
            .iter()
            .cloned()
            .partition(|v| short_ids.contains(v.video_id.as_str()));
        self.shorts = shorts;
        self.regular_videos = regular;
        true
    }

    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_update)
            .ok()
            .map(|value| value.with_timezone(&Utc))
    }
}

/// RFC 3339 in UTC with a `Z` suffix, the format stored in `last_update`.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Orders items newest first. Timestamps are ISO-8601 strings, so a string
/// comparison is a chronological one; ties keep their input order.
pub fn sort_newest_first(items: &mut [VideoItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, published_at: &str) -> VideoItem {
        VideoItem {
            title: format!("Video {id}"),
            description: String::new(),
            video_id: id.into(),
            thumbnail: String::new(),
            published_at: published_at.into(),
        }
    }

    fn document(videos: &[&str], shorts: &[&str], regular: &[&str]) -> CacheDocument {
        let make = |ids: &[&str]| ids.iter().map(|id| item(id, "2024-01-01T00:00:00Z")).collect();
        CacheDocument {
            channel_title: "Channel".into(),
            channel_description: String::new(),
            videos: make(videos),
            shorts: make(shorts),
            regular_videos: make(regular),
            last_update: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn partition_detects_overlap_and_omission() {
        assert!(document(&["a", "b"], &["a"], &["b"]).is_partitioned());
        assert!(!document(&["a", "b"], &["a"], &["a", "b"]).is_partitioned());
        assert!(!document(&["a", "b"], &[], &["a"]).is_partitioned());
        assert!(!document(&["a"], &["z"], &[]).is_partitioned());
    }

    #[test]
    fn repair_recomputes_regular_from_shorts() {
        // Older documents stored every video as regular alongside the shorts.
        let mut doc = document(&["a", "b", "c"], &["b", "zz"], &["a", "b", "c"]);
        assert!(doc.repair_partition());
        let ids = |list: &[VideoItem]| list.iter().map(|v| v.video_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&doc.shorts), vec!["b"]);
        assert_eq!(ids(&doc.regular_videos), vec!["a", "c"]);
        assert!(doc.is_partitioned());
        assert!(!doc.repair_partition());
    }

    #[test]
    fn missing_lists_deserialize_empty() {
        let raw = r#"{
            "channel_title": "Channel",
            "channel_description": "About",
            "videos": [{"title": "t", "video_id": "a", "published_at": "2024-01-01T00:00:00Z"}],
            "last_update": "2024-01-01T00:00:00Z"
        }"#;
        let mut doc: CacheDocument = serde_json::from_str(raw).unwrap();
        assert!(doc.shorts.is_empty());
        doc.repair_partition();
        assert_eq!(doc.regular_videos.len(), 1);
        assert_eq!(doc.videos[0].thumbnail, "");
    }

    #[test]
    fn sort_orders_newest_first_and_is_stable() {
        let mut items = vec![
            item("old", "2023-01-01T00:00:00Z"),
            item("tie-1", "2024-01-01T00:00:00Z"),
            item("new", "2024-05-01T00:00:00Z"),
            item("tie-2", "2024-01-01T00:00:00Z"),
        ];
        sort_newest_first(&mut items);
        let ids: Vec<_> = items.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "tie-1", "tie-2", "old"]);
    }

    #[test]
    fn timestamps_use_z_suffix_and_parse_back() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        let stamp = format_timestamp(now);
        assert_eq!(stamp, "2024-03-04T05:06:07.000000Z");

        let mut doc = document(&[], &[], &[]);
        doc.last_update = stamp;
        assert_eq!(doc.last_update_time(), Some(now));
    }
}
