//! Fakes shared by the unit tests: an in-memory video platform and cache
//! store, plus small fixtures.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::catalog::{CacheDocument, Channel, VideoItem};
use crate::config::{DEFAULT_CHANNEL, DEFAULT_MIRROR_HOST, DEFAULT_MIRROR_PORT, MirrorSettings};
use crate::error::{MirrorError, MirrorResult};
use crate::store::CacheStore;
use crate::youtube::{ChannelRef, PlaylistPage, VideoPlatform};

pub fn video(id: &str, date: &str) -> VideoItem {
    VideoItem {
        title: format!("Video {id}"),
        description: format!("About {id}"),
        video_id: id.into(),
        thumbnail: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
        published_at: format!("{date}T00:00:00Z"),
    }
}

pub fn channel() -> Channel {
    Channel {
        title: "Test Channel".into(),
        description: "Everything about tests".into(),
        uploads_playlist_id: "UUtest".into(),
    }
}

pub fn sample_document() -> CacheDocument {
    let long = video("long", "2024-02-01");
    let short = video("short", "2024-01-01");
    CacheDocument {
        channel_title: "Test Channel".into(),
        channel_description: "Everything about tests".into(),
        videos: vec![long.clone(), short.clone()],
        shorts: vec![short],
        regular_videos: vec![long],
        last_update: "2024-02-02T00:00:00.000000Z".into(),
    }
}

pub fn settings() -> MirrorSettings {
    MirrorSettings {
        youtube_api_key: None,
        github_token: None,
        gist_id: None,
        channel: DEFAULT_CHANNEL.into(),
        local_cache: None,
        cache_max_age_hours: None,
        mirror_host: DEFAULT_MIRROR_HOST.into(),
        mirror_port: DEFAULT_MIRROR_PORT,
    }
}

/// Scripted [`VideoPlatform`]. Pages are keyed by the token that requests
/// them (`None` for the first page).
#[derive(Default)]
pub struct FakePlatform {
    channel: Option<Channel>,
    pages: HashMap<Option<String>, PlaylistPage>,
    durations: HashMap<String, String>,
    fail_durations: bool,
    fail_channel: bool,
    page_requests: Mutex<Vec<Option<String>>>,
    duration_batches: Mutex<Vec<usize>>,
    channel_lookups: Mutex<usize>,
}

impl FakePlatform {
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_page(
        mut self,
        token: Option<&str>,
        items: Vec<VideoItem>,
        next: Option<&str>,
    ) -> Self {
        self.pages.insert(
            token.map(str::to_string),
            PlaylistPage {
                items,
                next_page_token: next.map(str::to_string),
            },
        );
        self
    }

    pub fn with_duration(mut self, video_id: &str, duration: &str) -> Self {
        self.durations.insert(video_id.into(), duration.into());
        self
    }

    pub fn failing_durations(mut self) -> Self {
        self.fail_durations = true;
        self
    }

    pub fn failing_channel(mut self) -> Self {
        self.fail_channel = true;
        self
    }

    pub fn page_requests(&self) -> Vec<Option<String>> {
        self.page_requests.lock().clone()
    }

    pub fn duration_batches(&self) -> Vec<usize> {
        self.duration_batches.lock().clone()
    }

    pub fn channel_lookups(&self) -> usize {
        *self.channel_lookups.lock()
    }
}

impl VideoPlatform for FakePlatform {
    fn channel(&self, _channel: &ChannelRef) -> MirrorResult<Option<Channel>> {
        *self.channel_lookups.lock() += 1;
        if self.fail_channel {
            return Err(MirrorError::Status {
                service: "youtube",
                status: 403,
                body: "quotaExceeded".into(),
            });
        }
        Ok(self.channel.clone())
    }

    fn playlist_page(
        &self,
        _playlist_id: &str,
        page_token: Option<&str>,
    ) -> MirrorResult<PlaylistPage> {
        let key = page_token.map(str::to_string);
        self.page_requests.lock().push(key.clone());
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }

    fn durations(&self, video_ids: &[String]) -> MirrorResult<HashMap<String, String>> {
        self.duration_batches.lock().push(video_ids.len());
        if self.fail_durations {
            return Err(MirrorError::Transport {
                service: "youtube",
                message: "connection reset".into(),
            });
        }
        Ok(video_ids
            .iter()
            .filter_map(|id| {
                self.durations
                    .get(id)
                    .map(|duration| (id.clone(), duration.clone()))
            })
            .collect())
    }
}

/// In-memory [`CacheStore`]; clones share the same slot.
#[derive(Clone)]
pub struct MemoryStore {
    name: String,
    slot: Arc<Mutex<Option<CacheDocument>>>,
    failing: bool,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            slot: Arc::default(),
            failing: false,
            saves: Arc::default(),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    pub fn put(&self, document: CacheDocument) {
        *self.slot.lock() = Some(document);
    }

    pub fn get(&self) -> Option<CacheDocument> {
        self.slot.lock().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock()
    }
}

impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> MirrorResult<Option<CacheDocument>> {
        if self.failing {
            return Err(MirrorError::Transport {
                service: "memory",
                message: "store offline".into(),
            });
        }
        Ok(self.get())
    }

    fn save(&self, document: &CacheDocument) -> MirrorResult<()> {
        if self.failing {
            return Err(MirrorError::Transport {
                service: "memory",
                message: "store offline".into(),
            });
        }
        *self.saves.lock() += 1;
        self.put(document.clone());
        Ok(())
    }
}
