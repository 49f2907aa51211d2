//! Cache-first loading of the channel catalog.
//!
//! A hit is the first document the gateway yields with at least one video
//! (and, when a maximum age is configured, a recent enough `last_update`).
//! Everything else is a miss that goes to the Data API and writes the fresh
//! document back through the gateway.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::catalog::CacheDocument;
use crate::classifier::classify;
use crate::config::MirrorSettings;
use crate::error::{MirrorError, MirrorResult};
use crate::fetcher::{fetch_channel, fetch_uploads};
use crate::render::render_page;
use crate::store::CacheGateway;
use crate::youtube::{ChannelRef, VideoPlatform, YouTubeClient};

pub struct Mirror {
    platform: Option<Arc<dyn VideoPlatform>>,
    gateway: CacheGateway,
    channel: ChannelRef,
    max_age: Option<Duration>,
    refresh_lock: Mutex<()>,
}

impl Mirror {
    /// `platform` is `None` when no API key is configured; such a mirror can
    /// still serve cache hits.
    pub fn new(
        platform: Option<Arc<dyn VideoPlatform>>,
        gateway: CacheGateway,
        channel: ChannelRef,
    ) -> Self {
        Self {
            platform,
            gateway,
            channel,
            max_age: None,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn from_settings(settings: &MirrorSettings) -> Self {
        let platform = settings.youtube_api_key.as_ref().map(|key| {
            Arc::new(YouTubeClient::new(key.clone())) as Arc<dyn VideoPlatform>
        });
        if platform.is_none() {
            warn!("YOUTUBE_API_KEY is not set, only cached catalogs can be served");
        }
        let mirror = Self::new(
            platform,
            CacheGateway::from_settings(settings),
            ChannelRef::parse(&settings.channel),
        );
        let max_age = settings
            .cache_max_age_hours
            .and_then(|hours| i64::try_from(hours).ok())
            .and_then(Duration::try_hours);
        match max_age {
            Some(max_age) => mirror.with_max_age(max_age),
            None => mirror,
        }
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    /// Cached document when there is a usable one, otherwise a fresh one.
    /// `refresh` skips the cache read.
    pub fn load(&self, refresh: bool) -> MirrorResult<CacheDocument> {
        self.load_at(refresh, Utc::now())
    }

    pub fn render(&self) -> MirrorResult<String> {
        self.load(false).map(|document| render_page(&document))
    }

    fn load_at(&self, refresh: bool, now: DateTime<Utc>) -> MirrorResult<CacheDocument> {
        if !refresh {
            if let Some(document) = self.cached(now) {
                return Ok(document);
            }
        }

        let _guard = self.refresh_lock.lock();
        // Another request may have refreshed the cache while we waited.
        if !refresh {
            if let Some(document) = self.cached(now) {
                return Ok(document);
            }
        }

        info!(channel = %self.channel, forced = refresh, "cache miss, fetching catalog");
        let document = self.fetch_document(now)?;
        if let Err(err) = self.gateway.write(&document) {
            warn!("fresh catalog was not cached: {err}");
        }
        Ok(document)
    }

    /// Builds a document from the Data API without touching the cache.
    pub fn fetch_document(&self, now: DateTime<Utc>) -> MirrorResult<CacheDocument> {
        let platform = self
            .platform
            .as_deref()
            .ok_or(MirrorError::MissingCredential("YOUTUBE_API_KEY"))?;

        let channel = fetch_channel(platform, &self.channel)?;
        let videos = fetch_uploads(platform, &channel.uploads_playlist_id)?;
        let classification = classify(platform, &videos);
        info!(
            videos = videos.len(),
            shorts = classification.shorts.len(),
            regular = classification.regular.len(),
            "catalog classified"
        );
        Ok(CacheDocument::new(
            &channel,
            videos,
            classification.regular,
            classification.shorts,
            now,
        ))
    }

    fn cached(&self, now: DateTime<Utc>) -> Option<CacheDocument> {
        let mut document = self.gateway.read()?;
        if let Some(max_age) = self.max_age {
            let fresh = document
                .last_update_time()
                .is_some_and(|updated| now.signed_duration_since(updated) <= max_age);
            if !fresh {
                info!(last_update = %document.last_update, "cached catalog is stale");
                return None;
            }
        }
        if document.repair_partition() {
            warn!("cached catalog lists were inconsistent and have been rebuilt");
        }
        info!(videos = document.videos.len(), "serving cached catalog");
        Some(document)
    }
}
