//! Channel lookup and the walk over the uploads playlist.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::catalog::{Channel, VideoItem, sort_newest_first};
use crate::error::{MirrorError, MirrorResult};
use crate::youtube::{ChannelRef, VideoPlatform};

/// Titles the Data API substitutes for uploads that are no longer public.
const HIDDEN_TITLES: [&str; 2] = ["Private video", "Deleted video"];

pub fn fetch_channel(platform: &dyn VideoPlatform, channel: &ChannelRef) -> MirrorResult<Channel> {
    let found = platform
        .channel(channel)?
        .ok_or_else(|| MirrorError::ChannelNotFound(channel.to_string()))?;
    info!(channel = %channel, title = %found.title, "channel resolved");
    Ok(found)
}

/// Every public upload of the playlist, newest first.
///
/// Pages are requested until the API stops returning a continuation token.
/// A token that comes back a second time aborts the walk. A video listed on
/// more than one page (the playlist shifts when something is uploaded
/// mid-walk) is kept once, at its first position.
pub fn fetch_uploads(platform: &dyn VideoPlatform, playlist_id: &str) -> MirrorResult<Vec<VideoItem>> {
    let mut videos = Vec::new();
    let mut used_tokens = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = platform.playlist_page(playlist_id, page_token.as_deref())?;
        pages += 1;
        debug!(page = pages, items = page.items.len(), "uploads page received");

        videos.extend(page.items.into_iter().filter(|item| {
            !HIDDEN_TITLES.contains(&item.title.as_str())
                && seen_ids.insert(item.video_id.clone())
        }));

        let Some(next) = page.next_page_token else {
            break;
        };
        if !used_tokens.insert(next.clone()) {
            return Err(MirrorError::PaginationLoop {
                playlist_id: playlist_id.to_string(),
                token: next,
            });
        }
        page_token = Some(next);
    }

    sort_newest_first(&mut videos);
    info!(pages, videos = videos.len(), "uploads playlist fetched");
    Ok(videos)
}
