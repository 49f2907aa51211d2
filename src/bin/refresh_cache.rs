#![forbid(unsafe_code)]

//! One-shot refresh of the cached catalog. Meant for cron, so the page
//! handler rarely has to hit the Data API itself.

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use channel_mirror::{
    config::{SettingsOverrides, resolve_settings},
    logging,
    mirror::Mirror,
};
use chrono::Utc;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "refresh_cache", version, about = "Fetch the channel catalog and rewrite the cache")]
struct RefreshArgs {
    /// Channel id or @handle to mirror
    #[arg(long)]
    channel: Option<String>,

    /// JSON file kept alongside the Gist cache
    #[arg(long)]
    local_cache: Option<PathBuf>,

    /// Alternative to ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Print the document to stdout instead of writing the cache
    #[arg(long)]
    dry_run: bool,
}

impl RefreshArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            channel: self.channel.clone(),
            local_cache: self.local_cache.clone(),
            env_path: self.env_file.clone(),
            ..SettingsOverrides::default()
        }
    }
}

fn main() -> Result<()> {
    logging::init();
    let args = RefreshArgs::parse();
    let settings = resolve_settings(args.overrides())?;
    let mirror = Mirror::from_settings(&settings);

    if args.dry_run {
        let document = mirror
            .fetch_document(Utc::now())
            .context("fetching catalog")?;
        let json = serde_json::to_string_pretty(&document).context("encoding catalog")?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}").context("writing catalog to stdout")?;
        return Ok(());
    }

    let document = mirror.load(true).context("refreshing catalog")?;
    info!(
        videos = document.videos.len(),
        shorts = document.shorts.len(),
        regular = document.regular_videos.len(),
        last_update = %document.last_update,
        "cache refreshed"
    );
    Ok(())
}
