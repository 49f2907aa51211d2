#![forbid(unsafe_code)]

//! Serves the mirrored channel page over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use channel_mirror::{
    config::{SettingsOverrides, resolve_settings},
    logging,
    mirror::Mirror,
    server,
};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mirror", version, about = "Serve a cached mirror of one YouTube channel")]
struct MirrorArgs {
    /// Address to bind (defaults to MIRROR_HOST or 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (defaults to MIRROR_PORT or 8080)
    #[arg(long)]
    port: Option<u16>,

    /// Channel id or @handle to mirror
    #[arg(long)]
    channel: Option<String>,

    /// JSON file kept alongside the Gist cache
    #[arg(long)]
    local_cache: Option<PathBuf>,

    /// Alternative to ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

impl MirrorArgs {
    fn overrides(self) -> SettingsOverrides {
        SettingsOverrides {
            channel: self.channel,
            local_cache: self.local_cache,
            mirror_port: self.port,
            mirror_host: self.host,
            env_path: self.env_file,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let settings = resolve_settings(MirrorArgs::parse().overrides())?;
    info!(channel = %settings.channel, "starting mirror");

    let mirror = Arc::new(Mirror::from_settings(&settings));
    server::serve(mirror, &settings.mirror_host, settings.mirror_port).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_overrides() {
        let args = MirrorArgs::try_parse_from([
            "mirror",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--channel",
            "@handle",
            "--local-cache",
            "/tmp/cache_local.json",
            "--env-file",
            "/etc/mirror.env",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.mirror_host.as_deref(), Some("0.0.0.0"));
        assert_eq!(overrides.mirror_port, Some(9000));
        assert_eq!(overrides.channel.as_deref(), Some("@handle"));
        assert_eq!(
            overrides.local_cache,
            Some(PathBuf::from("/tmp/cache_local.json"))
        );
        assert_eq!(overrides.env_path, Some(PathBuf::from("/etc/mirror.env")));
    }

    #[test]
    fn no_flags_leave_everything_to_config() {
        let overrides = MirrorArgs::try_parse_from(["mirror"]).unwrap().overrides();
        assert!(overrides.mirror_host.is_none());
        assert!(overrides.mirror_port.is_none());
        assert!(overrides.channel.is_none());
    }

    #[test]
    fn rejects_bad_port() {
        assert!(MirrorArgs::try_parse_from(["mirror", "--port", "99999"]).is_err());
    }
}
