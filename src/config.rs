use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_MIRROR_PORT: u16 = 8080;
pub const DEFAULT_MIRROR_HOST: &str = "127.0.0.1";
pub const DEFAULT_CHANNEL: &str = "UCg_z7bjf2hQwMwafHhxMmNQ";

/// Everything the mirror needs at runtime. Credentials stay optional: a
/// missing API key only matters on a cache miss, a missing Gist token only
/// disables the remote cache.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    pub youtube_api_key: Option<String>,
    pub github_token: Option<String>,
    pub gist_id: Option<String>,
    pub channel: String,
    pub local_cache: Option<PathBuf>,
    pub cache_max_age_hours: Option<u64>,
    pub mirror_host: String,
    pub mirror_port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub channel: Option<String>,
    pub local_cache: Option<PathBuf>,
    pub mirror_port: Option<u16>,
    pub mirror_host: Option<String>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_settings(overrides: SettingsOverrides) -> Result<MirrorSettings> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_settings(&file_vars, env_var_string, overrides)
}

fn build_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: SettingsOverrides,
) -> Result<MirrorSettings> {
    let lookup = |key: &str| lookup_value(key, file_vars, &env_lookup);

    let channel = non_blank(overrides.channel)
        .or_else(|| lookup("MIRROR_CHANNEL"))
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
    let local_cache = overrides
        .local_cache
        .or_else(|| lookup("MIRROR_LOCAL_CACHE").map(PathBuf::from));
    let cache_max_age_hours = match lookup("MIRROR_CACHE_MAX_AGE_HOURS") {
        Some(raw) => Some(
            raw.parse::<u64>()
                .with_context(|| format!("MIRROR_CACHE_MAX_AGE_HOURS must be a number, got {raw}"))?,
        ),
        None => None,
    };
    let mirror_port = overrides
        .mirror_port
        .or_else(|| lookup("MIRROR_PORT").and_then(|value| value.parse::<u16>().ok()))
        .unwrap_or(DEFAULT_MIRROR_PORT);
    let mirror_host = non_blank(overrides.mirror_host)
        .or_else(|| lookup("MIRROR_HOST"))
        .unwrap_or_else(|| DEFAULT_MIRROR_HOST.to_string());

    Ok(MirrorSettings {
        youtube_api_key: lookup("YOUTUBE_API_KEY"),
        github_token: lookup("GITHUB_TOKEN"),
        gist_id: lookup("GIST_ID"),
        channel,
        local_cache,
        cache_max_age_hours,
        mirror_host,
        mirror_port,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_var_string(key: &str) -> Option<String> {
    non_blank(env::var(key).ok())
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| non_blank(file_vars.get(key).cloned()))
}

/// Reads `KEY=value` pairs from a dotenv file. A missing file is treated as
/// empty; later keys override earlier ones.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading env file {}", path.display()))?;
    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

/// Splits one dotenv line. Comments, blanks and lines without `=` yield
/// nothing; an `export ` prefix and one pair of matching quotes are dropped.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then(|| (key, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(value)
}
