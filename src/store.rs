//! Cache stores for the catalog document.
//!
//! The gateway tries every configured store in order: the Gist first, then
//! the optional local file. Reads never fail (a broken store is a miss);
//! writes fail only when no store accepted the document.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::catalog::CacheDocument;
use crate::config::MirrorSettings;
use crate::error::{MirrorError, MirrorResult};

pub const GIST_API_BASE: &str = "https://api.github.com";
pub const CACHE_FILE_NAME: &str = "cache.json";
const GIST_DESCRIPTION: &str = "Caché de canal YouTube (mirror) – actualizado automáticamente";
const USER_AGENT: &str = "YouTubeMirrorApp";
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
const SERVICE: &str = "gist";

/// A place the cache document can be loaded from and saved to.
pub trait CacheStore: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the store is reachable but holds no document.
    fn load(&self) -> MirrorResult<Option<CacheDocument>>;

    fn save(&self, document: &CacheDocument) -> MirrorResult<()>;
}

fn parse_document(content: &str) -> MirrorResult<CacheDocument> {
    serde_json::from_str(content).map_err(|err| MirrorError::decode("cache document", err))
}

fn serialize_document(document: &CacheDocument) -> MirrorResult<String> {
    serde_json::to_string_pretty(document).map_err(|err| MirrorError::decode("cache document", err))
}

#[derive(Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

#[derive(Serialize)]
struct GistPatch<'a> {
    description: &'a str,
    files: HashMap<&'a str, GistFileContent>,
}

#[derive(Serialize)]
struct GistFileContent {
    content: String,
}

/// One file inside a GitHub Gist, authenticated with a personal token.
pub struct GistStore {
    agent: ureq::Agent,
    token: String,
    gist_id: String,
    api_base: String,
    file_name: String,
}

impl GistStore {
    pub fn new(token: impl Into<String>, gist_id: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
            token: token.into(),
            gist_id: gist_id.into(),
            api_base: GIST_API_BASE.to_string(),
            file_name: CACHE_FILE_NAME.to_string(),
        }
    }

    /// Points the store at another API root (used by tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn gist_url(&self) -> String {
        format!(
            "{}/gists/{}",
            self.api_base.trim_end_matches('/'),
            self.gist_id
        )
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/vnd.github.v3+json")
    }

    /// Large files come back truncated in the Gist payload; the full body
    /// lives behind `raw_url`.
    fn fetch_raw(&self, raw_url: &str) -> MirrorResult<String> {
        self.authorized(self.agent.get(raw_url))
            .timeout(READ_TIMEOUT)
            .call()
            .map_err(|err| MirrorError::from_ureq(SERVICE, err))?
            .into_string()
            .map_err(|err| MirrorError::decode("gist raw file", err))
    }
}

impl CacheStore for GistStore {
    fn name(&self) -> &str {
        "gist"
    }

    fn load(&self) -> MirrorResult<Option<CacheDocument>> {
        let response = match self
            .authorized(self.agent.get(&self.gist_url()))
            .timeout(READ_TIMEOUT)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(err) => return Err(MirrorError::from_ureq(SERVICE, err)),
        };
        let gist: GistResponse = response
            .into_json()
            .map_err(|err| MirrorError::decode("gist response", err))?;

        let Some(file) = gist.files.get(&self.file_name) else {
            return Ok(None);
        };
        let content = match (&file.content, &file.raw_url) {
            (_, Some(raw_url)) if file.truncated => self.fetch_raw(raw_url)?,
            (Some(content), _) => content.clone(),
            (None, _) => return Ok(None),
        };
        parse_document(&content).map(Some)
    }

    fn save(&self, document: &CacheDocument) -> MirrorResult<()> {
        let patch = GistPatch {
            description: GIST_DESCRIPTION,
            files: HashMap::from([(
                self.file_name.as_str(),
                GistFileContent {
                    content: serialize_document(document)?,
                },
            )]),
        };
        self.authorized(self.agent.request("PATCH", &self.gist_url()))
            .timeout(WRITE_TIMEOUT)
            .send_json(&patch)
            .map_err(|err| MirrorError::from_ureq(SERVICE, err))?;
        Ok(())
    }
}

/// JSON file on local disk, replaced atomically on every save.
pub struct LocalFileStore {
    path: PathBuf,
}

impl LocalFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> MirrorError {
        MirrorError::LocalFile {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl CacheStore for LocalFileStore {
    fn name(&self) -> &str {
        "local file"
    }

    fn load(&self) -> MirrorResult<Option<CacheDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|err| self.io_error(err))?;
        parse_document(&content).map(Some)
    }

    fn save(&self, document: &CacheDocument) -> MirrorResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;

        let payload = serialize_document(document)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| self.io_error(err))?;
        tmp.write_all(payload.as_bytes())
            .map_err(|err| self.io_error(err))?;
        tmp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

/// Ordered list of cache stores.
pub struct CacheGateway {
    stores: Vec<Box<dyn CacheStore>>,
}

impl CacheGateway {
    pub fn new(stores: Vec<Box<dyn CacheStore>>) -> Self {
        Self { stores }
    }

    /// Gist when both `GITHUB_TOKEN` and `GIST_ID` are set, then the local
    /// file when one is configured.
    pub fn from_settings(settings: &MirrorSettings) -> Self {
        let mut stores: Vec<Box<dyn CacheStore>> = Vec::new();
        match (&settings.github_token, &settings.gist_id) {
            (Some(token), Some(gist_id)) => {
                stores.push(Box::new(GistStore::new(token.clone(), gist_id.clone())));
            }
            _ => warn!("Gist cache disabled: GITHUB_TOKEN or GIST_ID is missing"),
        }
        if let Some(path) = &settings.local_cache {
            let local = LocalFileStore::new(path.clone());
            debug!(path = %local.path().display(), "local cache enabled");
            stores.push(Box::new(local));
        }
        Self::new(stores)
    }

    pub fn store_names(&self) -> Vec<&str> {
        self.stores.iter().map(|store| store.name()).collect()
    }

    /// First document with at least one video. Empty documents and store
    /// failures are logged and the next store is tried.
    pub fn read(&self) -> Option<CacheDocument> {
        for store in &self.stores {
            match store.load() {
                Ok(Some(document)) if document.videos.is_empty() => {
                    info!(store = store.name(), "cached catalog has no videos, trying next store");
                }
                Ok(Some(document)) => {
                    info!(
                        store = store.name(),
                        videos = document.videos.len(),
                        "cache document loaded"
                    );
                    return Some(document);
                }
                Ok(None) => debug!(store = store.name(), "cache store is empty"),
                Err(err) => warn!(store = store.name(), "reading cache failed: {err}"),
            }
        }
        None
    }

    /// Saves to every store and returns how many accepted the document.
    pub fn write(&self, document: &CacheDocument) -> MirrorResult<usize> {
        let mut accepted = 0;
        for store in &self.stores {
            match store.save(document) {
                Ok(()) => {
                    info!(store = store.name(), "cache document saved");
                    accepted += 1;
                }
                Err(err) => warn!(store = store.name(), "writing cache failed: {err}"),
            }
        }
        if accepted == 0 {
            return Err(MirrorError::NoStoreAccepted);
        }
        Ok(accepted)
    }
}
