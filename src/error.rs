//! Error taxonomy shared by the API client, the cache stores and the mirror.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// A credential needed for the requested operation is not configured.
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("malformed {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("channel {0} not found")]
    ChannelNotFound(String),

    #[error("playlist {playlist_id} repeated page token {token}")]
    PaginationLoop { playlist_id: String, token: String },

    #[error("no cache store accepted the write")]
    NoStoreAccepted,

    #[error("local cache {path}: {source}")]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    /// Maps a ureq failure into either a status or a transport error.
    pub fn from_ureq(service: &'static str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => Self::Status {
                service,
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => Self::Transport {
                service,
                message: transport.to_string(),
            },
        }
    }

    pub fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            what,
            message: err.to_string(),
        }
    }
}

pub type MirrorResult<T> = Result<T, MirrorError>;
