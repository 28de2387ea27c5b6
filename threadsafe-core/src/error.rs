use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThreadSafeError {
    #[error("invalid tweet reference: {0}")]
    InvalidTweetRef(String),

    #[error("invalid thread name: {0:?}")]
    InvalidThreadName(String),

    #[error("invalid limit: {0} (must be at least 1)")]
    InvalidLimit(usize),

    #[error("token must be specified by the environment variable {var} or --token")]
    MissingToken { var: &'static str },

    #[error("cannot determine home directory")]
    HomeDirectoryNotFound,

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("cannot follow tweet {tweet_id} with multiple replied_to IDs")]
    AmbiguousPredecessor { tweet_id: String },

    #[error("exceeded maximum number of tweets to fetch [{limit}]")]
    ChainExhausted { limit: usize },

    #[error("{path} already exists, rename or delete instead of overwriting")]
    ArchiveExists { path: PathBuf },

    #[error("{path} does not exist, check the thread name")]
    ArchiveNotFound { path: PathBuf },

    #[error("{path} is incomplete: {source}; run regen to re-render or delete it before saving again")]
    IncompleteArchive {
        path: PathBuf,
        #[source]
        source: Box<ThreadSafeError>,
    },

    #[error("invalid thread file {path}: {source}")]
    InvalidThreadFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid attachment URL {url} for media_key {media_key}")]
    InvalidAttachmentUrl { url: String, media_key: String },

    #[error("download of {url} failed with status code: {status}")]
    Download { url: String, status: u16 },

    #[error("download of {url} failed: {source}")]
    DownloadTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading body of {url} failed: {source}")]
    DownloadBody {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("attachment {url} exceeds {limit} bytes")]
    AttachmentTooLarge { url: String, limit: u64 },

    #[error("cannot render template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("cannot build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reported by a [`crate::lookup::TweetLookup`] implementation.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("tweet not found: {tweet_id}")]
    NotFound { tweet_id: String },

    #[error("tweet lookup error for {tweet_id}: {source}")]
    Transport {
        tweet_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("tweet lookup for {tweet_id} returned status {status}: {body}")]
    Status {
        tweet_id: String,
        status: u16,
        body: String,
    },

    #[error("tweet lookup for {tweet_id} returned an invalid response: {reason}")]
    InvalidResponse { tweet_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ThreadSafeError>;
