use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;

use crate::archive::{ArchiveDir, create_dir_all, write_file};
use crate::error::{Result, ThreadSafeError};
use crate::model::{Attachment, Thread};

/// Largest attachment body accepted, in bytes.
pub const MAX_ATTACHMENT_BYTES: u64 = 64 * 1024 * 1024;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches the bytes behind an attachment URL.
pub trait MediaSource {
    fn fetch(&self, attachment: &Attachment) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    max_bytes: u64,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        Self::with_max_bytes(MAX_ATTACHMENT_BYTES)
    }

    /// Downloader rejecting bodies larger than `max_bytes`.
    pub fn with_max_bytes(max_bytes: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("thread-safe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ThreadSafeError::HttpClient)?;
        Ok(Self { client, max_bytes })
    }
}

impl MediaSource for HttpDownloader {
    fn fetch(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let url = validate_url(attachment)?;
        let transport = |source| ThreadSafeError::DownloadTransport {
            url: attachment.url.clone(),
            source,
        };

        let response = self.client.get(url).send().map_err(transport)?;
        if response.status() != StatusCode::OK {
            return Err(ThreadSafeError::Download {
                url: attachment.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let mut bytes = Vec::new();
        response
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|source| ThreadSafeError::DownloadBody {
                url: attachment.url.clone(),
                source,
            })?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(ThreadSafeError::AttachmentTooLarge {
                url: attachment.url.clone(),
                limit: self.max_bytes,
            });
        }

        Ok(bytes)
    }
}

/// Requires an absolute URL with a scheme and host.
pub fn validate_url(attachment: &Attachment) -> Result<Url> {
    let invalid = || ThreadSafeError::InvalidAttachmentUrl {
        url: attachment.url.clone(),
        media_key: attachment.media_key.clone(),
    };

    let url = Url::parse(&attachment.url).map_err(|_| invalid())?;
    if url.host_str().is_none_or(str::is_empty) || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

/// Saves every attachment of `thread` under `<dir>/attachments`, tweet by tweet.
pub fn download_attachments(
    thread: &Thread,
    dir: &ArchiveDir,
    source: &impl MediaSource,
) -> Result<Vec<PathBuf>> {
    let attachments_dir = dir.attachments_dir();
    create_dir_all(&attachments_dir)?;

    let mut saved = Vec::new();
    for tweet in &thread.tweets {
        for attachment in &tweet.attachments {
            let path = attachments_dir.join(attachment.file_name(&tweet.id));
            debug!("downloading {} to {}", attachment.url, path.display());
            save_attachment(source, attachment, &path)?;
            saved.push(path);
        }
    }

    info!("saved {} attachment(s)", saved.len());
    Ok(saved)
}

fn save_attachment(source: &impl MediaSource, attachment: &Attachment, path: &Path) -> Result<()> {
    let bytes = source.fetch(attachment)?;
    write_file(path, &bytes)
}
