use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Referenced-tweet type used to follow a thread's reply chain.
pub const REPLIED_TO: &str = "replied_to";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub conversation_id: String,
    pub url: String,
    pub text: String,
    pub created_at: String,
    pub author_id: String,
    pub author_name: String,
    pub author_handle: String,
    #[serde(default)]
    pub replied_to_ids: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Tweet {
    pub fn status_url(author_handle: &str, id: &str) -> String {
        format!("https://twitter.com/{author_handle}/status/{id}")
    }
}

/// Media file attached to a tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub media_key: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
}

impl Attachment {
    /// File name used when saving the attachment, e.g. `tweet=1-media_key=3_1.jpg`.
    pub fn file_name(&self, tweet_id: &str) -> String {
        format!(
            "tweet={tweet_id}-media_key={}{}",
            self.media_key,
            self.extension()
        )
    }

    /// Extension of the URL path including the leading dot, without any query string.
    pub fn extension(&self) -> String {
        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();
        match file.rfind('.') {
            Some(idx) if idx + 1 < file.len() => file[idx..].to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub name: String,
    pub tweets: Vec<Tweet>,
}

impl Thread {
    pub fn len(&self) -> usize {
        self.tweets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }

    pub fn first(&self) -> Option<&Tweet> {
        self.tweets.first()
    }

    /// Thread metadata taken from the first tweet; empty for an empty thread.
    pub fn header(&self) -> String {
        let Some(first) = self.first() else {
            return String::new();
        };

        [
            format!("URL: \t\t\t{}", first.url),
            format!("Author Name: \t\t{}", first.author_name),
            format!("Author Handle: \t\t{}", first.author_handle),
            format!("Conversation ID: \t{}", first.conversation_id),
        ]
        .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub name: String,
    pub path: PathBuf,
    pub tweet_count: usize,
    pub author_handle: Option<String>,
}

impl ArchiveSummary {
    pub fn from_thread(path: &Path, thread: &Thread) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| thread.name.clone());

        Self {
            name,
            path: path.to_path_buf(),
            tweet_count: thread.len(),
            author_handle: thread.first().map(|tweet| tweet.author_handle.clone()),
        }
    }
}
