use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::{LookupError, Result, ThreadSafeError};
use crate::lookup::TweetLookup;
use crate::model::{Attachment, REPLIED_TO, Tweet};

pub const DEFAULT_HOST: &str = "https://api.twitter.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const EXPANSIONS: &str = "entities.mentions.username,author_id,attachments.media_keys";
const MEDIA_FIELDS: &str = "media_key,url,type,preview_image_url,variants";
const TWEET_FIELDS: &str = "created_at,conversation_id,referenced_tweets";
const USER_FIELDS: &str = "name,username";
const NOT_FOUND_PROBLEM: &str = "resource-not-found";

/// Twitter API v2 tweet lookup over a blocking HTTP client.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    host: String,
    token: String,
}

impl TwitterClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_host(token, DEFAULT_HOST)
    }

    pub fn with_host(token: impl Into<String>, host: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("thread-safe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ThreadSafeError::HttpClient)?;

        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn tweets_url(&self) -> String {
        format!("{}/2/tweets", self.host)
    }
}

impl TweetLookup for TwitterClient {
    fn lookup(&self, tweet_id: &str) -> std::result::Result<Tweet, LookupError> {
        debug!("GET {} ids={tweet_id}", self.tweets_url());

        let transport = |source| LookupError::Transport {
            tweet_id: tweet_id.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.tweets_url())
            .bearer_auth(&self.token)
            .query(&[
                ("ids", tweet_id),
                ("expansions", EXPANSIONS),
                ("media.fields", MEDIA_FIELDS),
                ("tweet.fields", TWEET_FIELDS),
                ("user.fields", USER_FIELDS),
            ])
            .send()
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().map_err(transport)?;

        if !status.is_success() {
            return Err(LookupError::Status {
                tweet_id: tweet_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let value = serde_json::from_str::<Value>(&body).map_err(|source| {
            LookupError::InvalidResponse {
                tweet_id: tweet_id.to_string(),
                reason: source.to_string(),
            }
        })?;

        parse_lookup_response(tweet_id, &value)
    }
}

/// Builds a [`Tweet`] from a `GET /2/tweets` response body.
pub fn parse_lookup_response(
    tweet_id: &str,
    value: &Value,
) -> std::result::Result<Tweet, LookupError> {
    let invalid = |reason: String| LookupError::InvalidResponse {
        tweet_id: tweet_id.to_string(),
        reason,
    };

    let Some(data) = value
        .get("data")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|tweet| tweet.get("id").and_then(Value::as_str) == Some(tweet_id))
    else {
        return Err(missing_tweet_error(tweet_id, value));
    };

    let id = tweet_id.to_string();
    let text = string_field(data, "text").unwrap_or_default();
    let created_at = string_field(data, "created_at").unwrap_or_default();
    let conversation_id = string_field(data, "conversation_id")
        .ok_or_else(|| invalid("missing conversation_id".to_string()))?;
    let author_id =
        string_field(data, "author_id").ok_or_else(|| invalid("missing author_id".to_string()))?;

    let author = includes(value, "users")
        .find(|user| user.get("id").and_then(Value::as_str) == Some(author_id.as_str()))
        .ok_or_else(|| invalid(format!("author {author_id} missing from includes.users")))?;
    let author_name = string_field(author, "name").unwrap_or_default();
    let author_handle = string_field(author, "username")
        .ok_or_else(|| invalid(format!("author {author_id} has no username")))?;

    let replied_to_ids = data
        .get("referenced_tweets")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|reference| reference.get("type").and_then(Value::as_str) == Some(REPLIED_TO))
        .filter_map(|reference| string_field(reference, "id"))
        .collect();

    let attachments = data
        .get("attachments")
        .and_then(|attachments| attachments.get("media_keys"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|media_key| {
            includes(value, "media")
                .find(|media| media.get("media_key").and_then(Value::as_str) == Some(media_key))
        })
        .filter_map(resolve_attachment)
        .collect();

    Ok(Tweet {
        url: Tweet::status_url(&author_handle, &id),
        id,
        conversation_id,
        text,
        created_at,
        author_id,
        author_name,
        author_handle,
        replied_to_ids,
        attachments,
    })
}

fn missing_tweet_error(tweet_id: &str, value: &Value) -> LookupError {
    let errors = value
        .get("errors")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let other = errors.iter().find(|error| {
        let problem = error.get("type").and_then(Value::as_str).unwrap_or_default();
        !problem.ends_with(NOT_FOUND_PROBLEM)
    });

    match other {
        Some(error) => LookupError::InvalidResponse {
            tweet_id: tweet_id.to_string(),
            reason: string_field(error, "detail")
                .or_else(|| string_field(error, "title"))
                .unwrap_or_else(|| error.to_string()),
        },
        None => LookupError::NotFound {
            tweet_id: tweet_id.to_string(),
        },
    }
}

/// Photos carry a direct URL; videos and GIFs only list encoded variants, of
/// which the highest bit rate wins.
fn resolve_attachment(media: &Value) -> Option<Attachment> {
    let media_key = string_field(media, "media_key")?;
    let media_type = string_field(media, "type").unwrap_or_default();

    let url = string_field(media, "url")
        .filter(|url| !url.is_empty())
        .or_else(|| best_variant_url(media))?;

    Some(Attachment {
        media_key,
        media_type,
        url,
    })
}

fn best_variant_url(media: &Value) -> Option<String> {
    let mut best = None::<(u64, &str)>;

    for variant in media
        .get("variants")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(url) = variant
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
        else {
            continue;
        };
        let bit_rate = variant
            .get("bit_rate")
            .and_then(Value::as_u64)
            .unwrap_or_default();

        if best.is_none_or(|(current, _)| bit_rate > current) {
            best = Some((bit_rate, url));
        }
    }

    best.map(|(_, url)| url.to_string())
}

fn includes<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get("includes")
        .and_then(|includes| includes.get(key))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
