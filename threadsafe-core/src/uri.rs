use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ThreadSafeError};

static TWEET_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,20}$").expect("valid regex"));
static STATUS_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|mobile\.)?(?:twitter\.com|x\.com)/(?:i/web|([A-Za-z0-9_]{1,15}))/status(?:es)?/([0-9]{1,20})(?:/[^?#]*)?(?:[?#].*)?$",
    )
    .expect("valid regex")
});

/// Last tweet of a thread, given either as a bare ID or as a status URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetUri {
    pub tweet_id: String,
    pub handle: Option<String>,
}

impl TweetUri {
    pub fn parse(input: &str) -> Result<Self> {
        input.parse()
    }
}

impl fmt::Display for TweetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle {
            Some(handle) => write!(f, "https://twitter.com/{handle}/status/{}", self.tweet_id),
            None => write!(f, "{}", self.tweet_id),
        }
    }
}

impl FromStr for TweetUri {
    type Err = ThreadSafeError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if TWEET_ID_RE.is_match(trimmed) {
            return Ok(Self {
                tweet_id: trimmed.to_string(),
                handle: None,
            });
        }

        let captures = STATUS_URL_RE
            .captures(trimmed)
            .ok_or_else(|| ThreadSafeError::InvalidTweetRef(input.to_string()))?;

        Ok(Self {
            tweet_id: captures[2].to_string(),
            handle: captures.get(1).map(|handle| handle.as_str().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TweetUri;

    #[test]
    fn parse_bare_id() {
        let uri = TweetUri::parse("1495503337447866368").expect("parse should succeed");
        assert_eq!(uri.tweet_id, "1495503337447866368");
        assert_eq!(uri.handle, None);
    }

    #[test]
    fn parse_twitter_status_url() {
        let uri = TweetUri::parse("https://twitter.com/dkaslovsky/status/1495503337447866368")
            .expect("parse should succeed");
        assert_eq!(uri.tweet_id, "1495503337447866368");
        assert_eq!(uri.handle.as_deref(), Some("dkaslovsky"));
    }

    #[test]
    fn parse_x_url_with_query() {
        let uri = TweetUri::parse("https://x.com/alice/status/123?s=20&t=abc")
            .expect("parse should succeed");
        assert_eq!(uri.tweet_id, "123");
    }

    #[test]
    fn parse_mobile_url_with_media_suffix() {
        let uri = TweetUri::parse("mobile.twitter.com/alice/status/123/photo/1")
            .expect("parse should succeed");
        assert_eq!(uri.tweet_id, "123");
        assert_eq!(uri.handle.as_deref(), Some("alice"));
    }

    #[test]
    fn parse_share_links_without_handle() {
        for input in [
            "https://twitter.com/i/web/status/1495503337447866368",
            "https://x.com/i/web/status/1495503337447866368?s=20",
        ] {
            let uri = TweetUri::parse(input).expect("parse should succeed");
            assert_eq!(uri.tweet_id, "1495503337447866368");
            assert_eq!(uri.handle, None);
        }
    }

    #[test]
    fn parse_single_letter_handle() {
        let uri = TweetUri::parse("https://x.com/i/status/123").expect("parse should succeed");
        assert_eq!(uri.handle.as_deref(), Some("i"));
    }

    #[test]
    fn parse_trims_whitespace() {
        let uri = TweetUri::parse("  123\n").expect("parse should succeed");
        assert_eq!(uri.tweet_id, "123");
    }

    #[test]
    fn display_round_trips_url() {
        let uri = TweetUri::parse("https://x.com/alice/status/123").expect("parse should succeed");
        assert_eq!(uri.to_string(), "https://twitter.com/alice/status/123");
    }

    #[test]
    fn parse_rejects_other_hosts() {
        let err = TweetUri::parse("https://example.com/alice/status/123")
            .expect_err("must reject unknown host");
        assert!(format!("{err}").contains("invalid tweet reference"));
    }

    #[test]
    fn parse_rejects_non_numeric_id() {
        let err = TweetUri::parse("https://twitter.com/alice/status/abc")
            .expect_err("must reject non-numeric id");
        assert!(format!("{err}").contains("invalid tweet reference"));
    }

    #[test]
    fn parse_rejects_empty_input() {
        let err = TweetUri::parse("").expect_err("must reject empty input");
        assert!(format!("{err}").contains("invalid tweet reference"));
    }
}
