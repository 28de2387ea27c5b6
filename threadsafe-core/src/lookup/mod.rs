use crate::error::LookupError;
use crate::model::Tweet;

pub mod twitter;

/// Resolves a single tweet by ID.
///
/// Implementations own retries, timeouts and attachment resolution; the
/// thread walker only sees the resulting [`Tweet`] or a [`LookupError`].
pub trait TweetLookup {
    fn lookup(&self, tweet_id: &str) -> Result<Tweet, LookupError>;
}

impl<T: TweetLookup + ?Sized> TweetLookup for &T {
    fn lookup(&self, tweet_id: &str) -> Result<Tweet, LookupError> {
        (**self).lookup(tweet_id)
    }
}
