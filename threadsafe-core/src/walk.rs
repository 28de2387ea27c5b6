use log::{debug, info};

use crate::error::{Result, ThreadSafeError};
use crate::lookup::TweetLookup;
use crate::model::{Thread, Tweet};

/// Maximum number of lookups performed while walking a thread.
pub const DEFAULT_MAX_THREAD_LEN: usize = 100;

/// Walks backward from `last_id` through `replied_to` references and returns
/// the single-author thread oldest first.
///
/// The walk stops at the top of the thread or at the first tweet whose
/// conversation or author differs from the starting tweet. A tweet replying to
/// more than one tweet, a lookup failure, or running out of `limit` lookups
/// aborts the walk without a partial result.
pub fn walk_thread(lookup: &impl TweetLookup, last_id: &str, limit: usize) -> Result<Vec<Tweet>> {
    if limit == 0 {
        return Err(ThreadSafeError::InvalidLimit(limit));
    }

    let mut tweets = Vec::new();
    let mut next_id = last_id.to_string();
    let mut identity = None::<(String, String)>;

    for _ in 0..limit {
        debug!("fetching tweet {next_id}");
        let tweet = lookup.lookup(&next_id)?;

        let (conversation_id, author_id) = identity
            .get_or_insert_with(|| (tweet.conversation_id.clone(), tweet.author_id.clone()));

        if tweet.conversation_id != *conversation_id || tweet.author_id != *author_id {
            debug!(
                "tweet {} leaves conversation {conversation_id} by author {author_id}",
                tweet.id
            );
            return Ok(finish(tweets, last_id));
        }

        match tweet.replied_to_ids.as_slice() {
            [] => {
                debug!("tweet {} is the top of the thread", tweet.id);
                tweets.push(tweet);
                return Ok(finish(tweets, last_id));
            }
            [parent_id] => {
                next_id.clone_from(parent_id);
                tweets.push(tweet);
            }
            _ => {
                return Err(ThreadSafeError::AmbiguousPredecessor { tweet_id: tweet.id });
            }
        }
    }

    Err(ThreadSafeError::ChainExhausted { limit })
}

fn finish(mut tweets: Vec<Tweet>, last_id: &str) -> Vec<Tweet> {
    // Fetched from last to first.
    tweets.reverse();
    info!("walked {} tweet(s) ending at {last_id}", tweets.len());
    tweets
}

impl Thread {
    /// Builds a named thread by walking back from its last tweet.
    pub fn fetch(
        lookup: &impl TweetLookup,
        name: impl Into<String>,
        last_id: &str,
        limit: usize,
    ) -> Result<Self> {
        let tweets = walk_thread(lookup, last_id, limit)?;
        Ok(Self {
            name: name.into(),
            tweets,
        })
    }
}
