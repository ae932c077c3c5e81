use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while answering a single comment.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("champion reference data unavailable: {0}")]
    ReferenceDataUnavailable(String),

    #[error("no champion with id {0} in the reference data")]
    UnknownChampion(i64),

    #[error("expected two rosters of 5, got {team_one} and {team_two}")]
    UnsupportedMatchFormat { team_one: usize, team_two: usize },

    #[error("match result has no entry for team 100, winner unknown")]
    AmbiguousResult,

    #[error("queue type {0} is not a 5x5 queue")]
    UnsupportedQueueType(String),

    #[error("rate limited, please wait {} seconds", .0.as_secs())]
    RateLimited(Duration),

    #[error("dedup store error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl BotError {
    /// Errors that must end the whole pass instead of just skipping a comment.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::RateLimited(_) | BotError::Storage(_))
    }
}

impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        BotError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_and_storage_are_fatal() {
        assert!(BotError::RateLimited(Duration::from_secs(5)).is_fatal());
        assert!(BotError::Storage(rusqlite::Error::InvalidQuery).is_fatal());
        assert!(!BotError::AmbiguousResult.is_fatal());
        assert!(!BotError::UnknownChampion(1).is_fatal());
        assert!(!BotError::UnsupportedQueueType("ONEFORALL_1x1".to_string()).is_fatal());
        assert!(!BotError::Transport("timed out".to_string()).is_fatal());
    }

    #[test]
    fn test_rate_limit_message_mentions_wait() {
        let e = BotError::RateLimited(Duration::from_secs(540));
        assert_eq!(e.to_string(), "rate limited, please wait 540 seconds");
    }
}
