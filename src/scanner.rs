use regex::Regex;
use tracing::{error, info, warn};

use crate::db::DedupStore;
use crate::error::BotError;
use crate::match_summary::MatchSummary;
use crate::models::Comment;
use crate::reddit::CommentStream;
use crate::reply;
use crate::riot_utils::{ChampionCache, StatsApi};

const TRIGGER_PATTERN: &str = r"\bmatch ([0-9]{10})\b";

/// Counts for one pass, mostly for the closing log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub seen: usize,
    pub already_processed: usize,
    pub replied: usize,
    pub skipped: usize,
}

pub struct CommentScanner<'a, S: StatsApi, C: CommentStream> {
    stats: &'a S,
    comments: &'a C,
    store: &'a DedupStore,
    cache: ChampionCache,
    region: String,
    comment_limit: u32,
    trigger: Regex,
}

impl<'a, S: StatsApi, C: CommentStream> CommentScanner<'a, S, C> {
    /// Borrows the clients and store for one pass. The champion cache starts
    /// empty and lives as long as the scanner.
    pub fn new(
        stats: &'a S,
        comments: &'a C,
        store: &'a DedupStore,
        region: &str,
        comment_limit: u32,
    ) -> Result<Self, regex::Error> {
        Ok(CommentScanner {
            stats,
            comments,
            store,
            cache: ChampionCache::new(),
            region: region.to_string(),
            comment_limit,
            trigger: Regex::new(TRIGGER_PATTERN)?,
        })
    }

    /// One pass over the latest comments. Only a rate limit or a broken
    /// dedup store ends it early.
    pub async fn scan(&mut self) -> Result<ScanReport, BotError> {
        info!("getting comments...");
        let comments = self.comments.recent_comments(self.comment_limit).await?;
        let mut report = ScanReport {
            seen: comments.len(),
            ..Default::default()
        };

        for comment in &comments {
            if self.store.has_processed(&comment.id)? {
                info!("already replied to comment {}", comment.id);
                report.already_processed += 1;
                continue;
            }
            // no trigger means no action, so nothing gets recorded either
            let Some(match_id) = extract_match_id(&self.trigger, &comment.body) else {
                continue;
            };

            info!("replying to comment {} about match {}", comment.id, match_id);
            match self.answer(comment, &match_id).await {
                Ok(()) => {
                    self.store.mark_processed(&comment.id)?;
                    report.replied += 1;
                }
                Err(e) if e.is_fatal() => {
                    if let BotError::RateLimited(wait) = &e {
                        error!(
                            "Rate limit exceeded, please wait {} seconds",
                            wait.as_secs()
                        );
                    }
                    return Err(e);
                }
                Err(BotError::UnsupportedQueueType(queue)) => {
                    warn!("Match format not supported: {} (comment {})", queue, comment.id);
                    report.skipped += 1;
                }
                Err(e) => {
                    error!("Skipping comment {}: {}", comment.id, e);
                    report.skipped += 1;
                }
            }
        }

        info!(
            "Pass done: {} comments, {} already handled, {} replies, {} skipped, {} on record",
            report.seen,
            report.already_processed,
            report.replied,
            report.skipped,
            self.store.processed_count()?
        );
        Ok(report)
    }

    async fn answer(&mut self, comment: &Comment, match_id: &str) -> Result<(), BotError> {
        self.cache.ensure_loaded(self.stats, &self.region).await?;
        let raw = self.stats.fetch_match(&self.region, match_id).await?;
        let summary = MatchSummary::build(&raw, self.cache.champions())?;
        info!(
            "Match {}: {} {} created {}, lasted {}",
            match_id,
            summary.match_mode,
            summary.queue_type,
            summary.created_at.format("%Y-%m-%d %H:%M:%S"),
            summary.duration
        );
        self.comments.reply(comment, &reply::render(&summary)).await
    }
}

/// Finds `match <10 digits>` as whole words, case-insensitively. Only ASCII
/// digits count, anything else would never be a valid match id.
pub fn extract_match_id(trigger: &Regex, body: &str) -> Option<String> {
    trigger
        .captures(&body.to_lowercase())
        .map(|caps| caps[1].to_string())
}
