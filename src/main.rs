use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;
use tracing::{error, info};
use tracing_subscriber::{filter, prelude::*, Layer};

use crate::db::DedupStore;
use crate::error::BotError;
use crate::match_summary::MatchSummary;
use crate::reddit::{RedditClient, RedditCredentials};
use crate::riot_utils::{ChampionCache, RiotStatsClient, StatsApi};
use crate::scanner::CommentScanner;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod db;
mod error;
mod match_summary;
mod models;
mod reddit;
mod reply;
mod riot_utils;
mod scanner;

/// EX_TEMPFAIL, so the scheduler knows to back off.
const RATE_LIMIT_EXIT_CODE: u8 = 75;

#[derive(Parser, Debug)]
#[command(about = "Answers `match <id>` comments on a subreddit with the match's scoreboard")]
struct Args {
    /// Print the reply for this match id instead of scanning comments
    #[arg(short = 'm', long = "match")]
    match_id: Option<String>,

    /// Region for --match, defaults to REGION
    #[arg(short, long, requires = "match_id")]
    region: Option<String>,
}

#[derive(Debug, Clone)]
struct Config {
    riot_api_token: String,
    riot_api_base: String,
    riot_static_base: String,
    subreddit: String,
    region: String,
    user_agent: String,
    comment_limit: u32,
    http_timeout: Option<Duration>,
    log_path: PathBuf,
    db_path: PathBuf,
}

fn load_config() -> Result<Config> {
    dotenv().ok();

    let riot_api_token = env::var("RIOT_API_TOKEN").context("Missing RIOT_API_TOKEN")?;

    let comment_limit = env::var("COMMENT_LIMIT")
        .unwrap_or_else(|_| "100".to_string())
        .parse::<u32>()
        .context("Invalid COMMENT_LIMIT (must be u32)")?;

    let http_timeout = match env::var("HTTP_TIMEOUT_SECS") {
        Ok(secs) => Some(Duration::from_secs(
            secs.parse::<u64>()
                .context("Invalid HTTP_TIMEOUT_SECS (must be u64)")?,
        )),
        Err(_) => None,
    };

    let log_path = PathBuf::from(env::var("LOG_PATH").unwrap_or_else(|_| "logs".to_string()));
    let db_path = PathBuf::from(env::var("DB_PATH").unwrap_or_else(|_| "comments.db".to_string()));

    Ok(Config {
        riot_api_token,
        riot_api_base: env::var("RIOT_API_BASE")
            .unwrap_or_else(|_| riot_utils::DEFAULT_API_BASE.to_string()),
        riot_static_base: env::var("RIOT_STATIC_BASE")
            .unwrap_or_else(|_| riot_utils::DEFAULT_STATIC_BASE.to_string()),
        subreddit: env::var("SUBREDDIT").unwrap_or_else(|_| "leagueoflegends".to_string()),
        region: env::var("REGION").unwrap_or_else(|_| "na".to_string()),
        user_agent: env::var("USER_AGENT").unwrap_or_else(|_| "LoL Match Stats".to_string()),
        comment_limit,
        http_timeout,
        log_path,
        db_path,
    })
}

fn load_reddit_credentials() -> Result<RedditCredentials> {
    Ok(RedditCredentials {
        client_id: env::var("REDDIT_CLIENT_ID").context("Missing REDDIT_CLIENT_ID")?,
        client_secret: env::var("REDDIT_CLIENT_SECRET").context("Missing REDDIT_CLIENT_SECRET")?,
        username: env::var("REDDIT_USERNAME").context("Missing REDDIT_USERNAME")?,
        password: env::var("REDDIT_PASSWORD").context("Missing REDDIT_PASSWORD")?,
    })
}

fn init_logging(log_path: &PathBuf) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_path, "match_stats_bot.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);
    let ours = |metadata: &tracing::Metadata<'_>| metadata.target().starts_with("match_stats_bot");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_filter(filter::filter_fn(ours)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter::filter_fn(ours)),
        )
        .init();
    guard
}

async fn scan(config: &Config, stats: &RiotStatsClient) -> Result<()> {
    let credentials = load_reddit_credentials()?;
    let store = DedupStore::open(&config.db_path)
        .with_context(|| format!("Failed to open dedup store {}", config.db_path.display()))?;
    let reddit = RedditClient::login(
        &credentials,
        &config.subreddit,
        &config.user_agent,
        config.http_timeout,
    )
    .await?;

    let mut scanner = CommentScanner::new(
        stats,
        &reddit,
        &store,
        &config.region,
        config.comment_limit,
    )?;
    let report = scanner.scan().await?;
    info!("Replied to {} comment(s) on r/{}", report.replied, config.subreddit);
    Ok(())
}

async fn preview(stats: &RiotStatsClient, region: &str, match_id: &str) -> Result<()> {
    let mut cache = ChampionCache::new();
    cache.ensure_loaded(stats, region).await?;
    if let Err(e) = cache.ensure_spells_loaded(stats, region).await {
        error!("Summoner spells unavailable, showing ids: {}", e);
    }

    let raw = stats.fetch_match(region, match_id).await?;
    let summary = MatchSummary::build(&raw, cache.champions())?;

    println!(
        "{} {} on {} ({})",
        summary.match_mode,
        summary.queue_type,
        summary.created_at.format("%Y-%m-%d %H:%M:%S"),
        summary.duration
    );
    for player in &summary.team_one {
        let spell = |id: Option<i64>| id.map(|id| cache.spell_name(id)).unwrap_or_default();
        println!(
            "  {}: {} + {}",
            player.champion,
            spell(player.spells.0),
            spell(player.spells.1)
        );
    }
    println!();
    print!("{}", reply::render(&summary));
    Ok(())
}

async fn run(args: Args, config: &Config) -> Result<()> {
    let stats = RiotStatsClient::new(
        &config.riot_api_token,
        &config.riot_api_base,
        &config.riot_static_base,
        config.http_timeout,
    )?;

    match args.match_id {
        Some(match_id) => {
            let region = args.region.as_deref().unwrap_or(&config.region);
            preview(&stats, region, &match_id).await
        }
        None => scan(config, &stats).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match load_config().context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = init_logging(&config.log_path);
    std::panic::set_hook(Box::new(|i| {
        error!("Panic'd: {}", i);
    }));

    match run(args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// 75 when the run stopped on a rate limit, 1 for anything else.
fn exit_status(e: &anyhow::Error) -> u8 {
    // downcast_ref also sees through .context() wrappers
    match e.downcast_ref::<BotError>() {
        Some(BotError::RateLimited(_)) => RATE_LIMIT_EXIT_CODE,
        _ => 1,
    }
}
