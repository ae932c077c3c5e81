use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use regex::Regex;
use tracing::info;

use crate::error::BotError;
use crate::models::{AccessToken, Comment, CommentReply, CommentReplyJson, Listing};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

static RE_RATE_LIMIT_WAIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s+(millisecond|second|minute)s?").unwrap());

/// Where comments come from and where replies go.
#[async_trait]
pub trait CommentStream {
    /// Most recent comments first.
    async fn recent_comments(&self, limit: u32) -> Result<Vec<Comment>, BotError>;

    /// Fails with `BotError::RateLimited` when the platform asks us to back off.
    async fn reply(&self, comment: &Comment, text: &str) -> Result<(), BotError>;
}

/// Script-app credentials for the password grant.
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

pub struct RedditClient {
    client: reqwest::Client,
    access_token: String,
    subreddit: String,
}

impl RedditClient {
    /// Trades the credentials for a bearer token. Every later call reuses the
    /// same client, so the user agent and timeout apply to all of them.
    pub async fn login(
        credentials: &RedditCredentials,
        subreddit: &str,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, BotError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let response = client
            .post(TOKEN_URL)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BotError::Transport(format!(
                "reddit login failed: {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        let token: AccessToken = serde_json::from_str(&body)
            .map_err(|e| BotError::MalformedResponse(format!("reddit token: {}", e)))?;
        info!("Logged into reddit as {}", credentials.username);

        Ok(RedditClient {
            client,
            access_token: token.access_token,
            subreddit: subreddit.to_string(),
        })
    }
}

#[async_trait]
impl CommentStream for RedditClient {
    async fn recent_comments(&self, limit: u32) -> Result<Vec<Comment>, BotError> {
        let url = format!("{}/r/{}/comments?limit={}", OAUTH_BASE, self.subreddit, limit);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = response.status();
        if status == http::StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::RateLimited(wait_from_headers(response.headers())));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::Transport(format!("{} - {}", status, text)));
        }
        let body = response.text().await?;
        let listing: Listing = serde_json::from_str(&body)
            .map_err(|e| BotError::MalformedResponse(format!("comment listing: {}", e)))?;
        Ok(listing.into_comments())
    }

    async fn reply(&self, comment: &Comment, text: &str) -> Result<(), BotError> {
        let thing_id = format!("t1_{}", comment.id);
        let response = self
            .client
            .post(format!("{}/api/comment", OAUTH_BASE))
            .bearer_auth(&self.access_token)
            .form(&[
                ("api_type", "json"),
                ("thing_id", thing_id.as_str()),
                ("text", text),
            ])
            .send()
            .await?;
        let status = response.status();
        if status == http::StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::RateLimited(wait_from_headers(response.headers())));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::Transport(format!("{} - {}", status, text)));
        }
        let body = response.text().await?;
        let reply: CommentReply = serde_json::from_str(&body)
            .map_err(|e| BotError::MalformedResponse(format!("comment reply: {}", e)))?;
        check_reply_errors(&reply.json)
    }
}

/// First of `retry-after` / `x-ratelimit-reset` that parses, in seconds.
fn wait_from_headers(headers: &HeaderMap) -> Duration {
    [http::header::RETRY_AFTER.as_str(), "x-ratelimit-reset"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.trim().parse::<f64>().ok())
        .map(|secs| Duration::from_secs(secs.ceil().max(0.0) as u64))
        .next()
        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
}

fn check_reply_errors(json: &CommentReplyJson) -> Result<(), BotError> {
    let Some(first) = json.errors.first() else {
        return Ok(());
    };
    let code = first.first().and_then(|v| v.as_str()).unwrap_or_default();
    let message = first.get(1).and_then(|v| v.as_str()).unwrap_or_default();
    if code == "RATELIMIT" {
        let wait = json
            .ratelimit
            .map(|secs| Duration::from_secs(secs.ceil().max(0.0) as u64))
            .or_else(|| wait_from_message(message))
            .unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
        return Err(BotError::RateLimited(wait));
    }
    Err(BotError::Transport(format!("reddit rejected reply: {} {}", code, message)))
}

/// Pulls "9 minutes" / "30 seconds" out of reddit's rate-limit prose.
fn wait_from_message(message: &str) -> Option<Duration> {
    let caps = RE_RATE_LIMIT_WAIT.captures(message)?;
    let amount: u64 = caps[1].parse().ok()?;
    Some(match &caps[2] {
        "minute" => Duration::from_secs(amount.checked_mul(60)?),
        "second" => Duration::from_secs(amount),
        _ => Duration::from_millis(amount),
    })
}
