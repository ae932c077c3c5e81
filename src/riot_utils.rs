use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::BotError;
use crate::models::{RawMatch, StaticDataList};

pub const DEFAULT_API_BASE: &str = "https://na.api.pvp.net";
pub const DEFAULT_STATIC_BASE: &str = "https://global.api.pvp.net";

/// The three read-only calls the bot makes against the stats API.
#[async_trait]
pub trait StatsApi {
    async fn fetch_match(&self, region: &str, match_id: &str) -> Result<RawMatch, BotError>;

    async fn fetch_champions(&self, region: &str) -> Result<HashMap<i64, String>, BotError>;

    async fn fetch_summoner_spells(&self, region: &str)
        -> Result<HashMap<i64, String>, BotError>;
}

/// reqwest-backed client for the legacy match and static-data endpoints.
pub struct RiotStatsClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    static_base: String,
}

impl RiotStatsClient {
    /// `timeout` of `None` keeps reqwest's default, which never times out.
    pub fn new(
        api_key: &str,
        api_base: &str,
        static_base: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, BotError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(RiotStatsClient {
            client: builder.build()?,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            static_base: static_base.trim_end_matches('/').to_string(),
        })
    }

    fn match_url(&self, region: &str, match_id: &str) -> String {
        format!(
            "{}/api/lol/{}/v2.2/match/{}?api_key={}",
            self.api_base,
            region.to_lowercase(),
            match_id,
            self.api_key
        )
    }

    fn static_url(&self, region: &str, kind: &str) -> String {
        format!(
            "{}/api/lol/static-data/{}/v1.2/{}?api_key={}",
            self.static_base,
            region.to_lowercase(),
            kind,
            self.api_key
        )
    }

    /// Non-2xx is `Transport`, a body that doesn't fit `T` is `MalformedResponse`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BotError> {
        let response = self.client.get(url).send().await?;
        match response.status() {
            http::StatusCode::FORBIDDEN => {
                return Err(BotError::Transport(
                    "the Riot key is bad, or the endpoint was retired".to_string(),
                ))
            }
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(BotError::Transport(format!("{} - {}", status, text)));
            }
            _ => {}
        }
        // read as text first so a bad body is told apart from a dropped connection
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| BotError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl StatsApi for RiotStatsClient {
    async fn fetch_match(&self, region: &str, match_id: &str) -> Result<RawMatch, BotError> {
        self.get_json(&self.match_url(region, match_id)).await
    }

    async fn fetch_champions(&self, region: &str) -> Result<HashMap<i64, String>, BotError> {
        let list: StaticDataList = self.get_json(&self.static_url(region, "champion")).await?;
        Ok(list.into_id_map())
    }

    async fn fetch_summoner_spells(
        &self,
        region: &str,
    ) -> Result<HashMap<i64, String>, BotError> {
        let list: StaticDataList = self
            .get_json(&self.static_url(region, "summoner-spell"))
            .await?;
        Ok(list.into_id_map())
    }
}

/// Champion (and summoner spell) names, loaded once per process.
#[derive(Debug, Default)]
pub struct ChampionCache {
    champions: HashMap<i64, String>,
    spells: HashMap<i64, String>,
}

impl ChampionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the champion list only while the map is empty. A failed or
    /// empty fetch leaves it empty, so the next call tries again.
    pub async fn ensure_loaded<S: StatsApi + ?Sized>(
        &mut self,
        api: &S,
        region: &str,
    ) -> Result<(), BotError> {
        if !self.champions.is_empty() {
            return Ok(());
        }
        info!("Loading champion data for region {}", region);
        let champions = api.fetch_champions(region).await.map_err(|e| match e {
            BotError::Transport(msg) | BotError::MalformedResponse(msg) => {
                BotError::ReferenceDataUnavailable(msg)
            }
            other => other,
        })?;
        if champions.is_empty() {
            return Err(BotError::ReferenceDataUnavailable(
                "champion list was empty".to_string(),
            ));
        }
        self.champions = champions;
        Ok(())
    }

    /// Spell names only decorate output, so a failed load is left to the caller to log.
    pub async fn ensure_spells_loaded<S: StatsApi + ?Sized>(
        &mut self,
        api: &S,
        region: &str,
    ) -> Result<(), BotError> {
        if !self.spells.is_empty() {
            return Ok(());
        }
        info!("Loading summoner spell data for region {}", region);
        self.spells = api.fetch_summoner_spells(region).await?;
        Ok(())
    }

    pub fn champions(&self) -> &HashMap<i64, String> {
        &self.champions
    }

    /// Falls back to the numeric id when the spell isn't known.
    pub fn spell_name(&self, id: i64) -> String {
        self.spells
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned data and counts calls.
    #[derive(Default)]
    pub(crate) struct FakeStats {
        pub champions: HashMap<i64, String>,
        pub spells: HashMap<i64, String>,
        pub matches: HashMap<String, RawMatch>,
        pub champion_calls: AtomicUsize,
        pub match_calls: AtomicUsize,
    }

    #[async_trait]
    impl StatsApi for FakeStats {
        async fn fetch_match(&self, _region: &str, match_id: &str) -> Result<RawMatch, BotError> {
            self.match_calls.fetch_add(1, Ordering::SeqCst);
            self.matches
                .get(match_id)
                .cloned()
                .ok_or_else(|| BotError::Transport(format!("404 Not Found - {}", match_id)))
        }

        async fn fetch_champions(&self, _region: &str) -> Result<HashMap<i64, String>, BotError> {
            self.champion_calls.fetch_add(1, Ordering::SeqCst);
            if self.champions.is_empty() {
                return Err(BotError::Transport("connection refused".to_string()));
            }
            Ok(self.champions.clone())
        }

        async fn fetch_summoner_spells(
            &self,
            _region: &str,
        ) -> Result<HashMap<i64, String>, BotError> {
            Ok(self.spells.clone())
        }
    }

    #[test]
    fn test_urls_lowercase_region_and_trim_base() {
        let client = RiotStatsClient::new(
            "KEY",
            "https://na.api.pvp.net/",
            DEFAULT_STATIC_BASE,
            None,
        )
        .unwrap();
        assert_eq!(
            client.match_url("NA", "1234567890"),
            "https://na.api.pvp.net/api/lol/na/v2.2/match/1234567890?api_key=KEY"
        );
        assert_eq!(
            client.static_url("euw", "champion"),
            "https://global.api.pvp.net/api/lol/static-data/euw/v1.2/champion?api_key=KEY"
        );
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once() {
        let api = FakeStats {
            champions: HashMap::from([(36, "Dr. Mundo".to_string())]),
            ..Default::default()
        };
        let mut cache = ChampionCache::new();
        tokio_test::assert_ok!(cache.ensure_loaded(&api, "na").await);
        tokio_test::assert_ok!(cache.ensure_loaded(&api, "na").await);
        assert_eq!(api.champion_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.champions().get(&36), Some(&"Dr. Mundo".to_string()));
    }

    #[tokio::test]
    async fn test_ensure_loaded_failure_is_reference_data_unavailable() {
        let api = FakeStats::default();
        let mut cache = ChampionCache::new();
        let result = cache.ensure_loaded(&api, "na").await;
        assert!(matches!(result, Err(BotError::ReferenceDataUnavailable(_))));
        assert!(cache.champions().is_empty());

        // still empty, so the next call tries again
        let _ = cache.ensure_loaded(&api, "na").await;
        assert_eq!(api.champion_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_spell_name_falls_back_to_id() {
        let api = FakeStats {
            spells: HashMap::from([(4, "Flash".to_string())]),
            ..Default::default()
        };
        let mut cache = ChampionCache::new();
        tokio_test::assert_ok!(cache.ensure_spells_loaded(&api, "na").await);
        assert_eq!(cache.spell_name(4), "Flash");
        assert_eq!(cache.spell_name(14), "14");
    }
}
