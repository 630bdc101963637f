// Sleeper public API client.
//
// Read-only, unauthenticated JSON endpoints. List endpoints answer `null`
// rather than `[]` for seasons that never produced data (e.g. brackets of a
// league that did not reach the playoffs), so those decode to empty lists.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{BracketMatch, League, LeagueUser, Matchup, PlayerDirectory, Roster, Transaction};
use crate::provider::{LeagueDataProvider, ProviderError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.sleeper.app/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("dynasty/", env!("CARGO_PKG_VERSION"));
const SPORT: &str = "nfl";

// ---------------------------------------------------------------------------
// SleeperClient
// ---------------------------------------------------------------------------

pub struct SleeperClient {
    http: reqwest::Client,
    base_url: String,
}

impl SleeperClient {
    /// Create a client against `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| ProviderError::Http {
            url: url.clone(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| ProviderError::Decode { url, source })
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ProviderError> {
        Ok(self.get::<Option<Vec<T>>>(path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl LeagueDataProvider for SleeperClient {
    async fn league(&self, league_id: &str) -> Result<League, ProviderError> {
        self.get::<Option<League>>(&format!("league/{league_id}"))
            .await?
            .ok_or_else(|| ProviderError::NotFound {
                what: format!("league {league_id}"),
            })
    }

    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, ProviderError> {
        self.get_list(&format!("league/{league_id}/rosters")).await
    }

    async fn users(&self, league_id: &str) -> Result<Vec<LeagueUser>, ProviderError> {
        self.get_list(&format!("league/{league_id}/users")).await
    }

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<Matchup>, ProviderError> {
        self.get_list(&format!("league/{league_id}/matchups/{week}"))
            .await
    }

    async fn transactions(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Transaction>, ProviderError> {
        self.get_list(&format!("league/{league_id}/transactions/{week}"))
            .await
    }

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>, ProviderError> {
        self.get_list(&format!("league/{league_id}/winners_bracket"))
            .await
    }

    async fn losers_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>, ProviderError> {
        self.get_list(&format!("league/{league_id}/losers_bracket"))
            .await
    }

    async fn players(&self) -> Result<PlayerDirectory, ProviderError> {
        Ok(self
            .get::<Option<PlayerDirectory>>(&format!("players/{SPORT}"))
            .await?
            .unwrap_or_default())
    }
}
