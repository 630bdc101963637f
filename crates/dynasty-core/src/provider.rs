// The league-data provider boundary.
//
// The analytics engine never talks HTTP directly; it is handed something that
// implements `LeagueDataProvider`. Production uses `SleeperClient`, tests and
// offline runs use `StaticProvider`.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{BracketMatch, League, LeagueUser, Matchup, PlayerDirectory, Roster, Transaction};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Per-season access to league history. Every call may fail independently;
/// callers decide whether a failure skips a unit or aborts.
#[async_trait]
pub trait LeagueDataProvider: Send + Sync {
    async fn league(&self, league_id: &str) -> Result<League, ProviderError>;

    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, ProviderError>;

    async fn users(&self, league_id: &str) -> Result<Vec<LeagueUser>, ProviderError>;

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<Matchup>, ProviderError>;

    async fn transactions(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Transaction>, ProviderError>;

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>, ProviderError>;

    async fn losers_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>, ProviderError>;

    /// The full player directory for the sport.
    async fn players(&self) -> Result<PlayerDirectory, ProviderError>;
}
