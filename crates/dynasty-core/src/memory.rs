// In-memory provider backed by fixture data.
//
// Serves the same calls as `SleeperClient` from a `FixtureFile` (built in
// code or loaded from JSON). Individual calls can be configured to fail so
// callers' skip-on-failure paths can be exercised without a network.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{
    BracketMatch, League, LeagueUser, Matchup, PlayerDirectory, Roster, Transaction,
};
use crate::provider::{LeagueDataProvider, ProviderError};

// ---------------------------------------------------------------------------
// Fixture format
// ---------------------------------------------------------------------------

/// Everything the provider knows about one season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueFixture {
    pub league: League,
    #[serde(default)]
    pub rosters: Vec<Roster>,
    #[serde(default)]
    pub users: Vec<LeagueUser>,
    /// Week -> matchups.
    #[serde(default)]
    pub matchups: BTreeMap<u32, Vec<Matchup>>,
    /// Week -> transactions.
    #[serde(default)]
    pub transactions: BTreeMap<u32, Vec<Transaction>>,
    #[serde(default)]
    pub winners_bracket: Vec<BracketMatch>,
    #[serde(default)]
    pub losers_bracket: Vec<BracketMatch>,
}

impl LeagueFixture {
    /// An empty season linked to `previous` (use `None` for the first season).
    pub fn new(league_id: &str, season: &str, previous: Option<&str>) -> Self {
        Self {
            league: League {
                league_id: league_id.to_string(),
                season: season.to_string(),
                previous_league_id: previous.map(str::to_string),
                name: None,
                status: None,
                total_rosters: None,
            },
            rosters: Vec::new(),
            users: Vec::new(),
            matchups: BTreeMap::new(),
            transactions: BTreeMap::new(),
            winners_bracket: Vec::new(),
            losers_bracket: Vec::new(),
        }
    }
}

/// On-disk fixture: a set of seasons plus the player directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub leagues: Vec<LeagueFixture>,
    #[serde(default)]
    pub players: PlayerDirectory,
}

/// A provider call, used to configure failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    League(String),
    Rosters(String),
    Users(String),
    Matchups(String, u32),
    Transactions(String, u32),
    WinnersBracket(String),
    LosersBracket(String),
    Players,
}

// ---------------------------------------------------------------------------
// StaticProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StaticProvider {
    leagues: HashMap<String, LeagueFixture>,
    players: PlayerDirectory,
    failures: HashSet<Call>,
    requests: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: FixtureFile) -> Self {
        fixture
            .leagues
            .into_iter()
            .fold(Self::new().with_players(fixture.players), |p, l| {
                p.with_league(l)
            })
    }

    /// Load a JSON fixture file.
    pub async fn from_fixture_file(path: &Path) -> Result<Self, ProviderError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ProviderError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let fixture: FixtureFile =
            serde_json::from_str(&text).map_err(|source| ProviderError::Decode {
                url: path.display().to_string(),
                source,
            })?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_league(mut self, fixture: LeagueFixture) -> Self {
        self.leagues
            .insert(fixture.league.league_id.clone(), fixture);
        self
    }

    pub fn with_players(mut self, players: PlayerDirectory) -> Self {
        self.players = players;
        self
    }

    /// Make `call` fail with a 503 every time it is made.
    pub fn failing(mut self, call: Call) -> Self {
        self.failures.insert(call);
        self
    }

    /// Number of calls served so far (including failed ones).
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn serve(&self, call: Call) -> Result<(), ProviderError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failures.contains(&call) {
            return Err(ProviderError::Status {
                url: format!("static://{call:?}"),
                status: 503,
            });
        }
        Ok(())
    }

    fn fixture(&self, league_id: &str) -> Result<&LeagueFixture, ProviderError> {
        self.leagues
            .get(league_id)
            .ok_or_else(|| ProviderError::NotFound {
                what: format!("league {league_id}"),
            })
    }
}

#[async_trait]
impl LeagueDataProvider for StaticProvider {
    async fn league(&self, league_id: &str) -> Result<League, ProviderError> {
        self.serve(Call::League(league_id.to_string()))?;
        Ok(self.fixture(league_id)?.league.clone())
    }

    async fn rosters(&self, league_id: &str) -> Result<Vec<Roster>, ProviderError> {
        self.serve(Call::Rosters(league_id.to_string()))?;
        Ok(self.fixture(league_id)?.rosters.clone())
    }

    async fn users(&self, league_id: &str) -> Result<Vec<LeagueUser>, ProviderError> {
        self.serve(Call::Users(league_id.to_string()))?;
        Ok(self.fixture(league_id)?.users.clone())
    }

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<Matchup>, ProviderError> {
        self.serve(Call::Matchups(league_id.to_string(), week))?;
        Ok(self
            .fixture(league_id)?
            .matchups
            .get(&week)
            .cloned()
            .unwrap_or_default())
    }

    async fn transactions(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Transaction>, ProviderError> {
        self.serve(Call::Transactions(league_id.to_string(), week))?;
        Ok(self
            .fixture(league_id)?
            .transactions
            .get(&week)
            .cloned()
            .unwrap_or_default())
    }

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>, ProviderError> {
        self.serve(Call::WinnersBracket(league_id.to_string()))?;
        Ok(self.fixture(league_id)?.winners_bracket.clone())
    }

    async fn losers_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>, ProviderError> {
        self.serve(Call::LosersBracket(league_id.to_string()))?;
        Ok(self.fixture(league_id)?.losers_bracket.clone())
    }

    async fn players(&self) -> Result<PlayerDirectory, ProviderError> {
        self.serve(Call::Players)?;
        Ok(self.players.clone())
    }
}
