// Per-season data fetching.
//
// Gathers everything the aggregators need for each season in the chain.
// Week-level requests are issued concurrently through a bounded stream and
// re-sorted by week afterwards, so the folding that follows sees the same
// order no matter how the requests completed. A failed request leaves its
// slot empty and is logged; it never fails the season.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use dynasty_core::model::{League, LeagueUser, Matchup, PlayerDirectory, Roster, Transaction};
use dynasty_core::{LeagueDataProvider, ProviderError, RosterId};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::bracket::Bracket;

/// Last week of the fantasy regular season plus playoffs.
pub const LAST_SCORING_WEEK: u32 = 17;

/// Week 18 exists in the provider's calendar but no lineups are set.
pub const NO_LINEUP_WEEK: u32 = 18;

pub const DEFAULT_CONCURRENCY: usize = 8;

// ---------------------------------------------------------------------------
// Owners
// ---------------------------------------------------------------------------

/// Roster -> owning manager for one season.
#[derive(Debug, Clone, Default)]
pub struct OwnerDirectory {
    rosters: Vec<Roster>,
    users: Vec<LeagueUser>,
    owner_ids: HashMap<RosterId, Option<String>>,
    user_index: HashMap<String, usize>,
}

impl OwnerDirectory {
    pub fn new(rosters: &[Roster], users: &[LeagueUser]) -> Self {
        let user_index: HashMap<String, usize> = users
            .iter()
            .enumerate()
            .map(|(idx, u)| (u.user_id.clone(), idx))
            .collect();
        let mut owner_ids = HashMap::with_capacity(rosters.len());
        for roster in rosters {
            if let Some(owner) = roster.owner_id.as_deref() {
                if !user_index.contains_key(owner) {
                    warn!(
                        roster_id = roster.roster_id,
                        owner_id = owner,
                        "roster owner is not among the league's users"
                    );
                }
            }
            owner_ids.insert(roster.roster_id, roster.owner_id.clone());
        }
        Self {
            rosters: rosters.to_vec(),
            users: users.to_vec(),
            owner_ids,
            user_index,
        }
    }

    pub fn rosters(&self) -> &[Roster] {
        &self.rosters
    }

    pub fn users(&self) -> &[LeagueUser] {
        &self.users
    }

    pub fn has_roster(&self, roster_id: RosterId) -> bool {
        self.owner_ids.contains_key(&roster_id)
    }

    /// The owning user's id, as recorded on the roster.
    pub fn owner_id(&self, roster_id: RosterId) -> Option<&str> {
        self.owner_ids.get(&roster_id)?.as_deref()
    }

    /// The owning user, when the roster's owner is a known league user.
    pub fn owner(&self, roster_id: RosterId) -> Option<&LeagueUser> {
        let idx = *self.user_index.get(self.owner_id(roster_id)?)?;
        self.users.get(idx)
    }

    pub fn display_name(&self, roster_id: RosterId) -> Option<&str> {
        self.owner(roster_id)?.display_name.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WeekFeed {
    pub week: u32,
    /// `None` when the request failed.
    pub matchups: Option<Vec<Matchup>>,
    pub transactions: Option<Vec<Transaction>>,
}

/// Everything fetched for one season.
#[derive(Debug, Clone)]
pub struct SeasonFeed {
    pub league: League,
    /// `None` when rosters or users failed to load.
    pub owners: Option<OwnerDirectory>,
    pub winners_bracket: Option<Bracket>,
    pub losers_bracket: Option<Bracket>,
    /// Ascending by week.
    pub weeks: Vec<WeekFeed>,
}

impl SeasonFeed {
    /// A feed with no fetched data, for building inputs by hand.
    pub fn empty(league: League) -> Self {
        Self {
            league,
            owners: None,
            winners_bracket: None,
            losers_bracket: None,
            weeks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub weeks: RangeInclusive<u32>,
    pub losers_bracket: bool,
    /// Maximum in-flight week requests per season.
    pub concurrency: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            weeks: 1..=LAST_SCORING_WEEK,
            losers_bracket: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetch feeds for every season in `chain`, preserving chain order.
pub async fn fetch_season_feeds<P>(provider: &P, chain: &[League], options: &FeedOptions) -> Vec<SeasonFeed>
where
    P: LeagueDataProvider + ?Sized,
{
    let mut feeds = Vec::with_capacity(chain.len());
    for league in chain {
        info!(league_id = %league.league_id, season = %league.season, "fetching season data");
        feeds.push(fetch_season_feed(provider, league, options).await);
    }
    feeds
}

/// Fetch one season's rosters, users, brackets and weekly data.
pub async fn fetch_season_feed<P>(provider: &P, league: &League, options: &FeedOptions) -> SeasonFeed
where
    P: LeagueDataProvider + ?Sized,
{
    let league_id = league.league_id.as_str();

    let (rosters, users, winners) = tokio::join!(
        provider.rosters(league_id),
        provider.users(league_id),
        provider.winners_bracket(league_id),
    );
    let owners = match (rosters, users) {
        (Ok(rosters), Ok(users)) => Some(OwnerDirectory::new(&rosters, &users)),
        (Err(e), _) | (_, Err(e)) => {
            warn!(%league_id, "failed to load rosters/users: {e}");
            None
        }
    };
    let winners_bracket = keep(winners, "winners bracket", league_id, None).map(Bracket::new);
    let losers_bracket = if options.losers_bracket {
        keep(
            provider.losers_bracket(league_id).await,
            "losers bracket",
            league_id,
            None,
        )
        .map(Bracket::new)
    } else {
        None
    };

    let mut weeks: Vec<WeekFeed> = stream::iter(options.weeks.clone())
        .map(|week| async move {
            let (matchups, transactions) = tokio::join!(
                provider.matchups(league_id, week),
                provider.transactions(league_id, week),
            );
            WeekFeed {
                week,
                matchups: keep(matchups, "matchups", league_id, Some(week)),
                transactions: keep(transactions, "transactions", league_id, Some(week)),
            }
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;
    weeks.sort_by_key(|w| w.week);

    SeasonFeed {
        league: league.clone(),
        owners,
        winners_bracket,
        losers_bracket,
        weeks,
    }
}

/// Fetch the player directory, degrading to an empty one on failure.
pub async fn fetch_players<P>(provider: &P) -> PlayerDirectory
where
    P: LeagueDataProvider + ?Sized,
{
    match provider.players().await {
        Ok(players) => {
            debug!(count = players.len(), "loaded player directory");
            players
        }
        Err(e) => {
            warn!("failed to load player directory, names will be missing: {e}");
            PlayerDirectory::new()
        }
    }
}

fn keep<T>(result: Result<T, ProviderError>, what: &str, league_id: &str, week: Option<u32>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%league_id, ?week, "skipping {what}: {e}");
            None
        }
    }
}
