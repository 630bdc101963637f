// League history statistics.
//
// Two phases: `compute_league_stats` walks the season chain and fetches each
// season's feeds, then `aggregate` folds those feeds into a report. The fold
// is pure and walks feeds in chain order, weeks ascending, entries in the
// order the provider listed them. Every tally is an insertion-ordered map and
// every ranking is a stable sort, so identical feeds give identical reports.

use std::cmp::Ordering;

use dynasty_core::model::{League, Matchup, PlayerDirectory};
use dynasty_core::{LeagueDataProvider, MatchId, ProviderError, RosterId};
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chain::league_chain;
use crate::feed::{
    fetch_players, fetch_season_feeds, FeedOptions, OwnerDirectory, SeasonFeed, DEFAULT_CONCURRENCY,
    LAST_SCORING_WEEK,
};
use crate::report::{
    ChampionRecord, DefenseRecord, GameRecord, LeagueStatsReport, PlayerChurnRecord,
    SeasonTotalRecord, TradeAddictRecord, WeekScoreRecord, WinPercentageRecord,
};

// ---------------------------------------------------------------------------
// Options and errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Length of the week, season, win-percentage, game and defense lists.
    pub top_n: usize,
    pub churn_top_n: usize,
    pub trade_top_n: usize,
    /// Last week folded into the report.
    pub max_week: u32,
    pub concurrency: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            churn_top_n: 10,
            trade_top_n: 10,
            max_week: LAST_SCORING_WEEK,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to load season chain starting at league {league_id}")]
    Chain {
        league_id: String,
        #[source]
        source: ProviderError,
    },
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Fetch the league's whole history and compute its statistics.
///
/// Failing to load the starting season is an error. Every later failure
/// skips the affected unit, so the report is best-effort.
pub async fn compute_league_stats<P>(
    provider: &P,
    start_league_id: &str,
    options: &StatsOptions,
) -> Result<LeagueStatsReport, StatsError>
where
    P: LeagueDataProvider + ?Sized,
{
    let chain = league_chain(provider, start_league_id)
        .await
        .map_err(|source| StatsError::Chain {
            league_id: start_league_id.to_string(),
            source,
        })?;
    if chain.is_empty() {
        info!("season chain is empty, returning empty report");
        return Ok(LeagueStatsReport::default());
    }
    info!(seasons = chain.len(), "computing league stats");

    let feed_options = FeedOptions {
        weeks: 1..=options.max_week,
        losers_bracket: false,
        concurrency: options.concurrency,
    };
    let feeds = fetch_season_feeds(provider, &chain, &feed_options).await;

    let players = if has_roster_moves(&feeds) {
        fetch_players(provider).await
    } else {
        PlayerDirectory::new()
    };

    let report = aggregate(&feeds, &players, options);
    info!(
        winners = report.winners.len(),
        games = report.largest_blowouts.len(),
        "league stats computed"
    );
    Ok(report)
}

/// Fold fetched season feeds into a report.
pub fn aggregate(feeds: &[SeasonFeed], players: &PlayerDirectory, options: &StatsOptions) -> LeagueStatsReport {
    let mut scores = ScoreTally::default();
    for feed in feeds {
        scores.fold_season(feed, options.max_week);
    }

    let mut report = LeagueStatsReport {
        winners: feeds.iter().filter_map(champion_record).collect(),
        biggest_skanks: player_churn(feeds, players, options.max_week, options.churn_top_n),
        trade_addicts: trade_addicts(feeds, options.max_week, options.trade_top_n),
        ..Default::default()
    };
    scores.finish(&mut report, options.top_n);
    report
}

fn has_roster_moves(feeds: &[SeasonFeed]) -> bool {
    feeds.iter().flat_map(|f| &f.weeks).any(|w| {
        w.transactions
            .as_ref()
            .is_some_and(|txs| txs.iter().any(|tx| !tx.adds.is_empty() || !tx.drops.is_empty()))
    })
}

/// `(user_id, display_name)` of a roster's owner when the owner is a known user.
fn identity(owners: &OwnerDirectory, roster_id: RosterId) -> (Option<String>, Option<String>) {
    match owners.owner(roster_id) {
        Some(user) => (Some(user.user_id.clone()), user.display_name.clone()),
        None => (None, None),
    }
}

fn ranked<T: Clone>(items: &[T], n: usize, compare: impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(compare);
    sorted.truncate(n);
    sorted
}

// ---------------------------------------------------------------------------
// Champions
// ---------------------------------------------------------------------------

fn champion_record(feed: &SeasonFeed) -> Option<ChampionRecord> {
    let league = &feed.league;
    let bracket = feed.winners_bracket.as_ref()?;
    let Some(champion) = bracket.champion() else {
        debug!(league_id = %league.league_id, "winners bracket has no resolvable champion");
        return None;
    };
    let Some(owners) = feed.owners.as_ref().filter(|o| o.has_roster(champion)) else {
        warn!(
            league_id = %league.league_id,
            roster_id = champion,
            "champion roster not found in season rosters"
        );
        return None;
    };

    let (user_id, display_name) = identity(owners, champion);
    let runner_up = bracket.runner_up();
    let (runner_up_user_id, runner_up_display_name) = match runner_up {
        Some(roster) => identity(owners, roster),
        None => (None, None),
    };
    Some(ChampionRecord {
        season: league.season.clone(),
        league_id: league.league_id.clone(),
        roster_id: champion,
        user_id,
        display_name,
        runner_up_roster_id: runner_up,
        runner_up_user_id,
        runner_up_display_name,
    })
}

// ---------------------------------------------------------------------------
// Scores, games and defense
// ---------------------------------------------------------------------------

struct Side {
    roster_id: RosterId,
    points: f64,
    user_id: Option<String>,
    display_name: Option<String>,
}

struct WinLoss {
    display_name: Option<String>,
    wins: u32,
    losses: u32,
    games: u32,
}

#[derive(Default)]
struct ScoreTally {
    weeks: Vec<WeekScoreRecord>,
    highest_week: Option<WeekScoreRecord>,
    lowest_week: Option<WeekScoreRecord>,
    season_totals: IndexMap<(String, RosterId), SeasonTotalRecord>,
    win_loss: IndexMap<String, WinLoss>,
    games: Vec<GameRecord>,
    points_against: IndexMap<(String, RosterId), DefenseRecord>,
}

impl ScoreTally {
    fn fold_season(&mut self, feed: &SeasonFeed, max_week: u32) {
        let Some(owners) = feed.owners.as_ref() else {
            warn!(league_id = %feed.league.league_id, "no rosters/users for season, skipping its scores");
            return;
        };
        for week in feed.weeks.iter().filter(|w| (1..=max_week).contains(&w.week)) {
            if let Some(matchups) = week.matchups.as_deref() {
                self.fold_week(&feed.league, owners, week.week, matchups);
            }
        }
    }

    fn fold_week(&mut self, league: &League, owners: &OwnerDirectory, week: u32, matchups: &[Matchup]) {
        let mut groups: IndexMap<MatchId, Vec<Side>> = IndexMap::new();

        for matchup in matchups {
            let points = matchup.score();
            if matchup.roster_id == 0 || !points.is_finite() {
                continue;
            }
            let roster_id = matchup.roster_id;
            let matchup_id = matchup.matchup_id.unwrap_or(0);
            let (user_id, display_name) = identity(owners, roster_id);

            let record = WeekScoreRecord {
                season: league.season.clone(),
                league_id: league.league_id.clone(),
                roster_id,
                user_id: user_id.clone(),
                display_name: display_name.clone(),
                week,
                matchup_id,
                points,
            };
            if self.highest_week.as_ref().map_or(true, |best| points > best.points) {
                self.highest_week = Some(record.clone());
            }
            if self.lowest_week.as_ref().map_or(true, |worst| points < worst.points) {
                self.lowest_week = Some(record.clone());
            }
            self.weeks.push(record);

            self.season_totals
                .entry((league.league_id.clone(), roster_id))
                .or_insert_with(|| SeasonTotalRecord {
                    season: league.season.clone(),
                    league_id: league.league_id.clone(),
                    roster_id,
                    user_id: user_id.clone(),
                    display_name: display_name.clone(),
                    total_points: 0.0,
                })
                .total_points += points;

            if matchup_id == 0 {
                continue;
            }
            groups.entry(matchup_id).or_default().push(Side {
                roster_id,
                points,
                user_id,
                display_name,
            });
        }

        for (matchup_id, mut sides) in groups {
            if sides.len() < 2 {
                continue;
            }
            sides.sort_by(|a, b| b.points.total_cmp(&a.points));
            let winner = &sides[0];
            let loser = &sides[sides.len() - 1];
            let margin = winner.points - loser.points;
            if !margin.is_finite() || margin <= 0.0 {
                continue;
            }

            self.games.push(GameRecord {
                season: league.season.clone(),
                league_id: league.league_id.clone(),
                week,
                matchup_id,
                winner_roster_id: winner.roster_id,
                winner_user_id: winner.user_id.clone(),
                winner_display_name: winner.display_name.clone(),
                winner_points: winner.points,
                loser_roster_id: loser.roster_id,
                loser_user_id: loser.user_id.clone(),
                loser_display_name: loser.display_name.clone(),
                loser_points: loser.points,
                margin,
            });
            self.record_result(winner, true);
            self.record_result(loser, false);
            self.allow(league, winner, loser.points);
            self.allow(league, loser, winner.points);
        }
    }

    fn record_result(&mut self, side: &Side, won: bool) {
        let Some(user_id) = side.user_id.as_ref() else {
            return;
        };
        let record = self
            .win_loss
            .entry(user_id.clone())
            .or_insert_with(|| WinLoss {
                display_name: side.display_name.clone(),
                wins: 0,
                losses: 0,
                games: 0,
            });
        if won {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
        record.games += 1;
    }

    fn allow(&mut self, league: &League, side: &Side, opponent_points: f64) {
        let record = self
            .points_against
            .entry((league.league_id.clone(), side.roster_id))
            .or_insert_with(|| DefenseRecord {
                season: league.season.clone(),
                league_id: league.league_id.clone(),
                roster_id: side.roster_id,
                user_id: side.user_id.clone(),
                display_name: side.display_name.clone(),
                total_points_against: 0.0,
                games_played: 0,
                avg_points_against: 0.0,
            });
        record.total_points_against += opponent_points;
        record.games_played += 1;
    }

    fn finish(self, report: &mut LeagueStatsReport, n: usize) {
        report.highest_week = self.highest_week;
        report.lowest_week = self.lowest_week;

        // Both directions keep first-seen order among ties, matching the
        // single highest and lowest week.
        report.top_scoring_weeks = ranked(&self.weeks, n, |a, b| b.points.total_cmp(&a.points));
        report.bottom_scoring_weeks = ranked(&self.weeks, n, |a, b| a.points.total_cmp(&b.points));

        let seasons: Vec<SeasonTotalRecord> = self.season_totals.into_values().collect();
        for season in &seasons {
            if report
                .highest_season
                .as_ref()
                .map_or(true, |best| season.total_points > best.total_points)
            {
                report.highest_season = Some(season.clone());
            }
            if report
                .lowest_season
                .as_ref()
                .map_or(true, |worst| season.total_points < worst.total_points)
            {
                report.lowest_season = Some(season.clone());
            }
        }
        report.top_seasons = ranked(&seasons, n, |a, b| b.total_points.total_cmp(&a.total_points));
        report.bottom_seasons = ranked(&seasons, n, |a, b| a.total_points.total_cmp(&b.total_points));

        let percentages: Vec<WinPercentageRecord> = self
            .win_loss
            .into_iter()
            .filter(|(_, r)| r.games > 0)
            .map(|(user_id, r)| WinPercentageRecord {
                user_id,
                display_name: r.display_name,
                wins: r.wins,
                losses: r.losses,
                games: r.games,
                win_percentage: f64::from(r.wins) / f64::from(r.games),
            })
            .collect();
        report.highest_winning_percentages = ranked(&percentages, n, |a, b| {
            b.win_percentage.total_cmp(&a.win_percentage)
        });
        report.lowest_winning_percentages = ranked(&percentages, n, |a, b| {
            a.win_percentage.total_cmp(&b.win_percentage)
        });

        report.largest_blowouts = ranked(&self.games, n, |a, b| b.margin.total_cmp(&a.margin));
        report.closest_victories = ranked(&self.games, n, |a, b| a.margin.total_cmp(&b.margin));

        let defense: Vec<DefenseRecord> = self
            .points_against
            .into_values()
            .filter(|d| d.games_played > 0)
            .map(|mut d| {
                d.avg_points_against = d.total_points_against / f64::from(d.games_played);
                d
            })
            .collect();
        report.best_fantasy_defense = ranked(&defense, n, |a, b| {
            a.avg_points_against.total_cmp(&b.avg_points_against)
        });
        report.worst_fantasy_defense = ranked(&defense, n, |a, b| {
            b.avg_points_against.total_cmp(&a.avg_points_against)
        });
    }
}

// ---------------------------------------------------------------------------
// Player churn
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Churn {
    managers: IndexSet<String>,
    last_acquired: Option<i64>,
}

/// Manager identity for a roster: the owning user id when known, otherwise a
/// season-scoped roster key.
fn manager_key(feed: &SeasonFeed, roster_id: RosterId) -> String {
    feed.owners
        .as_ref()
        .and_then(|o| o.owner_id(roster_id))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:{roster_id}", feed.league.league_id))
}

fn player_churn(feeds: &[SeasonFeed], players: &PlayerDirectory, max_week: u32, n: usize) -> Vec<PlayerChurnRecord> {
    let mut churn: IndexMap<String, Churn> = IndexMap::new();

    for feed in feeds {
        let weeks = feed.weeks.iter().filter(|w| (1..=max_week).contains(&w.week));
        for tx in weeks.filter_map(|w| w.transactions.as_ref()).flatten() {
            if !tx.is_complete() {
                continue;
            }
            for (player_id, &roster_id) in &tx.adds {
                let entry = churn.entry(player_id.clone()).or_default();
                entry.managers.insert(manager_key(feed, roster_id));
                if let Some(at) = tx.timestamp() {
                    entry.last_acquired = Some(entry.last_acquired.map_or(at, |prev| prev.max(at)));
                }
            }
            for (player_id, &roster_id) in &tx.drops {
                churn
                    .entry(player_id.clone())
                    .or_default()
                    .managers
                    .insert(manager_key(feed, roster_id));
            }
        }
    }

    let mut missing_names = 0usize;
    let mut records: Vec<PlayerChurnRecord> = churn
        .into_iter()
        .map(|(player_id, c)| {
            let player = players.get(&player_id);
            if player.is_none() {
                missing_names += 1;
            }
            PlayerChurnRecord {
                first_name: player.and_then(|p| p.first_name.clone()),
                last_name: player.and_then(|p| p.last_name.clone()),
                display_name: player.and_then(|p| p.display_name()),
                num_teams: c.managers.len() as u32,
                team_ids: c.managers.into_iter().collect(),
                last_acquired: c.last_acquired,
                player_id,
            }
        })
        .collect();
    if missing_names > 0 {
        warn!(count = missing_names, "players missing from player directory");
    }

    records.sort_by(|a, b| b.num_teams.cmp(&a.num_teams));
    records.truncate(n);
    records
}

// ---------------------------------------------------------------------------
// Trade addicts
// ---------------------------------------------------------------------------

fn trade_addicts(feeds: &[SeasonFeed], max_week: u32, n: usize) -> Vec<TradeAddictRecord> {
    let mut addicts: IndexMap<String, TradeAddictRecord> = IndexMap::new();

    for feed in feeds {
        let Some(owners) = feed.owners.as_ref() else {
            continue;
        };
        let weeks = feed.weeks.iter().filter(|w| (1..=max_week).contains(&w.week));
        for tx in weeks.filter_map(|w| w.transactions.as_ref()).flatten() {
            if !tx.is_completed_trade() {
                continue;
            }
            for &roster_id in &tx.roster_ids {
                let Some(user_id) = owners.owner_id(roster_id) else {
                    continue;
                };
                let record = addicts
                    .entry(user_id.to_string())
                    .or_insert_with(|| TradeAddictRecord {
                        user_id: user_id.to_string(),
                        display_name: owners.display_name(roster_id).map(str::to_string),
                        total_trades: 0,
                        players_acquired: 0,
                        players_traded: 0,
                    });
                record.total_trades += 1;
                record.players_acquired += tx.adds.values().filter(|&&r| r == roster_id).count() as u32;
                record.players_traded += tx.drops.values().filter(|&&r| r == roster_id).count() as u32;
            }
        }
    }

    let mut records: Vec<TradeAddictRecord> = addicts.into_values().collect();
    records.sort_by(|a, b| b.total_trades.cmp(&a.total_trades));
    records.truncate(n);
    records
}
