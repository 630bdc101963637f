// Head-to-head rivalry analysis.
//
// `load_rivalry_dataset` gathers every season's matchups, brackets and
// completed transactions once, plus the names of traded players. Everything
// else in this module is pure computation over that dataset for a chosen
// pair of rosters.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use dynasty_core::model::{LeagueUser, Matchup, Roster, Transaction};
use dynasty_core::{LeagueDataProvider, RosterId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bracket::Bracket;
use crate::chain::league_chain;
use crate::feed::{fetch_players, fetch_season_feeds, FeedOptions, NO_LINEUP_WEEK};
use crate::stats::StatsError;

/// Weeks up to this one are regular season and need no bracket check.
pub const LAST_REGULAR_SEASON_WEEK: u32 = 14;

/// Games decided by at most this many points count as close.
pub const CLOSE_GAME_MARGIN: f64 = 10.0;

/// Number of most recent games the trend looks at.
pub const TREND_WINDOW: usize = 5;

/// Season label -> week -> that week's matchups.
pub type SeasonMatchups = BTreeMap<String, BTreeMap<u32, Vec<Matchup>>>;

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonBrackets {
    pub winners: Bracket,
    pub losers: Bracket,
}

/// A completed transaction tagged with the season it happened in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonTransaction {
    pub season: String,
    pub transaction: Transaction,
}

/// Everything needed to analyze any pair of rosters in the current season.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RivalryDataset {
    pub league_id: String,
    /// Current season's rosters and users.
    pub rosters: Vec<Roster>,
    pub users: Vec<LeagueUser>,
    pub matchups: SeasonMatchups,
    /// Completed transactions, newest first.
    pub transactions: Vec<SeasonTransaction>,
    /// Season label -> brackets.
    pub brackets: BTreeMap<String, SeasonBrackets>,
    /// Player id -> display name, for players received in completed trades.
    #[serde(default)]
    pub player_names: BTreeMap<String, String>,
}

/// Fetch the rivalry dataset for the chain starting at `start_league_id`.
pub async fn load_rivalry_dataset<P>(
    provider: &P,
    start_league_id: &str,
    concurrency: usize,
) -> Result<RivalryDataset, StatsError>
where
    P: LeagueDataProvider + ?Sized,
{
    let chain = league_chain(provider, start_league_id)
        .await
        .map_err(|source| StatsError::Chain {
            league_id: start_league_id.to_string(),
            source,
        })?;
    let Some(current) = chain.first() else {
        info!("season chain is empty, returning empty rivalry dataset");
        return Ok(RivalryDataset::default());
    };
    info!(seasons = chain.len(), "loading rivalry data");

    let options = FeedOptions {
        weeks: 1..=NO_LINEUP_WEEK,
        losers_bracket: true,
        concurrency,
    };
    let feeds = fetch_season_feeds(provider, &chain, &options).await;

    let mut dataset = RivalryDataset {
        league_id: current.league_id.clone(),
        ..Default::default()
    };
    if let Some(owners) = feeds.first().and_then(|f| f.owners.as_ref()) {
        dataset.rosters = owners.rosters().to_vec();
        dataset.users = owners.users().to_vec();
    }

    for feed in feeds {
        let season = feed.league.season.clone();
        if dataset.matchups.contains_key(&season) {
            warn!(%season, league_id = %feed.league.league_id, "duplicate season label, merging weeks");
        }
        let weeks = dataset.matchups.entry(season.clone()).or_default();
        for week in &feed.weeks {
            if let Some(matchups) = week.matchups.as_ref().filter(|m| !m.is_empty()) {
                weeks.insert(week.week, matchups.clone());
            }
        }

        dataset.brackets.insert(
            season.clone(),
            SeasonBrackets {
                winners: feed.winners_bracket.unwrap_or_default(),
                losers: feed.losers_bracket.unwrap_or_default(),
            },
        );

        let completed = feed
            .weeks
            .into_iter()
            .filter_map(|w| w.transactions)
            .flatten()
            .filter(Transaction::is_complete)
            .map(|transaction| SeasonTransaction {
                season: season.clone(),
                transaction,
            });
        dataset.transactions.extend(completed);
    }

    dataset
        .transactions
        .sort_by(|a, b| b.transaction.timestamp().cmp(&a.transaction.timestamp()));

    let traded: BTreeSet<&String> = dataset
        .transactions
        .iter()
        .filter(|t| t.transaction.is_completed_trade())
        .flat_map(|t| t.transaction.adds.keys())
        .collect();
    if !traded.is_empty() {
        let players = fetch_players(provider).await;
        let mut missing_names = 0usize;
        let mut names = BTreeMap::new();
        for player_id in traded {
            match players.get(player_id).and_then(|p| p.display_name()) {
                Some(name) => {
                    names.insert(player_id.clone(), name);
                }
                None => missing_names += 1,
            }
        }
        if missing_names > 0 {
            warn!(count = missing_names, "traded players missing from player directory");
        }
        dataset.player_names = names;
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Head-to-head games
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Regular,
    /// Winners bracket.
    Playoff,
    /// Losers bracket.
    Consolation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RivalryGame {
    pub week: u32,
    pub season: String,
    pub margin: f64,
    pub team1_score: f64,
    pub team2_score: f64,
    /// `None` for a tie.
    pub winner: Option<RosterId>,
    pub kind: GameKind,
}

/// How a pairing in `week` should be classified, or `None` when a playoff
/// week pairing appears in neither bracket.
fn classify(week: u32, team1: RosterId, team2: RosterId, brackets: Option<&SeasonBrackets>) -> Option<GameKind> {
    if week <= LAST_REGULAR_SEASON_WEEK {
        return Some(GameKind::Regular);
    }
    let brackets = brackets?;
    if brackets.winners.has_pairing(team1, team2) {
        Some(GameKind::Playoff)
    } else if brackets.losers.has_pairing(team1, team2) {
        Some(GameKind::Consolation)
    } else {
        None
    }
}

/// Every game `team1` and `team2` played against each other, in season then
/// week order. Seasons later than `current_year` and the lineup-less final
/// week are skipped, as are pairings where both teams scored zero.
pub fn find_head_to_head(
    team1: RosterId,
    team2: RosterId,
    matchups: &SeasonMatchups,
    brackets: &BTreeMap<String, SeasonBrackets>,
    current_year: i32,
) -> Vec<RivalryGame> {
    let mut games = Vec::new();

    for (season, weeks) in matchups {
        if season.trim().parse::<i32>().is_ok_and(|year| year > current_year) {
            continue;
        }
        let season_brackets = brackets.get(season);

        for (&week, entries) in weeks {
            if week == NO_LINEUP_WEEK {
                continue;
            }
            let side1 = entries.iter().rev().find(|m| m.roster_id == team1);
            let side2 = entries.iter().rev().find(|m| m.roster_id == team2);
            let (Some(side1), Some(side2)) = (side1, side2) else {
                continue;
            };
            if side1.matchup_id.is_none() || side1.matchup_id != side2.matchup_id {
                continue;
            }

            let Some(kind) = classify(week, team1, team2, season_brackets) else {
                continue;
            };
            let (team1_score, team2_score) = (side1.score(), side2.score());
            if team1_score == 0.0 && team2_score == 0.0 {
                continue;
            }

            games.push(RivalryGame {
                week,
                season: season.clone(),
                margin: (team1_score - team2_score).abs(),
                team1_score,
                team2_score,
                winner: winner(team1, team2, team1_score, team2_score),
                kind,
            });
        }
    }

    games
}

fn winner(team1: RosterId, team2: RosterId, score1: f64, score2: f64) -> Option<RosterId> {
    if score1 > score2 {
        Some(team1)
    } else if score2 > score1 {
        Some(team2)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Streaks and trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakInfo {
    pub current_streak: u32,
    pub current_streak_owner: Option<RosterId>,
    pub longest_streak: u32,
    pub longest_streak_owner: Option<RosterId>,
}

/// Streaks over chronologically ordered games. A tie ends any streak.
pub fn streaks(games: &[RivalryGame]) -> StreakInfo {
    let mut info = StreakInfo::default();
    for game in games {
        match game.winner {
            None => {
                info.current_streak = 0;
                info.current_streak_owner = None;
            }
            Some(w) if info.current_streak_owner == Some(w) => info.current_streak += 1,
            Some(w) => {
                info.current_streak = 1;
                info.current_streak_owner = Some(w);
            }
        }
        if info.current_streak > info.longest_streak {
            info.longest_streak = info.current_streak;
            info.longest_streak_owner = info.current_streak_owner;
        }
    }
    info
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Team1Hot,
    Team2Hot,
    Even,
    #[default]
    NoData,
}

impl Trend {
    pub fn text(self) -> &'static str {
        match self {
            Trend::Team1Hot | Trend::Team2Hot => "Dominating recently",
            Trend::Even => "Evenly matched lately",
            Trend::NoData => "Not enough games",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendInfo {
    pub recent_winner: Option<RosterId>,
    pub recent_team1_wins: u32,
    pub recent_team2_wins: u32,
    pub trend: Trend,
    pub trend_text: String,
}

/// Who has the upper hand over the last few chronologically ordered games.
pub fn trend(team1: RosterId, team2: RosterId, games: &[RivalryGame]) -> TrendInfo {
    let mut info = TrendInfo {
        trend_text: Trend::NoData.text().to_string(),
        ..Default::default()
    };
    if games.len() < 2 {
        return info;
    }

    let recent = &games[games.len().saturating_sub(TREND_WINDOW)..];
    for game in recent {
        if game.team1_score > game.team2_score {
            info.recent_team1_wins += 1;
        } else if game.team2_score > game.team1_score {
            info.recent_team2_wins += 1;
        }
    }

    let diff = i64::from(info.recent_team1_wins) - i64::from(info.recent_team2_wins);
    (info.trend, info.recent_winner) = match diff {
        d if d >= 2 => (Trend::Team1Hot, Some(team1)),
        d if d <= -2 => (Trend::Team2Hot, Some(team2)),
        _ => (Trend::Even, None),
    };
    info.trend_text = info.trend.text().to_string();
    info
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickDetail {
    pub season: String,
    pub round: u32,
    pub original_owner: Option<RosterId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradedPlayer {
    pub player_id: String,
    /// `None` when the player directory has no entry.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDetail {
    pub season: String,
    pub week: u32,
    pub transaction_id: String,
    /// Players received by team 1.
    pub team1_adds: Vec<TradedPlayer>,
    pub team2_adds: Vec<TradedPlayer>,
    pub team1_picks: Vec<PickDetail>,
    pub team2_picks: Vec<PickDetail>,
}

/// Completed trades between the two rosters, in the order given. Player
/// names come from `player_names`.
pub fn trades_between(
    team1: RosterId,
    team2: RosterId,
    transactions: &[SeasonTransaction],
    player_names: &BTreeMap<String, String>,
) -> Vec<TradeDetail> {
    transactions
        .iter()
        .filter(|t| t.transaction.is_completed_trade())
        .filter(|t| t.transaction.involves(team1) && t.transaction.involves(team2))
        .map(|SeasonTransaction { season, transaction: tx }| {
            let mut detail = TradeDetail {
                season: season.clone(),
                week: tx.leg,
                transaction_id: tx.transaction_id.clone(),
                team1_adds: Vec::new(),
                team2_adds: Vec::new(),
                team1_picks: Vec::new(),
                team2_picks: Vec::new(),
            };
            for (player_id, &roster_id) in &tx.adds {
                let player = TradedPlayer {
                    player_id: player_id.clone(),
                    name: player_names.get(player_id).cloned(),
                };
                if roster_id == team1 {
                    detail.team1_adds.push(player);
                } else if roster_id == team2 {
                    detail.team2_adds.push(player);
                }
            }
            for pick in &tx.draft_picks {
                let pick_detail = PickDetail {
                    season: pick.season.clone(),
                    round: pick.round,
                    original_owner: pick.roster_id,
                };
                if pick.owner_id == Some(team1) {
                    detail.team1_picks.push(pick_detail);
                } else if pick.owner_id == Some(team2) {
                    detail.team2_picks.push(pick_detail);
                }
            }
            detail
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RivalryStats {
    pub team1_wins: u32,
    pub team2_wins: u32,
    pub ties: u32,
    pub total_games: u32,
    pub team1_biggest_blowout: Option<RivalryGame>,
    pub team2_biggest_blowout: Option<RivalryGame>,
    pub team1_narrowest_victory: Option<RivalryGame>,
    pub team2_narrowest_victory: Option<RivalryGame>,
    pub team1_total_points: f64,
    pub team2_total_points: f64,
    /// Percentage of games decided by `CLOSE_GAME_MARGIN` or less.
    pub intensity_score: u32,
    pub streak_info: StreakInfo,
    pub trend_info: TrendInfo,
    pub most_recent_matchup: Option<RivalryGame>,
    pub total_trades: u32,
    pub trade_details: Vec<TradeDetail>,
    pub most_recent_trade: Option<TradeDetail>,
    /// All head-to-head games, oldest first.
    pub games: Vec<RivalryGame>,
}

fn keep_if(slot: &mut Option<RivalryGame>, game: &RivalryGame, better: impl Fn(f64, f64) -> bool) {
    if slot.as_ref().map_or(true, |kept| better(game.margin, kept.margin)) {
        *slot = Some(game.clone());
    }
}

/// Head-to-head statistics for two rosters of the dataset's league.
pub fn rivalry_stats(team1: RosterId, team2: RosterId, dataset: &RivalryDataset, current_year: i32) -> RivalryStats {
    let mut games = find_head_to_head(team1, team2, &dataset.matchups, &dataset.brackets, current_year);
    games.sort_by(|a, b| a.season.cmp(&b.season).then(a.week.cmp(&b.week)));

    let mut stats = RivalryStats::default();
    let mut close_games = 0u32;
    for game in &games {
        stats.total_games += 1;
        stats.team1_total_points += game.team1_score;
        stats.team2_total_points += game.team2_score;
        if game.margin <= CLOSE_GAME_MARGIN {
            close_games += 1;
        }

        if game.team1_score > game.team2_score {
            stats.team1_wins += 1;
            keep_if(&mut stats.team1_narrowest_victory, game, |new, old| new < old);
            keep_if(&mut stats.team1_biggest_blowout, game, |new, old| new > old);
        } else if game.team2_score > game.team1_score {
            stats.team2_wins += 1;
            keep_if(&mut stats.team2_narrowest_victory, game, |new, old| new < old);
            keep_if(&mut stats.team2_biggest_blowout, game, |new, old| new > old);
        } else {
            stats.ties += 1;
        }
    }
    if stats.total_games > 0 {
        stats.intensity_score =
            (f64::from(close_games) / f64::from(stats.total_games) * 100.0).round() as u32;
    }

    stats.streak_info = streaks(&games);
    stats.trend_info = trend(team1, team2, &games);
    stats.most_recent_matchup = games.last().cloned();

    stats.trade_details = trades_between(team1, team2, &dataset.transactions, &dataset.player_names);
    stats.total_trades = stats.trade_details.len() as u32;
    stats.most_recent_trade = stats.trade_details.first().cloned();

    stats.games = games;
    stats
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RivalryTeam {
    pub roster_id: RosterId,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RivalryReport {
    pub team1: RivalryTeam,
    pub team2: RivalryTeam,
    pub stats: RivalryStats,
}

fn rivalry_team(dataset: &RivalryDataset, roster_id: RosterId) -> RivalryTeam {
    let owner_id = dataset
        .rosters
        .iter()
        .find(|r| r.roster_id == roster_id)
        .and_then(|r| r.owner_id.clone());
    if owner_id.is_none() {
        warn!(roster_id, "no owner found for roster in current season");
    }
    let user = owner_id
        .as_deref()
        .and_then(|id| dataset.users.iter().find(|u| u.user_id == id));
    RivalryTeam {
        roster_id,
        user_id: owner_id.clone(),
        display_name: user.and_then(|u| u.display_name.clone()),
        team_name: user.and_then(|u| u.metadata.team_name.clone()),
    }
}

/// Rivalry report as of `current_year`.
pub fn rivalry_report_for_year(
    dataset: &RivalryDataset,
    team1: RosterId,
    team2: RosterId,
    current_year: i32,
) -> RivalryReport {
    RivalryReport {
        team1: rivalry_team(dataset, team1),
        team2: rivalry_team(dataset, team2),
        stats: rivalry_stats(team1, team2, dataset, current_year),
    }
}

/// Rivalry report ignoring seasons after the current calendar year.
pub fn rivalry_report(dataset: &RivalryDataset, team1: RosterId, team2: RosterId) -> RivalryReport {
    rivalry_report_for_year(dataset, team1, team2, chrono::Local::now().year())
}
