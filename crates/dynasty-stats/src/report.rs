// League statistics report types.
//
// Field names serialize in PascalCase so snapshots stay readable by the
// league site that consumes `league-stats.json`.

use dynasty_core::RosterId;
use serde::{Deserialize, Serialize};

/// One season's champion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChampionRecord {
    pub season: String,
    pub league_id: String,
    pub roster_id: RosterId,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub runner_up_roster_id: Option<RosterId>,
    pub runner_up_user_id: Option<String>,
    pub runner_up_display_name: Option<String>,
}

/// A single team-week score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeekScoreRecord {
    pub season: String,
    pub league_id: String,
    pub roster_id: RosterId,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub week: u32,
    /// Zero when the provider did not pair the team that week.
    pub matchup_id: u32,
    pub points: f64,
}

/// A team's points summed over one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeasonTotalRecord {
    pub season: String,
    pub league_id: String,
    pub roster_id: RosterId,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub total_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WinPercentageRecord {
    pub user_id: String,
    pub display_name: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub games: u32,
    /// Fraction in `0.0..=1.0`.
    pub win_percentage: f64,
}

/// A decided game between two teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameRecord {
    pub season: String,
    pub league_id: String,
    pub week: u32,
    pub matchup_id: u32,
    pub winner_roster_id: RosterId,
    pub winner_user_id: Option<String>,
    pub winner_display_name: Option<String>,
    pub winner_points: f64,
    pub loser_roster_id: RosterId,
    pub loser_user_id: Option<String>,
    pub loser_display_name: Option<String>,
    pub loser_points: f64,
    pub margin: f64,
}

/// Points allowed by one team over one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DefenseRecord {
    pub season: String,
    pub league_id: String,
    pub roster_id: RosterId,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub total_points_against: f64,
    pub games_played: u32,
    pub avg_points_against: f64,
}

/// How many managers a player has passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerChurnRecord {
    pub player_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub num_teams: u32,
    /// Manager keys in first-seen order.
    pub team_ids: Vec<String>,
    /// Millisecond timestamp of the latest add.
    pub last_acquired: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TradeAddictRecord {
    pub user_id: String,
    pub display_name: Option<String>,
    pub total_trades: u32,
    pub players_acquired: u32,
    pub players_traded: u32,
}

/// Everything computed over a league's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeagueStatsReport {
    pub winners: Vec<ChampionRecord>,
    pub highest_week: Option<WeekScoreRecord>,
    pub lowest_week: Option<WeekScoreRecord>,
    pub highest_season: Option<SeasonTotalRecord>,
    pub lowest_season: Option<SeasonTotalRecord>,
    pub top_seasons: Vec<SeasonTotalRecord>,
    pub bottom_seasons: Vec<SeasonTotalRecord>,
    pub highest_winning_percentages: Vec<WinPercentageRecord>,
    pub lowest_winning_percentages: Vec<WinPercentageRecord>,
    pub largest_blowouts: Vec<GameRecord>,
    pub closest_victories: Vec<GameRecord>,
    pub top_scoring_weeks: Vec<WeekScoreRecord>,
    pub bottom_scoring_weeks: Vec<WeekScoreRecord>,
    pub best_fantasy_defense: Vec<DefenseRecord>,
    pub worst_fantasy_defense: Vec<DefenseRecord>,
    pub biggest_skanks: Vec<PlayerChurnRecord>,
    pub trade_addicts: Vec<TradeAddictRecord>,
}

impl LeagueStatsReport {
    /// True when nothing was computed, e.g. for an empty season chain.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
