// Provider data model: seasons, rosters, users, weekly matchups, players.
//
// Every type here is a read-only snapshot of what the league-data provider
// returned. Field decoding is deliberately forgiving (see `lenient`) because
// older seasons are not always consistent about numbers vs. strings.

pub mod bracket;
pub mod lenient;
pub mod transaction;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use bracket::{BracketMatch, TeamRef};
pub use transaction::{TradedPick, Transaction, TransactionKind, TransactionStatus};

/// Per-season team identifier. Not stable across seasons.
pub type RosterId = u32;

/// Identifier of a matchup pairing within one week, or of a bracket match
/// within one bracket.
pub type MatchId = u32;

/// The back-reference value that terminates a season chain.
pub const NO_PREVIOUS_LEAGUE: &str = "0";

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// One season of the league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub league_id: String,
    /// Year label, e.g. "2023".
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub season: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub previous_league_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub total_rosters: Option<u32>,
}

impl League {
    /// The previous season's id, or `None` when this is the first season
    /// (absent, empty, or the `"0"` sentinel).
    pub fn previous(&self) -> Option<&str> {
        self.previous_league_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != NO_PREVIOUS_LEAGUE)
    }

    /// Numeric year of the season label, if it parses.
    pub fn year(&self) -> Option<i32> {
        self.season.trim().parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Teams and owners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub roster_id: RosterId,
    /// User id of the owning manager; unowned rosters have none.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub team_name: Option<String>,
}

/// A manager as listed for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueUser {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub metadata: UserMetadata,
}

// ---------------------------------------------------------------------------
// Weekly results
// ---------------------------------------------------------------------------

/// One team's result for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub roster_id: RosterId,
    /// Teams sharing a matchup id in the same week played each other.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub matchup_id: Option<MatchId>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub points: Option<f64>,
}

impl Matchup {
    /// Points scored, treating a missing score as zero.
    pub fn score(&self) -> f64 {
        self.points.unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub player_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub search_full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub team: Option<String>,
}

impl Player {
    /// Best available display name: full name, then "first last", then the
    /// provider's search name. Team defenses only carry first/last names.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().filter(|s| !s.is_empty()) {
            return Some(full.to_string());
        }
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => return Some(format!("{first} {last}")),
            (Some(only), None) | (None, Some(only)) => return Some(only.to_string()),
            (None, None) => {}
        }
        self.search_full_name.clone().filter(|s| !s.is_empty())
    }
}

/// Player id -> player record.
pub type PlayerDirectory = HashMap<String, Player>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn league_previous_respects_sentinel() {
        let mut league: League = serde_json::from_value(json!({
            "league_id": "300",
            "season": "2024",
            "previous_league_id": "0"
        }))
        .unwrap();
        assert_eq!(league.previous(), None);

        league.previous_league_id = Some("200".into());
        assert_eq!(league.previous(), Some("200"));

        league.previous_league_id = None;
        assert_eq!(league.previous(), None);
    }

    #[test]
    fn league_accepts_numeric_season() {
        let league: League = serde_json::from_value(json!({
            "league_id": "300",
            "season": 2022,
            "previous_league_id": null
        }))
        .unwrap();
        assert_eq!(league.season, "2022");
        assert_eq!(league.year(), Some(2022));
    }

    #[test]
    fn matchup_decodes_string_ids_and_null_points() {
        let m: Matchup = serde_json::from_value(json!({
            "roster_id": "4",
            "matchup_id": null,
            "points": null,
            "starters": ["1", "2"]
        }))
        .unwrap();
        assert_eq!(m.roster_id, 4);
        assert_eq!(m.matchup_id, None);
        assert_eq!(m.score(), 0.0);
    }

    #[test]
    fn user_with_null_metadata() {
        let u: LeagueUser = serde_json::from_value(json!({
            "user_id": "u1",
            "display_name": "Alpha",
            "metadata": null
        }))
        .unwrap();
        assert_eq!(u.display_name.as_deref(), Some("Alpha"));
        assert!(u.metadata.team_name.is_none());
    }

    #[test]
    fn player_display_name_fallbacks() {
        let full = Player {
            full_name: Some("Josh Allen".into()),
            ..Default::default()
        };
        assert_eq!(full.display_name().as_deref(), Some("Josh Allen"));

        let defense = Player {
            first_name: Some("Buffalo".into()),
            last_name: Some("Bills".into()),
            ..Default::default()
        };
        assert_eq!(defense.display_name().as_deref(), Some("Buffalo Bills"));

        assert_eq!(Player::default().display_name(), None);
    }
}
