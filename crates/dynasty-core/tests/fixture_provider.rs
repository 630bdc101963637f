// Integration tests for the fixture-backed provider.
//
// Fixtures are written the way the Sleeper API actually returns data: ids as
// strings in some seasons and numbers in others, nulls where lists or
// scores are missing, and bracket slots that point at other matches.

use std::fs;
use std::path::PathBuf;

use dynasty_core::memory::{Call, FixtureFile, StaticProvider};
use dynasty_core::model::{TeamRef, TransactionKind};
use dynasty_core::{LeagueDataProvider, ProviderError};

// ===========================================================================
// Test helpers
// ===========================================================================

const MESSY_SEASON: &str = r#"{
  "leagues": [{
    "league": {"league_id": "900", "season": 2022, "previous_league_id": null, "total_rosters": "2"},
    "rosters": [{"roster_id": "1", "owner_id": "u1"}, {"roster_id": 2, "owner_id": null}],
    "users": [{"user_id": "u1", "display_name": "Alpha", "metadata": null}],
    "matchups": {
      "1": [
        {"roster_id": 1, "matchup_id": "1", "points": "101.5"},
        {"roster_id": 2, "matchup_id": 1, "points": null}
      ]
    },
    "transactions": {
      "1": [{
        "transaction_id": "t1", "type": "waiver", "status": "complete",
        "roster_ids": ["1"], "adds": {"p1": "1"}, "drops": null,
        "draft_picks": null, "leg": 1, "created": 1660000000000
      }]
    },
    "winners_bracket": [
      {"r": 1, "m": 1, "t1": 1, "t2": 2, "w": 1, "l": 2},
      {"r": 2, "m": 2, "t1": {"w": 1}, "t2": {"l": 1}, "t1_from": null}
    ]
  }],
  "players": {"p1": {"first_name": "Josh", "last_name": "Allen", "position": "QB"}}
}"#;

fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dynasty_core_fixture_{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("league.json");
    fs::write(&path, contents).unwrap();
    path
}

// ===========================================================================
// Loading
// ===========================================================================

#[tokio::test]
async fn messy_season_decodes_through_the_provider() {
    let path = write_fixture("messy", MESSY_SEASON);
    let provider = StaticProvider::from_fixture_file(&path).await.unwrap();

    let league = provider.league("900").await.unwrap();
    assert_eq!(league.season, "2022");
    assert_eq!(league.previous(), None);
    assert_eq!(league.total_rosters, Some(2));

    let rosters = provider.rosters("900").await.unwrap();
    assert_eq!(rosters[0].roster_id, 1);
    assert!(rosters[1].owner_id.is_none());

    let matchups = provider.matchups("900", 1).await.unwrap();
    assert_eq!(matchups[0].matchup_id, Some(1));
    assert_eq!(matchups[0].points, Some(101.5));
    assert_eq!(matchups[1].score(), 0.0);

    let transactions = provider.transactions("900", 1).await.unwrap();
    assert_eq!(transactions[0].kind, TransactionKind::Waiver);
    assert!(transactions[0].drops.is_empty());
    assert!(transactions[0].involves(1));

    let bracket = provider.winners_bracket("900").await.unwrap();
    assert_eq!(bracket[1].t1, Some(TeamRef::WinnerOf(1)));
    assert_eq!(bracket[1].t2, Some(TeamRef::LoserOf(1)));
    assert!(provider.losers_bracket("900").await.unwrap().is_empty());

    let players = provider.players().await.unwrap();
    assert_eq!(players["p1"].display_name().as_deref(), Some("Josh Allen"));

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn fixture_round_trips_through_json() {
    let path = write_fixture("round_trip", MESSY_SEASON);
    let fixture: FixtureFile = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let rewritten = write_fixture("round_trip_rewritten", &serde_json::to_string(&fixture).unwrap());

    let provider = StaticProvider::from_fixture_file(&rewritten).await.unwrap();
    let bracket = provider.winners_bracket("900").await.unwrap();
    assert_eq!(bracket, fixture.leagues[0].winners_bracket);

    let _ = fs::remove_dir_all(path.parent().unwrap());
    let _ = fs::remove_dir_all(rewritten.parent().unwrap());
}

#[tokio::test]
async fn missing_or_invalid_fixture_files_are_errors() {
    let missing = std::env::temp_dir().join("dynasty_core_fixture_missing/none.json");
    let err = StaticProvider::from_fixture_file(&missing).await.unwrap_err();
    assert!(matches!(err, ProviderError::Io { .. }));

    let path = write_fixture("invalid", "{ \"leagues\": [");
    let err = StaticProvider::from_fixture_file(&path).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode { .. }));

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

// ===========================================================================
// Failure injection
// ===========================================================================

#[tokio::test]
async fn failures_are_scoped_to_one_call() {
    let path = write_fixture("failures", MESSY_SEASON);
    let provider = StaticProvider::from_fixture_file(&path)
        .await
        .unwrap()
        .failing(Call::WinnersBracket("900".into()))
        .failing(Call::Players);

    assert!(matches!(
        provider.winners_bracket("900").await,
        Err(ProviderError::Status { status: 503, .. })
    ));
    assert!(provider.players().await.is_err());
    assert!(provider.losers_bracket("900").await.is_ok());
    assert!(matches!(provider.league("901").await, Err(ProviderError::NotFound { .. })));
    assert_eq!(provider.request_count(), 4);

    let _ = fs::remove_dir_all(path.parent().unwrap());
}
