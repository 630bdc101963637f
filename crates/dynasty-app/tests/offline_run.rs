// Integration tests for the app layer.
//
// These run the same steps as the binary, offline: shipped defaults are
// copied into a temp config dir, league data comes from the engine's JSON
// fixture, and snapshots land in a temp cache dir named by the config.

use std::fs;
use std::path::{Path, PathBuf};

use dynasty_app::commands::{self, Snapshots, RIVALRY_SNAPSHOT, STATS_SNAPSHOT};
use dynasty_app::config::{load_config, CONFIG_FILE};
use dynasty_core::memory::StaticProvider;

// ===========================================================================
// Test helpers
// ===========================================================================

const DEFAULTS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/defaults/dynasty.toml");
const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../dynasty-stats/tests/fixtures/league.json");

/// A base dir whose defaults/ holds the shipped config with the cache dir and
/// league id filled in.
fn base_dir(name: &str) -> (PathBuf, PathBuf) {
    let tmp = std::env::temp_dir().join(format!("dynasty_offline_{name}"));
    let _ = fs::remove_dir_all(&tmp);
    fs::create_dir_all(tmp.join("defaults")).unwrap();

    let cache_dir = tmp.join("cache");
    let shipped = fs::read_to_string(DEFAULTS).unwrap();
    let customized = shipped
        .replace("league_id = \"\"", "league_id = \"L2024\"")
        .replace(
            "# dir = \"/path/to/cache\"",
            &format!("dir = {:?}", cache_dir.display().to_string()),
        );
    fs::write(tmp.join("defaults").join(CONFIG_FILE), customized).unwrap();
    (tmp, cache_dir)
}

async fn provider() -> StaticProvider {
    StaticProvider::from_fixture_file(Path::new(FIXTURE)).await.unwrap()
}

// ===========================================================================
// End-to-end runs
// ===========================================================================

#[tokio::test]
async fn stats_run_uses_configured_cache_dir() {
    let (tmp, cache_dir) = base_dir("stats");
    let config = load_config(&tmp, None).unwrap();
    assert_eq!(config.cache_dir().unwrap(), cache_dir);

    let snapshots = Snapshots::in_dir(config.cache_dir().unwrap(), config.cache_ttl());
    let provider = provider().await;
    let report = commands::league_stats(
        &provider,
        &config.league.league_id,
        &config.stats_options(),
        &snapshots,
        false,
    )
    .await
    .unwrap();

    assert_eq!(report.winners.len(), 2);
    assert_eq!(report.largest_blowouts[0].margin, 50.0);
    assert!(cache_dir.join("L2024").join(STATS_SNAPSHOT).exists());

    let _ = fs::remove_dir_all(&tmp);
}

#[tokio::test]
async fn league_override_selects_fixture_season() {
    let (tmp, _) = base_dir("override");
    // The 2023 league is the start of its own one-season chain.
    let config = load_config(&tmp, Some("L2023")).unwrap();

    let entries = commands::chain(&provider().await, &config.league.league_id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].season, "2023");

    let _ = fs::remove_dir_all(&tmp);
}

#[tokio::test]
async fn rivalry_run_writes_dataset_snapshot() {
    let (tmp, cache_dir) = base_dir("rivalry");
    let config = load_config(&tmp, None).unwrap();
    let snapshots = Snapshots::in_dir(config.cache_dir().unwrap(), config.cache_ttl());

    let report = commands::rivalry(
        &provider().await,
        &config.league.league_id,
        1,
        2,
        config.provider.max_concurrent_requests,
        &snapshots,
        false,
    )
    .await
    .unwrap();

    assert_eq!(report.stats.total_games, 3);
    assert_eq!(report.stats.total_trades, 1);
    let snapshot = fs::read_to_string(cache_dir.join("L2024").join(RIVALRY_SNAPSHOT)).unwrap();
    let dataset: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(dataset["league_id"], "L2024");

    let _ = fs::remove_dir_all(&tmp);
}
