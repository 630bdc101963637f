// End-to-end tests for the analytics pipeline.
//
// A two-season, four-team league is served from a JSON fixture through
// `StaticProvider`. Roster ownership is shuffled between seasons so anything
// "per person" has to join through user ids.

use std::path::Path;
use std::time::Duration;

use dynasty_core::memory::{Call, StaticProvider};
use dynasty_stats::cache::SnapshotCache;
use dynasty_stats::rivalry::{rivalry_report_for_year, GameKind, TradedPlayer, Trend};
use dynasty_stats::{compute_league_stats, league_chain, load_rivalry_dataset, LeagueStatsReport, StatsOptions};

// ===========================================================================
// Helpers
// ===========================================================================

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/league.json");

async fn provider() -> StaticProvider {
    StaticProvider::from_fixture_file(Path::new(FIXTURE))
        .await
        .expect("fixture should load")
}

async fn stats(provider: &StaticProvider) -> LeagueStatsReport {
    compute_league_stats(provider, "L2024", &StatsOptions::default())
        .await
        .expect("stats should compute")
}

// ===========================================================================
// Season chain
// ===========================================================================

#[tokio::test]
async fn chain_runs_newest_to_oldest() {
    let provider = provider().await;
    let chain = league_chain(&provider, "L2024").await.unwrap();
    let seasons: Vec<&str> = chain.iter().map(|l| l.season.as_str()).collect();
    assert_eq!(seasons, vec!["2024", "2023"]);
}

// ===========================================================================
// League stats
// ===========================================================================

#[tokio::test]
async fn champions_per_season() {
    let report = stats(&provider().await).await;

    assert_eq!(report.winners.len(), 2);
    let latest = &report.winners[0];
    assert_eq!(latest.season, "2024");
    assert_eq!(latest.display_name.as_deref(), Some("Alpha"));
    assert_eq!(latest.runner_up_display_name.as_deref(), Some("Delta"));

    // 2023's final has an unfilled slot; the other side takes the title.
    let earlier = &report.winners[1];
    assert_eq!(earlier.roster_id, 3);
    assert_eq!(earlier.user_id.as_deref(), Some("u4"));
    assert!(earlier.runner_up_roster_id.is_none());
}

#[tokio::test]
async fn scoring_extremes() {
    let report = stats(&provider().await).await;

    let high = report.highest_week.as_ref().unwrap();
    assert_eq!((high.season.as_str(), high.week, high.points), ("2024", 15, 140.0));
    let low = report.lowest_week.as_ref().unwrap();
    assert_eq!((low.season.as_str(), low.week, low.points), ("2023", 2, 0.0));
    assert_eq!(low.user_id.as_deref(), Some("u2"));

    assert_eq!(report.top_scoring_weeks.len(), 10);
    assert_eq!(report.top_scoring_weeks[0].points, 140.0);
    assert_eq!(report.top_scoring_weeks[1].points, 130.0);

    let best = report.highest_season.as_ref().unwrap();
    assert_eq!((best.league_id.as_str(), best.roster_id, best.total_points), ("L2024", 1, 370.5));
    let worst = report.lowest_season.as_ref().unwrap();
    assert_eq!(worst.user_id.as_deref(), Some("u1"));
    assert_eq!(worst.total_points, 60.0);
    assert_eq!(report.top_seasons.len(), 8);
}

#[tokio::test]
async fn win_percentages_join_through_users() {
    let report = stats(&provider().await).await;

    let order: Vec<(&str, u32, u32)> = report
        .highest_winning_percentages
        .iter()
        .map(|r| (r.user_id.as_str(), r.wins, r.losses))
        .collect();
    assert_eq!(order, vec![("u1", 3, 1), ("u2", 2, 2), ("u4", 2, 2), ("u3", 1, 3)]);
    assert_eq!(report.highest_winning_percentages[0].win_percentage, 0.75);
    assert_eq!(report.lowest_winning_percentages[0].user_id, "u3");
}

#[tokio::test]
async fn games_and_defense() {
    let report = stats(&provider().await).await;

    // Scoreless and tied pairings never become games.
    assert_eq!(report.largest_blowouts.len(), 8);
    let blowout = &report.largest_blowouts[0];
    assert_eq!(blowout.margin, 50.0);
    assert_eq!(blowout.winner_display_name.as_deref(), Some("Bravo"));
    let closest = &report.closest_victories[0];
    assert_eq!(closest.margin, 4.0);
    assert_eq!((closest.week, closest.winner_roster_id), (15, 4));

    let best = &report.best_fantasy_defense[0];
    assert_eq!((best.league_id.as_str(), best.roster_id), ("L2023", 1));
    assert_eq!(best.avg_points_against, 60.0);
    let worst = &report.worst_fantasy_defense[0];
    assert_eq!((worst.league_id.as_str(), worst.roster_id), ("L2024", 2));
    assert_eq!(worst.avg_points_against, 113.5);
}

#[tokio::test]
async fn churn_and_trades() {
    let report = stats(&provider().await).await;

    let churn = &report.biggest_skanks;
    assert_eq!(churn[0].player_id, "p300");
    assert_eq!(churn[0].num_teams, 3);
    assert_eq!(churn[0].display_name.as_deref(), Some("Buffalo Bills"));
    assert_eq!(churn[0].last_acquired, Some(1_700_100_000_000));
    assert_eq!(churn[1].player_id, "p100");
    assert_eq!(churn[1].num_teams, 2);

    let addicts = &report.trade_addicts;
    assert_eq!(addicts.len(), 4);
    assert!(addicts.iter().all(|a| a.total_trades == 1));
    let alpha = addicts.iter().find(|a| a.user_id == "u1").unwrap();
    assert_eq!((alpha.players_acquired, alpha.players_traded), (1, 1));
    let delta = addicts.iter().find(|a| a.user_id == "u4").unwrap();
    assert_eq!((delta.players_acquired, delta.players_traded), (0, 1));
}

#[tokio::test]
async fn identical_feeds_give_identical_reports() {
    let provider = provider().await;
    let first = serde_json::to_string(&stats(&provider).await).unwrap();
    let second = serde_json::to_string(&stats(&provider).await).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn failed_units_are_skipped() {
    let provider = provider()
        .await
        .failing(Call::Matchups("L2024".into(), 15))
        .failing(Call::WinnersBracket("L2023".into()))
        .failing(Call::Players);
    let report = stats(&provider).await;

    assert_eq!(report.winners.len(), 1);
    assert_eq!(report.highest_week.as_ref().map(|w| w.points), Some(130.0));
    assert_eq!(report.largest_blowouts.len(), 6);
    assert!(report.biggest_skanks.iter().all(|c| c.display_name.is_none()));
}

#[tokio::test]
async fn cached_report_skips_the_provider() {
    let dir = std::env::temp_dir().join("dynasty_pipeline_cache");
    let _ = std::fs::remove_dir_all(&dir);
    let cache = SnapshotCache::new(dir.join("league-stats.json"), Duration::from_secs(3600));
    let provider = provider().await;
    let options = StatsOptions::default();

    let fresh: LeagueStatsReport = cache
        .get_or_compute(false, || compute_league_stats(&provider, "L2024", &options))
        .await
        .unwrap();
    let requests = provider.request_count();
    let cached: LeagueStatsReport = cache
        .get_or_compute(false, || compute_league_stats(&provider, "L2024", &options))
        .await
        .unwrap();

    assert_eq!(provider.request_count(), requests);
    assert_eq!(cached.winners, fresh.winners);
    assert_eq!(cached.top_scoring_weeks, fresh.top_scoring_weeks);
    assert_eq!(cached.highest_winning_percentages, fresh.highest_winning_percentages);

    let _ = std::fs::remove_dir_all(&dir);
}

// ===========================================================================
// Rivalries
// ===========================================================================

#[tokio::test]
async fn rivalry_between_first_two_rosters() {
    let provider = provider().await;
    let dataset = load_rivalry_dataset(&provider, "L2024", 4).await.unwrap();
    let report = rivalry_report_for_year(&dataset, 1, 2, 2024);

    assert_eq!(report.team1.team_name.as_deref(), Some("Alpha Dogs"));
    assert_eq!(report.team2.display_name.as_deref(), Some("Bravo"));

    let stats = &report.stats;
    assert_eq!(stats.total_games, 3);
    assert_eq!((stats.team1_wins, stats.team2_wins, stats.ties), (3, 0, 0));
    assert_eq!(stats.intensity_score, 0);
    assert_eq!(stats.streak_info.longest_streak, 3);
    assert_eq!(stats.trend_info.trend, Trend::Team1Hot);

    let playoff = stats.most_recent_matchup.as_ref().unwrap();
    assert_eq!((playoff.season.as_str(), playoff.week), ("2024", 15));
    assert_eq!(playoff.kind, GameKind::Playoff);

    assert_eq!(stats.total_trades, 1);
    let trade = stats.most_recent_trade.as_ref().unwrap();
    assert_eq!(trade.transaction_id, "tx-trade-2024");
    let received = |adds: &[TradedPlayer]| -> Vec<(String, Option<String>)> {
        adds.iter().map(|p| (p.player_id.clone(), p.name.clone())).collect()
    };
    assert_eq!(received(&trade.team1_adds), vec![("p100".to_string(), Some("Ja'Marr Chase".to_string()))]);
    assert_eq!(received(&trade.team2_adds), vec![("p200".to_string(), Some("Bijan Robinson".to_string()))]);
    assert_eq!(trade.team1_picks.len(), 1);
}

#[tokio::test]
async fn rivalry_ignores_seasons_after_current_year() {
    let provider = provider().await;
    let dataset = load_rivalry_dataset(&provider, "L2024", 4).await.unwrap();
    let report = rivalry_report_for_year(&dataset, 1, 2, 2023);
    assert_eq!(report.stats.total_games, 1);
    assert_eq!(report.stats.games[0].season, "2023");
}
