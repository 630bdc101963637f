// Command handlers: provider -> snapshot cache -> engine -> serializable result.
//
// Snapshots are kept per league under `<cache dir>/<league id>/` so switching
// leagues never serves another league's report.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use dynasty_core::{LeagueDataProvider, RosterId};
use dynasty_stats::rivalry::RivalryDataset;
use dynasty_stats::{
    compute_league_stats, league_chain, load_rivalry_dataset, rivalry_report, LeagueStatsReport,
    RivalryReport, SnapshotCache, StatsOptions,
};
use serde::Serialize;
use tracing::{info, warn};

pub const STATS_SNAPSHOT: &str = "league-stats.json";
pub const RIVALRY_SNAPSHOT: &str = "rivalries-data.json";

// ---------------------------------------------------------------------------
// Snapshot locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Snapshots {
    dir: Option<PathBuf>,
    ttl: Duration,
}

impl Snapshots {
    pub fn in_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: Some(dir.into()),
            ttl,
        }
    }

    /// Always compute, never read or write snapshots.
    pub fn disabled() -> Self {
        Self {
            dir: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn cache(&self, league_id: &str, file: &str) -> Option<SnapshotCache> {
        self.dir
            .as_ref()
            .map(|dir| SnapshotCache::new(dir.join(league_id).join(file), self.ttl))
    }
}

// ---------------------------------------------------------------------------
// chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainEntry {
    pub league_id: String,
    pub season: String,
    pub name: Option<String>,
}

pub async fn chain<P>(provider: &P, league_id: &str) -> anyhow::Result<Vec<ChainEntry>>
where
    P: LeagueDataProvider + ?Sized,
{
    let leagues = league_chain(provider, league_id)
        .await
        .with_context(|| format!("failed to fetch league {league_id}"))?;
    Ok(leagues
        .into_iter()
        .map(|l| ChainEntry {
            league_id: l.league_id,
            season: l.season,
            name: l.name,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

pub async fn league_stats<P>(
    provider: &P,
    league_id: &str,
    options: &StatsOptions,
    snapshots: &Snapshots,
    refresh: bool,
) -> anyhow::Result<LeagueStatsReport>
where
    P: LeagueDataProvider + ?Sized,
{
    let compute = || compute_league_stats(provider, league_id, options);
    let report = match snapshots.cache(league_id, STATS_SNAPSHOT) {
        Some(cache) => cache.get_or_compute(refresh, compute).await,
        None => compute().await,
    }
    .with_context(|| format!("failed to compute league stats for {league_id}"))?;

    if report.is_empty() {
        warn!(league_id, "league stats report is empty");
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// rivalry
// ---------------------------------------------------------------------------

pub async fn rivalry<P>(
    provider: &P,
    league_id: &str,
    team1: RosterId,
    team2: RosterId,
    concurrency: usize,
    snapshots: &Snapshots,
    refresh: bool,
) -> anyhow::Result<RivalryReport>
where
    P: LeagueDataProvider + ?Sized,
{
    if team1 == team2 {
        bail!("a rivalry needs two different rosters, got {team1} twice");
    }

    let load = || load_rivalry_dataset(provider, league_id, concurrency);
    let dataset: RivalryDataset = match snapshots.cache(league_id, RIVALRY_SNAPSHOT) {
        Some(cache) => cache.get_or_compute(refresh, load).await,
        None => load().await,
    }
    .with_context(|| format!("failed to load rivalry data for {league_id}"))?;

    for roster_id in [team1, team2] {
        if !dataset.rosters.iter().any(|r| r.roster_id == roster_id) {
            warn!(roster_id, "roster is not part of the current season");
        }
    }

    let report = rivalry_report(&dataset, team1, team2);
    info!(
        team1,
        team2,
        games = report.stats.total_games,
        trades = report.stats.total_trades,
        "rivalry computed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynasty_core::memory::{Call, LeagueFixture, StaticProvider};
    use dynasty_core::model::{Matchup, Roster};

    fn side(roster_id: RosterId, matchup_id: u32, points: f64) -> Matchup {
        Matchup {
            roster_id,
            matchup_id: Some(matchup_id),
            points: Some(points),
        }
    }

    fn provider() -> StaticProvider {
        let mut current = LeagueFixture::new("L2", "2024", Some("L1"));
        current.league.name = Some("Dynasty League".into());
        current.rosters = vec![
            Roster { roster_id: 1, owner_id: Some("u1".into()) },
            Roster { roster_id: 2, owner_id: Some("u2".into()) },
        ];
        current.users = vec![
            serde_json::from_value(serde_json::json!({"user_id": "u1", "display_name": "Alpha"})).unwrap(),
            serde_json::from_value(serde_json::json!({"user_id": "u2", "display_name": "Bravo"})).unwrap(),
        ];
        current.matchups.insert(1, vec![side(1, 1, 110.0), side(2, 1, 100.0)]);
        current.matchups.insert(2, vec![side(1, 1, 95.0), side(2, 1, 120.0)]);

        let mut previous = LeagueFixture::new("L1", "2023", Some("0"));
        previous.rosters = current.rosters.clone();
        previous.users = current.users.clone();
        previous.matchups.insert(1, vec![side(1, 1, 90.0), side(2, 1, 80.0)]);

        StaticProvider::new().with_league(current).with_league(previous)
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dynasty_commands_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn chain_lists_seasons_newest_first() {
        let entries = chain(&provider(), "L2").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name.as_deref(), Some("Dynasty League"));
        assert_eq!(entries[1].season, "2023");
    }

    #[tokio::test]
    async fn chain_fails_when_start_league_is_unavailable() {
        let provider = provider().failing(Call::League("L2".into()));
        assert!(chain(&provider, "L2").await.is_err());
    }

    #[tokio::test]
    async fn stats_snapshot_is_written_per_league_and_reused() {
        let dir = test_dir("stats");
        let snapshots = Snapshots::in_dir(&dir, Duration::from_secs(3600));
        let provider = provider();
        let options = StatsOptions::default();

        let fresh = league_stats(&provider, "L2", &options, &snapshots, false).await.unwrap();
        assert!(dir.join("L2").join(STATS_SNAPSHOT).exists());
        let requests = provider.request_count();

        let cached = league_stats(&provider, "L2", &options, &snapshots, false).await.unwrap();
        assert_eq!(provider.request_count(), requests);
        assert_eq!(cached.winners, fresh.winners);
        assert_eq!(cached.highest_winning_percentages, fresh.highest_winning_percentages);

        // A refresh goes back to the provider.
        league_stats(&provider, "L2", &options, &snapshots, true).await.unwrap();
        assert!(provider.request_count() > requests);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn disabled_snapshots_always_compute() {
        let provider = provider();
        let options = StatsOptions::default();
        league_stats(&provider, "L2", &options, &Snapshots::disabled(), false).await.unwrap();
        let requests = provider.request_count();
        league_stats(&provider, "L2", &options, &Snapshots::disabled(), false).await.unwrap();
        assert_eq!(provider.request_count(), requests * 2);
    }

    #[tokio::test]
    async fn rivalry_report_across_seasons() {
        let dir = test_dir("rivalry");
        let snapshots = Snapshots::in_dir(&dir, Duration::from_secs(3600));

        let report = rivalry(&provider(), "L2", 1, 2, 4, &snapshots, false).await.unwrap();
        assert_eq!(report.team1.display_name.as_deref(), Some("Alpha"));
        assert_eq!(report.stats.total_games, 3);
        assert_eq!((report.stats.team1_wins, report.stats.team2_wins), (2, 1));
        assert!(dir.join("L2").join(RIVALRY_SNAPSHOT).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rivalry_rejects_same_roster_twice() {
        let err = rivalry(&provider(), "L2", 1, 1, 4, &Snapshots::disabled(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("two different rosters"));
    }
}
