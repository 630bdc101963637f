// League history analytics: bracket resolution, season-chain traversal,
// cross-season statistics, head-to-head rivalries and report caching.

pub mod bracket;
pub mod cache;
pub mod chain;
pub mod feed;
pub mod report;
pub mod rivalry;
pub mod stats;

pub use bracket::Bracket;
pub use cache::{CacheError, SnapshotCache};
pub use chain::league_chain;
pub use report::LeagueStatsReport;
pub use rivalry::{load_rivalry_dataset, rivalry_report, RivalryDataset, RivalryReport};
pub use stats::{aggregate, compute_league_stats, StatsError, StatsOptions};
