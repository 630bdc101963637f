// Library root: provider data model and the league-data provider boundary
// shared by the analytics engine and the command-line app.

pub mod memory;
pub mod model;
pub mod provider;
pub mod sleeper;

pub use model::{MatchId, RosterId};
pub use provider::{LeagueDataProvider, ProviderError};
