// Season chain traversal.
//
// Each season points back at the one before it. Walking those links from the
// current season yields the league's full history, newest first.

use std::collections::HashSet;

use dynasty_core::model::League;
use dynasty_core::{LeagueDataProvider, ProviderError};
use tracing::{debug, warn};

/// Fetch every season reachable from `start_league_id`, most recent first.
///
/// The walk stops at a season with no previous id (or the `"0"` sentinel),
/// and also when a previous id repeats a season already visited. Failing to
/// fetch the starting season is an error; failing to fetch an older season
/// ends the chain at the last season that loaded.
pub async fn league_chain<P>(provider: &P, start_league_id: &str) -> Result<Vec<League>, ProviderError>
where
    P: LeagueDataProvider + ?Sized,
{
    let mut seasons: Vec<League> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut next = Some(start_league_id.trim().to_string()).filter(|id| !id.is_empty());

    while let Some(league_id) = next.take() {
        if !visited.insert(league_id.clone()) {
            warn!(%league_id, "season chain revisits a league; stopping walk");
            break;
        }

        let league = match provider.league(&league_id).await {
            Ok(league) => league,
            Err(e) if seasons.is_empty() => return Err(e),
            Err(e) => {
                warn!(%league_id, "failed to fetch earlier season, truncating chain: {e}");
                break;
            }
        };
        debug!(%league_id, season = %league.season, "loaded season");

        next = league.previous().map(str::to_string);
        seasons.push(league);
    }

    Ok(seasons)
}
