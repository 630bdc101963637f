// Dynasty league history entry point.
//
// Startup sequence:
// 1. Parse arguments and initialize tracing (stderr, or --log-file)
// 2. Load config (copying defaults on first run)
// 3. Build the provider: Sleeper over HTTP, or a JSON fixture
// 4. Run the subcommand and print its result as JSON on stdout

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use dynasty_app::cli::{Cli, Command};
use dynasty_app::commands::{self, Snapshots};
use dynasty_app::config::{self, Config};
use dynasty_core::memory::StaticProvider;
use dynasty_core::sleeper::SleeperClient;
use dynasty_core::LeagueDataProvider;
use serde::Serialize;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Arguments and tracing
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    // 2. Config
    let base_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let config = config::load_config(&base_dir, cli.league_id.as_deref())
        .context("failed to load configuration")?;
    let league_id = config.league.league_id.as_str();
    info!(
        league_id,
        name = config.league.name.as_deref().unwrap_or("unnamed"),
        "config loaded"
    );

    // 3. Provider and snapshots
    let provider = build_provider(&config, cli.fixture.as_deref()).await?;
    let snapshots = snapshots(&config, cli.fixture.is_some())?;

    // 4. Command
    match cli.command {
        Command::Chain => {
            let entries = commands::chain(provider.as_ref(), league_id).await?;
            print_json(&entries)?;
        }
        Command::Stats { refresh } => {
            let options = config.stats_options();
            let report =
                commands::league_stats(provider.as_ref(), league_id, &options, &snapshots, refresh)
                    .await?;
            print_json(&report)?;
        }
        Command::Rivalry {
            team1,
            team2,
            refresh,
        } => {
            let report = commands::rivalry(
                provider.as_ref(),
                league_id,
                team1,
                team2,
                config.provider.max_concurrent_requests,
                &snapshots,
                refresh,
            )
            .await?;
            print_json(&report)?;
        }
    }

    Ok(())
}

async fn build_provider(
    config: &Config,
    fixture: Option<&Path>,
) -> anyhow::Result<Box<dyn LeagueDataProvider>> {
    if let Some(path) = fixture {
        let provider = StaticProvider::from_fixture_file(path)
            .await
            .with_context(|| format!("failed to load fixture {}", path.display()))?;
        info!(fixture = %path.display(), "serving league data from fixture");
        return Ok(Box::new(provider));
    }

    let client = SleeperClient::new(&config.provider.base_url, config.request_timeout())
        .context("failed to build HTTP client")?;
    info!(base_url = %config.provider.base_url, "using Sleeper API");
    Ok(Box::new(client))
}

/// Snapshots are skipped for fixture runs and when caching is turned off.
fn snapshots(config: &Config, offline: bool) -> anyhow::Result<Snapshots> {
    if offline || !config.cache.enabled {
        info!("snapshot cache disabled");
        return Ok(Snapshots::disabled());
    }
    let dir: PathBuf = config.cache_dir().context("failed to resolve cache directory")?;
    info!(dir = %dir.display(), ttl_hours = config.cache.ttl_hours, "snapshot cache enabled");
    Ok(Snapshots::in_dir(dir, config.cache_ttl()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

/// Initialize tracing on stderr, keeping stdout for the JSON output, or on
/// `log_file` when given.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::EnvFilter;

    let writer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create log directory {}", parent.display()))?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            BoxMakeWriter::new(file)
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dynasty=info,warn")),
        )
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
