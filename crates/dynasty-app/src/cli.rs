// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dynasty_core::RosterId;

#[derive(Debug, Parser)]
#[command(name = "dynasty")]
#[command(version)]
#[command(about = "League history records, champions and rivalries for Sleeper dynasty leagues", long_about = None)]
pub struct Cli {
    /// Directory holding defaults/ and config/ (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Serve league data from a JSON fixture instead of the Sleeper API
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// League id of the most recent season, overriding the config file
    #[arg(long, env = "DYNASTY_LEAGUE_ID")]
    pub league_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Print the season chain, newest first
    Chain,
    /// Print the all-time league stats report
    Stats {
        /// Recompute even if a fresh snapshot exists
        #[arg(long)]
        refresh: bool,
    },
    /// Print the head-to-head report for two rosters of the current season
    Rivalry {
        team1: RosterId,
        team2: RosterId,
        /// Refetch league history even if a fresh snapshot exists
        #[arg(long)]
        refresh: bool,
    },
}
