use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::env::{default_cache_dir, default_lockfile_path};

#[derive(Parser, Clone, Debug)]
#[command(
    name = "valorank",
    about = "Live rank and match-history overview for your current Valorant match",
    long_about = "Reads the local Riot Client session, detects the current match or party \
    and shows rank, recent competitive stats and skins for every player"
)]
pub struct Args {
    /// Regional game server cluster, e.g. eu, na, ap, kr
    #[arg(short, long, env = "VALORANK_REGION", default_value = "eu")]
    pub region: String,

    /// Player-data shard; usually the same as the region
    #[arg(short, long, env = "VALORANK_SHARD", default_value = "eu")]
    pub shard: String,

    /// Riot Client lockfile. Defaults to the standard Windows location.
    #[arg(long, env = "VALORANK_LOCKFILE")]
    pub lockfile: Option<PathBuf>,

    /// Directory holding the cached static catalog
    #[arg(long, env = "VALORANK_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Competitive matches loaded per player on first sight
    #[arg(long, default_value_t = 5)]
    pub initial_window: usize,

    /// Matches added per player by each load-more
    #[arg(long, default_value_t = 10)]
    pub page_size: usize,

    /// Milliseconds to pause after each published update
    #[arg(long, default_value_t = 50)]
    pub update_interval_ms: u64,

    /// Attempts per match detail when rate limited
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Refresh once and print both teams (default)
    Refresh,
    /// Keep refreshing until interrupted
    Watch {
        #[arg(short, long, default_value_t = 10)]
        interval: u64
    },
    /// Refresh, then extend every player's history `pages` times
    LoadMore {
        #[arg(short, long, default_value_t = 1)]
        pages: u32
    },
    /// Leave agent select
    Dodge,
    /// Select an agent without locking
    Select { agent: String },
    /// Select and lock an agent
    Lock { agent: String }
}

impl Args {
    pub fn lockfile_path(&self) -> PathBuf {
        self.lockfile.clone().unwrap_or_else(default_lockfile_path)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}
