use std::path::PathBuf;

use dotenv::dotenv;

/// Loads `.env` if present. Values already in the environment take precedence.
pub fn load_env() {
    dotenv().ok();
}

/// `%LOCALAPPDATA%\Riot Games\Riot Client\Config\lockfile`
pub fn default_lockfile_path() -> PathBuf {
    let base = std::env::var_os("LOCALAPPDATA").map(PathBuf::from).unwrap_or_default();

    base.join("Riot Games").join("Riot Client").join("Config").join("lockfile")
}

pub fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}
