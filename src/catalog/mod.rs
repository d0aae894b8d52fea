pub mod season;

use std::{
    collections::HashMap,
    path::{Path, PathBuf}
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{
    api_structs::{CatalogAgent, CatalogResponse, CatalogSeason, CatalogVersion, CatalogWeapon},
    ApiRequest, Endpoints, FetchError, Transport
};

pub use season::SeasonLabel;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to access catalog cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("Failed to fetch catalog resource: {0}")]
    Fetch(#[from] FetchError)
}

/// Static game data resolved from opaque ids. Every lookup returns `None`
/// rather than failing when an id is unknown.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    agent_names: HashMap<String, String>,
    agent_ids: HashMap<String, String>,
    weapon_names: HashMap<String, String>,
    skin_names: HashMap<String, String>,
    seasons: HashMap<String, SeasonLabel>,
    riot_client_version: Option<String>
}

impl Catalog {
    pub fn from_parts(
        agents: Vec<CatalogAgent>,
        weapons: Vec<CatalogWeapon>,
        seasons: Vec<CatalogSeason>,
        version: Option<CatalogVersion>
    ) -> Catalog {
        let mut catalog = Catalog {
            riot_client_version: version.map(|v| v.riot_client_version),
            ..Default::default()
        };

        for agent in agents.into_iter().filter(|a| a.is_playable_character) {
            catalog
                .agent_ids
                .insert(agent.display_name.to_lowercase(), agent.uuid.to_lowercase());
            catalog.agent_names.insert(agent.uuid.to_lowercase(), agent.display_name);
        }

        for weapon in weapons {
            for skin in &weapon.skins {
                catalog
                    .skin_names
                    .insert(skin.uuid.to_lowercase(), skin.display_name.clone());
                for chroma in &skin.chromas {
                    catalog
                        .skin_names
                        .insert(chroma.uuid.to_lowercase(), skin.display_name.clone());
                }
            }
            catalog.weapon_names.insert(weapon.uuid.to_lowercase(), weapon.display_name);
        }

        for season in seasons {
            if let Some(label) = SeasonLabel::from_catalog(&season) {
                catalog.seasons.insert(season.uuid.to_lowercase(), label);
            }
        }

        catalog
    }

    /// Loads every resource from `cache_dir`, fetching and persisting the ones
    /// not cached yet. A resource that cannot be obtained is left empty.
    pub async fn load<R: Transport>(transport: &R, endpoints: &Endpoints, cache_dir: &Path) -> Catalog {
        let agents = load_or_empty::<Vec<CatalogAgent>, R>(transport, endpoints, cache_dir, "agents").await;
        let weapons = load_or_empty::<Vec<CatalogWeapon>, R>(transport, endpoints, cache_dir, "weapons").await;
        let seasons = load_or_empty::<Vec<CatalogSeason>, R>(transport, endpoints, cache_dir, "seasons").await;
        let version = match load_resource::<CatalogVersion, R>(transport, endpoints, cache_dir, "version").await {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(error = %e, "catalog version unavailable");
                None
            }
        };

        let catalog = Catalog::from_parts(agents, weapons, seasons, version);
        info!(
            agents = catalog.agent_names.len(),
            skins = catalog.skin_names.len(),
            seasons = catalog.seasons.len(),
            "catalog loaded"
        );
        catalog
    }

    pub fn agent_name(&self, agent_id: &str) -> Option<&str> {
        self.agent_names.get(&agent_id.to_lowercase()).map(String::as_str)
    }

    pub fn agent_id(&self, agent_name: &str) -> Option<&str> {
        self.agent_ids.get(&agent_name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn weapon_name(&self, weapon_id: &str) -> Option<&str> {
        self.weapon_names.get(&weapon_id.to_lowercase()).map(String::as_str)
    }

    /// Resolves a skin id or any of its chroma ids to the skin's name.
    pub fn skin_name(&self, skin_id: &str) -> Option<&str> {
        self.skin_names.get(&skin_id.to_lowercase()).map(String::as_str)
    }

    pub fn season(&self, season_id: &str) -> Option<SeasonLabel> {
        self.seasons.get(&season_id.to_lowercase()).copied()
    }

    pub fn riot_client_version(&self) -> Option<&str> {
        self.riot_client_version.as_deref()
    }
}

async fn load_or_empty<T, R>(transport: &R, endpoints: &Endpoints, cache_dir: &Path, name: &str) -> T
where
    T: DeserializeOwned + Default,
    R: Transport
{
    match load_resource(transport, endpoints, cache_dir, name).await {
        Ok(resource) => resource,
        Err(e) => {
            warn!(resource = name, error = %e, "catalog resource unavailable");
            T::default()
        }
    }
}

/// Reads `{cache_dir}/{name}.json`; when absent or unreadable, fetches the
/// resource and writes the raw body back to disk.
async fn load_resource<T, R>(transport: &R, endpoints: &Endpoints, cache_dir: &Path, name: &str) -> Result<T, CatalogError>
where
    T: DeserializeOwned,
    R: Transport
{
    let path = cache_dir.join(format!("{name}.json"));

    if let Ok(bytes) = tokio::fs::read(&path).await {
        match serde_json::from_slice::<CatalogResponse<T>>(&bytes) {
            Ok(cached) => return Ok(cached.data),
            Err(e) => warn!(path = %path.display(), error = %e, "cached catalog file is corrupt, refetching")
        }
    }

    let url = endpoints.catalog_resource(name);
    info!(url = %url, "fetching catalog resource");
    let response = transport.send(ApiRequest::get(url)).await.map_err(FetchError::from)?;
    if !response.is_success() {
        return Err(FetchError::Absent {
            status: response.status
        }
        .into());
    }
    let parsed: CatalogResponse<T> = response.json().map_err(FetchError::from)?;

    let io_error = |source: std::io::Error| CatalogError::Io {
        path: path.clone(),
        source
    };
    tokio::fs::create_dir_all(cache_dir).await.map_err(io_error)?;
    tokio::fs::write(&path, &response.body).await.map_err(io_error)?;

    Ok(parsed.data)
}
