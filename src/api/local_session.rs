use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::{api_structs::EntitlementsResponse, fetch_json, ApiRequest, FetchError, Transport};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Lockfile not found at {0}. Is the Riot Client running?")]
    LockfileMissing(PathBuf),

    #[error("Failed to read lockfile: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed lockfile: {0}")]
    Lockfile(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(#[source] FetchError),

    #[error("Client version lookup failed: {0}")]
    ClientVersion(String),

    #[error("Lockfile reader task failed: {0}")]
    Join(#[from] tokio::task::JoinError)
}

/// Port/password pair published by the running game client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lockfile {
    pub port: u16,
    pub password: String
}

impl Lockfile {
    /// Parses `name:pid:port:password:protocol`.
    pub fn parse(contents: &str) -> Result<Self, SessionError> {
        let fields: Vec<&str> = contents.trim().split(':').collect();
        if fields.len() < 4 {
            return Err(SessionError::Lockfile(format!("expected at least 4 fields, found {}", fields.len())));
        }

        let port = fields[2]
            .parse::<u16>()
            .map_err(|_| SessionError::Lockfile(format!("invalid port '{}'", fields[2])))?;

        Ok(Lockfile {
            port,
            password: fields[3].to_owned()
        })
    }

    fn basic_auth(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("riot:{}", self.password)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiotCredentials {
    pub access_token: String,
    pub entitlement_token: String,
    pub puuid: String,
    pub client_version: String
}

/// Reads the local lockfile and exchanges it for session credentials.
pub struct LocalSession<R> {
    transport: R,
    lockfile_path: PathBuf,
    base_host: String
}

impl<R: Transport> LocalSession<R> {
    pub fn new(transport: R, lockfile_path: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            lockfile_path: lockfile_path.into(),
            base_host: "https://127.0.0.1".to_owned()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.base_host = host.into();
        self
    }

    /// The file read is blocking, so it runs on the blocking pool.
    pub async fn read_lockfile(&self) -> Result<Lockfile, SessionError> {
        let path = self.lockfile_path.clone();
        tokio::task::spawn_blocking(move || read_lockfile_blocking(&path)).await?
    }

    pub async fn connect(&self) -> Result<RiotCredentials, SessionError> {
        let lockfile = self.read_lockfile().await?;
        let base = format!("{}:{}", self.base_host, lockfile.port);
        let auth = lockfile.basic_auth();

        let entitlements: EntitlementsResponse = fetch_json(
            &self.transport,
            ApiRequest::get(format!("{base}/entitlements/v1/token")).header("Authorization", auth.clone())
        )
        .await
        .map_err(SessionError::TokenExchange)?;

        let sessions: Value = fetch_json(
            &self.transport,
            ApiRequest::get(format!("{base}/product-session/v1/external-sessions")).header("Authorization", auth)
        )
        .await
        .map_err(|e| SessionError::ClientVersion(e.to_string()))?;

        let client_version = client_version_from_sessions(&sessions)
            .ok_or_else(|| SessionError::ClientVersion("no session carries a version".to_owned()))?;

        info!(puuid = %entitlements.subject, client_version = %client_version, "local session established");
        Ok(RiotCredentials {
            access_token: entitlements.access_token,
            entitlement_token: entitlements.token,
            puuid: entitlements.subject,
            client_version
        })
    }
}

fn read_lockfile_blocking(path: &Path) -> Result<Lockfile, SessionError> {
    if !path.exists() {
        return Err(SessionError::LockfileMissing(path.to_path_buf()));
    }

    debug!(path = %path.display(), "reading lockfile");
    let contents = std::fs::read_to_string(path)?;
    Lockfile::parse(&contents)
}

/// `host_app.version`, or the first session entry exposing a version string.
fn client_version_from_sessions(sessions: &Value) -> Option<String> {
    if let Some(version) = sessions["host_app"]["version"].as_str() {
        return Some(version.to_owned());
    }

    sessions
        .as_object()?
        .values()
        .find_map(|session| session["version"].as_str().map(str::to_owned))
}
