pub mod api_structs;
pub mod batch;
pub mod local_session;

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
    Client, ClientBuilder
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use batch::fetch_all;
pub use local_session::{LocalSession, RiotCredentials};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error
    },

    #[error("Invalid header {0}")]
    InvalidHeader(String)
}

/// Why a lookup produced no value. Absence is an expected answer from the
/// game services (4xx, empty history) and is mapped to placeholders; the
/// other variants are logged and then treated the same way.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No data (HTTP {status})")]
    Absent { status: u16 },

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError)
}

impl FetchError {
    pub fn is_absence(&self) -> bool {
        matches!(self, FetchError::Absent { .. })
    }

    /// Rate limiting and network failures; the same lookup may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. } | FetchError::Transport(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    pub fn put_json<T: Serialize>(url: impl Into<String>, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method: Method::Put,
            body: Some(serde_json::to_value(body)?),
            ..Self::get(url)
        })
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn auth(mut self, headers: &AuthHeaders) -> Self {
        self.headers.extend(headers.pairs());
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub retry_after: Option<Duration>,
    pub body: Bytes
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// The single seam through which every network call flows.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport> Transport for &T {
    async fn send(&self, request: ApiRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::build(ClientBuilder::new())
    }

    /// The local client API serves a self-signed certificate.
    pub fn insecure() -> Result<Self, TransportError> {
        Self::build(ClientBuilder::new().danger_accept_invalid_certs(true))
    }

    fn build(builder: ClientBuilder) -> Result<Self, TransportError> {
        let client = builder
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|source| TransportError::Request {
                url: String::new(),
                source
            })?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<HttpResponse, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }

        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Put => self.client.put(&request.url),
            Method::Post => self.client.post(&request.url)
        };
        let builder = match &request.body {
            Some(body) => builder.headers(headers).json(body),
            None => builder.headers(headers)
        };

        let to_error = |source: reqwest::Error| TransportError::Request {
            url: request.url.clone(),
            source
        };
        let response = builder.send().await.map_err(to_error)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.bytes().await.map_err(to_error)?;

        debug!(url = %request.url, status, "response received");
        Ok(HttpResponse {
            status,
            retry_after,
            body
        })
    }
}

/// Sends a request and decodes a successful body. Non-success statuses are
/// reported as absence.
pub async fn fetch_json<T, R>(transport: &R, request: ApiRequest) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    R: Transport
{
    let response = transport.send(request).await?;
    if !response.is_success() {
        return Err(FetchError::Absent {
            status: response.status
        });
    }

    Ok(response.json()?)
}

// PC / Windows, as sent by the desktop client.
const PLATFORM_DESCRIPTOR: &str = r#"{"platformType":"PC","platformOS":"Windows","platformOSVersion":"10.0.19042.1.256.64bit","platformChipset":"Unknown"}"#;

/// Authorization bundle shared by every regional and player-data call for the
/// lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub access_token: String,
    pub entitlement_token: String,
    pub client_version: String
}

impl AuthHeaders {
    pub fn new(credentials: &RiotCredentials) -> Self {
        Self {
            access_token: credentials.access_token.clone(),
            entitlement_token: credentials.entitlement_token.clone(),
            client_version: credentials.client_version.clone()
        }
    }

    pub fn with_client_version(&self, client_version: &str) -> Self {
        Self {
            client_version: client_version.to_owned(),
            ..self.clone()
        }
    }

    pub fn platform() -> String {
        STANDARD.encode(PLATFORM_DESCRIPTOR)
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        vec![
            ("X-Riot-ClientPlatform".to_owned(), Self::platform()),
            ("X-Riot-ClientVersion".to_owned(), self.client_version.clone()),
            ("X-Riot-Entitlements-JWT".to_owned(), self.entitlement_token.clone()),
            ("Authorization".to_owned(), format!("Bearer {}", self.access_token)),
        ]
    }
}

/// Base URLs for one region/shard pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub glz: String,
    pub pd: String,
    pub catalog: String
}

impl Endpoints {
    pub fn new(region: &str, shard: &str) -> Self {
        Self {
            glz: format!("https://glz-{region}-1.{shard}.a.pvp.net"),
            pd: format!("https://pd.{shard}.a.pvp.net"),
            catalog: "https://valorant-api.com/v1".to_owned()
        }
    }

    pub fn core_game_player(&self, puuid: &str) -> String {
        format!("{}/core-game/v1/players/{puuid}", self.glz)
    }

    pub fn core_game_match(&self, match_id: &str) -> String {
        format!("{}/core-game/v1/matches/{match_id}", self.glz)
    }

    pub fn core_game_loadouts(&self, match_id: &str) -> String {
        format!("{}/core-game/v1/matches/{match_id}/loadouts", self.glz)
    }

    pub fn pregame_player(&self, puuid: &str) -> String {
        format!("{}/pregame/v1/players/{puuid}", self.glz)
    }

    pub fn pregame_match(&self, match_id: &str) -> String {
        format!("{}/pregame/v1/matches/{match_id}", self.glz)
    }

    pub fn pregame_loadouts(&self, match_id: &str) -> String {
        format!("{}/pregame/v1/matches/{match_id}/loadouts", self.glz)
    }

    pub fn pregame_quit(&self, match_id: &str) -> String {
        format!("{}/pregame/v1/matches/{match_id}/quit", self.glz)
    }

    pub fn pregame_select(&self, match_id: &str, agent_id: &str) -> String {
        format!("{}/pregame/v1/matches/{match_id}/select/{agent_id}", self.glz)
    }

    pub fn pregame_lock(&self, match_id: &str, agent_id: &str) -> String {
        format!("{}/pregame/v1/matches/{match_id}/lock/{agent_id}", self.glz)
    }

    pub fn party_player(&self, puuid: &str) -> String {
        format!("{}/parties/v1/players/{puuid}", self.glz)
    }

    pub fn party(&self, party_id: &str) -> String {
        format!("{}/parties/v1/parties/{party_id}", self.glz)
    }

    pub fn mmr(&self, puuid: &str) -> String {
        format!("{}/mmr/v1/players/{puuid}", self.pd)
    }

    /// `competitive_only` restricts the history to the competitive queue.
    pub fn match_history(&self, puuid: &str, start: usize, end: usize, competitive_only: bool) -> String {
        let queue = if competitive_only { "&queue=competitive" } else { "" };
        format!(
            "{}/match-history/v1/history/{puuid}?startIndex={start}&endIndex={end}{queue}",
            self.pd
        )
    }

    pub fn match_details(&self, match_id: &str) -> String {
        format!("{}/match-details/v1/matches/{match_id}", self.pd)
    }

    pub fn name_service(&self) -> String {
        format!("{}/name-service/v2/players", self.pd)
    }

    pub fn catalog_resource(&self, name: &str) -> String {
        format!("{}/{name}", self.catalog)
    }
}
