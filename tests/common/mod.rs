#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, Once},
    time::Duration
};

use bytes::Bytes;
use serde_json::{json, Value};
use valorank::api::{ApiRequest, AuthHeaders, Endpoints, HttpResponse, Method, Transport, TransportError};

static INIT: Once = Once::new();

/// Initialize test environment with RUST_LOG=WARN
pub fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("RUST_LOG", "warn");
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn endpoints() -> Endpoints {
    Endpoints::new("eu", "eu")
}

pub fn headers() -> AuthHeaders {
    AuthHeaders {
        access_token: "access".to_string(),
        entitlement_token: "entitlement".to_string(),
        client_version: "release-09.00".to_string()
    }
}

pub fn response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        retry_after: None,
        body: Bytes::from(body.to_string())
    }
}

pub fn rate_limited(retry_after: Duration) -> HttpResponse {
    HttpResponse {
        status: 429,
        retry_after: Some(retry_after),
        body: Bytes::new()
    }
}

#[derive(Default)]
struct Script {
    routes: HashMap<String, VecDeque<HttpResponse>>,
    requests: Vec<ApiRequest>
}

/// In-memory transport answering exact URLs with scripted responses. Queued
/// responses are served in order and the last one repeats; unknown URLs get
/// a 404.
#[derive(Clone, Default)]
pub struct FakeTransport {
    script: Arc<Mutex<Script>>
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: impl Into<String>, response: HttpResponse) -> &Self {
        self.script
            .lock()
            .unwrap()
            .routes
            .entry(url.into())
            .or_default()
            .push_back(response);
        self
    }

    pub fn ok(&self, url: impl Into<String>, body: Value) -> &Self {
        self.route(url, response(200, body))
    }

    /// Replaces everything scripted for `url`.
    pub fn reset(&self, url: &str) {
        self.script.lock().unwrap().routes.remove(url);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.url == url).count()
    }

    pub fn sent(&self, method: Method, url: &str) -> bool {
        self.requests().iter().any(|r| r.method == method && r.url == url)
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());

        let response = match script.routes.get_mut(&request.url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None
        };
        Ok(response.unwrap_or_else(response_404))
    }
}

fn response_404() -> HttpResponse {
    response(404, json!({ "errorCode": "RESOURCE_NOT_FOUND" }))
}

// Payload builders

pub fn mmr(tier: u32, rr: i32) -> Value {
    json!({
        "LatestCompetitiveUpdate": { "TierAfterUpdate": tier, "RankedRatingAfterUpdate": rr },
        "QueueSkills": { "competitive": { "SeasonalInfoBySeasonID": {} } }
    })
}

pub fn history(total: usize, match_ids: &[&str]) -> Value {
    let entries: Vec<Value> = match_ids.iter().map(|id| json!({ "MatchID": id })).collect();
    json!({ "Total": total, "History": entries })
}

/// One match where `puuid` played on Blue with the given line.
pub fn match_details(puuid: &str, won: bool, score: u32, rounds: u32, kills: u32, deaths: u32) -> Value {
    json!({
        "players": [{
            "subject": puuid,
            "gameName": format!("Player-{puuid}"),
            "tagLine": "EUW",
            "teamId": "Blue",
            "accountLevel": 77,
            "stats": { "score": score, "roundsPlayed": rounds, "kills": kills, "deaths": deaths }
        }],
        "teams": [
            { "teamId": "Blue", "won": won },
            { "teamId": "Red", "won": !won }
        ],
        "roundResults": [{
            "playerStats": [{
                "subject": puuid,
                "damage": [{ "legshots": 1, "bodyshots": 7, "headshots": 2 }]
            }]
        }]
    })
}

pub fn names(entries: &[(&str, &str, &str)]) -> Value {
    let entries: Vec<Value> = entries
        .iter()
        .map(|(subject, name, tag)| json!({ "Subject": subject, "GameName": name, "TagLine": tag }))
        .collect();
    Value::Array(entries)
}
