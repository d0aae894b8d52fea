use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration
};

use futures::{stream::FuturesUnordered, StreamExt};
use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    api::{
        api_structs::{MatchDetails, MatchHistory, MatchLoadouts, MmrResponse, NameEntry, PlayerLoadout},
        batch::{fetch_all, fetch_with_retry, DEFAULT_MAX_ATTEMPTS},
        fetch_json, ApiRequest, AuthHeaders, Endpoints, FetchError, Transport
    },
    catalog::Catalog
};

use super::{
    context::MatchContext,
    observer::SnapshotObserver,
    rank::rank_from_mmr,
    session::{MatchHistoryWindow, MatchSession, SessionState},
    snapshot::{FrontendData, PlayerSnapshot, RankSnapshot, NOT_AVAILABLE},
    stats::{self, Identity},
    structures::{competitive_tier::CompetitiveTier, phase::Phase},
    PlayerId
};

/// Loadout socket holding the equipped chroma; chroma ids resolve to skins.
const CHROMA_SOCKET: &str = "3ad1b2b2-acdb-4524-852f-954a76ddae0a";

const WEAPON_SLOTS: [&str; 19] = [
    "Classic", "Shorty", "Frenzy", "Ghost", "Sheriff", "Stinger", "Spectre", "Bucky", "Judge", "Bulldog", "Guardian",
    "Phantom", "Vandal", "Marshal", "Outlaw", "Operator", "Ares", "Odin", "Knife"
];

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("A refresh or load-more is already in progress")]
    Busy
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Competitive matches fetched per player on first sight.
    pub initial_window: usize,
    /// Matches added per player by each `load_more`.
    pub page_size: usize,
    /// Pause after each published update.
    pub update_interval: Duration,
    pub max_attempts: u32
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            initial_window: 5,
            page_size: 10,
            update_interval: Duration::from_millis(50),
            max_attempts: DEFAULT_MAX_ATTEMPTS
        }
    }
}

/// Result of one player's pipeline, merged into the session by the caller.
struct PlayerOutcome {
    rank: RankSnapshot,
    window: MatchHistoryWindow,
    snapshot: PlayerSnapshot
}

/// One page of additional history for a player.
struct Page {
    puuid: PlayerId,
    end: usize,
    total: usize,
    matches: Vec<MatchDetails>
}

/// Builds and owns the published snapshot for the current match.
pub struct Aggregator<R> {
    transport: R,
    endpoints: Endpoints,
    catalog: Catalog,
    config: AggregatorConfig,
    headers: Mutex<AuthHeaders>,
    session: tokio::sync::Mutex<MatchSession>
}

impl<R: Transport> Aggregator<R> {
    pub fn new(transport: R, endpoints: Endpoints, catalog: Catalog, headers: AuthHeaders, config: AggregatorConfig) -> Self {
        Aggregator {
            transport,
            endpoints,
            catalog,
            config,
            headers: Mutex::new(headers),
            session: tokio::sync::Mutex::new(MatchSession::default())
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replaces the header bundle used from the next refresh on.
    pub fn set_headers(&self, headers: AuthHeaders) {
        *self.headers.lock().unwrap_or_else(PoisonError::into_inner) = headers;
    }

    fn headers(&self) -> AuthHeaders {
        self.headers.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Processes every roster player not seen yet in this match, publishing
    /// after each one, and returns the merged snapshot. A new match id
    /// discards everything accumulated for the previous match first.
    pub async fn refresh<O: SnapshotObserver>(&self, context: &MatchContext, observer: &O) -> Result<FrontendData, AggregatorError> {
        let mut session = self.session.try_lock().map_err(|_| AggregatorError::Busy)?;
        let headers = self.headers();

        if session.match_id != context.match_id || context.phase == Phase::Lobby {
            if session.match_id != context.match_id {
                info!(from = ?session.match_id, to = ?context.match_id, "match changed, resetting session");
            }
            *session = MatchSession::new(context.match_id.clone());
        }
        session.transition(SessionState::ContextKnown);

        if context.phase == Phase::Lobby {
            self.load_lobby(&mut session, context, &headers, observer).await;
            session.transition(SessionState::Settled);
            return Ok(session.frontend.clone());
        }
        session.transition(SessionState::RosterDiscovered);

        let mut pending: FuturesUnordered<_> = context
            .roster_ids()
            .filter(|puuid| !session.is_processed(puuid))
            .map(|puuid| {
                let headers = &headers;
                async move { (puuid, self.process_player(puuid, context, headers).await) }
            })
            .collect();
        if !pending.is_empty() {
            session.transition(SessionState::Processing);
        }

        while let Some((puuid, outcome)) = pending.next().await {
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(puuid = %puuid, error = %e, "player lookup failed, retrying on next refresh");
                    continue;
                }
            };
            debug!(puuid = %puuid, matches = outcome.window.matches.len(), "player processed");
            session.ranks.insert(puuid.clone(), outcome.rank);
            session.windows.insert(puuid.clone(), outcome.window);
            session.frontend.insert(puuid.clone(), outcome.snapshot);
            session.processed.insert(puuid.clone());

            observer.publish(&session.frontend);
            sleep(self.config.update_interval).await;
        }
        let all_processed = context.roster_ids().all(|puuid| session.is_processed(puuid));
        if all_processed && session.loadouts_phase != Some(context.phase) {
            self.assign_loadouts(&mut session, context, &headers).await;
        }

        self.apply_roster_labels(&mut session, context);
        observer.publish(&session.frontend);
        session.transition(SessionState::Settled);

        Ok(session.frontend.clone())
    }

    /// Extends every processed player's history by one page and recomputes
    /// their stats. Players with nothing left to load are untouched.
    pub async fn load_more<O: SnapshotObserver>(&self, observer: &O) -> Result<FrontendData, AggregatorError> {
        let mut session = self.session.try_lock().map_err(|_| AggregatorError::Busy)?;
        let headers = self.headers();

        let candidates = session
            .processed
            .iter()
            .filter_map(|puuid| {
                let window = session.windows.get(puuid)?;
                (!window.exhausted()).then(|| (puuid.clone(), window.high_water_mark))
            })
            .collect_vec();
        if candidates.is_empty() {
            debug!("every history window is exhausted");
            return Ok(session.frontend.clone());
        }
        session.transition(SessionState::Processing);

        let mut pending: FuturesUnordered<_> = candidates
            .into_iter()
            .map(|(puuid, start)| self.fetch_page(puuid, start, &headers))
            .collect();

        while let Some(page) = pending.next().await {
            let Some(page) = page else { continue };
            let Some(window) = session.windows.get_mut(&page.puuid) else {
                continue;
            };

            window.extend(page.end, page.total, page.matches);
            let updated = stats::aggregate(&page.puuid, &window.matches);
            debug!(puuid = %page.puuid, high_water_mark = window.high_water_mark, "history extended");

            if let Some(snapshot) = session.frontend.get_mut(&page.puuid) {
                snapshot.stats = updated;
            }
            observer.publish(&session.frontend);
            sleep(self.config.update_interval).await;
        }
        session.transition(SessionState::Settled);
        Ok(session.frontend.clone())
    }

    /// Fails only on a transient error, leaving the player to be retried by
    /// the next refresh. Absence yields placeholders.
    async fn process_player(
        &self,
        puuid: &PlayerId,
        context: &MatchContext,
        headers: &AuthHeaders
    ) -> Result<PlayerOutcome, FetchError> {
        let roster_level = context.roster.get(puuid).and_then(|entry| entry.account_level);
        let rank = self.resolve_rank(puuid, headers).await?;

        let mut snapshot = PlayerSnapshot::new(puuid.clone());
        snapshot.team = context.team_label(puuid);
        snapshot.rank = rank.clone();
        snapshot.level = roster_level;

        let end = self.config.initial_window;
        let history = self.history(puuid, 0, end, true, headers).await?;
        let Some(history) = history.filter(|h| h.total > 0) else {
            let identity = self.fallback_identity(puuid, headers).await?;
            apply_identity(&mut snapshot, identity);
            return Ok(PlayerOutcome {
                rank,
                window: MatchHistoryWindow::default(),
                snapshot
            });
        };

        let matches = self
            .fetch_details(history.history.iter().map(|entry| entry.match_id.as_str()), headers)
            .await;

        let mut window = MatchHistoryWindow::default();
        window.extend(end, history.total, matches);
        snapshot.stats = stats::aggregate(puuid, &window.matches);

        let identity = match stats::identity(puuid, &window.matches) {
            Some(identity) => Some(identity),
            None => self.lookup_name(puuid, headers).await
        };
        apply_identity(&mut snapshot, identity);

        Ok(PlayerOutcome { rank, window, snapshot })
    }

    async fn resolve_rank(&self, puuid: &str, headers: &AuthHeaders) -> Result<RankSnapshot, FetchError> {
        let headers = match self.catalog.riot_client_version() {
            Some(version) => headers.with_client_version(version),
            None => headers.clone()
        };
        let fetched =
            fetch_with_retry::<MmrResponse, R>(&self.transport, &self.endpoints.mmr(puuid), &headers, self.config.max_attempts)
                .await;

        Ok(match absent_as_none("rank", puuid, fetched)? {
            Some(mmr) => rank_from_mmr(&mmr, &self.catalog),
            None => RankSnapshot::unranked()
        })
    }

    async fn history(
        &self,
        puuid: &str,
        start: usize,
        end: usize,
        competitive_only: bool,
        headers: &AuthHeaders
    ) -> Result<Option<MatchHistory>, FetchError> {
        let url = self.endpoints.match_history(puuid, start, end, competitive_only);
        let fetched = fetch_with_retry::<MatchHistory, R>(&self.transport, &url, headers, self.config.max_attempts).await;

        absent_as_none("match history", puuid, fetched)
    }

    async fn fetch_details<'a>(&self, match_ids: impl Iterator<Item = &'a str>, headers: &AuthHeaders) -> Vec<MatchDetails> {
        let urls = match_ids.map(|id| self.endpoints.match_details(id)).collect_vec();

        fetch_all::<MatchDetails, R>(&self.transport, &urls, headers, self.config.max_attempts)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn fetch_page(&self, puuid: PlayerId, start: usize, headers: &AuthHeaders) -> Option<Page> {
        let end = start + self.config.page_size;
        let history = match self.history(&puuid, start, end, true, headers).await {
            Ok(Some(history)) if history.total > 0 => history,
            Ok(_) => return None,
            Err(e) => {
                warn!(puuid = %puuid, error = %e, "history page failed, window unchanged");
                return None;
            }
        };

        let matches = self
            .fetch_details(history.history.iter().map(|entry| entry.match_id.as_str()), headers)
            .await;

        Some(Page {
            puuid,
            end,
            total: history.total,
            matches
        })
    }

    /// A player without competitive history: identity comes from their most
    /// recent match in any queue, or from the name service.
    async fn fallback_identity(&self, puuid: &PlayerId, headers: &AuthHeaders) -> Result<Option<Identity>, FetchError> {
        let latest = self
            .history(puuid, 0, 1, false, headers)
            .await?
            .filter(|history| history.total > 0)
            .and_then(|history| history.history.into_iter().next());

        if let Some(entry) = latest {
            let matches = self.fetch_details(std::iter::once(entry.match_id.as_str()), headers).await;
            if let Some(identity) = stats::identity(puuid, &matches) {
                return Ok(Some(identity));
            }
        }

        Ok(self.lookup_name(puuid, headers).await)
    }

    async fn lookup_name(&self, puuid: &PlayerId, headers: &AuthHeaders) -> Option<Identity> {
        self.lookup_names(std::slice::from_ref(puuid), headers)
            .await
            .remove(puuid)
            .map(|name| Identity { name, level: None })
    }

    async fn lookup_names(&self, puuids: &[PlayerId], headers: &AuthHeaders) -> HashMap<PlayerId, String> {
        let request = match ApiRequest::put_json(self.endpoints.name_service(), &puuids) {
            Ok(request) => request.auth(headers),
            Err(e) => {
                warn!(error = %e, "failed to encode name lookup");
                return HashMap::new();
            }
        };

        match fetch_json::<Vec<NameEntry>, R>(&self.transport, request).await {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| (entry.subject, format!("{}#{}", entry.game_name, entry.tag_line)))
                .collect(),
            Err(e) => {
                warn!(players = puuids.len(), error = %e, "name lookup failed");
                HashMap::new()
            }
        }
    }

    /// Outside a match only names and party ranks are shown.
    async fn load_lobby<O: SnapshotObserver>(
        &self,
        session: &mut MatchSession,
        context: &MatchContext,
        headers: &AuthHeaders,
        observer: &O
    ) {
        let members = if context.roster.is_empty() {
            vec![context.local_player.clone()]
        } else {
            context.roster_ids().cloned().collect_vec()
        };
        let mut names = self.lookup_names(&members, headers).await;

        for puuid in members {
            let entry = context.roster.get(&puuid);
            let mut snapshot = PlayerSnapshot::new(puuid.clone());
            snapshot.team = Some("Red".to_owned());
            snapshot.level = entry.and_then(|e| e.account_level);
            if let Some(name) = names.remove(&puuid) {
                snapshot.name = name;
            }
            snapshot.rank = RankSnapshot {
                current_tier: entry
                    .and_then(|e| e.competitive_tier)
                    .map(CompetitiveTier::label)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
                ..RankSnapshot::unranked()
            }
            .normalized();

            session.frontend.insert(puuid.clone(), snapshot);
            session.processed.insert(puuid);
            observer.publish(&session.frontend);
        }
    }

    async fn assign_loadouts(&self, session: &mut MatchSession, context: &MatchContext, headers: &AuthHeaders) {
        let Some(match_id) = context.match_id.as_deref() else {
            return;
        };
        let url = match context.phase {
            Phase::InGame => self.endpoints.core_game_loadouts(match_id),
            Phase::PreGame => self.endpoints.pregame_loadouts(match_id),
            Phase::Lobby => return
        };

        match fetch_json::<MatchLoadouts, R>(&self.transport, ApiRequest::get(url).auth(headers)).await {
            Ok(loadouts) => {
                for entry in &loadouts.loadouts {
                    let loadout = entry.loadout();
                    if let Some(snapshot) = session.frontend.get_mut(&loadout.subject) {
                        snapshot.loadout = Some(resolve_loadout(loadout, &self.catalog));
                    }
                }
                session.loadouts_phase = Some(context.phase);
                info!(match_id, players = loadouts.loadouts.len(), "loadouts assigned");
            }
            Err(e) => warn!(match_id, error = %e, "loadouts unavailable")
        }
    }

    /// Agent names and team labels come from the live roster and are applied
    /// after all numeric work.
    fn apply_roster_labels(&self, session: &mut MatchSession, context: &MatchContext) {
        for (puuid, snapshot) in session.frontend.iter_mut() {
            if let Some(team) = context.team_label(puuid) {
                snapshot.team = Some(team);
            }

            let agent_id = context
                .roster
                .get(puuid)
                .and_then(|entry| entry.character_id.as_deref())
                .filter(|id| !id.is_empty());
            if let Some(agent_id) = agent_id {
                snapshot.agent = Some(self.catalog.agent_name(agent_id).unwrap_or("Unknown").to_owned());
            }
        }
    }
}

fn apply_identity(snapshot: &mut PlayerSnapshot, identity: Option<Identity>) {
    if let Some(identity) = identity {
        snapshot.name = identity.name;
        snapshot.level = identity.level.or(snapshot.level);
    }
}

/// Absence and malformed payloads become `None`; transient failures are
/// handed back to the caller.
fn absent_as_none<T>(what: &str, puuid: &str, result: Result<T, FetchError>) -> Result<Option<T>, FetchError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_transient() => Err(e),
        Err(e) => {
            log_failure(what, puuid, &e);
            Ok(None)
        }
    }
}

fn log_failure(what: &str, puuid: &str, error: &FetchError) {
    if error.is_absence() {
        debug!(puuid, error = %error, "no {what} data");
    } else {
        warn!(puuid, error = %error, "failed to fetch {what}");
    }
}

/// Weapon name to skin name, in slot order. Weapons outside the known slots
/// follow in payload order.
fn resolve_loadout(loadout: &PlayerLoadout, catalog: &Catalog) -> IndexMap<String, String> {
    loadout
        .items
        .iter()
        .filter_map(|(weapon_id, item)| {
            let weapon = match catalog.weapon_name(weapon_id)? {
                "Melee" => "Knife",
                name => name
            };
            let skin = item
                .sockets
                .get(CHROMA_SOCKET)
                .and_then(|socket| catalog.skin_name(&socket.item.id))
                .unwrap_or("Unknown");
            Some((weapon.to_owned(), skin.to_owned()))
        })
        .sorted_by_key(|(weapon, _)| {
            WEAPON_SLOTS
                .iter()
                .position(|slot| *slot == weapon.as_str())
                .unwrap_or(WEAPON_SLOTS.len())
        })
        .collect()
}
