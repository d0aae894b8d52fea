use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{
    api::{
        api_structs::{CoreGameMatch, MatchPointer, Party, PartyPlayer, PregameMatch},
        fetch_json, ApiRequest, AuthHeaders, Endpoints, FetchError, RiotCredentials, Transport
    },
    model::{structures::phase::Phase, MatchContext, PlayerId, RosterEntry}
};

/// A detected context together with the headers it was detected with.
#[derive(Debug, Clone)]
pub struct Detection {
    pub context: MatchContext,
    pub headers: AuthHeaders
}

/// Works out where the local player is. Checked in order in-game, pre-game,
/// party; a failed call just means "not in that phase".
pub struct MatchDetector<R> {
    transport: R,
    endpoints: Endpoints
}

impl<R: Transport> MatchDetector<R> {
    pub fn new(transport: R, endpoints: Endpoints) -> Self {
        MatchDetector { transport, endpoints }
    }

    pub async fn detect(&self, credentials: &RiotCredentials) -> Detection {
        let headers = AuthHeaders::new(credentials);
        let puuid = credentials.puuid.as_str();

        let context = if let Some(core) = self.core_game(puuid, &headers).await {
            in_game_context(puuid, core)
        } else if let Some(pregame) = self.pregame(puuid, &headers).await {
            pregame_context(puuid, pregame)
        } else if let Some(party) = self.party(puuid, &headers).await {
            party_context(puuid, party)
        } else {
            MatchContext::lobby(puuid)
        };

        info!(
            phase = %context.phase,
            match_id = ?context.match_id,
            players = context.roster.len(),
            "match detected"
        );
        Detection { context, headers }
    }

    async fn core_game(&self, puuid: &str, headers: &AuthHeaders) -> Option<CoreGameMatch> {
        let pointer: MatchPointer = self.lookup("core-game player", self.endpoints.core_game_player(puuid), headers).await?;
        self.lookup("core-game match", self.endpoints.core_game_match(&pointer.match_id), headers)
            .await
    }

    async fn pregame(&self, puuid: &str, headers: &AuthHeaders) -> Option<PregameMatch> {
        let pointer: MatchPointer = self.lookup("pre-game player", self.endpoints.pregame_player(puuid), headers).await?;
        self.lookup("pre-game match", self.endpoints.pregame_match(&pointer.match_id), headers)
            .await
    }

    async fn party(&self, puuid: &str, headers: &AuthHeaders) -> Option<Party> {
        let player: PartyPlayer = self.lookup("party player", self.endpoints.party_player(puuid), headers).await?;
        self.lookup("party", self.endpoints.party(&player.current_party_id), headers)
            .await
    }

    async fn lookup<T: DeserializeOwned>(&self, what: &str, url: String, headers: &AuthHeaders) -> Option<T> {
        match fetch_json(&self.transport, ApiRequest::get(url).auth(headers)).await {
            Ok(value) => Some(value),
            Err(FetchError::Absent { status }) => {
                debug!(status, "no {what}");
                None
            }
            Err(e) => {
                warn!(error = %e, "{what} lookup failed");
                None
            }
        }
    }
}

fn in_game_context(puuid: &str, core: CoreGameMatch) -> MatchContext {
    let roster: IndexMap<PlayerId, RosterEntry> = core
        .players
        .into_iter()
        .map(|player| {
            let entry = RosterEntry {
                team_id: player.team_id,
                character_id: player.character_id,
                account_level: player.identity.account_level,
                competitive_tier: None
            };
            (player.subject, entry)
        })
        .collect();
    let ally_team_id = roster.get(puuid).and_then(|entry| entry.team_id.clone());

    MatchContext {
        match_id: Some(core.match_id),
        phase: Phase::InGame,
        local_player: puuid.to_owned(),
        roster,
        ally_team_id,
        mode_id: Some(core.mode_id),
        game_pod_id: Some(core.game_pod_id),
        is_ranked: None
    }
}

fn pregame_context(puuid: &str, pregame: PregameMatch) -> MatchContext {
    let (ally_team_id, players) = match pregame.ally_team {
        Some(team) => (Some(team.team_id), team.players),
        None => (None, Vec::new())
    };
    let roster = players
        .into_iter()
        .map(|player| {
            let entry = RosterEntry {
                team_id: ally_team_id.clone(),
                character_id: player.character_id,
                account_level: player.identity.account_level,
                competitive_tier: None
            };
            (player.subject, entry)
        })
        .collect();

    MatchContext {
        match_id: Some(pregame.id),
        phase: Phase::PreGame,
        local_player: puuid.to_owned(),
        roster,
        ally_team_id,
        mode_id: Some(pregame.mode),
        game_pod_id: Some(pregame.game_pod_id),
        is_ranked: pregame.is_ranked
    }
}

fn party_context(puuid: &str, party: Party) -> MatchContext {
    let roster = party
        .members
        .into_iter()
        .map(|member| {
            let entry = RosterEntry {
                team_id: None,
                character_id: None,
                account_level: member.identity.account_level,
                competitive_tier: member.competitive_tier
            };
            (member.subject, entry)
        })
        .collect();

    MatchContext {
        roster,
        ..MatchContext::lobby(puuid)
    }
}
