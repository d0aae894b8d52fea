use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Local client API

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementsResponse {
    pub access_token: String,
    /// Entitlement JWT
    pub token: String,
    /// PUUID of the signed-in player
    pub subject: String
}

// Regional (glz) services

#[derive(Debug, Deserialize)]
pub struct MatchPointer {
    #[serde(rename = "MatchID")]
    pub match_id: String
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PlayerIdentity {
    #[serde(rename = "AccountLevel", default)]
    pub account_level: Option<u32>
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreGamePlayer {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "TeamID", default)]
    pub team_id: Option<String>,
    #[serde(rename = "CharacterID", default)]
    pub character_id: Option<String>,
    #[serde(rename = "PlayerIdentity", default)]
    pub identity: PlayerIdentity
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreGameMatch {
    #[serde(rename = "MatchID")]
    pub match_id: String,
    #[serde(rename = "ModeID", default)]
    pub mode_id: String,
    #[serde(rename = "GamePodID", default)]
    pub game_pod_id: String,
    #[serde(rename = "Players", default)]
    pub players: Vec<CoreGamePlayer>
}

#[derive(Debug, Clone, Deserialize)]
pub struct PregamePlayer {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "CharacterID", default)]
    pub character_id: Option<String>,
    #[serde(rename = "PlayerIdentity", default)]
    pub identity: PlayerIdentity
}

#[derive(Debug, Clone, Deserialize)]
pub struct PregameTeam {
    #[serde(rename = "TeamID")]
    pub team_id: String,
    #[serde(rename = "Players", default)]
    pub players: Vec<PregamePlayer>
}

#[derive(Debug, Clone, Deserialize)]
pub struct PregameMatch {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Mode", default)]
    pub mode: String,
    #[serde(rename = "GamePodID", default)]
    pub game_pod_id: String,
    #[serde(rename = "IsRanked", default, deserialize_with = "deserialize_flag")]
    pub is_ranked: Option<bool>,
    #[serde(rename = "AllyTeam", default)]
    pub ally_team: Option<PregameTeam>
}

#[derive(Debug, Deserialize)]
pub struct PartyPlayer {
    #[serde(rename = "CurrentPartyID")]
    pub current_party_id: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartyMember {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "CompetitiveTier", default)]
    pub competitive_tier: Option<u32>,
    #[serde(rename = "PlayerIdentity", default)]
    pub identity: PlayerIdentity
}

#[derive(Debug, Deserialize)]
pub struct Party {
    #[serde(rename = "Members", default)]
    pub members: Vec<PartyMember>
}

#[derive(Debug, Deserialize)]
pub struct LoadoutSocketItem {
    #[serde(rename = "ID")]
    pub id: String
}

#[derive(Debug, Deserialize)]
pub struct LoadoutSocket {
    #[serde(rename = "Item")]
    pub item: LoadoutSocketItem
}

#[derive(Debug, Deserialize)]
pub struct LoadoutItem {
    #[serde(rename = "Sockets", default)]
    pub sockets: HashMap<String, LoadoutSocket>
}

#[derive(Debug, Deserialize)]
pub struct PlayerLoadout {
    #[serde(rename = "Subject")]
    pub subject: String,
    /// Keyed by weapon id
    #[serde(rename = "Items", default)]
    pub items: IndexMap<String, LoadoutItem>
}

/// In-game loadouts wrap each player's loadout one level deeper than
/// pre-game loadouts do.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LoadoutEntry {
    CoreGame {
        #[serde(rename = "Loadout")]
        loadout: PlayerLoadout
    },
    Pregame(PlayerLoadout)
}

impl LoadoutEntry {
    pub fn loadout(&self) -> &PlayerLoadout {
        match self {
            LoadoutEntry::CoreGame { loadout } => loadout,
            LoadoutEntry::Pregame(loadout) => loadout
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MatchLoadouts {
    #[serde(rename = "Loadouts", default)]
    pub loadouts: Vec<LoadoutEntry>
}

// Player data (pd) services

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NameEntry {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "GameName", default)]
    pub game_name: String,
    #[serde(rename = "TagLine", default)]
    pub tag_line: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompetitiveUpdate {
    #[serde(rename = "TierAfterUpdate", default)]
    pub tier_after_update: u32,
    #[serde(rename = "RankedRatingAfterUpdate", default)]
    pub ranked_rating_after_update: i32
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SeasonalInfo {
    #[serde(rename = "WinsByTier", default)]
    pub wins_by_tier: Option<HashMap<String, u32>>
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueueSkill {
    #[serde(rename = "SeasonalInfoBySeasonID", default)]
    pub seasonal_info_by_season_id: Option<HashMap<String, SeasonalInfo>>
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueueSkills {
    #[serde(default)]
    pub competitive: Option<QueueSkill>
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MmrResponse {
    #[serde(rename = "LatestCompetitiveUpdate", default)]
    pub latest_competitive_update: Option<CompetitiveUpdate>,
    #[serde(rename = "QueueSkills", default)]
    pub queue_skills: QueueSkills
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "MatchID")]
    pub match_id: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchHistory {
    #[serde(rename = "Total", default)]
    pub total: usize,
    #[serde(rename = "History", default)]
    pub history: Vec<HistoryEntry>
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchStats {
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub rounds_played: u32,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPlayer {
    pub subject: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub tag_line: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub account_level: Option<u32>,
    #[serde(default)]
    pub stats: Option<PlayerMatchStats>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTeam {
    pub team_id: String,
    #[serde(default)]
    pub won: Option<bool>
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct DamageEntry {
    #[serde(default)]
    pub legshots: u32,
    #[serde(default)]
    pub bodyshots: u32,
    #[serde(default)]
    pub headshots: u32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundPlayerStats {
    pub subject: String,
    #[serde(default)]
    pub damage: Option<Vec<DamageEntry>>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    #[serde(default)]
    pub player_stats: Option<Vec<RoundPlayerStats>>
}

/// A full match-detail document. Only the fields the stat derivation reads
/// are modelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    #[serde(default)]
    pub players: Vec<MatchPlayer>,
    #[serde(default)]
    pub teams: Vec<MatchTeam>,
    #[serde(default)]
    pub round_results: Option<Vec<RoundResult>>
}

impl MatchDetails {
    pub fn player(&self, puuid: &str) -> Option<&MatchPlayer> {
        self.players.iter().find(|p| p.subject == puuid)
    }
}

// Static catalog (valorant-api.com)

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse<T> {
    pub data: T
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAgent {
    pub uuid: String,
    pub display_name: String,
    #[serde(default)]
    pub is_playable_character: bool
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogChroma {
    pub uuid: String,
    #[serde(default)]
    pub display_name: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSkin {
    pub uuid: String,
    pub display_name: String,
    #[serde(default)]
    pub chromas: Vec<CatalogChroma>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogWeapon {
    pub uuid: String,
    pub display_name: String,
    #[serde(default)]
    pub skins: Vec<CatalogSkin>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeason {
    pub uuid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub season_type: Option<String>,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    #[serde(default)]
    pub asset_path: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVersion {
    pub riot_client_version: String
}

/// Ranked flags arrive as either booleans or 0/1 depending on the endpoint
/// revision.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        _ => None
    })
}
