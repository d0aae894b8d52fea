use indexmap::IndexMap;

use super::{structures::phase::Phase, PlayerId};

/// What the live roster tells us about one player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterEntry {
    pub team_id: Option<String>,
    pub character_id: Option<String>,
    pub account_level: Option<u32>,
    pub competitive_tier: Option<u32>
}

/// The match (or lobby) the local player is currently in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchContext {
    pub match_id: Option<String>,
    pub phase: Phase,
    pub local_player: PlayerId,
    pub roster: IndexMap<PlayerId, RosterEntry>,
    pub ally_team_id: Option<String>,
    pub mode_id: Option<String>,
    pub game_pod_id: Option<String>,
    pub is_ranked: Option<bool>
}

// First match wins, so Quickbomb must precede Bomb.
const GAMEMODES: [(&str, &str); 5] = [
    ("swiftplay", "Swiftplay"),
    ("deathmatch", "Deathmatch"),
    ("hurm", "Team Deathmatch"),
    ("quickbomb", "Spike Rush"),
    ("bomb", "Competitive")
];

impl MatchContext {
    /// Lobby with nothing known beyond the local player.
    pub fn lobby(local_player: impl Into<PlayerId>) -> Self {
        MatchContext {
            local_player: local_player.into(),
            ..Default::default()
        }
    }

    pub fn roster_ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.roster.keys()
    }

    /// Live team label, taken from the roster rather than any historical match.
    pub fn team_label(&self, puuid: &str) -> Option<String> {
        self.roster
            .get(puuid)
            .and_then(|entry| entry.team_id.clone())
            .or_else(|| self.ally_team_id.clone())
    }

    /// `(gamemode, server)` for display.
    pub fn game_info(&self) -> (String, String) {
        (self.gamemode(), self.server())
    }

    fn gamemode(&self) -> String {
        let Some(mode_id) = &self.mode_id else {
            return "Unknown".to_owned();
        };
        let mode_id = mode_id.to_lowercase();

        let mode = GAMEMODES
            .iter()
            .find(|(needle, _)| mode_id.contains(needle))
            .map(|(_, name)| *name)
            .unwrap_or("Unknown");

        if mode == "Competitive" && self.phase == Phase::PreGame && self.is_ranked == Some(false) {
            return "Unrated".to_owned();
        }
        mode.to_owned()
    }

    fn server(&self) -> String {
        let Some(pod) = self.game_pod_id.as_deref() else {
            return "Unknown".to_owned();
        };

        // e.g. "aresriot.aws-rclusterprod-euc1-1.eu-gp-frankfurt-1"
        let segment = pod.rsplit('.').next().unwrap_or(pod);
        let segment = match segment.find("-gp-") {
            Some(idx) => &segment[idx + 4..],
            None => segment
        };
        let segment = match segment.rsplit_once('-') {
            Some((name, suffix)) if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) => name,
            _ => segment
        };

        if segment.is_empty() {
            return "Unknown".to_owned();
        }
        capitalize(segment)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new()
    }
}
