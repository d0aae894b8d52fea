use indexmap::IndexMap;
use serde::Serialize;

use super::{structures::competitive_tier::normalize_tier_label, PlayerId};
use crate::utils::display::truncate;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankSnapshot {
    pub current_tier: String,
    pub current_rr: i32,
    pub peak_tier: String,
    pub peak_season: String
}

impl RankSnapshot {
    pub fn unranked() -> Self {
        RankSnapshot {
            current_tier: "Unranked".to_owned(),
            current_rr: 0,
            peak_tier: NOT_AVAILABLE.to_owned(),
            peak_season: NOT_AVAILABLE.to_owned()
        }
    }

    /// Sentinel tiers ("Unset", "Unrated") become "Unranked". Idempotent.
    pub fn normalized(mut self) -> Self {
        self.current_tier = normalize_tier_label(&self.current_tier);
        self.peak_tier = normalize_tier_label(&self.peak_tier);
        self
    }
}

impl Default for RankSnapshot {
    fn default() -> Self {
        RankSnapshot::unranked()
    }
}

/// Derived from every match currently loaded for a player. A `None` field
/// means no loaded match supplied the inputs for it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregateStats {
    pub matches_counted: usize,
    pub win_rate: Option<u32>,
    pub avg_combat_score: Option<f64>,
    pub kill_death_ratio: Option<f64>,
    pub headshot_rate: Option<f64>
}

impl AggregateStats {
    pub fn win_rate_display(&self) -> String {
        self.win_rate
            .map(|rate| format!("{rate}%"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }

    pub fn acs_display(&self) -> String {
        display_or_na(self.avg_combat_score, 5)
    }

    pub fn kd_display(&self) -> String {
        display_or_na(self.kill_death_ratio, 4)
    }

    pub fn headshot_display(&self) -> String {
        display_or_na(self.headshot_rate, 4)
    }
}

fn display_or_na(value: Option<f64>, width: usize) -> String {
    value
        .map(|v| truncate(v, width))
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

/// Everything the view shows for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub puuid: PlayerId,
    /// `GameName#TagLine`, or "Unknown" when no source resolved it.
    pub name: String,
    pub level: Option<u32>,
    pub agent: Option<String>,
    pub team: Option<String>,
    pub rank: RankSnapshot,
    pub stats: AggregateStats,
    /// Weapon display name to skin display name, in slot order.
    pub loadout: Option<IndexMap<String, String>>
}

impl PlayerSnapshot {
    pub fn new(puuid: impl Into<PlayerId>) -> Self {
        PlayerSnapshot {
            puuid: puuid.into(),
            name: "Unknown".to_owned(),
            level: None,
            agent: None,
            team: None,
            rank: RankSnapshot::unranked(),
            stats: AggregateStats::default(),
            loadout: None
        }
    }

    pub fn level_display(&self) -> String {
        self.level
            .map(|l| l.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }
}

/// The published snapshot, keyed by player in processing order.
pub type FrontendData = IndexMap<PlayerId, PlayerSnapshot>;
