use crate::api::api_structs::{MatchDetails, MatchPlayer};

use super::snapshot::AggregateStats;

/// Name and level as recorded in a match payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub level: Option<u32>
}

impl Identity {
    pub fn from_match_player(player: &MatchPlayer) -> Self {
        Identity {
            name: format!("{}#{}", player.game_name, player.tag_line),
            level: player.account_level
        }
    }
}

#[derive(Debug, Default)]
struct Totals {
    matches: usize,
    wins: u32,
    outcomes: u32,
    score: u64,
    rounds: u64,
    kills: u64,
    deaths: u64,
    headshots: u64,
    bodyshots: u64,
    legshots: u64
}

/// Recomputes a player's stats over every loaded match. Nothing carries over
/// between calls.
pub fn aggregate(puuid: &str, matches: &[MatchDetails]) -> AggregateStats {
    let mut totals = Totals::default();

    for details in matches {
        let Some(player) = details.player(puuid) else {
            continue;
        };
        totals.matches += 1;

        let won = player.team_id.as_deref().and_then(|team_id| {
            details
                .teams
                .iter()
                .find(|team| team.team_id == team_id)
                .and_then(|team| team.won)
        });
        if let Some(won) = won {
            totals.outcomes += 1;
            totals.wins += u32::from(won);
        }

        if let Some(stats) = player.stats {
            totals.score += u64::from(stats.score);
            totals.rounds += u64::from(stats.rounds_played);
            totals.kills += u64::from(stats.kills);
            totals.deaths += u64::from(stats.deaths);
        }

        let damage = details
            .round_results
            .iter()
            .flatten()
            .flat_map(|round| round.player_stats.iter().flatten())
            .filter(|round_stats| round_stats.subject == puuid)
            .flat_map(|round_stats| round_stats.damage.iter().flatten());
        for entry in damage {
            totals.headshots += u64::from(entry.headshots);
            totals.bodyshots += u64::from(entry.bodyshots);
            totals.legshots += u64::from(entry.legshots);
        }
    }

    totals.into_stats()
}

impl Totals {
    fn into_stats(self) -> AggregateStats {
        if self.matches == 0 {
            return AggregateStats::default();
        }

        let shots = self.headshots + self.bodyshots + self.legshots;
        AggregateStats {
            matches_counted: self.matches,
            win_rate: (self.outcomes > 0).then(|| self.wins * 100 / self.outcomes),
            avg_combat_score: (self.rounds > 0).then(|| self.score as f64 / self.rounds as f64),
            kill_death_ratio: Some(self.kills as f64 / self.deaths.max(1) as f64),
            headshot_rate: (shots > 0).then(|| (self.headshots * 100) as f64 / shots as f64)
        }
    }
}

/// Identity from the first loaded match that contains the player.
pub fn identity(puuid: &str, matches: &[MatchDetails]) -> Option<Identity> {
    matches
        .iter()
        .find_map(|details| details.player(puuid))
        .map(Identity::from_match_player)
}
