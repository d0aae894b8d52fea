use std::fmt::Write;

use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::model::{FrontendData, PlayerSnapshot};

const HEADER: [&str; 12] = ["Name", "Agent", "Lvl", "Games", "W/L", "ACS", "KD", "HS%", "Rank", "RR", "Peak", "Act"];
const WIDTHS: [usize; 12] = [24, 10, 4, 5, 5, 6, 5, 5, 12, 4, 12, 6];

/// Renders the snapshot as one table per team. Players without a team are
/// listed with the red side.
pub fn render(snapshot: &FrontendData, game_info: &(String, String), at: DateTime<Local>) -> String {
    let mut out = String::new();
    let (gamemode, server) = game_info;
    let _ = writeln!(out, "{gamemode} | {server} | updated {}", at.format("%H:%M:%S"));

    let (blue, red): (Vec<&PlayerSnapshot>, Vec<&PlayerSnapshot>) = snapshot
        .values()
        .partition(|player| player.team.as_deref() == Some("Blue"));

    for (label, players) in [("Red", red), ("Blue", blue)] {
        if players.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{label}");
        let _ = writeln!(out, "{}", row(HEADER.iter().map(|h| h.to_string())));
        for player in players {
            let _ = writeln!(out, "{}", row(columns(player)));
        }
    }

    out
}

fn columns(player: &PlayerSnapshot) -> impl Iterator<Item = String> {
    let stats = &player.stats;
    let rank = &player.rank;

    [
        player.name.clone(),
        player.agent.clone().unwrap_or_else(|| "-".to_owned()),
        player.level_display(),
        stats.matches_counted.to_string(),
        stats.win_rate_display(),
        stats.acs_display(),
        stats.kd_display(),
        stats.headshot_display(),
        rank.current_tier.clone(),
        rank.current_rr.to_string(),
        rank.peak_tier.clone(),
        rank.peak_season.clone()
    ]
    .into_iter()
}

fn row(cells: impl Iterator<Item = String>) -> String {
    cells
        .zip(WIDTHS)
        .map(|(cell, width)| format!("{:<width$}", clip(&cell, width)))
        .join(" ")
        .trim_end()
        .to_owned()
}

fn clip(cell: &str, width: usize) -> String {
    cell.chars().take(width).collect()
}

/// Skins for each player that has a loadout, one line per player.
pub fn render_loadouts(snapshot: &FrontendData) -> String {
    snapshot
        .values()
        .filter_map(|player| {
            let loadout = player.loadout.as_ref()?;
            let skins = loadout.iter().map(|(weapon, skin)| format!("{weapon}: {skin}")).join(", ");
            Some(format!("{}: {skins}", player.name))
        })
        .join("\n")
}
