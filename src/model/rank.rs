use itertools::Itertools;

use crate::{api::api_structs::MmrResponse, catalog::Catalog};

use super::{
    snapshot::{RankSnapshot, NOT_AVAILABLE},
    structures::competitive_tier::CompetitiveTier
};

/// Current and peak rank from an MMR document.
pub fn rank_from_mmr(mmr: &MmrResponse, catalog: &Catalog) -> RankSnapshot {
    let Some(update) = &mmr.latest_competitive_update else {
        return RankSnapshot::unranked();
    };
    let current_tier = CompetitiveTier::label(update.tier_after_update);
    let current_rr = update.ranked_rating_after_update;

    let (peak_tier, peak_season) = match peak(mmr) {
        Some((code, season_id)) => {
            let season = catalog.season(season_id);
            let code = match season {
                Some(label) if label.uses_legacy_ladder() => CompetitiveTier::from_legacy_episode(code),
                _ => code
            };
            let season = season
                .map(|label| label.to_string().to_uppercase())
                .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

            (CompetitiveTier::label(code), season)
        }
        None => (NOT_AVAILABLE.to_owned(), NOT_AVAILABLE.to_owned())
    };

    RankSnapshot {
        current_tier,
        current_rr,
        peak_tier,
        peak_season
    }
    .normalized()
}

/// Highest tier with at least one win, and the season it was reached in.
/// Seasons are scanned in id order so ties resolve the same way every time.
fn peak(mmr: &MmrResponse) -> Option<(u32, &str)> {
    let seasons = mmr
        .queue_skills
        .competitive
        .as_ref()?
        .seasonal_info_by_season_id
        .as_ref()?;

    let mut best: Option<(u32, &str)> = None;
    for (season_id, info) in seasons.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        let tiers = info
            .wins_by_tier
            .iter()
            .flatten()
            .filter(|(_, wins)| **wins > 0)
            .filter_map(|(tier, _)| tier.parse::<u32>().ok());

        for tier in tiers {
            if tier > 0 && best.map_or(true, |(code, _)| tier > code) {
                best = Some((tier, season_id.as_str()));
            }
        }
    }

    best
}
