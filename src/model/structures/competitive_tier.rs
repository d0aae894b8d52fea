use std::convert::TryFrom;
use strum_macros::{Display, EnumIter};

pub const UNRANKED: &str = "Unranked";

/// Ladder used since episode 5. Codes 1 and 2 are reserved and never
/// awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum CompetitiveTier {
    #[strum(serialize = "Unranked")]
    Unranked = 0,
    #[strum(serialize = "Unset")]
    Unused1 = 1,
    #[strum(serialize = "Unset")]
    Unused2 = 2,
    #[strum(serialize = "Iron 1")]
    Iron1 = 3,
    #[strum(serialize = "Iron 2")]
    Iron2 = 4,
    #[strum(serialize = "Iron 3")]
    Iron3 = 5,
    #[strum(serialize = "Bronze 1")]
    Bronze1 = 6,
    #[strum(serialize = "Bronze 2")]
    Bronze2 = 7,
    #[strum(serialize = "Bronze 3")]
    Bronze3 = 8,
    #[strum(serialize = "Silver 1")]
    Silver1 = 9,
    #[strum(serialize = "Silver 2")]
    Silver2 = 10,
    #[strum(serialize = "Silver 3")]
    Silver3 = 11,
    #[strum(serialize = "Gold 1")]
    Gold1 = 12,
    #[strum(serialize = "Gold 2")]
    Gold2 = 13,
    #[strum(serialize = "Gold 3")]
    Gold3 = 14,
    #[strum(serialize = "Platinum 1")]
    Platinum1 = 15,
    #[strum(serialize = "Platinum 2")]
    Platinum2 = 16,
    #[strum(serialize = "Platinum 3")]
    Platinum3 = 17,
    #[strum(serialize = "Diamond 1")]
    Diamond1 = 18,
    #[strum(serialize = "Diamond 2")]
    Diamond2 = 19,
    #[strum(serialize = "Diamond 3")]
    Diamond3 = 20,
    #[strum(serialize = "Ascendant 1")]
    Ascendant1 = 21,
    #[strum(serialize = "Ascendant 2")]
    Ascendant2 = 22,
    #[strum(serialize = "Ascendant 3")]
    Ascendant3 = 23,
    #[strum(serialize = "Immortal 1")]
    Immortal1 = 24,
    #[strum(serialize = "Immortal 2")]
    Immortal2 = 25,
    #[strum(serialize = "Immortal 3")]
    Immortal3 = 26,
    #[strum(serialize = "Radiant")]
    Radiant = 27
}

impl TryFrom<u32> for CompetitiveTier {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        use CompetitiveTier::*;

        const LADDER: [CompetitiveTier; 28] = [
            Unranked, Unused1, Unused2, Iron1, Iron2, Iron3, Bronze1, Bronze2, Bronze3, Silver1, Silver2, Silver3,
            Gold1, Gold2, Gold3, Platinum1, Platinum2, Platinum3, Diamond1, Diamond2, Diamond3, Ascendant1,
            Ascendant2, Ascendant3, Immortal1, Immortal2, Immortal3, Radiant
        ];

        LADDER.get(v as usize).copied().ok_or(())
    }
}

impl CompetitiveTier {
    /// Display label for a raw tier code; unknown codes read as "Unset".
    pub fn label(code: u32) -> String {
        CompetitiveTier::try_from(code)
            .map(|tier| tier.to_string())
            .unwrap_or_else(|_| "Unset".to_owned())
    }

    /// Episodes 1-4 had no Ascendant division, so their codes above Diamond 3
    /// sit three steps lower than today's ladder.
    pub fn from_legacy_episode(code: u32) -> u32 {
        if code > CompetitiveTier::Diamond3 as u32 {
            code + 3
        } else {
            code
        }
    }
}

/// "Unset" and "Unrated" are sentinels the services use for "no rank".
pub fn normalize_tier_label(label: &str) -> String {
    label.replace("Unset", UNRANKED).replace("Unrated", UNRANKED)
}
