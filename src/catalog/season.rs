use std::fmt;

use crate::api::api_structs::CatalogSeason;

/// Human-readable identity of a competitive act, e.g. `e5a3` or `v25a1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonLabel {
    pub era: Era,
    pub act: u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Episode(u32),
    /// Acts named after the release year (`V25`, `V26`, ...)
    Year(u32)
}

impl SeasonLabel {
    /// Builds a label from a catalog act entry, preferring its title and
    /// falling back to the asset path.
    pub fn from_catalog(season: &CatalogSeason) -> Option<SeasonLabel> {
        season
            .title
            .as_deref()
            .and_then(parse_title)
            .or_else(|| parse_asset_path(&season.asset_path))
            .map(SeasonLabel::remap_legacy)
    }

    /// Episodes 10 and 11 were renamed to the `V25`/`V26` scheme.
    fn remap_legacy(self) -> SeasonLabel {
        let era = match self.era {
            Era::Episode(10) => Era::Year(25),
            Era::Episode(11) => Era::Year(26),
            other => other
        };

        SeasonLabel { era, ..self }
    }

    /// Acts from episodes 1-4 used the shorter pre-Ascendant ladder.
    pub fn uses_legacy_ladder(&self) -> bool {
        matches!(self.era, Era::Episode(n) if n <= 4)
    }
}

impl fmt::Display for SeasonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.era {
            Era::Episode(n) => write!(f, "e{}a{}", n, self.act),
            Era::Year(y) => write!(f, "v{}a{}", y, self.act)
        }
    }
}

/// Titles look like `EPISODE 5 // ACT III` or `V25: ACT I`.
fn parse_title(title: &str) -> Option<SeasonLabel> {
    let upper = title.to_ascii_uppercase();
    let tokens: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let mut era = None;
    let mut act = None;
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).and_then(|t| parse_numeral(t));
        match *token {
            "EPISODE" => era = next.map(Era::Episode).or(era),
            "ACT" => act = next.or(act),
            t if t.len() > 1 && t.starts_with('V') && t[1..].chars().all(|c| c.is_ascii_digit()) => {
                era = t[1..].parse().ok().map(Era::Year).or(era);
            }
            _ => {}
        }
    }

    Some(SeasonLabel { era: era?, act: act? })
}

/// Asset paths look like `ShooterGame/Content/Seasons/Season_Episode5_Act3_DataAsset`.
fn parse_asset_path(path: &str) -> Option<SeasonLabel> {
    let lower = path.to_ascii_lowercase();
    let episode = number_after(&lower, "_episode")?;
    let act = number_after(&lower, "_act")?;

    Some(SeasonLabel {
        era: Era::Episode(episode),
        act
    })
}

fn number_after(haystack: &str, marker: &str) -> Option<u32> {
    let start = haystack.find(marker)? + marker.len();
    let digits: String = haystack[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn parse_numeral(token: &str) -> Option<u32> {
    token.parse().ok().or_else(|| roman_to_int(token))
}

pub fn roman_to_int(numeral: &str) -> Option<u32> {
    let values = numeral
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            _ => None
        })
        .collect::<Option<Vec<u32>>>()?;

    if values.is_empty() {
        return None;
    }

    let mut total = 0;
    for (i, value) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(next) if next > value => total -= *value as i64,
            _ => total += *value as i64
        }
    }

    u32::try_from(total).ok().filter(|n| *n > 0)
}
