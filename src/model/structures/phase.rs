use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Where the local player currently is. Detection checks these in reverse
/// declaration order: in-game wins over pre-game, which wins over lobby.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Phase {
    #[default]
    Lobby,
    #[strum(serialize = "Pre-game")]
    PreGame,
    #[strum(serialize = "In-game")]
    InGame
}

impl Phase {
    pub fn in_match(&self) -> bool {
        !matches!(self, Phase::Lobby)
    }
}
