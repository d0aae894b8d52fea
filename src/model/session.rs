use std::collections::HashMap;

use indexmap::IndexSet;
use strum_macros::Display;
use tracing::debug;

use crate::api::api_structs::MatchDetails;

use super::{
    snapshot::{FrontendData, RankSnapshot},
    structures::phase::Phase,
    PlayerId
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum SessionState {
    #[default]
    Idle,
    ContextKnown,
    RosterDiscovered,
    Processing,
    Settled
}

/// Loaded slice `[0, high_water_mark)` of a player's competitive history.
#[derive(Debug, Clone, Default)]
pub struct MatchHistoryWindow {
    pub high_water_mark: usize,
    pub total: usize,
    pub matches: Vec<MatchDetails>
}

impl MatchHistoryWindow {
    pub fn exhausted(&self) -> bool {
        self.high_water_mark >= self.total
    }

    /// Records a page ending at `end`. The mark only ever moves forward.
    pub fn extend(&mut self, end: usize, total: usize, matches: impl IntoIterator<Item = MatchDetails>) {
        self.total = self.total.max(total);
        self.high_water_mark = self.high_water_mark.max(end.min(self.total));
        self.matches.extend(matches);
    }
}

/// Everything accumulated for one match. Replaced wholesale when the match
/// id changes, never patched.
#[derive(Debug, Default)]
pub struct MatchSession {
    pub match_id: Option<String>,
    pub state: SessionState,
    pub processed: IndexSet<PlayerId>,
    pub ranks: HashMap<PlayerId, RankSnapshot>,
    pub windows: HashMap<PlayerId, MatchHistoryWindow>,
    pub frontend: FrontendData,
    /// Phase whose loadouts are already applied.
    pub loadouts_phase: Option<Phase>
}

impl MatchSession {
    pub fn new(match_id: Option<String>) -> Self {
        MatchSession {
            match_id,
            ..Default::default()
        }
    }

    pub fn transition(&mut self, state: SessionState) {
        if self.state != state {
            debug!(match_id = ?self.match_id, from = %self.state, to = %state, "session state");
            self.state = state;
        }
    }

    pub fn is_processed(&self, puuid: &str) -> bool {
        self.processed.contains(puuid)
    }
}
