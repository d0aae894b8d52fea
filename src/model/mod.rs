pub mod aggregator;
pub mod context;
pub mod observer;
pub mod rank;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod structures;

/// Opaque account identifier (PUUID); never parsed.
pub type PlayerId = String;

pub use aggregator::{Aggregator, AggregatorConfig, AggregatorError};
pub use context::{MatchContext, RosterEntry};
pub use observer::{ChannelObserver, SnapshotObserver};
pub use snapshot::{AggregateStats, FrontendData, PlayerSnapshot, RankSnapshot};
