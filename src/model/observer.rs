use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::snapshot::FrontendData;

/// Receives the full snapshot after every partial update. Delivery is
/// at-least-once per player with no ordering across players.
pub trait SnapshotObserver {
    fn publish(&self, snapshot: &FrontendData);
}

impl<F> SnapshotObserver for F
where
    F: Fn(&FrontendData)
{
    fn publish(&self, snapshot: &FrontendData) {
        self(snapshot)
    }
}

/// Forwards snapshots to a channel, e.g. a render task.
pub struct ChannelObserver(pub UnboundedSender<FrontendData>);

impl SnapshotObserver for ChannelObserver {
    fn publish(&self, snapshot: &FrontendData) {
        if self.0.send(snapshot.clone()).is_err() {
            debug!("snapshot receiver dropped");
        }
    }
}
