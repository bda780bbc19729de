//! Change notifications that drive board refreshes.

use tokio::sync::broadcast;

use crate::exercises::{ExerciseId, LogId};

const CHANNEL_CAPACITY: usize = 32;

/// A mutation the service acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataChanged {
    ExerciseAdded,
    ExerciseUpdated(ExerciseId),
    ExerciseDeleted(ExerciseId),
    LogAdded(ExerciseId),
    LogDeleted {
        exercise_id: ExerciseId,
        log_id: LogId,
    },
}

/// Broadcasts [`DataChanged`] to every subscriber.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<DataChanged>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Emit a change. Nobody listening is fine.
    pub fn notify(&self, change: DataChanged) {
        tracing::debug!("Data changed: {:?}", change);
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataChanged> {
        self.sender.subscribe()
    }
}
