//! Exercise board
//!
//! Orchestrates the fetch-aggregate pipeline: list the user's exercises,
//! fetch every exercise's logs concurrently, and publish the grouped view
//! only once all of them have settled. Any acknowledged mutation emits a
//! [`DataChanged`] signal and the whole pipeline runs again; cached state is
//! never patched in place.

pub mod events;

use std::future::Future;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use futures::future::join_all;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

pub use events::{ChangeNotifier, DataChanged};

use crate::error::{TrackerError, TrackerResult};
use crate::exercises::{ExerciseId, LogEntry, LogId, NewExercise, NewLogEntry, UserId};
use crate::gateway::{GatewayError, TrackerApi};
use crate::metrics::{BoardView, ExerciseView};
use crate::session::SessionStore;

/// What the board currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardState {
    /// Nothing fetched yet
    Idle,
    /// A fetch cycle is in flight
    Loading,
    /// The latest complete view
    Ready(Arc<BoardView>),
    /// The last fetch cycle failed with this message
    Failed(String),
    /// The session ended; the user must log in again
    SignedOut,
}

/// Fetches, aggregates and publishes the user's exercises and logs.
pub struct ExerciseBoard<A> {
    api: Arc<A>,
    session: Arc<SessionStore>,
    notifier: ChangeNotifier,
    state: watch::Sender<BoardState>,
    day_offset: FixedOffset,
}

impl<A: TrackerApi> ExerciseBoard<A> {
    /// Create a board bucketing days in UTC.
    pub fn new(api: Arc<A>, session: Arc<SessionStore>) -> Self {
        let (state, _) = watch::channel(BoardState::Idle);

        Self {
            api,
            session,
            notifier: ChangeNotifier::new(),
            state,
            day_offset: Utc.fix(),
        }
    }

    /// Bucket days at a fixed UTC offset instead.
    pub fn with_day_offset(mut self, offset: FixedOffset) -> Self {
        self.day_offset = offset;
        self
    }

    /// Handle for emitting or observing change signals.
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> BoardState {
        self.state.borrow().clone()
    }

    /// Run the full pipeline and publish the result.
    pub async fn refresh(&self) -> TrackerResult<Arc<BoardView>> {
        let Some(credential) = self.session.current_credential() else {
            self.state.send_replace(BoardState::SignedOut);
            return Err(TrackerError::NotSignedIn);
        };

        self.state.send_replace(BoardState::Loading);

        match self.load(credential.user_id).await {
            Ok(view) => {
                let view = Arc::new(view);
                tracing::info!("Board refreshed: {} exercises", view.exercises.len());
                self.state.send_replace(BoardState::Ready(view.clone()));
                Ok(view)
            }
            Err(err) => {
                let state = if err.requires_login() {
                    BoardState::SignedOut
                } else {
                    BoardState::Failed(err.user_message())
                };
                tracing::warn!("Board refresh failed: {}", err);
                self.state.send_replace(state);
                Err(err)
            }
        }
    }

    async fn load(&self, user_id: UserId) -> TrackerResult<BoardView> {
        let exercises = self.api.list_exercises(user_id).await?;

        // Issued together; nothing is published until every fetch settles.
        let results = join_all(exercises.iter().map(|e| self.api.list_logs(e.id))).await;
        let logs = settle(results)?;

        let exercises = exercises
            .into_iter()
            .zip(logs)
            .map(|(exercise, entries)| ExerciseView::build(exercise, &entries, self.day_offset))
            .collect();

        Ok(BoardView { exercises })
    }

    /// Refresh on every change signal until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut changes = self.notifier.subscribe();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                change = changes.recv() => match change {
                    Ok(change) => tracing::debug!("Refreshing after {:?}", change),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Refreshing after {} coalesced changes", skipped)
                    }
                    Err(RecvError::Closed) => break,
                },
            }

            // Failures are already published as board state.
            let _ = self.refresh().await;
        }
    }

    /// Create an exercise.
    pub async fn add_exercise(&self, name: &str, description: Option<&str>) -> TrackerResult<()> {
        let exercise = NewExercise::new(name, description)?;
        let user_id = self.user_id()?;

        self.mutate(self.api.create_exercise(user_id, &exercise)).await?;
        self.notifier.notify(DataChanged::ExerciseAdded);
        Ok(())
    }

    /// Rename or re-describe an exercise.
    pub async fn update_exercise(
        &self,
        exercise_id: ExerciseId,
        name: &str,
        description: Option<&str>,
    ) -> TrackerResult<()> {
        let exercise = NewExercise::new(name, description)?;
        let user_id = self.user_id()?;

        self.mutate(self.api.update_exercise(user_id, exercise_id, &exercise))
            .await?;
        self.notifier.notify(DataChanged::ExerciseUpdated(exercise_id));
        Ok(())
    }

    pub async fn delete_exercise(&self, exercise_id: ExerciseId) -> TrackerResult<()> {
        let user_id = self.user_id()?;

        self.mutate(self.api.delete_exercise(user_id, exercise_id))
            .await?;
        self.notifier.notify(DataChanged::ExerciseDeleted(exercise_id));
        Ok(())
    }

    /// Log a set of `reps` repetitions at `weight`.
    pub async fn add_log(&self, exercise_id: ExerciseId, weight: f64, reps: i64) -> TrackerResult<()> {
        let entry = NewLogEntry::new(weight, reps)?;
        self.user_id()?;

        self.mutate(self.api.create_log(exercise_id, &entry)).await?;
        self.notifier.notify(DataChanged::LogAdded(exercise_id));
        Ok(())
    }

    pub async fn delete_log(&self, exercise_id: ExerciseId, log_id: LogId) -> TrackerResult<()> {
        self.user_id()?;

        self.mutate(self.api.delete_log(exercise_id, log_id)).await?;
        self.notifier.notify(DataChanged::LogDeleted {
            exercise_id,
            log_id,
        });
        Ok(())
    }

    fn user_id(&self) -> TrackerResult<UserId> {
        self.session
            .current_credential()
            .map(|credential| credential.user_id)
            .ok_or(TrackerError::NotSignedIn)
    }

    /// Await a mutation. The published view is left untouched on failure,
    /// except that an expired session signs the board out.
    async fn mutate<F>(&self, call: F) -> TrackerResult<()>
    where
        F: Future<Output = Result<(), GatewayError>>,
    {
        call.await.map_err(|err| {
            if err == GatewayError::AuthExpired {
                self.state.send_replace(BoardState::SignedOut);
            }
            TrackerError::from(err)
        })
    }
}

/// Collect per-exercise log results, preferring an auth failure over any
/// other error so the caller always learns the session ended.
fn settle(results: Vec<Result<Vec<LogEntry>, GatewayError>>) -> TrackerResult<Vec<Vec<LogEntry>>> {
    if results
        .iter()
        .any(|r| matches!(r, Err(GatewayError::AuthExpired)))
    {
        return Err(GatewayError::AuthExpired.into());
    }

    results
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(TrackerError::from)
}
