//! Exercise and log endpoints of the tracker service.

use std::future::Future;

use reqwest::Method;
use serde::Serialize;

use super::{Access, GatewayError, HttpGateway};
use crate::exercises::{
    Exercise, ExerciseId, LogEntry, LogId, LogRecord, NewExercise, NewLogEntry, UserId,
};

/// The backing service contract the board depends on.
///
/// Mutations resolve to `()`: the service's confirmation body is ignored
/// because the caller refetches everything afterwards.
pub trait TrackerApi: Send + Sync {
    /// List the user's exercises
    fn list_exercises(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Exercise>, GatewayError>> + Send;

    /// Create an exercise
    fn create_exercise(
        &self,
        user_id: UserId,
        exercise: &NewExercise,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Replace an exercise's name and description
    fn update_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        exercise: &NewExercise,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Delete an exercise and, with it, its logs
    fn delete_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// List an exercise's logged sets in service order
    fn list_logs(
        &self,
        exercise_id: ExerciseId,
    ) -> impl Future<Output = Result<Vec<LogEntry>, GatewayError>> + Send;

    /// Log a set; the service assigns the timestamp
    fn create_log(
        &self,
        exercise_id: ExerciseId,
        entry: &NewLogEntry,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Delete a logged set
    fn delete_log(
        &self,
        exercise_id: ExerciseId,
        log_id: LogId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// PUT body: the service expects the id alongside the edited fields.
#[derive(Serialize)]
struct ExerciseUpdate<'a> {
    id: ExerciseId,
    name: &'a str,
    description: Option<&'a str>,
}

impl TrackerApi for HttpGateway {
    async fn list_exercises(&self, user_id: UserId) -> Result<Vec<Exercise>, GatewayError> {
        self.get_json(&format!("/users/{}/exercises", user_id)).await
    }

    async fn create_exercise(
        &self,
        user_id: UserId,
        exercise: &NewExercise,
    ) -> Result<(), GatewayError> {
        self.send_discarding(
            Method::POST,
            &format!("/users/{}/exercises", user_id),
            Some(exercise),
            Access::Authorized,
        )
        .await
    }

    async fn update_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        exercise: &NewExercise,
    ) -> Result<(), GatewayError> {
        let body = ExerciseUpdate {
            id: exercise_id,
            name: &exercise.name,
            description: exercise.description.as_deref(),
        };
        self.send_discarding(
            Method::PUT,
            &format!("/users/{}/exercises/{}", user_id, exercise_id),
            Some(&body),
            Access::Authorized,
        )
        .await
    }

    async fn delete_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<(), GatewayError> {
        self.send_discarding(
            Method::DELETE,
            &format!("/users/{}/exercises/{}", user_id, exercise_id),
            None::<&()>,
            Access::Authorized,
        )
        .await
    }

    async fn list_logs(&self, exercise_id: ExerciseId) -> Result<Vec<LogEntry>, GatewayError> {
        let records: Vec<LogRecord> = self
            .get_json(&format!("/exercises/{}/logs", exercise_id))
            .await?;

        Ok(records
            .into_iter()
            .map(|record| LogEntry::from_record(exercise_id, record))
            .collect())
    }

    async fn create_log(
        &self,
        exercise_id: ExerciseId,
        entry: &NewLogEntry,
    ) -> Result<(), GatewayError> {
        self.send_discarding(
            Method::POST,
            &format!("/exercises/{}/logs", exercise_id),
            Some(entry),
            Access::Authorized,
        )
        .await
    }

    async fn delete_log(&self, exercise_id: ExerciseId, log_id: LogId) -> Result<(), GatewayError> {
        self.send_discarding(
            Method::DELETE,
            &format!("/exercises/{}/logs/{}", exercise_id, log_id),
            None::<&()>,
            Access::Authorized,
        )
        .await
    }
}
