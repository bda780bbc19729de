//! Exercise and log domain types.
//!
//! Holds the records exchanged with the tracker service and the local
//! validation applied to user input before anything is sent.

pub mod types;

use thiserror::Error;

pub use types::{
    parse_timestamp, Credential, Exercise, ExerciseId, LogEntry, LogId, LogRecord, NewExercise,
    NewLogEntry, Registration, UserId,
};

/// Input rejected before any network call.
///
/// The display text is what the form shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Exercise name is required.")]
    EmptyExerciseName,

    #[error("Valid weight is required.")]
    InvalidWeight,

    #[error("Valid repetitions are required.")]
    InvalidReps,

    #[error("Username is required.")]
    EmptyUsername,

    #[error("Password is required.")]
    EmptyPassword,

    #[error("Passwords do not match.")]
    PasswordMismatch,
}
