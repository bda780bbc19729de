//! Exercise, log entry and credential types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ValidationError;

/// Identifier of a registered user.
pub type UserId = i64;
/// Identifier of an exercise.
pub type ExerciseId = i64;
/// Identifier of a single logged set.
pub type LogId = i64;

/// Authenticated identity: bearer token, user id and display name.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Opaque bearer token issued by the service
    pub token: String,
    /// Owner of the exercises
    pub user_id: UserId,
    /// Display name
    pub username: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id,
            username: username.into(),
        }
    }
}

// Tokens must never reach the logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .finish()
    }
}

/// An exercise owned by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A log record as the service sends it.
///
/// The service omits the owning exercise; see [`LogEntry::from_record`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogRecord {
    pub id: LogId,
    pub weight: f64,
    pub reps: u32,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// One logged set: weight lifted for a number of repetitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: LogId,
    pub exercise_id: ExerciseId,
    /// Weight in kilograms (non-negative)
    pub weight: f64,
    pub reps: u32,
    /// Server-assigned creation instant
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Attach a wire record to the exercise it was fetched for.
    pub fn from_record(exercise_id: ExerciseId, record: LogRecord) -> Self {
        Self {
            id: record.id,
            exercise_id,
            weight: record.weight,
            reps: record.reps,
            timestamp: record.timestamp,
        }
    }

    /// Weight times repetitions.
    pub fn load(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// Parse a log timestamp.
///
/// Accepts RFC 3339 with an offset, or a naive ISO-8601 date-time which is
/// read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Validated input for creating or editing an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
}

impl NewExercise {
    /// Trim the fields and reject an empty name.
    ///
    /// A blank description becomes `None`.
    pub fn new(name: &str, description: Option<&str>) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyExerciseName);
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            description,
        })
    }
}

/// Validated input for logging a set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NewLogEntry {
    pub weight: f64,
    pub reps: u32,
}

impl NewLogEntry {
    /// Reject negative or non-finite weights and negative repetitions.
    pub fn new(weight: f64, reps: i64) -> Result<Self, ValidationError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ValidationError::InvalidWeight);
        }
        let reps = u32::try_from(reps).map_err(|_| ValidationError::InvalidReps)?;

        Ok(Self { weight, reps })
    }

    /// Prefill from a previously logged set.
    pub fn from_last(last: &LogEntry) -> Self {
        Self {
            weight: last.weight,
            reps: last.reps,
        }
    }

    /// Step the weight, never going below zero.
    pub fn adjust_weight(&mut self, delta: f64) {
        self.weight = (self.weight + delta).max(0.0);
    }

    /// Step the repetitions, never going below zero.
    pub fn adjust_reps(&mut self, delta: i64) {
        let next = i64::from(self.reps).saturating_add(delta).max(0);
        self.reps = u32::try_from(next).unwrap_or(u32::MAX);
    }
}

/// Account registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

impl Registration {
    /// Check the form before it is submitted.
    pub fn new(username: &str, password: &str, confirm: &str) -> Result<Self, ValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if password != confirm {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}
