//! LiftLog - Workout Tracker Client
//!
//! Client-side session and data-aggregation layer for a personal workout
//! tracker. Authenticates against the tracker service, keeps the credential
//! across restarts, fetches exercises and their logged sets, and turns them
//! into date-grouped views with session-over-session progress.

pub mod board;
pub mod error;
pub mod exercises;
pub mod gateway;
pub mod metrics;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use board::{BoardState, ChangeNotifier, DataChanged, ExerciseBoard};
pub use error::{TrackerError, TrackerResult};
pub use exercises::{Credential, Exercise, LogEntry, ValidationError};
pub use gateway::{GatewayError, HttpGateway, TrackerApi};
pub use metrics::{compute_metrics, group_by_date, BoardView, DateBucket, ExerciseMetrics, Trend};
pub use session::{SessionEvent, SessionStore};
pub use storage::config::AppConfig;
