//! Session-over-session progress.
//!
//! Compares the total load of the two most recent date buckets.

use serde::{Deserialize, Serialize};

use super::grouping::DateBucket;

/// Direction of change between the two latest sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Trend {
    /// Classify a rounded percentage change; absent counts as neutral.
    pub fn from_diff(diff_percent: Option<i64>) -> Self {
        match diff_percent {
            Some(d) if d > 0 => Trend::Positive,
            Some(d) if d < 0 => Trend::Negative,
            _ => Trend::Neutral,
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Positive => write!(f, "positive"),
            Trend::Negative => write!(f, "negative"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

/// Derived per-exercise summary. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ExerciseMetrics {
    /// Total load of the most recent bucket
    pub total_load: f64,
    /// Rounded percent change vs the previous bucket, when there is one
    pub diff_percent: Option<i64>,
    pub trend: Trend,
}

/// Compute metrics over buckets ordered most recent first.
///
/// A previous session with zero load yields a diff of 0 rather than a
/// division by zero.
pub fn compute_metrics(buckets: &[DateBucket]) -> ExerciseMetrics {
    let Some(latest) = buckets.first() else {
        return ExerciseMetrics::default();
    };
    let total_load = latest.total_load();

    let diff_percent = buckets.get(1).map(|previous| {
        let previous_total = previous.total_load();
        if previous_total > 0.0 {
            round_half_up((total_load - previous_total) / previous_total * 100.0)
        } else {
            0
        }
    });

    ExerciseMetrics {
        total_load,
        diff_percent,
        trend: Trend::from_diff(diff_percent),
    }
}

/// Render a diff as `+N%` (including zero) or `-N%`.
pub fn format_diff(diff_percent: i64) -> String {
    if diff_percent >= 0 {
        format!("+{}%", diff_percent)
    } else {
        format!("{}%", diff_percent)
    }
}

// Halves round towards positive infinity: -2.5 -> -2, 2.5 -> 3.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
