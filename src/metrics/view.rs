//! Grouped, metric-annotated view data for the exercise board.

use chrono::FixedOffset;
use serde::Serialize;

use super::grouping::{group_by_date_in, DateBucket};
use super::progress::{compute_metrics, ExerciseMetrics};
use crate::exercises::{Exercise, ExerciseId, LogEntry};

/// One exercise with its sets grouped by day and its progress metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseView {
    pub exercise: Exercise,
    /// Most recent day first
    pub buckets: Vec<DateBucket>,
    pub metrics: ExerciseMetrics,
}

impl ExerciseView {
    /// Aggregate an exercise's fetched logs.
    pub fn build(exercise: Exercise, entries: &[LogEntry], offset: FixedOffset) -> Self {
        let buckets = group_by_date_in(entries, offset);
        let metrics = compute_metrics(&buckets);

        Self {
            exercise,
            buckets,
            metrics,
        }
    }

    /// First set of the most recent day, used to prefill the next entry.
    pub fn last_set(&self) -> Option<&LogEntry> {
        self.buckets.first().and_then(|bucket| bucket.sets.first())
    }

    pub fn set_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.sets.len()).sum()
    }
}

/// Everything the board shows after one fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardView {
    /// Exercises in service order
    pub exercises: Vec<ExerciseView>,
}

impl BoardView {
    pub fn exercise(&self, id: ExerciseId) -> Option<&ExerciseView> {
        self.exercises.iter().find(|view| view.exercise.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}
