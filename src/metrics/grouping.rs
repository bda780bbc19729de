//! Date bucketing of logged sets.
//!
//! Sets are grouped by the calendar day of their timestamp in one fixed
//! zone (UTC unless configured otherwise), then ordered most recent day
//! first. Within a day, sets keep the order the service returned them in.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::exercises::LogEntry;

/// Sets logged on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    /// Calendar day in the bucketing zone
    pub date: NaiveDate,
    /// Sets in fetch order
    pub sets: Vec<LogEntry>,
}

impl DateBucket {
    /// Date as `YYYY-MM-DD`.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Total load: sum of weight x reps over the bucket's sets.
    pub fn total_load(&self) -> f64 {
        self.sets.iter().map(LogEntry::load).sum()
    }
}

/// Group entries by UTC calendar day, most recent day first.
pub fn group_by_date(entries: &[LogEntry]) -> Vec<DateBucket> {
    group_by_date_in(entries, Utc.fix())
}

/// Group entries by calendar day at a fixed UTC offset, most recent first.
pub fn group_by_date_in(entries: &[LogEntry], offset: FixedOffset) -> Vec<DateBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<LogEntry>> = BTreeMap::new();

    for entry in entries {
        let date = entry.timestamp.with_timezone(&offset).date_naive();
        days.entry(date).or_default().push(entry.clone());
    }

    days.into_iter()
        .rev()
        .map(|(date, sets)| DateBucket { date, sets })
        .collect()
}
