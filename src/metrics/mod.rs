//! Log aggregation
//!
//! Pure, deterministic transforms from a flat list of logged sets to
//! date-grouped view data with progress metrics. No I/O happens here.

pub mod grouping;
pub mod progress;
pub mod view;

pub use grouping::{group_by_date, group_by_date_in, DateBucket};
pub use progress::{compute_metrics, format_diff, ExerciseMetrics, Trend};
pub use view::{BoardView, ExerciseView};
