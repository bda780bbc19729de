//! Unit tests for input validation and the "log again" prefill flow.

use chrono::{Offset, TimeZone, Utc};

use liftlog::exercises::{
    parse_timestamp, Credential, Exercise, LogEntry, LogRecord, NewLogEntry, Registration,
};
use liftlog::metrics::ExerciseView;
use liftlog::ValidationError;

#[test]
fn test_prefill_from_latest_day_first_set() {
    let entries = vec![
        LogEntry {
            id: 1,
            exercise_id: 2,
            weight: 60.0,
            reps: 10,
            timestamp: Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap(),
        },
        LogEntry {
            id: 2,
            exercise_id: 2,
            weight: 70.0,
            reps: 6,
            timestamp: Utc.with_ymd_and_hms(2024, 10, 2, 9, 0, 0).unwrap(),
        },
        LogEntry {
            id: 3,
            exercise_id: 2,
            weight: 72.5,
            reps: 5,
            timestamp: Utc.with_ymd_and_hms(2024, 10, 2, 9, 10, 0).unwrap(),
        },
    ];
    let exercise = Exercise {
        id: 2,
        name: "Overhead press".to_string(),
        description: None,
    };

    let view = ExerciseView::build(exercise, &entries, Utc.fix());
    assert_eq!(view.set_count(), 3);

    let mut next = NewLogEntry::from_last(view.last_set().unwrap());
    assert_eq!(next, NewLogEntry::new(70.0, 6).unwrap());

    next.adjust_weight(2.5);
    next.adjust_reps(-1);
    assert_eq!(next, NewLogEntry::new(72.5, 5).unwrap());
}

#[test]
fn test_registration_checks() {
    assert_eq!(
        Registration::new(" ", "pw", "pw").unwrap_err(),
        ValidationError::EmptyUsername
    );
    assert_eq!(
        Registration::new("dave", "", "").unwrap_err(),
        ValidationError::EmptyPassword
    );
    assert_eq!(
        Registration::new("dave", "Secret#1", "Secret#2").unwrap_err(),
        ValidationError::PasswordMismatch
    );

    let registration = Registration::new(" dave ", "Secret#1", "Secret#1").unwrap();
    assert_eq!(registration.username, "dave");
}

#[test]
fn test_timestamp_forms() {
    let expected = Utc.with_ymd_and_hms(2024, 10, 1, 18, 30, 0).unwrap();

    assert_eq!(parse_timestamp("2024-10-01T18:30:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-10-01T18:30:00Z"), Some(expected));
    assert_eq!(parse_timestamp("2024-10-01T20:30:00+02:00"), Some(expected));
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn test_log_record_rejects_bad_timestamp() {
    let result: Result<LogRecord, _> = serde_json::from_str(
        r#"{"id": 1, "timestamp": "not a date", "weight": 10, "reps": 1}"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_credential_debug_hides_token() {
    let credential = Credential::new("secret-token", 1, "erin");
    let printed = format!("{:?}", credential);

    assert!(!printed.contains("secret-token"));
    assert!(printed.contains("erin"));
}
