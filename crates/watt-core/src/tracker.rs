use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use thiserror::Error;
use watt_storage::{timestamp_now, Database, OpenSession, SessionRecord};

const CERTAINTY_MIN: u8 = 1;
const CERTAINTY_MAX: u8 = 5;

/// Errors surfaced by tracker operations. All of them are recovered at the
/// CLI boundary and reported to the user; none are fatal to the process.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Stop was requested for an appliance with nothing running.
    #[error("no open session for appliance '{0}'")]
    SessionNotFound(String),
    /// Manual entry with an empty appliance name.
    #[error("appliance name must not be empty")]
    EmptyAppliance,
    /// Manual entry date or time that does not parse.
    #[error("invalid date or time: {0}")]
    Timestamp(#[from] chrono::ParseError),
    /// Local state could not be read or written.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Session lifecycle over the open-session map and the appliance catalog.
///
/// The tracker itself is stateless; all state lives in the injected
/// database, so every CLI invocation constructs a fresh tracker over the
/// shared store.
pub struct SessionTracker {
    database: Arc<Database>,
}

impl SessionTracker {
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Begin tracking an appliance.
    ///
    /// Returns `Ok(None)` without touching any state when the name is empty
    /// or the appliance already has an open session; the caller gates the
    /// action and decides how to present the no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the open-session store cannot be accessed
    pub fn start(
        &self,
        appliance: &str,
        notes: &str,
        certainty: u8,
    ) -> Result<Option<OpenSession>, TrackerError> {
        let appliance = appliance.trim();
        if appliance.is_empty() {
            return Ok(None);
        }
        if self.database.get_open_session(appliance)?.is_some() {
            return Ok(None);
        }

        let session = OpenSession::new(appliance.to_string(), notes.to_string(), certainty);
        self.database.insert_open_session(&session)?;
        log::info!("Started session for '{appliance}'");
        Ok(Some(session))
    }

    /// Stop a running appliance, converting its open session into the
    /// record handed to the remote store.
    ///
    /// The open session is removed before the caller sees the record; a
    /// failed upload afterwards does not restore it.
    ///
    /// # Errors
    ///
    /// `TrackerError::SessionNotFound` when nothing is running for
    /// `appliance`; storage errors otherwise
    pub fn stop(&self, appliance: &str) -> Result<SessionRecord, TrackerError> {
        let open = self
            .database
            .take_open_session(appliance)?
            .ok_or_else(|| TrackerError::SessionNotFound(appliance.to_string()))?;

        let record = open.finish(timestamp_now());
        log::info!("Stopped session for '{appliance}'");
        Ok(record)
    }

    /// Build a session record from user-supplied dates and times, without
    /// going through the start/stop lifecycle.
    ///
    /// Dates use `%Y-%m-%d`; times accept `%H:%M:%S` or `%H:%M`. Certainty
    /// is clamped into 1..=5. The end is not required to come after the
    /// start; the record is passed through as entered.
    ///
    /// # Errors
    ///
    /// `TrackerError::EmptyAppliance` for a blank name,
    /// `TrackerError::Timestamp` for input that does not parse
    #[allow(clippy::too_many_arguments)]
    pub fn add_manual(
        &self,
        appliance: &str,
        start_date: &str,
        start_time: &str,
        end_date: &str,
        end_time: &str,
        notes: &str,
        certainty: u8,
    ) -> Result<SessionRecord, TrackerError> {
        let appliance = appliance.trim();
        if appliance.is_empty() {
            return Err(TrackerError::EmptyAppliance);
        }

        let start = combine(start_date, start_time)?;
        let end = combine(end_date, end_time)?;

        Ok(SessionRecord {
            appliance: appliance.to_string(),
            start_time: start,
            end_time: end,
            notes: notes.to_string(),
            certainty: certainty.clamp(CERTAINTY_MIN, CERTAINTY_MAX),
        })
    }

    /// Add a name to the appliance catalog. Empty and already-known names
    /// are a no-op; returns whether the catalog grew.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or written
    pub fn register(&self, name: &str) -> Result<bool, TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        Ok(self.database.register_appliance(name)?)
    }

    /// Open sessions, oldest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the open-session store cannot be read
    pub fn running(&self) -> Result<Vec<OpenSession>, TrackerError> {
        Ok(self.database.list_open_sessions()?)
    }
}

/// Combine independent date and time inputs into one timestamp.
fn combine(date: &str, time: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")?;
    let time = parse_time(time.trim())?;
    Ok(date.and_time(time))
}

fn parse_time(time: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use watt_storage::TIMESTAMP_FORMAT;

    fn tracker() -> (tempfile::TempDir, SessionTracker) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::new(Some(dir.path().join("watt.db"))).unwrap());
        (dir, SessionTracker::new(db))
    }

    #[test]
    fn test_start_creates_open_session() {
        let (_dir, tracker) = tracker();

        let before = timestamp_now();
        let session = tracker.start("oven", "roast", 4).unwrap().unwrap();
        let after = timestamp_now();

        assert_eq!(session.appliance, "oven");
        assert!(session.start_time >= before && session.start_time <= after);

        let running = tracker.running().unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].appliance, "oven");
    }

    #[test]
    fn test_start_is_rejected_when_already_running() {
        let (_dir, tracker) = tracker();

        tracker.start("oven", "first", 5).unwrap().unwrap();
        assert!(tracker.start("oven", "second", 1).unwrap().is_none());

        // The original session is untouched
        let running = tracker.running().unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].notes, "first");
        assert_eq!(running[0].certainty, 5);
    }

    #[test]
    fn test_start_rejects_empty_name() {
        let (_dir, tracker) = tracker();

        assert!(tracker.start("", "", 3).unwrap().is_none());
        assert!(tracker.start("   ", "", 3).unwrap().is_none());
        assert!(tracker.running().unwrap().is_empty());
    }

    #[test]
    fn test_stop_removes_session_and_builds_record() {
        let (_dir, tracker) = tracker();

        tracker.start("dryer", "towels", 2).unwrap().unwrap();
        let record = tracker.stop("dryer").unwrap();

        assert_eq!(record.appliance, "dryer");
        assert!(record.end_time >= record.start_time);
        assert_eq!(record.notes, "towels");
        assert_eq!(record.certainty, 2);
        assert!(tracker.running().unwrap().is_empty());
    }

    #[test]
    fn test_stop_without_open_session_fails() {
        let (_dir, tracker) = tracker();

        let err = tracker.stop("oven").unwrap_err();
        assert!(matches!(err, TrackerError::SessionNotFound(name) if name == "oven"));
    }

    #[test]
    fn test_manual_entry_builds_record() {
        let (_dir, tracker) = tracker();

        let record = tracker
            .add_manual("oven", "2024-01-01", "10:00:00", "2024-01-01", "10:30:00", "", 4)
            .unwrap();

        assert_eq!(record.appliance, "oven");
        assert_eq!(
            record.start_time.format(TIMESTAMP_FORMAT).to_string(),
            "2024-01-01 10:00:00"
        );
        assert_eq!(
            record.end_time.format(TIMESTAMP_FORMAT).to_string(),
            "2024-01-01 10:30:00"
        );
        assert_eq!(record.certainty, 4);

        // Manual entries never pass through the open-session map
        assert!(tracker.running().unwrap().is_empty());
    }

    #[test]
    fn test_manual_entry_accepts_minute_precision() {
        let (_dir, tracker) = tracker();

        let record = tracker
            .add_manual("kettle", "2024-01-01", "07:15", "2024-01-01", "07:20", "", 3)
            .unwrap();
        assert_eq!(
            record.start_time.format(TIMESTAMP_FORMAT).to_string(),
            "2024-01-01 07:15:00"
        );
    }

    #[test]
    fn test_manual_entry_clamps_certainty() {
        let (_dir, tracker) = tracker();

        let high = tracker
            .add_manual("oven", "2024-01-01", "10:00", "2024-01-01", "11:00", "", 9)
            .unwrap();
        assert_eq!(high.certainty, 5);

        let low = tracker
            .add_manual("oven", "2024-01-01", "10:00", "2024-01-01", "11:00", "", 0)
            .unwrap();
        assert_eq!(low.certainty, 1);
    }

    #[test]
    fn test_manual_entry_rejects_malformed_date() {
        let (_dir, tracker) = tracker();

        let err = tracker
            .add_manual("oven", "2024-13-01", "10:00", "2024-01-01", "11:00", "", 3)
            .unwrap_err();
        assert!(matches!(err, TrackerError::Timestamp(_)));
    }

    #[test]
    fn test_manual_entry_rejects_empty_appliance() {
        let (_dir, tracker) = tracker();

        let err = tracker
            .add_manual("  ", "2024-01-01", "10:00", "2024-01-01", "11:00", "", 3)
            .unwrap_err();
        assert!(matches!(err, TrackerError::EmptyAppliance));
    }

    #[test]
    fn test_manual_entry_passes_through_end_before_start() {
        let (_dir, tracker) = tracker();

        // Not validated on purpose; the record is sent as entered
        let record = tracker
            .add_manual("oven", "2024-01-02", "10:00", "2024-01-01", "10:00", "", 3)
            .unwrap();
        assert!(record.end_time < record.start_time);
    }

    #[test]
    fn test_register_is_idempotent() {
        let (_dir, tracker) = tracker();

        assert!(tracker.register("heat pump").unwrap());
        assert!(!tracker.register("heat pump").unwrap());
        assert!(!tracker.register("").unwrap());
    }
}
