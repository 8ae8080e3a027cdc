/// Session lifecycle command handlers
use std::sync::Arc;

use anyhow::Result;
use tabled::{Table, Tabled};
use watt_core::{SessionTracker, TrackerError};
use watt_integrations::{SessionEntry, SessionSink, SupabaseClient};
use watt_storage::{Database, SessionRecord, TIMESTAMP_FORMAT};

#[derive(Tabled)]
struct RunningRow {
    #[tabled(rename = "Appliance")]
    appliance: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Notes")]
    notes: String,
    #[tabled(rename = "Certainty")]
    certainty: u8,
}

fn open_database() -> Result<Arc<Database>> {
    Ok(Arc::new(Database::new(None)?))
}

pub fn handle_start(appliance: &str, notes: &str, certainty: u8) -> Result<()> {
    let db = open_database()?;
    let tracker = SessionTracker::new(db.clone());

    // Gate the action the way the form did: a running appliance simply has
    // no start control.
    if let Some(open) = db.get_open_session(appliance.trim())? {
        println!(
            "'{}' is already running (started at {}).",
            open.appliance,
            open.start_time.format(TIMESTAMP_FORMAT)
        );
        return Ok(());
    }

    if tracker.register(appliance)? {
        println!("Added '{}' to the appliance catalog.", appliance.trim());
    }

    match tracker.start(appliance, notes, certainty)? {
        Some(session) => println!(
            "'{}' started at {}.",
            session.appliance,
            session.start_time.format(TIMESTAMP_FORMAT)
        ),
        None => println!("Appliance name must not be empty."),
    }
    Ok(())
}

pub async fn handle_stop(appliance: &str) -> Result<()> {
    let db = open_database()?;
    let tracker = SessionTracker::new(db.clone());

    let record = match tracker.stop(appliance) {
        Ok(record) => record,
        Err(TrackerError::SessionNotFound(name)) => {
            println!("No open session for '{name}'.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "'{}' stopped at {}.",
        record.appliance,
        record.end_time.format(TIMESTAMP_FORMAT)
    );

    submit_record(&db, &record).await
}

pub async fn handle_add(
    appliance: &str,
    start: (&str, &str),
    end: (&str, &str),
    notes: &str,
    certainty: u8,
) -> Result<()> {
    let db = open_database()?;
    let tracker = SessionTracker::new(db.clone());

    if tracker.register(appliance)? {
        println!("Added '{}' to the appliance catalog.", appliance.trim());
    }

    let (start_date, start_time) = start;
    let (end_date, end_time) = end;

    let record = match tracker.add_manual(
        appliance, start_date, start_time, end_date, end_time, notes, certainty,
    ) {
        Ok(record) => record,
        Err(e @ (TrackerError::EmptyAppliance | TrackerError::Timestamp(_))) => {
            println!("Invalid session: {e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    submit_record(&db, &record).await
}

pub fn handle_status() -> Result<()> {
    let db = open_database()?;
    let tracker = SessionTracker::new(db);

    let open = tracker.running()?;
    if open.is_empty() {
        println!("No running appliances.");
        return Ok(());
    }

    let rows: Vec<RunningRow> = open
        .into_iter()
        .map(|session| RunningRow {
            appliance: session.appliance,
            started: session.start_time.format(TIMESTAMP_FORMAT).to_string(),
            notes: session.notes,
            certainty: session.certainty,
        })
        .collect();

    let table = Table::new(rows).to_string();
    println!("{table}");
    Ok(())
}

pub async fn handle_test() -> Result<()> {
    let db = open_database()?;
    let sink = build_sink(&db)?;

    println!("Testing connection to the {} session store...", sink.sink_name());
    match sink.validate_credentials().await {
        Ok(true) => println!("Connection successful!"),
        Ok(false) => println!("Connection failed: Invalid credentials"),
        Err(e) => println!("Connection failed: {e}"),
    }
    Ok(())
}

/// Send a finalized record to the configured store and report the outcome.
/// The local session is already closed at this point; a failed upload is
/// reported, not retried.
async fn submit_record(db: &Database, record: &SessionRecord) -> Result<()> {
    let sink = build_sink(db)?;
    let entry = SessionEntry::new(
        record.appliance.clone(),
        record.start_time,
        record.end_time,
        record.notes.clone(),
        record.certainty,
    );

    match sink.insert_session(&entry).await {
        Ok(()) => println!(
            "Session saved ({} min).",
            entry.duration_seconds() / 60
        ),
        Err(e) => {
            log::error!("Failed to save session: {e}");
            println!("Failed to save session: {e}");
            println!("The session is closed locally and will not be resent.");
        }
    }
    Ok(())
}

fn build_sink(db: &Database) -> Result<SupabaseClient> {
    let config = db.get_sink_config()?.filter(|c| !c.base_url.is_empty() && !c.api_key.is_empty()).ok_or_else(|| {
        anyhow::anyhow!(
            "Session store not configured. Run: watt config set sink.url <url> && watt config set sink.api_key <key>"
        )
    })?;

    SupabaseClient::new(config.base_url, config.api_key, Some(config.table))
}
