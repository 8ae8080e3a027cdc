use anyhow::Result;
use rusqlite::{params, Connection};

/// Initialize database schema
///
/// # Errors
///
/// Returns an error if database table creation fails
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Open sessions table - the PRIMARY KEY on appliance enforces the
    // at-most-one-open-session-per-appliance invariant at the schema level
    conn.execute(
        "CREATE TABLE IF NOT EXISTS open_sessions (
            appliance TEXT PRIMARY KEY,
            start_time TEXT NOT NULL,
            notes TEXT NOT NULL,
            certainty INTEGER NOT NULL
        )",
        [],
    )?;

    // Appliance catalog - rowid keeps insertion order for display
    conn.execute(
        "CREATE TABLE IF NOT EXISTS appliances (
            name TEXT PRIMARY KEY
        )",
        [],
    )?;

    // Remote store settings - a single row
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sink_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            base_url TEXT NOT NULL,
            api_key TEXT NOT NULL,
            table_name TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Seed the appliance catalog on first run. A non-empty catalog is left
/// alone so user additions survive restarts.
///
/// # Errors
///
/// Returns an error if the seed insert fails
pub fn insert_default_appliances(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM appliances", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let defaults = [
        "oven",
        "dishwasher",
        "washing machine",
        "dryer",
        "sprinkler",
        "microwave",
    ];

    for name in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO appliances (name) VALUES (?1)",
            params![name],
        )?;
    }

    log::info!("Seeded appliance catalog with {} defaults", defaults.len());
    Ok(())
}
