use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

use crate::migrations;
use crate::models::{OpenSession, SinkConfig, TIMESTAMP_FORMAT};

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

// Implement Send and Sync for Database to allow sharing across threads
unsafe impl Send for Database {}
unsafe impl Sync for Database {}

impl Database {
    /// Create a new database connection
    ///
    /// # Errors
    ///
    /// Returns an error if database directory creation, connection opening,
    /// or schema initialization fails
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = db_path.unwrap_or_else(Self::default_db_path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path).context("Failed to open database connection")?;

        // Initialize schema
        migrations::init_schema(&conn)?;
        migrations::insert_default_appliances(&conn)?;

        log::info!("Database initialized at: {}", path.display());

        Ok(Self { conn })
    }

    /// Get default database path
    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("watt");
        path.push("watt.db");
        path
    }

    // ========================================================================
    // Open sessions
    // ========================================================================

    /// Insert a new open session. Fails if the appliance already has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when the appliance
    /// key is already present
    pub fn insert_open_session(&self, session: &OpenSession) -> Result<()> {
        self.conn.execute(
            "INSERT INTO open_sessions (appliance, start_time, notes, certainty)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.appliance,
                session.start_time.format(TIMESTAMP_FORMAT).to_string(),
                session.notes,
                session.certainty,
            ],
        )?;
        Ok(())
    }

    /// Get the open session for an appliance, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    ///
    /// # Panics
    ///
    /// May panic if timestamp parsing fails for corrupted database entries
    pub fn get_open_session(&self, appliance: &str) -> Result<Option<OpenSession>> {
        let result = self
            .conn
            .query_row(
                "SELECT appliance, start_time, notes, certainty
                 FROM open_sessions WHERE appliance = ?1",
                params![appliance],
                Self::row_to_open_session,
            )
            .optional()?;

        Ok(result)
    }

    /// List all open sessions, oldest start first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    ///
    /// # Panics
    ///
    /// May panic if timestamp parsing fails for corrupted database entries
    pub fn list_open_sessions(&self) -> Result<Vec<OpenSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT appliance, start_time, notes, certainty
             FROM open_sessions
             ORDER BY start_time",
        )?;

        let sessions = stmt
            .query_map([], Self::row_to_open_session)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Remove and return the open session for an appliance. `None` when
    /// nothing was open; the removal is not rolled back by callers.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or delete fails
    pub fn take_open_session(&self, appliance: &str) -> Result<Option<OpenSession>> {
        let Some(session) = self.get_open_session(appliance)? else {
            return Ok(None);
        };

        self.conn.execute(
            "DELETE FROM open_sessions WHERE appliance = ?1",
            params![appliance],
        )?;

        Ok(Some(session))
    }

    fn row_to_open_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<OpenSession> {
        Ok(OpenSession {
            appliance: row.get(0)?,
            start_time: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(1)?,
                TIMESTAMP_FORMAT,
            )
            .unwrap(),
            notes: row.get(2)?,
            certainty: row.get(3)?,
        })
    }

    // ========================================================================
    // Appliance catalog
    // ========================================================================

    /// Add an appliance name to the catalog if it is not already there.
    /// Returns whether the catalog grew.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or insert fails
    pub fn register_appliance(&self, name: &str) -> Result<bool> {
        let known: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM appliances WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        if known > 0 {
            return Ok(false);
        }

        self.conn.execute(
            "INSERT INTO appliances (name) VALUES (?1)",
            params![name],
        )?;
        log::info!("Registered appliance: {name}");
        Ok(true)
    }

    /// List catalog names in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn list_appliances(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM appliances ORDER BY rowid")?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names)
    }

    // ========================================================================
    // Sink configuration
    // ========================================================================

    /// Get the remote store settings, if configured
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    ///
    /// # Panics
    ///
    /// May panic if datetime parsing fails for corrupted database entries
    pub fn get_sink_config(&self) -> Result<Option<SinkConfig>> {
        let result = self
            .conn
            .query_row(
                "SELECT base_url, api_key, table_name, updated_at FROM sink_config WHERE id = 1",
                [],
                |row| {
                    Ok(SinkConfig {
                        base_url: row.get(0)?,
                        api_key: row.get(1)?,
                        table: row.get(2)?,
                        updated_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(3)?)
                            .unwrap()
                            .with_timezone(&Utc),
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    /// Insert or update the remote store settings
    ///
    /// # Errors
    ///
    /// Returns an error if the database upsert operation fails
    pub fn upsert_sink_config(&self, config: &SinkConfig) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sink_config (id, base_url, api_key, table_name, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                base_url = ?1,
                api_key = ?2,
                table_name = ?3,
                updated_at = ?4",
            params![
                config.base_url,
                config.api_key,
                config.table,
                config.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
