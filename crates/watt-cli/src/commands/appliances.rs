/// Appliance catalog command handlers
use std::sync::Arc;

use anyhow::Result;
use watt_core::SessionTracker;
use watt_storage::Database;

pub fn handle_list() -> Result<()> {
    let db = Database::new(None)?;

    let names = db.list_appliances()?;
    if names.is_empty() {
        println!("No appliances registered.");
        return Ok(());
    }

    println!("Known appliances:");
    for name in names {
        println!("  - {name}");
    }
    Ok(())
}

pub fn handle_add(name: &str) -> Result<()> {
    let db = Arc::new(Database::new(None)?);
    let tracker = SessionTracker::new(db);

    if tracker.register(name)? {
        println!("Added '{}'.", name.trim());
    } else if name.trim().is_empty() {
        println!("Appliance name must not be empty.");
    } else {
        println!("'{}' is already registered.", name.trim());
    }
    Ok(())
}
