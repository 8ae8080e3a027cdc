/// Configuration management command handlers
use anyhow::Result;
use watt_storage::{Database, SinkConfig};

pub fn handle_config_get(key: &str) -> Result<()> {
    let db = Database::new(None)?;
    let value = get_config_value(&db, key)?;
    match value {
        Some(v) => println!("{key} = {v}"),
        None => println!("{key} is not set"),
    }
    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<()> {
    let db = Database::new(None)?;
    set_config_value(&db, key, value)?;
    println!("Set {key} = {value}");
    Ok(())
}

pub fn handle_config_list() -> Result<()> {
    let db = Database::new(None)?;

    println!("Configuration:");
    println!("{}", "=".repeat(14));

    match db.get_sink_config()? {
        Some(config) => {
            println!("\n[sink]");
            println!("  url = {}", config.base_url);
            if !config.api_key.is_empty() {
                println!(
                    "  api_key = {}***",
                    &config.api_key.chars().take(8).collect::<String>()
                );
            }
            println!("  table = {}", config.table);
        }
        None => println!("\nSession store not configured yet."),
    }

    Ok(())
}

fn get_config_value(db: &Database, key: &str) -> Result<Option<String>> {
    let (section, field) = split_key(key)?;

    match section {
        "sink" => {
            if let Some(config) = db.get_sink_config()? {
                let value = match field {
                    "url" | "base_url" => Some(config.base_url),
                    "api_key" | "key" => Some(config.api_key),
                    "table" => Some(config.table),
                    _ => None,
                };
                Ok(value)
            } else {
                Ok(None)
            }
        }
        _ => anyhow::bail!("Unknown section: {section}. Valid sections: sink"),
    }
}

fn set_config_value(db: &Database, key: &str, value: &str) -> Result<()> {
    let (section, field) = split_key(key)?;

    match section {
        "sink" => {
            let mut config = db
                .get_sink_config()?
                .unwrap_or_else(|| SinkConfig::new(String::new(), String::new()));

            match field {
                "url" | "base_url" => config.base_url = value.to_string(),
                "api_key" | "key" => config.api_key = value.to_string(),
                "table" => config.table = value.to_string(),
                _ => anyhow::bail!("Unknown field: {field}. Valid fields: url, api_key, table"),
            }

            config.updated_at = chrono::Utc::now();
            db.upsert_sink_config(&config)?;
        }
        _ => anyhow::bail!("Unknown section: {section}. Valid sections: sink"),
    }

    Ok(())
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();

    if parts.len() != 2 {
        anyhow::bail!("Invalid key format. Use: <section>.<key> (e.g., sink.url)");
    }

    Ok((parts[0], parts[1]))
}
