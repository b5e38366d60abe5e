use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use gateway_core::proxy::{CredentialPool, PersistenceWorker, StorageAdapter};
use gateway_types::models::{CredentialRecord, CredentialSummary, GatewayConfig};
use std::path::Path;
use std::sync::Arc;

use crate::bootstrap::open_pool;
use crate::cli::CredentialCommands;

pub async fn handle(cmd: CredentialCommands, config: &GatewayConfig) -> Result<()> {
    let (storage, pool) = open_pool(config).await?;

    match cmd {
        CredentialCommands::List { json } => list_credentials(&pool, json),
        CredentialCommands::Add { file, id, project_id } => {
            let record = read_credential_file(&file, id, project_id)?;
            let id = record.id.clone();
            match pool.upsert(record) {
                Some(old) if old != id => {
                    println!("{} Added {} (replaced {} with the same email)", "✓".green(), id, old);
                },
                Some(_) => println!("{} Replaced {}", "✓".green(), id),
                None => println!("{} Added {}", "✓".green(), id),
            }
            persist(pool, storage, config).await
        },
        CredentialCommands::Remove { id } => {
            pool.delete(&id).map_err(|e| anyhow::anyhow!(e))?;
            println!("{} Removed {}", "✓".green(), id);
            persist(pool, storage, config).await
        },
        CredentialCommands::Disable { id } => {
            pool.set_disabled(&id, true).map_err(|e| anyhow::anyhow!(e))?;
            println!("{} Disabled {}", "✓".green(), id);
            persist(pool, storage, config).await
        },
        CredentialCommands::Enable { id } => {
            pool.set_disabled(&id, false).map_err(|e| anyhow::anyhow!(e))?;
            println!("{} Enabled {}", "✓".green(), id);
            persist(pool, storage, config).await
        },
    }
}

/// Build a record from a credential JSON file. The id defaults to the file name.
pub fn read_credential_file(
    path: &Path,
    id: Option<String>,
    project_id: Option<String>,
) -> Result<CredentialRecord> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let credential: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))?;

    let id = match id {
        Some(id) => id,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .context("Cannot derive an id from the file name, pass --id")?,
    };

    let mut record = CredentialRecord::new(id, credential);
    if record.access_token().is_none() {
        anyhow::bail!("{} has no access_token", path.display());
    }
    record.project_id = project_id;
    Ok(record)
}

async fn persist(
    pool: Arc<CredentialPool>,
    storage: Arc<dyn StorageAdapter>,
    config: &GatewayConfig,
) -> Result<()> {
    // The worker treats the freshly loaded version as flushed, so only the
    // mutation above is written.
    let worker = PersistenceWorker::new(pool, storage, &config.persistence);
    worker.flush_once().await.context("Failed to write credential storage")?;
    Ok(())
}

fn list_credentials(pool: &CredentialPool, json: bool) -> Result<()> {
    let summaries = pool.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{}", "No credentials found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Email", "Project", "Calls", "Errors", "Recent codes", "Status"]);

    for summary in &summaries {
        table.add_row(vec![
            Cell::new(&summary.id),
            Cell::new(summary.user_email.as_deref().unwrap_or("-")),
            Cell::new(summary.project_id.as_deref().unwrap_or("-")),
            Cell::new(summary.total_calls),
            Cell::new(summary.total_errors),
            Cell::new(recent_codes(summary)),
            status_cell(summary),
        ]);
    }

    let stats = pool.stats();
    println!("{table}");
    println!("\n{} credentials total, {} enabled", stats.total, stats.enabled);
    Ok(())
}

fn status_cell(summary: &CredentialSummary) -> Cell {
    if summary.disabled {
        Cell::new("Disabled").fg(Color::Red)
    } else if !summary.cooling_models.is_empty() {
        Cell::new(format!("Cooling ({})", summary.cooling_models.join(", "))).fg(Color::Yellow)
    } else {
        Cell::new("Active").fg(Color::Green)
    }
}

fn recent_codes(summary: &CredentialSummary) -> String {
    if summary.error_codes.is_empty() {
        return "-".to_string();
    }
    summary.error_codes.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(",")
}
