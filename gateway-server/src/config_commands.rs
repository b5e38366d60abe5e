use anyhow::{Context, Result};
use colored::Colorize;
use gateway_types::models::GatewayConfig;
use std::path::Path;

use crate::bootstrap::masked;

pub fn show_config(config: &GatewayConfig, path: &Path, json: bool) -> Result<()> {
    let shown = masked(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("{} {}", "Configuration:".cyan().bold(), path.display());
    println!("  Listen:          {}", shown.server.get_socket_addr());
    println!("  API key:         {}", shown.server.api_key.as_deref().unwrap_or("(open)"));
    println!("  Admin API:       {}", if shown.server.admin_key.is_some() { "enabled" } else { "disabled" });
    println!("  Upstream:        {}", shown.upstream.base_url);
    println!("  Rotation:        every {} calls", shown.pool.calls_per_rotation);
    println!(
        "  Auto-ban:        {} (codes {:?}, threshold {})",
        if shown.pool.auto_ban.enabled { "on" } else { "off" },
        shown.pool.auto_ban.codes,
        shown.pool.auto_ban.threshold
    );
    println!(
        "  429 retry:       {} ({} retries, {} ms step)",
        if shown.retry.enabled { "on" } else { "off" },
        shown.retry.max_retries,
        shown.retry.interval_ms
    );
    println!(
        "  Anti-truncation: {} ({} continuations)",
        if shown.anti_truncation.always_on { "always" } else { "done-marker models only" },
        shown.anti_truncation.max_attempts
    );
    println!("  Storage:         {}", shown.persistence.backend);
    println!("  Models:          {}", shown.models.join(", "));
    Ok(())
}

pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    gateway_core::config::save_config(path, &GatewayConfig::default())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Wrote default configuration to {}", "✓".green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("gateway_config.json");
        init_config(&path, false).unwrap_or_else(|e| panic!("{e}"));
        assert!(init_config(&path, false).is_err());
        init_config(&path, true).unwrap_or_else(|e| panic!("{e}"));

        let written = gateway_core::config::load_config(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(written, GatewayConfig::default());
    }
}
