//! Shared helpers for command handlers: config resolution and inventory
//! load/save.

use std::path::{Path, PathBuf};

use tracing::debug;

use netrecon_config::Config;
use netrecon_core::{InMemoryStore, InventorySnapshot, SubnetMatch, SyncPolicy};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat, SubnetMatchArg};
use crate::error::CliError;

/// Config file in effect: `--config`, else the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(netrecon_config::config_path)
}

pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let cfg = match &global.config {
        Some(path) => netrecon_config::load_config_from(path)?,
        None => netrecon_config::load_config()?,
    };
    Ok(cfg)
}

/// Inventory file in effect: `--inventory`, else config, else platform default.
pub fn inventory_path(global: &GlobalOpts, cfg: &Config) -> PathBuf {
    global
        .inventory
        .clone()
        .unwrap_or_else(|| cfg.inventory_path())
}

/// `--output`, else the configured default, else table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        match cfg.defaults.output.as_str() {
            "json" => OutputFormat::Json,
            "json-compact" => OutputFormat::JsonCompact,
            "yaml" => OutputFormat::Yaml,
            "plain" => OutputFormat::Plain,
            _ => OutputFormat::Table,
        }
    })
}

/// `--color`, else `defaults.color`, else auto.
pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global.color.unwrap_or_else(|| match cfg.defaults.color.as_str() {
        "always" => ColorMode::Always,
        "never" => ColorMode::Never,
        _ => ColorMode::Auto,
    })
}

pub fn subnet_match(arg: SubnetMatchArg) -> SubnetMatch {
    match arg {
        SubnetMatchArg::FirstMatch => SubnetMatch::FirstMatch,
        SubnetMatchArg::MostSpecific => SubnetMatch::MostSpecific,
    }
}

/// Configured policy with a per-invocation strategy override.
pub fn policy(cfg: &Config, strategy: Option<SubnetMatchArg>) -> Result<SyncPolicy, CliError> {
    let mut policy = cfg.sync_policy()?;
    if let Some(arg) = strategy {
        policy.subnet_match = subnet_match(arg);
    }
    Ok(policy)
}

fn inventory_err(path: &Path, reason: impl ToString) -> CliError {
    CliError::Inventory {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Load the inventory at `path`. A missing file is an empty inventory.
pub fn load_inventory(path: &Path) -> Result<InMemoryStore, CliError> {
    if !path.exists() {
        debug!(path = %path.display(), "no inventory yet; starting empty");
        return Ok(InMemoryStore::new());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| inventory_err(path, e))?;
    let snapshot: InventorySnapshot =
        serde_json::from_str(&raw).map_err(|e| inventory_err(path, e))?;
    Ok(InMemoryStore::from_snapshot(snapshot))
}

/// Write the inventory to `path`, replacing it atomically.
pub fn save_inventory(store: &InMemoryStore, path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&store.to_snapshot())?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "inventory saved");
    Ok(())
}
