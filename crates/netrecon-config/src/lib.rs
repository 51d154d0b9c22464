//! Configuration for the netrecon CLI.
//!
//! A TOML file at the platform config path, layered under `NETRECON_`
//! environment variables, and translated into a `netrecon_core::SyncPolicy`
//! for each run.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netrecon_core::cidr::MAX_PREFIX_LEN;
use netrecon_core::config::DEFAULT_AUTO_SUBNET_PREFIX;
use netrecon_core::{SubnetMatch, SyncPolicy};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
///
/// ```toml
/// [defaults]
/// output = "json"
///
/// [sync]
/// auto_create_subnets = true
/// subnet_match = "first-match"
///
/// [paths]
/// inventory = "/var/lib/netrecon/inventory.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub paths: Paths,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Reconciliation policy defaults. CLI flags override per run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub auto_create_subnets: bool,

    #[serde(default)]
    pub subnet_match: SubnetMatch,

    #[serde(default = "default_auto_subnet_prefix")]
    pub auto_subnet_prefix: u8,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_create_subnets: false,
            subnet_match: SubnetMatch::default(),
            auto_subnet_prefix: default_auto_subnet_prefix(),
        }
    }
}

fn default_auto_subnet_prefix() -> u8 {
    DEFAULT_AUTO_SUBNET_PREFIX
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Paths {
    /// Inventory snapshot (JSON). Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PathBuf>,

    /// Telemetry capture (JSON) used when `sync` gets no `--telemetry`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<PathBuf>,
}

impl Config {
    /// The run policy these settings describe.
    pub fn sync_policy(&self) -> Result<SyncPolicy, ConfigError> {
        let prefix = self.sync.auto_subnet_prefix;
        if prefix > MAX_PREFIX_LEN {
            return Err(ConfigError::Validation {
                field: "sync.auto_subnet_prefix".into(),
                reason: format!("must be between 0 and {MAX_PREFIX_LEN}, got {prefix}"),
            });
        }
        Ok(SyncPolicy {
            auto_create_subnets: self.sync.auto_create_subnets,
            subnet_match: self.sync.subnet_match,
            auto_subnet_prefix: prefix,
        })
    }

    /// Configured inventory path, else the platform default.
    pub fn inventory_path(&self) -> PathBuf {
        self.paths
            .inventory
            .clone()
            .unwrap_or_else(default_inventory_path)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "netrecon", "netrecon")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netrecon");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the inventory snapshot lives when nothing else is configured.
pub fn default_inventory_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("inventory.json"),
        |dirs| dirs.data_dir().join("inventory.json"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` layered under `NETRECON_*` variables.
///
/// Nested keys use a double underscore, e.g.
/// `NETRECON_SYNC__AUTO_CREATE_SUBNETS=true`. A missing file is not an
/// error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETRECON_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
