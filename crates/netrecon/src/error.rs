//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netrecon_config::ConfigError;
use netrecon_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Telemetry ────────────────────────────────────────────────────

    #[error("No telemetry capture to sync from")]
    #[diagnostic(
        code(netrecon::no_telemetry),
        help(
            "Pass --telemetry <FILE>, or set paths.telemetry in {config_path}"
        )
    )]
    NoTelemetry { config_path: String },

    #[error("Cannot read telemetry capture {path}")]
    #[diagnostic(
        code(netrecon::telemetry),
        help("The capture must be a JSON document with a top-level \"devices\" array.\n{reason}")
    )]
    Telemetry { path: String, reason: String },

    // ── Inventory ────────────────────────────────────────────────────

    #[error("Cannot load inventory {path}: {reason}")]
    #[diagnostic(
        code(netrecon::inventory),
        help("Fix or move the file; a missing inventory is created on the next sync.")
    )]
    Inventory { path: String, reason: String },

    #[error("Inventory store failure: {message}")]
    #[diagnostic(code(netrecon::store), help("Try: netrecon migrate"))]
    Store { message: String },

    #[error("{resource_type} for '{identifier}' not found")]
    #[diagnostic(code(netrecon::not_found), help("{hint}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(netrecon::conflict), help("{hint}"))]
    Conflict {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netrecon::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(netrecon::config))]
    Config(Box<figment::Error>),

    #[error("Internal error: {0}")]
    #[diagnostic(code(netrecon::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(netrecon::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NoTelemetry { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            // per-device fetch failures are reported by the sync, not raised
            CoreError::Source(e) => CliError::Internal(e.to_string()),

            CoreError::Store(e) => CliError::Store {
                message: e.to_string(),
            },

            CoreError::Cidr(e) => CliError::Validation {
                field: "cidr".into(),
                reason: e.to_string(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Snapshot { path, reason } => CliError::Telemetry { path, reason },
        }
    }
}

impl From<netrecon_core::StoreError> for CliError {
    fn from(err: netrecon_core::StoreError) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
