// ── Core error types ──
//
// `CoreError` is what callers of the engine see. Store and telemetry
// failures keep their own enums so the reconciler can tell a per-record
// write failure (recorded, processing continues) from a per-device fetch
// failure (recorded, device skipped).

use thiserror::Error;

use crate::store::Table;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Telemetry error: {0}")]
    Source(#[from] SourceError),

    #[error("Invalid CIDR: {0}")]
    Cidr(#[from] CidrError),

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Cannot read telemetry snapshot {path}: {reason}")]
    Snapshot { path: String, reason: String },
}

/// Failures raised by an [`IpamRepository`](crate::store::IpamRepository)
/// or [`SchemaStore`](crate::store::SchemaStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("column {table}.{column} does not exist (run migrations)")]
    MissingColumn { table: Table, column: String },

    #[error("{entity} '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("store backend failure: {message}")]
    Backend { message: String },
}

/// Failures raised by the device polling collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot connect to {device}: {reason}")]
    ConnectionFailed { device: String, reason: String },

    #[error("authentication rejected by {device}")]
    AuthenticationFailed { device: String },
}

/// Why a `network/prefix` string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("'{0}' has no '/prefix' part")]
    MissingPrefix(String),

    #[error("'{0}' is not an IPv4 network address")]
    InvalidNetwork(String),

    #[error("'{0}' is not a numeric prefix length")]
    InvalidPrefix(String),

    #[error("prefix length {0} exceeds 32")]
    PrefixTooLong(u8),
}
