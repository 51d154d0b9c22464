// ── Schema migrations ──
//
// Versioned, idempotent column additions. Run by the deployer (or the CLI
// ahead of a sync), never from inside the merge.

use serde::Serialize;
use tracing::{debug, info};

use super::{SchemaStore, Table};
use crate::error::StoreError;

struct Migration {
    version: u32,
    table: Table,
    column: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        table: Table::Device,
        column: "mac",
    },
    Migration {
        version: 2,
        table: Table::IpAddress,
        column: "ppp_name",
    },
];

/// Highest schema version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Outcome of [`apply_migrations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Versions applied by this call, ascending.
    pub applied: Vec<u32>,
    /// Schema version after the call.
    pub version: u32,
}

/// Bring `store` up to [`latest_version`].
///
/// Safe to run repeatedly: versions at or below the recorded schema version
/// are skipped, and a column that already exists (added by hand, say) is
/// not re-added.
pub fn apply_migrations<S: SchemaStore + ?Sized>(
    store: &S,
) -> Result<MigrationReport, StoreError> {
    let start = store.schema_version()?;
    let mut version = start;
    let mut applied = Vec::new();

    for m in MIGRATIONS.iter().filter(|m| m.version > start) {
        if store.has_column(m.table, m.column)? {
            debug!(table = %m.table, column = m.column, "column already present");
        } else {
            store.add_column(m.table, m.column)?;
            info!(version = m.version, table = %m.table, column = m.column, "added column");
        }
        store.set_schema_version(m.version)?;
        version = m.version;
        applied.push(m.version);
    }

    Ok(MigrationReport { applied, version })
}
