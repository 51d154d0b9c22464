// ── Run report ──

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Outcome of one [`run_sync`](super::Reconciler::run_sync) call.
///
/// Serialized in camelCase (`createdIPs`, `updatedDevices`, ...). Errors are
/// data: a report with a non-empty `errors` list is still a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Observations merged into a subnet.
    pub processed: usize,
    #[serde(rename = "createdIPs")]
    pub created_ips: usize,
    #[serde(rename = "updatedIPs")]
    pub updated_ips: usize,
    pub created_devices: usize,
    pub updated_devices: usize,
    #[serde(default)]
    pub created_subnets: usize,
    #[serde(default)]
    pub upserted_services: usize,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn record_error(&mut self, message: String) {
        warn!(%message, "sync error recorded");
        self.errors.push(message);
    }
}
