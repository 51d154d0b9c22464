// ── Sync policy ──
//
// Per-run knobs supplied by the caller. Loaded from TOML by
// `netrecon-config`, overridable from CLI flags.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default prefix length for auto-provisioned subnets.
pub const DEFAULT_AUTO_SUBNET_PREFIX: u8 = 24;

/// How the subnet resolver picks among several containing subnets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SubnetMatch {
    /// First containing subnet in stable enumeration order.
    FirstMatch,
    /// Longest prefix wins; equal prefixes keep enumeration order.
    #[default]
    MostSpecific,
}

/// Policy for a single reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    /// Create a subnet for addresses that match none of the known subnets.
    pub auto_create_subnets: bool,
    pub subnet_match: SubnetMatch,
    /// Prefix length of auto-provisioned subnets (0..=32).
    pub auto_subnet_prefix: u8,
}

impl SyncPolicy {
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create_subnets = enabled;
        self
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            auto_create_subnets: false,
            subnet_match: SubnetMatch::default(),
            auto_subnet_prefix: DEFAULT_AUTO_SUBNET_PREFIX,
        }
    }
}
