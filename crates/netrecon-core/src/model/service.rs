// ── Service domain type ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

/// A listener exposed by a device, upserted by `(device_id, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: EntityId,
    pub device_id: EntityId,
    pub name: String,
    pub protocol: Protocol,
    pub port: u16,
    /// NAT / port-forward port, maintained by operators.
    pub external_port: Option<u16>,
    pub enabled: bool,
}
