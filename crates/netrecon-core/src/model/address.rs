// ── IP address records ──

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::{EntityId, MacAddress};

/// Lifecycle status of an address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IpStatus {
    #[default]
    Available,
    Reserved,
    Assigned,
}

/// What a subscriber tunnel uses the address for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Purpose {
    #[serde(rename = "PPPoE")]
    #[strum(serialize = "PPPoE")]
    Pppoe,
    #[serde(rename = "L2TP")]
    #[strum(serialize = "L2TP")]
    L2tp,
}

impl Purpose {
    /// Map a PPP session's service type. Only `pppoe` and `l2tp` qualify.
    pub fn from_service_type(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pppoe" => Some(Self::Pppoe),
            "l2tp" => Some(Self::L2tp),
            _ => None,
        }
    }
}

/// One IP address in the inventory. `(address, subnet_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRecord {
    pub id: EntityId,
    pub address: Ipv4Addr,
    pub subnet_id: EntityId,
    pub status: IpStatus,
    pub device_id: Option<EntityId>,
    pub interface: Option<String>,
    pub fqdn: Option<String>,
    pub purpose: Option<Purpose>,
    /// PPP session username. Stored in a column older schemas lack.
    pub ppp_name: Option<String>,
    pub mac: Option<MacAddress>,
    pub last_seen: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl IpRecord {
    /// A blank, available record for `address` in `subnet_id`.
    pub fn new(address: Ipv4Addr, subnet_id: EntityId) -> Self {
        Self {
            id: EntityId::generate(),
            address,
            subnet_id,
            status: IpStatus::Available,
            device_id: None,
            interface: None,
            fqdn: None,
            purpose: None,
            ppp_name: None,
            mac: None,
            last_seen: None,
            notes: None,
        }
    }
}
