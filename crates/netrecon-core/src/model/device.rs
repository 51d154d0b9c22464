// ── Device domain type ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::{EntityId, MacAddress};

/// Coarse device class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceClass {
    #[default]
    Router,
    Vm,
    Other,
}

/// The canonical Device row.
///
/// Keyed loosely by management address or name; there is no hard unique
/// constraint. `mac` is the secondary identity key and lives in a column
/// that older schemas lack, so repositories write it only through
/// [`IpamRepository::set_device_mac`](crate::store::IpamRepository::set_device_mac).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    pub name: String,
    pub class: DeviceClass,
    pub management_address: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub os_version: Option<String>,
    pub mac: Option<MacAddress>,
    pub notes: Option<String>,
}
