// ── Typed telemetry records ──
//
// What the polling collaborator hands the engine for one device. Vendor
// key names never get past `convert`; everything here is already typed.

use serde::{Deserialize, Serialize};

use super::address::Purpose;
use super::device::DeviceClass;
use super::entity_id::MacAddress;

/// A managed device as configured by operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub management_address: String,
    #[serde(default)]
    pub class: DeviceClass,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub os_version: Option<String>,
    /// Configured MAC, if operators recorded one.
    pub mac: Option<String>,
    /// Free-form provenance written to a newly created Device row.
    pub notes: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, management_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            management_address: management_address.into(),
            class: DeviceClass::default(),
            vendor: None,
            model: None,
            os_version: None,
            mac: None,
            notes: None,
        }
    }

    /// The management address, or `None` when blank (hypervisor VMs).
    pub fn management(&self) -> Option<&str> {
        Some(self.management_address.trim()).filter(|a| !a.is_empty())
    }
}

/// Hardware / software facts reported by the device itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub model: Option<String>,
    pub os_version: Option<String>,
}

/// A physical or logical interface, used to find the device's own MAC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub mac: Option<MacAddress>,
}

/// An address configured on one of the device's interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    /// `a.b.c.d/NN` as reported.
    pub address: String,
    pub interface: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub address: String,
    pub mac: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpLease {
    pub address: String,
    pub mac: Option<String>,
    pub host_name: Option<String>,
}

/// An active PPP session terminated on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PppSession {
    pub username: String,
    /// `pppoe`, `l2tp`, or anything else (ignored by the merge).
    pub service_type: String,
    pub peer_address: String,
    /// MAC for PPPoE, remote IP for L2TP.
    pub caller_id: Option<String>,
}

impl PppSession {
    pub fn purpose(&self) -> Option<Purpose> {
        Purpose::from_service_type(&self.service_type)
    }
}

/// A management listener (`/ip/service`) on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedService {
    pub name: String,
    pub port: u16,
    pub disabled: bool,
}

/// Every batch fetched for one device in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTelemetry {
    pub system: SystemInfo,
    pub interfaces: Vec<InterfaceInfo>,
    pub addresses: Vec<InterfaceAddress>,
    pub arp: Vec<ArpEntry>,
    pub dhcp: Vec<DhcpLease>,
    pub ppp: Vec<PppSession>,
    pub services: Vec<ExposedService>,
}
