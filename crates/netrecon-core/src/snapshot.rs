// ── File-backed telemetry source ──
//
// Replays a JSON capture of raw RouterOS rows and Proxmox guest-agent
// payloads as if the devices were being polled live. Used by the CLI and
// by tests that need a realistic collaborator without a network.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::convert::{self, FromRouterOs, RawRow};
use crate::error::{CoreError, SourceError};
use crate::model::{
    ArpEntry, DeviceDescriptor, DeviceTelemetry, DhcpLease, ExposedService, InterfaceAddress,
    InterfaceInfo, PppSession, SystemInfo,
};
use crate::source::{DeviceSession, TelemetrySource};

/// Raw RouterOS command output, one field per menu.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterOsCapture {
    /// `/system/resource`
    #[serde(default)]
    pub system_resource: Option<RawRow>,
    /// `/interface`
    #[serde(default)]
    pub interfaces: Vec<RawRow>,
    /// `/ip/address`
    #[serde(default)]
    pub addresses: Vec<RawRow>,
    /// `/ip/arp`
    #[serde(default)]
    pub arp: Vec<RawRow>,
    /// `/ip/dhcp-server/lease`
    #[serde(default)]
    pub dhcp_leases: Vec<RawRow>,
    /// `/ppp/active`
    #[serde(default)]
    pub ppp_active: Vec<RawRow>,
    /// `/ip/service`
    #[serde(default)]
    pub services: Vec<RawRow>,
}

/// Where a VM lives on the hypervisor cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxmoxGuest {
    pub vmid: u32,
    pub node: String,
}

/// Everything captured for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCapture {
    pub descriptor: DeviceDescriptor,
    /// When set, opening a session fails with this reason.
    #[serde(default)]
    pub unreachable: Option<String>,
    #[serde(default)]
    pub routeros: RouterOsCapture,
    /// Proxmox `agent/network-get-interfaces` response, for VMs.
    #[serde(default)]
    pub guest_agent: Option<Value>,
    #[serde(default)]
    pub proxmox: Option<ProxmoxGuest>,
}

impl DeviceCapture {
    /// The descriptor, with hypervisor placement as notes when not set.
    fn descriptor(&self) -> DeviceDescriptor {
        let mut descriptor = self.descriptor.clone();
        if descriptor.notes.is_none() {
            descriptor.notes = self
                .proxmox
                .as_ref()
                .map(|vm| format!("Proxmox vmid={} node={}", vm.vmid, vm.node));
        }
        descriptor
    }

    fn telemetry(&self) -> DeviceTelemetry {
        let ros = &self.routeros;
        let system = ros
            .system_resource
            .as_ref()
            .and_then(SystemInfo::from_row)
            .unwrap_or_default();

        let mut addresses: Vec<InterfaceAddress> = convert::rows(&ros.addresses);
        if let Some(payload) = &self.guest_agent {
            addresses.extend(convert::guest_agent_interfaces(payload));
        }

        DeviceTelemetry {
            system,
            interfaces: convert::rows(&ros.interfaces),
            addresses,
            arp: convert::rows(&ros.arp),
            dhcp: convert::rows(&ros.dhcp_leases),
            ppp: convert::rows(&ros.ppp_active),
            services: convert::rows(&ros.services),
        }
    }
}

/// Top-level capture document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default)]
    pub devices: Vec<DeviceCapture>,
}

/// A [`TelemetrySource`] backed by a [`TelemetrySnapshot`].
pub struct SnapshotSource {
    descriptors: Vec<DeviceDescriptor>,
    captures: HashMap<String, Arc<DeviceCapture>>,
}

impl SnapshotSource {
    pub fn new(snapshot: TelemetrySnapshot) -> Self {
        let descriptors = snapshot
            .devices
            .iter()
            .map(DeviceCapture::descriptor)
            .collect();
        let captures = snapshot
            .devices
            .into_iter()
            .map(|d| (d.descriptor.name.clone(), Arc::new(d)))
            .collect();
        Self {
            descriptors,
            captures,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self::new)
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let snapshot_err = |reason: String| CoreError::Snapshot {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| snapshot_err(e.to_string()))?;
        Self::from_json(&raw).map_err(|e| snapshot_err(e.to_string()))
    }

    /// Devices in capture order; this is the run's device list.
    pub fn descriptors(&self) -> &[DeviceDescriptor] {
        &self.descriptors
    }
}

impl TelemetrySource for SnapshotSource {
    type Session = SnapshotSession;

    async fn open(&self, device: &DeviceDescriptor) -> Result<SnapshotSession, SourceError> {
        let capture =
            self.captures
                .get(&device.name)
                .ok_or_else(|| SourceError::ConnectionFailed {
                    device: device.name.clone(),
                    reason: "no capture recorded for this device".into(),
                })?;
        if let Some(reason) = &capture.unreachable {
            return Err(SourceError::ConnectionFailed {
                device: device.name.clone(),
                reason: reason.clone(),
            });
        }
        debug!(device = %device.name, "replaying captured telemetry");
        Ok(SnapshotSession {
            telemetry: capture.telemetry(),
        })
    }
}

/// Session over one device's converted capture.
pub struct SnapshotSession {
    telemetry: DeviceTelemetry,
}

impl DeviceSession for SnapshotSession {
    async fn system_info(&self) -> Result<SystemInfo, SourceError> {
        Ok(self.telemetry.system.clone())
    }

    async fn interfaces(&self) -> Result<Vec<InterfaceInfo>, SourceError> {
        Ok(self.telemetry.interfaces.clone())
    }

    async fn interface_addresses(&self) -> Result<Vec<InterfaceAddress>, SourceError> {
        Ok(self.telemetry.addresses.clone())
    }

    async fn arp_entries(&self) -> Result<Vec<ArpEntry>, SourceError> {
        Ok(self.telemetry.arp.clone())
    }

    async fn dhcp_leases(&self) -> Result<Vec<DhcpLease>, SourceError> {
        Ok(self.telemetry.dhcp.clone())
    }

    async fn ppp_sessions(&self) -> Result<Vec<PppSession>, SourceError> {
        Ok(self.telemetry.ppp.clone())
    }

    async fn services(&self) -> Result<Vec<ExposedService>, SourceError> {
        Ok(self.telemetry.services.clone())
    }

    async fn close(self) {}
}
