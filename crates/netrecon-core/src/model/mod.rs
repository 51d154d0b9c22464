// ── Domain model ──
//
// Canonical inventory rows plus the typed telemetry records fed into the
// reconciler.

pub mod address;
pub mod device;
pub mod entity_id;
pub mod service;
pub mod site;
pub mod subnet;
pub mod telemetry;

pub use address::{IpRecord, IpStatus, Purpose};
pub use device::{Device, DeviceClass};
pub use entity_id::{EntityId, MacAddress};
pub use service::{Protocol, Service};
pub use site::{Site, Vlan};
pub use subnet::Subnet;
pub use telemetry::{
    ArpEntry, DeviceDescriptor, DeviceTelemetry, DhcpLease, ExposedService, InterfaceAddress,
    InterfaceInfo, PppSession, SystemInfo,
};
