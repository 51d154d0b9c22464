//! Network-inventory reconciliation engine.
//!
//! Polls telemetry from managed routers and hypervisors and folds it into a
//! canonical, deduplicated IPAM inventory:
//!
//! - **[`cidr`]**: IPv4 containment arithmetic. Malformed blocks never match
//!   and never error, so one bad subnet row cannot abort a resolution pass.
//!
//! - **[`Reconciler`]**: Drives the per-device pipeline sequentially:
//!   open a session with the [`TelemetrySource`], fetch all telemetry batches
//!   concurrently, resolve device identity, merge address observations, and
//!   upsert services. Per-device failures land in the [`SyncReport`] instead
//!   of aborting the run.
//!
//! - **[`IpamRepository`]**: Injected store capabilities (find / create /
//!   update by key). [`InMemoryStore`] is the bundled implementation and
//!   round-trips through [`InventorySnapshot`] documents.
//!
//! - **[`convert`]**: Maps loosely-typed RouterOS rows and Proxmox
//!   guest-agent payloads into the typed telemetry records the merge expects.
//!
//! - **Domain model** ([`model`]): `Site`, `Vlan`, `Subnet`, `Device`,
//!   `IpRecord`, `Service`, keyed by [`EntityId`].

pub mod cidr;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod snapshot;
pub mod source;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cidr::{Cidr, in_subnet};
pub use config::{SubnetMatch, SyncPolicy};
pub use error::{CidrError, CoreError, SourceError, StoreError};
pub use reconcile::{Reconciler, SyncReport};
pub use snapshot::SnapshotSource;
pub use source::{DeviceSession, TelemetrySource};
pub use store::memory::{InMemoryStore, InventorySnapshot};
pub use store::migrate::{MigrationReport, apply_migrations};
pub use store::{IpamRepository, SchemaStore, Table};

pub use model::{
    ArpEntry, Device, DeviceClass, DeviceDescriptor, DeviceTelemetry, DhcpLease, EntityId,
    ExposedService, InterfaceAddress, InterfaceInfo, IpRecord, IpStatus, MacAddress,
    PppSession, Protocol, Purpose, Service, Site, Subnet, SystemInfo, Vlan,
};
