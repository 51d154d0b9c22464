// ── Inventory store ──
//
// Capabilities the reconciler needs from the persistent store, expressed as
// traits so the merge can run against any backend (or a test double).

pub(crate) mod collection;
pub mod memory;
pub mod migrate;

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::StoreError;
use crate::model::{Device, DeviceClass, EntityId, IpRecord, MacAddress, Service, Subnet};

/// Tables whose schema evolves through [`migrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Device,
    IpAddress,
}

/// Find / create / update operations over the IPAM inventory.
///
/// Implementations must give read-then-write consistency for a single
/// caller: a `create_ip` following a `find_ip` miss for the same key must
/// not produce a duplicate row.
pub trait IpamRepository: Send + Sync {
    /// All subnets in stable enumeration order.
    fn list_subnets(&self) -> Result<Vec<Subnet>, StoreError>;
    fn create_subnet(&self, subnet: Subnet) -> Result<Subnet, StoreError>;

    /// First device of `class` whose management address or name matches.
    /// A blank `management_address` never matches.
    fn find_device(
        &self,
        management_address: &str,
        name: &str,
        class: DeviceClass,
    ) -> Result<Option<Device>, StoreError>;
    /// Point lookup on the MAC column. Yields `None` when the column does
    /// not exist yet.
    fn find_device_by_mac(&self, mac: &MacAddress) -> Result<Option<Device>, StoreError>;
    /// Persist a new device. The `mac` field is not written here.
    fn create_device(&self, device: Device) -> Result<Device, StoreError>;
    /// Overwrite a device's fields, except `mac`.
    fn update_device(&self, device: Device) -> Result<Device, StoreError>;
    fn set_device_mac(&self, id: &EntityId, mac: &MacAddress) -> Result<(), StoreError>;

    fn find_ip(
        &self,
        address: Ipv4Addr,
        subnet_id: &EntityId,
    ) -> Result<Option<IpRecord>, StoreError>;
    fn create_ip(&self, record: IpRecord) -> Result<IpRecord, StoreError>;
    fn update_ip(&self, record: IpRecord) -> Result<IpRecord, StoreError>;

    fn find_service(&self, device_id: &EntityId, name: &str)
    -> Result<Option<Service>, StoreError>;
    fn create_service(&self, service: Service) -> Result<Service, StoreError>;
    fn update_service(&self, service: Service) -> Result<Service, StoreError>;
}

/// Schema introspection and evolution, used only by [`migrate`].
pub trait SchemaStore: Send + Sync {
    fn has_column(&self, table: Table, column: &str) -> Result<bool, StoreError>;
    /// Add a nullable column. Adding an existing column is a no-op.
    fn add_column(&self, table: Table, column: &str) -> Result<(), StoreError>;
    fn schema_version(&self) -> Result<u32, StoreError>;
    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
