// ── In-memory inventory store ──
//
// Lock-free `IpamRepository` + `SchemaStore` implementation. The CLI loads
// it from an `InventorySnapshot` JSON document before a run and writes it
// back afterwards.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashSet;
use serde::{Deserialize, Serialize};

use super::collection::EntityCollection;
use super::{IpamRepository, SchemaStore, Table};
use crate::error::StoreError;
use crate::model::{
    Device, DeviceClass, EntityId, IpRecord, MacAddress, Service, Site, Subnet, Vlan,
};

const MAC_COLUMN: &str = "mac";
const PPP_NAME_COLUMN: &str = "ppp_name";

fn site_key(id: &EntityId) -> String {
    format!("site:{id}")
}

fn vlan_key(id: &EntityId) -> String {
    format!("vlan:{id}")
}

fn subnet_key(id: &EntityId) -> String {
    format!("net:{id}")
}

fn device_key(id: &EntityId) -> String {
    format!("dev:{id}")
}

fn ip_key(address: Ipv4Addr, subnet_id: &EntityId) -> String {
    format!("ip:{address}@{subnet_id}")
}

fn service_key(device_id: &EntityId, name: &str) -> String {
    format!("svc:{device_id}:{name}")
}

/// A column added by a migration, as recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Table,
    pub column: String,
}

/// Serializable image of the whole inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub schema_version: u32,
    /// Optional columns present in this inventory's schema.
    #[serde(default)]
    pub columns: Vec<ColumnRef>,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub vlans: Vec<Vlan>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub ip_addresses: Vec<IpRecord>,
    #[serde(default)]
    pub services: Vec<Service>,
}

/// Concurrent in-memory inventory.
///
/// A fresh store starts at schema version 0 (no `device.mac`, no
/// `ip_address.ppp_name`); run [`apply_migrations`](super::migrate::apply_migrations)
/// before syncing into it.
pub struct InMemoryStore {
    sites: EntityCollection<Site>,
    vlans: EntityCollection<Vlan>,
    subnets: EntityCollection<Subnet>,
    devices: EntityCollection<Device>,
    ips: EntityCollection<IpRecord>,
    services: EntityCollection<Service>,
    columns: DashSet<(Table, String)>,
    version: AtomicU32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sites: EntityCollection::new(),
            vlans: EntityCollection::new(),
            subnets: EntityCollection::new(),
            devices: EntityCollection::new(),
            ips: EntityCollection::new(),
            services: EntityCollection::new(),
            columns: DashSet::new(),
            version: AtomicU32::new(0),
        }
    }

    /// Rebuild a store from a snapshot, preserving row order.
    pub fn from_snapshot(snap: InventorySnapshot) -> Self {
        let store = Self::new();
        store.version.store(snap.schema_version, Ordering::SeqCst);
        for col in snap.columns {
            store.columns.insert((col.table, col.column));
        }
        for s in snap.sites {
            store.sites.upsert(site_key(&s.id), s);
        }
        for v in snap.vlans {
            store.vlans.upsert(vlan_key(&v.id), v);
        }
        for n in snap.subnets {
            store.subnets.upsert(subnet_key(&n.id), n);
        }
        for d in snap.devices {
            store.devices.upsert(device_key(&d.id), d);
        }
        for ip in snap.ip_addresses {
            store.ips.upsert(ip_key(ip.address, &ip.subnet_id), ip);
        }
        for svc in snap.services {
            store
                .services
                .upsert(service_key(&svc.device_id, &svc.name), svc);
        }
        store
    }

    /// Capture the current contents.
    pub fn to_snapshot(&self) -> InventorySnapshot {
        let mut columns: Vec<ColumnRef> = self
            .columns
            .iter()
            .map(|c| ColumnRef {
                table: c.0,
                column: c.1.clone(),
            })
            .collect();
        columns.sort_by(|a, b| {
            (a.table.to_string(), &a.column).cmp(&(b.table.to_string(), &b.column))
        });

        InventorySnapshot {
            schema_version: self.version.load(Ordering::SeqCst),
            columns,
            sites: owned(self.sites.snapshot()),
            vlans: owned(self.vlans.snapshot()),
            subnets: owned(self.subnets.snapshot()),
            devices: owned(self.devices.snapshot()),
            ip_addresses: owned(self.ips.snapshot()),
            services: owned(self.services.snapshot()),
        }
    }

    pub fn devices(&self) -> Vec<Device> {
        owned(self.devices.snapshot())
    }

    pub fn ip_records(&self) -> Vec<IpRecord> {
        owned(self.ips.snapshot())
    }

    pub fn services(&self) -> Vec<Service> {
        owned(self.services.snapshot())
    }

    pub fn ip_count(&self) -> usize {
        self.ips.len()
    }

    fn require_column(&self, table: Table, column: &str) -> Result<(), StoreError> {
        if self.columns.contains(&(table, column.to_owned())) {
            Ok(())
        } else {
            Err(StoreError::MissingColumn {
                table,
                column: column.to_owned(),
            })
        }
    }

    fn check_ip_columns(&self, record: &IpRecord) -> Result<(), StoreError> {
        if record.ppp_name.is_some() {
            self.require_column(Table::IpAddress, PPP_NAME_COLUMN)?;
        }
        Ok(())
    }
}

fn owned<T: Clone>(rows: Vec<std::sync::Arc<T>>) -> Vec<T> {
    rows.into_iter().map(|r| T::clone(&r)).collect()
}

impl IpamRepository for InMemoryStore {
    fn list_subnets(&self) -> Result<Vec<Subnet>, StoreError> {
        Ok(owned(self.subnets.snapshot()))
    }

    fn create_subnet(&self, subnet: Subnet) -> Result<Subnet, StoreError> {
        let key = subnet_key(&subnet.id);
        if self.subnets.contains(&key) {
            return Err(StoreError::Duplicate {
                entity: "subnet",
                key: subnet.id.to_string(),
            });
        }
        self.subnets.upsert(key, subnet.clone());
        Ok(subnet)
    }

    fn find_device(
        &self,
        management_address: &str,
        name: &str,
        class: DeviceClass,
    ) -> Result<Option<Device>, StoreError> {
        let address = Some(management_address.trim()).filter(|a| !a.is_empty());
        Ok(self
            .devices
            .find(|d| {
                d.class == class
                    && ((address.is_some() && d.management_address.as_deref() == address)
                        || d.name == name)
            })
            .map(|d| Device::clone(&d)))
    }

    fn find_device_by_mac(&self, mac: &MacAddress) -> Result<Option<Device>, StoreError> {
        if self.require_column(Table::Device, MAC_COLUMN).is_err() {
            return Ok(None);
        }
        Ok(self
            .devices
            .find(|d| d.mac.as_ref() == Some(mac))
            .map(|d| Device::clone(&d)))
    }

    fn create_device(&self, mut device: Device) -> Result<Device, StoreError> {
        let key = device_key(&device.id);
        if self.devices.contains(&key) {
            return Err(StoreError::Duplicate {
                entity: "device",
                key: device.id.to_string(),
            });
        }
        device.mac = None;
        self.devices.upsert(key, device.clone());
        Ok(device)
    }

    fn update_device(&self, mut device: Device) -> Result<Device, StoreError> {
        let key = device_key(&device.id);
        let existing = self.devices.get(&key).ok_or_else(|| StoreError::NotFound {
            entity: "device",
            key: device.id.to_string(),
        })?;
        device.mac.clone_from(&existing.mac);
        self.devices.upsert(key, device.clone());
        Ok(device)
    }

    fn set_device_mac(&self, id: &EntityId, mac: &MacAddress) -> Result<(), StoreError> {
        self.require_column(Table::Device, MAC_COLUMN)?;
        let key = device_key(id);
        let existing = self.devices.get(&key).ok_or_else(|| StoreError::NotFound {
            entity: "device",
            key: id.to_string(),
        })?;
        let mut device = Device::clone(&existing);
        device.mac = Some(mac.clone());
        self.devices.upsert(key, device);
        Ok(())
    }

    fn find_ip(
        &self,
        address: Ipv4Addr,
        subnet_id: &EntityId,
    ) -> Result<Option<IpRecord>, StoreError> {
        Ok(self
            .ips
            .get(&ip_key(address, subnet_id))
            .map(|r| IpRecord::clone(&r)))
    }

    fn create_ip(&self, record: IpRecord) -> Result<IpRecord, StoreError> {
        self.check_ip_columns(&record)?;
        let key = ip_key(record.address, &record.subnet_id);
        if self.ips.contains(&key) {
            return Err(StoreError::Duplicate {
                entity: "ip address",
                key: format!("{} in subnet {}", record.address, record.subnet_id),
            });
        }
        self.ips.upsert(key, record.clone());
        Ok(record)
    }

    fn update_ip(&self, record: IpRecord) -> Result<IpRecord, StoreError> {
        self.check_ip_columns(&record)?;
        let key = ip_key(record.address, &record.subnet_id);
        if !self.ips.contains(&key) {
            return Err(StoreError::NotFound {
                entity: "ip address",
                key: format!("{} in subnet {}", record.address, record.subnet_id),
            });
        }
        self.ips.upsert(key, record.clone());
        Ok(record)
    }

    fn find_service(
        &self,
        device_id: &EntityId,
        name: &str,
    ) -> Result<Option<Service>, StoreError> {
        Ok(self
            .services
            .get(&service_key(device_id, name))
            .map(|s| Service::clone(&s)))
    }

    fn create_service(&self, service: Service) -> Result<Service, StoreError> {
        let key = service_key(&service.device_id, &service.name);
        if self.services.contains(&key) {
            return Err(StoreError::Duplicate {
                entity: "service",
                key: service.name,
            });
        }
        self.services.upsert(key, service.clone());
        Ok(service)
    }

    fn update_service(&self, service: Service) -> Result<Service, StoreError> {
        let key = service_key(&service.device_id, &service.name);
        if !self.services.contains(&key) {
            return Err(StoreError::NotFound {
                entity: "service",
                key: service.name,
            });
        }
        self.services.upsert(key, service.clone());
        Ok(service)
    }
}

impl SchemaStore for InMemoryStore {
    fn has_column(&self, table: Table, column: &str) -> Result<bool, StoreError> {
        Ok(self.columns.contains(&(table, column.to_owned())))
    }

    fn add_column(&self, table: Table, column: &str) -> Result<(), StoreError> {
        self.columns.insert((table, column.to_owned()));
        Ok(())
    }

    fn schema_version(&self) -> Result<u32, StoreError> {
        Ok(self.version.load(Ordering::SeqCst))
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.version.store(version, Ordering::SeqCst);
        Ok(())
    }
}
