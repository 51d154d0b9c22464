// ── Device identity ──
//
// Maps a polled device onto its canonical Device row, and MACs seen on the
// wire onto the devices that own them.

use tracing::debug;

use crate::error::StoreError;
use crate::model::{Device, DeviceDescriptor, EntityId, InterfaceInfo, MacAddress, SystemInfo};
use crate::store::IpamRepository;

/// A value together with whether resolving it created a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub created: bool,
}

/// Find the descriptor's device of the same class by management address or
/// exact name, then refresh vendor, model and OS version from what the
/// device reports. When nothing matches a new row is created.
///
/// Facts the device reports win over the descriptor; absent facts never
/// erase stored ones. Descriptor notes only fill an empty `notes` field.
pub fn resolve_device<R: IpamRepository + ?Sized>(
    repo: &R,
    descriptor: &DeviceDescriptor,
    system: &SystemInfo,
) -> Result<Resolved<Device>, StoreError> {
    let model = system.model.clone().or_else(|| descriptor.model.clone());
    let os_version = system
        .os_version
        .clone()
        .or_else(|| descriptor.os_version.clone());

    let management = descriptor.management().map(str::to_owned);

    let found = repo.find_device(
        &descriptor.management_address,
        &descriptor.name,
        descriptor.class,
    )?;
    match found {
        Some(mut device) => {
            if device.management_address.is_none() {
                device.management_address = management;
            }
            if device.notes.is_none() {
                device.notes.clone_from(&descriptor.notes);
            }
            if descriptor.vendor.is_some() {
                device.vendor.clone_from(&descriptor.vendor);
            }
            if model.is_some() {
                device.model = model;
            }
            if os_version.is_some() {
                device.os_version = os_version;
            }
            let value = repo.update_device(device)?;
            Ok(Resolved {
                value,
                created: false,
            })
        }
        None => {
            let value = repo.create_device(Device {
                id: EntityId::generate(),
                name: descriptor.name.clone(),
                class: descriptor.class,
                management_address: management,
                vendor: descriptor.vendor.clone(),
                model,
                os_version,
                mac: None,
                notes: descriptor.notes.clone(),
            })?;
            Ok(Resolved {
                value,
                created: true,
            })
        }
    }
}

/// The device's own MAC: the configured one, else the first interface that
/// reports one.
pub fn device_mac(descriptor: &DeviceDescriptor, interfaces: &[InterfaceInfo]) -> Option<MacAddress> {
    descriptor
        .mac
        .as_deref()
        .and_then(MacAddress::parse)
        .or_else(|| interfaces.iter().find_map(|i| i.mac.clone()))
}

/// The device owning `mac`, if any.
///
/// Lookup failures are treated as "no owner".
pub fn mac_owner<R: IpamRepository + ?Sized>(repo: &R, mac: &MacAddress) -> Option<EntityId> {
    match repo.find_device_by_mac(mac) {
        Ok(found) => found.map(|d| d.id),
        Err(e) => {
            debug!(%mac, error = %e, "mac owner lookup failed");
            None
        }
    }
}
