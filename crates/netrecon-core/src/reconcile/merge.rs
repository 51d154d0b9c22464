// ── IP record merge ──
//
// Turns one device's telemetry batches into per-address observations and
// folds each into the `(address, subnet_id)` record. Every source owns a
// fixed set of fields; a value the source does not supply is left alone.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use strum::Display;
use tracing::debug;

use super::identity::{Resolved, mac_owner};
use super::report::SyncReport;
use crate::cidr::parse_host;
use crate::error::StoreError;
use crate::model::{
    DeviceDescriptor, DeviceTelemetry, EntityId, ExposedService, IpRecord, IpStatus, MacAddress,
    Protocol, Purpose, Service,
};
use crate::store::IpamRepository;

/// Which batch an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    Management,
    Interface,
    Arp,
    Dhcp,
    Ppp,
}

/// One address as seen by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub address: Ipv4Addr,
    pub source: Source,
    pub interface: Option<String>,
    pub mac: Option<MacAddress>,
    pub fqdn: Option<String>,
    pub purpose: Option<Purpose>,
    pub ppp_name: Option<String>,
    /// PPP caller-id, when it parses as a MAC (PPPoE).
    pub caller_mac: Option<MacAddress>,
}

impl Observation {
    fn new(address: Ipv4Addr, source: Source) -> Self {
        Self {
            address,
            source,
            interface: None,
            mac: None,
            fqdn: None,
            purpose: None,
            ppp_name: None,
            caller_mac: None,
        }
    }

    /// Name for a subnet auto-provisioned on behalf of this observation.
    pub fn subnet_name_hint(&self) -> Option<&str> {
        self.interface.as_deref()
    }
}

fn host(raw: &str, source: Source) -> Option<Ipv4Addr> {
    let parsed = parse_host(raw);
    if parsed.is_none() {
        debug!(%source, address = raw, "skipping unparsable address");
    }
    parsed
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Flatten a device's batches into observations, in merge order:
/// management address, interface addresses, ARP, DHCP, PPP.
///
/// Unparsable addresses and PPP sessions of any service other than PPPoE
/// or L2TP are dropped here.
pub fn observations(descriptor: &DeviceDescriptor, telemetry: &DeviceTelemetry) -> Vec<Observation> {
    let mut out = Vec::new();

    if let Some(address) = host(&descriptor.management_address, Source::Management) {
        out.push(Observation::new(address, Source::Management));
    }

    for a in &telemetry.addresses {
        if let Some(address) = host(&a.address, Source::Interface) {
            out.push(Observation {
                interface: non_empty(Some(&a.interface)),
                ..Observation::new(address, Source::Interface)
            });
        }
    }

    for a in &telemetry.arp {
        if let Some(address) = host(&a.address, Source::Arp) {
            out.push(Observation {
                mac: a.mac.as_deref().and_then(MacAddress::parse),
                ..Observation::new(address, Source::Arp)
            });
        }
    }

    for l in &telemetry.dhcp {
        if let Some(address) = host(&l.address, Source::Dhcp) {
            out.push(Observation {
                mac: l.mac.as_deref().and_then(MacAddress::parse),
                fqdn: non_empty(l.host_name.as_deref()),
                ..Observation::new(address, Source::Dhcp)
            });
        }
    }

    for s in &telemetry.ppp {
        let Some(purpose) = s.purpose() else {
            debug!(service = %s.service_type, user = %s.username, "ignoring ppp session");
            continue;
        };
        if let Some(address) = host(&s.peer_address, Source::Ppp) {
            out.push(Observation {
                purpose: Some(purpose),
                ppp_name: non_empty(Some(&s.username)),
                caller_mac: s.caller_id.as_deref().and_then(MacAddress::parse),
                ..Observation::new(address, Source::Ppp)
            });
        }
    }

    out
}

/// Who owns the observed address.
///
/// A device found through the observation's MAC (ARP/DHCP MAC, PPPoE
/// caller-id) wins. Otherwise the polled device owns its management and
/// interface addresses, and ARP/DHCP rows for its management address.
/// `None` means "keep whatever owner the record already has".
pub fn owner_for<R: IpamRepository + ?Sized>(
    repo: &R,
    obs: &Observation,
    polled: &EntityId,
    management: Option<Ipv4Addr>,
) -> Option<EntityId> {
    let by_mac = match obs.source {
        Source::Arp | Source::Dhcp => obs.mac.as_ref(),
        Source::Ppp => obs.caller_mac.as_ref(),
        Source::Management | Source::Interface => None,
    }
    .and_then(|mac| mac_owner(repo, mac));
    if by_mac.is_some() {
        return by_mac;
    }

    let polled_owns = match obs.source {
        Source::Management | Source::Interface => true,
        Source::Arp | Source::Dhcp => management == Some(obs.address),
        Source::Ppp => false,
    };
    polled_owns.then(|| polled.clone())
}

/// Write the fields `obs` supplies onto `record`, mark it assigned and
/// seen at `now`.
pub fn apply(record: &mut IpRecord, obs: &Observation, owner: Option<EntityId>, now: DateTime<Utc>) {
    if obs.interface.is_some() {
        record.interface.clone_from(&obs.interface);
    }
    if obs.mac.is_some() {
        record.mac.clone_from(&obs.mac);
    }
    if obs.fqdn.is_some() {
        record.fqdn.clone_from(&obs.fqdn);
    }
    if obs.purpose.is_some() {
        record.purpose = obs.purpose;
    }
    if obs.ppp_name.is_some() {
        record.ppp_name.clone_from(&obs.ppp_name);
    }
    if owner.is_some() {
        record.device_id = owner;
    }
    record.status = IpStatus::Assigned;
    record.last_seen = Some(now);
}

/// Merge one observation into the `(address, subnet_id)` record.
pub fn upsert_ip<R: IpamRepository + ?Sized>(
    repo: &R,
    subnet_id: &EntityId,
    obs: &Observation,
    owner: Option<EntityId>,
    now: DateTime<Utc>,
) -> Result<Resolved<IpRecord>, StoreError> {
    match repo.find_ip(obs.address, subnet_id)? {
        Some(mut record) => {
            apply(&mut record, obs, owner, now);
            Ok(Resolved {
                value: repo.update_ip(record)?,
                created: false,
            })
        }
        None => {
            let mut record = IpRecord::new(obs.address, subnet_id.clone());
            apply(&mut record, obs, owner, now);
            Ok(Resolved {
                value: repo.create_ip(record)?,
                created: true,
            })
        }
    }
}

/// Upsert the device's services by `(device_id, name)`, always as TCP.
///
/// Operator-maintained fields (`external_port`) survive the update. A
/// failing service is reported and the rest continue.
pub fn merge_services<R: IpamRepository + ?Sized>(
    repo: &R,
    device_id: &EntityId,
    services: &[ExposedService],
    report: &mut SyncReport,
) {
    for svc in services {
        let result = match repo.find_service(device_id, &svc.name) {
            Ok(Some(mut existing)) => {
                existing.protocol = Protocol::Tcp;
                existing.port = svc.port;
                existing.enabled = !svc.disabled;
                repo.update_service(existing)
            }
            Ok(None) => repo.create_service(Service {
                id: EntityId::generate(),
                device_id: device_id.clone(),
                name: svc.name.clone(),
                protocol: Protocol::Tcp,
                port: svc.port,
                external_port: None,
                enabled: !svc.disabled,
            }),
            Err(e) => Err(e),
        };
        match result {
            Ok(_) => report.upserted_services += 1,
            Err(e) => report.record_error(format!("Service {} upsert failed: {e}", svc.name)),
        }
    }
}
