//! End-to-end reconciliation runs against the in-memory store and a
//! scripted telemetry source.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use netrecon_core::{
    ArpEntry, Cidr, Device, DeviceClass, DeviceDescriptor, DeviceSession, DeviceTelemetry, DhcpLease, EntityId,
    ExposedService, InMemoryStore, InterfaceAddress, InterfaceInfo, IpRecord, IpStatus,
    IpamRepository, MacAddress, PppSession, Purpose, Reconciler, Service, SourceError,
    StoreError, Subnet, SyncPolicy, SystemInfo, TelemetrySource, apply_migrations,
};

// ── Scripted source ─────────────────────────────────────────────────

#[derive(Default)]
struct FakeSource {
    devices: HashMap<String, Result<DeviceTelemetry, String>>,
}

impl FakeSource {
    fn with(mut self, name: &str, telemetry: DeviceTelemetry) -> Self {
        self.devices.insert(name.into(), Ok(telemetry));
        self
    }

    fn failing(mut self, name: &str, reason: &str) -> Self {
        self.devices.insert(name.into(), Err(reason.into()));
        self
    }
}

struct FakeSession(DeviceTelemetry);

impl TelemetrySource for FakeSource {
    type Session = FakeSession;

    async fn open(&self, device: &DeviceDescriptor) -> Result<FakeSession, SourceError> {
        match self.devices.get(&device.name) {
            Some(Ok(t)) => Ok(FakeSession(t.clone())),
            Some(Err(reason)) => Err(SourceError::ConnectionFailed {
                device: device.name.clone(),
                reason: reason.clone(),
            }),
            None => Err(SourceError::AuthenticationFailed {
                device: device.name.clone(),
            }),
        }
    }
}

impl DeviceSession for FakeSession {
    async fn system_info(&self) -> Result<SystemInfo, SourceError> {
        Ok(self.0.system.clone())
    }
    async fn interfaces(&self) -> Result<Vec<InterfaceInfo>, SourceError> {
        Ok(self.0.interfaces.clone())
    }
    async fn interface_addresses(&self) -> Result<Vec<InterfaceAddress>, SourceError> {
        Ok(self.0.addresses.clone())
    }
    async fn arp_entries(&self) -> Result<Vec<ArpEntry>, SourceError> {
        Ok(self.0.arp.clone())
    }
    async fn dhcp_leases(&self) -> Result<Vec<DhcpLease>, SourceError> {
        Ok(self.0.dhcp.clone())
    }
    async fn ppp_sessions(&self) -> Result<Vec<PppSession>, SourceError> {
        Ok(self.0.ppp.clone())
    }
    async fn services(&self) -> Result<Vec<ExposedService>, SourceError> {
        Ok(self.0.services.clone())
    }
    async fn close(self) {}
}

// ── Store that refuses selected writes ──────────────────────────────

struct RefusingStore {
    inner: InMemoryStore,
    refuse: Option<Ipv4Addr>,
    refuse_subnets: bool,
}

impl RefusingStore {
    fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            refuse: None,
            refuse_subnets: false,
        }
    }
}

impl IpamRepository for RefusingStore {
    fn list_subnets(&self) -> Result<Vec<Subnet>, StoreError> {
        self.inner.list_subnets()
    }
    fn create_subnet(&self, subnet: Subnet) -> Result<Subnet, StoreError> {
        if self.refuse_subnets {
            return Err(StoreError::Backend {
                message: "read-only replica".into(),
            });
        }
        self.inner.create_subnet(subnet)
    }
    fn find_device(
        &self,
        mgmt: &str,
        name: &str,
        class: DeviceClass,
    ) -> Result<Option<Device>, StoreError> {
        self.inner.find_device(mgmt, name, class)
    }
    fn find_device_by_mac(&self, mac: &MacAddress) -> Result<Option<Device>, StoreError> {
        self.inner.find_device_by_mac(mac)
    }
    fn create_device(&self, device: Device) -> Result<Device, StoreError> {
        self.inner.create_device(device)
    }
    fn update_device(&self, device: Device) -> Result<Device, StoreError> {
        self.inner.update_device(device)
    }
    fn set_device_mac(&self, id: &EntityId, mac: &MacAddress) -> Result<(), StoreError> {
        self.inner.set_device_mac(id, mac)
    }
    fn find_ip(&self, a: Ipv4Addr, s: &EntityId) -> Result<Option<IpRecord>, StoreError> {
        self.inner.find_ip(a, s)
    }
    fn create_ip(&self, record: IpRecord) -> Result<IpRecord, StoreError> {
        if Some(record.address) == self.refuse {
            return Err(StoreError::Backend {
                message: "disk full".into(),
            });
        }
        self.inner.create_ip(record)
    }
    fn update_ip(&self, record: IpRecord) -> Result<IpRecord, StoreError> {
        self.inner.update_ip(record)
    }
    fn find_service(&self, d: &EntityId, n: &str) -> Result<Option<Service>, StoreError> {
        self.inner.find_service(d, n)
    }
    fn create_service(&self, service: Service) -> Result<Service, StoreError> {
        self.inner.create_service(service)
    }
    fn update_service(&self, service: Service) -> Result<Service, StoreError> {
        self.inner.update_service(service)
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn store_with(cidrs: &[&str]) -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    apply_migrations(&store).unwrap();
    for cidr in cidrs {
        store
            .create_subnet(Subnet::new(cidr.parse::<Cidr>().unwrap(), None))
            .unwrap();
    }
    Arc::new(store)
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn arp(address: &str, mac: &str) -> ArpEntry {
    ArpEntry {
        address: address.into(),
        mac: Some(mac.into()),
    }
}

fn record(store: &InMemoryStore, address: &str) -> Option<IpRecord> {
    store
        .ip_records()
        .into_iter()
        .find(|r| r.address == ip(address))
}

fn vm(name: &str, management_address: &str) -> DeviceDescriptor {
    let mut descriptor = DeviceDescriptor::new(name, management_address);
    descriptor.class = DeviceClass::Vm;
    descriptor
}

fn guest(addresses: &[&str]) -> DeviceTelemetry {
    DeviceTelemetry {
        addresses: addresses
            .iter()
            .map(|a| InterfaceAddress {
                address: (*a).into(),
                interface: "ens18".into(),
            })
            .collect(),
        ..DeviceTelemetry::default()
    }
}

fn edge_telemetry() -> DeviceTelemetry {
    DeviceTelemetry {
        system: SystemInfo {
            model: Some("CCR2004".into()),
            os_version: Some("7.14".into()),
        },
        interfaces: vec![InterfaceInfo {
            name: "ether1".into(),
            mac: MacAddress::parse("4c:5e:0c:00:00:01"),
        }],
        addresses: vec![InterfaceAddress {
            address: "10.0.0.1/24".into(),
            interface: "ether1".into(),
        }],
        arp: vec![
            arp("10.0.0.50", "AA:BB:CC:00:00:50"),
            arp("10.0.0.51", "AA:BB:CC:00:00:51"),
        ],
        dhcp: vec![DhcpLease {
            address: "10.0.0.60".into(),
            mac: Some("AA:BB:CC:00:00:60".into()),
            host_name: Some("printer".into()),
        }],
        ..DeviceTelemetry::default()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn second_run_updates_what_the_first_created() {
    let store = store_with(&["10.0.0.0/24"]);
    let source = FakeSource::default().with("edge-1", edge_telemetry());
    let reconciler = Reconciler::new(Arc::clone(&store), source);
    let devices = [DeviceDescriptor::new("edge-1", "10.0.0.1")];
    let policy = SyncPolicy::default();

    let first = reconciler.run_sync(&devices, &policy).await;
    assert!(first.errors.is_empty(), "{:?}", first.errors);
    // 10.0.0.1 is seen as management and interface address: one key
    assert_eq!(first.created_ips, 4);
    assert_eq!(first.updated_ips, 0);
    assert_eq!(first.processed, 5);
    assert_eq!(first.created_devices, 1);

    let second = reconciler.run_sync(&devices, &policy).await;
    assert_eq!(second.created_ips, 0);
    assert_eq!(second.updated_ips, 4);
    assert_eq!(second.created_devices, 0);
    assert_eq!(second.updated_devices, 1);
    assert_eq!(store.ip_count(), 4);
    assert_eq!(store.devices().len(), 1);
}

#[tokio::test]
async fn arp_observation_keeps_dhcp_host_name() {
    let store = store_with(&["10.0.0.0/24"]);
    let devices = [DeviceDescriptor::new("edge-1", "10.0.0.1")];

    let dhcp_only = DeviceTelemetry {
        dhcp: vec![DhcpLease {
            address: "10.0.0.60".into(),
            mac: Some("AA:BB:CC:00:00:60".into()),
            host_name: Some("printer".into()),
        }],
        ..DeviceTelemetry::default()
    };
    Reconciler::new(Arc::clone(&store), FakeSource::default().with("edge-1", dhcp_only))
        .run_sync(&devices, &SyncPolicy::default())
        .await;

    let arp_only = DeviceTelemetry {
        arp: vec![arp("10.0.0.60", "AA:BB:CC:00:00:61")],
        ..DeviceTelemetry::default()
    };
    Reconciler::new(Arc::clone(&store), FakeSource::default().with("edge-1", arp_only))
        .run_sync(&devices, &SyncPolicy::default())
        .await;

    let rec = record(&store, "10.0.0.60").unwrap();
    assert_eq!(rec.fqdn.as_deref(), Some("printer"));
    assert_eq!(rec.mac.unwrap().as_str(), "aa:bb:cc:00:00:61");
    assert_eq!(rec.status, IpStatus::Assigned);
}

#[tokio::test]
async fn ppp_sessions_are_tagged_and_others_ignored() {
    let store = store_with(&["10.0.0.0/24", "100.64.0.0/16"]);
    let telemetry = DeviceTelemetry {
        ppp: vec![
            PppSession {
                username: "joao".into(),
                service_type: "pppoe".into(),
                peer_address: "100.64.1.10".into(),
                caller_id: Some("AA:BB:CC:DD:EE:10".into()),
            },
            PppSession {
                username: "maria".into(),
                service_type: "L2TP".into(),
                peer_address: "100.64.1.11".into(),
                caller_id: Some("203.0.113.9".into()),
            },
            PppSession {
                username: "ghost".into(),
                service_type: "other".into(),
                peer_address: "100.64.1.12".into(),
                caller_id: None,
            },
        ],
        ..DeviceTelemetry::default()
    };
    let report = Reconciler::new(Arc::clone(&store), FakeSource::default().with("bng-1", telemetry))
        .run_sync(
            &[DeviceDescriptor::new("bng-1", "10.0.0.2")],
            &SyncPolicy::default(),
        )
        .await;
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    let pppoe = record(&store, "100.64.1.10").unwrap();
    assert_eq!(pppoe.purpose, Some(Purpose::Pppoe));
    assert_eq!(pppoe.ppp_name.as_deref(), Some("joao"));
    assert_eq!(pppoe.device_id, None);

    let l2tp = record(&store, "100.64.1.11").unwrap();
    assert_eq!(l2tp.purpose, Some(Purpose::L2tp));

    assert!(record(&store, "100.64.1.12").is_none());
}

#[tokio::test]
async fn unmapped_address_needs_auto_create() {
    let telemetry = DeviceTelemetry {
        arp: vec![arp("10.5.5.9", "AA:BB:CC:05:05:09")],
        ..DeviceTelemetry::default()
    };
    let devices = [DeviceDescriptor::new("edge-1", "192.0.2.1")];

    let store = store_with(&[]);
    let report = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", telemetry.clone()),
    )
    .run_sync(&devices, &SyncPolicy::default())
    .await;
    assert!(report.errors.is_empty());
    assert_eq!(report.processed, 0);
    assert!(store.list_subnets().unwrap().is_empty());
    assert_eq!(store.ip_count(), 0);

    let store = store_with(&[]);
    let report = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", telemetry),
    )
    .run_sync(&devices, &SyncPolicy::default().with_auto_create(true))
    .await;
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    let cidrs: Vec<String> = store
        .list_subnets()
        .unwrap()
        .into_iter()
        .map(|s| s.cidr)
        .collect();
    // management address 192.0.2.1 gets its own block too
    assert_eq!(cidrs, vec!["192.0.2.0/24", "10.5.5.0/24"]);
    assert_eq!(report.created_subnets, 2);
    assert!(record(&store, "10.5.5.9").is_some());
}

#[tokio::test]
async fn failing_device_does_not_stop_the_run() {
    let store = store_with(&["10.0.0.0/16"]);
    let source = FakeSource::default()
        .with("edge-1", DeviceTelemetry::default())
        .failing("edge-2", "connection refused")
        .with("edge-3", DeviceTelemetry::default());
    let devices = [
        DeviceDescriptor::new("edge-1", "10.0.1.1"),
        DeviceDescriptor::new("edge-2", "10.0.2.1"),
        DeviceDescriptor::new("edge-3", "10.0.3.1"),
    ];

    let report = Reconciler::new(Arc::clone(&store), source)
        .run_sync(&devices, &SyncPolicy::default())
        .await;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Device edge-2 error:"));
    assert!(report.errors[0].contains("connection refused"));
    assert_eq!(report.created_devices, 2);
    assert!(record(&store, "10.0.1.1").is_some());
    assert!(record(&store, "10.0.3.1").is_some());
    assert!(record(&store, "10.0.2.1").is_none());
}

#[tokio::test]
async fn store_write_failure_is_reported_per_record() {
    let inner = InMemoryStore::new();
    apply_migrations(&inner).unwrap();
    inner
        .create_subnet(Subnet::new("10.0.0.0/24".parse().unwrap(), None))
        .unwrap();
    let store = Arc::new(RefusingStore {
        refuse: Some(ip("10.0.0.50")),
        ..RefusingStore::new(inner)
    });

    let report = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", edge_telemetry()),
    )
    .run_sync(
        &[DeviceDescriptor::new("edge-1", "10.0.0.1")],
        &SyncPolicy::default(),
    )
    .await;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("IP 10.0.0.50 error:"));
    assert!(report.errors[0].contains("disk full"));
    assert_eq!(report.created_ips, 3);
    assert_eq!(store.inner.ip_count(), 3);
}

#[tokio::test]
async fn mac_owner_beats_polled_device() {
    let store = store_with(&["10.0.0.0/24"]);
    let cpe = DeviceTelemetry {
        interfaces: vec![InterfaceInfo {
            name: "wan".into(),
            mac: MacAddress::parse("AA:BB:CC:00:00:77"),
        }],
        ..DeviceTelemetry::default()
    };
    let edge = DeviceTelemetry {
        arp: vec![
            arp("10.0.0.77", "AA:BB:CC:00:00:77"),
            arp("10.0.0.1", "DE:AD:BE:EF:00:01"),
            arp("10.0.0.88", "DE:AD:BE:EF:00:88"),
        ],
        ..DeviceTelemetry::default()
    };
    let source = FakeSource::default().with("cpe-7", cpe).with("edge-1", edge);
    let devices = [
        DeviceDescriptor::new("cpe-7", "192.0.2.7"),
        DeviceDescriptor::new("edge-1", "10.0.0.1"),
    ];

    let report = Reconciler::new(Arc::clone(&store), source)
        .run_sync(&devices, &SyncPolicy::default())
        .await;
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    let by_name: HashMap<String, EntityId> = store
        .devices()
        .into_iter()
        .map(|d| (d.name, d.id))
        .collect();

    assert_eq!(
        record(&store, "10.0.0.77").unwrap().device_id.as_ref(),
        by_name.get("cpe-7")
    );
    assert_eq!(
        record(&store, "10.0.0.1").unwrap().device_id.as_ref(),
        by_name.get("edge-1")
    );
    assert_eq!(record(&store, "10.0.0.88").unwrap().device_id, None);
}

#[tokio::test]
async fn services_upsert_and_keep_operator_fields() {
    let store = store_with(&[]);
    let telemetry = DeviceTelemetry {
        services: vec![
            ExposedService {
                name: "ssh".into(),
                port: 22,
                disabled: false,
            },
            ExposedService {
                name: "telnet".into(),
                port: 23,
                disabled: true,
            },
        ],
        ..DeviceTelemetry::default()
    };
    let devices = [DeviceDescriptor::new("edge-1", "10.0.0.1")];
    let reconciler = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", telemetry),
    );

    let report = reconciler.run_sync(&devices, &SyncPolicy::default()).await;
    assert_eq!(report.upserted_services, 2);

    let ssh = store
        .services()
        .into_iter()
        .find(|s| s.name == "ssh")
        .unwrap();
    store
        .update_service(Service {
            external_port: Some(2222),
            ..ssh
        })
        .unwrap();

    reconciler.run_sync(&devices, &SyncPolicy::default()).await;
    let services = store.services();
    assert_eq!(services.len(), 2);
    let ssh = services.iter().find(|s| s.name == "ssh").unwrap();
    assert_eq!(ssh.external_port, Some(2222));
    assert!(ssh.enabled);
    assert!(!services.iter().find(|s| s.name == "telnet").unwrap().enabled);
}

#[tokio::test]
async fn device_mac_and_system_facts_are_recorded() {
    let store = store_with(&["10.0.0.0/24"]);
    let reconciler = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", edge_telemetry()),
    );
    reconciler
        .run_sync(
            &[DeviceDescriptor::new("edge-1", "10.0.0.1")],
            &SyncPolicy::default(),
        )
        .await;

    let dev = store.devices().pop().unwrap();
    assert_eq!(dev.model.as_deref(), Some("CCR2004"));
    assert_eq!(dev.os_version.as_deref(), Some("7.14"));
    assert_eq!(dev.mac.unwrap().as_str(), "4c:5e:0c:00:00:01");
}

#[tokio::test]
async fn unmigrated_store_reports_mac_write_failure() {
    let store = Arc::new(InMemoryStore::new());
    store
        .create_subnet(Subnet::new("10.0.0.0/24".parse().unwrap(), None))
        .unwrap();
    let report = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", edge_telemetry()),
    )
    .run_sync(
        &[DeviceDescriptor::new("edge-1", "10.0.0.1")],
        &SyncPolicy::default(),
    )
    .await;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Set mac failed for edge-1:"));
    // addresses still merge
    assert_eq!(report.created_ips, 4);
}

#[tokio::test]
async fn vms_are_matched_by_name_within_their_class() {
    let store = store_with(&["10.20.0.0/24"]);
    let mut vm_a = vm("vm-a", "");
    vm_a.notes = Some("Proxmox vmid=101 node=pve1".into());
    let devices = [
        DeviceDescriptor::new("edge", "10.20.0.1"),
        vm("edge", "10.20.0.99"),
        vm_a,
        vm("vm-b", ""),
        vm("vm-stopped", ""),
    ];
    let source = FakeSource::default()
        .with("edge", guest(&["10.20.0.99/24"]))
        .with("vm-a", guest(&["10.20.0.11/24"]))
        .with("vm-b", guest(&["10.20.0.12/24"]))
        .with("vm-stopped", DeviceTelemetry::default());
    let reconciler = Reconciler::new(Arc::clone(&store), source);

    let first = reconciler.run_sync(&devices, &SyncPolicy::default()).await;
    assert!(first.errors.is_empty(), "{:?}", first.errors);
    assert_eq!(first.created_devices, 4);
    assert_eq!(first.updated_devices, 0);

    let stored = store.devices();
    let vms: Vec<&Device> = stored.iter().filter(|d| d.class == DeviceClass::Vm).collect();
    assert_eq!(vms.len(), 3);
    assert_eq!(stored.iter().filter(|d| d.class == DeviceClass::Router).count(), 1);
    // a VM without guest addresses is not inventoried
    assert!(stored.iter().all(|d| d.name != "vm-stopped"));

    let a = vms.iter().find(|d| d.name == "vm-a").unwrap();
    assert_eq!(a.management_address, None);
    assert_eq!(a.notes.as_deref(), Some("Proxmox vmid=101 node=pve1"));

    let second = reconciler.run_sync(&devices, &SyncPolicy::default()).await;
    assert_eq!(second.created_devices, 0);
    assert_eq!(second.updated_devices, 4);
    assert_eq!(store.devices().len(), 4);
}

#[tokio::test]
async fn subnet_creation_failure_skips_only_that_address() {
    let inner = InMemoryStore::new();
    apply_migrations(&inner).unwrap();
    inner
        .create_subnet(Subnet::new("10.0.0.0/24".parse().unwrap(), None))
        .unwrap();
    let store = Arc::new(RefusingStore {
        refuse_subnets: true,
        ..RefusingStore::new(inner)
    });
    let telemetry = DeviceTelemetry {
        arp: vec![
            arp("10.0.0.50", "AA:BB:CC:00:00:50"),
            arp("10.5.5.9", "AA:BB:CC:05:05:09"),
            arp("10.0.0.51", "AA:BB:CC:00:00:51"),
        ],
        ..DeviceTelemetry::default()
    };

    let report = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", telemetry),
    )
    .run_sync(
        &[DeviceDescriptor::new("edge-1", "10.0.0.1")],
        &SyncPolicy::default().with_auto_create(true),
    )
    .await;

    assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
    assert!(report.errors[0].starts_with("Create subnet 10.5.5.0/24 for 10.5.5.9 failed:"));
    assert!(report.errors[0].contains("read-only replica"));
    assert_eq!(report.created_subnets, 0);
    assert_eq!(report.processed, 3);
    assert!(record(&store.inner, "10.5.5.9").is_none());
    assert!(record(&store.inner, "10.0.0.50").is_some());
    assert!(record(&store.inner, "10.0.0.51").is_some());
}

#[tokio::test]
async fn provisioned_subnet_survives_a_failed_address_write() {
    let inner = InMemoryStore::new();
    apply_migrations(&inner).unwrap();
    inner
        .create_subnet(Subnet::new("192.0.2.0/24".parse().unwrap(), None))
        .unwrap();
    let store = Arc::new(RefusingStore {
        refuse: Some(ip("10.5.5.1")),
        ..RefusingStore::new(inner)
    });
    let telemetry = DeviceTelemetry {
        addresses: vec![InterfaceAddress {
            address: "10.5.5.1/24".into(),
            interface: "ether2".into(),
        }],
        arp: vec![arp("10.5.5.20", "AA:BB:CC:05:05:20")],
        ..DeviceTelemetry::default()
    };

    let report = Reconciler::new(
        Arc::clone(&store),
        FakeSource::default().with("edge-1", telemetry),
    )
    .run_sync(
        &[DeviceDescriptor::new("edge-1", "192.0.2.1")],
        &SyncPolicy::default().with_auto_create(true),
    )
    .await;

    assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
    assert!(report.errors[0].starts_with("IP 10.5.5.1 error:"));
    assert_eq!(report.created_subnets, 1);

    let provisioned = store
        .inner
        .list_subnets()
        .unwrap()
        .into_iter()
        .find(|s| s.cidr == "10.5.5.0/24")
        .unwrap();
    assert_eq!(provisioned.name.as_deref(), Some("ether2"));
    assert!(record(&store.inner, "10.5.5.1").is_none());
    assert_eq!(
        record(&store.inner, "10.5.5.20").unwrap().subnet_id,
        provisioned.id
    );
}
