// ── Reconciliation orchestrator ──
//
// Walks the device list one device at a time. Within a device every
// telemetry batch is fetched concurrently, then identity, addresses and
// services are merged in that order. Nothing a single device does can end
// the run; failures become report entries.

pub mod identity;
pub mod merge;
pub mod report;
pub mod subnet;

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::cidr::{Cidr, parse_host};
use crate::config::SyncPolicy;
use crate::error::CoreError;
use crate::model::{DeviceClass, DeviceDescriptor, DeviceTelemetry, EntityId};
use crate::source::{DeviceSession, TelemetrySource};
use crate::store::IpamRepository;

pub use report::SyncReport;
pub use subnet::SubnetResolver;

/// Mutable state threaded through one run.
struct RunState {
    resolver: SubnetResolver,
    report: SyncReport,
    /// `(address, subnet_id)` keys already counted this run.
    touched: HashSet<(Ipv4Addr, EntityId)>,
}

/// Drives telemetry from a [`TelemetrySource`] into an [`IpamRepository`].
pub struct Reconciler<R: ?Sized, S> {
    repo: Arc<R>,
    source: S,
}

impl<R, S> Reconciler<R, S>
where
    R: IpamRepository + ?Sized,
    S: TelemetrySource,
{
    pub fn new(repo: Arc<R>, source: S) -> Self {
        Self { repo, source }
    }

    /// Reconcile every device in `devices`, in order.
    ///
    /// Running twice over unchanged telemetry is a no-op apart from
    /// `last_seen`: the second report counts the same keys as updated.
    pub async fn run_sync(&self, devices: &[DeviceDescriptor], policy: &SyncPolicy) -> SyncReport {
        let mut report = SyncReport::default();
        let subnets = self.repo.list_subnets().unwrap_or_else(|e| {
            report.record_error(format!("List subnets failed: {e}"));
            Vec::new()
        });
        let mut run = RunState {
            resolver: SubnetResolver::new(subnets, policy),
            report,
            touched: HashSet::new(),
        };
        if run.resolver.is_empty() && !policy.auto_create_subnets {
            warn!("no subnets in the store and auto-creation is off; every address will be unmapped");
        }
        debug!(subnets = run.resolver.len(), devices = devices.len(), "starting sync");

        for device in devices {
            if let Err(e) = self.sync_device(device, &mut run).await {
                run.report
                    .record_error(format!("Device {} error: {e}", device.name));
            }
        }

        let report = run.report;
        info!(
            processed = report.processed,
            created_ips = report.created_ips,
            updated_ips = report.updated_ips,
            created_devices = report.created_devices,
            updated_devices = report.updated_devices,
            errors = report.errors.len(),
            "sync finished"
        );
        report
    }

    #[instrument(skip_all, fields(device = %device.name))]
    async fn sync_device(
        &self,
        device: &DeviceDescriptor,
        run: &mut RunState,
    ) -> Result<(), CoreError> {
        let session = self.source.open(device).await?;
        let fetched = fetch_all(&session).await;
        session.close().await;
        let telemetry = fetched?;

        if device.class == DeviceClass::Vm && telemetry.addresses.is_empty() {
            debug!("no guest addresses reported, skipping");
            return Ok(());
        }

        let repo = &*self.repo;
        let resolved = identity::resolve_device(repo, device, &telemetry.system)?;
        if resolved.created {
            run.report.created_devices += 1;
        } else {
            run.report.updated_devices += 1;
        }
        let dev = resolved.value;

        if let Some(mac) = identity::device_mac(device, &telemetry.interfaces) {
            if dev.mac.as_ref() != Some(&mac) {
                if let Err(e) = repo.set_device_mac(&dev.id, &mac) {
                    run.report
                        .record_error(format!("Set mac failed for {}: {e}", device.name));
                }
            }
        }

        let management = parse_host(&device.management_address);
        let now = Utc::now();
        let mut merged = 0usize;

        for obs in merge::observations(device, &telemetry) {
            let subnet = match run
                .resolver
                .resolve_or_provision(repo, obs.address, obs.subnet_name_hint())
            {
                Ok(Some((subnet, created))) => {
                    if created {
                        run.report.created_subnets += 1;
                    }
                    subnet
                }
                Ok(None) => {
                    debug!(address = %obs.address, source = %obs.source, "unmapped address");
                    continue;
                }
                Err(e) => {
                    let prefix = run.resolver.auto_prefix();
                    let block = Cidr::enclosing(obs.address, prefix)
                        .map_or_else(|_| format!("/{prefix}"), |b| b.to_string());
                    run.report.record_error(format!(
                        "Create subnet {block} for {} failed: {e}",
                        obs.address
                    ));
                    continue;
                }
            };

            let owner = merge::owner_for(repo, &obs, &dev.id, management);
            match merge::upsert_ip(repo, &subnet.id, &obs, owner, now) {
                Ok(outcome) => {
                    run.report.processed += 1;
                    merged += 1;
                    if run.touched.insert((obs.address, subnet.id.clone())) {
                        if outcome.created {
                            run.report.created_ips += 1;
                        } else {
                            run.report.updated_ips += 1;
                        }
                    }
                }
                Err(e) => run
                    .report
                    .record_error(format!("IP {} error: {e}", obs.address)),
            }
        }

        merge::merge_services(repo, &dev.id, &telemetry.services, &mut run.report);

        info!(
            device_id = %dev.id,
            created = resolved.created,
            addresses = merged,
            services = telemetry.services.len(),
            "device reconciled"
        );
        Ok(())
    }
}

/// Fetch every batch concurrently; the first failure fails the device.
async fn fetch_all<D: DeviceSession>(session: &D) -> Result<DeviceTelemetry, CoreError> {
    let (system, interfaces, addresses, arp, dhcp, ppp, services) = tokio::try_join!(
        session.system_info(),
        session.interfaces(),
        session.interface_addresses(),
        session.arp_entries(),
        session.dhcp_leases(),
        session.ppp_sessions(),
        session.services(),
    )?;
    Ok(DeviceTelemetry {
        system,
        interfaces,
        addresses,
        arp,
        dhcp,
        ppp,
        services,
    })
}
