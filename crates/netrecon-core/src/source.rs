// ── Telemetry collaborator contract ──
//
// The transport that talks to devices (RouterOS API, Proxmox REST, a
// captured snapshot, a test double) sits behind these two traits. Timeouts
// and retries are the implementation's business.

use std::future::Future;

use crate::error::SourceError;
use crate::model::{
    ArpEntry, DeviceDescriptor, DhcpLease, ExposedService, InterfaceAddress, InterfaceInfo,
    PppSession, SystemInfo,
};

/// Opens one management session per device.
pub trait TelemetrySource: Send + Sync {
    type Session: DeviceSession;

    fn open(
        &self,
        device: &DeviceDescriptor,
    ) -> impl Future<Output = Result<Self::Session, SourceError>> + Send;
}

/// Read-only queries against an open device session.
///
/// The reconciler issues all fetches concurrently on `&self`, so
/// implementations must tolerate overlapping calls.
pub trait DeviceSession: Send + Sync + Sized {
    fn system_info(&self) -> impl Future<Output = Result<SystemInfo, SourceError>> + Send;

    fn interfaces(&self) -> impl Future<Output = Result<Vec<InterfaceInfo>, SourceError>> + Send;

    fn interface_addresses(
        &self,
    ) -> impl Future<Output = Result<Vec<InterfaceAddress>, SourceError>> + Send;

    fn arp_entries(&self) -> impl Future<Output = Result<Vec<ArpEntry>, SourceError>> + Send;

    fn dhcp_leases(&self) -> impl Future<Output = Result<Vec<DhcpLease>, SourceError>> + Send;

    fn ppp_sessions(&self) -> impl Future<Output = Result<Vec<PppSession>, SourceError>> + Send;

    fn services(&self) -> impl Future<Output = Result<Vec<ExposedService>, SourceError>> + Send;

    /// Release the session. Called on success and failure alike.
    fn close(self) -> impl Future<Output = ()> + Send;
}
