// ── Vendor-to-telemetry conversions ──
//
// Bridges loosely-typed RouterOS API rows and Proxmox guest-agent payloads
// into the typed records in `model::telemetry`. Vendor key names
// (`mac-address`, `caller-id`, ...) stop here. Rows missing a required
// field are dropped, never errored.

use serde_json::{Map, Value};

use crate::cidr::parse_host;
use crate::model::{
    ArpEntry, DhcpLease, ExposedService, InterfaceAddress, InterfaceInfo, MacAddress, PppSession,
    SystemInfo,
};

/// One row as returned by the RouterOS API: a flat string-keyed object.
pub type RawRow = Map<String, Value>;

// ── Helpers ────────────────────────────────────────────────────────

/// A non-empty string field. RouterOS reports most values as strings, but
/// numbers and booleans are accepted and stringified.
fn text(row: &RawRow, key: &str) -> Option<String> {
    let raw = match row.get(key)? {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

/// First non-empty value among `keys`.
fn first_text(row: &RawRow, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text(row, k))
}

/// RouterOS booleans arrive as `"true"`/`"false"`, `"yes"`/`"no"`, or JSON bools.
fn flag(row: &RawRow, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        _ => false,
    }
}

fn port(row: &RawRow, key: &str) -> Option<u16> {
    match row.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ── Row conversions ────────────────────────────────────────────────

/// Build a typed record from a single RouterOS row.
pub trait FromRouterOs: Sized {
    fn from_row(row: &RawRow) -> Option<Self>;
}

/// Convert every row that carries the required fields.
pub fn rows<T: FromRouterOs>(raw: &[RawRow]) -> Vec<T> {
    raw.iter().filter_map(T::from_row).collect()
}

/// `/system/resource`: always yields a value, possibly empty.
impl FromRouterOs for SystemInfo {
    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Self {
            model: first_text(row, &["board-name", "model"]),
            os_version: text(row, "version"),
        })
    }
}

/// `/interface`
impl FromRouterOs for InterfaceInfo {
    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Self {
            name: text(row, "name")?,
            mac: text(row, "mac-address").and_then(|m| MacAddress::parse(&m)),
        })
    }
}

/// `/ip/address`
impl FromRouterOs for InterfaceAddress {
    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Self {
            address: text(row, "address")?,
            interface: text(row, "interface")?,
        })
    }
}

/// `/ip/arp`
impl FromRouterOs for ArpEntry {
    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Self {
            address: text(row, "address")?,
            mac: text(row, "mac-address"),
        })
    }
}

/// `/ip/dhcp-server/lease`
impl FromRouterOs for DhcpLease {
    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Self {
            address: text(row, "address")?,
            mac: text(row, "mac-address"),
            host_name: first_text(row, &["host-name", "active-host-name"]),
        })
    }
}

/// `/ppp/active`
impl FromRouterOs for PppSession {
    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Self {
            username: first_text(row, &["name", "user"]).unwrap_or_default(),
            service_type: text(row, "service").unwrap_or_default(),
            peer_address: text(row, "address")?,
            caller_id: first_text(row, &["caller-id", "caller"]),
        })
    }
}

/// `/ip/service`: rows without a name or a non-zero port are dropped.
impl FromRouterOs for ExposedService {
    fn from_row(row: &RawRow) -> Option<Self> {
        let port = port(row, "port").filter(|p| *p != 0)?;
        Some(Self {
            name: text(row, "name")?,
            port,
            disabled: flag(row, "disabled"),
        })
    }
}

// ── Proxmox guest agent ────────────────────────────────────────────

/// Usable IPv4 addresses from a `network-get-interfaces` guest-agent
/// payload.
///
/// Accepts the payload wrapped as `{"data": {"result": [...]}}`,
/// `{"data": [...]}`, `{"result": [...]}` or a bare interface array.
/// Loopback (`127.*`), link-local (`169.254.*`) and IPv6 addresses are
/// dropped. Order follows the payload; duplicates are removed.
pub fn guest_agent_addresses(payload: &Value) -> Vec<String> {
    let data = payload.get("data").unwrap_or(payload);
    let ifaces = data
        .get("result")
        .unwrap_or(data)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut out: Vec<String> = Vec::new();
    for iface in ifaces {
        let Some(addrs) = iface.get("ip-addresses").and_then(Value::as_array) else {
            continue;
        };
        for entry in addrs {
            let Some(raw) = entry.get("ip-address").and_then(Value::as_str) else {
                continue;
            };
            let Some(ip) = parse_host(raw) else {
                continue;
            };
            if ip.is_loopback() || ip.is_link_local() {
                continue;
            }
            let ip = ip.to_string();
            if !out.contains(&ip) {
                out.push(ip);
            }
        }
    }
    out
}

/// Guest-agent addresses as interface addresses on the VM, keyed to the
/// guest's interface name (`eth0`, `ens18`, ...).
pub fn guest_agent_interfaces(payload: &Value) -> Vec<InterfaceAddress> {
    let data = payload.get("data").unwrap_or(payload);
    let ifaces = data
        .get("result")
        .unwrap_or(data)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut out = Vec::new();
    for iface in ifaces {
        let name = iface
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("guest")
            .to_owned();
        let single = Value::Array(vec![iface.clone()]);
        for address in guest_agent_addresses(&single) {
            out.push(InterfaceAddress {
                address,
                interface: name.clone(),
            });
        }
    }
    out
}
