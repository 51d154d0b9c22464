//! IPv4 CIDR arithmetic.
//!
//! Everything here is IPv4-only. Addresses and blocks are compared as `u32`
//! under a mask of `prefix_len` leading one-bits.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::CidrError;

/// Maximum IPv4 prefix length.
pub const MAX_PREFIX_LEN: u8 = 32;

/// Mask with `len` leading one-bits. Prefix 0 yields an all-zero mask.
///
/// ```
/// use netrecon_core::cidr::prefix_mask;
/// assert_eq!(prefix_mask(24), 0xFFFF_FF00);
/// assert_eq!(prefix_mask(0), 0);
/// ```
pub fn prefix_mask(len: u8) -> u32 {
    let host_bits = u32::from(MAX_PREFIX_LEN.saturating_sub(len));
    u32::MAX.checked_shl(host_bits).unwrap_or(0)
}

/// An IPv4 block in `network/prefix` form.
///
/// The network part is kept as written; host bits are ignored when testing
/// containment, so `192.168.1.7/24` and `192.168.1.0/24` match the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Cidr {
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, CidrError> {
        if prefix_len > MAX_PREFIX_LEN {
            return Err(CidrError::PrefixTooLong(prefix_len));
        }
        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// The block of size `prefix_len` enclosing `addr`, with host bits zeroed.
    ///
    /// `enclosing(10.5.5.9, 24)` is `10.5.5.0/24`.
    pub fn enclosing(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, CidrError> {
        if prefix_len > MAX_PREFIX_LEN {
            return Err(CidrError::PrefixTooLong(prefix_len));
        }
        let network = Ipv4Addr::from(u32::from(addr) & prefix_mask(prefix_len));
        Ok(Self {
            network,
            prefix_len,
        })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn mask(&self) -> u32 {
        prefix_mask(self.prefix_len)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = self.mask();
        u32::from(addr) & mask == u32::from(self.network) & mask
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (net, len) = s
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(s.to_owned()))?;
        let network: Ipv4Addr = net
            .trim()
            .parse()
            .map_err(|_| CidrError::InvalidNetwork(net.to_owned()))?;
        let prefix_len: u8 = len
            .trim()
            .parse()
            .map_err(|_| CidrError::InvalidPrefix(len.to_owned()))?;
        Self::new(network, prefix_len)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Test whether `address` falls inside `cidr`.
///
/// Returns `None` for IPv6 addresses (not applicable to an IPv4 inventory)
/// and `Some(false)` for a malformed `cidr`.
pub fn in_subnet(address: IpAddr, cidr: &str) -> Option<bool> {
    let IpAddr::V4(addr) = address else {
        return None;
    };
    Some(cidr.parse::<Cidr>().is_ok_and(|block| block.contains(addr)))
}

/// Parse the host part of a raw telemetry address.
///
/// Accepts bare addresses and `address/prefix` forms. IPv6 and garbage
/// yield `None`.
pub fn parse_host(raw: &str) -> Option<Ipv4Addr> {
    let host = raw.trim().split('/').next()?.trim();
    host.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn v4(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn prefix_masks() {
        assert_eq!(prefix_mask(0), 0x0000_0000);
        assert_eq!(prefix_mask(8), 0xFF00_0000);
        assert_eq!(prefix_mask(16), 0xFFFF_0000);
        assert_eq!(prefix_mask(24), 0xFFFF_FF00);
        assert_eq!(prefix_mask(32), 0xFFFF_FFFF);
    }

    #[test]
    fn slash_24_covers_network_through_broadcast() {
        let cidr = "192.168.1.0/24";
        assert_eq!(in_subnet(v4("192.168.1.0"), cidr), Some(true));
        assert_eq!(in_subnet(v4("192.168.1.1"), cidr), Some(true));
        assert_eq!(in_subnet(v4("192.168.1.255"), cidr), Some(true));
        assert_eq!(in_subnet(v4("192.168.2.1"), cidr), Some(false));
    }

    #[test]
    fn slash_32_matches_only_itself() {
        assert_eq!(in_subnet(v4("10.0.0.5"), "10.0.0.5/32"), Some(true));
        assert_eq!(in_subnet(v4("10.0.0.6"), "10.0.0.5/32"), Some(false));
    }

    #[test]
    fn slash_0_matches_everything() {
        assert_eq!(in_subnet(v4("0.0.0.0"), "0.0.0.0/0"), Some(true));
        assert_eq!(in_subnet(v4("203.0.113.9"), "10.0.0.0/0"), Some(true));
        assert_eq!(in_subnet(v4("255.255.255.255"), "0.0.0.0/0"), Some(true));
    }

    #[test]
    fn ipv6_is_not_applicable() {
        assert_eq!(in_subnet(v4("2001:db8::1"), "0.0.0.0/0"), None);
    }

    #[test]
    fn malformed_cidr_never_matches() {
        let addr = v4("192.168.1.1");
        assert_eq!(in_subnet(addr, "192.168.1.0"), Some(false));
        assert_eq!(in_subnet(addr, "192.168.1.0/abc"), Some(false));
        assert_eq!(in_subnet(addr, "192.168.1.0/33"), Some(false));
        assert_eq!(in_subnet(addr, "not-a-net/24"), Some(false));
        assert_eq!(in_subnet(addr, ""), Some(false));
    }

    #[test]
    fn parse_errors_are_specific() {
        assert_eq!(
            "10.0.0.0".parse::<Cidr>(),
            Err(CidrError::MissingPrefix("10.0.0.0".into()))
        );
        assert_eq!(
            "10.0.0.0/40".parse::<Cidr>(),
            Err(CidrError::PrefixTooLong(40))
        );
        assert!(matches!(
            "10.0.0/8".parse::<Cidr>(),
            Err(CidrError::InvalidNetwork(_))
        ));
    }

    #[test]
    fn enclosing_zeroes_host_bits() {
        let cidr = Cidr::enclosing("10.5.5.9".parse().unwrap(), 24).unwrap();
        assert_eq!(cidr.to_string(), "10.5.5.0/24");
        let cidr = Cidr::enclosing("172.16.200.1".parse().unwrap(), 16).unwrap();
        assert_eq!(cidr.to_string(), "172.16.0.0/16");
        assert!(Cidr::enclosing("10.0.0.1".parse().unwrap(), 33).is_err());
    }

    #[test]
    fn host_bits_in_network_are_ignored() {
        let cidr: Cidr = "192.168.1.7/24".parse().unwrap();
        assert!(cidr.contains("192.168.1.200".parse().unwrap()));
        assert_eq!(cidr.to_string(), "192.168.1.7/24");
    }

    #[test]
    fn parse_host_strips_prefix() {
        assert_eq!(parse_host("10.0.0.1/24"), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(parse_host(" 10.0.0.1 "), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(parse_host("fe80::1/64"), None);
        assert_eq!(parse_host("garbage"), None);
    }

    #[test]
    fn serde_uses_string_form() {
        let cidr: Cidr = serde_json::from_str("\"10.1.0.0/16\"").unwrap();
        assert_eq!(cidr.prefix_len(), 16);
        assert_eq!(serde_json::to_string(&cidr).unwrap(), "\"10.1.0.0/16\"");
        assert!(serde_json::from_str::<Cidr>("\"10.1.0.0\"").is_err());
    }
}
