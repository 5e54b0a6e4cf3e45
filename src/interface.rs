//! Interface resolution
//!
//! Validates that the watched interface has a sensible private IPv4 network
//! before a capture handle is opened on it. The resulting range is only used
//! for diagnostics; frame filtering never looks at it.

use crate::error::InterfaceError;
use ipnetwork::{IpNetwork, Ipv4Network};
use pnet::datalink::{self, NetworkInterface};
use std::fmt;
use std::net::Ipv4Addr;

/// The host's own IPv4 address and mask on the watched interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSubnet {
    /// Address assigned to the interface (e.g. 192.168.1.42)
    pub address: Ipv4Addr,
    /// Host address and prefix as assigned (e.g. 192.168.1.42/24)
    pub network: Ipv4Network,
}

impl EffectiveSubnet {
    /// The network range, with host bits cleared (e.g. 192.168.1.0/24)
    pub fn range(&self) -> Ipv4Network {
        // Same prefix as an existing network, never out of range
        Ipv4Network::new(self.network.network(), self.network.prefix()).unwrap_or(self.network)
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.network.mask()
    }
}

impl fmt::Display for EffectiveSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range())
    }
}

/// Look up an interface by name
pub fn find_interface(name: &str) -> Result<NetworkInterface, InterfaceError> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| InterfaceError::NotFound(name.to_string()))
}

/// Resolve the named interface to its effective subnet
///
/// `min_prefix_len` is the subnet sanity policy: networks wider than this
/// prefix are rejected. `None` disables the check.
pub fn resolve(
    name: &str,
    min_prefix_len: Option<u8>,
) -> Result<(NetworkInterface, EffectiveSubnet), InterfaceError> {
    let iface = find_interface(name)?;
    let subnet = effective_subnet(&iface.name, &iface.ips, min_prefix_len)?;
    Ok((iface, subnet))
}

/// Pick the first IPv4 address among `ips` and sanity-check it
///
/// IPv6 entries that are IPv4-mapped (`::ffff:a.b.c.d`) count as IPv4, with
/// the mask taken from their low 32 bits.
pub fn effective_subnet(
    name: &str,
    ips: &[IpNetwork],
    min_prefix_len: Option<u8>,
) -> Result<EffectiveSubnet, InterfaceError> {
    let network = ips
        .iter()
        .find_map(as_ipv4)
        .ok_or_else(|| InterfaceError::NoUsableAddress(name.to_string()))?;

    if network.ip().is_loopback() {
        return Err(InterfaceError::LoopbackRejected(name.to_string()));
    }

    if let Some(min) = min_prefix_len {
        if network.prefix() < min {
            return Err(InterfaceError::SubnetTooLarge {
                name: name.to_string(),
                prefix: network.prefix(),
                min,
            });
        }
    }

    Ok(EffectiveSubnet {
        address: network.ip(),
        network,
    })
}

fn as_ipv4(ip: &IpNetwork) -> Option<Ipv4Network> {
    match ip {
        IpNetwork::V4(v4) => Some(*v4),
        IpNetwork::V6(v6) => {
            let mapped = v6.ip().to_ipv4_mapped()?;
            let prefix = v6.prefix().checked_sub(96)?;
            Ipv4Network::new(mapped, prefix).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipnetwork::Ipv6Network;
    use std::net::Ipv6Addr;

    fn v4(addr: [u8; 4], prefix: u8) -> IpNetwork {
        IpNetwork::V4(Ipv4Network::new(Ipv4Addr::from(addr), prefix).unwrap())
    }

    #[test]
    fn test_private_24_resolves() {
        let subnet = effective_subnet("eth0", &[v4([192, 168, 1, 42], 24)], Some(16)).unwrap();
        assert_eq!(subnet.address, Ipv4Addr::new(192, 168, 1, 42));
        assert_eq!(subnet.prefix(), 24);
        assert_eq!(subnet.netmask(), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(subnet.range().network(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_loopback_rejected() {
        let err = effective_subnet("lo", &[v4([127, 0, 0, 1], 8)], Some(16)).unwrap_err();
        assert_eq!(err, InterfaceError::LoopbackRejected("lo".to_string()));

        // Loopback wins over the size policy, and applies with the policy off
        let err = effective_subnet("lo", &[v4([127, 0, 0, 1], 8)], None).unwrap_err();
        assert_eq!(err, InterfaceError::LoopbackRejected("lo".to_string()));
    }

    #[test]
    fn test_class_a_mask_too_large() {
        let err = effective_subnet("eth0", &[v4([10, 1, 2, 3], 8)], Some(16)).unwrap_err();
        assert_eq!(
            err,
            InterfaceError::SubnetTooLarge {
                name: "eth0".to_string(),
                prefix: 8,
                min: 16,
            }
        );
    }

    #[test]
    fn test_slash_16_is_accepted() {
        let subnet = effective_subnet("eth0", &[v4([172, 16, 4, 9], 16)], Some(16)).unwrap();
        assert_eq!(subnet.to_string(), "172.16.0.0/16");
    }

    #[test]
    fn test_policy_can_be_disabled() {
        let subnet = effective_subnet("eth0", &[v4([10, 1, 2, 3], 8)], None).unwrap();
        assert_eq!(subnet.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn test_no_ipv4_address() {
        let v6 = IpNetwork::V6(Ipv6Network::new("fe80::1".parse().unwrap(), 64).unwrap());
        let err = effective_subnet("eth0", &[v6], Some(16)).unwrap_err();
        assert_eq!(err, InterfaceError::NoUsableAddress("eth0".to_string()));

        let err = effective_subnet("eth0", &[], Some(16)).unwrap_err();
        assert_eq!(err, InterfaceError::NoUsableAddress("eth0".to_string()));
    }

    #[test]
    fn test_first_ipv4_wins_after_ipv6() {
        let v6 = IpNetwork::V6(Ipv6Network::new("fe80::1".parse().unwrap(), 64).unwrap());
        let subnet = effective_subnet(
            "wlan0",
            &[v6, v4([192, 168, 0, 7], 24), v4([10, 0, 0, 1], 8)],
            Some(16),
        )
        .unwrap();
        assert_eq!(subnet.address, Ipv4Addr::new(192, 168, 0, 7));
    }

    #[test]
    fn test_ipv4_mapped_ipv6_counts() {
        let mapped = Ipv4Addr::new(192, 168, 5, 20).to_ipv6_mapped();
        let net = IpNetwork::V6(Ipv6Network::new(mapped, 120).unwrap());
        let subnet = effective_subnet("eth0", &[net], Some(16)).unwrap();
        assert_eq!(subnet.address, Ipv4Addr::new(192, 168, 5, 20));
        assert_eq!(subnet.prefix(), 24);

        let not_mapped = IpNetwork::V6(Ipv6Network::new(Ipv6Addr::LOCALHOST, 128).unwrap());
        assert!(effective_subnet("lo", &[not_mapped], Some(16)).is_err());
    }

    #[test]
    fn test_missing_interface() {
        let err = find_interface("definitely-not-an-interface0").unwrap_err();
        assert!(matches!(err, InterfaceError::NotFound(_)));
    }
}
