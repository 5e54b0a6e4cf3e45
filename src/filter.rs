//! Frame classification
//!
//! Decodes just enough of a raw Ethernet frame to tell whether it is an ARP
//! probe from a registered button. Buttons announce themselves on wake-up
//! with an ARP request whose target hardware address is all zeros; nothing
//! else on the wire is of interest. ARP carried behind a single 802.1Q tag
//! is recognised as well.
//!
//! Classification borrows the frame and allocates nothing.

use crate::device::{DeviceRegistry, RegisteredDevice};
use pnet::datalink::MacAddr;
use pnet::packet::arp::{ArpOperations, ArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::vlan::VlanPacket;
use pnet::packet::Packet;

/// Outcome of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// Not ARP at all (the common case), untagged or behind one VLAN tag
    NotArp,
    /// Too short or otherwise undecodable
    Malformed,
    /// ARP, but not a request (replies and other operations)
    NotRequest,
    /// ARP request with a real target hardware address
    NotProbe,
    /// ARP probe from a sender that is not registered
    Unregistered(MacAddr),
    /// ARP probe from a registered button
    Press(&'a RegisteredDevice),
}

impl<'a> Verdict<'a> {
    pub fn device(&self) -> Option<&'a RegisteredDevice> {
        match self {
            Verdict::Press(device) => Some(device),
            _ => None,
        }
    }
}

/// Classify a raw Ethernet frame against the registered buttons
pub fn classify<'a>(frame: &[u8], registry: &'a DeviceRegistry) -> Verdict<'a> {
    let Some(ethernet) = EthernetPacket::new(frame) else {
        return Verdict::Malformed;
    };
    let mut ethertype = ethernet.get_ethertype();
    let mut payload = ethernet.payload();

    // Peel a single 802.1Q tag
    if ethertype == EtherTypes::Vlan {
        let Some(vlan) = VlanPacket::new(payload) else {
            return Verdict::Malformed;
        };
        ethertype = vlan.get_ethertype();
        payload = &payload[VlanPacket::minimum_packet_size()..];
    }

    if ethertype != EtherTypes::Arp {
        return Verdict::NotArp;
    }

    let Some(arp) = ArpPacket::new(payload) else {
        return Verdict::Malformed;
    };
    // Only Ethernet/IPv4 ARP carries 6-byte hardware addresses at these offsets
    if arp.get_hw_addr_len() != 6 || arp.get_proto_addr_len() != 4 {
        return Verdict::Malformed;
    }
    if arp.get_operation() != ArpOperations::Request {
        return Verdict::NotRequest;
    }
    if arp.get_target_hw_addr() != MacAddr::zero() {
        return Verdict::NotProbe;
    }

    let sender = arp.get_sender_hw_addr();
    match registry.by_mac(sender) {
        Some(device) => Verdict::Press(device),
        None => Verdict::Unregistered(sender),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pnet::packet::arp::{ArpHardwareTypes, ArpOperation, MutableArpPacket};
    use pnet::packet::ethernet::{EtherType, MutableEthernetPacket};
    use pnet::packet::vlan::MutableVlanPacket;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    pub(crate) const PUFFER: MacAddr = MacAddr(0xac, 0x63, 0xbe, 0xfb, 0x13, 0x9d);
    pub(crate) const CALENDAR: MacAddr = MacAddr(0x50, 0xf5, 0xda, 0x11, 0x22, 0x33);
    const STRANGER: MacAddr = MacAddr(0x02, 0x00, 0x00, 0xaa, 0xbb, 0xcc);

    pub(crate) fn registry() -> DeviceRegistry {
        DeviceRegistry::new(vec![
            RegisteredDevice {
                name: Arc::from("puffer-button"),
                mac: PUFFER,
            },
            RegisteredDevice {
                name: Arc::from("calendar-button"),
                mac: CALENDAR,
            },
        ])
        .unwrap()
    }

    pub(crate) fn arp_frame(
        ethertype: EtherType,
        operation: ArpOperation,
        sender: MacAddr,
        target: MacAddr,
    ) -> Vec<u8> {
        let mut buf = vec![0u8; 42];
        {
            let mut eth = MutableEthernetPacket::new(&mut buf).unwrap();
            eth.set_destination(MacAddr::broadcast());
            eth.set_source(sender);
            eth.set_ethertype(ethertype);
        }
        {
            let mut arp = MutableArpPacket::new(&mut buf[14..]).unwrap();
            arp.set_hardware_type(ArpHardwareTypes::Ethernet);
            arp.set_protocol_type(EtherTypes::Ipv4);
            arp.set_hw_addr_len(6);
            arp.set_proto_addr_len(4);
            arp.set_operation(operation);
            arp.set_sender_hw_addr(sender);
            arp.set_sender_proto_addr(Ipv4Addr::new(0, 0, 0, 0));
            arp.set_target_hw_addr(target);
            arp.set_target_proto_addr(Ipv4Addr::new(192, 168, 1, 1));
        }
        buf
    }

    pub(crate) fn probe(sender: MacAddr) -> Vec<u8> {
        arp_frame(
            EtherTypes::Arp,
            ArpOperations::Request,
            sender,
            MacAddr::zero(),
        )
    }

    #[test]
    fn test_probe_from_registered_button() {
        let registry = registry();
        let frame = probe(PUFFER);
        let verdict = classify(&frame, &registry);
        assert_eq!(&*verdict.device().unwrap().name, "puffer-button");

        let frame = probe(CALENDAR);
        let verdict = classify(&frame, &registry);
        assert_eq!(&*verdict.device().unwrap().name, "calendar-button");
    }

    #[test]
    fn test_unregistered_sender_never_presses() {
        let registry = registry();
        let frame = probe(STRANGER);
        assert_eq!(classify(&frame, &registry), Verdict::Unregistered(STRANGER));

        // Regardless of target address
        let frame = arp_frame(EtherTypes::Arp, ArpOperations::Request, STRANGER, PUFFER);
        assert!(classify(&frame, &registry).device().is_none());
    }

    #[test]
    fn test_reply_never_presses() {
        let registry = registry();
        let frame = arp_frame(
            EtherTypes::Arp,
            ArpOperations::Reply,
            PUFFER,
            MacAddr::zero(),
        );
        assert_eq!(classify(&frame, &registry), Verdict::NotRequest);
    }

    #[test]
    fn test_request_with_real_target_is_not_a_probe() {
        let registry = registry();
        let frame = arp_frame(EtherTypes::Arp, ArpOperations::Request, PUFFER, CALENDAR);
        assert_eq!(classify(&frame, &registry), Verdict::NotProbe);
    }

    #[test]
    fn test_non_arp_discarded() {
        let registry = registry();
        let frame = arp_frame(
            EtherTypes::Ipv4,
            ArpOperations::Request,
            PUFFER,
            MacAddr::zero(),
        );
        assert_eq!(classify(&frame, &registry), Verdict::NotArp);
    }

    /// Wrap an untagged frame in one 802.1Q tag
    fn vlan_tagged(frame: &[u8], vlan_id: u16) -> Vec<u8> {
        let mut buf = vec![0u8; frame.len() + 4];
        buf[..12].copy_from_slice(&frame[..12]);
        buf[18..].copy_from_slice(&frame[14..]);
        {
            let mut eth = MutableEthernetPacket::new(&mut buf).unwrap();
            eth.set_ethertype(EtherTypes::Vlan);
        }
        {
            let inner = EthernetPacket::new(frame).unwrap().get_ethertype();
            let mut vlan = MutableVlanPacket::new(&mut buf[14..]).unwrap();
            vlan.set_vlan_identifier(vlan_id);
            vlan.set_ethertype(inner);
        }
        buf
    }

    #[test]
    fn test_vlan_tagged_probe_presses() {
        let registry = registry();
        let frame = vlan_tagged(&probe(PUFFER), 20);
        assert_eq!(frame.len(), 46);
        let verdict = classify(&frame, &registry);
        assert_eq!(&*verdict.device().unwrap().name, "puffer-button");

        let frame = vlan_tagged(&probe(STRANGER), 20);
        assert_eq!(classify(&frame, &registry), Verdict::Unregistered(STRANGER));
    }

    #[test]
    fn test_vlan_tagged_non_arp_discarded() {
        let registry = registry();
        let ipv4 = arp_frame(
            EtherTypes::Ipv4,
            ArpOperations::Request,
            PUFFER,
            MacAddr::zero(),
        );
        assert_eq!(classify(&vlan_tagged(&ipv4, 7), &registry), Verdict::NotArp);

        // Tag header cut short
        let frame = vlan_tagged(&probe(PUFFER), 7);
        assert_eq!(classify(&frame[..16], &registry), Verdict::Malformed);
    }

    #[test]
    fn test_truncated_frames_are_malformed() {
        let registry = registry();
        assert_eq!(classify(&[], &registry), Verdict::Malformed);
        assert_eq!(classify(&[0u8; 10], &registry), Verdict::Malformed);

        let frame = probe(PUFFER);
        assert_eq!(classify(&frame[..30], &registry), Verdict::Malformed);
    }

    #[test]
    fn test_odd_address_lengths_are_malformed() {
        let registry = registry();
        let mut frame = probe(PUFFER);
        frame[14 + 4] = 8; // hardware address length
        assert_eq!(classify(&frame, &registry), Verdict::Malformed);
    }

    #[test]
    fn test_trailing_padding_is_fine() {
        // Real frames are padded to the 60 byte Ethernet minimum
        let registry = registry();
        let mut frame = probe(PUFFER);
        frame.resize(60, 0);
        assert!(classify(&frame, &registry).device().is_some());
    }
}
