//! Registered buttons
//!
//! A button is a logical name bound to a hardware address. The registry is
//! built once from configuration and never changes while the daemon runs.

use crate::config::ButtonConfig;
use crate::error::DashwatchError;
use pnet::datalink::MacAddr;
use std::fmt;
use std::sync::Arc;

/// A button the daemon watches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDevice {
    pub name: Arc<str>,
    pub mac: MacAddr,
}

impl fmt::Display for RegisteredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.mac)
    }
}

/// Immutable set of registered buttons
///
/// Lookups by MAC are a linear scan. Installations have a handful of
/// buttons, and the scan keeps the per-frame path allocation free.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<RegisteredDevice>,
}

impl DeviceRegistry {
    /// Build a registry, rejecting malformed and duplicate entries
    pub fn new(devices: Vec<RegisteredDevice>) -> Result<Self, DashwatchError> {
        for (i, device) in devices.iter().enumerate() {
            let duplicate = devices[..i]
                .iter()
                .any(|other| other.name == device.name || other.mac == device.mac);
            if duplicate {
                return Err(DashwatchError::DuplicateButton(device.name.to_string()));
            }
        }
        Ok(Self { devices })
    }

    /// Build a registry from `[[button]]` sections
    pub fn from_config(buttons: &[ButtonConfig]) -> Result<Self, DashwatchError> {
        let devices = buttons
            .iter()
            .map(|button| {
                let mac = parse_mac(&button.mac).ok_or_else(|| DashwatchError::InvalidMac {
                    button: button.name.clone(),
                    mac: button.mac.clone(),
                })?;
                Ok(RegisteredDevice {
                    name: Arc::from(button.name.as_str()),
                    mac,
                })
            })
            .collect::<Result<Vec<_>, DashwatchError>>()?;
        Self::new(devices)
    }

    /// Find the button with this hardware address
    pub fn by_mac(&self, mac: MacAddr) -> Option<&RegisteredDevice> {
        self.devices.iter().find(|d| d.mac == mac)
    }

    /// Find a button by logical name
    pub fn by_name(&self, name: &str) -> Option<&RegisteredDevice> {
        self.devices.iter().find(|d| &*d.name == name)
    }

    /// Hardware address of the named button
    pub fn device_address(&self, name: &str) -> Option<MacAddr> {
        self.by_name(name).map(|d| d.mac)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredDevice> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Parse a colon-separated MAC, case-insensitively
///
/// Also accepts dashes as separators. The all-zero address is rejected since
/// it is the target placeholder in ARP probes and can never be a sender.
pub fn parse_mac(s: &str) -> Option<MacAddr> {
    let normalized = s.trim().replace('-', ":");
    let mac: MacAddr = normalized.parse().ok()?;
    if mac == MacAddr::zero() {
        return None;
    }
    Some(mac)
}
