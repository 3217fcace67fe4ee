// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! OpenWebNet addresses (WHERE field), spec §3.
//!
//! The exact digit layout of a WHERE value (area/group thresholds for SCS,
//! device/unit split for Zigbee) is gateway-protocol minutiae not pinned
//! down by the specification this crate was built from; the parsing below
//! follows the common SCS/Zigbee convention (`0` = general, `1`-`9` = area,
//! `#N` = group, anything else = point-to-point) and should be checked
//! against a real gateway's numbering before being trusted for anything
//! that matters (see DESIGN.md).

use crate::gateway::Protocol;

/// A parsed WHERE address, scoped to the protocol that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    NitooDevice { device: String },
    NitooUnit { device: String, unit: String },
    ZigbeeAllDevicesAllUnits,
    ZigbeeAllDevicesSpecificUnit { unit: String },
    ZigbeeSpecificDeviceAllUnits { device: String },
    ZigbeeSpecificDeviceSpecificUnit { device: String, unit: String },
    ScsLightPointPointToPoint { point: String },
    ScsLightPointGroup { group: String },
    ScsLightPointArea { area: String },
    ScsLightPointGeneral,
    /// A WHERE field that didn't match a recognized shape for the protocol.
    Unknown { raw: Vec<String> },
}

impl Address {
    /// Parse a WHERE field (the frame field holding the address parameters)
    /// for the given protocol.
    pub fn parse(protocol: Protocol, field: &[String]) -> Self {
        match protocol {
            Protocol::Scs => Self::parse_scs(field),
            Protocol::Nitoo => Self::parse_nitoo(field),
            Protocol::Zigbee => Self::parse_zigbee(field),
        }
    }

    fn parse_scs(field: &[String]) -> Self {
        match field {
            [w] if w == "0" => Address::ScsLightPointGeneral,
            [w] if matches!(w.as_str(), "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9") => {
                Address::ScsLightPointArea { area: w.clone() }
            }
            // Group addresses are written `#N` on the wire, which our frame
            // grammar sees as the two-parameter field ["", "N"].
            [empty, group] if empty.is_empty() => Address::ScsLightPointGroup { group: group.clone() },
            [w] => Address::ScsLightPointPointToPoint { point: w.clone() },
            other => Address::Unknown { raw: other.to_vec() },
        }
    }

    fn parse_nitoo(field: &[String]) -> Self {
        match field {
            [device] => Address::NitooDevice { device: device.clone() },
            [device, unit] => {
                Address::NitooUnit { device: device.clone(), unit: unit.clone() }
            }
            other => Address::Unknown { raw: other.to_vec() },
        }
    }

    fn parse_zigbee(field: &[String]) -> Self {
        match field {
            [device, unit] => match (device.as_str(), unit.as_str()) {
                ("0", "0") => Address::ZigbeeAllDevicesAllUnits,
                ("0", unit) => Address::ZigbeeAllDevicesSpecificUnit { unit: unit.to_owned() },
                (device, "0") => Address::ZigbeeSpecificDeviceAllUnits { device: device.to_owned() },
                (device, unit) => Address::ZigbeeSpecificDeviceSpecificUnit {
                    device: device.to_owned(),
                    unit: unit.to_owned(),
                },
            },
            [device] if device == "0" => Address::ZigbeeAllDevicesAllUnits,
            [device] => Address::ZigbeeSpecificDeviceAllUnits { device: device.clone() },
            other => Address::Unknown { raw: other.to_vec() },
        }
    }

    /// Serialize back to the frame field this address was parsed from.
    pub fn to_field(&self) -> Vec<String> {
        match self {
            Address::NitooDevice { device } => vec![device.clone()],
            Address::NitooUnit { device, unit } => vec![device.clone(), unit.clone()],
            Address::ZigbeeAllDevicesAllUnits => vec!["0".to_owned(), "0".to_owned()],
            Address::ZigbeeAllDevicesSpecificUnit { unit } => vec!["0".to_owned(), unit.clone()],
            Address::ZigbeeSpecificDeviceAllUnits { device } => vec![device.clone(), "0".to_owned()],
            Address::ZigbeeSpecificDeviceSpecificUnit { device, unit } => {
                vec![device.clone(), unit.clone()]
            }
            Address::ScsLightPointPointToPoint { point } => vec![point.clone()],
            Address::ScsLightPointGroup { group } => vec![String::new(), group.clone()],
            Address::ScsLightPointArea { area } => vec![area.clone()],
            Address::ScsLightPointGeneral => vec!["0".to_owned()],
            Address::Unknown { raw } => raw.clone(),
        }
    }

    /// Whether this address targets more than one endpoint (spec §4.5 reply matching).
    pub fn is_broadcast(&self) -> bool {
        matches!(
            self,
            Address::ScsLightPointGeneral
                | Address::ScsLightPointArea { .. }
                | Address::ScsLightPointGroup { .. }
                | Address::ZigbeeAllDevicesAllUnits
                | Address::ZigbeeAllDevicesSpecificUnit { .. }
                | Address::ZigbeeSpecificDeviceAllUnits { .. }
        )
    }

    /// Whether `reply` falls within the scope of `self`, used by the send
    /// state machine's reply-matching rule (spec §4.5): "the addresses are
    /// equal, or the request is broadcast and the reply's address is in the
    /// request's scope". Device/unit group membership is owned by the
    /// external device catalog (spec §6), which this crate does not have —
    /// so a broadcast address is treated as covering any non-`Unknown`
    /// reply address of the same protocol family, and a non-broadcast
    /// address only ever matches itself exactly.
    pub fn scope_contains(&self, reply: &Address) -> bool {
        if self == reply {
            return true;
        }
        if !self.is_broadcast() {
            return false;
        }
        !matches!(reply, Address::Unknown { .. })
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
