// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
use super::*;

#[test]
fn scs_general() {
    let addr = Address::parse(Protocol::Scs, &["0".to_owned()]);
    assert_eq!(addr, Address::ScsLightPointGeneral);
    assert!(addr.is_broadcast());
}

#[test]
fn scs_area() {
    let addr = Address::parse(Protocol::Scs, &["3".to_owned()]);
    assert_eq!(addr, Address::ScsLightPointArea { area: "3".to_owned() });
    assert!(addr.is_broadcast());
}

#[test]
fn scs_group_uses_hash_prefix_encoding() {
    let addr = Address::parse(Protocol::Scs, &[String::new(), "4".to_owned()]);
    assert_eq!(addr, Address::ScsLightPointGroup { group: "4".to_owned() });
}

#[test]
fn scs_point_to_point() {
    let addr = Address::parse(Protocol::Scs, &["21".to_owned()]);
    assert_eq!(addr, Address::ScsLightPointPointToPoint { point: "21".to_owned() });
    assert!(!addr.is_broadcast());
}

#[test]
fn zigbee_all_devices_all_units() {
    let addr = Address::parse(Protocol::Zigbee, &["0".to_owned(), "0".to_owned()]);
    assert_eq!(addr, Address::ZigbeeAllDevicesAllUnits);
}

#[test]
fn zigbee_specific_device_specific_unit() {
    let addr =
        Address::parse(Protocol::Zigbee, &["7360958".to_owned(), "9".to_owned()]);
    assert_eq!(
        addr,
        Address::ZigbeeSpecificDeviceSpecificUnit {
            device: "7360958".to_owned(),
            unit: "9".to_owned()
        }
    );
    assert!(!addr.is_broadcast());
}

#[test]
fn scope_contains_matches_exact_address() {
    let point = Address::ScsLightPointPointToPoint { point: "21".to_owned() };
    assert!(point.scope_contains(&point));
}

#[test]
fn broadcast_scope_contains_any_known_reply() {
    let general = Address::ScsLightPointGeneral;
    let point = Address::ScsLightPointPointToPoint { point: "21".to_owned() };
    assert!(general.scope_contains(&point));
}

#[test]
fn non_broadcast_scope_excludes_other_addresses() {
    let a = Address::ScsLightPointPointToPoint { point: "21".to_owned() };
    let b = Address::ScsLightPointPointToPoint { point: "22".to_owned() };
    assert!(!a.scope_contains(&b));
}

#[test]
fn round_trips_to_field() {
    for field in [vec!["21".to_owned()], vec![String::new(), "4".to_owned()], vec!["0".to_owned()]] {
        let addr = Address::parse(Protocol::Scs, &field);
        assert_eq!(addr.to_field(), field);
    }
}
