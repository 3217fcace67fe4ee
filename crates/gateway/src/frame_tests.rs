// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
use super::*;
use crate::error::FrameError;
use proptest::prelude::*;

#[test]
fn parses_ack() {
    let frame = Frame::parse(b"*#*1##").unwrap();
    assert_eq!(frame.fields(), &[vec!["".to_owned(), "".to_owned()], vec!["1".to_owned()]]);
}

#[test]
fn parses_bus_command() {
    let frame = Frame::parse(b"*1*1*21##").unwrap();
    assert_eq!(
        frame.fields(),
        &[vec!["1".to_owned()], vec!["1".to_owned()], vec!["21".to_owned()]]
    );
}

#[test]
fn rejects_missing_start() {
    assert_eq!(Frame::parse(b"1*1*21##"), Err(FrameError::MissingStart));
    assert_eq!(Frame::parse(b""), Err(FrameError::MissingStart));
}

#[test]
fn rejects_missing_end() {
    assert_eq!(Frame::parse(b"*1*1*21#"), Err(FrameError::MissingEnd));
}

#[test]
fn rejects_illegal_character() {
    assert_eq!(Frame::parse(b"*1*x*21##"), Err(FrameError::IllegalCharacter(b'x')));
}

#[test]
fn rejects_trailing_bytes() {
    assert_eq!(Frame::parse(b"*1*1*21##*#*1##"), Err(FrameError::TrailingBytes(7)));
}

#[test]
fn empty_where_field_round_trips() {
    // Zigbee general command: *1*0*##
    let frame = Frame::parse(b"*1*0*##").unwrap();
    assert_eq!(frame.serialize(), b"*1*0*##");
}

#[test]
fn serialize_is_exact_round_trip() {
    for wire in ["*#*1##", "*#*0##", "*#*6##", "*1*1*21##", "*#18*51*3*1000##", "*99*0##"] {
        let frame = Frame::parse(wire.as_bytes()).unwrap();
        assert_eq!(frame.serialize(), wire.as_bytes(), "round trip of {wire}");
    }
}

fn arb_parameter() -> impl Strategy<Value = String> {
    "[0-9]{0,4}"
}

fn arb_field() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_parameter(), 1..4)
}

fn arb_frame() -> impl Strategy<Value = Frame> {
    proptest::collection::vec(arb_field(), 1..5).prop_map(Frame::new)
}

proptest! {
    /// Testable property 2 (spec §8): parse(serialize(f)) == f.
    #[test]
    fn prop_parse_of_serialize_is_identity(frame in arb_frame()) {
        let wire = frame.serialize();
        let parsed = Frame::parse(&wire).unwrap();
        prop_assert_eq!(parsed, frame);
    }

    /// Testable property 1 (spec §8): for any wire bytes that parse, re-serializing
    /// reproduces those exact bytes.
    #[test]
    fn prop_serialize_of_parse_is_identity(frame in arb_frame()) {
        let wire = frame.serialize();
        let reparsed = Frame::parse(&wire).unwrap();
        prop_assert_eq!(reparsed.serialize(), wire);
    }
}
