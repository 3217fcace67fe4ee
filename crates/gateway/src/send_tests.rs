// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
use super::*;
use crate::frame::Frame;
use crate::gateway::{DeviceCapabilities, Medium, TransportDescriptor};
use crate::message::Direction;
use std::time::Duration;

fn msg(wire: &str, protocol: Protocol, direction: Direction) -> Message {
    Message::classify(Frame::parse(wire.as_bytes()).unwrap(), protocol, direction)
}

fn test_gateway() -> Gateway {
    Gateway::new(
        "test",
        Protocol::Scs,
        TransportDescriptor::Tcp { host: "127.0.0.1".to_owned(), port: 0 },
        DeviceCapabilities::GENERIC_ONLY,
        Medium::Bus,
    )
    .unwrap()
}

#[tokio::test]
async fn next_control_skips_non_control_frames_and_returns_ack() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(msg("*1*1*21##", Protocol::Scs, Direction::Received)).unwrap();
    tx.send(msg("*#*1##", Protocol::Scs, Direction::Received)).unwrap();
    assert_eq!(next_control(&mut rx).await, Some(MessageType::Ack));
}

#[tokio::test]
async fn next_control_reports_nack_and_busy_nack() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(msg("*#*0##", Protocol::Scs, Direction::Received)).unwrap();
    assert_eq!(next_control(&mut rx).await, Some(MessageType::Nack));

    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(msg("*#*6##", Protocol::Zigbee, Direction::Received)).unwrap();
    assert_eq!(next_control(&mut rx).await, Some(MessageType::BusyNack));
}

#[tokio::test]
async fn next_control_returns_none_when_channel_closes() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    drop(tx);
    assert_eq!(next_control(&mut rx).await, None);
}

#[tokio::test]
async fn next_action_validation_matches_target_address_only() {
    let target = Address::NitooUnit { device: "12".to_owned(), unit: "1".to_owned() };
    let (tx, mut rx) = mpsc::unbounded_channel();
    // Diagnostics for a different device should be ignored.
    tx.send(msg("*1000*72*13*2##", Protocol::Nitoo, Direction::Received)).unwrap();
    tx.send(msg("*1000*72*12*1##", Protocol::Nitoo, Direction::Received)).unwrap();
    assert_eq!(next_action_validation(&mut rx, Some(&target)).await, Some(true));
}

#[tokio::test]
async fn next_action_validation_reports_invalid_action() {
    let target = Address::NitooUnit { device: "12".to_owned(), unit: "1".to_owned() };
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(msg("*1000*73*12*1##", Protocol::Nitoo, Direction::Received)).unwrap();
    assert_eq!(next_action_validation(&mut rx, Some(&target)).await, Some(false));
}

#[test]
fn matches_reply_requires_same_protocol_and_who() {
    let request = msg("*1*1*21##", Protocol::Scs, Direction::Sent);
    let same_who = msg("*1*0*21##", Protocol::Scs, Direction::Received);
    assert!(matches_reply(&request, &same_who, &ReplyKind::Status));

    let other_who = msg("*2*0*21##", Protocol::Scs, Direction::Received);
    assert!(!matches_reply(&request, &other_who, &ReplyKind::Status));

    let other_protocol = msg("*1*0*21##", Protocol::Nitoo, Direction::Received);
    assert!(!matches_reply(&request, &other_protocol, &ReplyKind::Status));
}

#[test]
fn matches_reply_allows_broadcast_scope() {
    let request = msg("*1*1*0##", Protocol::Scs, Direction::Sent);
    let reply = msg("*1*0*21##", Protocol::Scs, Direction::Received);
    assert!(matches_reply(&request, &reply, &ReplyKind::Status));
}

#[test]
fn matches_reply_checks_dimension_equality() {
    let request = msg("*#1*21*11##", Protocol::Scs, Direction::Sent);
    let matching = msg("*#1*21*11*500##", Protocol::Scs, Direction::Received);
    assert!(matches_reply(&request, &matching, &ReplyKind::Dimension));

    let other_dimension = msg("*#1*21*12*500##", Protocol::Scs, Direction::Received);
    assert!(!matches_reply(&request, &other_dimension, &ReplyKind::Dimension));
}

#[tokio::test]
async fn collect_replies_fails_with_no_status_received_on_unique_empty_timeout() {
    let mut gateway = test_gateway();
    let mut options = gateway.options.clone();
    options.unique_status_reply_timeout = Duration::from_millis(30);
    gateway = gateway.with_options(options).unwrap();

    let request = msg("*1*1*21##", Protocol::Scs, Direction::Sent);
    let (_tx, mut rx) = mpsc::unbounded_channel();
    let err = collect_replies(&gateway, &mut rx, &request, ReplyKind::Status).await.unwrap_err();
    assert_eq!(err, SendError::NoStatusReceived);
}

#[tokio::test]
async fn collect_replies_succeeds_once_a_unique_reply_arrives() {
    let mut gateway = test_gateway();
    let mut options = gateway.options.clone();
    options.unique_status_reply_timeout = Duration::from_millis(200);
    gateway = gateway.with_options(options).unwrap();

    let request = msg("*1*1*21##", Protocol::Scs, Direction::Sent);
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(msg("*1*0*21##", Protocol::Scs, Direction::Received)).unwrap();
    collect_replies(&gateway, &mut rx, &request, ReplyKind::Status).await.unwrap();
}

#[tokio::test]
async fn collect_replies_tolerates_empty_set_for_broadcast() {
    let mut gateway = test_gateway();
    let mut options = gateway.options.clone();
    options.multiple_status_reply_timeout = Duration::from_millis(30);
    gateway = gateway.with_options(options).unwrap();

    let request = msg("*1*1*0##", Protocol::Scs, Direction::Sent);
    let (_tx, mut rx) = mpsc::unbounded_channel();
    collect_replies(&gateway, &mut rx, &request, ReplyKind::Status).await.unwrap();
}

#[tokio::test]
async fn collect_replies_drains_a_broadcast_group_until_quiet() {
    let mut gateway = test_gateway();
    let mut options = gateway.options.clone();
    options.multiple_status_reply_timeout = Duration::from_millis(60);
    gateway = gateway.with_options(options).unwrap();

    let request = msg("*1*1*0##", Protocol::Scs, Direction::Sent);
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(msg("*1*0*21##", Protocol::Scs, Direction::Received)).unwrap();
    tx.send(msg("*1*0*22##", Protocol::Scs, Direction::Received)).unwrap();
    collect_replies(&gateway, &mut rx, &request, ReplyKind::Status).await.unwrap();
}
