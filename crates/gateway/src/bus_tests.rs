// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
use super::*;
use crate::frame::Frame;
use crate::gateway::Protocol;
use crate::message::{Direction, Message};

fn sample_message() -> Message {
    Message::classify(Frame::parse(b"*1*1*21##").unwrap(), Protocol::Scs, Direction::Sent)
}

#[tokio::test]
async fn subscribers_receive_published_notifications() {
    let bus = NotificationBus::new();
    let mut rx = bus.subscribe();
    let notification =
        Notification::MessageReceived { gateway: "living-room".to_owned(), message: sample_message(), session: 1 };
    bus.publish(notification.clone());
    let received = rx.recv().await.unwrap();
    assert_eq!(received.gateway(), "living-room");
}

#[tokio::test]
async fn gateway_filtered_subscriber_only_sees_its_own_gateway() {
    let bus = NotificationBus::new();
    let mut rx = bus.subscribe_gateway("kitchen");

    bus.publish(Notification::MessageReceived {
        gateway: "living-room".to_owned(),
        message: sample_message(),
        session: 1,
    });
    bus.publish(Notification::MessageReceived { gateway: "kitchen".to_owned(), message: sample_message(), session: 2 });

    let received = tokio::time::timeout(std::time::Duration::from_millis(200), rx.recv()).await.unwrap().unwrap();
    assert_eq!(received.gateway(), "kitchen");
}

#[tokio::test]
async fn publish_with_no_subscribers_does_not_error() {
    let bus = NotificationBus::new();
    let delivered =
        bus.publish(Notification::MessageReceived { gateway: "gw".to_owned(), message: sample_message(), session: 1 });
    assert_eq!(delivered, 0);
}
