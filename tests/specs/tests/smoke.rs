// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! End-to-end runtime smoke tests over a fake TCP gateway: negotiation,
//! a full send/ack round trip, and the reopen-on-disconnect path.

use std::time::Duration;

use openwebnet_gateway::frame::Frame;
use openwebnet_gateway::gateway::Protocol;
use openwebnet_gateway::message::{Direction, Message};
use openwebnet_gateway::notification::{Notification, Transaction, TransmissionOptions};
use openwebnet_gateway::Runtime;
use openwebnet_specs::{accept_and_negotiate, bind_loopback, fast_gateway, read_one_frame};
use tokio::io::AsyncWriteExt;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn send_and_ack_round_trip_publishes_message_sent() -> anyhow::Result<()> {
    let (listener, port) = bind_loopback().await?;
    let gateway = fast_gateway("kitchen", port, Protocol::Scs)?;

    let fake_gateway = tokio::spawn(async move {
        let mut stream = accept_and_negotiate(&listener).await?;
        let mut buf = [0u8; 64];
        read_one_frame(&mut stream, &mut buf).await?;
        stream.write_all(b"*#*1##").await?;
        anyhow::Ok(())
    });

    let runtime = Runtime::new();
    let mut notifications = runtime.bus().subscribe();
    runtime.start(gateway);

    let frame = Frame::parse(b"*1*1*21##")?;
    let message = Message::classify(frame, Protocol::Scs, Direction::Sent);
    runtime.bus().publish(Notification::MessageReady {
        gateway: "kitchen".to_owned(),
        message,
        options: TransmissionOptions::new(),
        txn: Transaction::new(),
    });

    let published = tokio::time::timeout(TIMEOUT, notifications.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("notification bus closed"))?;
    assert!(matches!(published, Notification::MessageSent { .. }));

    runtime.shutdown();
    fake_gateway.await??;
    Ok(())
}

#[tokio::test]
async fn no_acknowledgment_reports_terminal_notification() -> anyhow::Result<()> {
    let (listener, port) = bind_loopback().await?;
    let gateway = fast_gateway("hallway", port, Protocol::Scs)?;

    let fake_gateway = tokio::spawn(async move {
        let mut stream = accept_and_negotiate(&listener).await?;
        let mut buf = [0u8; 64];
        read_one_frame(&mut stream, &mut buf).await?;
        // Never reply: the client's ack wait times out.
        tokio::time::sleep(TIMEOUT).await;
        anyhow::Ok(())
    });

    let runtime = Runtime::new();
    let mut notifications = runtime.bus().subscribe();
    runtime.start(gateway);

    let frame = Frame::parse(b"*1*1*21##")?;
    let message = Message::classify(frame, Protocol::Scs, Direction::Sent);
    runtime.bus().publish(Notification::MessageReady {
        gateway: "hallway".to_owned(),
        message,
        options: TransmissionOptions::new(),
        txn: Transaction::new(),
    });

    let published = tokio::time::timeout(TIMEOUT, notifications.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("notification bus closed"))?;
    assert!(matches!(published, Notification::NoAcknowledgmentReceived { .. }));

    runtime.shutdown();
    fake_gateway.abort();
    Ok(())
}

#[tokio::test]
async fn gateway_options_reject_zero_timeouts() {
    let gateway = fast_gateway("living-room", 0, Protocol::Scs).expect("default options are valid");
    let mut bad = gateway.options.clone();
    bad.frame_ack_timeout = Duration::ZERO;
    assert!(gateway.with_options(bad).is_err());
}
