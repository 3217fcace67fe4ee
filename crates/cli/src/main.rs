// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
use std::time::Duration;

use clap::Parser;
use openwebnet_gateway::frame::Frame;
use openwebnet_gateway::gateway::{DeviceCapabilities, Gateway, Medium, Protocol, TransportDescriptor};
use openwebnet_gateway::message::{Direction, Message};
use openwebnet_gateway::notification::{Notification, Transaction, TransmissionOptions};
use openwebnet_gateway::Runtime;

/// Manual test harness for openwebnet-gateway: opens one gateway connection
/// and prints every notification it produces.
#[derive(Debug, Parser)]
#[command(name = "openwebnet-cli")]
struct Cli {
    /// Gateway name, used to route notifications and outgoing messages.
    #[arg(long, default_value = "gateway", env = "OWN_GATEWAY_NAME")]
    name: String,

    /// OpenWebNet flavor the gateway speaks.
    #[arg(long, value_enum, default_value_t = ProtocolArg::Scs, env = "OWN_PROTOCOL")]
    protocol: ProtocolArg,

    /// Physical medium the target devices sit on.
    #[arg(long, value_enum, default_value_t = MediumArg::Bus, env = "OWN_MEDIUM")]
    medium: MediumArg,

    /// Gateway host (TCP transport).
    #[arg(long, default_value = "127.0.0.1", env = "OWN_HOST")]
    host: String,

    /// Gateway port (TCP transport).
    #[arg(long, default_value_t = 20000, env = "OWN_PORT")]
    port: u16,

    /// OpenWebNet password, required if the gateway challenges.
    #[arg(long, env = "OWN_PASSWORD")]
    password: Option<String>,

    /// Send a single frame on startup (e.g. "*1*1*21##"), then wait a few
    /// seconds for its terminal notification and exit.
    #[arg(long)]
    send: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProtocolArg {
    Scs,
    Nitoo,
    Zigbee,
}

impl From<ProtocolArg> for Protocol {
    fn from(value: ProtocolArg) -> Self {
        match value {
            ProtocolArg::Scs => Protocol::Scs,
            ProtocolArg::Nitoo => Protocol::Nitoo,
            ProtocolArg::Zigbee => Protocol::Zigbee,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum MediumArg {
    Bus,
    Powerline,
    Radio,
}

impl From<MediumArg> for Medium {
    fn from(value: MediumArg) -> Self {
        match value {
            MediumArg::Bus => Medium::Bus,
            MediumArg::Powerline => Medium::Powerline,
            MediumArg::Radio => Medium::Radio,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let protocol: Protocol = cli.protocol.into();
    let capabilities = match protocol {
        Protocol::Zigbee => DeviceCapabilities::EVENT_AND_COMMAND_POOL,
        Protocol::Scs | Protocol::Nitoo => DeviceCapabilities::GENERIC_ONLY,
    };

    let mut gateway = Gateway::new(
        cli.name.clone(),
        protocol,
        TransportDescriptor::Tcp { host: cli.host.clone(), port: cli.port },
        capabilities,
        cli.medium.into(),
    )?;
    if let Some(password) = cli.password {
        gateway = gateway.with_password(password);
    }

    let runtime = Runtime::new();
    let mut notifications = runtime.bus().subscribe();
    runtime.start(gateway);

    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            print_notification(&notification);
        }
    });

    if let Some(wire) = cli.send {
        let frame = Frame::parse(wire.as_bytes())?;
        let message = Message::classify(frame, protocol, Direction::Sent);
        runtime.bus().publish(Notification::MessageReady {
            gateway: cli.name,
            message,
            options: TransmissionOptions::new(),
            txn: Transaction::new(),
        });
        tokio::time::sleep(Duration::from_secs(5)).await;
        runtime.shutdown();
    } else {
        tokio::signal::ctrl_c().await?;
        runtime.shutdown();
    }

    let _ = printer.await;
    Ok(())
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::MessageReady { gateway, message, .. } => {
            tracing::info!(gateway, frame = %message.frame, "message ready");
        }
        Notification::MessageSent { gateway, message, session, .. } => {
            tracing::info!(gateway, session, frame = %message.frame, "message sent");
        }
        Notification::MessageReceived { gateway, message, session } => {
            tracing::info!(gateway, session, frame = %message.frame, "message received");
        }
        Notification::InvalidAction { gateway, message, session, .. } => {
            tracing::warn!(gateway, session, frame = %message.frame, "invalid action");
        }
        Notification::InvalidFrame { gateway, message, session, .. } => {
            tracing::warn!(gateway, session, frame = %message.frame, "invalid frame");
        }
        Notification::NoActionReceived { gateway, message, session, .. } => {
            tracing::warn!(gateway, session, frame = %message.frame, "no action received");
        }
        Notification::NoAcknowledgmentReceived { gateway, message, session, .. } => {
            tracing::warn!(gateway, session, frame = %message.frame, "no acknowledgment received");
        }
        Notification::GatewayBusy { gateway, message, session, .. } => {
            tracing::warn!(gateway, session, frame = %message.frame, "gateway busy");
        }
    }
}
