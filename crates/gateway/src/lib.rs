// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! OpenWebNet text-frame protocol client: session negotiation, the send
//! state machine, and a per-gateway worker supervisor over TCP or serial
//! transports (spec overview, §4).

pub mod address;
pub mod auth;
pub mod bus;
pub mod error;
pub mod frame;
pub mod gateway;
pub mod message;
pub mod notification;
pub mod resilience;
pub mod send;
pub mod session;
pub mod transport;
pub mod worker;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use bus::NotificationBus;
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayOptions, Medium, Protocol};
pub use notification::{Notification, Transaction, TransmissionOptions};

/// Runs the worker fleet for a set of configured gateways against one
/// shared notification bus (spec §4.6, §4.8). One `Runtime` per process.
pub struct Runtime {
    bus: Arc<NotificationBus>,
    cancel: CancellationToken,
}

impl Runtime {
    pub fn new() -> Self {
        Self { bus: Arc::new(NotificationBus::new()), cancel: CancellationToken::new() }
    }

    /// The bus every started gateway publishes to and reads `MessageReady`
    /// notifications from. Callers publish outgoing messages and subscribe
    /// for results here.
    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Spawn the worker tasks for one gateway (spec §4.6 startup). The
    /// gateway starts consuming `MessageReady` notifications addressed to
    /// it immediately.
    pub fn start(&self, gateway: Gateway) {
        worker::spawn(Arc::new(gateway), Arc::clone(&self.bus), self.cancel.child_token());
    }

    /// Cancel every worker, session, and in-flight send this runtime owns.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
