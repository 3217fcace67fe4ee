// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Notifications exchanged on the [`crate::bus`] and the transmission
//! options bitset callers attach to an outgoing message (spec §3).

use uuid::Uuid;

use crate::error::SendError;
use crate::message::Message;

/// Caller-generated identifier correlating a `MessageReady` notification
/// with the terminal notification it eventually produces (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transaction(Uuid);

impl Transaction {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Flags controlling how the send state machine (spec §4.5) drives one
/// outgoing message. Mirrors a plain struct-of-bools rather than a packed
/// bitset — there are only four flags and each is read independently at a
/// different stage of the send pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmissionOptions {
    /// Skip the frame-acknowledgment stage (spec §4.5 stage 2).
    pub ignore_ack_validation: bool,
    /// Nitoo only: wait for VALID/INVALID ACTION from the end device
    /// (spec §4.5 stage 3).
    pub require_action_validation: bool,
    /// Nitoo only: skip the mandatory post-send quiet time (spec §4.5 stage 5).
    pub disable_post_sending_delay: bool,
    /// Suppress all `No*Received`-class retries (spec §4.7).
    pub disallow_retransmissions: bool,
}

impl TransmissionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_ack_validation(mut self) -> Self {
        self.ignore_ack_validation = true;
        self
    }

    pub fn require_action_validation(mut self) -> Self {
        self.require_action_validation = true;
        self
    }

    pub fn disable_post_sending_delay(mut self) -> Self {
        self.disable_post_sending_delay = true;
        self
    }

    pub fn disallow_retransmissions(mut self) -> Self {
        self.disallow_retransmissions = true;
        self
    }
}

/// Notifications exchanged between the worker and the application over the
/// [`crate::bus::NotificationBus`] (spec §3, §4.8). All variants carry the
/// owning gateway's name.
#[derive(Debug, Clone)]
pub enum Notification {
    MessageReady { gateway: String, message: Message, options: TransmissionOptions, txn: Transaction },
    MessageSent { gateway: String, message: Message, session: u64, txn: Transaction },
    MessageReceived { gateway: String, message: Message, session: u64 },
    InvalidAction { gateway: String, message: Message, session: u64, txn: Transaction },
    InvalidFrame { gateway: String, message: Message, session: u64, txn: Transaction },
    NoActionReceived { gateway: String, message: Message, session: u64, txn: Transaction },
    NoAcknowledgmentReceived { gateway: String, message: Message, session: u64, txn: Transaction },
    GatewayBusy { gateway: String, message: Message, session: u64, txn: Transaction },
}

impl Notification {
    pub fn gateway(&self) -> &str {
        match self {
            Notification::MessageReady { gateway, .. }
            | Notification::MessageSent { gateway, .. }
            | Notification::MessageReceived { gateway, .. }
            | Notification::InvalidAction { gateway, .. }
            | Notification::InvalidFrame { gateway, .. }
            | Notification::NoActionReceived { gateway, .. }
            | Notification::NoAcknowledgmentReceived { gateway, .. }
            | Notification::GatewayBusy { gateway, .. } => gateway,
        }
    }

    /// Build the terminal notification corresponding to one [`SendError`]
    /// kind (spec §7 table). Returns `None` for `NoStatusReceived`,
    /// `NoDimensionReceived`, and `ProcessingTimeout`, which have no
    /// dedicated notification variant.
    pub fn terminal_for(
        gateway: String,
        message: Message,
        session: u64,
        txn: Transaction,
        kind: SendError,
    ) -> Option<Notification> {
        match kind {
            SendError::InvalidFrame => Some(Notification::InvalidFrame { gateway, message, session, txn }),
            SendError::GatewayBusy => Some(Notification::GatewayBusy { gateway, message, session, txn }),
            SendError::NoAcknowledgmentReceived => {
                Some(Notification::NoAcknowledgmentReceived { gateway, message, session, txn })
            }
            SendError::InvalidAction => Some(Notification::InvalidAction { gateway, message, session, txn }),
            SendError::NoActionReceived => Some(Notification::NoActionReceived { gateway, message, session, txn }),
            SendError::NoStatusReceived | SendError::NoDimensionReceived | SendError::ProcessingTimeout => {
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
