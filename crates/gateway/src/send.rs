// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Send state machine (spec §4.5): drives one outgoing message through
//! acknowledgment, optional action validation, and optional reply
//! collection, bounded end-to-end by `outgoing_message_processing_timeout`.
//!
//! One call to [`attempt`] is one try. Retrying across tries is the
//! [`crate::worker`]'s job, consulting [`crate::resilience`] between
//! attempts — this module only ever reports a single terminal [`SendError`].

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::address::Address;
use crate::error::SendError;
use crate::gateway::{Gateway, Protocol};
use crate::message::{Message, MessageType, NITOO_INVALID_ACTION_WHAT, NITOO_VALID_ACTION_WHAT};
use crate::notification::TransmissionOptions;
use crate::session::{self, Session};

/// Drive one send attempt to completion (spec §4.5). `message` is the
/// outgoing frame already classified the way it will be written; `options`
/// controls which stages are skipped.
pub async fn attempt(
    session: &Session,
    gateway: &Gateway,
    message: &Message,
    options: TransmissionOptions,
) -> Result<(), SendError> {
    match timeout(
        gateway.options.outgoing_message_processing_timeout,
        attempt_inner(session, gateway, message, options),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(SendError::ProcessingTimeout),
    }
}

async fn attempt_inner(
    session: &Session,
    gateway: &Gateway,
    message: &Message,
    options: TransmissionOptions,
) -> Result<(), SendError> {
    let mut guard = session::acquire_send(session).await;
    let rx = &mut guard.rx;

    // Stage 1: serialize and write.
    session.write_frame(&message.frame).await.map_err(|_| SendError::NoAcknowledgmentReceived)?;

    // Stage 2: frame acknowledgment.
    if !options.ignore_ack_validation {
        let outcome = timeout(gateway.options.frame_ack_timeout, next_control(rx)).await;
        match outcome {
            Ok(Some(MessageType::Ack)) => {}
            Ok(Some(MessageType::Nack)) => return Err(SendError::InvalidFrame),
            Ok(Some(MessageType::BusyNack)) => return Err(SendError::GatewayBusy),
            Ok(Some(_)) | Ok(None) | Err(_) => return Err(SendError::NoAcknowledgmentReceived),
        }
    }

    // Stage 3: Nitoo action validation.
    if gateway.protocol == Protocol::Nitoo && options.require_action_validation {
        let target = message.address.as_ref();
        let outcome = timeout(gateway.options.action_validation_timeout, next_action_validation(rx, target)).await;
        match outcome {
            Ok(Some(true)) => {}
            Ok(Some(false)) => return Err(SendError::InvalidAction),
            Ok(None) | Err(_) => return Err(SendError::NoActionReceived),
        }
    }

    // Stage 4: reply collection.
    match message.message_type {
        MessageType::StatusRequest => collect_replies(gateway, rx, message, ReplyKind::Status).await?,
        MessageType::DimensionRequest => collect_replies(gateway, rx, message, ReplyKind::Dimension).await?,
        _ => {}
    }

    // Stage 5: post-sending delay.
    if gateway.protocol == Protocol::Nitoo && !options.disable_post_sending_delay {
        tokio::time::sleep(gateway.options.post_sending_delay).await;
    }

    Ok(())
}

/// Pull messages off a send's reply channel until a control frame (or
/// channel close) is seen, ignoring anything else in between.
async fn next_control(rx: &mut mpsc::UnboundedReceiver<Message>) -> Option<MessageType> {
    loop {
        let message = rx.recv().await?;
        match message.message_type {
            MessageType::Ack | MessageType::Nack | MessageType::BusyNack => return Some(message.message_type),
            _ => continue,
        }
    }
}

/// Pull messages until a Nitoo VALID/INVALID ACTION diagnostics frame
/// addressed to `target` appears. Returns `true` for VALID, `false` for
/// INVALID, `None` if the channel closes first.
async fn next_action_validation(rx: &mut mpsc::UnboundedReceiver<Message>, target: Option<&Address>) -> Option<bool> {
    loop {
        let message = rx.recv().await?;
        if message.message_type != MessageType::BusCommand {
            continue;
        }
        if message.who.as_deref() != Some("1000") {
            continue;
        }
        if message.address.as_ref() != target {
            continue;
        }
        match message.what.as_deref() {
            Some(w) if w == NITOO_VALID_ACTION_WHAT => return Some(true),
            Some(w) if w == NITOO_INVALID_ACTION_WHAT => return Some(false),
            _ => continue,
        }
    }
}

enum ReplyKind {
    Status,
    Dimension,
}

/// Whether `reply` matches `request` under spec §4.5's reply matching rule.
fn matches_reply(request: &Message, reply: &Message, kind: &ReplyKind) -> bool {
    if request.protocol != reply.protocol {
        return false;
    }
    let addresses_match = match (&request.address, &reply.address) {
        (Some(req), Some(rep)) => req == rep || (req.is_broadcast() && req.scope_contains(rep)),
        _ => false,
    };
    if !addresses_match {
        return false;
    }
    if request.who != reply.who {
        return false;
    }
    match kind {
        ReplyKind::Status => matches!(reply.message_type, MessageType::BusCommand),
        ReplyKind::Dimension => {
            matches!(reply.message_type, MessageType::DimensionRead) && request.dimension == reply.dimension
        }
    }
}

/// Collect replies to one status/dimension request (spec §4.5 stage 4).
/// Single-endpoint requests use the `unique_*` timeout and require at least
/// one reply; broadcast/group requests use the `multiple_*` timeout and
/// collect until a quiet gap, tolerating an empty set.
async fn collect_replies(
    gateway: &Gateway,
    rx: &mut mpsc::UnboundedReceiver<Message>,
    request: &Message,
    kind: ReplyKind,
) -> Result<(), SendError> {
    let broadcast = request.address.as_ref().is_some_and(Address::is_broadcast);
    let (window, empty_err) = match (&kind, broadcast) {
        (ReplyKind::Status, false) => (gateway.options.unique_status_reply_timeout, Some(SendError::NoStatusReceived)),
        (ReplyKind::Status, true) => (gateway.options.multiple_status_reply_timeout, None),
        (ReplyKind::Dimension, false) => {
            (gateway.options.unique_dimension_reply_timeout, Some(SendError::NoDimensionReceived))
        }
        (ReplyKind::Dimension, true) => (gateway.options.multiple_dimension_reply_timeout, None),
    };

    let mut received_any = false;
    loop {
        match timeout(window, next_matching(rx, request, &kind)).await {
            Ok(Some(_)) => received_any = true,
            Ok(None) => return Ok(()),
            Err(_) => {
                if received_any {
                    return Ok(());
                }
                return match empty_err {
                    Some(err) => Err(err),
                    None => Ok(()),
                };
            }
        }
    }
}

async fn next_matching(rx: &mut mpsc::UnboundedReceiver<Message>, request: &Message, kind: &ReplyKind) -> Option<Message> {
    loop {
        let message = rx.recv().await?;
        if matches_reply(request, &message, kind) {
            return Some(message);
        }
    }
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
