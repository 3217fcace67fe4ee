// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Per-gateway supervisor (spec §4.6): keeps the shared Generic/Event
//! session(s) alive under the session resilience backoff, and runs a pool
//! of ad-hoc Command sessions that pick up outgoing notifications.
//!
//! Grounded in the teacher's `upstream::bridge::run_loop`: a reconnect loop
//! around one long-lived connection, with an inner `tokio::select!` reading
//! both the wire and a local channel, restarting on any connection failure
//! at backed-off intervals instead of busy-looping.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bus::NotificationBus;
use crate::gateway::Gateway;
use crate::message::Message;
use crate::notification::{Notification, Transaction, TransmissionOptions};
use crate::send;
use crate::session::{Session, SessionType};

/// Spawn every task this gateway needs (shared sessions plus the command
/// pool) under `cancel`. Returns once all spawns have been issued; the
/// tasks themselves run until `cancel` fires.
pub fn spawn(gateway: Arc<Gateway>, bus: Arc<NotificationBus>, cancel: CancellationToken) {
    if gateway.capabilities.generic_session {
        let outgoing = bus.subscribe_gateway(gateway.name.clone());
        tokio::spawn(shared_session_loop(
            Arc::clone(&gateway),
            Arc::clone(&bus),
            SessionType::Generic,
            Some(outgoing),
            cancel.child_token(),
        ));
    }
    if gateway.capabilities.event_session {
        tokio::spawn(shared_session_loop(
            Arc::clone(&gateway),
            Arc::clone(&bus),
            SessionType::Event,
            None,
            cancel.child_token(),
        ));
    }
    if gateway.capabilities.command_sessions {
        let pool_outgoing = bus.subscribe_gateway(gateway.name.clone());
        let pool_outgoing = Arc::new(tokio::sync::Mutex::new(pool_outgoing));
        for _ in 0..gateway.options.max_concurrent_command_sessions {
            tokio::spawn(command_worker(
                Arc::clone(&gateway),
                Arc::clone(&bus),
                Arc::clone(&pool_outgoing),
                cancel.child_token(),
            ));
        }
    }
}

/// Only `MessageReady` notifications drive sends; anything else on the
/// per-gateway channel is ignored by these workers.
fn next_message_ready(notification: Notification) -> Option<(Message, TransmissionOptions, Transaction)> {
    match notification {
        Notification::MessageReady { message, options, txn, .. } => Some((message, options, txn)),
        _ => None,
    }
}

/// A session that stays open at least this long is treated as having
/// recovered, resetting the reopen backoff; one that faults sooner than
/// this keeps the backoff climbing, so a gateway stuck in a reboot loop
/// doesn't get hammered with zero-delay reconnects.
const STABLE_SESSION_THRESHOLD: std::time::Duration = std::time::Duration::from_secs(1);

async fn shared_session_loop(
    gateway: Arc<Gateway>,
    bus: Arc<NotificationBus>,
    session_type: SessionType,
    mut outgoing: Option<mpsc::UnboundedReceiver<Notification>>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let opened = tokio::select! {
            _ = cancel.cancelled() => return,
            opened = Session::open(&gateway, session_type, &cancel) => opened,
        };

        let (session, mut unsolicited) = match opened {
            Ok(pair) => pair,
            Err(err) => {
                tracing::debug!(gateway = %gateway.name, error = %err, "session open failed, backing off");
                let delay = gateway.options.session_resilience.reopen_delay(attempt);
                attempt = attempt.saturating_add(1);
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => continue,
                }
            }
        };
        let opened_at = tokio::time::Instant::now();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    session.close().await;
                    return;
                }
                _ = session.cancellation().cancelled() => break,
                received = unsolicited.recv() => {
                    match received {
                        Some(message) => {
                            bus.publish(Notification::MessageReceived {
                                gateway: gateway.name.clone(),
                                message,
                                session: session.id,
                            });
                        }
                        None => break,
                    }
                }
                ready = recv_ready(&mut outgoing) => {
                    match ready {
                        Some(notification) => {
                            if let Some((message, options, txn)) = next_message_ready(notification) {
                                run_with_retries(&gateway, &bus, &session, message, options, txn).await;
                            }
                        }
                        None => {
                            if outgoing.is_some() {
                                break;
                            }
                        }
                    }
                }
            }
        }
        session.close().await;

        if opened_at.elapsed() >= STABLE_SESSION_THRESHOLD {
            attempt = 0;
        }
        let delay = gateway.options.session_resilience.reopen_delay(attempt);
        attempt = attempt.saturating_add(1);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => continue,
        }
    }
}

/// `tokio::select!` needs a future even for the Event session, which has no
/// reader to drain; park forever rather than special-casing the select arm.
async fn recv_ready(outgoing: &mut Option<mpsc::UnboundedReceiver<Notification>>) -> Option<Notification> {
    match outgoing {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn command_worker(
    gateway: Arc<Gateway>,
    bus: Arc<NotificationBus>,
    outgoing: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Notification>>>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    'pool_slot: loop {
        if cancel.is_cancelled() {
            return;
        }

        let first = {
            let mut rx = outgoing.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => return,
                received = rx.recv() => received,
            }
        };
        let Some((message, options, txn)) = first.and_then(next_message_ready) else { continue };

        let opened = Session::open(&gateway, SessionType::Command, &cancel).await;
        let session = match opened {
            Ok((session, _unsolicited)) => {
                attempt = 0;
                session
            }
            Err(err) => {
                tracing::debug!(gateway = %gateway.name, error = %err, "command session open failed");
                let delay = gateway.options.session_resilience.reopen_delay(attempt);
                attempt = attempt.saturating_add(1);
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => continue 'pool_slot,
                }
            }
        };

        if run_with_retries(&gateway, &bus, &session, message, options, txn).await.is_session_fatal() {
            session.close().await;
            continue 'pool_slot;
        }

        let mut lifetime_deadline = tokio::time::Instant::now() + gateway.options.command_session_lifetime;
        loop {
            if tokio::time::Instant::now() >= lifetime_deadline {
                break;
            }
            let next = {
                let mut rx = outgoing.lock().await;
                tokio::select! {
                    _ = cancel.cancelled() => { session.close().await; return; }
                    _ = tokio::time::sleep_until(lifetime_deadline) => None,
                    received = rx.recv() => Some(received),
                }
            };
            let Some(received) = next else { break };
            let Some((message, options, txn)) = received.and_then(next_message_ready) else { continue };
            if run_with_retries(&gateway, &bus, &session, message, options, txn).await.is_session_fatal() {
                session.close().await;
                continue 'pool_slot;
            }
            lifetime_deadline = tokio::time::Instant::now() + gateway.options.command_session_lifetime;
        }
        session.close().await;
    }
}

/// Outcome of one gateway-level send, after the resilience policy has run
/// its course, used only to decide whether the owning session must reopen.
struct SendOutcome {
    session_fatal: bool,
}

impl SendOutcome {
    fn is_session_fatal(&self) -> bool {
        self.session_fatal
    }
}

/// Drive one outgoing notification through the send SM, retrying per
/// `outgoing_message_resilience` (spec §4.7), and publish exactly one
/// terminal notification (spec §4.6 ordering guarantee).
async fn run_with_retries(
    gateway: &Gateway,
    bus: &NotificationBus,
    session: &Session,
    message: Message,
    options: TransmissionOptions,
    txn: Transaction,
) -> SendOutcome {
    let mut attempt: u32 = 0;
    loop {
        match send::attempt(session, gateway, &message, options).await {
            Ok(()) => {
                bus.publish(Notification::MessageSent {
                    gateway: gateway.name.clone(),
                    message,
                    session: session.id,
                    txn,
                });
                return SendOutcome { session_fatal: false };
            }
            Err(kind) => {
                let should_retry = gateway.options.outgoing_message_resilience.should_retry(
                    gateway.protocol,
                    gateway.medium,
                    kind,
                    options,
                    attempt,
                );
                if should_retry {
                    let delay = gateway
                        .options
                        .outgoing_message_resilience
                        .retry_delay(attempt, options.disable_post_sending_delay);
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                    continue;
                }

                if let Some(notification) =
                    Notification::terminal_for(gateway.name.clone(), message.clone(), session.id, txn, kind)
                {
                    bus.publish(notification);
                }
                return SendOutcome { session_fatal: kind.is_session_fatal() };
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
