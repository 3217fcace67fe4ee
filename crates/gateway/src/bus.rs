// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Notification bus (spec §4.8): an ordered, non-backpressuring broadcast of
//! [`Notification`]s, with per-gateway filtering for subscribers that only
//! care about one gateway.
//!
//! Every subscriber gets its own `mpsc::UnboundedSender`/`Receiver` pair;
//! `publish()` clones the notification out to each live sender in turn —
//! the same per-subscriber fan-out `subscribe_gateway`'s forwarding task
//! already does downstream. Unlike `tokio::sync::broadcast` there is no
//! shared bounded ring buffer a slow subscriber can fall behind on: spec
//! §4.8 requires every notification reach every subscriber, not best-effort
//! delivery.

use std::sync::Mutex as StdMutex;

use tokio::sync::mpsc;

use crate::notification::Notification;

/// The shared bus every gateway worker publishes to.
pub struct NotificationBus {
    subscribers: StdMutex<Vec<mpsc::UnboundedSender<Notification>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self { subscribers: StdMutex::new(Vec::new()) }
    }

    /// Publish a notification to every current subscriber, in order.
    /// Returns how many subscribers it was delivered to (`0` if there are
    /// currently none — never an error, an empty bus is a normal state).
    /// Closed subscribers are pruned rather than counted.
    pub fn publish(&self, notification: Notification) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut delivered = 0;
        subscribers.retain(|tx| {
            let ok = tx.send(notification.clone()).is_ok();
            if ok {
                delivered += 1;
            }
            ok
        });
        delivered
    }

    /// Subscribe to every notification on the bus, regardless of gateway.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(tx);
        rx
    }

    /// Subscribe to notifications for one gateway only. Spawns a forwarding
    /// task that filters the full notification stream down to an unbounded
    /// per-subscriber channel, mirroring the teacher's per-client filtering
    /// in `WsBridge::run_loop`.
    pub fn subscribe_gateway(&self, gateway: impl Into<String>) -> mpsc::UnboundedReceiver<Notification> {
        let gateway = gateway.into();
        let mut rx = self.subscribe();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if notification.gateway() == gateway {
                    if out_tx.send(notification).is_err() {
                        return;
                    }
                }
            }
        });

        out_rx
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
