// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Resilience policy (spec §4.7): two pure decision functions, one per
//! retry loop. Neither policy touches I/O — the worker and send state
//! machine call these to decide whether and how long to wait, then do the
//! actual sleeping themselves against a cancellation token.

use std::time::Duration;

use crate::error::SendError;
use crate::gateway::{Medium, OutgoingMessageResilience, SessionResilience};
use crate::gateway::Protocol;
use crate::notification::TransmissionOptions;

impl OutgoingMessageResilience {
    /// Delay before the next send attempt. `attempt` is the zero-based
    /// count of attempts already made (0 before the first retry).
    pub fn retry_delay(&self, attempt: u32, disable_post_sending_delay: bool) -> Duration {
        if disable_post_sending_delay {
            match attempt {
                0 => Duration::from_millis(200),
                1 => Duration::from_millis(500),
                _ => Duration::from_secs(1),
            }
        } else {
            match attempt {
                0 => Duration::from_millis(100),
                1 => Duration::from_millis(300),
                _ => Duration::from_millis(800),
            }
        }
    }

    /// Whether a failed send attempt should be retried, given the protocol,
    /// medium, error kind, caller options, and the zero-based attempt count
    /// already made. Rules are checked in the priority order spec §4.7
    /// lists them in; the first matching rule decides.
    pub fn should_retry(
        &self,
        protocol: Protocol,
        medium: Medium,
        kind: SendError,
        options: TransmissionOptions,
        attempt: u32,
    ) -> bool {
        use SendError::{GatewayBusy, InvalidFrame, NoActionReceived, NoDimensionReceived, NoStatusReceived};

        if protocol == Protocol::Nitoo && kind == InvalidFrame {
            return attempt < 3;
        }
        if protocol == Protocol::Zigbee && matches!(kind, InvalidFrame | GatewayBusy) {
            return attempt < 2;
        }
        if protocol == Protocol::Scs && kind == InvalidFrame {
            return attempt < 1;
        }
        if matches!(kind, NoActionReceived | NoDimensionReceived | NoStatusReceived)
            && matches!(medium, Medium::Powerline | Medium::Radio)
            && !options.disallow_retransmissions
        {
            return attempt < 2;
        }
        if medium == Medium::Bus && matches!(kind, InvalidFrame | GatewayBusy) && !options.disallow_retransmissions {
            return attempt < 1;
        }
        false
    }
}

impl SessionResilience {
    /// Backoff before reopening a faulted session, keyed by the zero-based
    /// count of reopen attempts already made.
    pub fn reopen_delay(&self, attempt: u32) -> Duration {
        match attempt {
            0 | 1 => Duration::from_secs(1),
            2 | 3 => Duration::from_secs(5),
            4 | 5 => Duration::from_secs(10),
            6..=9 => Duration::from_secs(30),
            _ => Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
#[path = "resilience_tests.rs"]
mod tests;
