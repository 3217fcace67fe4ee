// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Workspace-wide error taxonomy.
//!
//! Every fallible operation in this crate resolves to [`Error`], built from
//! per-stage variants so the resilience policy ([`crate::resilience`]) can
//! dispatch on error *kind* rather than string-matching a message.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Frame codec failures (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame is missing the '*' start delimiter")]
    MissingStart,
    #[error("frame is missing the '##' end delimiter")]
    MissingEnd,
    #[error("frame contains a byte outside the OpenWebNet alphabet: {0:#04x}")]
    IllegalCharacter(u8),
    #[error("{0} trailing byte(s) after the frame's '##' terminator")]
    TrailingBytes(usize),
}

/// Transport-level failures. Always session-fatal (spec §4.3).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport closed by peer")]
    Closed,
}

/// Session negotiation failures (spec §4.4). A session is never opened
/// when one of these occurs; the session resilience policy reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("gateway requested an unsupported authentication method ({0})")]
    AuthenticationMethodUnsupported(u8),
    #[error("gateway required authentication but no password was configured")]
    AuthenticationRequired,
    #[error("gateway rejected the authentication response")]
    AuthenticationInvalid,
    #[error("gateway rejected the supervisor registration request")]
    SupervisorRegistrationFailed,
    #[error("negotiation did not complete within connection_negotiation_timeout")]
    NegotiationTimeout,
}

/// One terminal outcome of a single send attempt (spec §4.5 / §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("gateway returned NACK")]
    InvalidFrame,
    #[error("gateway returned BUSY-NACK")]
    GatewayBusy,
    #[error("no ACK/NACK/BUSY-NACK received within frame_ack_timeout")]
    NoAcknowledgmentReceived,
    #[error("end device returned INVALID ACTION")]
    InvalidAction,
    #[error("no VALID/INVALID ACTION reply within action_validation_timeout")]
    NoActionReceived,
    #[error("no status reply received within the configured timeout")]
    NoStatusReceived,
    #[error("no dimension reply received within the configured timeout")]
    NoDimensionReceived,
    #[error("outgoing_message_processing_timeout elapsed")]
    ProcessingTimeout,
}

impl SendError {
    /// Whether this error kind tears down the owning session (spec §4.6 step 6, §7).
    pub fn is_session_fatal(self) -> bool {
        matches!(self, SendError::NoAcknowledgmentReceived)
    }
}

/// `GatewayOptions` / `Gateway` construction-time validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be nonzero")]
    ZeroDuration { field: &'static str },
    #[error(
        "max_concurrent_command_sessions must be nonzero when the protocol uses command sessions"
    )]
    NoCommandSessionCapacity,
    #[error("gateway requires a password but none was configured")]
    MissingPassword,
    #[error("generic_session and command_sessions cannot both be enabled: every MessageReady would be picked up and sent twice, once per session")]
    ConflictingSessionCapabilities,
}
