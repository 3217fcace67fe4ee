// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Gateway descriptors and configuration (spec §3: Gateway, GatewayOptions).

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// The OpenWebNet flavor a gateway speaks. Governs negotiation steps
/// (spec §4.4), retry caps (spec §4.7), and address parsing (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Protocol {
    Scs,
    Nitoo,
    Zigbee,
}

/// The physical carrier a target device sits on. Governs retry
/// aggressiveness for timeout-class send errors (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Medium {
    Bus,
    Powerline,
    Radio,
}

/// How a session reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportDescriptor {
    Tcp { host: String, port: u16 },
    Serial(SerialSettings),
}

/// Serial port parameters, defaulted to the common BTicino SCS setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub parity: tokio_serial::Parity,
    pub stop_bits: tokio_serial::StopBits,
    pub flow_control: tokio_serial::FlowControl,
}

impl SerialSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: 19200,
            data_bits: tokio_serial::DataBits::Eight,
            parity: tokio_serial::Parity::None,
            stop_bits: tokio_serial::StopBits::One,
            flow_control: tokio_serial::FlowControl::None,
        }
    }
}

/// Declares which session kinds a gateway's device definition supports
/// (spec §4.6 startup / spec §6 device definition catalog). The real
/// catalog is an external, out-of-scope lookup keyed by (brand, model);
/// callers resolve it themselves and pass the result in here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub generic_session: bool,
    pub event_session: bool,
    pub command_sessions: bool,
}

impl DeviceCapabilities {
    /// The common shape for SCS and Nitoo gateways, which multiplex
    /// everything over one session type (spec §4.4 "Command vs Event vs
    /// Generic").
    pub const GENERIC_ONLY: Self =
        Self { generic_session: true, event_session: false, command_sessions: false };

    /// The common shape for Zigbee gateways, which separate an event feed
    /// from a pool of short-lived command sessions.
    pub const EVENT_AND_COMMAND_POOL: Self =
        Self { generic_session: false, event_session: true, command_sessions: true };

    /// Reject combinations the worker can't route safely. `worker::spawn`
    /// subscribes to the same per-gateway notification stream once for the
    /// shared Generic session and once for the command pool, so enabling
    /// both would deliver (and send) every `MessageReady` twice.
    pub fn validate(&self) -> Result<()> {
        if self.generic_session && self.command_sessions {
            return Err(ConfigError::ConflictingSessionCapabilities.into());
        }
        Ok(())
    }
}

/// Reserved hook for overriding the outgoing-message resilience policy
/// (spec §4.7). Selecting anything other than the documented default table
/// is not yet supported; the type exists so `GatewayOptions` matches the
/// specified shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutgoingMessageResilience;

/// Reserved hook for overriding the session resilience policy (spec §4.7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionResilience;

/// Timings and policies scoped to one gateway (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    pub action_validation_timeout: Duration,
    pub command_session_lifetime: Duration,
    pub connection_negotiation_timeout: Duration,
    pub enable_supervision_mode: bool,
    pub frame_ack_timeout: Duration,
    pub max_concurrent_command_sessions: usize,
    pub multiple_dimension_reply_timeout: Duration,
    pub multiple_status_reply_timeout: Duration,
    pub outgoing_message_processing_timeout: Duration,
    pub post_sending_delay: Duration,
    pub unique_dimension_reply_timeout: Duration,
    pub unique_status_reply_timeout: Duration,
    pub outgoing_message_resilience: OutgoingMessageResilience,
    pub session_resilience: SessionResilience,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            action_validation_timeout: Duration::from_secs(5),
            command_session_lifetime: Duration::from_secs(30),
            connection_negotiation_timeout: Duration::from_secs(10),
            enable_supervision_mode: false,
            frame_ack_timeout: Duration::from_secs(2),
            max_concurrent_command_sessions: 3,
            multiple_dimension_reply_timeout: Duration::from_secs(3),
            multiple_status_reply_timeout: Duration::from_secs(3),
            outgoing_message_processing_timeout: Duration::from_secs(15),
            post_sending_delay: Duration::from_millis(500),
            unique_dimension_reply_timeout: Duration::from_secs(2),
            unique_status_reply_timeout: Duration::from_secs(2),
            outgoing_message_resilience: OutgoingMessageResilience,
            session_resilience: SessionResilience,
        }
    }
}

fn require_nonzero(d: Duration, field: &'static str) -> Result<()> {
    if d.is_zero() {
        return Err(ConfigError::ZeroDuration { field }.into());
    }
    Ok(())
}

impl GatewayOptions {
    /// Validate the values a caller supplied (spec §3 AMBIENT construction
    /// validation). `protocol` decides whether a zero command-session pool
    /// is legal.
    pub fn validate(&self, protocol: Protocol) -> Result<()> {
        require_nonzero(self.connection_negotiation_timeout, "connection_negotiation_timeout")?;
        require_nonzero(self.frame_ack_timeout, "frame_ack_timeout")?;
        require_nonzero(self.outgoing_message_processing_timeout, "outgoing_message_processing_timeout")?;
        if protocol == Protocol::Nitoo {
            require_nonzero(self.action_validation_timeout, "action_validation_timeout")?;
        }
        let needs_command_pool = matches!(protocol, Protocol::Zigbee);
        if needs_command_pool && self.max_concurrent_command_sessions == 0 {
            return Err(ConfigError::NoCommandSessionCapacity.into());
        }
        Ok(())
    }
}

/// An immutable gateway descriptor (spec §3). Lives for the process once
/// constructed.
#[derive(Debug, Clone)]
pub struct Gateway {
    pub name: String,
    pub protocol: Protocol,
    pub transport: TransportDescriptor,
    pub password: Option<String>,
    pub capabilities: DeviceCapabilities,
    pub medium: Medium,
    pub options: GatewayOptions,
}

impl Gateway {
    pub fn new(
        name: impl Into<String>,
        protocol: Protocol,
        transport: TransportDescriptor,
        capabilities: DeviceCapabilities,
        medium: Medium,
    ) -> Result<Self> {
        capabilities.validate()?;
        let options = GatewayOptions::default();
        options.validate(protocol)?;
        Ok(Self { name: name.into(), protocol, transport, password: None, capabilities, medium, options })
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_options(mut self, options: GatewayOptions) -> Result<Self> {
        options.validate(self.protocol)?;
        self.options = options;
        Ok(self)
    }

    /// Whether this gateway's options require a password but none is set
    /// (checked lazily — SCS gateways tolerate unauthenticated negotiation
    /// when the real gateway never challenges, spec §4.4 step 2).
    pub fn require_password(&self) -> Result<&str> {
        self.password.as_deref().ok_or_else(|| ConfigError::MissingPassword.into())
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
