// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Message classifier (spec §4.2): maps a parsed [`Frame`] to a typed
//! [`Message`].

use crate::address::Address;
use crate::frame::Frame;
use crate::gateway::Protocol;

/// The classified shape of a frame (spec §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Unknown,
    Ack,
    Nack,
    BusyNack,
    BusCommand,
    StatusRequest,
    DimensionRead,
    DimensionRequest,
    DimensionSet,
}

/// Whether a frame was written by this process or read off the wire.
/// Resolves the `DimensionRead` vs `DimensionSet` ambiguity noted as an
/// open question in spec §9: a value-bearing dimension frame the session
/// *sent* is a `DimensionSet`; one it *received* is a `DimensionRead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// A classified view over a frame (spec §3).
#[derive(Debug, Clone)]
pub struct Message {
    pub message_type: MessageType,
    pub address: Option<Address>,
    pub who: Option<String>,
    pub what: Option<String>,
    pub dimension: Option<String>,
    pub values: Vec<String>,
    /// Extra WHERE-field parameters beyond what `Address` consumed (e.g. a
    /// Zigbee network/media tag riding along with device#unit).
    pub media: Option<String>,
    pub protocol: Protocol,
    pub frame: Frame,
}

const ACK_WIRE: &[u8] = b"*#*1##";
const NACK_WIRE: &[u8] = b"*#*0##";
const BUSY_NACK_WIRE: &[u8] = b"*#*6##";

/// WHAT codes for the Nitoo action-validation diagnostics frame (spec §4.5 stage 3).
pub const NITOO_VALID_ACTION_WHAT: &str = "72";
pub const NITOO_INVALID_ACTION_WHAT: &str = "73";

impl Message {
    /// Classify a frame (spec §4.2).
    pub fn classify(frame: Frame, protocol: Protocol, direction: Direction) -> Message {
        let wire = frame.serialize();
        let control = match wire.as_slice() {
            w if w == ACK_WIRE => Some(MessageType::Ack),
            w if w == NACK_WIRE => Some(MessageType::Nack),
            w if w == BUSY_NACK_WIRE => Some(MessageType::BusyNack),
            _ => None,
        };
        if let Some(message_type) = control {
            return Message {
                message_type,
                address: None,
                who: None,
                what: None,
                dimension: None,
                values: Vec::new(),
                media: None,
                protocol,
                frame,
            };
        }

        let field0 = frame.field(0).unwrap_or(&[]);
        let classified = match field0 {
            [who] => Self::classify_bus_command(&frame, who.clone(), protocol),
            [empty, who] if empty.is_empty() => {
                Self::classify_diagnostic(&frame, who.clone(), protocol, direction)
            }
            _ => None,
        };

        classified.unwrap_or(Message {
            message_type: MessageType::Unknown,
            address: None,
            who: None,
            what: None,
            dimension: None,
            values: Vec::new(),
            media: None,
            protocol,
            frame,
        })
    }

    fn classify_bus_command(frame: &Frame, who: String, protocol: Protocol) -> Option<Message> {
        if frame.field_count() != 3 {
            return None;
        }
        let what = frame.field(1)?.join("#");
        let (address, media) = split_address_and_media(frame.field(2)?, protocol);
        Some(Message {
            message_type: MessageType::BusCommand,
            address: Some(address),
            who: Some(who),
            what: Some(what),
            dimension: None,
            values: Vec::new(),
            media,
            protocol,
            frame: frame.clone(),
        })
    }

    fn classify_diagnostic(
        frame: &Frame,
        who: String,
        protocol: Protocol,
        direction: Direction,
    ) -> Option<Message> {
        let where_field = frame.field(1)?;
        let (address, media) = split_address_and_media(where_field, protocol);

        match frame.field_count() {
            2 => Some(Message {
                message_type: MessageType::StatusRequest,
                address: Some(address),
                who: Some(who),
                what: None,
                dimension: None,
                values: Vec::new(),
                media,
                protocol,
                frame: frame.clone(),
            }),
            3 => {
                let dimension = frame.field(2)?.join("#");
                Some(Message {
                    message_type: MessageType::DimensionRequest,
                    address: Some(address),
                    who: Some(who),
                    what: None,
                    dimension: Some(dimension),
                    values: Vec::new(),
                    media,
                    protocol,
                    frame: frame.clone(),
                })
            }
            n if n >= 4 => {
                let dimension = frame.field(2)?.join("#");
                let values =
                    frame.fields()[3..].iter().map(|f| f.join("#")).collect::<Vec<_>>();
                let message_type = match direction {
                    Direction::Sent => MessageType::DimensionSet,
                    Direction::Received => MessageType::DimensionRead,
                };
                Some(Message {
                    message_type,
                    address: Some(address),
                    who: Some(who),
                    what: None,
                    dimension: Some(dimension),
                    values,
                    media,
                    protocol,
                    frame: frame.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Zigbee WHERE fields may carry a third parameter (network/media tag)
/// beyond device#unit; split it off before address parsing.
fn split_address_and_media(field: &[String], protocol: Protocol) -> (Address, Option<String>) {
    if protocol == Protocol::Zigbee && field.len() > 2 {
        let (addr_part, media_part) = field.split_at(2);
        (Address::parse(protocol, addr_part), Some(media_part.join("#")))
    } else {
        (Address::parse(protocol, field), None)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
