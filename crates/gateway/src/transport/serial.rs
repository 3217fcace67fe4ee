// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Serial transport (spec §4.3): the carrier BTicino SCS RS-485 dongles use.

use tokio_serial::SerialPortBuilderExt;

use crate::error::{Result, TransportError};
use crate::gateway::SerialSettings;

pub fn connect(settings: &SerialSettings) -> Result<tokio_serial::SerialStream> {
    tokio_serial::new(&settings.path, settings.baud_rate)
        .data_bits(settings.data_bits)
        .parity(settings.parity)
        .stop_bits(settings.stop_bits)
        .flow_control(settings.flow_control)
        .open_native_async()
        .map_err(|e| TransportError::Io(e.into()).into())
}
