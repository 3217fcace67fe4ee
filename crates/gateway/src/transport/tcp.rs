// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! TCP transport (spec §4.3): the carrier SCS and Zigbee IP gateways use.

use tokio::net::TcpStream;

use crate::error::{Result, TransportError};

pub async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let stream = TcpStream::connect((host, port)).await.map_err(TransportError::from)?;
    stream.set_nodelay(true).map_err(TransportError::from)?;
    Ok(stream)
}
