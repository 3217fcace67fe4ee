// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Black-box harness for end-to-end runtime tests: spins up a fake TCP
//! gateway on localhost, speaks just enough OpenWebNet to negotiate and
//! ack, and hands back the ports/frames an integration test needs.

use std::time::Duration;

use openwebnet_gateway::gateway::{DeviceCapabilities, Gateway, Medium, Protocol, TransportDescriptor};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Bind to an ephemeral localhost port and return it alongside the listener.
pub async fn bind_loopback() -> anyhow::Result<(TcpListener, u16)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// Build a gateway pointed at a loopback port with short timeouts, suitable
/// for tests that don't want to wait out the production defaults.
pub fn fast_gateway(name: &str, port: u16, protocol: Protocol) -> anyhow::Result<Gateway> {
    let capabilities = match protocol {
        Protocol::Zigbee => DeviceCapabilities::EVENT_AND_COMMAND_POOL,
        Protocol::Scs | Protocol::Nitoo => DeviceCapabilities::GENERIC_ONLY,
    };
    let gateway = Gateway::new(
        name,
        protocol,
        TransportDescriptor::Tcp { host: "127.0.0.1".to_owned(), port },
        capabilities,
        Medium::Bus,
    )?;
    let mut options = gateway.options.clone();
    options.connection_negotiation_timeout = Duration::from_millis(500);
    options.frame_ack_timeout = Duration::from_millis(500);
    options.outgoing_message_processing_timeout = Duration::from_secs(2);
    Ok(gateway.with_options(options)?)
}

/// Accept one connection on `listener` and run the unauthenticated SCS/Nitoo
/// handshake (spec §4.4 step 2 with no password set): gateway offers the
/// open session, client echoes its selector, gateway acks.
pub async fn accept_and_negotiate(listener: &TcpListener) -> anyhow::Result<TcpStream> {
    let (mut stream, _) = listener.accept().await?;
    stream.write_all(b"*#*1##").await?;

    let mut buf = [0u8; 64];
    read_one_frame(&mut stream, &mut buf).await?;

    stream.write_all(b"*#*1##").await?;
    Ok(stream)
}

/// Read bytes off `stream` until a `##` terminator has been seen once.
pub async fn read_one_frame(stream: &mut TcpStream, buf: &mut [u8]) -> anyhow::Result<usize> {
    let mut total = 0;
    loop {
        let n = stream.read(&mut buf[total..]).await?;
        anyhow::ensure!(n > 0, "peer closed before a full frame arrived");
        total += n;
        if buf[..total].windows(2).any(|w| w == b"##") {
            return Ok(total);
        }
    }
}
