// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! Byte-stream transports and frame splitting (spec §4.3).
//!
//! [`connect`] returns a stream already split into a [`FrameReader`] half
//! and a plain `AsyncWrite` half, mirroring the teacher's
//! `ws_stream.split()` in `upstream/bridge.rs`: one task owns the read
//! half and drives the session's single reader loop (spec §4.4 "exactly
//! one reader task"), while the write half is taken under a mutex by
//! whichever send currently holds it, since sends are serialized but not
//! necessarily issued from the reader task.

pub mod serial;
pub mod tcp;

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use tokio::io::{self, split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, ReadBuf, WriteHalf};
use tokio::net::TcpStream;
use tokio_serial::SerialStream;

use crate::error::{Result, TransportError};
use crate::frame::Frame;
use crate::gateway::TransportDescriptor;

/// How many bytes of backlog `FrameReader` will buffer while hunting for a
/// `##` terminator before giving up on the peer entirely.
const MAX_PENDING_BYTES: usize = 64 * 1024;

/// A connected physical stream, either TCP or serial. In test builds a
/// third variant wraps an in-process duplex stream, letting the crate's own
/// scenario suite (spec §8 S1-S6) drive a [`crate::session::Session`]
/// without a real socket or serial port.
pub enum PhysicalConnection {
    Tcp(TcpStream),
    Serial(SerialStream),
    #[cfg(test)]
    Mock(tokio::io::DuplexStream),
}

impl AsyncRead for PhysicalConnection {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            PhysicalConnection::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            PhysicalConnection::Serial(s) => Pin::new(s).poll_read(cx, buf),
            #[cfg(test)]
            PhysicalConnection::Mock(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for PhysicalConnection {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, data: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            PhysicalConnection::Tcp(s) => Pin::new(s).poll_write(cx, data),
            PhysicalConnection::Serial(s) => Pin::new(s).poll_write(cx, data),
            #[cfg(test)]
            PhysicalConnection::Mock(s) => Pin::new(s).poll_write(cx, data),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            PhysicalConnection::Tcp(s) => Pin::new(s).poll_flush(cx),
            PhysicalConnection::Serial(s) => Pin::new(s).poll_flush(cx),
            #[cfg(test)]
            PhysicalConnection::Mock(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            PhysicalConnection::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            PhysicalConnection::Serial(s) => Pin::new(s).poll_shutdown(cx),
            #[cfg(test)]
            PhysicalConnection::Mock(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Wrap an in-process duplex stream as a [`PhysicalConnection`] and split it
/// into the same `(FrameReader, WriteHalf)` shape [`connect`] produces, for
/// scenario tests that need a fake gateway on the other end.
#[cfg(test)]
pub fn mock_pair() -> (
    (FrameReader<ReadHalf<PhysicalConnection>>, WriteHalf<PhysicalConnection>),
    (FrameReader<ReadHalf<PhysicalConnection>>, WriteHalf<PhysicalConnection>),
) {
    let (client, gateway) = tokio::io::duplex(64 * 1024);
    let (client_r, client_w) = split(PhysicalConnection::Mock(client));
    let (gw_r, gw_w) = split(PhysicalConnection::Mock(gateway));
    ((FrameReader::new(client_r), client_w), (FrameReader::new(gw_r), gw_w))
}

/// Connect to the physical endpoint described by a [`TransportDescriptor`]
/// and split it into a read half (for the session's reader task) and a
/// write half (for serialized sends).
pub async fn connect(
    descriptor: &TransportDescriptor,
) -> Result<(FrameReader<ReadHalf<PhysicalConnection>>, WriteHalf<PhysicalConnection>)> {
    let conn = match descriptor {
        TransportDescriptor::Tcp { host, port } => PhysicalConnection::Tcp(tcp::connect(host, *port).await?),
        TransportDescriptor::Serial(settings) => PhysicalConnection::Serial(serial::connect(settings)?),
    };
    let (read_half, write_half) = split(conn);
    Ok((FrameReader::new(read_half), write_half))
}

/// Write one frame's wire bytes and flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    writer.write_all(&frame.serialize()).await.map_err(TransportError::from)?;
    writer.flush().await.map_err(TransportError::from)?;
    Ok(())
}

/// Splits an inbound byte stream into OpenWebNet frames.
pub struct FrameReader<R> {
    inner: R,
    pending: BytesMut,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(inner: R) -> Self {
        Self { inner, pending: BytesMut::new() }
    }

    /// Read the next complete frame, reading more bytes off the stream as
    /// needed. Returns `Err(TransportError::Closed)` if the peer closes the
    /// stream mid-frame.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(end) = find_terminator(&self.pending) {
                let raw = self.pending.split_to(end + 2);
                return Ok(Frame::parse(&raw)?);
            }
            if self.pending.len() >= MAX_PENDING_BYTES {
                return Err(TransportError::Closed.into());
            }
            let mut chunk = [0u8; 4096];
            let n = self.inner.read(&mut chunk).await.map_err(TransportError::from)?;
            if n == 0 {
                return Err(TransportError::Closed.into());
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"##")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
