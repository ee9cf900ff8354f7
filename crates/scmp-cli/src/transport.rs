//! UDP transport.
//!
//! Each datagram carries one encoded [`ScnPkt`].

use async_trait::async_trait;
use scmp_core::{ScmpError, Transport};
use scmp_proto::ScnPkt;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Largest UDP payload.
const MAX_DATAGRAM: usize = 65535;

pub struct UdpTransport {
    socket: Option<UdpSocket>,
    buffer: Vec<u8>,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self, ScmpError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ScmpError::SocketBind { addr, source })?;
        debug!(local = ?socket.local_addr().ok(), "Bound UDP transport");
        Ok(Self {
            socket: Some(socket),
            buffer: vec![0u8; MAX_DATAGRAM],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ScmpError> {
        Ok(self.socket()?.local_addr()?)
    }

    fn socket(&self) -> Result<&UdpSocket, ScmpError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ScmpError::Internal("transport is closed".to_string()))
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&mut self, pkt: &ScnPkt, next_hop: SocketAddr) -> Result<(), ScmpError> {
        let raw = pkt.encode()?;
        self.socket()?
            .send_to(&raw, next_hop)
            .await
            .map_err(ScmpError::WriteFailed)?;
        trace!(len = raw.len(), next_hop = %next_hop, "Sent packet");
        Ok(())
    }

    async fn recv(&mut self, deadline: Instant) -> Result<ScnPkt, ScmpError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ScmpError::Internal("transport is closed".to_string()))?;
        let (n, from) = match tokio::time::timeout_at(deadline, socket.recv_from(&mut self.buffer)).await
        {
            Ok(res) => res?,
            Err(_) => return Err(ScmpError::ReadTimeout),
        };
        trace!(len = n, from = %from, "Received datagram");
        Ok(ScnPkt::decode(&self.buffer[..n])?)
    }

    async fn close(&mut self) -> Result<(), ScmpError> {
        if self.socket.take().is_some() {
            debug!("Closed UDP transport");
        }
        Ok(())
    }
}
