//! Seams to the network stack and between the run loop and probe drivers.

use async_trait::async_trait;
use scmp_proto::{ScnPkt, IA};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ScmpError;
use crate::types::{PathEntry, ProbeEvent};

/// Path-aware packet transport.
#[async_trait]
pub trait Transport: Send {
    /// Sends `pkt` to the underlay address `next_hop`.
    async fn send_to(&mut self, pkt: &ScnPkt, next_hop: SocketAddr) -> Result<(), ScmpError>;

    /// Receives the next packet.
    ///
    /// Returns [`ScmpError::ReadTimeout`] if nothing arrives before `deadline`.
    async fn recv(&mut self, deadline: Instant) -> Result<ScnPkt, ScmpError>;

    /// Closes the transport, releasing resources.
    async fn close(&mut self) -> Result<(), ScmpError>;
}

/// Source of paths between two ASes.
#[async_trait]
pub trait PathResolver: Send + Sync {
    /// Returns candidate paths from `src` to `dst`, best first.
    async fn paths(&self, src: IA, dst: IA) -> Result<Vec<PathEntry>, ScmpError>;
}

/// A probe protocol (echo, ...) driven by the execution strategies.
#[async_trait]
pub trait ProbeDriver: Send {
    /// Sends the probe with sequence number `seq`.
    async fn send_probe(&mut self, seq: u16) -> Result<(), ScmpError>;

    /// Receives one event.
    ///
    /// Returns `Ok(None)` if nothing arrived within `timeout`.
    /// Retryable errors (see [`ScmpError::is_retryable`]) report packets
    /// that were read and discarded.
    async fn receive_probe(&mut self, timeout: Duration)
        -> Result<Option<ProbeEvent>, ScmpError>;

    /// Closes the driver, releasing resources.
    async fn close(&mut self) -> Result<(), ScmpError>;
}
