//! SCMP echo driver implementation.

use crate::packet::echo_request;
use async_trait::async_trait;
use chrono::Utc;
use scmp_core::{
    classify, stamp, Classification, EchoReply, ProbeDriver, ProbeEvent, RevocationNotice,
    ScmpError, Session, Transport,
};
use scmp_proto::scmp::{ClassType, GeneralType, Hdr, Info, Payload};
use scmp_proto::ScnPkt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Sends echo requests over a [`Transport`] and matches the replies.
pub struct EchoDriver<T: Transport> {
    session: Arc<Session>,
    transport: T,
    /// Echo id of this session; replies carrying another id are not ours.
    id: u64,
}

impl<T: Transport> EchoDriver<T> {
    /// Creates a driver with a random echo id.
    pub fn new(session: Arc<Session>, transport: T) -> Self {
        Self::with_id(session, transport, rand::random())
    }

    pub fn with_id(session: Arc<Session>, transport: T, id: u64) -> Self {
        Self {
            session,
            transport,
            id,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn handle_reply(
        &self,
        pkt: &ScnPkt,
        hdr: &Hdr,
        pld: &Payload,
    ) -> Result<Option<ProbeEvent>, ScmpError> {
        if hdr.class_type != ClassType::General(GeneralType::EchoReply) {
            trace!(class_type = %hdr.class_type, "Ignored SCMP message that is not an echo reply");
            return Err(ScmpError::PacketMismatch);
        }
        let echo = match &pld.info {
            Info::Echo(echo) => echo,
            _ => return Err(ScmpError::PacketMismatch),
        };
        if echo.id != self.id {
            trace!(
                expected = self.id,
                actual = echo.id,
                "Ignored echo reply with different echo ID"
            );
            return Err(ScmpError::PacketMismatch);
        }

        // The responder echoes the request timestamp.
        let rtt = (Utc::now() - hdr.time()).to_std().unwrap_or_default();
        self.session.record_received();

        Ok(Some(ProbeEvent::Reply(EchoReply {
            seq: echo.seq,
            src_ia: pkt.src_ia,
            src_host: pkt.src_host,
            size: usize::from(hdr.total_len),
            rtt,
        })))
    }
}

#[async_trait]
impl<T: Transport> ProbeDriver for EchoDriver<T> {
    async fn send_probe(&mut self, seq: u16) -> Result<(), ScmpError> {
        let mut probe = echo_request(&self.session, self.id, seq)?;
        stamp(&mut probe.pkt, Utc::now());

        trace!(
            seq = seq,
            echo_id = self.id,
            next_hop = %probe.next_hop,
            "Sending SCMP echo request"
        );
        self.transport.send_to(&probe.pkt, probe.next_hop).await?;
        self.session.record_sent();
        Ok(())
    }

    async fn receive_probe(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ProbeEvent>, ScmpError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let pkt = match self.transport.recv(deadline).await {
            Ok(pkt) => pkt,
            Err(ScmpError::ReadTimeout) => return Ok(None),
            Err(e) => return Err(e),
        };

        match classify(&pkt) {
            Classification::Reply { hdr, pld } => self.handle_reply(&pkt, hdr, pld),
            Classification::Revocation { rev_info, .. } => {
                Ok(Some(ProbeEvent::Revocation(RevocationNotice {
                    src_ia: pkt.src_ia,
                    src_host: pkt.src_host,
                    rev_info,
                })))
            }
            other => {
                let err = other
                    .into_error()
                    .unwrap_or(ScmpError::PacketMismatch);
                debug!(error = %err, "Failed to classify packet");
                Err(err)
            }
        }
    }

    async fn close(&mut self) -> Result<(), ScmpError> {
        self.transport.close().await
    }
}
