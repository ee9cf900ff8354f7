//! Construction of outbound SCMP probes.

use chrono::{DateTime, Utc};
use scmp_proto::scmp::{ClassType, GeneralType, Hdr, Info, Meta, LINE_LEN, META_LEN};
use scmp_proto::{Extension, L4Header, L4Payload, ScnPkt};
use std::net::SocketAddr;

use crate::error::ScmpError;
use crate::session::Session;

/// A packet ready for the transport, with the address it is sent to.
#[derive(Debug, Clone)]
pub struct Probe {
    pub pkt: ScnPkt,
    pub next_hop: SocketAddr,
}

/// Builds a `General` class SCMP packet of type `ty` for the session's
/// destination.
///
/// The payload is the meta block, `info`, and `session.payload_size()` zero
/// bytes of filler. `info` must be a whole number of lines long.
pub fn build_probe(
    session: &Session,
    ty: GeneralType,
    info: Info,
    ext: Option<Extension>,
) -> Result<Probe, ScmpError> {
    debug_assert_eq!(info.len() % LINE_LEN, 0, "info is not line aligned");
    let info_len = u8::try_from(info.len() / LINE_LEN)
        .map_err(|_| ScmpError::Internal(format!("info too long: {} bytes", info.len())))?;
    let meta = Meta {
        info_len,
        ..Default::default()
    };

    let mut pld = vec![0u8; META_LEN + info.len() + session.payload_size()];
    meta.write(&mut pld)?;
    info.write(&mut pld[META_LEN..])?;

    let hdr = Hdr::new(ClassType::General(ty), pld.len());
    let remote = session.remote();
    let pkt = ScnPkt {
        dst_ia: remote.ia,
        src_ia: session.local().ia,
        dst_host: remote.host.ip(),
        src_host: session.local().ip,
        path: remote.path.clone(),
        hbh_ext: ext.into_iter().collect(),
        l4: L4Header::Scmp(hdr),
        pld: L4Payload::Raw(pld),
    };
    Ok(Probe {
        pkt,
        next_hop: session.derive_next_hop(),
    })
}

/// Sets the SCMP timestamp of `pkt`; replies echo it back for RTT
/// measurement. No-op for non-SCMP packets.
pub fn stamp(pkt: &mut ScnPkt, ts: DateTime<Utc>) {
    if let L4Header::Scmp(hdr) = &mut pkt.l4 {
        hdr.set_time(ts);
    }
}
