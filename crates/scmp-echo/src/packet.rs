//! SCMP echo packet construction.

use scmp_core::{build_probe, Probe, ScmpError, Session};
use scmp_proto::scmp::{ClassType, GeneralType, Hdr, Info, InfoEcho, Payload};
use scmp_proto::{L4Header, L4Payload, ScnPkt};

/// Creates an echo request for the session's destination.
pub fn echo_request(session: &Session, id: u64, seq: u16) -> Result<Probe, ScmpError> {
    build_probe(
        session,
        GeneralType::EchoRequest,
        Info::Echo(InfoEcho { id, seq }),
        None,
    )
}

/// Creates the reply a responder sends for `request`.
///
/// Addresses are swapped; id, sequence number, filler and the request
/// timestamp are echoed back.
pub fn echo_reply(request: &ScnPkt) -> Result<ScnPkt, ScmpError> {
    let hdr = match &request.l4 {
        L4Header::Scmp(hdr) if hdr.class_type == ClassType::General(GeneralType::EchoRequest) => {
            hdr
        }
        _ => return Err(ScmpError::PacketMismatch),
    };
    let pld = match &request.pld {
        L4Payload::Scmp(pld) => pld.clone(),
        L4Payload::Raw(raw) => Payload::parse(hdr.class_type, raw)?,
    };
    if !matches!(pld.info, Info::Echo(_)) {
        return Err(ScmpError::PacketMismatch);
    }

    Ok(ScnPkt {
        dst_ia: request.src_ia,
        src_ia: request.dst_ia,
        dst_host: request.src_host,
        src_host: request.dst_host,
        path: request.path.clone(),
        hbh_ext: Vec::new(),
        l4: L4Header::Scmp(Hdr {
            class_type: ClassType::General(GeneralType::EchoReply),
            ..hdr.clone()
        }),
        pld: L4Payload::Scmp(pld),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scmp_core::{validate_configuration, PathEntry, ScmpConfig, DEFAULT_MTU};
    use scmp_proto::scmp::{HDR_LEN, META_LEN};

    fn session(payload_size: usize) -> Session {
        let remote = "1-ff00:0:110,[10.0.0.2]".parse().unwrap();
        let mut config = ScmpConfig::new("1-ff00:0:111".parse().unwrap(), remote);
        config.payload_size = payload_size;
        let config = validate_configuration(&config).unwrap();
        Session::new(&config, "10.0.0.1".parse().unwrap(), PathEntry::local(DEFAULT_MTU)).unwrap()
    }

    #[test]
    fn test_echo_request() {
        let probe = echo_request(&session(32), 0xabcd, 9).unwrap();
        assert_eq!(probe.next_hop, "10.0.0.2:30041".parse().unwrap());

        let decoded = ScnPkt::decode(&probe.pkt.encode().unwrap()).unwrap();
        let L4Header::Scmp(hdr) = &decoded.l4 else {
            panic!("expected SCMP header");
        };
        assert_eq!(hdr.class_type, ClassType::General(GeneralType::EchoRequest));
        assert_eq!(hdr.total_len as usize, HDR_LEN + META_LEN + InfoEcho::LEN + 32);

        let L4Payload::Scmp(pld) = &decoded.pld else {
            panic!("expected SCMP payload");
        };
        assert_eq!(pld.info, Info::Echo(InfoEcho { id: 0xabcd, seq: 9 }));
        assert_eq!(pld.data.len(), 32);
    }

    #[test]
    fn test_echo_reply_mirrors_request() {
        let probe = echo_request(&session(8), 1, 2).unwrap();
        let request = ScnPkt::decode(&probe.pkt.encode().unwrap()).unwrap();

        let reply = echo_reply(&request).unwrap();
        assert_eq!(reply.src_ia, request.dst_ia);
        assert_eq!(reply.dst_host, request.src_host);

        let (L4Header::Scmp(req_hdr), L4Header::Scmp(rep_hdr)) = (&request.l4, &reply.l4) else {
            panic!("expected SCMP headers");
        };
        assert_eq!(rep_hdr.class_type, ClassType::General(GeneralType::EchoReply));
        assert_eq!(rep_hdr.timestamp, req_hdr.timestamp);
        assert_eq!(reply.pld, request.pld);
    }

    #[test]
    fn test_echo_reply_from_unencoded_request() {
        let probe = echo_request(&session(0), 1, 2).unwrap();
        let reply = echo_reply(&probe.pkt).unwrap();
        let L4Payload::Scmp(pld) = &reply.pld else {
            panic!("expected SCMP payload");
        };
        assert_eq!(pld.info, Info::Echo(InfoEcho { id: 1, seq: 2 }));
    }

    #[test]
    fn test_echo_reply_rejects_reply() {
        let probe = echo_request(&session(0), 1, 2).unwrap();
        let reply = echo_reply(&probe.pkt).unwrap();
        assert!(matches!(echo_reply(&reply), Err(ScmpError::PacketMismatch)));
    }
}
