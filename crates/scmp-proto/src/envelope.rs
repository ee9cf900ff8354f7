//! Self-describing message envelope.
//!
//! Every control message is framed as:
//!
//! ```text
//! proto_id (2) || body_len (4) || body (body_len)
//! ```
//!
//! The receiver picks the decoder by the statically known message type and
//! rejects envelopes whose `proto_id` does not match it.

use std::fmt;

use crate::codec::{Reader, Writer};
use crate::error::{WireError, WireResult};

/// Length of the envelope header.
pub const ENVELOPE_HDR_LEN: usize = 6;

/// Stable numeric identifier of a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtoId(pub u16);

impl ProtoId {
    pub const CERT_CHAIN_REQ: ProtoId = ProtoId(0x0c01);
    pub const REV_INFO: ProtoId = ProtoId(0x0a01);
    pub const SIGNED_REV_INFO: ProtoId = ProtoId(0x0a02);
}

impl fmt::Display for ProtoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            ProtoId::CERT_CHAIN_REQ => "CertChainReq",
            ProtoId::REV_INFO => "RevInfo",
            ProtoId::SIGNED_REV_INFO => "SignedRevInfo",
            _ => return write!(f, "Unknown({:#06x})", self.0),
        };
        f.write_str(name)
    }
}

/// A strongly typed message that can travel inside an envelope.
pub trait WireMessage: Sized {
    /// Constant type tag of this message.
    const PROTO_ID: ProtoId;

    fn proto_id(&self) -> ProtoId {
        Self::PROTO_ID
    }

    /// Writes the message body (without envelope header).
    fn encode_body(&self, w: &mut Writer) -> WireResult<()>;

    /// Reads the message body. The reader is bounded to the body.
    fn decode_body(r: &mut Reader<'_>) -> WireResult<Self>;
}

/// Encodes `msg` into an envelope.
pub fn encode<M: WireMessage>(msg: &M) -> WireResult<Vec<u8>> {
    let mut body = Writer::new();
    msg.encode_body(&mut body)?;
    let body = body.into_inner();
    let body_len = u32::try_from(body.len()).map_err(|_| WireError::FieldTooLong {
        field: "body",
        len: body.len(),
        max: u32::MAX as usize,
    })?;

    let mut w = Writer::with_capacity(ENVELOPE_HDR_LEN + body.len());
    w.put_u16(M::PROTO_ID.0);
    w.put_u32(body_len);
    w.put_bytes(&body);
    Ok(w.into_inner())
}

/// Returns the type tag of an encoded envelope without decoding the body.
pub fn peek_proto_id(raw: &[u8]) -> WireResult<ProtoId> {
    Reader::new(raw).read_u16().map(ProtoId)
}

/// Decodes an envelope holding an `M`.
pub fn decode<M: WireMessage>(raw: &[u8]) -> WireResult<M> {
    let mut r = Reader::new(raw);
    let id = ProtoId(r.read_u16()?);
    if id != M::PROTO_ID {
        return Err(WireError::MalformedMessage {
            expected: M::PROTO_ID.0,
            actual: id.0,
        });
    }
    let body_len = r.read_u32()? as usize;
    let mut body = Reader::new(r.read_bytes(body_len)?);
    r.finish()?;

    let msg = M::decode_body(&mut body)?;
    body.finish()?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    impl WireMessage for Ping {
        const PROTO_ID: ProtoId = ProtoId(0x7f00);

        fn encode_body(&self, w: &mut Writer) -> WireResult<()> {
            w.put_u32(self.0);
            Ok(())
        }

        fn decode_body(r: &mut Reader<'_>) -> WireResult<Self> {
            Ok(Ping(r.read_u32()?))
        }
    }

    #[derive(Debug)]
    struct Pong;

    impl WireMessage for Pong {
        const PROTO_ID: ProtoId = ProtoId(0x7f01);

        fn encode_body(&self, _w: &mut Writer) -> WireResult<()> {
            Ok(())
        }

        fn decode_body(_r: &mut Reader<'_>) -> WireResult<Self> {
            Ok(Pong)
        }
    }

    #[test]
    fn test_envelope_layout() {
        let raw = encode(&Ping(0xdead_beef)).unwrap();
        assert_eq!(raw, vec![0x7f, 0x00, 0, 0, 0, 4, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(peek_proto_id(&raw).unwrap(), ProtoId(0x7f00));
        assert_eq!(decode::<Ping>(&raw).unwrap(), Ping(0xdead_beef));
    }

    #[test]
    fn test_mismatched_tag() {
        let raw = encode(&Ping(1)).unwrap();
        let err = decode::<Pong>(&raw).unwrap_err();
        assert_eq!(
            err,
            WireError::MalformedMessage {
                expected: 0x7f01,
                actual: 0x7f00
            }
        );
    }

    #[test]
    fn test_trailing_and_truncated() {
        let mut raw = encode(&Ping(1)).unwrap();
        raw.push(0);
        assert_eq!(decode::<Ping>(&raw).unwrap_err(), WireError::TrailingData(1));

        let raw = encode(&Ping(1)).unwrap();
        assert!(matches!(
            decode::<Ping>(&raw[..8]),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_body_must_be_consumed() {
        // Envelope claims a 6 byte body but Ping only reads 4 of them.
        let raw = vec![0x7f, 0x00, 0, 0, 0, 6, 0, 0, 0, 1, 0, 0];
        assert_eq!(decode::<Ping>(&raw).unwrap_err(), WireError::TrailingData(2));
    }

    #[test]
    fn test_proto_id_display() {
        assert_eq!(ProtoId::CERT_CHAIN_REQ.to_string(), "CertChainReq");
        assert_eq!(ProtoId(0x1234).to_string(), "Unknown(0x1234)");
    }
}
