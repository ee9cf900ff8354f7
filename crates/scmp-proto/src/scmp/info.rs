//! Class-specific SCMP info blocks.

use std::fmt;

use super::hdr::{ClassType, GeneralType, PathType};
use super::LINE_LEN;
use crate::addr::IAInt;
use crate::codec::{padding, Reader, Writer};
use crate::error::{WireError, WireResult};

/// Info block of an SCMP message, selected by its [`ClassType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Info {
    Echo(InfoEcho),
    TraceRoute(InfoTraceRoute),
    Revocation(InfoRevocation),
    /// Info of a class/type this tool does not interpret.
    Raw(Vec<u8>),
}

impl Info {
    /// Encoded length in bytes. Always a multiple of [`LINE_LEN`] for the
    /// typed variants.
    pub fn len(&self) -> usize {
        match self {
            Info::Echo(_) => InfoEcho::LEN,
            Info::TraceRoute(_) => InfoTraceRoute::LEN,
            Info::Revocation(rev) => rev.len(),
            Info::Raw(raw) => raw.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the info block into the start of `buf`.
    pub fn write(&self, buf: &mut [u8]) -> WireResult<()> {
        let mut w = Writer::with_capacity(self.len());
        match self {
            Info::Echo(e) => e.encode(&mut w),
            Info::TraceRoute(t) => t.encode(&mut w),
            Info::Revocation(r) => r.encode(&mut w)?,
            Info::Raw(raw) => w.put_bytes(raw),
        }
        let raw = w.into_inner();
        let remaining = buf.len();
        let out = buf.get_mut(..raw.len()).ok_or(WireError::UnexpectedEof {
            needed: raw.len(),
            remaining,
        })?;
        out.copy_from_slice(&raw);
        Ok(())
    }

    /// Parses `raw` as the info block belonging to `ct`.
    ///
    /// A revocation info that does not decode is kept as [`Info::Raw`] so
    /// the rest of the payload stays available.
    pub fn parse(ct: ClassType, raw: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(raw);
        let info = match ct {
            ClassType::General(GeneralType::EchoRequest | GeneralType::EchoReply) => {
                Info::Echo(InfoEcho::decode(&mut r)?)
            }
            ClassType::General(GeneralType::TraceRouteRequest | GeneralType::TraceRouteReply) => {
                Info::TraceRoute(InfoTraceRoute::decode(&mut r)?)
            }
            ClassType::Path(PathType::RevokedIf) => {
                let rev = InfoRevocation::decode(&mut r).and_then(|rev| r.finish().map(|()| rev));
                return Ok(rev.map_or_else(|_| Info::Raw(raw.to_vec()), Info::Revocation));
            }
            ClassType::General(_) | ClassType::Path(_) | ClassType::Other { .. } => {
                Info::Raw(r.read_rest().to_vec())
            }
        };
        r.finish()?;
        Ok(info)
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Info::Echo(e) => write!(f, "Id={} Seq={}", e.id, e.seq),
            Info::TraceRoute(t) => write!(
                f,
                "Id={} IA={} IfID={} HopOff={} In={}",
                t.id,
                t.ia.ia(),
                t.if_id,
                t.hop_off,
                t.ingress
            ),
            Info::Revocation(r) => write!(
                f,
                "InfOff={} HopOff={} IfID={} Ingress={} RawSRev={}B",
                r.inf_off,
                r.hop_off,
                r.if_id,
                r.ingress,
                r.raw_srev.len()
            ),
            Info::Raw(raw) => write!(f, "Raw={}B", raw.len()),
        }
    }
}

/// Echo request/reply info.
///
/// ```text
/// id (8) || seq (2) || (pad 6)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoEcho {
    pub id: u64,
    pub seq: u16,
}

impl InfoEcho {
    pub const LEN: usize = 16;

    fn encode(&self, w: &mut Writer) {
        w.put_u64(self.id);
        w.put_u16(self.seq);
        w.put_zeros(6);
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        let id = r.read_u64()?;
        let seq = r.read_u16()?;
        r.skip(6)?;
        Ok(Self { id, seq })
    }
}

/// Traceroute request/reply info.
///
/// ```text
/// id (8) || isd_as (8) || if_id (8) || hop_off (1) || ingress (1) || (pad 6)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoTraceRoute {
    pub id: u64,
    pub ia: IAInt,
    pub if_id: u64,
    pub hop_off: u8,
    pub ingress: bool,
}

impl InfoTraceRoute {
    pub const LEN: usize = 32;

    fn encode(&self, w: &mut Writer) {
        w.put_u64(self.id);
        w.put_u64(self.ia.0);
        w.put_u64(self.if_id);
        w.put_u8(self.hop_off);
        w.put_bool(self.ingress);
        w.put_zeros(6);
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        let info = Self {
            id: r.read_u64()?,
            ia: IAInt(r.read_u64()?),
            if_id: r.read_u64()?,
            hop_off: r.read_u8()?,
            ingress: r.read_bool()?,
        };
        r.skip(6)?;
        Ok(info)
    }
}

/// Revoked-interface info: where in the path the revoked interface sits and
/// the signed revocation itself.
///
/// ```text
/// inf_off (1) || hop_off (1) || ingress (1) || (pad 1) || srev_len (4)
/// || if_id (8) || raw_srev (srev_len) || (pad to line)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRevocation {
    pub inf_off: u8,
    pub hop_off: u8,
    pub if_id: u64,
    pub ingress: bool,
    /// Encoded `SignedRevInfo` envelope.
    pub raw_srev: Vec<u8>,
}

impl InfoRevocation {
    /// Length of the fixed part.
    pub const FIXED_LEN: usize = 16;

    pub fn len(&self) -> usize {
        let n = Self::FIXED_LEN + self.raw_srev.len();
        n + padding(n, LINE_LEN)
    }

    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        let srev_len = u32::try_from(self.raw_srev.len()).map_err(|_| WireError::FieldTooLong {
            field: "raw_srev",
            len: self.raw_srev.len(),
            max: u32::MAX as usize,
        })?;
        w.put_u8(self.inf_off);
        w.put_u8(self.hop_off);
        w.put_bool(self.ingress);
        w.put_u8(0);
        w.put_u32(srev_len);
        w.put_u64(self.if_id);
        w.put_bytes(&self.raw_srev);
        w.put_zeros(padding(Self::FIXED_LEN + self.raw_srev.len(), LINE_LEN));
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        let inf_off = r.read_u8()?;
        let hop_off = r.read_u8()?;
        let ingress = r.read_bool()?;
        r.skip(1)?;
        let srev_len = r.read_u32()? as usize;
        let if_id = r.read_u64()?;
        let raw_srev = r.read_bytes(srev_len)?.to_vec();
        r.skip(padding(Self::FIXED_LEN + srev_len, LINE_LEN))?;
        Ok(Self {
            inf_off,
            hop_off,
            if_id,
            ingress,
            raw_srev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_layout() {
        let info = Info::Echo(InfoEcho { id: 7, seq: 0x0102 });
        let mut buf = vec![0xffu8; InfoEcho::LEN];
        info.write(&mut buf).unwrap();
        assert_eq!(&buf[..10], &[0, 0, 0, 0, 0, 0, 0, 7, 1, 2]);
        assert_eq!(&buf[10..], &[0; 6]);

        let parsed = Info::parse(ClassType::General(GeneralType::EchoReply), &buf).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn test_revocation_padding() {
        let rev = InfoRevocation {
            inf_off: 1,
            hop_off: 3,
            if_id: 11,
            ingress: true,
            raw_srev: vec![0xab; 5],
        };
        assert_eq!(rev.len(), 24);
        let info = Info::Revocation(rev);
        let mut buf = vec![0u8; info.len()];
        info.write(&mut buf).unwrap();
        assert_eq!(&buf[21..], &[0, 0, 0]);

        let parsed = Info::parse(ClassType::Path(PathType::RevokedIf), &buf).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn test_parse_dispatches_on_class_type() {
        let echo = Info::Echo(InfoEcho { id: 1, seq: 1 });
        let mut buf = vec![0u8; echo.len()];
        echo.write(&mut buf).unwrap();

        // Same bytes under a class/type without typed info stay raw.
        let parsed = Info::parse(ClassType::Path(PathType::BadMac), &buf).unwrap();
        assert_eq!(parsed, Info::Raw(buf.clone()));

        // An echo block is too short to be a traceroute info.
        assert!(Info::parse(ClassType::General(GeneralType::TraceRouteReply), &buf).is_err());
    }

    #[test]
    fn test_undecodable_revocation_stays_raw() {
        let mut buf = vec![0u8; InfoRevocation::FIXED_LEN];
        buf[2] = 7;
        let parsed = Info::parse(ClassType::Path(PathType::RevokedIf), &buf).unwrap();
        assert_eq!(parsed, Info::Raw(buf.clone()));

        let short = [1u8, 2, 3];
        let parsed = Info::parse(ClassType::Path(PathType::RevokedIf), &short).unwrap();
        assert_eq!(parsed, Info::Raw(short.to_vec()));
    }

    #[test]
    fn test_parse_rejects_trailing_bytes() {
        let mut buf = vec![0u8; InfoEcho::LEN + LINE_LEN];
        buf[7] = 1;
        assert_eq!(
            Info::parse(ClassType::General(GeneralType::EchoRequest), &buf),
            Err(WireError::TrailingData(LINE_LEN))
        );
    }

    #[test]
    fn test_write_short_buffer() {
        let info = Info::TraceRoute(InfoTraceRoute {
            id: 1,
            ia: IAInt(2),
            if_id: 3,
            hop_off: 4,
            ingress: false,
        });
        let mut buf = vec![0u8; 8];
        assert!(matches!(
            info.write(&mut buf),
            Err(WireError::UnexpectedEof { needed: 32, .. })
        ));
    }
}
