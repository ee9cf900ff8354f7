//! SCION packet model and its framing.
//!
//! ```text
//! version (1) || l4_proto (1) || ext_count (1) || (pad 1)
//! || dst_ia (8) || src_ia (8) || dst_host || src_host
//! || path_len (2) || path || extensions || l4_hdr || l4_payload
//!
//! host: addr_type (1: 1 = IPv4, 2 = IPv6) || addr (4 | 16)
//! ```
//!
//! The L4 payload runs to the end of the packet. SCMP checksums cover the
//! SCMP header and payload.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::addr::{IAInt, IA};
use crate::codec::{Reader, Writer};
use crate::error::{WireError, WireResult};
use crate::extn::Extension;
use crate::scmp::{self, HDR_LEN};

pub const SPKT_VERSION: u8 = 1;
pub const L4_SCMP: u8 = 1;
pub const L4_UDP: u8 = 17;
pub const UDP_HDR_LEN: usize = 8;

const FIXED_LEN: usize = 4 + 8 + 8 + 2;
const ADDR_IPV4: u8 = 1;
const ADDR_IPV6: u8 = 2;
/// 16-bit word index of the checksum inside the SCMP header.
const SCMP_CHECKSUM_WORD: usize = 3;

/// Raw forwarding path, opaque to this crate. Empty for AS-local traffic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    pub raw: Vec<u8>,
}

impl Path {
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            f.write_str("<empty>")
        } else {
            f.write_str(&hex::encode(&self.raw))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHdr {
    pub src_port: u16,
    pub dst_port: u16,
    pub total_len: u16,
    pub checksum: u16,
}

/// Transport-layer header of a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L4Header {
    Scmp(scmp::Hdr),
    Udp(UdpHdr),
}

impl L4Header {
    pub fn proto(&self) -> u8 {
        match self {
            L4Header::Scmp(_) => L4_SCMP,
            L4Header::Udp(_) => L4_UDP,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            L4Header::Scmp(_) => "SCMP",
            L4Header::Udp(_) => "UDP",
        }
    }

    fn len(&self) -> usize {
        match self {
            L4Header::Scmp(_) => HDR_LEN,
            L4Header::Udp(_) => UDP_HDR_LEN,
        }
    }
}

/// Payload following the L4 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L4Payload {
    Scmp(scmp::Payload),
    /// Undecoded bytes: outbound SCMP payloads as built by the prober,
    /// non-SCMP payloads, or SCMP payloads that failed to decode.
    Raw(Vec<u8>),
}

impl L4Payload {
    pub fn name(&self) -> &'static str {
        match self {
            L4Payload::Scmp(_) => "SCMP payload",
            L4Payload::Raw(_) => "raw bytes",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            L4Payload::Scmp(p) => p.len(),
            L4Payload::Raw(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self, w: &mut Writer) -> WireResult<()> {
        match self {
            L4Payload::Scmp(p) => p.write(w),
            L4Payload::Raw(r) => {
                w.put_bytes(r);
                Ok(())
            }
        }
    }
}

/// A SCION packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScnPkt {
    pub dst_ia: IA,
    pub src_ia: IA,
    pub dst_host: IpAddr,
    pub src_host: IpAddr,
    pub path: Option<Path>,
    /// Hop-by-hop extensions. No extensions is an empty list.
    pub hbh_ext: Vec<Extension>,
    pub l4: L4Header,
    pub pld: L4Payload,
}

fn host_len(ip: &IpAddr) -> usize {
    match ip {
        IpAddr::V4(_) => 1 + 4,
        IpAddr::V6(_) => 1 + 16,
    }
}

fn write_host(w: &mut Writer, ip: &IpAddr) {
    match ip {
        IpAddr::V4(v4) => {
            w.put_u8(ADDR_IPV4);
            w.put_bytes(&v4.octets());
        }
        IpAddr::V6(v6) => {
            w.put_u8(ADDR_IPV6);
            w.put_bytes(&v6.octets());
        }
    }
}

fn read_host(r: &mut Reader<'_>) -> WireResult<IpAddr> {
    match r.read_u8()? {
        ADDR_IPV4 => Ok(IpAddr::V4(Ipv4Addr::from(r.read_array::<4>()?))),
        ADDR_IPV6 => Ok(IpAddr::V6(Ipv6Addr::from(r.read_array::<16>()?))),
        other => Err(WireError::invalid("host address type", other.to_string())),
    }
}

impl ScnPkt {
    /// Length of the packet once encoded.
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN
            + host_len(&self.dst_host)
            + host_len(&self.src_host)
            + self.path.as_ref().map_or(0, |p| p.raw.len())
            + self.hbh_ext.iter().map(Extension::encoded_len).sum::<usize>()
            + self.l4.len()
            + self.pld.len()
    }

    /// Serializes the packet. L4 length and SCMP checksum are filled in.
    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let ext_count = u8::try_from(self.hbh_ext.len()).map_err(|_| WireError::FieldTooLong {
            field: "extensions",
            len: self.hbh_ext.len(),
            max: u8::MAX as usize,
        })?;

        let mut w = Writer::with_capacity(self.encoded_len());
        w.put_u8(SPKT_VERSION);
        w.put_u8(self.l4.proto());
        w.put_u8(ext_count);
        w.put_u8(0);
        w.put_u64(self.dst_ia.to_int().0);
        w.put_u64(self.src_ia.to_int().0);
        write_host(&mut w, &self.dst_host);
        write_host(&mut w, &self.src_host);
        let path = self.path.as_ref().map_or(&[][..], |p| p.raw.as_slice());
        w.put_len_prefixed("path", path)?;
        for ext in &self.hbh_ext {
            ext.write(&mut w);
        }

        let mut pld = Writer::with_capacity(self.pld.len());
        self.pld.write(&mut pld)?;
        let pld = pld.into_inner();
        let l4_len = self.l4.len() + pld.len();
        let l4_len = u16::try_from(l4_len).map_err(|_| WireError::FieldTooLong {
            field: "l4",
            len: l4_len,
            max: u16::MAX as usize,
        })?;

        let mut l4 = Writer::with_capacity(l4_len as usize);
        match &self.l4 {
            L4Header::Scmp(hdr) => {
                let hdr = scmp::Hdr {
                    total_len: l4_len,
                    checksum: 0,
                    ..hdr.clone()
                };
                hdr.write(&mut l4);
            }
            L4Header::Udp(udp) => {
                l4.put_u16(udp.src_port);
                l4.put_u16(udp.dst_port);
                l4.put_u16(l4_len);
                l4.put_u16(udp.checksum);
            }
        }
        l4.put_bytes(&pld);
        let mut l4 = l4.into_inner();
        if let L4Header::Scmp(_) = self.l4 {
            let csum = pnet_packet::util::checksum(&l4, SCMP_CHECKSUM_WORD);
            l4[6..8].copy_from_slice(&csum.to_be_bytes());
        }
        w.put_bytes(&l4);
        Ok(w.into_inner())
    }

    /// Parses a packet. SCMP payloads that do not decode are kept as
    /// [`L4Payload::Raw`] so callers can still inspect the header.
    pub fn decode(raw: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(raw);
        let version = r.read_u8()?;
        if version != SPKT_VERSION {
            return Err(WireError::invalid("version", version.to_string()));
        }
        let l4_proto = r.read_u8()?;
        let ext_count = r.read_u8()?;
        r.skip(1)?;
        let dst_ia = IAInt(r.read_u64()?).ia();
        let src_ia = IAInt(r.read_u64()?).ia();
        let dst_host = read_host(&mut r)?;
        let src_host = read_host(&mut r)?;
        let path = r.read_len_prefixed()?;
        let path = (!path.is_empty()).then(|| Path::new(path.to_vec()));
        let hbh_ext = (0..ext_count)
            .map(|_| Extension::parse(&mut r))
            .collect::<WireResult<Vec<_>>>()?;

        let l4_raw = r.read_rest();
        let mut l4r = Reader::new(l4_raw);
        let (l4, pld) = match l4_proto {
            L4_SCMP => {
                let hdr = scmp::Hdr::parse(&mut l4r)?;
                let expected = pnet_packet::util::checksum(l4_raw, SCMP_CHECKSUM_WORD);
                if hdr.checksum != expected {
                    return Err(WireError::invalid(
                        "SCMP checksum",
                        format!("got {:#06x}, expected {:#06x}", hdr.checksum, expected),
                    ));
                }
                let rest = l4r.read_rest();
                let pld = match scmp::Payload::parse(hdr.class_type, rest) {
                    Ok(p) => L4Payload::Scmp(p),
                    Err(_) => L4Payload::Raw(rest.to_vec()),
                };
                (L4Header::Scmp(hdr), pld)
            }
            L4_UDP => {
                let udp = UdpHdr {
                    src_port: l4r.read_u16()?,
                    dst_port: l4r.read_u16()?,
                    total_len: l4r.read_u16()?,
                    checksum: l4r.read_u16()?,
                };
                (L4Header::Udp(udp), L4Payload::Raw(l4r.read_rest().to_vec()))
            }
            other => return Err(WireError::invalid("L4 protocol", other.to_string())),
        };

        Ok(Self {
            dst_ia,
            src_ia,
            dst_host,
            src_host,
            path,
            hbh_ext,
            l4,
            pld,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extn::ExtnScmp;
    use crate::scmp::{ClassType, GeneralType, Hdr, Info, InfoEcho, Meta, Payload};

    fn echo_reply(data_len: usize) -> ScnPkt {
        let pld = Payload {
            meta: Meta {
                info_len: 2,
                ..Default::default()
            },
            info: Info::Echo(InfoEcho { id: 77, seq: 5 }),
            quoted: Vec::new(),
            data: vec![0; data_len],
        };
        ScnPkt {
            dst_ia: "1-ff00:0:110".parse().unwrap(),
            src_ia: "1-ff00:0:111".parse().unwrap(),
            dst_host: "10.0.0.1".parse().unwrap(),
            src_host: "fd00::2".parse().unwrap(),
            path: Some(Path::new(vec![1, 2, 3, 4, 5, 6, 7, 8])),
            hbh_ext: vec![Extension::Scmp(ExtnScmp {
                error: false,
                hop_by_hop: true,
            })],
            l4: L4Header::Scmp(Hdr::new(
                ClassType::General(GeneralType::EchoReply),
                pld.len(),
            )),
            pld: L4Payload::Scmp(pld),
        }
    }

    #[test]
    fn test_encode_decode_scmp() {
        let pkt = echo_reply(4);
        let raw = pkt.encode().unwrap();
        assert_eq!(raw.len(), pkt.encoded_len());

        let decoded = ScnPkt::decode(&raw).unwrap();
        assert_eq!(decoded.dst_ia, pkt.dst_ia);
        assert_eq!(decoded.src_host, pkt.src_host);
        assert_eq!(decoded.path, pkt.path);
        assert_eq!(decoded.hbh_ext, pkt.hbh_ext);
        assert_eq!(decoded.pld, pkt.pld);
        match decoded.l4 {
            L4Header::Scmp(hdr) => {
                assert_eq!(hdr.class_type, ClassType::General(GeneralType::EchoReply));
                assert_eq!(hdr.total_len as usize, HDR_LEN + pkt.pld.len());
            }
            other => panic!("unexpected L4 header {other:?}"),
        }
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut raw = echo_reply(0).encode().unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        assert!(matches!(
            ScnPkt::decode(&raw),
            Err(WireError::InvalidValue { field: "SCMP checksum", .. })
        ));
    }

    #[test]
    fn test_undecodable_scmp_payload_kept_raw() {
        let mut pkt = echo_reply(0);
        pkt.pld = L4Payload::Raw(vec![2, 0, 0, 0]);
        let decoded = ScnPkt::decode(&pkt.encode().unwrap()).unwrap();
        assert!(matches!(decoded.l4, L4Header::Scmp(_)));
        assert_eq!(decoded.pld, L4Payload::Raw(vec![2, 0, 0, 0]));
    }

    #[test]
    fn test_udp_and_empty_path() {
        let pkt = ScnPkt {
            path: None,
            hbh_ext: Vec::new(),
            l4: L4Header::Udp(UdpHdr {
                src_port: 4000,
                dst_port: 30041,
                total_len: 0,
                checksum: 0,
            }),
            pld: L4Payload::Raw(b"hello".to_vec()),
            ..echo_reply(0)
        };
        let decoded = ScnPkt::decode(&pkt.encode().unwrap()).unwrap();
        assert_eq!(decoded.path, None);
        assert!(decoded.hbh_ext.is_empty());
        assert_eq!(decoded.pld, L4Payload::Raw(b"hello".to_vec()));
        match decoded.l4 {
            L4Header::Udp(udp) => assert_eq!(udp.total_len as usize, UDP_HDR_LEN + 5),
            other => panic!("unexpected L4 header {other:?}"),
        }
    }

    #[test]
    fn test_bad_version() {
        let mut raw = echo_reply(0).encode().unwrap();
        raw[0] = 9;
        assert!(ScnPkt::decode(&raw).is_err());
    }
}
