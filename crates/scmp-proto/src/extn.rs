//! Hop-by-hop extension headers.
//!
//! ```text
//! ext_type (1) || body_len (1) || body (body_len)
//! ```

use crate::codec::{Reader, Writer};
use crate::error::{WireError, WireResult};

const EXT_SCMP: u8 = 2;
const EXT_ONE_HOP_PATH: u8 = 3;

const SCMP_FLAG_ERROR: u8 = 0x01;
const SCMP_FLAG_HBH: u8 = 0x02;

/// Extension attached to a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// Marks the packet as SCMP; `hop_by_hop` asks every router to process it.
    Scmp(ExtnScmp),
    /// The path is built hop by hop by the routers it crosses.
    OneHopPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtnScmp {
    pub error: bool,
    pub hop_by_hop: bool,
}

impl Extension {
    pub fn encoded_len(&self) -> usize {
        2 + match self {
            Extension::Scmp(_) => 1,
            Extension::OneHopPath => 0,
        }
    }

    pub fn write(&self, w: &mut Writer) {
        match self {
            Extension::Scmp(e) => {
                let mut flags = 0;
                if e.error {
                    flags |= SCMP_FLAG_ERROR;
                }
                if e.hop_by_hop {
                    flags |= SCMP_FLAG_HBH;
                }
                w.put_u8(EXT_SCMP);
                w.put_u8(1);
                w.put_u8(flags);
            }
            Extension::OneHopPath => {
                w.put_u8(EXT_ONE_HOP_PATH);
                w.put_u8(0);
            }
        }
    }

    pub fn parse(r: &mut Reader<'_>) -> WireResult<Self> {
        let ext_type = r.read_u8()?;
        let body_len = r.read_u8()? as usize;
        let body = r.read_bytes(body_len)?;
        match (ext_type, body) {
            (EXT_SCMP, [flags]) => Ok(Extension::Scmp(ExtnScmp {
                error: flags & SCMP_FLAG_ERROR != 0,
                hop_by_hop: flags & SCMP_FLAG_HBH != 0,
            })),
            (EXT_ONE_HOP_PATH, []) => Ok(Extension::OneHopPath),
            _ => Err(WireError::invalid(
                "extension",
                format!("type {ext_type} with {body_len} byte body"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scmp_ext() {
        let ext = Extension::Scmp(ExtnScmp {
            error: false,
            hop_by_hop: true,
        });
        let mut w = Writer::new();
        ext.write(&mut w);
        let raw = w.into_inner();
        assert_eq!(raw, vec![EXT_SCMP, 1, SCMP_FLAG_HBH]);
        assert_eq!(raw.len(), ext.encoded_len());
        assert_eq!(Extension::parse(&mut Reader::new(&raw)).unwrap(), ext);
    }

    #[test]
    fn test_unknown_ext() {
        assert!(Extension::parse(&mut Reader::new(&[9, 0])).is_err());
        assert!(Extension::parse(&mut Reader::new(&[EXT_ONE_HOP_PATH, 1, 0])).is_err());
    }
}
