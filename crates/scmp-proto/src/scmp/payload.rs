//! SCMP payload.

use std::fmt;

use super::hdr::ClassType;
use super::info::Info;
use super::meta::Meta;
use super::META_LEN;
use crate::codec::{Reader, Writer};
use crate::error::WireResult;

/// A decoded SCMP payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub meta: Meta,
    pub info: Info,
    /// Headers of the packet that triggered the message, as described by
    /// `meta`. Empty for echo traffic.
    pub quoted: Vec<u8>,
    /// Remaining bytes, e.g. echo filler.
    pub data: Vec<u8>,
}

impl Payload {
    pub fn len(&self) -> usize {
        META_LEN + self.info.len() + self.quoted.len() + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Decodes a payload whose info block is interpreted according to `ct`.
    pub fn parse(ct: ClassType, raw: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(raw);
        let meta = Meta::parse(&mut r)?;
        let info = Info::parse(ct, r.read_bytes(meta.info_bytes())?)?;
        let quoted = r.read_bytes(meta.quoted_bytes())?.to_vec();
        let data = r.read_rest().to_vec();
        Ok(Self {
            meta,
            info,
            quoted,
            data,
        })
    }

    pub fn write(&self, w: &mut Writer) -> WireResult<()> {
        let mut buf = vec![0u8; self.len()];
        self.meta.write(&mut buf)?;
        self.info.write(&mut buf[META_LEN..])?;
        let mut off = META_LEN + self.info.len();
        buf[off..off + self.quoted.len()].copy_from_slice(&self.quoted);
        off += self.quoted.len();
        buf[off..].copy_from_slice(&self.data);
        w.put_bytes(&buf);
        Ok(())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Info: {} Quoted={}B Data={}B",
            self.info,
            self.quoted.len(),
            self.data.len()
        )
    }
}
