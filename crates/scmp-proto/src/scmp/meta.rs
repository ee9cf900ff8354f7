//! SCMP meta block.

use super::{LINE_LEN, META_LEN};
use crate::codec::Reader;
use crate::error::{WireError, WireResult};

/// Lengths of the blocks that follow the meta block, in lines.
///
/// ```text
/// info_len || cmn_hdr_len || addr_hdr_len || path_hdr_len
/// || exts_len || l4_hdr_len || l4_proto || (pad)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Meta {
    pub info_len: u8,
    pub cmn_hdr_len: u8,
    pub addr_hdr_len: u8,
    pub path_hdr_len: u8,
    pub exts_len: u8,
    pub l4_hdr_len: u8,
    pub l4_proto: u8,
}

impl Meta {
    /// Writes the meta block into the first [`META_LEN`] bytes of `buf`.
    pub fn write(&self, buf: &mut [u8]) -> WireResult<()> {
        let remaining = buf.len();
        let out = buf.get_mut(..META_LEN).ok_or(WireError::UnexpectedEof {
            needed: META_LEN,
            remaining,
        })?;
        out.copy_from_slice(&[
            self.info_len,
            self.cmn_hdr_len,
            self.addr_hdr_len,
            self.path_hdr_len,
            self.exts_len,
            self.l4_hdr_len,
            self.l4_proto,
            0,
        ]);
        Ok(())
    }

    pub fn parse(r: &mut Reader<'_>) -> WireResult<Self> {
        let raw: [u8; META_LEN] = r.read_array()?;
        Ok(Self {
            info_len: raw[0],
            cmn_hdr_len: raw[1],
            addr_hdr_len: raw[2],
            path_hdr_len: raw[3],
            exts_len: raw[4],
            l4_hdr_len: raw[5],
            l4_proto: raw[6],
        })
    }

    /// Info block length in bytes.
    pub fn info_bytes(&self) -> usize {
        usize::from(self.info_len) * LINE_LEN
    }

    /// Combined length of the quoted headers in bytes.
    pub fn quoted_bytes(&self) -> usize {
        [
            self.cmn_hdr_len,
            self.addr_hdr_len,
            self.path_hdr_len,
            self.exts_len,
            self.l4_hdr_len,
        ]
        .iter()
        .map(|l| usize::from(*l) * LINE_LEN)
        .sum()
    }
}
