//! Interface revocations and their signed wrapper.
//!
//! A revocation travels as a [`SignedRevInfo`] envelope whose blob is itself
//! an encoded [`RevInfo`] envelope. Only the structure is decoded here;
//! signature verification belongs to the trust infrastructure.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use crate::addr::{IAInt, IA};
use crate::codec::{Reader, Writer};
use crate::envelope::{self, ProtoId, WireMessage};
use crate::error::{WireError, WireResult};

/// Revocations with a shorter TTL are never considered active.
pub const MIN_REV_TTL: Duration = Duration::from_secs(10);

/// Relationship of the revoked link to the issuing AS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkType {
    Unset = 0,
    Core = 1,
    Parent = 2,
    Child = 3,
    Peer = 4,
}

impl TryFrom<u8> for LinkType {
    type Error = WireError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(LinkType::Unset),
            1 => Ok(LinkType::Core),
            2 => Ok(LinkType::Parent),
            3 => Ok(LinkType::Child),
            4 => Ok(LinkType::Peer),
            other => Err(WireError::invalid("link type", other.to_string())),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkType::Unset => "unset",
            LinkType::Core => "core",
            LinkType::Parent => "parent",
            LinkType::Child => "child",
            LinkType::Peer => "peer",
        };
        f.write_str(s)
    }
}

/// Revocation of a single interface of an AS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevInfo {
    pub if_id: u64,
    pub raw_isd_as: IAInt,
    pub link_type: LinkType,
    /// Issue time, seconds since the Unix epoch.
    pub raw_timestamp: u32,
    /// Validity period in seconds.
    pub raw_ttl: u32,
}

impl RevInfo {
    pub fn ia(&self) -> IA {
        self.raw_isd_as.ia()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.raw_timestamp), 0).unwrap_or_default()
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.raw_ttl))
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(
            i64::from(self.raw_timestamp) + i64::from(self.raw_ttl),
            0,
        )
        .unwrap_or_default()
    }

    /// Whether the revocation is still in force at `now`.
    pub fn active(&self, now: DateTime<Utc>) -> bool {
        self.ttl() >= MIN_REV_TTL && self.timestamp() <= now && now < self.expiration()
    }
}

impl WireMessage for RevInfo {
    const PROTO_ID: ProtoId = ProtoId::REV_INFO;

    fn encode_body(&self, w: &mut Writer) -> WireResult<()> {
        w.put_u64(self.if_id);
        w.put_u64(self.raw_isd_as.0);
        w.put_u8(self.link_type as u8);
        w.put_u32(self.raw_timestamp);
        w.put_u32(self.raw_ttl);
        Ok(())
    }

    fn decode_body(r: &mut Reader<'_>) -> WireResult<Self> {
        Ok(Self {
            if_id: r.read_u64()?,
            raw_isd_as: IAInt(r.read_u64()?),
            link_type: LinkType::try_from(r.read_u8()?)?,
            raw_timestamp: r.read_u32()?,
            raw_ttl: r.read_u32()?,
        })
    }
}

impl fmt::Display for RevInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IA: {} IfID: {} Link type: {} Timestamp: {} TTL: {}s",
            self.ia(),
            self.if_id,
            self.link_type,
            self.timestamp(),
            self.raw_ttl
        )
    }
}

/// Signature metadata attached to a signed blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub sign_type: u8,
    /// Identifies the signing key, opaque to this crate.
    pub src: Vec<u8>,
    pub signature: Vec<u8>,
    pub timestamp: u32,
}

/// A [`RevInfo`] envelope together with its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRevInfo {
    pub blob: Vec<u8>,
    pub sign: Signature,
}

impl SignedRevInfo {
    /// Wraps an already signed revocation.
    pub fn new(rev_info: &RevInfo, sign: Signature) -> WireResult<Self> {
        Ok(Self {
            blob: envelope::encode(rev_info)?,
            sign,
        })
    }

    /// Decodes a signed revocation from its raw envelope.
    pub fn from_raw(raw: &[u8]) -> WireResult<Self> {
        envelope::decode(raw)
    }

    /// Decodes the inner revocation. The signature is not checked.
    pub fn rev_info(&self) -> WireResult<RevInfo> {
        envelope::decode(&self.blob)
    }

    pub fn to_raw(&self) -> WireResult<Vec<u8>> {
        envelope::encode(self)
    }
}

impl WireMessage for SignedRevInfo {
    const PROTO_ID: ProtoId = ProtoId::SIGNED_REV_INFO;

    fn encode_body(&self, w: &mut Writer) -> WireResult<()> {
        w.put_len_prefixed("blob", &self.blob)?;
        w.put_u8(self.sign.sign_type);
        w.put_len_prefixed("src", &self.sign.src)?;
        w.put_len_prefixed("signature", &self.sign.signature)?;
        w.put_u32(self.sign.timestamp);
        Ok(())
    }

    fn decode_body(r: &mut Reader<'_>) -> WireResult<Self> {
        let blob = r.read_len_prefixed()?.to_vec();
        let sign = Signature {
            sign_type: r.read_u8()?,
            src: r.read_len_prefixed()?.to_vec(),
            signature: r.read_len_prefixed()?.to_vec(),
            timestamp: r.read_u32()?,
        };
        Ok(Self { blob, sign })
    }
}
