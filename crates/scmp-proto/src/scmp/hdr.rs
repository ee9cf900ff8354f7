//! SCMP header and the class/type tag pair.

use chrono::{DateTime, Utc};
use std::fmt;

use super::HDR_LEN;
use crate::codec::{Reader, Writer};
use crate::error::WireResult;

/// SCMP message class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Class {
    General = 0,
    Routing = 1,
    CmnHdr = 2,
    Path = 3,
    Ext = 4,
    Sec = 5,
}

impl Class {
    pub fn from_raw(v: u16) -> Option<Self> {
        match v {
            0 => Some(Class::General),
            1 => Some(Class::Routing),
            2 => Some(Class::CmnHdr),
            3 => Some(Class::Path),
            4 => Some(Class::Ext),
            5 => Some(Class::Sec),
            _ => None,
        }
    }
}

/// Types of the `General` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum GeneralType {
    Unspecified = 0,
    EchoRequest = 1,
    EchoReply = 2,
    TraceRouteRequest = 3,
    TraceRouteReply = 4,
    RecordPathRequest = 5,
    RecordPathReply = 6,
}

impl GeneralType {
    fn from_raw(v: u16) -> Option<Self> {
        use GeneralType::*;
        [
            Unspecified,
            EchoRequest,
            EchoReply,
            TraceRouteRequest,
            TraceRouteReply,
            RecordPathRequest,
            RecordPathReply,
        ]
        .into_iter()
        .find(|t| *t as u16 == v)
    }
}

/// Types of the `Path` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PathType {
    PathRequired = 0,
    BadMac = 1,
    ExpiredHopF = 2,
    BadIf = 3,
    RevokedIf = 4,
    NonRoutingHopF = 5,
    DeliveryFwdOnly = 6,
    DeliveryNonLocal = 7,
    BadSegment = 8,
    BadInfoField = 9,
    BadHopField = 10,
}

impl PathType {
    fn from_raw(v: u16) -> Option<Self> {
        use PathType::*;
        [
            PathRequired,
            BadMac,
            ExpiredHopF,
            BadIf,
            RevokedIf,
            NonRoutingHopF,
            DeliveryFwdOnly,
            DeliveryNonLocal,
            BadSegment,
            BadInfoField,
            BadHopField,
        ]
        .into_iter()
        .find(|t| *t as u16 == v)
    }
}

/// The class/type pair that selects how an SCMP payload is interpreted.
///
/// Classes this tool does not act on are kept verbatim in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassType {
    General(GeneralType),
    Path(PathType),
    Other { class: u16, ty: u16 },
}

impl ClassType {
    pub fn from_raw(class: u16, ty: u16) -> Self {
        match Class::from_raw(class) {
            Some(Class::General) => GeneralType::from_raw(ty).map(ClassType::General),
            Some(Class::Path) => PathType::from_raw(ty).map(ClassType::Path),
            _ => None,
        }
        .unwrap_or(ClassType::Other { class, ty })
    }

    pub fn class(&self) -> u16 {
        match self {
            ClassType::General(_) => Class::General as u16,
            ClassType::Path(_) => Class::Path as u16,
            ClassType::Other { class, .. } => *class,
        }
    }

    pub fn ty(&self) -> u16 {
        match self {
            ClassType::General(t) => *t as u16,
            ClassType::Path(t) => *t as u16,
            ClassType::Other { ty, .. } => *ty,
        }
    }

    pub fn is_revocation(&self) -> bool {
        matches!(self, ClassType::Path(PathType::RevokedIf))
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassType::General(t) => write!(f, "C=General T={:?}", t),
            ClassType::Path(t) => write!(f, "C=Path T={:?}", t),
            ClassType::Other { class, ty } => match Class::from_raw(*class) {
                Some(c) => write!(f, "C={:?} T={}", c, ty),
                None => write!(f, "C={} T={}", class, ty),
            },
        }
    }
}

/// SCMP header.
///
/// ```text
/// class (2) || type (2) || total_len (2) || checksum (2) || timestamp_us (8)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hdr {
    pub class_type: ClassType,
    /// Length of header and payload in bytes.
    pub total_len: u16,
    pub checksum: u16,
    /// Microseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Hdr {
    /// Creates a header for a payload of `pld_len` bytes, stamped with the
    /// current time.
    pub fn new(class_type: ClassType, pld_len: usize) -> Self {
        let mut hdr = Self {
            class_type,
            total_len: (HDR_LEN + pld_len).min(u16::MAX as usize) as u16,
            checksum: 0,
            timestamp: 0,
        };
        hdr.set_time(Utc::now());
        hdr
    }

    pub fn set_time(&mut self, ts: DateTime<Utc>) {
        self.timestamp = u64::try_from(ts.timestamp_micros()).unwrap_or(0);
    }

    pub fn time(&self) -> DateTime<Utc> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_micros)
            .unwrap_or_default()
    }

    pub fn write(&self, w: &mut Writer) {
        w.put_u16(self.class_type.class());
        w.put_u16(self.class_type.ty());
        w.put_u16(self.total_len);
        w.put_u16(self.checksum);
        w.put_u64(self.timestamp);
    }

    pub fn parse(r: &mut Reader<'_>) -> WireResult<Self> {
        let class = r.read_u16()?;
        let ty = r.read_u16()?;
        Ok(Self {
            class_type: ClassType::from_raw(class, ty),
            total_len: r.read_u16()?,
            checksum: r.read_u16()?,
            timestamp: r.read_u64()?,
        })
    }
}

impl fmt::Display for Hdr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} TotalLen={} Checksum={:04x} Timestamp={}",
            self.class_type,
            self.total_len,
            self.checksum,
            self.time()
        )
    }
}
