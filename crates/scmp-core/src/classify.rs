//! Classification of inbound packets.
//!
//! Revocation notices share the reply channel with echo replies but are not
//! answers to any probe. [`classify`] separates them so callers can react
//! (e.g. drop a cached path) without treating them as protocol errors.

use scmp_proto::ctrl::{RevInfo, SignedRevInfo};
use scmp_proto::scmp::{Hdr, Info, Payload};
use scmp_proto::{L4Header, L4Payload, ScnPkt};

use crate::error::{RevocationError, ScmpError};

/// Outcome of [`classify`]. Exactly one variant applies to any packet.
#[derive(Debug)]
pub enum Classification<'a> {
    /// The L4 protocol is not SCMP.
    NotDiagnostic { l4: &'static str },
    /// SCMP header, but the payload is not a decoded SCMP payload.
    NotDiagnosticPayload { hdr: &'a Hdr, payload: &'static str },
    /// Any SCMP message other than a revocation.
    Reply { hdr: &'a Hdr, pld: &'a Payload },
    /// A revocation notice with its decoded record.
    Revocation {
        hdr: &'a Hdr,
        pld: &'a Payload,
        rev_info: RevInfo,
    },
    /// A revocation notice whose nested record could not be decoded.
    RevocationUndecodable {
        hdr: &'a Hdr,
        pld: &'a Payload,
        error: RevocationError,
    },
}

impl<'a> Classification<'a> {
    pub fn header(&self) -> Option<&'a Hdr> {
        match self {
            Classification::NotDiagnostic { .. } => None,
            Classification::NotDiagnosticPayload { hdr, .. }
            | Classification::Reply { hdr, .. }
            | Classification::Revocation { hdr, .. }
            | Classification::RevocationUndecodable { hdr, .. } => Some(*hdr),
        }
    }

    pub fn payload(&self) -> Option<&'a Payload> {
        match self {
            Classification::NotDiagnostic { .. }
            | Classification::NotDiagnosticPayload { .. } => None,
            Classification::Reply { pld, .. }
            | Classification::Revocation { pld, .. }
            | Classification::RevocationUndecodable { pld, .. } => Some(*pld),
        }
    }

    /// The failure carried by this outcome, if any. Ordinary replies and
    /// decoded revocations are not failures.
    pub fn into_error(self) -> Option<ScmpError> {
        match self {
            Classification::NotDiagnostic { l4 } => Some(ScmpError::NotDiagnostic { l4 }),
            Classification::NotDiagnosticPayload { payload, .. } => {
                Some(ScmpError::NotDiagnosticPayload { payload })
            }
            Classification::RevocationUndecodable { error, .. } => Some(error.into()),
            Classification::Reply { .. } | Classification::Revocation { .. } => None,
        }
    }
}

/// Classifies an inbound packet.
pub fn classify(pkt: &ScnPkt) -> Classification<'_> {
    let hdr = match &pkt.l4 {
        L4Header::Scmp(hdr) => hdr,
        other => return Classification::NotDiagnostic { l4: other.name() },
    };
    let pld = match &pkt.pld {
        L4Payload::Scmp(pld) => pld,
        other => {
            return Classification::NotDiagnosticPayload {
                hdr,
                payload: other.name(),
            }
        }
    };
    if !hdr.class_type.is_revocation() {
        return Classification::Reply { hdr, pld };
    }
    match decode_revocation(pld) {
        Ok(rev_info) => Classification::Revocation { hdr, pld, rev_info },
        Err(error) => Classification::RevocationUndecodable { hdr, pld, error },
    }
}

fn decode_revocation(pld: &Payload) -> Result<RevInfo, RevocationError> {
    let info = match &pld.info {
        Info::Revocation(info) => info,
        _ => return Err(RevocationError::BadRevocationInfo),
    };
    let signed =
        SignedRevInfo::from_raw(&info.raw_srev).map_err(RevocationError::BadSignedRevocation)?;
    signed.rev_info().map_err(RevocationError::BadRevocationRecord)
}
