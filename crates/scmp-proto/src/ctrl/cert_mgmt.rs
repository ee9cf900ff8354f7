//! Certificate chain requests.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::addr::{IAInt, IA};
use crate::codec::{Reader, Writer};
use crate::envelope::{ProtoId, WireMessage};
use crate::error::WireResult;

/// Request for the certificate chain of an AS, identified by subject key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReq {
    pub raw_ia: IAInt,
    pub subject_key_id: Vec<u8>,
    /// Seconds since the Unix epoch.
    pub raw_date: i64,
}

impl ChainReq {
    pub fn new(ia: IA, subject_key_id: Vec<u8>, date: DateTime<Utc>) -> Self {
        Self {
            raw_ia: ia.to_int(),
            subject_key_id,
            raw_date: date.timestamp(),
        }
    }

    pub fn ia(&self) -> IA {
        self.raw_ia.ia()
    }

    /// The request date in UTC. Out-of-range raw values clamp to the epoch.
    pub fn date(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.raw_date, 0).unwrap_or_default()
    }
}

impl WireMessage for ChainReq {
    const PROTO_ID: ProtoId = ProtoId::CERT_CHAIN_REQ;

    fn encode_body(&self, w: &mut Writer) -> WireResult<()> {
        w.put_u64(self.raw_ia.0);
        w.put_len_prefixed("subject_key_id", &self.subject_key_id)?;
        w.put_i64(self.raw_date);
        Ok(())
    }

    fn decode_body(r: &mut Reader<'_>) -> WireResult<Self> {
        Ok(Self {
            raw_ia: IAInt(r.read_u64()?),
            subject_key_id: r.read_len_prefixed()?.to_vec(),
            raw_date: r.read_i64()?,
        })
    }
}

impl fmt::Display for ChainReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ISD-AS: {} SubjectKeyID: {} Date: {}",
            self.ia(),
            hex::encode(&self.subject_key_id),
            self.date()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{decode, encode};
    use crate::error::WireError;
    use crate::ctrl::RevInfo;
    use proptest::prelude::*;

    fn sample() -> ChainReq {
        ChainReq::new(
            "1-ff00:0:110".parse().unwrap(),
            vec![0x0a, 0x0b, 0x0c],
            DateTime::from_timestamp(1_600_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_accessors() {
        let req = sample();
        assert_eq!(req.ia().to_string(), "1-ff00:0:110");
        assert_eq!(req.date().timestamp(), 1_600_000_000);
        assert_eq!(req.proto_id(), ProtoId::CERT_CHAIN_REQ);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "ISD-AS: 1-ff00:0:110 SubjectKeyID: 0a0b0c Date: 2020-09-13 12:26:40 UTC"
        );
    }

    #[test]
    fn test_decode_as_other_type_fails() {
        let raw = encode(&sample()).unwrap();
        assert!(matches!(
            decode::<RevInfo>(&raw),
            Err(WireError::MalformedMessage { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_chain_req_round_trip(
            raw_ia in any::<u64>(),
            key in proptest::collection::vec(any::<u8>(), 0..64),
            raw_date in any::<i64>(),
        ) {
            let req = ChainReq { raw_ia: IAInt(raw_ia), subject_key_id: key, raw_date };
            let decoded: ChainReq = decode(&encode(&req).unwrap()).unwrap();
            prop_assert_eq!(decoded, req);
        }
    }
}
