//! ISD-AS addressing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WireError;

/// Number of bits used by the AS number.
pub const AS_BITS: u32 = 48;
/// Largest valid AS number.
pub const MAX_AS: u64 = (1 << AS_BITS) - 1;
/// AS numbers at or above this are printed in colon-separated hex groups.
const BGP_AS_LIMIT: u64 = 1 << 32;

/// Isolation domain identifier.
pub type Isd = u16;

/// Packed `(isd << 48) | as` form of an [`IA`], as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IAInt(pub u64);

impl IAInt {
    pub fn ia(self) -> IA {
        IA {
            isd: (self.0 >> AS_BITS) as Isd,
            asn: self.0 & MAX_AS,
        }
    }
}

/// An ISD-AS pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct IA {
    pub isd: Isd,
    pub asn: u64,
}

impl IA {
    pub fn new(isd: Isd, asn: u64) -> Result<Self, WireError> {
        if asn > MAX_AS {
            return Err(WireError::invalid("AS", format!("{asn} exceeds 48 bits")));
        }
        Ok(Self { isd, asn })
    }

    pub fn to_int(self) -> IAInt {
        IAInt((u64::from(self.isd) << AS_BITS) | (self.asn & MAX_AS))
    }

    /// Whether either component is the wildcard value 0.
    pub fn is_wildcard(self) -> bool {
        self.isd == 0 || self.asn == 0
    }
}

impl From<IA> for String {
    fn from(ia: IA) -> Self {
        ia.to_string()
    }
}

impl TryFrom<String> for IA {
    type Error = WireError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for IA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.asn < BGP_AS_LIMIT {
            write!(f, "{}-{}", self.isd, self.asn)
        } else {
            write!(
                f,
                "{}-{:x}:{:x}:{:x}",
                self.isd,
                (self.asn >> 32) & 0xffff,
                (self.asn >> 16) & 0xffff,
                self.asn & 0xffff
            )
        }
    }
}

impl FromStr for IA {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (isd, asn) = s
            .split_once('-')
            .ok_or_else(|| WireError::invalid("IA", format!("missing '-' in {s:?}")))?;
        let isd: Isd = isd
            .parse()
            .map_err(|_| WireError::invalid("ISD", format!("{isd:?}")))?;
        IA::new(isd, parse_as(asn)?)
    }
}

fn parse_as(s: &str) -> Result<u64, WireError> {
    if !s.contains(':') {
        return s
            .parse()
            .map_err(|_| WireError::invalid("AS", format!("{s:?}")));
    }
    let groups: Vec<&str> = s.split(':').collect();
    if groups.len() != 3 {
        return Err(WireError::invalid("AS", format!("{s:?} needs 3 groups")));
    }
    groups.iter().try_fold(0u64, |acc, group| {
        let v = u16::from_str_radix(group, 16)
            .map_err(|_| WireError::invalid("AS", format!("bad group {group:?} in {s:?}")))?;
        Ok((acc << 16) | u64::from(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ia_display() {
        assert_eq!(IA::new(1, 0xff00_0000_0110).unwrap().to_string(), "1-ff00:0:110");
        assert_eq!(IA::new(2, 64512).unwrap().to_string(), "2-64512");
    }

    #[test]
    fn test_ia_parse() {
        let ia: IA = "1-ff00:0:110".parse().unwrap();
        assert_eq!(ia.isd, 1);
        assert_eq!(ia.asn, 0xff00_0000_0110);

        let ia: IA = "17-4200".parse().unwrap();
        assert_eq!(ia, IA { isd: 17, asn: 4200 });

        assert!("1_ff00:0:110".parse::<IA>().is_err());
        assert!("1-ff00:0".parse::<IA>().is_err());
        assert!("70000-1".parse::<IA>().is_err());
    }

    #[test]
    fn test_ia_int() {
        let ia: IA = "1-ff00:0:110".parse().unwrap();
        let raw = ia.to_int();
        assert_eq!(raw.0, 0x0001_ff00_0000_0110);
        assert_eq!(raw.ia(), ia);
    }
}
