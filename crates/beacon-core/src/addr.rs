//! ISD and AS addressing.
//!
//! An AS is identified by an [`IA`]: the isolation domain it belongs to plus its
//! 48-bit AS number. Text forms follow the usual conventions: `1-ff00:0:110` for
//! an IA, decimal for BGP-compatible AS numbers and colon-separated hex groups
//! for everything above `u32::MAX`.

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddrError;

/// Number of bits in an AS number.
pub const ASN_BITS: u32 = 48;

/// Largest representable AS number.
pub const MAX_ASN: u64 = (1 << ASN_BITS) - 1;

/// AS numbers up to this value are written in decimal.
const MAX_BGP_ASN: u64 = u32::MAX as u64;

/// Isolation domain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Isd(pub u16);

/// 48-bit AS number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Asn(u64);

impl Asn {
    /// Create an AS number, rejecting values that do not fit in 48 bits.
    pub fn new(value: u64) -> Result<Self, AddrError> {
        if value > MAX_ASN {
            return Err(AddrError::AsnOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Create an AS number from a value known to fit.
    ///
    /// Bits above the 48-bit range are masked off.
    pub const fn from_masked(value: u64) -> Self {
        Self(value & MAX_ASN)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Asn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= MAX_BGP_ASN {
            return write!(f, "{}", self.0);
        }
        write!(
            f,
            "{:x}:{:x}:{:x}",
            (self.0 >> 32) & 0xffff,
            (self.0 >> 16) & 0xffff,
            self.0 & 0xffff
        )
    }
}

impl FromStr for Asn {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains(':') {
            let value: u64 = s
                .parse()
                .map_err(|_| AddrError::InvalidAsn(s.to_string()))?;
            if value > MAX_BGP_ASN {
                return Err(AddrError::InvalidAsn(s.to_string()));
            }
            return Ok(Self(value));
        }

        let groups: Vec<&str> = s.split(':').collect();
        if groups.len() != 3 {
            return Err(AddrError::InvalidAsn(s.to_string()));
        }
        let mut value = 0u64;
        for group in groups {
            if group.is_empty() || group.len() > 4 {
                return Err(AddrError::InvalidAsn(s.to_string()));
            }
            let part = u16::from_str_radix(group, 16)
                .map_err(|_| AddrError::InvalidAsn(s.to_string()))?;
            value = (value << 16) | u64::from(part);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for Isd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Isd {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Isd)
            .map_err(|_| AddrError::InvalidIsd(s.to_string()))
    }
}

/// An ISD-AS pair identifying one autonomous system.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IA {
    pub isd: Isd,
    pub asn: Asn,
}

impl IA {
    pub const fn new(isd: Isd, asn: Asn) -> Self {
        Self { isd, asn }
    }

    /// Whether either component is the zero wildcard.
    pub const fn is_wildcard(&self) -> bool {
        self.isd.0 == 0 || self.asn.is_zero()
    }

    /// Pack into the 8-byte wire representation.
    pub const fn to_u64(self) -> u64 {
        ((self.isd.0 as u64) << ASN_BITS) | self.asn.0
    }

    /// Unpack from the 8-byte wire representation.
    pub const fn from_u64(raw: u64) -> Self {
        Self {
            isd: Isd((raw >> ASN_BITS) as u16),
            asn: Asn::from_masked(raw),
        }
    }
}

impl fmt::Display for IA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.isd, self.asn)
    }
}

impl fmt::Debug for IA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IA({self})")
    }
}

impl FromStr for IA {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (isd, asn) = s
            .split_once('-')
            .ok_or_else(|| AddrError::InvalidIa(s.to_string()))?;
        Ok(Self {
            isd: isd.parse()?,
            asn: asn.parse()?,
        })
    }
}

// ---------------------------------------------------------------------------
// serde
// ---------------------------------------------------------------------------

impl Serialize for Asn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AsnVisitor;

        impl Visitor<'_> for AsnVisitor {
            type Value = Asn;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an AS number or a string such as \"ff00:0:110\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Asn, E> {
                Asn::new(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Asn, E> {
                let v = u64::try_from(v).map_err(|_| E::custom("negative AS number"))?;
                self.visit_u64(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Asn, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AsnVisitor)
    }
}

impl Serialize for Isd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> Deserialize<'de> for Isd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IsdVisitor;

        impl Visitor<'_> for IsdVisitor {
            type Value = Isd;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an ISD number")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Isd, E> {
                u16::try_from(v)
                    .map(Isd)
                    .map_err(|_| E::custom(AddrError::InvalidIsd(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Isd, E> {
                u16::try_from(v)
                    .map(Isd)
                    .map_err(|_| E::custom(AddrError::InvalidIsd(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Isd, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IsdVisitor)
    }
}

impl Serialize for IA {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IA {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_asn() {
        let asn: Asn = "ff00:0:110".parse().unwrap();
        assert_eq!(asn.value(), 0xff00_0000_0110);
        assert_eq!(asn.to_string(), "ff00:0:110");
    }

    #[test]
    fn test_parse_decimal_asn() {
        let asn: Asn = "64512".parse().unwrap();
        assert_eq!(asn.value(), 64512);
        assert_eq!(asn.to_string(), "64512");
    }

    #[test]
    fn test_decimal_asn_above_bgp_range_rejected() {
        assert!("4294967296".parse::<Asn>().is_err());
    }

    #[test]
    fn test_malformed_asn() {
        assert!("ff00:0".parse::<Asn>().is_err());
        assert!("ff00::110".parse::<Asn>().is_err());
        assert!("fffff:0:1".parse::<Asn>().is_err());
        assert!("zz:0:1".parse::<Asn>().is_err());
        assert!("".parse::<Asn>().is_err());
    }

    #[test]
    fn test_asn_range() {
        assert!(Asn::new(MAX_ASN).is_ok());
        assert!(matches!(
            Asn::new(MAX_ASN + 1),
            Err(AddrError::AsnOutOfRange(_))
        ));
    }

    #[test]
    fn test_ia_display_and_parse() {
        let ia: IA = "1-ff00:0:110".parse().unwrap();
        assert_eq!(ia.isd, Isd(1));
        assert_eq!(ia.asn.value(), 0xff00_0000_0110);
        assert_eq!(ia.to_string(), "1-ff00:0:110");
        assert!(!ia.is_wildcard());
    }

    #[test]
    fn test_ia_parse_failures() {
        assert!("1ff00:0:110".parse::<IA>().is_err());
        assert!("x-ff00:0:110".parse::<IA>().is_err());
        assert!("70000-1".parse::<IA>().is_err());
    }

    #[test]
    fn test_ia_wildcard() {
        assert!(IA::default().is_wildcard());
        assert!("0-ff00:0:110".parse::<IA>().unwrap().is_wildcard());
        assert!("1-0".parse::<IA>().unwrap().is_wildcard());
    }

    #[test]
    fn test_ia_u64_packing() {
        let ia: IA = "2-ff00:0:211".parse().unwrap();
        assert_eq!(ia.to_u64() >> 48, 2);
        assert_eq!(IA::from_u64(ia.to_u64()), ia);
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let asns: Vec<Asn> = serde_yaml::from_str("[64512, \"ff00:0:110\"]").unwrap();
        assert_eq!(asns[0].value(), 64512);
        assert_eq!(asns[1].value(), 0xff00_0000_0110);

        let isds: Vec<Isd> = serde_yaml::from_str("[1, \"2\"]").unwrap();
        assert_eq!(isds, vec![Isd(1), Isd(2)]);

        assert!(serde_yaml::from_str::<Vec<Isd>>("[70000]").is_err());
        assert!(serde_yaml::from_str::<Vec<Asn>>("[-1]").is_err());
    }

    #[test]
    fn test_serde_ia_string() {
        let ia: IA = serde_yaml::from_str("\"1-ff00:0:110\"").unwrap();
        assert_eq!(ia.to_string(), "1-ff00:0:110");
        let out = serde_yaml::to_string(&ia).unwrap();
        assert_eq!(out.trim(), "1-ff00:0:110");
    }
}
