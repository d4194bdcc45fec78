//! IPv4 network in CIDR notation.
//!
//! [`Ipv4`] serializes as `a.b.c.d/len`, which is the form Neutron uses for a
//! subnet `cidr` field in both requests and responses.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

const MAX_PREFIX_LEN: u8 = 32;

/// IPv4 network in CIDR notation.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
pub struct Ipv4 {
    /// The network address.
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl FromStr for Ipv4 {
    type Err = String;

    /// Parse `a.b.c.d/len`, surrounding whitespace allowed.
    fn from_str(s: &str) -> Result<Ipv4, String> {
        let s = s.trim();
        let (addr, mask) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid CIDR format: {s}"))?;
        let addr = Ipv4Addr::from_str(addr).map_err(|_| format!("invalid IP address: {addr}"))?;
        let mask = u8::from_str(mask)
            .ok()
            .filter(|m| *m <= MAX_PREFIX_LEN)
            .ok_or_else(|| format!("invalid subnet mask: {mask}"))?;
        Ok(Ipv4 { addr, mask })
    }
}

impl Serialize for Ipv4 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4 {
    fn deserialize<D>(deserializer: D) -> Result<Ipv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl std::fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}
