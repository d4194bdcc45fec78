//! Names and address block derived from a unit index.

use super::Ipv4;
use crate::error::UnitError;
use std::fmt;
use std::net::Ipv4Addr;

const FIRST_OCTET: u8 = 192;
const SECOND_OCTET_BASE: u32 = 168;
const UNIT_PREFIX_LEN: u8 = 24;

/// One network + subnet pair to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkUnit {
    pub index: u32,
    pub network_name: String,
    pub subnet_name: String,
    pub cidr: Ipv4,
}

/// `spawn_network-{index}`
pub fn network_name(index: u32) -> String {
    format!("spawn_network-{index}")
}

/// `spawn_subnet-{network_name}`
pub fn subnet_name(network_name: &str) -> String {
    format!("spawn_subnet-{network_name}")
}

impl NetworkUnit {
    /// Derive the unit for `index`.
    ///
    /// The CIDR is `192.{168 + index / 256}.{index % 256}.0/24`. Indices whose
    /// second octet would pass 255 are rejected with
    /// [`UnitError::RangeExhausted`]; the first such index is 22528.
    pub fn new(index: u32) -> Result<NetworkUnit, UnitError> {
        let network_name = network_name(index);
        let octet_2 = SECOND_OCTET_BASE + index / 256;
        let octet_3 = index % 256;

        let octet_2 = match u8::try_from(octet_2) {
            Ok(o) => o,
            Err(_) => {
                return Err(UnitError::RangeExhausted {
                    index,
                    network_name,
                    octet_2,
                })
            }
        };

        let cidr = Ipv4 {
            addr: Ipv4Addr::new(FIRST_OCTET, octet_2, octet_3 as u8, 0),
            mask: UNIT_PREFIX_LEN,
        };

        Ok(NetworkUnit {
            index,
            subnet_name: subnet_name(&network_name),
            network_name,
            cidr,
        })
    }
}

impl fmt::Display for NetworkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.network_name, self.cidr)
    }
}
