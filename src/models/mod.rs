//! Domain models for the network provisioner.
//!
//! - [`Ipv4`] - IPv4 network with CIDR notation support
//! - [`NetworkUnit`] - names and CIDR derived from a unit index
//! - [`Summary`] - aggregated per-unit outcomes of a run

mod ipv4;
mod outcome;
mod unit;

// Re-export public types
pub use ipv4::Ipv4;
pub use outcome::{ProvisionedUnit, Summary, UnitResult};
pub use unit::{network_name, subnet_name, NetworkUnit};
