//! DHCPv4 server detection
//!
//! This module contains the DHCPv4-specific implementation including:
//! - Discover construction
//! - Offer correlation
//! - The probe itself

pub mod message;
pub mod probe;

#[cfg(test)]
mod tests;

pub use message::{build_dhcp_discover, match_response};
pub use probe::probe;
