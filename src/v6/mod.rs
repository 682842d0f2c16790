//! DHCPv6 server detection
//!
//! Solicit construction, relay envelope handling, Advertise correlation and
//! the probe itself.

pub mod message;
pub mod probe;


pub use message::{build_solicit, client_duid, match_response, Response};
pub use probe::probe;
