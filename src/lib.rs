//! # DHCP Sentry - Detect Other DHCP Servers
//!
//! DHCP Sentry answers one question for a network interface: is a DHCP
//! server already answering on this segment? It is meant to run on a host
//! that is about to start its own DHCP service.
//!
//! ## Features
//!
//! - DHCPv4: broadcasts a Discover and waits for a matching reply
//! - DHCPv6: multicasts a Solicit and waits for a matching Advertise
//! - A single attempt bounded by one fixed timeout
//! - Unrelated or malformed traffic is ignored, transport failures are reported
//!
//! ## Example
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (v4, v6) = tokio::join!(dhcp_sentry::check_v4("eth0"), dhcp_sentry::check_v6("eth0"));
//!     println!("DHCPv4 server present: {}", v4?);
//!     println!("DHCPv6 server present: {}", v6?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod network;
pub mod probe;
pub mod timeout;
pub mod v4;
pub mod v6;

pub use config::{Args, DetectorConfig, ProbeConfig};
pub use detector::{check_v4, check_v6, Detector};
pub use error::{ErrorKind, Phase, ProbeError};
pub use probe::Detection;
