//! Data sources for the information screens.

pub mod iperf;
pub mod network;

pub use iperf::{Direction, IperfProbe, ThroughputProbe};
pub use network::{NetworkInfo, NetworkQuery, SystemNetwork};
