//! Screen layouts.
//!
//! Each screen is a pure function from its data to the text lines to draw, so
//! layouts can be checked without a font or a display.

mod clock;
mod network;
mod splash;
mod throughput;

pub use clock::clock_lines;
pub use network::network_lines;
pub use splash::load_splash;
pub use throughput::{progress_lines, rate_lines};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Left margin shared by every text screen.
pub const TEXT_X: i32 = 6;

/// Row pitch for 10 px text.
pub const ROW_PITCH: i32 = 12;

/// Top of the first row.
pub const FIRST_ROW_Y: i32 = 2;

/// The screens the daemon can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenId {
    Splash,
    Clock,
    NetworkInfo,
    ThroughputTest,
}

impl ScreenId {
    pub fn name(self) -> &'static str {
        match self {
            ScreenId::Splash => "splash",
            ScreenId::Clock => "clock",
            ScreenId::NetworkInfo => "network-info",
            ScreenId::ThroughputTest => "throughput-test",
        }
    }

    /// Returns all screen names.
    pub fn available() -> Vec<&'static str> {
        vec!["splash", "clock", "network-info", "throughput-test"]
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScreenId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "splash" => Ok(ScreenId::Splash),
            "clock" => Ok(ScreenId::Clock),
            "network-info" | "network" => Ok(ScreenId::NetworkInfo),
            "throughput-test" | "throughput" => Ok(ScreenId::ThroughputTest),
            other => Err(format!(
                "unknown screen '{}' (expected one of: {})",
                other,
                Self::available().join(", ")
            )),
        }
    }
}

/// Y coordinate of a 10 px text row.
pub fn row_y(row: usize) -> i32 {
    FIRST_ROW_Y + ROW_PITCH * row as i32
}
