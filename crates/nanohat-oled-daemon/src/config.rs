//! Configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::screens::ScreenId;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// TrueType font used for all text
    #[serde(default = "default_font")]
    pub font: String,

    /// Splash image shown at startup
    #[serde(default = "default_splash")]
    pub splash: String,

    /// OLED configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Button configuration
    #[serde(default)]
    pub buttons: ButtonsConfig,

    /// Loop timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Network info screen configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Throughput test configuration
    #[serde(default)]
    pub throughput: ThroughputConfig,
}

/// OLED bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// I2C bus device
    #[serde(default = "default_bus")]
    pub bus: String,

    /// 7-bit controller address
    #[serde(default = "default_address")]
    pub address: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            address: default_address(),
        }
    }
}

/// A button's GPIO line and the screen it selects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Line offset on the GPIO chip
    pub line: u32,

    /// Screen selected while the button is pressed
    pub screen: ScreenId,
}

/// Button configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonsConfig {
    /// GPIO character device
    #[serde(default = "default_chip")]
    pub chip: String,

    #[serde(default = "default_f1")]
    pub f1: ButtonConfig,

    #[serde(default = "default_f2")]
    pub f2: ButtonConfig,

    #[serde(default = "default_f3")]
    pub f3: ButtonConfig,
}

impl Default for ButtonsConfig {
    fn default() -> Self {
        Self {
            chip: default_chip(),
            f1: default_f1(),
            f2: default_f2(),
            f3: default_f3(),
        }
    }
}

impl ButtonsConfig {
    /// Returns the F1, F2 and F3 line offsets.
    pub fn offsets(&self) -> [u32; 3] {
        [self.f1.line, self.f2.line, self.f3.line]
    }
}

/// Loop timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Sleep between ticks in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// How long the startup splash stays up in milliseconds
    #[serde(default = "default_splash_hold_ms")]
    pub splash_hold_ms: u64,

    /// How long throughput results stay up in milliseconds
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,

    /// Splash screen display-off timeout in seconds
    #[serde(default = "default_display_off_timeout_secs")]
    pub display_off_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            splash_hold_ms: default_splash_hold_ms(),
            dwell_ms: default_dwell_ms(),
            display_off_timeout_secs: default_display_off_timeout_secs(),
        }
    }
}

impl TimingConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn splash_hold(&self) -> Duration {
        Duration::from_millis(self.splash_hold_ms)
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn display_off_timeout(&self) -> Duration {
        Duration::from_secs(self.display_off_timeout_secs)
    }
}

/// Network info screen configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Interface whose IPv4 prefix length is shown
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Address used to pick the outgoing IPv4 address (nothing is sent)
    #[serde(default = "default_route_probe")]
    pub route_probe: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            route_probe: default_route_probe(),
        }
    }
}

/// Throughput test configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputConfig {
    /// Measurement program
    #[serde(default = "default_program")]
    pub program: String,

    /// Server to measure against
    #[serde(default = "default_host")]
    pub host: String,

    /// Test length in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Hard limit on the program's run time in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ThroughputConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            host: default_host(),
            duration_secs: default_duration_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Default value functions
fn default_font() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf".to_string()
}

fn default_splash() -> String {
    "splash.png".to_string()
}

fn default_bus() -> String {
    "/dev/i2c-0".to_string()
}

fn default_address() -> u8 {
    nanohat_oled_hw::OLED_I2C_ADDRESS
}

fn default_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_f1() -> ButtonConfig {
    ButtonConfig {
        line: 0,
        screen: ScreenId::Clock,
    }
}

fn default_f2() -> ButtonConfig {
    ButtonConfig {
        line: 2,
        screen: ScreenId::NetworkInfo,
    }
}

fn default_f3() -> ButtonConfig {
    ButtonConfig {
        line: 3,
        screen: ScreenId::ThroughputTest,
    }
}

fn default_tick_ms() -> u64 {
    50
}

fn default_splash_hold_ms() -> u64 {
    3000
}

fn default_dwell_ms() -> u64 {
    5000
}

fn default_display_off_timeout_secs() -> u64 {
    30
}

fn default_interface() -> String {
    "end0".to_string()
}

fn default_route_probe() -> String {
    "192.168.3.1:80".to_string()
}

fn default_program() -> String {
    "iperf3".to_string()
}

fn default_host() -> String {
    "185.216.141.19".to_string()
}

fn default_duration_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: default_font(),
            splash: default_splash(),
            display: DisplayConfig::default(),
            buttons: ButtonsConfig::default(),
            timing: TimingConfig::default(),
            network: NetworkConfig::default(),
            throughput: ThroughputConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.display.bus, "/dev/i2c-0");
        assert_eq!(config.display.address, 0x3C);
        assert_eq!(config.buttons.offsets(), [0, 2, 3]);
        assert_eq!(config.buttons.f3.screen, ScreenId::ThroughputTest);
        assert_eq!(config.timing.tick(), Duration::from_millis(50));
        assert_eq!(config.timing.display_off_timeout(), Duration::from_secs(30));
        assert_eq!(config.throughput.timeout_secs, 10);
    }

    #[test]
    fn test_partial_override() {
        let config: Config = toml::from_str(
            r#"
            splash = "/opt/splash.png"

            [display]
            address = 0x3D

            [buttons.f3]
            line = 7
            screen = "splash"

            [timing]
            dwell_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.splash, "/opt/splash.png");
        assert_eq!(config.display.address, 0x3D);
        assert_eq!(config.display.bus, "/dev/i2c-0");
        assert_eq!(config.buttons.offsets(), [0, 2, 7]);
        assert_eq!(config.buttons.f3.screen, ScreenId::Splash);
        assert_eq!(config.timing.dwell(), Duration::from_secs(2));
        assert_eq!(config.timing.tick_ms, 50);
    }

    #[test]
    fn test_unknown_screen_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [buttons.f1]
            line = 0
            screen = "weather"
            "#,
        );
        assert!(result.is_err());
    }
}
