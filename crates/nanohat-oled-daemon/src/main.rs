//! NanoHAT OLED Daemon
//!
//! Drives the 128x64 OLED and the F1-F3 buttons of a NanoHAT: a clock, a
//! network summary and an iperf3 throughput test, one screen per button.

mod config;
mod input;
mod rendering;
mod screens;
mod sensors;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::i2c::I2c;
use nanohat_oled_hw::mock::{MockBus, MockLine};
use nanohat_oled_hw::{ButtonLine, ButtonPanel, OledDevice};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use rendering::TextRenderer;
use screens::ScreenId;
use sensors::{IperfProbe, SystemNetwork};
use state::DeviceContext;

const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "nanohatd")]
#[command(about = "NanoHAT OLED display daemon")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run against an in-memory display and buttons
    #[arg(long)]
    dry_run: bool,

    /// Screen to show after startup
    #[arg(long)]
    screen: Option<ScreenId>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    // Setup Unix signal handlers before touching hardware
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
            }
        }
    };

    let config = load_config(&cli.config)?;
    let glyphs = TextRenderer::from_file(&config.font)?;

    if cli.dry_run {
        info!("Dry run: using in-memory display and buttons");
        let oled = OledDevice::new(MockBus::discarding(), config.display.address);
        let buttons =
            ButtonPanel::from_lines([MockLine::new("F1"), MockLine::new("F2"), MockLine::new("F3")]);
        start(oled, buttons, glyphs, &config, cli.screen, shutdown).await
    } else {
        let oled = OledDevice::open(&config.display.bus, config.display.address)
            .context("Failed to open OLED")?;
        let buttons = ButtonPanel::open(&config.buttons.chip, config.buttons.offsets())
            .context("Failed to open buttons")?;
        start(oled, buttons, glyphs, &config, cli.screen, shutdown).await
    }
}

/// Loads the config file, falling back to defaults when the default path is
/// absent.
fn load_config(path: &Path) -> Result<Config> {
    if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        warn!("No configuration at {:?}, using defaults", path);
        return Ok(Config::default());
    }
    let config = Config::load(path).context("Failed to load configuration")?;
    info!("Loaded configuration from: {:?}", path);
    Ok(config)
}

/// Builds the device context on the opened hardware and serves it.
async fn start<B: I2c, L: ButtonLine>(
    oled: OledDevice<B>,
    buttons: ButtonPanel<L>,
    glyphs: TextRenderer,
    config: &Config,
    screen: Option<ScreenId>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let mut ctx = DeviceContext::new(
        oled,
        buttons,
        Box::new(glyphs),
        Box::new(SystemNetwork::new(&config.network)),
        Box::new(IperfProbe::new(&config.throughput)),
        config,
    );
    if let Some(screen) = screen {
        ctx.set_screen(screen);
    }
    serve(ctx, shutdown).await
}

/// Runs the display loop until `shutdown` resolves or a hardware error, then
/// cleans up and powers off if that was requested. A loop error is returned
/// last.
async fn serve<B: I2c, L: ButtonLine>(
    mut ctx: DeviceContext<B, L>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let result = ctx.run_until(shutdown).await;
    if let Err(e) = &result {
        error!("Display loop failed: {:#}", e);
    }

    if ctx.cleanup() {
        power_off_host().await;
    }
    result
}

async fn power_off_host() {
    info!("Powering off");
    match tokio::process::Command::new("shutdown")
        .arg("now")
        .status()
        .await
    {
        Ok(status) if status.success() => {}
        Ok(status) => error!("shutdown exited with {}", status),
        Err(e) => error!("Failed to run shutdown: {}", e),
    }
}
