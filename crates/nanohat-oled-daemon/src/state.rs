//! Device context and screen state machine.

use anyhow::Result;
use chrono::Local;
use embedded_hal::i2c::I2c;
use image::GrayImage;
use nanohat_oled_hw::{ButtonLine, ButtonPanel, OledDevice};
use std::future::Future;
use std::path::PathBuf;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{Config, TimingConfig};
use crate::input::{select_screen, KeyMap};
use crate::rendering::{Canvas, GlyphRasterizer};
use crate::screens::{
    clock_lines, load_splash, network_lines, progress_lines, rate_lines, ScreenId,
};
use crate::sensors::iperf::measure;
use crate::sensors::{Direction, NetworkInfo, NetworkQuery, ThroughputProbe};

/// Everything the display loop owns: the panel, the buttons, the frame and
/// the current screen.
pub struct DeviceContext<B, L> {
    oled: OledDevice<B>,
    buttons: ButtonPanel<L>,
    canvas: Canvas,
    network: Box<dyn NetworkQuery>,
    probe: Box<dyn ThroughputProbe>,
    keymap: KeyMap,
    timing: TimingConfig,
    splash_path: PathBuf,
    splash: Option<GrayImage>,
    screen: ScreenId,
    refresh_deadline: Option<Instant>,
    power_off_requested: bool,
}

impl<B: I2c, L: ButtonLine> DeviceContext<B, L> {
    pub fn new(
        oled: OledDevice<B>,
        buttons: ButtonPanel<L>,
        glyphs: Box<dyn GlyphRasterizer>,
        network: Box<dyn NetworkQuery>,
        probe: Box<dyn ThroughputProbe>,
        config: &Config,
    ) -> Self {
        Self {
            oled,
            buttons,
            canvas: Canvas::new(glyphs),
            network,
            probe,
            keymap: KeyMap::from(&config.buttons),
            timing: config.timing.clone(),
            splash_path: PathBuf::from(&config.splash),
            splash: None,
            screen: ScreenId::Clock,
            refresh_deadline: None,
            power_off_requested: false,
        }
    }

    #[allow(dead_code)]
    pub fn screen(&self) -> ScreenId {
        self.screen
    }

    pub fn set_screen(&mut self, screen: ScreenId) {
        if screen != self.screen {
            info!("Screen: {} -> {}", self.screen, screen);
            if self.screen == ScreenId::Splash {
                self.refresh_deadline = None;
            }
            self.screen = screen;
        }
    }

    /// When the splash screen may be turned off, if it has been shown.
    #[allow(dead_code)]
    pub fn refresh_deadline(&self) -> Option<Instant> {
        self.refresh_deadline
    }

    /// Asks for the machine to be powered off after cleanup.
    #[allow(dead_code)]
    pub fn request_power_off(&mut self) {
        info!("Power-off requested");
        self.power_off_requested = true;
    }

    #[allow(dead_code)]
    pub fn power_off_requested(&self) -> bool {
        self.power_off_requested
    }

    fn flush(&mut self) -> Result<()> {
        self.oled.redraw(self.canvas.framebuffer())?;
        Ok(())
    }

    /// Pastes the splash image over the frame and flushes it. Nothing is
    /// drawn or sent when there is no image.
    fn draw_splash(&mut self) -> Result<()> {
        let Some(splash) = &self.splash else {
            return Ok(());
        };
        self.canvas.paste(splash)?;
        self.flush()
    }

    /// Brings the panel up and shows the splash image for the hold time.
    pub async fn startup(&mut self) -> Result<()> {
        if let Err(e) = self.oled.probe() {
            warn!("OLED did not acknowledge probe: {}", e);
        }
        self.oled.init()?;

        self.canvas.clear();
        self.flush()?;
        self.splash = load_splash(&self.splash_path);
        self.draw_splash()?;
        sleep(self.timing.splash_hold()).await;

        info!("Startup complete, showing {}", self.screen);
        Ok(())
    }

    /// Samples the buttons, then renders and flushes the selected screen.
    pub async fn tick(&mut self) -> Result<()> {
        let buttons = self.buttons.sample()?;
        let selected = select_screen(buttons, self.screen, &self.keymap);
        self.set_screen(selected);

        match self.screen {
            ScreenId::Splash => self.render_splash(),
            ScreenId::Clock => {
                self.canvas.clear();
                self.canvas.draw_lines(&clock_lines(&Local::now()));
                self.flush()
            }
            ScreenId::NetworkInfo => {
                let info = NetworkInfo::query(self.network.as_ref());
                self.canvas.clear();
                self.canvas.draw_lines(&network_lines(&info));
                self.flush()
            }
            ScreenId::ThroughputTest => self.run_throughput_test().await,
        }
    }

    fn render_splash(&mut self) -> Result<()> {
        // No deadline yet means the splash screen was just entered
        if self.refresh_deadline.is_none() {
            self.splash = load_splash(&self.splash_path);
            let deadline = Instant::now() + self.timing.display_off_timeout();
            debug!("Splash display-off deadline in {:?}", self.timing.display_off_timeout());
            self.refresh_deadline = Some(deadline);
        }
        self.draw_splash()
    }

    /// Measures download then upload, showing each result for the dwell
    /// time, then returns to the clock. Buttons are not read meanwhile.
    async fn run_throughput_test(&mut self) -> Result<()> {
        for direction in [Direction::Download, Direction::Upload] {
            self.canvas.clear();
            self.canvas.draw_lines(&progress_lines(direction));
            self.flush()?;

            let rates = measure(self.probe.as_ref(), direction).await;
            info!("{} rates: {}", direction.label(), rates.join(", "));

            self.canvas.clear();
            self.canvas.draw_lines(&rate_lines(&rates));
            self.flush()?;
            sleep(self.timing.dwell()).await;
        }

        self.set_screen(ScreenId::Clock);
        Ok(())
    }

    /// Starts the panel and ticks until a bus or GPIO error.
    pub async fn run(&mut self) -> Result<()> {
        self.startup().await?;
        loop {
            sleep(self.timing.tick()).await;
            self.tick().await?;
        }
    }

    /// Runs until `shutdown` completes or the loop fails.
    ///
    /// The loop future is dropped when `shutdown` wins, which also kills a
    /// running probe.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                info!("Stopping display loop");
                Ok(())
            }
        }
    }

    /// Turns the panel off and releases the buttons.
    ///
    /// Every step is attempted even if an earlier one fails. Returns whether
    /// a power-off was requested.
    pub fn cleanup(&mut self) -> bool {
        info!("Cleaning up");
        if let Err(e) = self.oled.display_off() {
            error!("Failed to turn display off: {}", e);
        }

        let failures = self.buttons.release();
        if failures > 0 {
            warn!("{} GPIO line(s) could not be released", failures);
        }
        self.power_off_requested
    }
}
