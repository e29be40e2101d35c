//! Button-to-screen mapping.

use nanohat_oled_hw::ButtonState;

use crate::config::ButtonsConfig;
use crate::screens::ScreenId;

/// Screen selected by each button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    pub f1: ScreenId,
    pub f2: ScreenId,
    pub f3: ScreenId,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            f1: ScreenId::Clock,
            f2: ScreenId::NetworkInfo,
            f3: ScreenId::ThroughputTest,
        }
    }
}

impl From<&ButtonsConfig> for KeyMap {
    fn from(config: &ButtonsConfig) -> Self {
        Self {
            f1: config.f1.screen,
            f2: config.f2.screen,
            f3: config.f3.screen,
        }
    }
}

/// Picks the screen for this tick.
///
/// F1 wins over F2, which wins over F3. With nothing pressed the current
/// screen stays selected.
pub fn select_screen(buttons: ButtonState, current: ScreenId, keymap: &KeyMap) -> ScreenId {
    if buttons.f1 {
        keymap.f1
    } else if buttons.f2 {
        keymap.f2
    } else if buttons.f3 {
        keymap.f3
    } else {
        current
    }
}
