//! Startup splash image.

use image::GrayImage;
use std::path::Path;
use tracing::{debug, warn};

/// Loads the splash image as greyscale.
///
/// Returns `None` (after logging) if the file is missing or unreadable.
pub fn load_splash(path: &Path) -> Option<GrayImage> {
    match image::open(path) {
        Ok(img) => {
            let img = img.to_luma8();
            debug!(
                "Loaded splash {:?} ({}x{})",
                path,
                img.width(),
                img.height()
            );
            Some(img)
        }
        Err(e) => {
            warn!("Splash image {:?} not shown: {}", path, e);
            None
        }
    }
}
