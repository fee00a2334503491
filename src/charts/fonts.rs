//! Runtime font registration for chart text.
//!
//! Plotters is built without system font discovery, so a TTF file is loaded
//! from disk once and registered as the "sans-serif" family. Without one,
//! charts are drawn with bars and axes only.

use plotters::style::{register_font, FontStyle};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

fn try_register(path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    // Plotters keeps font data for the life of the process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => true,
        Err(_) => {
            warn!("Font file {} could not be parsed", path.display());
            false
        }
    }
}

/// Register the chart font once per process. `preferred` is tried before
/// the built-in candidate list. Returns whether text can be drawn.
pub fn ensure_chart_font(preferred: Option<&Path>) -> bool {
    REGISTERED
        .get_or_init(|| {
            let candidates = preferred
                .into_iter()
                .map(Path::to_path_buf)
                .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
            for path in candidates {
                if path.is_file() && try_register(&path) {
                    debug!("Chart font: {}", path.display());
                    return Some(path);
                }
            }
            warn!("No TTF font found; charts will be drawn without text");
            None
        })
        .is_some()
}
