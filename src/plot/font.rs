//! Runtime font registration for chart text.
//!
//! Plotters is built with `ab_glyph`, which draws text only with fonts that
//! were registered explicitly. The first usable TTF found among the
//! configured path, `$CCMP_FONT` and a few well-known system locations is
//! registered once per process under the `sans-serif` family.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};

/// Font family used for all chart text.
pub const FONT_FAMILY: &str = "sans-serif";

const FONT_ENV: &str = "CCMP_FONT";

const SYSTEM_FONTS: [&str; 9] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Register a font for chart text if none has been registered yet.
///
/// Only the first call searches; later calls report the cached outcome even
/// when they pass a different `preferred` path.
pub fn ensure_font(preferred: Option<&Path>) -> bool {
    REGISTERED
        .get_or_init(|| register_first_available(preferred))
        .is_some()
}

/// Whether a font has been registered in this process.
pub fn font_available() -> bool {
    REGISTERED.get().is_some_and(Option::is_some)
}

/// Font files to try, in priority order: `preferred`, `$CCMP_FONT`, system paths.
pub fn font_candidates(preferred: Option<&Path>) -> impl Iterator<Item = PathBuf> {
    preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::env::var_os(FONT_ENV).map(PathBuf::from))
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
}

fn register_first_available(preferred: Option<&Path>) -> Option<PathBuf> {
    for path in font_candidates(preferred) {
        if !path.is_file() {
            continue;
        }
        match try_register(&path) {
            Ok(()) => {
                log::debug!("registered chart font '{}'", path.display());
                return Some(path);
            }
            Err(e) => log::warn!("skipping font '{}': {e}", path.display()),
        }
    }

    log::warn!("no usable TTF font found; charts will be rendered without text (use --font or ${FONT_ENV})");
    None
}

fn try_register(path: &Path) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    // Registered fonts live for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| "not a valid TrueType/OpenType font".to_string())
}
