use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rusttype::Font;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use super::RenderError;

static FONT_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Font<'static>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Loads and parses a font file, caching the parsed font per path. The
/// cached `Arc<Font>` is immutable, so concurrent renders share it
/// without further locking.
pub fn load_font(path: &Path) -> Result<Arc<Font<'static>>, RenderError> {
    if let Some(f) = FONT_CACHE.lock().get(path) {
        return Ok(Arc::clone(f));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| RenderError::Font(format!("failed to read font {}: {e}", path.display())))?;
    let font = Font::try_from_vec(bytes)
        .ok_or_else(|| RenderError::Font(format!("failed to parse font {}", path.display())))?;

    let font = Arc::new(font);
    FONT_CACHE
        .lock()
        .insert(path.to_path_buf(), Arc::clone(&font));
    Ok(font)
}

/// Probes common system font directories for a usable TTF, in preference
/// order. Used as a fallback when no font path is configured.
pub fn find_system_font() -> Option<PathBuf> {
    let dirs = [
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/truetype/liberation",
        "/usr/share/fonts/TTF",
        "/System/Library/Fonts/Supplemental",
        "/Library/Fonts",
    ];
    let names = [
        "DejaVuSans-Bold.ttf",
        "DejaVuSans.ttf",
        "LiberationSans-Bold.ttf",
        "LiberationSans-Regular.ttf",
        "Arial Bold.ttf",
        "Arial.ttf",
    ];

    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| Path::new(dir).join(name)))
        .find(|p| p.exists())
}
