//! Font registration for the `ab_glyph` text path.
//!
//! `ab_glyph` does not discover OS fonts, so a TrueType file is located and
//! registered under `sans-serif` before the first text is drawn. Lookup order:
//! the style's `custom_font_paths`, the `PRS_VIZ_FONT` environment variable,
//! then well-known system locations (files matching the style's font family
//! first).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info, warn};
use plotters::style::{FontStyle, register_font};

pub const FONT_ENV: &str = "PRS_VIZ_FONT";

/// Regular face and, where the distribution ships one, its bold sibling.
const SYSTEM_FONTS: &[(&str, Option<&str>)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        Some("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        Some("/usr/share/fonts/TTF/DejaVuSans-Bold.ttf"),
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        Some("/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf"),
    ),
    (
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        Some("/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf"),
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        Some("/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf"),
    ),
    (
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        Some("/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf"),
    ),
    (
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        Some("/System/Library/Fonts/Supplemental/Arial Bold.ttf"),
    ),
    ("/Library/Fonts/Arial.ttf", None),
    ("C:\\Windows\\Fonts\\arial.ttf", Some("C:\\Windows\\Fonts\\arialbd.ttf")),
];

/// Path of the registered regular face, once one was found.
static REGISTERED: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Register a sans-serif face if none is registered yet. Returns whether
/// text can be drawn.
pub fn ensure_fonts(custom_paths: &[PathBuf], families: &[String]) -> bool {
    let mut registered = REGISTERED.lock().unwrap_or_else(|e| e.into_inner());
    if registered.is_some() {
        return true;
    }

    for (regular, bold) in candidates(custom_paths, families) {
        let Some(bytes) = read_leaked(&regular) else {
            continue;
        };
        if register_font("sans-serif", FontStyle::Normal, bytes).is_err() {
            warn!("{} is not a usable TrueType font", regular.display());
            continue;
        }
        let bold_bytes = bold.as_deref().and_then(read_leaked).unwrap_or(bytes);
        if register_font("sans-serif", FontStyle::Bold, bold_bytes).is_err() {
            let _ = register_font("sans-serif", FontStyle::Bold, bytes);
        }
        info!("registered font {}", regular.display());
        *registered = Some(regular);
        return true;
    }
    warn!("no TrueType font found; set {FONT_ENV} to a .ttf file");
    false
}

/// Whether a font is (or can be) registered from the default locations.
pub fn fonts_available() -> bool {
    ensure_fonts(&[], &[])
}

fn candidates(custom_paths: &[PathBuf], families: &[String]) -> Vec<(PathBuf, Option<PathBuf>)> {
    let mut out: Vec<(PathBuf, Option<PathBuf>)> =
        custom_paths.iter().map(|p| (p.clone(), None)).collect();
    if let Some(p) = std::env::var_os(FONT_ENV) {
        out.push((PathBuf::from(p), None));
    }

    let wanted: Vec<String> = families
        .iter()
        .map(|f| f.replace(' ', "").to_lowercase())
        .collect();
    let matches_family = |path: &str| {
        let lower = path.to_lowercase();
        wanted.iter().any(|w| lower.contains(w.as_str()))
    };
    let (preferred, rest): (Vec<_>, Vec<_>) =
        SYSTEM_FONTS.iter().partition(|(regular, _)| matches_family(*regular));
    out.extend(
        preferred
            .into_iter()
            .chain(rest)
            .map(|(r, b)| (PathBuf::from(r), b.map(PathBuf::from))),
    );
    out
}

/// Font bytes live for the rest of the process once registered.
fn read_leaked(path: &Path) -> Option<&'static [u8]> {
    match fs::read(path) {
        Ok(bytes) => Some(Box::leak(bytes.into_boxed_slice())),
        Err(e) => {
            debug!("font {} unavailable: {e}", path.display());
            None
        }
    }
}
