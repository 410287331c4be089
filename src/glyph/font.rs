//! Font identity and font file discovery.

use std::fmt;
use std::path::{Path, PathBuf};

/// Point size substituted when a font is requested with a non-positive size.
pub const DEFAULT_POINT_SIZE: f32 = 12.0;

/// Screen resolution used to turn point sizes into pixel sizes.
pub const SCREEN_DPI: f32 = 96.0;

/// Monospace fonts probed when no font path is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/ubuntu/UbuntuMono-R.ttf",
    "/Library/Fonts/Courier New.ttf",
    "/System/Library/Fonts/Supplemental/Courier New.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];

/// Identity of a font at a given size.
///
/// This is the key under which calibrations are cached, both in memory and
/// on disk. Two identities are equal when family and point size match.
#[derive(Debug, Clone, PartialEq)]
pub struct FontIdentity {
    family: String,
    point_size: f32,
}

impl FontIdentity {
    /// Create an identity, substituting [`DEFAULT_POINT_SIZE`] for sizes
    /// that are not strictly positive.
    pub fn new(family: impl Into<String>, point_size: f32) -> Self {
        let point_size = if point_size.is_finite() && point_size > 0.0 {
            point_size
        } else {
            DEFAULT_POINT_SIZE
        };
        Self {
            family: family.into(),
            point_size,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Pixel size used for rasterization at [`SCREEN_DPI`].
    pub fn pixel_size(&self) -> f32 {
        self.point_size * SCREEN_DPI / 72.0
    }

    /// Stable textual key, e.g. `DejaVu Sans Mono_12`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.family, self.point_size)
    }
}

impl fmt::Display for FontIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}pt", self.family, self.point_size)
    }
}

/// Where to load a font from, and how to name it.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Font file (TTF/OTF).
    pub path: PathBuf,
    /// Family name override. When absent the name embedded in the font
    /// file is used.
    pub family: Option<String>,
    /// Size in points.
    pub point_size: f32,
}

impl FontSpec {
    pub fn new(path: impl Into<PathBuf>, point_size: f32) -> Self {
        Self {
            path: path.into(),
            family: None,
            point_size,
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }
}

/// Look for a usable monospace font in well-known system locations.
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}
