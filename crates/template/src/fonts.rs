//! Font loading and caching
//!
//! Every field names a font file. Files are read once and shared by the
//! raster backend (as an ab_glyph face) and the PDF backend (as raw bytes
//! for embedding). A missing or unreadable file never fails a render: the
//! bundled DejaVu Sans face is used instead.

use ab_glyph::FontArc;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Name of the bundled fallback face
pub const DEFAULT_FONT_NAME: &str = "DejaVuSans";

static DEFAULT_FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// A parsed font plus the bytes it was parsed from
#[derive(Clone)]
pub struct LoadedFont {
    /// File stem, also the font's resource name in PDF output
    pub name: String,
    /// Raw font program
    pub data: Arc<[u8]>,
    /// Face used for measuring and rasterizing
    pub face: FontArc,
}

impl fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl LoadedFont {
    /// Load and parse a font file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FONT_NAME.to_string());
        Self::from_bytes(name, bytes)
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> crate::Result<Self> {
        let name = name.into();
        let data: Arc<[u8]> = Arc::from(bytes.as_slice());
        let face = FontArc::try_from_vec(bytes)
            .map_err(|e| crate::TemplateError::FontError(format!("{name}: {e}")))?;
        Ok(Self { name, data, face })
    }

    /// The bundled DejaVu Sans face
    pub fn bundled() -> Self {
        default_loaded_font().clone()
    }

    /// Whether this is the bundled fallback face
    pub fn is_bundled(&self) -> bool {
        Arc::ptr_eq(&self.data, &default_loaded_font().data)
    }
}

fn default_loaded_font() -> &'static LoadedFont {
    static FONT: OnceLock<LoadedFont> = OnceLock::new();
    FONT.get_or_init(|| {
        let face = FontArc::try_from_slice(DEFAULT_FONT_DATA)
            .unwrap_or_else(|_| panic!("bundled DejaVu Sans font is invalid"));
        LoadedFont {
            name: DEFAULT_FONT_NAME.to_string(),
            data: Arc::from(DEFAULT_FONT_DATA),
            face,
        }
    })
}

/// The bundled fallback face
pub fn default_font() -> FontArc {
    default_loaded_font().face.clone()
}

/// Append-only cache of loaded fonts keyed by file stem
///
/// Two paths with the same file name share one entry, matching how fonts
/// are registered in PDF output. Failed loads are cached as the fallback so
/// the warning is logged once.
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: HashMap<String, LoadedFont>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Font for a field's `font_path`; blank, missing or invalid files
    /// resolve to the bundled face
    pub fn get(&mut self, font_path: &str) -> LoadedFont {
        let font_path = font_path.trim();
        if font_path.is_empty() {
            return LoadedFont::bundled();
        }

        let path = Path::new(font_path);
        let Some(key) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return LoadedFont::bundled();
        };

        if let Some(font) = self.fonts.get(&key) {
            return font.clone();
        }

        let font = if path.is_file() {
            match LoadedFont::from_file(path) {
                Ok(font) => {
                    debug!(font = %key, path = %path.display(), "loaded font");
                    font
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "font unusable, using {}", DEFAULT_FONT_NAME);
                    LoadedFont::bundled()
                }
            }
        } else {
            warn!(path = %path.display(), "font file not found, using {}", DEFAULT_FONT_NAME);
            LoadedFont::bundled()
        };

        self.fonts.insert(key, font.clone());
        font
    }

    /// Number of distinct font files requested so far
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
