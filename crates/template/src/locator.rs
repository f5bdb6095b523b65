//! Resolving font family names to font files
//!
//! Family names come from editors ("Open Sans", "DejaVu Sans Mono") while
//! rendering needs a file. [`SystemFontLocator`] scans the usual platform
//! font directories; tests and embedders can supply any [`FontLocator`].

use crate::TextField;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::debug;

/// Maps a font family name to a font file
pub trait FontLocator {
    fn locate(&self, family: &str) -> Option<PathBuf>;
}

impl<F> FontLocator for F
where
    F: Fn(&str) -> Option<PathBuf>,
{
    fn locate(&self, family: &str) -> Option<PathBuf> {
        self(family)
    }
}

impl FontLocator for HashMap<String, PathBuf> {
    fn locate(&self, family: &str) -> Option<PathBuf> {
        self.get(family).cloned()
    }
}

/// Lowercase alphanumerics only: "Open Sans-Bold" -> "opensansbold"
pub fn normalize_family(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Platform font directories that exist on this machine
pub fn font_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts/Supplemental"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ];
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join("Library/Fonts"));
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
    }
    if let Some(windir) = std::env::var_os("WINDIR").or_else(|| std::env::var_os("SystemRoot")) {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    dirs.retain(|d| d.is_dir());
    dirs
}

/// Font locator scanning font directories for a loosely matching file name
///
/// A file matches when its normalized stem contains the normalized family.
/// Among matches, names containing "regular" or "book" win; otherwise the
/// first match in scan order. Results, including misses, are cached per
/// normalized family for the lifetime of the locator.
#[derive(Debug)]
pub struct SystemFontLocator {
    dirs: Vec<PathBuf>,
    cache: Mutex<HashMap<String, Option<PathBuf>>>,
}

impl SystemFontLocator {
    /// Locator over [`font_search_dirs`]
    pub fn new() -> Self {
        Self::with_dirs(font_search_dirs())
    }

    /// Locator over explicit directories
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Process-wide locator over the platform directories
    pub fn shared() -> &'static SystemFontLocator {
        static LOCATOR: OnceLock<SystemFontLocator> = OnceLock::new();
        LOCATOR.get_or_init(SystemFontLocator::new)
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn scan(&self, key: &str) -> Option<PathBuf> {
        let mut candidates = Vec::new();
        for dir in &self.dirs {
            candidates.extend(font_files(dir).filter(|path| {
                path.file_stem()
                    .map(|stem| normalize_family(&stem.to_string_lossy()).contains(key))
                    .unwrap_or(false)
            }));
        }

        let preferred = candidates.iter().position(|path| {
            let name = path
                .file_name()
                .map(|n| normalize_family(&n.to_string_lossy()))
                .unwrap_or_default();
            name.contains("regular") || name.contains("book")
        });

        match preferred {
            Some(i) => Some(candidates.swap_remove(i)),
            None => candidates.into_iter().next(),
        }
    }
}

impl Default for SystemFontLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FontLocator for SystemFontLocator {
    fn locate(&self, family: &str) -> Option<PathBuf> {
        let key = normalize_family(family);
        if key.is_empty() {
            return None;
        }

        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&key)
        {
            return hit.clone();
        }

        let found = self.scan(&key);
        debug!(family, path = ?found, "resolved font family");
        self.cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, found.clone());
        found
    }
}

/// All `.ttf` / `.otf` files below `dir`
fn font_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
    glob::glob(&pattern)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_ascii_lowercase();
                    ext == "ttf" || ext == "otf"
                })
                .unwrap_or(false)
        })
}

/// Fill in `font_path` for fields that name a family but have no usable file
///
/// Returns the number of fields updated.
pub fn resolve_field_fonts(fields: &mut [TextField], locator: &dyn FontLocator) -> usize {
    let mut updated = 0;
    for field in fields.iter_mut() {
        let family = field.font_family.trim();
        if family.is_empty() {
            continue;
        }
        let path = field.font_path.trim();
        if !path.is_empty() && Path::new(path).is_file() {
            continue;
        }
        if let Some(found) = locator.locate(family) {
            field.font_path = found.to_string_lossy().into_owned();
            updated += 1;
        }
    }
    updated
}
