//! Output file names from a pattern and a data row
//!
//! Patterns mix literal text with placeholders:
//! - `{index}` is the 1-based row number, `{index:3}` zero-pads it to 3 digits
//!   (padding is capped at [`MAX_INDEX_WIDTH`])
//! - `{Field}` is the row's value for `Field`, trimmed (missing columns are empty)
//!
//! The result is reduced to a safe base name (no directory, no extension).

use crate::schema::{row_value, Row};
use regex::Regex;
use std::sync::OnceLock;

/// Widest zero padding `{index:N}` honours
pub const MAX_INDEX_WIDTH: usize = 255;

fn index_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{index(?::(\d+))?\}").expect("invalid index regex"))
}

fn field_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}:]+)\}").expect("invalid field regex"))
}

/// Base file name for row `index` (1-based)
///
/// An empty pattern uses the value of `fallback_field`. Whenever the result
/// would be empty it becomes `row_<index>`.
pub fn render_filename(pattern: &str, row: &Row, index: usize, fallback_field: &str) -> String {
    let fallback = || format!("row_{index}");

    let raw = if pattern.trim().is_empty() {
        row_value(row, fallback_field).trim().to_string()
    } else {
        let with_index = index_token().replace_all(pattern, |caps: &regex::Captures| {
            match caps.get(1).and_then(|w| w.as_str().parse::<usize>().ok()) {
                Some(width) => {
                    let width = width.min(MAX_INDEX_WIDTH);
                    format!("{index:0width$}")
                }
                None => index.to_string(),
            }
        });
        field_token()
            .replace_all(&with_index, |caps: &regex::Captures| {
                row_value(row, &caps[1]).trim().to_string()
            })
            .into_owned()
    };

    let name = sanitize(&raw);
    if name.is_empty() {
        fallback()
    } else {
        name
    }
}

/// Keep letters, digits, `-`, `_` and spaces; trim; spaces become `_`
pub fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    kept.trim().replace(' ', "_")
}
