//! Field schema types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Embedded JSON Schema for the field list file
/// This schema can be used by IDEs and validators for template authoring
pub const FIELDS_SCHEMA: &str = include_str!("../data/fields-schema.json");

/// Font size used when a field does not set one (or sets 0)
pub const DEFAULT_FONT_SIZE: u32 = 32;

/// Text color used when a field does not set one
pub const DEFAULT_COLOR: &str = "#000000";

/// One row of the dataset: field name -> value
pub type Row = BTreeMap<String, String>;

/// Value bound to `name` in `row`, or `""` when the column is absent
pub fn row_value<'a>(row: &'a Row, name: &str) -> &'a str {
    row.get(name).map(String::as_str).unwrap_or("")
}

/// A named text field placed on the template
///
/// Positions and widths are template pixels with the origin at the top-left
/// corner. `name` doubles as the dataset column and the `{{name}}` token
/// shown in editors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextField {
    /// Unique field name
    pub name: String,

    /// Left edge of the field
    #[serde(default)]
    pub x: f64,

    /// Top edge of the text
    #[serde(default)]
    pub y: f64,

    /// Font size in pixels
    #[serde(default = "default_font_size")]
    pub size: u32,

    /// Hex color, `#RRGGBB` or `#RGB`
    #[serde(default = "default_color")]
    pub color: String,

    /// Alignment inside `box_width`
    #[serde(default)]
    pub align: Align,

    /// Font family name, resolved to `font_path` by a font locator
    #[serde(default)]
    pub font_family: String,

    /// Font file used for rendering
    #[serde(default)]
    pub font_path: String,

    /// Fixed box width; 0 means the natural text width
    #[serde(default)]
    pub box_width: f64,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl TextField {
    /// Create a field with default styling at `(x, y)`
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            size: DEFAULT_FONT_SIZE,
            color: default_color(),
            align: Align::default(),
            font_family: String::new(),
            font_path: String::new(),
            box_width: 0.0,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_box_width(mut self, box_width: f64) -> Self {
        self.box_width = box_width;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_font_path(mut self, path: impl Into<String>) -> Self {
        self.font_path = path.into();
        self
    }

    /// Effective font size; 0 falls back to the default
    pub fn font_size(&self) -> u32 {
        if self.size == 0 {
            DEFAULT_FONT_SIZE
        } else {
            self.size
        }
    }

    /// Parsed text color, black when malformed
    pub fn rgb(&self) -> Rgb {
        Rgb::from_hex(&self.color)
    }

    /// Placeholder token shown in place of the value while designing
    pub fn placeholder(&self) -> String {
        format!("{{{{{}}}}}", self.name)
    }
}

/// Text alignment inside a field's box
///
/// Deserialization is lenient: case and surrounding whitespace are ignored
/// and unknown values mean `left`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

impl From<&str> for Align {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => Align::Center,
            "right" => Align::Right,
            _ => Align::Left,
        }
    }
}

impl From<String> for Align {
    fn from(s: String) -> Self {
        Align::from(s.as_str())
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `#RGB` or the same without `#`
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Lenient parse: anything malformed is black
    pub fn from_hex(hex: &str) -> Self {
        Self::parse_hex(hex).unwrap_or(Self::BLACK)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for pdf_core::Color {
    fn from(c: Rgb) -> Self {
        pdf_core::Color::from_rgb(c.r, c.g, c.b)
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Pdf,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(format!("unknown output format '{other}' (expected png or pdf)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
