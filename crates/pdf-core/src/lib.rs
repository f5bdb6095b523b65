//! PDF Core - Low-level single-page PDF generation
//!
//! This crate provides functionality for:
//! - Creating a one-page document of arbitrary size
//! - Embedding TrueType fonts (Type0 / Identity-H with ToUnicode)
//! - Inserting text with its baseline at PDF coordinates
//! - Inserting decoded images as Flate encoded XObjects
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument};
//!
//! let mut doc = PdfDocument::new(800.0, 400.0)?;
//! doc.add_font("dejavu", include_bytes!("fonts/DejaVuSans.ttf"))?;
//! doc.set_font("dejavu", 40.0)?;
//! doc.set_text_color(Color::from_rgb(0x11, 0x22, 0x33));
//! doc.insert_text("Hello, World!", 50.0, 188.0)?;
//! doc.save("output.pdf")?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::{Color, PdfDocument};
pub use font::{FontData, FontObjects};
pub use image::{generate_image_operators, ImageXObject};
pub use text::{generate_text_operators, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Unsupported font: {0}")]
    UnsupportedFont(String),

    #[error("Invalid page size: {0} x {1}")]
    InvalidPageSize(f64, f64),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
