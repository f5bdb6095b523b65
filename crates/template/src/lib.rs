//! Template Engine - certificate fields over a template image
//!
//! This crate provides:
//! - Field schema types and the field list JSON format
//! - Placement arithmetic shared by the raster and PDF backends
//! - Font location, loading and caching with a bundled fallback face
//! - Rendering one data row to a PNG image or a single-page PDF
//! - Datasets (CSV import/export), output file name patterns and batch runs
//!
//! # Example
//!
//! ```ignore
//! use template::{field_names, parse_fields, Dataset, OutputFormat, Renderer};
//!
//! let fields = parse_fields(&std::fs::read_to_string("fields.json")?)?;
//! let dataset = Dataset::read_csv("names.csv", field_names(&fields))?;
//! let mut renderer = Renderer::new();
//! let image = renderer.render_to_image("template.png", &fields, &dataset.rows[0])?;
//! renderer.render_to_file("template.png", &fields, &dataset.rows[0], "out.pdf", OutputFormat::Pdf)?;
//! ```

pub mod batch;
pub mod dataset;
pub mod design;
pub mod filename;
pub mod fonts;
pub mod layout;
pub mod locator;
pub mod parser;
pub mod project;
mod renderer;
mod schema;
pub mod text;

pub use batch::{run_batch, BatchJob, BatchReport, RowFailure};
pub use dataset::Dataset;
pub use design::Design;
pub use filename::render_filename;
pub use fonts::{FontCache, LoadedFont, DEFAULT_FONT_NAME};
pub use locator::{FontLocator, SystemFontLocator};
pub use parser::{field_names, fields_to_json, parse_fields, validate_fields};
pub use project::Project;
pub use renderer::Renderer;
pub use schema::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse fields: {0}")]
    ParseError(String),

    #[error("Invalid field: {0}")]
    FieldError(String),

    #[error("Failed to load template {path}: {message}")]
    TemplateLoad { path: PathBuf, message: String },

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Project error: {0}")]
    ProjectError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
