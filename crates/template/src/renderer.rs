//! Rendering one data row over a template image
//!
//! Both backends share the same placement rules (see [`crate::layout`]) and
//! measure text with the same ab_glyph metrics, so a PNG and a PDF of the
//! same row line up. Fields whose value is empty are skipped.

use crate::fonts::{FontCache, LoadedFont, DEFAULT_FONT_NAME};
use crate::layout::{self, Surface};
use crate::schema::*;
use crate::text;
use crate::{Result, TemplateError};
use image::{DynamicImage, ImageFormat, RgbImage};
use pdf_core::{ImageXObject, PdfDocument, PdfError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Renders certificates, keeping loaded fonts between rows
#[derive(Debug, Default)]
pub struct Renderer {
    fonts: FontCache,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fonts loaded so far
    pub fn fonts(&self) -> &FontCache {
        &self.fonts
    }

    /// Render `row` over the template at `template` as an RGB image
    pub fn render_to_image(
        &mut self,
        template: impl AsRef<Path>,
        fields: &[TextField],
        row: &Row,
    ) -> Result<RgbImage> {
        let template = load_template(template.as_ref())?;
        Ok(self.render_image(&template, fields, row))
    }

    /// Render `row` over an already decoded template
    ///
    /// Transparency in the template is dropped, not composited.
    pub fn render_image(&mut self, template: &DynamicImage, fields: &[TextField], row: &Row) -> RgbImage {
        let mut canvas = template.to_rgb8();

        for (field, value) in visible_fields(fields, row) {
            let font = self.fonts.get(&field.font_path);
            let size = field.font_size() as f32;
            let metrics = text::measure(&font.face, size, value);
            let at = layout::place(field, metrics.width, Surface::Raster);

            debug!(
                field = %field.name,
                font = %font.name,
                x = at.x,
                y = at.y,
                width = metrics.width,
                "drawing field"
            );
            text::draw_text(&mut canvas, &font.face, size, at.x as f32, at.y as f32, value, field.rgb());
        }

        canvas
    }

    /// Render `row` as a single-page PDF the size of the template
    pub fn render_to_pdf(
        &mut self,
        template: impl AsRef<Path>,
        fields: &[TextField],
        row: &Row,
    ) -> Result<Vec<u8>> {
        let template = load_template(template.as_ref())?;
        self.render_pdf(&template, fields, row)?.to_bytes().map_err(Into::into)
    }

    /// Build the PDF page for `row` over an already decoded template
    ///
    /// One template pixel is one PDF point. Fields whose font cannot be
    /// embedded are set in the bundled face.
    pub fn render_pdf(&mut self, template: &DynamicImage, fields: &[TextField], row: &Row) -> Result<PdfDocument> {
        let width = template.width() as f64;
        let height = template.height() as f64;

        let mut doc = PdfDocument::new(width, height)?;
        doc.insert_xobject(ImageXObject::from_image(template)?, 0.0, 0.0, width, height)?;

        for (field, value) in visible_fields(fields, row) {
            let font = self.pdf_font(&mut doc, &field.font_path)?;
            let size = field.font_size();
            let metrics = text::measure(&font.face, size as f32, value);
            let at = layout::place(field, metrics.width, Surface::Page { height });

            debug!(
                field = %field.name,
                font = %font.name,
                x = at.x,
                baseline = at.y,
                width = metrics.width,
                "placing field"
            );
            doc.set_font(&font.name, size as f32)?;
            doc.set_text_color(field.rgb().into());
            doc.insert_text(value, at.x, at.y)?;
        }

        Ok(doc)
    }

    /// The font for `font_path`, registered with `doc`
    fn pdf_font(&mut self, doc: &mut PdfDocument, font_path: &str) -> Result<LoadedFont> {
        let font = self.fonts.get(font_path);
        if doc.has_font(&font.name) {
            return Ok(font);
        }

        match doc.add_shared_font(&font.name, font.data.clone()) {
            Ok(()) => Ok(font),
            Err(PdfError::UnsupportedFont(reason)) if !font.is_bundled() => {
                warn!(font = %font.name, %reason, "cannot embed font in PDF, using {}", DEFAULT_FONT_NAME);
                let fallback = LoadedFont::bundled();
                if !doc.has_font(&fallback.name) {
                    doc.add_shared_font(&fallback.name, fallback.data.clone())?;
                }
                Ok(fallback)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Render `row` and write it to `out`
    ///
    /// PNG output always gets a `.png` extension; PDF output is written to
    /// `out` as given. Returns the path actually written.
    pub fn render_to_file(
        &mut self,
        template: impl AsRef<Path>,
        fields: &[TextField],
        row: &Row,
        out: impl AsRef<Path>,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let template = load_template(template.as_ref())?;
        self.write_file(&template, fields, row, out.as_ref(), format)
    }

    /// [`Renderer::render_to_file`] over an already decoded template
    pub fn write_file(
        &mut self,
        template: &DynamicImage,
        fields: &[TextField],
        row: &Row,
        out: &Path,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        match format {
            OutputFormat::Png => {
                let path = out.with_extension(OutputFormat::Png.extension());
                self.render_image(template, fields, row)
                    .save_with_format(&path, ImageFormat::Png)?;
                Ok(path)
            }
            OutputFormat::Pdf => {
                self.render_pdf(template, fields, row)?.save(out)?;
                Ok(out.to_path_buf())
            }
        }
    }
}

/// Decode a template image, mapping any failure to [`TemplateError::TemplateLoad`]
pub(crate) fn load_template(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| TemplateError::TemplateLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Fields paired with their non-empty values from `row`, in field order
fn visible_fields<'a>(
    fields: &'a [TextField],
    row: &'a Row,
) -> impl Iterator<Item = (&'a TextField, &'a str)> {
    fields
        .iter()
        .map(move |field| (field, row_value(row, &field.name)))
        .filter(|(_, value)| !value.is_empty())
}
