//! Single-page PDF document builder

use crate::image::{generate_image_operators, ImageXObject};
use crate::text::{generate_text_operators, TextRenderContext};
use crate::{FontData, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// A one-page PDF document sized in points
///
/// Coordinates passed to the drawing methods are PDF-native: the origin is
/// the bottom-left corner of the page. The document is finalized by
/// [`PdfDocument::save`] or [`PdfDocument::to_bytes`], which consume it.
///
/// # Example
///
/// ```ignore
/// let mut doc = PdfDocument::new(800.0, 400.0)?;
/// doc.insert_xobject(ImageXObject::from_image(&background)?, 0.0, 0.0, 800.0, 400.0)?;
/// doc.add_font("DejaVuSans", include_bytes!("DejaVuSans.ttf"))?;
/// doc.set_font("DejaVuSans", 40.0)?;
/// doc.insert_text("Jane Doe", 50.0, 188.0)?;
/// doc.save("certificate.pdf")?;
/// ```
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// The single page object
    page_id: ObjectId,
    /// Page width in points
    width: f64,
    /// Page height in points
    height: f64,
    /// Registered fonts (font name -> data)
    fonts: BTreeMap<String, FontData>,
    /// Current font name
    current_font: Option<String>,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Page font resources (font name -> resource name)
    font_resources: BTreeMap<String, String>,
    /// Next font resource number
    next_font_resource: u32,
    /// Embedded images (data hash -> resource name)
    embedded_images: HashMap<u64, String>,
    /// Page image resources (resource name -> object ID)
    image_resources: BTreeMap<String, ObjectId>,
    /// Next image resource number
    next_image_resource: u32,
    /// Content stream operators, in drawing order
    content: Vec<u8>,
}

impl PdfDocument {
    /// Create a document with one blank page of `width` x `height` points
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidPageSize(width, height));
        }

        let mut inner = Document::with_version("1.7");
        let pages_id = inner.new_object_id();

        let page_id = inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
        });

        inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );

        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Ok(Self {
            inner,
            page_id,
            width,
            height,
            fonts: BTreeMap::new(),
            current_font: None,
            current_font_size: 12.0,
            current_text_color: Color::default(),
            font_resources: BTreeMap::new(),
            next_font_resource: 1,
            embedded_images: HashMap::new(),
            image_resources: BTreeMap::new(),
            next_image_resource: 1,
            content: Vec::new(),
        })
    }

    /// Page width in points
    pub fn page_width(&self) -> f64 {
        self.width
    }

    /// Page height in points
    pub fn page_height(&self) -> f64 {
        self.height
    }

    /// Add a TrueType font to the document
    ///
    /// # Arguments
    /// * `name` - Font identifier (used in set_font)
    /// * `ttf_data` - TrueType font file bytes
    pub fn add_font(&mut self, name: &str, ttf_data: &[u8]) -> Result<()> {
        self.add_shared_font(name, Arc::from(ttf_data))
    }

    /// Add a font whose bytes are shared with a cache outside the document
    pub fn add_shared_font(&mut self, name: &str, ttf_data: Arc<[u8]>) -> Result<()> {
        if self.fonts.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }

        let font_data = FontData::from_shared(name, ttf_data)?;
        self.fonts.insert(name.to_string(), font_data);
        Ok(())
    }

    /// Check whether a font was registered under `name`
    pub fn has_font(&self, name: &str) -> bool {
        self.fonts.contains_key(name)
    }

    /// Set the current font and size
    ///
    /// # Arguments
    /// * `name` - Font identifier given to `add_font`
    /// * `size` - Font size in points
    pub fn set_font(&mut self, name: &str, size: f32) -> Result<()> {
        if !self.fonts.contains_key(name) {
            return Err(PdfError::FontNotFound(name.to_string()));
        }

        self.current_font = Some(name.to_string());
        self.current_font_size = size;
        Ok(())
    }

    /// Set the text color
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    fn current_font_name(&self) -> Result<String> {
        self.current_font
            .clone()
            .ok_or_else(|| PdfError::FontNotFound("No font set".to_string()))
    }

    /// Insert text with its baseline origin at `(x, y)`
    ///
    /// Empty text is a no-op.
    pub fn insert_text(&mut self, text: &str, x: f64, y: f64) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let font_name = self.current_font_name()?;
        let text_hex = {
            let font_data = self
                .fonts
                .get_mut(&font_name)
                .ok_or_else(|| PdfError::FontNotFound(font_name.clone()))?;
            font_data.add_chars(text);
            font_data.encode_text_hex(text)
        };

        let ctx = TextRenderContext {
            font_name: self.font_resource_name(&font_name),
            font_size: self.current_font_size,
            color: self.current_text_color,
        };

        let operators = generate_text_operators(&text_hex, x, y, &ctx);
        self.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Resource name (e.g. "F1") for a font, allocated on first use
    fn font_resource_name(&mut self, font_name: &str) -> String {
        if let Some(resource_name) = self.font_resources.get(font_name) {
            return resource_name.clone();
        }

        let resource_name = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;
        self.font_resources
            .insert(font_name.to_string(), resource_name.clone());
        resource_name
    }

    /// Draw an image XObject stretched to `width` x `height` with its
    /// bottom-left corner at `(x, y)`
    ///
    /// Identical image data is embedded once per document.
    pub fn insert_xobject(
        &mut self,
        xobject: ImageXObject,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let hash = hash_bytes(&xobject.data);
        let resource_name = self.get_or_create_image_ref(hash, || Ok(xobject))?;
        self.content
            .extend_from_slice(&generate_image_operators(&resource_name, x, y, width, height));
        Ok(())
    }

    /// Get or create an image resource, deduplicated by data hash
    fn get_or_create_image_ref(
        &mut self,
        data_hash: u64,
        make: impl FnOnce() -> Result<ImageXObject>,
    ) -> Result<String> {
        if let Some(resource_name) = self.embedded_images.get(&data_hash) {
            return Ok(resource_name.clone());
        }

        let xobject =
            make().map_err(|e| PdfError::ImageError(format!("Failed to create image XObject: {e}")))?;
        let object_id = self.inner.add_object(xobject.to_pdf_stream());

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        self.image_resources.insert(resource_name.clone(), object_id);
        self.embedded_images.insert(data_hash, resource_name.clone());

        Ok(resource_name)
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Finalize the page and serialize the document
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        self.finish()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Embed used fonts, then attach resources and content to the page
    fn finish(&mut self) -> Result<()> {
        let mut font_dict = Dictionary::new();
        let used: Vec<(String, String)> = self
            .font_resources
            .iter()
            .map(|(name, resource)| (name.clone(), resource.clone()))
            .collect();
        for (font_name, resource_name) in used {
            let font_id = self.embed_font_object(&font_name)?;
            font_dict.set(resource_name.as_bytes(), Object::Reference(font_id));
        }

        let mut xobject_dict = Dictionary::new();
        for (resource_name, object_id) in &self.image_resources {
            xobject_dict.set(resource_name.as_bytes(), Object::Reference(*object_id));
        }

        let mut resources = Dictionary::new();
        if !font_dict.is_empty() {
            resources.set("Font", Object::Dictionary(font_dict));
        }
        if !xobject_dict.is_empty() {
            resources.set("XObject", Object::Dictionary(xobject_dict));
        }

        let content = std::mem::take(&mut self.content);
        let contents_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), content));

        let page_dict = self
            .inner
            .get_object_mut(self.page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?;
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Reference(contents_id));

        Ok(())
    }

    /// Embed a single font object into the PDF
    fn embed_font_object(&mut self, font_name: &str) -> Result<ObjectId> {
        let font_data = self
            .fonts
            .get(font_name)
            .ok_or_else(|| PdfError::FontNotFound(font_name.to_string()))?;

        let font_objects = font_data.to_pdf_objects()?;

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        debug!(
            font = font_name,
            chars = font_data.used_chars.len(),
            "embedded font"
        );

        Ok(self.inner.add_object(type0_font))
    }
}

fn hash_bytes(data: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}
