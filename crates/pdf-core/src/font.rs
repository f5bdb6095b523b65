//! TrueType font handling for PDF documents

use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Object, Stream};
use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

/// PDF glyph space is 1000 units per em regardless of the font's own grid
const PDF_UNITS_PER_EM: f32 = 1000.0;

fn has_cff_outlines(face: &ttf_parser::Face<'_>) -> bool {
    [b"CFF ", b"CFF2"]
        .iter()
        .any(|tag| face.raw_face().table(ttf_parser::Tag::from_bytes(*tag)).is_some())
}

/// Font data registered with a document
///
/// The raw font program is shared (`Arc<[u8]>`) so the same file can be
/// registered with many documents without copying it per document.
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font identifier used by `PdfDocument::set_font`
    pub name: String,
    /// Raw TTF/OTF data
    pub ttf_data: Arc<[u8]>,
    /// Characters drawn with this font, for widths and ToUnicode
    pub used_chars: BTreeSet<char>,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (compressed font program)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        Self::from_shared(name, Arc::from(ttf_data))
    }

    /// Create font data from an already shared font program
    ///
    /// Only TrueType outlines can be embedded; OpenType fonts with CFF
    /// outlines fail with [`PdfError::UnsupportedFont`].
    pub fn from_shared(name: &str, ttf_data: Arc<[u8]>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{name}: {e}")))?;
        if has_cff_outlines(&face) {
            return Err(PdfError::UnsupportedFont(format!(
                "{name}: CFF outlines cannot be embedded as TrueType"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            ttf_data,
            used_chars: BTreeSet::new(),
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Encode text as hex glyph IDs for the Tj operator (Identity-H)
    pub fn encode_text_hex(&self, text: &str) -> String {
        let face = self.face();
        let mut result = String::with_capacity(text.len() * 4 + 2);
        result.push('<');
        for c in text.chars() {
            let gid = face
                .as_ref()
                .and_then(|face| face.glyph_index(c))
                .map(|id| id.0)
                .unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        result.push('>');
        result
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// References between the objects are left as `(0, 0)` placeholders and
    /// wired up by the document when the objects are added.
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let face = self
            .face()
            .ok_or_else(|| PdfError::FontParseError(self.name.clone()))?;
        let base_font = Object::Name(postscript_name(&self.name).into_bytes());
        let scale = PDF_UNITS_PER_EM / face.units_per_em() as f32;
        let to_pdf = |v: i16| Object::Integer((v as f32 * scale).round() as i64);

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(Dictionary::new(), tounicode_content.into_bytes());

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![
                ("Length1", Object::Integer(self.ttf_data.len() as i64)),
                ("Filter", "FlateDecode".into()),
            ]),
            deflate(&self.ttf_data)?,
        );

        let bbox = face.global_bounding_box();
        let font_bbox = vec![
            to_pdf(bbox.x_min),
            to_pdf(bbox.y_min),
            to_pdf(bbox.x_max),
            to_pdf(bbox.y_max),
        ];
        let ascender = face.ascender();
        let italic_angle = face.italic_angle().unwrap_or(0.0);
        // Nonsymbolic, plus Italic when the face is slanted
        let flags = if italic_angle != 0.0 { 32 | 64 } else { 32 };

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", base_font.clone()),
            ("Flags", Object::Integer(flags)),
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", Object::Real(italic_angle)),
            ("Ascent", to_pdf(ascender)),
            ("Descent", to_pdf(face.descender())),
            ("CapHeight", to_pdf(face.capital_height().unwrap_or(ascender))),
            ("StemV", Object::Integer(80)),
            ("FontFile2", Object::Reference((0, 0))),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", Object::Integer(0)),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", base_font.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("FontDescriptor", Object::Reference((0, 0))),
            ("CIDToGIDMap", "Identity".into()),
            ("W", self.generate_widths_array(&face).into()),
            ("DW", Object::Integer(1000)),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", base_font),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference((0, 0))].into()),
            ("ToUnicode", Object::Reference((0, 0))),
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        })
    }

    /// Generate /W array for used glyphs: `[gid [width] gid [width] ...]`
    fn generate_widths_array(&self, face: &ttf_parser::Face<'_>) -> Vec<Object> {
        let scale = PDF_UNITS_PER_EM / face.units_per_em() as f32;

        let gids: BTreeSet<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| face.glyph_index(c))
            .map(|id| id.0)
            .collect();

        let mut widths = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0);
            widths.push(Object::Integer(i64::from(gid)));
            widths.push(vec![Object::Integer((advance as f32 * scale).round() as i64)].into());
        }
        widths
    }

    /// Generate ToUnicode CMap stream content
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        // Characters without a glyph all map to GID 0 and are left out
        let mapped: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c).filter(|&gid| gid != 0).map(|gid| (gid, c)))
            .collect();

        // At most 100 entries per bfchar section
        for chunk in mapped.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                cmap.push_str(&format!("<{gid:04X}> <{}>\n", utf16_hex(*c)));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

/// Font names become PDF names, which cannot hold whitespace or delimiters
fn postscript_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "Font".to_string()
    } else {
        cleaned
    }
}

fn utf16_hex(c: char) -> String {
    let mut buf = [0u16; 2];
    c.encode_utf16(&mut buf)
        .iter()
        .map(|unit| format!("{unit:04X}"))
        .collect()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
