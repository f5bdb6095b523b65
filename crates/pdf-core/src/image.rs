//! Image handling for PDF documents

use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, GenericImageView};
use lopdf::{Dictionary, Object, Stream};
use std::io::Write;

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Image XObject for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space ("DeviceRGB", "DeviceGray")
    pub color_space: String,
    /// Bits per component
    pub bits_per_component: u8,
    /// PDF stream filter
    pub filter: String,
    /// Encoded image data
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Create XObject from a decoded image
    ///
    /// Alpha channels are blended over a white background.
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();

        let (raw_data, color_space) = if image.color().has_color() {
            let rgb_data = if image.color().has_alpha() {
                let rgba = image.to_rgba8();
                let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
                for pixel in rgba.pixels() {
                    let alpha = pixel[3] as f32 / 255.0;
                    for channel in &pixel.0[..3] {
                        rgb_data.push(over_white(*channel, alpha));
                    }
                }
                rgb_data
            } else {
                image.to_rgb8().into_raw()
            };
            (rgb_data, "DeviceRGB")
        } else {
            let gray_data = if image.color().has_alpha() {
                image
                    .to_luma_alpha8()
                    .pixels()
                    .map(|pixel| over_white(pixel[0], pixel[1] as f32 / 255.0))
                    .collect()
            } else {
                image.to_luma8().into_raw()
            };
            (gray_data, "DeviceGray")
        };

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw_data)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            color_space: color_space.to_string(),
            bits_per_component: 8,
            filter: "FlateDecode".to_string(),
            data,
        })
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();

        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set(
            "ColorSpace",
            Object::Name(self.color_space.as_bytes().to_vec()),
        );
        dict.set("BitsPerComponent", self.bits_per_component as i64);
        dict.set("Filter", Object::Name(self.filter.as_bytes().to_vec()));

        Stream::new(dict, self.data.clone())
    }
}

fn over_white(channel: u8, alpha: f32) -> u8 {
    (channel as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8
}

/// Generate operators to draw image at position
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x` - X coordinate in points
/// * `y` - Y coordinate in points (from bottom, PDF coordinates)
/// * `width` - Image width in points
/// * `height` - Image height in points
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}
