//! Glyph layout, measurement and rasterization with ab_glyph
//!
//! Text is laid out on a single line with kerning. Sizes are em sizes in
//! pixels: a 40px font has a 40px em square, not a 40px line height.

use crate::Rgb;
use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use image::RgbImage;

/// Measured extent of a laid-out string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Width of the inked area (falls back to the advance width when
    /// nothing is inked, e.g. for whitespace)
    pub width: f64,
    /// Offset of the first inked pixel from the pen origin
    pub left: f64,
    /// Distance from the top of the line to the baseline
    pub ascent: f64,
}

/// Pixel scale whose em square is `size` pixels
pub fn scale_for(font: &FontArc, size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * font.height_unscaled() / units_per_em)
}

/// Lay out `text` with the pen starting at `(0, baseline)`
///
/// Returns the positioned glyphs and the total advance width.
fn layout(font: &FontArc, scale: PxScale, text: &str, baseline: f32) -> (Vec<Glyph>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = 0.0f32;
    let mut previous = None;

    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    (glyphs, caret)
}

/// Measure `text` at `size` pixels
pub fn measure(font: &FontArc, size: f32, text: &str) -> TextMetrics {
    let scale = scale_for(font, size);
    let ascent = font.as_scaled(scale).ascent();
    let (glyphs, advance) = layout(font, scale, text, ascent);

    let mut ink: Option<(f32, f32)> = None;
    for glyph in glyphs {
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            ink = Some(match ink {
                Some((min, max)) => (min.min(bounds.min.x), max.max(bounds.max.x)),
                None => (bounds.min.x, bounds.max.x),
            });
        }
    }

    let (left, width) = match ink {
        Some((min, max)) => (min, max - min),
        None => (0.0, advance),
    };

    TextMetrics {
        width: width as f64,
        left: left as f64,
        ascent: ascent as f64,
    }
}

/// Draw `text` on `canvas` with the pen at `x` and the top of the line at `top`
///
/// Glyph coverage is blended over the existing pixels; anything outside the
/// canvas is clipped.
pub fn draw_text(
    canvas: &mut RgbImage,
    font: &FontArc,
    size: f32,
    x: f32,
    top: f32,
    text: &str,
    color: Rgb,
) {
    let scale = scale_for(font, size);
    let ascent = font.as_scaled(scale).ascent();
    let (glyphs, _) = layout(font, scale, text, top + ascent);
    let (width, height) = canvas.dimensions();
    let ink = [color.r, color.g, color.b];

    for mut glyph in glyphs {
        glyph.position.x += x;
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = gx as i64 + bounds.min.x as i64;
            let py = gy as i64 + bounds.min.y as i64;
            if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                return;
            }
            let coverage = coverage.clamp(0.0, 1.0);
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            for (channel, ink) in pixel.0.iter_mut().zip(ink) {
                *channel = (*channel as f32 * (1.0 - coverage) + ink as f32 * coverage).round() as u8;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::default_font;
    use image::Rgb as Pixel;

    #[test]
    fn test_scale_gives_em_size() {
        let font = default_font();
        let scale = scale_for(&font, 40.0);
        let upem = font.units_per_em().unwrap();
        let advance = font.as_scaled(scale).h_advance(font.glyph_id('M'));
        let expected = font.h_advance_unscaled(font.glyph_id('M')) * 40.0 / upem;
        assert!((advance - expected).abs() < 0.01);
    }

    #[test]
    fn test_measure_grows_with_text() {
        let font = default_font();
        let short = measure(&font, 32.0, "Jane");
        let long = measure(&font, 32.0, "Jane Doe");
        assert!(short.width > 0.0);
        assert!(long.width > short.width);
        assert!(short.ascent > 0.0 && short.ascent < 40.0);
    }

    #[test]
    fn test_measure_ink_narrower_than_advance() {
        let font = default_font();
        let scale = scale_for(&font, 40.0);
        let (_, advance) = layout(&font, scale, "H", 0.0);
        let metrics = measure(&font, 40.0, "H");
        assert!(metrics.width < advance as f64);
        assert!(metrics.left > 0.0);
    }

    #[test]
    fn test_measure_whitespace_uses_advance() {
        let font = default_font();
        let metrics = measure(&font, 20.0, "  ");
        assert!(metrics.width > 0.0);
        assert_eq!(metrics.left, 0.0);
        assert_eq!(measure(&font, 20.0, "").width, 0.0);
    }

    #[test]
    fn test_draw_text_marks_pixels() {
        let font = default_font();
        let mut canvas = RgbImage::from_pixel(200, 60, Pixel([255, 255, 255]));
        draw_text(&mut canvas, &font, 32.0, 10.0, 10.0, "Hi", Rgb::new(0, 0, 0));

        let dark = canvas.pixels().filter(|p| p.0[0] < 128).count();
        assert!(dark > 0);
        // Nothing above the top of the line
        assert!((0..10).all(|y| (0..200).all(|x| canvas.get_pixel(x, y).0 == [255, 255, 255])));
    }

    #[test]
    fn test_draw_text_clips() {
        let font = default_font();
        let mut canvas = RgbImage::from_pixel(20, 20, Pixel([255, 255, 255]));
        draw_text(&mut canvas, &font, 64.0, -30.0, -10.0, "WWW", Rgb::new(255, 0, 0));
        draw_text(&mut canvas, &font, 64.0, 500.0, 500.0, "WWW", Rgb::new(255, 0, 0));
    }
}
