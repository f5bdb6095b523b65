//! Placement arithmetic shared by the raster and PDF backends
//!
//! Fields are positioned in template pixel space (origin top-left). The
//! raster backend draws with the ascender line at the field's `y`; the PDF
//! backend works bottom-up and anchors text on its baseline, approximated as
//! `size * BASELINE_FACTOR` below the top of the text.

use crate::{Align, TextField};

/// Fraction of the font size between the top of the text and its baseline
pub const BASELINE_FACTOR: f64 = 0.8;

/// Smallest box width an editor lets the user drag to, in view pixels
pub const MIN_VIEW_BOX_WIDTH: f64 = 40.0;

/// Left edge of the drawn text
///
/// Without a box (`box_width <= 0`) alignment is ignored and the text starts
/// at `x`. The result may lie left of `x` when the text is wider than the box.
pub fn place_x(x: f64, box_width: f64, text_width: f64, align: Align) -> f64 {
    if box_width <= 0.0 {
        return x;
    }
    match align {
        Align::Left => x,
        Align::Center => x + (box_width - text_width) / 2.0,
        Align::Right => x + (box_width - text_width),
    }
}

/// Baseline of the text in PDF coordinates (origin bottom-left)
pub fn pdf_baseline_y(page_height: f64, y: f64, size: f64) -> f64 {
    page_height - (y + size * BASELINE_FACTOR)
}

/// Drawing surface a field is placed on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    /// Raster canvas: y grows downwards, text hangs from its top
    Raster,
    /// PDF page of the given height: y grows upwards, text sits on its baseline
    Page { height: f64 },
}

/// Where to start drawing a field's text on a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
}

/// Place a field whose rendered text is `text_width` pixels wide
pub fn place(field: &TextField, text_width: f64, surface: Surface) -> Placement {
    let x = place_x(field.x, field.box_width, text_width, field.align);
    let y = match surface {
        Surface::Raster => field.y,
        Surface::Page { height } => pdf_baseline_y(height, field.y, field.font_size() as f64),
    };
    Placement { x, y }
}

/// Snap a coordinate to a grid of `step` pixels
pub fn snap(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Conversion between template pixels and an editor's zoomed view
///
/// Box widths are stored in template pixels; only their on-screen size
/// depends on the zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewScale {
    factor: f64,
}

impl ViewScale {
    pub const MIN_ZOOM: f64 = 0.1;
    pub const MAX_ZOOM: f64 = 8.0;

    /// Create a scale, clamping the zoom factor to the supported range
    pub fn new(factor: f64) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM)
        } else {
            1.0
        };
        Self { factor }
    }

    /// Zoom that fits a `width` x `height` template into a viewport
    pub fn fit(width: u32, height: u32, view_width: f64, view_height: f64) -> Self {
        if width == 0 || height == 0 {
            return Self::new(1.0);
        }
        Self::new((view_width / width as f64).min(view_height / height as f64))
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Template pixels to view pixels
    pub fn to_view(&self, value: f64) -> f64 {
        value * self.factor
    }

    /// View pixels to template pixels
    pub fn from_view(&self, value: f64) -> f64 {
        value / self.factor
    }

    /// Box width stored after a resize to `view_width` on screen
    ///
    /// The on-screen width never drops below [`MIN_VIEW_BOX_WIDTH`] and the
    /// stored width is truncated to whole template pixels.
    pub fn box_width_from_view(&self, view_width: f64) -> f64 {
        self.from_view(view_width.max(MIN_VIEW_BOX_WIDTH)).trunc()
    }
}

impl Default for ViewScale {
    fn default() -> Self {
        Self::new(1.0)
    }
}
