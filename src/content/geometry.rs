//! Page geometry: page size and the header/footer bands derived from it.

use serde::Serialize;

use crate::options::RegionConfig;

/// A page bounding box in default user space (`[x0 y0 x1 y1]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build from the numeric entries of a `/MediaBox` array.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [x0, y0, x1, y1] => Some(Self::new(*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }
}

/// Band a text position falls into when it is not body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// At or above the header threshold
    Header,
    /// At or below the footer threshold
    Footer,
    /// Below the page origin or far above the page top
    OffPage,
    /// Centered near the very top, where running page numbers sit
    TopCenter,
}

/// Resolved dimensions and thresholds of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub header_y_threshold: f64,
    pub footer_y_threshold: f64,
    off_page_margin: f64,
    top_center_y: f64,
    top_center_x: (f64, f64),
    footer_offsets: Vec<f64>,
    footer_offset_tolerance: f64,
}

impl PageGeometry {
    /// Resolve geometry for a page. Returns `None` when the box is missing
    /// numbers or has no area.
    pub fn resolve(bbox: BoundingBox, config: &RegionConfig) -> Option<Self> {
        let width = bbox.width();
        let height = bbox.height();
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return None;
        }

        Some(Self {
            page_width: width,
            page_height: height,
            header_y_threshold: height * config.header_fraction,
            footer_y_threshold: height * config.footer_fraction,
            off_page_margin: config.off_page_margin,
            top_center_y: height * config.top_center_fraction,
            top_center_x: config.top_center_x,
            footer_offsets: config.footer_offsets.clone(),
            footer_offset_tolerance: config.footer_offset_tolerance,
        })
    }

    /// Classify a text position. `None` means body text.
    pub fn band_of(&self, x: f64, y: f64) -> Option<Band> {
        if y >= self.header_y_threshold {
            Some(Band::Header)
        } else if y <= self.footer_y_threshold {
            Some(Band::Footer)
        } else if y < 0.0 || y > self.page_height + self.off_page_margin {
            Some(Band::OffPage)
        } else if y >= self.top_center_y && self.top_center_x.0 < x && x < self.top_center_x.1 {
            Some(Band::TopCenter)
        } else {
            None
        }
    }

    /// Whether `y` sits on one of the whitelisted footer offsets.
    pub fn is_footer_offset(&self, y: f64) -> bool {
        self.footer_offsets
            .iter()
            .any(|offset| (y - offset).abs() < self.footer_offset_tolerance)
    }
}
