//! Cleaning options and configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options for cleaning PDF documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Header/footer band and footer offset configuration
    pub regions: RegionConfig,

    /// Whole-stream removal thresholds
    pub streams: StreamThresholds,

    /// Content signature limits for text-show operands
    pub signatures: SignatureLimits,

    /// Directory where cleaned files are written
    pub output_dir: PathBuf,

    /// Whether to delete page annotations
    pub strip_annotations: bool,

    /// Whether to compress streams when saving
    pub compress: bool,
}

impl CleanOptions {
    /// Create new clean options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set region configuration.
    pub fn with_regions(mut self, regions: RegionConfig) -> Self {
        self.regions = regions;
        self
    }

    /// Set the header threshold as a fraction of page height.
    pub fn with_header_fraction(mut self, fraction: f64) -> Self {
        self.regions.header_fraction = fraction;
        self
    }

    /// Set the footer threshold as a fraction of page height.
    pub fn with_footer_fraction(mut self, fraction: f64) -> Self {
        self.regions.footer_fraction = fraction;
        self
    }

    /// Replace the footer offset whitelist.
    pub fn with_footer_offsets(mut self, offsets: Vec<f64>, tolerance: f64) -> Self {
        self.regions.footer_offsets = offsets;
        self.regions.footer_offset_tolerance = tolerance;
        self
    }

    /// Set stream thresholds.
    pub fn with_stream_thresholds(mut self, streams: StreamThresholds) -> Self {
        self.streams = streams;
        self
    }

    /// Enable or disable annotation removal.
    pub fn with_annotations_stripped(mut self, strip: bool) -> Self {
        self.strip_annotations = strip;
        self
    }

    /// Keep annotations untouched.
    pub fn keep_annotations(mut self) -> Self {
        self.strip_annotations = false;
        self
    }

    /// Enable or disable stream compression on save.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Check the options for values that cannot partition a page.
    pub fn validate(&self) -> Result<()> {
        self.regions.validate()?;
        self.streams.validate()
    }
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            regions: RegionConfig::default(),
            streams: StreamThresholds::default(),
            signatures: SignatureLimits::default(),
            output_dir: PathBuf::from("temp/cleaned"),
            strip_annotations: true,
            compress: true,
        }
    }
}

/// Vertical bands of a page and the footer offset whitelist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Text at or above `height * header_fraction` is header
    pub header_fraction: f64,

    /// Text at or below `height * footer_fraction` is footer
    pub footer_fraction: f64,

    /// Tolerance above the page top before text counts as off-page
    pub off_page_margin: f64,

    /// Lower edge of the top-center page number zone, as a fraction of height
    pub top_center_fraction: f64,

    /// Exclusive x range of the top-center page number zone
    pub top_center_x: (f64, f64),

    /// Y offsets where encoded footer runs are drawn
    pub footer_offsets: Vec<f64>,

    /// Maximum distance from a footer offset that still matches
    pub footer_offset_tolerance: f64,
}

impl RegionConfig {
    /// Check that fractions are in range and bands do not cross.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("header_fraction", self.header_fraction),
            ("footer_fraction", self.footer_fraction),
            ("top_center_fraction", self.top_center_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.footer_fraction >= self.header_fraction {
            return Err(Error::InvalidConfig(format!(
                "footer_fraction ({}) must be below header_fraction ({})",
                self.footer_fraction, self.header_fraction
            )));
        }
        if self.footer_offset_tolerance < 0.0 || self.off_page_margin < 0.0 {
            return Err(Error::InvalidConfig(
                "tolerances and margins must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            header_fraction: 0.90,
            footer_fraction: 0.10,
            off_page_margin: 100.0,
            top_center_fraction: 0.95,
            top_center_x: (200.0, 400.0),
            footer_offsets: vec![0.0, 10.0, 13.07, 28.3, 29.97, 30.97, 46.87],
            footer_offset_tolerance: 1.0,
        }
    }
}

/// Thresholds of the whole-stream classifier.
///
/// Ratios compare a stream's byte size with the combined size of every
/// content stream on the same page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamThresholds {
    /// Text-free streams below this share of the page are dropped
    pub empty_ratio: f64,

    /// Rotated streams below this share of the page are dropped
    pub rotated_ratio: f64,

    /// Rotated streams need fewer text-shows than this to be dropped
    pub rotated_max_text_ops: usize,

    /// Sparse text streams below this share of the page are dropped
    pub watermark_ratio: f64,

    /// Sparse text streams must be larger than this many bytes
    pub watermark_min_bytes: usize,

    /// Sparse means fewer text-shows than this (and at least one)
    pub watermark_max_text_ops: usize,

    /// Rotated or right-edge streams below this count are flagged as mixed
    pub mixed_max_text_ops: usize,

    /// Text matrices with x beyond this column count as right-edge
    pub right_edge_x: f64,
}

impl StreamThresholds {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("empty_ratio", self.empty_ratio),
            ("rotated_ratio", self.rotated_ratio),
            ("watermark_ratio", self.watermark_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for StreamThresholds {
    fn default() -> Self {
        Self {
            empty_ratio: 0.05,
            rotated_ratio: 0.03,
            rotated_max_text_ops: 10,
            watermark_ratio: 0.20,
            watermark_min_bytes: 100,
            watermark_max_text_ops: 15,
            mixed_max_text_ops: 30,
            right_edge_x: 350.0,
        }
    }
}

/// Length limits of the text-show content signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureLimits {
    /// Page number operands must be shorter than this
    pub page_number_max_len: usize,

    /// Decorative line operands must be shorter than this
    pub decorative_line_max_len: usize,

    /// Encoded footer operands must be shorter than this
    pub encoded_footer_max_len: usize,
}

impl Default for SignatureLimits {
    fn default() -> Self {
        Self {
            page_number_max_len: 30,
            decorative_line_max_len: 80,
            encoded_footer_max_len: 80,
        }
    }
}
