//! Content stream classification and rewriting.
//!
//! The pipeline for one page:
//!
//! 1. [`PageGeometry`] turns the page box into header/footer thresholds.
//! 2. [`classify_stream`] decides whether a whole stream is decoration.
//! 3. Kept streams are tokenized by [`Lexer`]; [`TextState`] tracks where
//!    text is being drawn and [`TextSignatures`] recognises page numbers,
//!    ruled lines and encoded footer runs.
//! 4. [`rewrite_page`] joins the surviving tokens and streams back together.

mod classify;
mod geometry;
mod lexer;
mod rewrite;
mod signature;
mod state;

use std::fmt;

use serde::Serialize;

pub use classify::{classify_stream, StreamStats, StreamVerdict};
pub use geometry::{Band, BoundingBox, PageGeometry};
pub use lexer::{tokenize, Lexer, Operand, Token, TEXT_SHOW_OPERATORS};
pub use rewrite::{rewrite_page, FilteredStream, PageRewrite, StreamFilter};
pub use signature::TextSignatures;
pub use state::{Suppression, TextState};

/// Why a stream or operator was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Small stream without any text
    EmptyContent,
    /// Small stream with flipped text and little else
    RotatedDecoration,
    /// Small stream with only a handful of text shows
    LowDensityWatermark,
    /// Bare page number literal
    PageNumber,
    /// Ruled line drawn with dashes or underscores
    DecorativeLine,
    /// Hex-encoded run on a footer offset
    EncodedFooter,
    /// Text drawn inside a header, footer or off-page band
    OutOfRegion(Band),
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyContent => f.write_str("empty"),
            Self::RotatedDecoration => f.write_str("rotated"),
            Self::LowDensityWatermark => f.write_str("watermark-low-density"),
            Self::PageNumber => f.write_str("page-number"),
            Self::DecorativeLine => f.write_str("decorative-line"),
            Self::EncodedFooter => f.write_str("encoded-footer"),
            Self::OutOfRegion(band) => {
                let band = match band {
                    Band::Header => "header",
                    Band::Footer => "footer",
                    Band::OffPage => "off-page",
                    Band::TopCenter => "top-center",
                };
                write!(f, "out-of-region:{}", band)
            }
        }
    }
}

/// Classification outcome for a stream or an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalDecision {
    Keep,
    DropStream(RemovalReason),
    DropOperator(RemovalReason),
}
