//! Whole-stream classification.
//!
//! Runs before any per-operator work. A stream is dropped outright only when
//! it is small relative to the page *and* sparse in text; anything larger is
//! left to the operator filter, since watermark fragments often share a
//! stream with body text.

use super::lexer::Lexer;
use super::{RemovalDecision, RemovalReason};
use crate::options::StreamThresholds;

/// Aggregate signals of one content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Decoded size in bytes
    pub size: usize,
    /// Number of text-show operators
    pub text_ops: usize,
    /// A text matrix with a negative leading coefficient (flipped text)
    pub has_rotation: bool,
    /// A text matrix positioned beyond the right-edge column
    pub has_right_edge: bool,
}

impl StreamStats {
    pub fn scan(data: &[u8], right_edge_x: f64) -> Self {
        let mut stats = Self {
            size: data.len(),
            ..Self::default()
        };
        for token in Lexer::new(data) {
            if token.is_text_show() {
                stats.text_ops += 1;
            } else if token.is_operator(b"Tm") {
                if let Some([a, _, _, _, x, _]) = token.trailing_numbers::<6>() {
                    stats.has_rotation |= a < 0.0;
                    stats.has_right_edge |= x > right_edge_x;
                }
            }
        }
        stats
    }
}

/// Outcome of classifying a whole stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamVerdict {
    /// Remove the stream; none of its tokens are looked at again.
    Drop(RemovalReason),
    /// Filter the stream operator by operator. `mixed` marks streams that
    /// carry watermark signals next to enough text to be body content.
    Filter { mixed: bool },
}

impl StreamVerdict {
    pub fn decision(&self) -> RemovalDecision {
        match self {
            Self::Drop(reason) => RemovalDecision::DropStream(*reason),
            Self::Filter { .. } => RemovalDecision::Keep,
        }
    }
}

/// Classify a stream against the combined size of all streams on its page.
pub fn classify_stream(
    stats: &StreamStats,
    total_size: usize,
    thresholds: &StreamThresholds,
) -> StreamVerdict {
    let size = stats.size as f64;
    let total = total_size as f64;

    let empty = size < total * thresholds.empty_ratio && stats.text_ops == 0;
    let rotated = stats.has_rotation
        && size < total * thresholds.rotated_ratio
        && stats.text_ops < thresholds.rotated_max_text_ops;
    let low_density = stats.text_ops > 0
        && stats.text_ops < thresholds.watermark_max_text_ops
        && size < total * thresholds.watermark_ratio
        && stats.size > thresholds.watermark_min_bytes;

    if empty {
        StreamVerdict::Drop(RemovalReason::EmptyContent)
    } else if rotated {
        StreamVerdict::Drop(RemovalReason::RotatedDecoration)
    } else if low_density {
        StreamVerdict::Drop(RemovalReason::LowDensityWatermark)
    } else {
        StreamVerdict::Filter {
            mixed: (stats.has_rotation || stats.has_right_edge)
                && stats.text_ops < thresholds.mixed_max_text_ops,
        }
    }
}
