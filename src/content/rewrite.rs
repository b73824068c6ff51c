//! Operator filtering and page reassembly.

use log::debug;

use super::classify::{classify_stream, StreamStats, StreamVerdict};
use super::geometry::PageGeometry;
use super::lexer::{Lexer, Operand, Token};
use super::signature::TextSignatures;
use super::state::{Suppression, TextState};
use super::{RemovalDecision, RemovalReason};
use crate::backend::{ContentOutput, PageStream, StreamData};
use crate::options::CleanOptions;

/// Per-operator filter for the streams of one page.
pub struct StreamFilter<'g> {
    geometry: &'g PageGeometry,
    signatures: &'g TextSignatures,
}

/// Result of filtering one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredStream {
    pub content: Vec<u8>,
    /// One entry per removed operator, in stream order
    pub removed: Vec<RemovalReason>,
}

impl FilteredStream {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

impl<'g> StreamFilter<'g> {
    pub fn new(geometry: &'g PageGeometry, signatures: &'g TextSignatures) -> Self {
        Self {
            geometry,
            signatures,
        }
    }

    /// Decide the fate of `token` given the state in effect when it is drawn.
    pub fn decide(&self, token: &Token<'_>, state: &TextState) -> RemovalDecision {
        if !token.is_text_show() {
            return RemovalDecision::Keep;
        }

        let text = token.operand_text();
        let reason = match state.suppression {
            Suppression::Region(band) => Some(RemovalReason::OutOfRegion(band)),
            _ if self.signatures.is_page_number(text) => Some(RemovalReason::PageNumber),
            _ if self.signatures.is_decorative_line(text) => Some(RemovalReason::DecorativeLine),
            Suppression::FooterOffset if self.signatures.is_encoded_footer(text) => {
                Some(RemovalReason::EncodedFooter)
            }
            _ => None,
        };

        reason.map_or(RemovalDecision::Keep, RemovalDecision::DropOperator)
    }

    /// Filter a decoded stream. When nothing is removed the output equals the
    /// input byte for byte.
    pub fn filter(&self, data: &[u8]) -> FilteredStream {
        let mut lexer = Lexer::new(data);
        let mut content = Vec::with_capacity(data.len());
        let mut removed = Vec::new();
        let mut state = TextState::default();

        for token in lexer.by_ref() {
            state = state.step(&token, self.geometry);
            match self.decide(&token, &state) {
                RemovalDecision::DropOperator(reason) | RemovalDecision::DropStream(reason) => {
                    debug!(
                        "dropped {} at ({:.2}, {:.2}): {}",
                        reason,
                        state.x,
                        state.y,
                        token.display_text()
                    );
                    content.extend_from_slice(&line_advance(&token));
                    removed.push(reason);
                }
                RemovalDecision::Keep => content.extend_from_slice(token.raw()),
            }
        }

        if lexer.truncated() {
            debug!("content stream ends inside an unterminated operand");
        }

        FilteredStream { content, removed }
    }
}

/// Operators that stand in for a removed text show.
///
/// `'` and `"` move to the next line before drawing, and `"` also sets word
/// and character spacing. Keeping those side effects leaves the following
/// lines where they were.
fn line_advance(token: &Token<'_>) -> Vec<u8> {
    match token.operator() {
        Some(b"'") => b" T*".to_vec(),
        Some(b"\"") => match token.operands() {
            [.., Operand::Number(aw), Operand::Number(ac), _] => {
                format!(" {} Tw {} Tc T*", aw, ac).into_bytes()
            }
            _ => b" T*".to_vec(),
        },
        _ => Vec::new(),
    }
}

/// Rewritten content of a page.
#[derive(Debug, Clone, Default)]
pub struct PageRewrite {
    /// Surviving streams in their original order
    pub contents: Vec<ContentOutput>,
    pub operators_removed: usize,
    pub streams_removed: usize,
    pub mixed_streams: usize,
    pub failed_streams: usize,
    /// Every removal on the page, stream drops first within each stream
    pub reasons: Vec<RemovalReason>,
}

impl PageRewrite {
    /// Whether the page's content reference needs to be written back.
    pub fn is_modified(&self) -> bool {
        self.operators_removed > 0 || self.streams_removed > 0
    }
}

/// Classify and filter every content stream of a page.
pub fn rewrite_page(
    streams: &[PageStream],
    geometry: &PageGeometry,
    options: &CleanOptions,
    signatures: &TextSignatures,
) -> PageRewrite {
    let total_size: usize = streams.iter().map(PageStream::size).sum();
    let filter = StreamFilter::new(geometry, signatures);
    let mut page = PageRewrite::default();

    for stream in streams {
        let data = match &stream.data {
            StreamData::Decoded(data) => data,
            StreamData::Undecodable { reason, .. } => {
                debug!("stream {:?} kept undecoded: {}", stream.id, reason);
                page.failed_streams += 1;
                page.contents.push(ContentOutput::Original(stream.id));
                continue;
            }
        };

        let stats = StreamStats::scan(data, options.streams.right_edge_x);
        // Streams written by an earlier pass skip the wholesale verdicts.
        let verdict = if stream.filtered {
            StreamVerdict::Filter { mixed: false }
        } else {
            classify_stream(&stats, total_size, &options.streams)
        };
        match verdict {
            StreamVerdict::Drop(reason) => {
                debug!(
                    "stream {:?} dropped ({}): {} bytes of {}, {} text shows",
                    stream.id, reason, stats.size, total_size, stats.text_ops
                );
                page.streams_removed += 1;
                page.reasons.push(reason);
            }
            StreamVerdict::Filter { mixed } => {
                if mixed {
                    debug!(
                        "stream {:?} mixes watermark signals with {} text shows",
                        stream.id, stats.text_ops
                    );
                    page.mixed_streams += 1;
                }

                let filtered = filter.filter(data);
                if filtered.changed() {
                    page.operators_removed += filtered.removed.len();
                    page.reasons.extend(filtered.removed);
                    page.contents.push(ContentOutput::Rewritten(filtered.content));
                } else {
                    page.contents.push(ContentOutput::Original(stream.id));
                }
            }
        }
    }

    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::geometry::{Band, BoundingBox};
    use crate::options::RegionConfig;

    fn a4() -> PageGeometry {
        PageGeometry::resolve(
            BoundingBox::new(0.0, 0.0, 595.0, 842.0),
            &RegionConfig::default(),
        )
        .unwrap()
    }

    fn filter_str(src: &str) -> FilteredStream {
        let geometry = a4();
        let signatures = TextSignatures::default();
        StreamFilter::new(&geometry, &signatures).filter(src.as_bytes())
    }

    fn body_lines(count: usize, start_y: f64) -> String {
        let mut out = format!("BT /F1 10 Tf 1 0 0 1 72 {} Tm\n", start_y);
        for i in 0..count {
            out.push_str(&format!(
                "(Body line {:02} of the agreement text) Tj 0 -12 Td\n",
                i
            ));
        }
        out.push_str("ET\n");
        out
    }

    fn graphics_only(len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        while out.len() + 8 <= len {
            out.extend_from_slice(b"0 0 m S\n");
        }
        out.resize(len, b' ');
        out
    }

    #[test]
    fn test_unchanged_stream_is_byte_identical() {
        let src = body_lines(5, 600.0);
        let filtered = filter_str(&src);
        assert!(!filtered.changed());
        assert_eq!(filtered.content, src.as_bytes());
    }

    #[test]
    fn test_content_preservation() {
        let mut src = String::from("BT 1 0 0 1 72 800 Tm (Running header) Tj ET\n");
        src.push_str("BT 1 0 0 1 72 500 Tm\n");
        for i in 0..10 {
            src.push_str(&format!("(Clause {} applies) Tj 0 -14 Td\n", i));
        }
        src.push_str("ET\nBT 1 0 0 1 290 30 Tm (4) Tj ET\n");

        let filtered = filter_str(&src);
        let out = String::from_utf8(filtered.content).unwrap();

        assert!(!out.contains("Running header"));
        assert!(!out.contains("(4) Tj"));
        let mut cursor = 0;
        for i in 0..10 {
            let needle = format!("(Clause {} applies) Tj", i);
            let at = out[cursor..].find(&needle).unwrap();
            cursor += at + needle.len();
        }
        assert_eq!(
            filtered.removed,
            vec![
                RemovalReason::OutOfRegion(Band::Header),
                RemovalReason::OutOfRegion(Band::Footer),
            ]
        );
    }

    #[test]
    fn test_graphics_operators_never_removed() {
        let src = "BT 1 0 0 1 72 800 Tm /F1 12 Tf 0 0 1 rg (Head) Tj ET q 0 800 m 595 800 l S Q";
        let filtered = filter_str(src);
        assert_eq!(
            String::from_utf8(filtered.content).unwrap(),
            "BT 1 0 0 1 72 800 Tm /F1 12 Tf 0 0 1 rg ET q 0 800 m 595 800 l S Q"
        );
    }

    #[test]
    fn test_signatures_in_body() {
        let filtered = filter_str(
            "BT 1 0 0 1 72 400 Tm (12) Tj (Article 12) Tj [(______)] TJ (co-operate) Tj ET",
        );
        assert_eq!(
            String::from_utf8(filtered.content).unwrap(),
            "BT 1 0 0 1 72 400 Tm (Article 12) Tj (co-operate) Tj ET"
        );
        assert_eq!(
            filtered.removed,
            vec![RemovalReason::PageNumber, RemovalReason::DecorativeLine]
        );
    }

    #[test]
    fn test_encoded_footer_only_on_footer_offset() {
        let config = RegionConfig {
            footer_fraction: 0.02,
            ..RegionConfig::default()
        };
        let geometry =
            PageGeometry::resolve(BoundingBox::new(0.0, 0.0, 595.0, 842.0), &config).unwrap();
        let signatures = TextSignatures::default();
        let filter = StreamFilter::new(&geometry, &signatures);

        let on_offset = filter.filter(b"BT 1 0 0 1 72 28.3 Tm [<0015002D>] TJ ET");
        assert_eq!(on_offset.removed, vec![RemovalReason::EncodedFooter]);

        let in_body = filter.filter(b"BT 1 0 0 1 72 400 Tm [<0015002D>] TJ ET");
        assert!(!in_body.changed());
    }

    #[test]
    fn test_quote_operators_keep_line_advance() {
        let filtered = filter_str("BT 1 0 0 1 72 800 Tm (Head) ' ET");
        assert_eq!(
            String::from_utf8(filtered.content).unwrap(),
            "BT 1 0 0 1 72 800 Tm T* ET"
        );

        let filtered = filter_str("BT 1 0 0 1 72 40 Tm 1 0.5 (Foot) \" ET");
        assert_eq!(
            String::from_utf8(filtered.content).unwrap(),
            "BT 1 0 0 1 72 40 Tm 1 Tw 0.5 Tc T* ET"
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut src = String::from("BT 1 0 0 1 72 820 Tm (Header) ' ET\n");
        src.push_str(&body_lines(12, 650.0));
        src.push_str("BT 1 0 0 1 72 400 Tm (3) Tj [(- - -)] TJ ET\n");

        let once = filter_str(&src);
        assert!(once.changed());
        let twice = filter_str(std::str::from_utf8(&once.content).unwrap());
        assert!(!twice.changed());
        assert_eq!(twice.content, once.content);
    }

    /// Feed a rewrite back in the way a backend returns it on the next load.
    fn reload(streams: &[PageStream], page: &PageRewrite) -> Vec<PageStream> {
        page.contents
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                ContentOutput::Original(id) => streams
                    .iter()
                    .find(|stream| stream.id == *id)
                    .cloned()
                    .unwrap(),
                ContentOutput::Rewritten(bytes) => {
                    PageStream::filtered((900 + index as u32, 0), bytes.clone())
                }
            })
            .collect()
    }

    #[test]
    fn test_second_pass_keeps_retained_body_text() {
        let geometry = a4();
        let signatures = TextSignatures::default();
        let options = CleanOptions::default();

        let mut headed = String::new();
        for i in 0..20 {
            headed.push_str(&format!("BT 1 0 0 1 72 {} Tm (Running title {}) Tj ET\n", 830 - i, i));
        }
        headed.push_str(&body_lines(3, 300.0));
        let streams = vec![
            PageStream::decoded((1, 0), body_lines(55, 750.0).into_bytes()),
            PageStream::decoded((2, 0), headed.into_bytes()),
        ];

        let first = rewrite_page(&streams, &geometry, &options, &signatures);
        assert_eq!(first.streams_removed, 0);
        assert_eq!(first.operators_removed, 20);

        let reloaded = reload(&streams, &first);
        assert!(reloaded[1].filtered);
        let second = rewrite_page(&reloaded, &geometry, &options, &signatures);
        assert!(!second.is_modified());
        assert_eq!(
            second.contents,
            vec![ContentOutput::Original((1, 0)), ContentOutput::Original((901, 0))]
        );
        let StreamData::Decoded(kept) = &reloaded[1].data else {
            panic!("rewritten stream should be decoded");
        };
        let kept = String::from_utf8_lossy(kept);
        for i in 0..3 {
            assert!(kept.contains(&format!("(Body line {:02} of the agreement text) Tj", i)));
        }
    }

    #[test]
    fn test_unfiltered_sparse_stream_still_dropped() {
        let streams = vec![
            PageStream::decoded((1, 0), body_lines(55, 750.0).into_bytes()),
            PageStream::decoded((2, 0), body_lines(3, 300.0).into_bytes()),
        ];
        let page = rewrite_page(
            &streams,
            &a4(),
            &CleanOptions::default(),
            &TextSignatures::default(),
        );
        assert_eq!(page.reasons, vec![RemovalReason::LowDensityWatermark]);
        assert_eq!(page.contents, vec![ContentOutput::Original((1, 0))]);
    }

    #[test]
    fn test_three_stream_page() {
        let geometry = a4();
        let signatures = TextSignatures::default();
        let options = CleanOptions::default();

        let empty = graphics_only(200);
        let body = body_lines(40, 700.0);
        let mut mixed = body_lines(40, 700.0);
        mixed.push_str(&format!(
            "BT 1 0 0 1 297 {} Tm (7) Tj ET\n",
            geometry.footer_y_threshold - 0.5
        ));

        let total = empty.len() + body.len() + mixed.len();
        assert_eq!(empty.len(), 200);
        assert!((empty.len() as f64) < total as f64 * 0.05);
        assert!(body.len() > 1_800 && mixed.len() > 1_800);

        let streams = vec![
            PageStream::decoded((10, 0), empty),
            PageStream::decoded((11, 0), body.clone().into_bytes()),
            PageStream::decoded((12, 0), mixed.clone().into_bytes()),
        ];
        let page = rewrite_page(&streams, &geometry, &options, &signatures);

        assert!(page.is_modified());
        assert_eq!(page.streams_removed, 1);
        assert_eq!(page.operators_removed, 1);
        assert_eq!(page.failed_streams, 0);
        assert_eq!(
            page.reasons,
            vec![
                RemovalReason::EmptyContent,
                RemovalReason::OutOfRegion(Band::Footer),
            ]
        );

        let expected = mixed.replace(" (7) Tj", "");
        assert_eq!(
            page.contents,
            vec![
                ContentOutput::Original((11, 0)),
                ContentOutput::Rewritten(expected.into_bytes()),
            ]
        );
    }

    #[test]
    fn test_untouched_page_reuses_streams() {
        let streams = vec![
            PageStream::decoded((4, 0), body_lines(20, 700.0).into_bytes()),
            PageStream::decoded((5, 0), body_lines(20, 400.0).into_bytes()),
        ];
        let page = rewrite_page(
            &streams,
            &a4(),
            &CleanOptions::default(),
            &TextSignatures::default(),
        );
        assert!(!page.is_modified());
        assert_eq!(
            page.contents,
            vec![ContentOutput::Original((4, 0)), ContentOutput::Original((5, 0))]
        );
    }

    #[test]
    fn test_undecodable_stream_is_kept() {
        let streams = vec![
            PageStream {
                id: (4, 0),
                data: StreamData::Undecodable {
                    encoded_len: 50,
                    reason: "bad deflate".to_string(),
                },
                filtered: false,
            },
            PageStream::decoded((5, 0), body_lines(20, 700.0).into_bytes()),
        ];
        let page = rewrite_page(
            &streams,
            &a4(),
            &CleanOptions::default(),
            &TextSignatures::default(),
        );
        assert_eq!(page.failed_streams, 1);
        assert_eq!(page.streams_removed, 0);
        assert_eq!(page.contents[0], ContentOutput::Original((4, 0)));
    }
}
