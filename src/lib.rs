//! # pdfstrip
//!
//! Header, footer and watermark removal for PDF documents.
//!
//! The library walks every page of a document, drops annotations, and
//! rewrites the page's content streams without the text drawn in the header
//! and footer bands, bare page numbers, ruled lines and small decorative
//! streams. Body text is copied byte for byte.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfstrip::clean_file;
//!
//! fn main() -> pdfstrip::Result<()> {
//!     let report = clean_file("document.pdf")?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Region filtering**: header/footer bands derived from each page's box
//! - **Stream classification**: small text-free, rotated or sparse streams
//! - **Content signatures**: page numbers, ruled lines, encoded footer runs
//! - **Parallel batches**: independent files are cleaned with Rayon
//! - **Reports**: per-page counters, serializable to JSON

pub mod backend;
pub mod cleaner;
pub mod content;
pub mod detect;
pub mod error;
pub mod options;
pub mod report;

// Re-export commonly used types
pub use backend::{ContentOutput, LopdfBackend, ObjectRef, PageStream, PdfBackend, StreamData};
pub use cleaner::{clean_document, clean_page, clean_page_streams, CleanOutcome, FileCleaner};
pub use content::{Band, BoundingBox, PageGeometry, RemovalDecision, RemovalReason};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_bytes, PdfFormat};
pub use error::{Error, Result};
pub use options::{CleanOptions, RegionConfig, SignatureLimits, StreamThresholds};
pub use report::{CleanReport, CleanTotals, JsonFormat, PageReport};

use std::path::Path;

/// Clean a PDF file with default options.
///
/// The result is written to `temp/cleaned/cleaned_<stem>.pdf`.
///
/// # Example
///
/// ```no_run
/// use pdfstrip::clean_file;
///
/// let report = clean_file("document.pdf").unwrap();
/// println!("Removed {} elements", report.elements_removed());
/// ```
pub fn clean_file<P: AsRef<Path>>(path: P) -> Result<CleanReport> {
    FileCleaner::default().try_clean(path)
}

/// Clean a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfstrip::{clean_file_with_options, CleanOptions};
///
/// let options = CleanOptions::new()
///     .with_output_dir("out")
///     .with_header_fraction(0.92)
///     .keep_annotations();
/// let report = clean_file_with_options("document.pdf", options).unwrap();
/// ```
pub fn clean_file_with_options<P: AsRef<Path>>(
    path: P,
    options: CleanOptions,
) -> Result<CleanReport> {
    FileCleaner::new(options).try_clean(path)
}

/// Clean a PDF held in memory and return the cleaned bytes.
///
/// `options.output_dir` is ignored.
///
/// # Example
///
/// ```no_run
/// use pdfstrip::{clean_bytes, CleanOptions};
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let (cleaned, report) = clean_bytes(&data, &CleanOptions::default()).unwrap();
/// std::fs::write("cleaned.pdf", cleaned).unwrap();
/// ```
pub fn clean_bytes(data: &[u8], options: &CleanOptions) -> Result<(Vec<u8>, CleanReport)> {
    options.validate()?;
    detect_format_from_bytes(data)?;
    let mut backend = LopdfBackend::load_bytes(data)?;
    let mut report = clean_document(&mut backend, options);
    let cleaned = backend.save_to_bytes(options.compress)?;
    report.original_size = Some(data.len() as u64);
    report.cleaned_size = Some(cleaned.len() as u64);
    Ok((cleaned, report))
}
