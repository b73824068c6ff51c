//! Document cleaning: the page loop and the file-level entry points.
//!
//! # Example
//!
//! ```no_run
//! use pdfstrip::{CleanOptions, FileCleaner};
//!
//! let cleaner = FileCleaner::new(CleanOptions::default().with_output_dir("out"));
//! let outcome = cleaner.clean("report.pdf");
//! println!("{}", outcome.message);
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::backend::{LopdfBackend, ObjectRef, PdfBackend};
use crate::content::{rewrite_page, PageGeometry, PageRewrite, TextSignatures};
use crate::detect::{check_supported, detect_format_from_path};
use crate::error::{Error, Result};
use crate::options::CleanOptions;
use crate::report::{CleanReport, PageReport};

/// Clean every page of an open document in place.
///
/// Page failures are logged and recorded in the page's report; they never
/// abort the document.
pub fn clean_document<B: PdfBackend + ?Sized>(
    backend: &mut B,
    options: &CleanOptions,
) -> CleanReport {
    let signatures = TextSignatures::new(options.signatures.clone());
    let pages = backend.pages();
    info!("Processing {} pages", pages.len());

    let mut reports = Vec::with_capacity(pages.len());
    for (number, page) in pages {
        reports.push(clean_page(backend, number, page, options, &signatures));
    }

    let report = CleanReport::from_pages(reports);
    info!(
        "Removed {} annotations and {} header/footer elements",
        report.annotations_removed(),
        report.elements_removed()
    );
    report
}

/// Clean one page: strip annotations, then filter its content.
pub fn clean_page<B: PdfBackend + ?Sized>(
    backend: &mut B,
    number: u32,
    page: ObjectRef,
    options: &CleanOptions,
    signatures: &TextSignatures,
) -> PageReport {
    let mut report = PageReport::new(number);

    if options.strip_annotations {
        match backend.remove_annotations(page) {
            Ok(0) => {}
            Ok(count) => {
                debug!("Page {}: removed {} annotations", number, count);
                report.annotations_removed = count;
            }
            Err(e) => warn!("Page {}: could not remove annotations: {}", number, e),
        }
    }

    let geometry = backend
        .media_box(page)
        .and_then(|bbox| PageGeometry::resolve(bbox, &options.regions));
    let Some(geometry) = geometry else {
        warn!("Page {}: no usable page box, content left untouched", number);
        report.skip("no page geometry");
        return report;
    };
    debug!(
        "Page {}: {} x {}, header_threshold={:.2}, footer_threshold={:.2}",
        number,
        geometry.page_width,
        geometry.page_height,
        geometry.header_y_threshold,
        geometry.footer_y_threshold
    );

    match clean_page_streams(backend, page, &geometry, options, signatures) {
        Ok(rewrite) => {
            if rewrite.is_modified() {
                debug!(
                    "Page {}: removed {} operators and {} streams",
                    number, rewrite.operators_removed, rewrite.streams_removed
                );
            }
            report.record(&rewrite);
        }
        Err(e) => {
            warn!("Page {}: content left untouched: {}", number, e);
            report.skip(e.to_string());
        }
    }

    report
}

/// Classify and filter the content streams of one page, writing the page's
/// content reference back only when something was removed.
pub fn clean_page_streams<B: PdfBackend + ?Sized>(
    backend: &mut B,
    page: ObjectRef,
    geometry: &PageGeometry,
    options: &CleanOptions,
    signatures: &TextSignatures,
) -> Result<PageRewrite> {
    let streams = backend.content_streams(page)?;
    let rewrite = rewrite_page(&streams, geometry, options, signatures);
    if rewrite.is_modified() {
        backend.replace_contents(page, &rewrite.contents)?;
    }
    Ok(rewrite)
}

/// Outcome of cleaning one file.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub success: bool,
    /// Human-readable summary or failure reason
    pub message: String,
    pub output_path: Option<PathBuf>,
    /// Full counters, present on success
    pub report: Option<CleanReport>,
}

/// Cleans PDF files on disk, writing `cleaned_<stem>.pdf` into the output
/// directory.
#[derive(Debug, Clone, Default)]
pub struct FileCleaner {
    options: CleanOptions,
}

impl FileCleaner {
    pub fn new(options: CleanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    /// Output location for `input`.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.options.output_dir.join(format!("cleaned_{}.pdf", stem))
    }

    /// Clean `path`, returning the typed error on failure.
    pub fn try_clean<P: AsRef<Path>>(&self, path: P) -> Result<CleanReport> {
        let path = path.as_ref();
        self.options.validate()?;
        check_supported(path)?;
        let format = detect_format_from_path(path)?;
        info!("Cleaning {} ({})", path.display(), format);

        let original_size = fs::metadata(path)?.len();
        let mut backend = LopdfBackend::load_file(path)?;
        let mut report = clean_document(&mut backend, &self.options);

        fs::create_dir_all(&self.options.output_dir)?;
        let output = self.output_path_for(path);
        backend.save(&output, self.options.compress)?;
        let cleaned_size = fs::metadata(&output)?.len();

        report.original_size = Some(original_size);
        report.cleaned_size = Some(cleaned_size);
        report.output_path = Some(output);
        if let Some(reduction) = report.size_reduction() {
            info!(
                "Original size: {} bytes, Cleaned size: {} bytes, Reduction: {:.1}%",
                original_size, cleaned_size, reduction
            );
        }
        Ok(report)
    }

    /// Clean `path`, folding any error into the outcome.
    pub fn clean<P: AsRef<Path>>(&self, path: P) -> CleanOutcome {
        let path = path.as_ref();
        match self.try_clean(path) {
            Ok(report) => CleanOutcome {
                success: true,
                message: report.summary(),
                output_path: report.output_path.clone(),
                report: Some(report),
            },
            Err(e) => failed(path, e),
        }
    }

    /// Clean several independent files in parallel. Outcomes are returned in
    /// input order.
    ///
    /// Inputs that would overwrite the output of an earlier input in the same
    /// batch (`a/report.pdf` and `b/report.pdf`) fail without being read.
    pub fn clean_all<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<CleanOutcome> {
        let conflicts = self.output_conflicts(paths);
        paths
            .par_iter()
            .zip(conflicts)
            .map(|(path, conflict)| match conflict {
                Some(e) => failed(path.as_ref(), e),
                None => self.clean(path),
            })
            .collect()
    }

    fn output_conflicts<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<Option<Error>> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::with_capacity(paths.len());
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                match claimed.entry(self.output_path_for(path)) {
                    Entry::Occupied(first) => Some(Error::OutputConflict {
                        output: first.key().clone(),
                        input: first.get().to_path_buf(),
                    }),
                    Entry::Vacant(slot) => {
                        slot.insert(path);
                        None
                    }
                }
            })
            .collect()
    }
}

fn failed(path: &Path, e: Error) -> CleanOutcome {
    warn!("Failed to clean {}: {}", path.display(), e);
    CleanOutcome {
        success: false,
        message: failure_message(&e),
        output_path: None,
        report: None,
    }
}

fn failure_message(err: &Error) -> String {
    match err {
        Error::FileNotFound(_) | Error::UnsupportedFormat(_) => err.to_string(),
        _ => format!("Error cleaning PDF: {}", err),
    }
}
