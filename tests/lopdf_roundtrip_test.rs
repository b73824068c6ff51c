//! End-to-end tests: write a real PDF, clean it from disk, and read it back.

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use pdfstrip::{clean_bytes, CleanOptions, Error, FileCleaner};
use tempfile::TempDir;

const HEADER: &str = "BT /F1 9 Tf 1 0 0 1 72 800 Tm (Quarterly Report - Draft) Tj ET\n";
const FOOTER: &str = "BT /F1 9 Tf 1 0 0 1 290 30 Tm (3) Tj ET\n";

fn body(page: usize) -> String {
    let mut out = String::from("BT /F1 11 Tf 1 0 0 1 72 700 Tm\n");
    for line in 0..20 {
        out.push_str(&format!("(Page {} paragraph line {}) Tj 0 -14 Td\n", page, line));
    }
    out.push_str("ET\n");
    out
}

/// Two A4 pages, each with a header, a footer and one link annotation.
fn sample_document() -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in 1..=2 {
        let content = format!("{}{}{}", HEADER, body(page), FOOTER);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![72.into(), 20.into(), 200.into(), 40.into()],
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Annots" => vec![Object::Reference(annot_id)],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn write_sample(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    sample_document().save(&path).unwrap();
    path
}

fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

#[test]
fn test_clean_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(dir.path(), "sample.pdf");
    let output_dir = dir.path().join("cleaned");

    let cleaner = FileCleaner::new(CleanOptions::default().with_output_dir(&output_dir));
    let outcome = cleaner.clean(&input);

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(
        outcome.message,
        "PDF cleaned successfully. Removed 2 annotations and 4 header/footer elements."
    );
    let output = outcome.output_path.unwrap();
    assert_eq!(output, output_dir.join("cleaned_sample.pdf"));

    let cleaned = Document::load(&output).unwrap();
    for (index, page_id) in page_ids(&cleaned).into_iter().enumerate() {
        let content = String::from_utf8(cleaned.get_page_content(page_id).unwrap()).unwrap();
        assert!(content.contains(&body(index + 1)));
        assert!(!content.contains("Quarterly Report"));
        assert!(!content.contains("(3) Tj"));

        let page = cleaned.get_dictionary(page_id).unwrap();
        assert!(!page.has(b"Annots"));
    }
}

#[test]
fn test_report_counters() {
    let dir = TempDir::new().unwrap();
    let input = write_sample(dir.path(), "counters.pdf");

    let cleaner = FileCleaner::new(CleanOptions::default().with_output_dir(dir.path()));
    let report = cleaner.try_clean(&input).unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.totals.operators_removed, 4);
    assert_eq!(report.totals.streams_removed, 0);
    assert_eq!(report.totals.pages_skipped, 0);
    assert!(report.original_size.unwrap() > 0);
    assert!(report.cleaned_size.unwrap() > 0);
    for page in &report.page_reports {
        assert_eq!(page.reasons["out-of-region:header"], 1);
        assert_eq!(page.reasons["out-of-region:footer"], 1);
    }
}

#[test]
fn test_clean_bytes() {
    let mut source = Vec::new();
    sample_document().save_to(&mut source).unwrap();

    let options = CleanOptions::default().keep_annotations();
    let (cleaned, report) = clean_bytes(&source, &options).unwrap();
    assert_eq!(report.annotations_removed(), 0);
    assert_eq!(report.elements_removed(), 4);

    let doc = Document::load_mem(&cleaned).unwrap();
    let first = page_ids(&doc)[0];
    assert!(doc.get_dictionary(first).unwrap().has(b"Annots"));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.pdf");

    let outcome = FileCleaner::default().clean(&missing);
    assert!(!outcome.success);
    assert!(outcome.output_path.is_none());
    assert_eq!(
        outcome.message,
        format!("File not found: {}", missing.display())
    );
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let docx = dir.path().join("letter.docx");
    std::fs::write(&docx, b"PK\x03\x04").unwrap();

    let cleaner = FileCleaner::new(CleanOptions::default().with_output_dir(dir.path()));
    assert!(matches!(
        cleaner.try_clean(&docx),
        Err(Error::UnsupportedFormat(ext)) if ext == ".docx"
    ));

    let outcome = cleaner.clean(&docx);
    assert!(!outcome.success);
    assert_eq!(
        outcome.message,
        "Unsupported file format: .docx. Only PDF is supported."
    );
}

#[test]
fn test_not_a_pdf() {
    let dir = TempDir::new().unwrap();
    let fake = dir.path().join("fake.pdf");
    std::fs::write(&fake, b"just some text").unwrap();

    let cleaner = FileCleaner::new(CleanOptions::default().with_output_dir(dir.path()));
    assert!(matches!(cleaner.try_clean(&fake), Err(Error::UnknownFormat)));
    assert!(!dir.path().join("cleaned_fake.pdf").exists());
}

#[test]
fn test_clean_all_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let first = write_sample(dir.path(), "first.pdf");
    let missing = dir.path().join("second.pdf");
    let third = write_sample(dir.path(), "third.pdf");

    let cleaner =
        FileCleaner::new(CleanOptions::default().with_output_dir(dir.path().join("out")));
    let outcomes = cleaner.clean_all(&[first, missing, third]);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);
    assert!(outcomes[2].success);
    assert!(outcomes[2]
        .output_path
        .as_ref()
        .unwrap()
        .ends_with("cleaned_third.pdf"));
}

#[test]
fn test_clean_all_rejects_shared_output_name() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("a")).unwrap();
    std::fs::create_dir_all(dir.path().join("b")).unwrap();
    let first = write_sample(&dir.path().join("a"), "report.pdf");
    let second = write_sample(&dir.path().join("b"), "report.pdf");
    let out = dir.path().join("out");

    let cleaner = FileCleaner::new(CleanOptions::default().with_output_dir(&out));
    let outcomes = cleaner.clean_all(&[first.clone(), second]);

    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].output_path, Some(out.join("cleaned_report.pdf")));
    assert!(!outcomes[1].success);
    assert!(outcomes[1].output_path.is_none());
    assert_eq!(
        outcomes[1].message,
        format!(
            "Error cleaning PDF: Output {} is already written by {}",
            out.join("cleaned_report.pdf").display(),
            first.display()
        )
    );
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
}

#[test]
fn test_cleaning_twice_changes_nothing_more() {
    let mut source = Vec::new();
    sample_document().save_to(&mut source).unwrap();

    let (once, first) = clean_bytes(&source, &CleanOptions::default()).unwrap();
    assert_eq!(first.elements_removed(), 4);

    let (twice, second) = clean_bytes(&once, &CleanOptions::default()).unwrap();
    assert_eq!(second.elements_removed(), 0);
    assert_eq!(second.annotations_removed(), 0);

    let doc = Document::load_mem(&twice).unwrap();
    for (index, page_id) in page_ids(&doc).into_iter().enumerate() {
        let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
        assert!(content.contains(&body(index + 1)));
    }
}
