//! Error types for pdfstrip library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfstrip operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while cleaning a document.
///
/// Only document-level failures surface as an `Error`. Page and stream
/// failures are recovered inside the cleaner and show up in the report counters.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file extension is not one the cleaner handles.
    #[error("Unsupported file format: {0}. Only PDF is supported.")]
    UnsupportedFormat(String),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A required PDF object is missing.
    #[error("Missing required object: {0}")]
    MissingObject(String),

    /// A page's content reference could not be read or written.
    #[error("Invalid content reference on page object {object}: {reason}")]
    InvalidContents { object: u32, reason: String },

    /// Two inputs of one batch map to the same output file.
    #[error("Output {} is already written by {}", .output.display(), .input.display())]
    OutputConflict { output: PathBuf, input: PathBuf },

    /// Cleaning options are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
