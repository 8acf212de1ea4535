//! Error type for the ocralign library.
//!
//! There is a single fatal error type, [`OcrError`]. The wrapper does not
//! classify, retry, or recover from failures of the external tools: a failure
//! on any page aborts the whole call, and the variant only records *which*
//! tool failed together with whatever it reported (exit status, stderr,
//! PDFium's error text).

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// All errors returned by the ocralign library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── OCR engine errors ─────────────────────────────────────────────────
    /// The OCR engine executable could not be found on `PATH`.
    #[error(
        "OCR engine '{program}' not found.\n\
Install Tesseract (e.g. `apt install tesseract-ocr`, `brew install tesseract`)\n\
or point TESSERACT_CMD / --tesseract-cmd at the executable."
    )]
    EngineNotFound { program: String },

    /// The OCR engine ran but exited unsuccessfully.
    #[error("OCR engine '{program}' failed ({status}): {stderr}")]
    EngineFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Spawning or waiting on the OCR engine failed for another reason.
    #[error("Failed to run OCR engine '{program}': {source}")]
    EngineIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDFium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// An explicit page selection matched none of the document's pages.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// PDFium failed to render a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered page could not be written as a PNG for the OCR engine.
    #[error("Failed to write page {page} image for OCR: {source}")]
    ImageWriteFailed {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If that failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ocralign_pdfium::PdfiumLocateError> for OcrError {
    fn from(e: ocralign_pdfium::PdfiumLocateError) -> Self {
        OcrError::PdfiumBindingFailed(e.to_string())
    }
}
