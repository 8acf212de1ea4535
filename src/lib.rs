//! # ocralign
//!
//! Extract text from scanned PDFs and images with the Tesseract OCR engine.
//!
//! ## Why this crate?
//!
//! Scanned documents carry no text layer: `pdftotext` returns nothing and
//! Tesseract itself cannot read PDFs. This crate rasterises each PDF page
//! with pdfium at a chosen resolution, hands the page image to the
//! `tesseract` executable, and returns one text per page in page order.
//! Images skip the rendering step and go straight to the engine.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve the local file, sniff PDF vs. image
//!  ├─ 2. Render     rasterise one page via pdfium at dpi / 72 scale
//!  ├─ 3. Encode     write the page as a lossless PNG in a scratch dir
//!  ├─ 4. Tesseract  `tesseract <png> stdout -l <lang> --dpi <dpi>`
//!  └─ 5. Output     per-page texts + optional text file
//! ```
//!
//! Steps 2–4 run once per page, strictly in sequence, so only one rendered
//! page is held in memory at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocralign::{ocr_pdf_to_file, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OcrConfig::builder().dpi(300).language("eng").build()?;
//!     let output = ocr_pdf_to_file("scan.pdf", "scan.txt", &config).await?;
//!     for page in &output.pages {
//!         println!("page {}: {} chars", page.page_num, page.text.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Requirements
//!
//! * A `tesseract` executable on `PATH` (or `$TESSERACT_CMD`, or
//!   [`OcrConfig::tesseract_cmd`]) with the requested language data.
//! * The pdfium shared library. It is located, or downloaded once into the
//!   user cache, by the `ocralign-pdfium` crate.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocralign` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocralign = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrConfig, OcrConfigBuilder, PageSelection, PageSeparator, MAX_DPI, MIN_DPI};
pub use convert::{
    inspect, ocr_dynamic_image, ocr_image, ocr_image_sync, ocr_pdf, ocr_pdf_sync,
    ocr_pdf_to_file, process_pdf, write_pages,
};
pub use error::OcrError;
pub use output::{DocumentMetadata, OcrOutput, OcrStats, PageText};
pub use pipeline::input::InputKind;
pub use pipeline::tesseract::{tesseract_version, EngineInfo};
pub use progress::{NoopProgressCallback, OcrProgressCallback, ProgressCallback};
