//! Progress-callback trait for per-page OCR events.
//!
//! Inject an [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to be told when
//! each page of a PDF starts and finishes. The CLI uses it to drive its
//! progress bar; library users can forward the events anywhere.
//!
//! # Example
//!
//! ```rust
//! use ocralign::{OcrConfig, OcrProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     chars: AtomicUsize,
//! }
//!
//! impl OcrProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, chars: usize) {
//!         self.chars.fetch_add(chars, Ordering::Relaxed);
//!         eprintln!("page {page_num}/{total_pages}: {chars} chars");
//!     }
//! }
//!
//! let config = OcrConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { chars: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::ocr_pdf`] as it works through the pages of a document.
///
/// Pages are processed one at a time, in page order. All methods default to
/// no-ops so implementors only override what they need. `Send + Sync` lets
/// the config that holds the callback move into blocking tasks.
pub trait OcrProgressCallback: Send + Sync {
    /// Called once the page count is known, before the first page is rendered.
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is rasterised.
    ///
    /// `page_num` is 1-indexed; `total_pages` is the number of selected pages.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after the OCR engine returns the page text.
    ///
    /// `chars` is the character count of the recognised text.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Called once after the last page.
    fn on_document_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;
