//! Result types and document assembly.

use crate::config::PageSeparator;
use serde::{Deserialize, Serialize};

/// Recognised text for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// Text exactly as returned by the OCR engine.
    pub text: String,
    /// Wall-clock time for rendering and recognising this page.
    pub duration_ms: u64,
}

/// Document-level metadata read by pdfium.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Timing and volume figures for one PDF run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages rendered and recognised (the selected pages).
    pub processed_pages: usize,
    /// Characters across all page texts.
    pub total_chars: usize,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything [`crate::ocr_pdf`] produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    /// One entry per rendered page, in page order.
    pub pages: Vec<PageText>,
    pub metadata: DocumentMetadata,
    pub stats: OcrStats,
}

impl OcrOutput {
    /// Per-page texts in page order.
    pub fn texts(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.text.clone()).collect()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.pages.into_iter().map(|p| p.text).collect()
    }

    /// The document text as it would be written to a file.
    pub fn to_text(&self, separator: &PageSeparator) -> String {
        assemble_text(&self.pages, separator)
    }
}

/// Join page texts into one document.
///
/// * `Header` — `-- Page N --\n` + trimmed text + `\n\n` for each page.
/// * `FormFeed` — texts joined with `\x0c`.
/// * `None` — texts concatenated as-is.
/// * `Custom(s)` — texts joined with `\n{s}\n`.
pub fn assemble_text(pages: &[PageText], separator: &PageSeparator) -> String {
    match separator {
        PageSeparator::Header => {
            let mut doc = String::new();
            for page in pages {
                doc.push_str(&format!("-- Page {} --\n", page.page_num));
                doc.push_str(page.text.trim());
                doc.push_str("\n\n");
            }
            doc
        }
        PageSeparator::FormFeed => join_texts(pages, "\u{c}"),
        PageSeparator::None => join_texts(pages, ""),
        PageSeparator::Custom(s) => join_texts(pages, &format!("\n{s}\n")),
    }
}

fn join_texts(pages: &[PageText], sep: &str) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(sep)
}
