//! Public entry points: OCR an image, OCR a PDF, write the result.
//!
//! A PDF is processed strictly one page at a time: render page *i*, write it
//! as a PNG, run Tesseract on it, delete the PNG, then move on. Only one
//! rendered page is ever held in memory. The whole loop runs on one
//! `spawn_blocking` thread because pdfium handles cannot cross threads; the
//! Tesseract subprocess is awaited from there through the runtime handle.
//!
//! Any failure aborts the run and is returned unchanged.

use crate::config::{OcrConfig, PageSelection, PageSeparator, MAX_DPI, MIN_DPI};
use crate::error::OcrError;
use crate::output::{assemble_text, DocumentMetadata, OcrOutput, OcrStats, PageText};
use crate::pipeline::{encode, input, render, tesseract};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tokio::runtime::Handle;
use tracing::{debug, error, info};

/// OCR a single image file and return its text.
///
/// The image is passed to Tesseract as-is; any format the engine's
/// leptonica build reads (PNG, JPEG, TIFF, …) works.
///
/// # Errors
/// - [`OcrError::FileNotFound`] / [`OcrError::PermissionDenied`]
/// - [`OcrError::EngineNotFound`] when Tesseract is not installed
/// - [`OcrError::EngineFailed`] when Tesseract rejects the file
pub async fn ocr_image(
    path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<String, OcrError> {
    let resolved = input::resolve_input(path.as_ref())?;
    debug!("OCR image {}", resolved.path.display());
    tesseract::recognise(&resolved.path, config, None).await
}

/// OCR an in-memory image.
///
/// The image goes through the same PNG hand-off as rendered PDF pages.
pub async fn ocr_dynamic_image(
    image: &DynamicImage,
    config: &OcrConfig,
) -> Result<String, OcrError> {
    let scratch = scratch_dir()?;
    let png = encode::write_page_png(image, scratch.path(), 1)
        .map_err(|source| OcrError::ImageWriteFailed { page: 1, source })?;
    tesseract::recognise(&png, config, None).await
}

/// OCR every selected page of a PDF.
///
/// Pages are rendered at `config.dpi` and returned in page order, one
/// [`PageText`] per rendered page.
///
/// # Errors
/// The first failure from pdfium or Tesseract, e.g.
/// [`OcrError::CorruptPdf`], [`OcrError::PasswordRequired`],
/// [`OcrError::EngineFailed`]. [`OcrError::PageOutOfRange`] when an explicit
/// page selection matches no page.
pub async fn ocr_pdf(
    path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<OcrOutput, OcrError> {
    let path = path.as_ref();
    info!("Starting PDF processing for: {}", path.display());

    let result = run_pdf(path, config).await;
    if let Err(ref e) = result {
        error!("Failed to process PDF: {}", e);
    }
    result
}

/// OCR a PDF and write the assembled text to `output_path`.
///
/// The file layout follows `config.page_separator`. The per-page texts are
/// returned as well.
pub async fn ocr_pdf_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<OcrOutput, OcrError> {
    let output = ocr_pdf(path, config).await?;
    write_pages(output_path, &output.pages, &config.page_separator).await?;
    Ok(output)
}

/// OCR a PDF at `dpi` with otherwise default settings.
///
/// With `output_path`, the text is also written there using the default
/// page-header layout.
///
/// # Errors
/// [`OcrError::InvalidConfig`] when `dpi` is outside
/// [`MIN_DPI`]`..=`[`MAX_DPI`]; unlike the builder, the value is not clamped.
pub async fn process_pdf(
    path: impl AsRef<Path>,
    dpi: u32,
    output_path: Option<&Path>,
) -> Result<Vec<String>, OcrError> {
    if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
        return Err(OcrError::InvalidConfig(format!(
            "DPI must be {MIN_DPI}–{MAX_DPI}, got {dpi}"
        )));
    }
    let config = OcrConfig::builder().dpi(dpi).build()?;
    let output = match output_path {
        Some(out) => ocr_pdf_to_file(path, out, &config).await?,
        None => ocr_pdf(path, &config).await?,
    };
    Ok(output.into_texts())
}

/// Write page texts to `output_path`.
///
/// The text is written to a temporary sibling file and renamed into place,
/// so readers never see a partial file. Missing parent directories are
/// created. The content depends only on `pages` and `separator`.
pub async fn write_pages(
    output_path: impl AsRef<Path>,
    pages: &[PageText],
    separator: &PageSeparator,
) -> Result<(), OcrError> {
    let path = output_path.as_ref();
    let text = assemble_text(pages, separator);
    let write_err = |source: std::io::Error| OcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = temp_sibling(path);
    tokio::fs::write(&tmp_path, text.as_bytes())
        .await
        .map_err(write_err)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    info!("Output written to file {}.", path.display());
    Ok(())
}

/// Read PDF metadata and page count without running OCR.
pub async fn inspect(
    path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentMetadata, OcrError> {
    let resolved = input::resolve_input(path.as_ref())?;
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || render::read_metadata(&resolved.path, pwd.as_deref()))
        .await
        .map_err(|e| OcrError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Synchronous wrapper around [`ocr_image`].
///
/// Creates a temporary tokio runtime internally; do not call from async code.
pub fn ocr_image_sync(path: impl AsRef<Path>, config: &OcrConfig) -> Result<String, OcrError> {
    new_runtime()?.block_on(ocr_image(path, config))
}

/// Synchronous wrapper around [`ocr_pdf`].
///
/// Creates a temporary tokio runtime internally; do not call from async code.
pub fn ocr_pdf_sync(path: impl AsRef<Path>, config: &OcrConfig) -> Result<OcrOutput, OcrError> {
    new_runtime()?.block_on(ocr_pdf(path, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn new_runtime() -> Result<tokio::runtime::Runtime, OcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))
}

fn scratch_dir() -> Result<TempDir, OcrError> {
    tempfile::Builder::new()
        .prefix("ocralign-")
        .tempdir()
        .map_err(|e| OcrError::Internal(format!("Failed to create scratch directory: {}", e)))
}

/// `dir/.name.tmp` next to `path`, so the final rename stays on one filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

async fn run_pdf(path: &Path, config: &OcrConfig) -> Result<OcrOutput, OcrError> {
    let resolved = input::resolve_input(path)?;
    let config = config.clone();
    let handle = Handle::current();

    tokio::task::spawn_blocking(move || ocr_pages_blocking(&resolved.path, &config, &handle))
        .await
        .map_err(|e| OcrError::Internal(format!("OCR task panicked: {}", e)))?
}

fn ocr_pages_blocking(
    pdf_path: &Path,
    config: &OcrConfig,
    handle: &Handle,
) -> Result<OcrOutput, OcrError> {
    let total_start = Instant::now();
    let pdfium = render::bind()?;
    let document = render::open_document(&pdfium, pdf_path, config.password.as_deref())?;
    let metadata = render::document_metadata(&document);
    let total_pages = metadata.page_count;
    info!("Opened PDF with {} page(s)", total_pages);

    let indices = config.pages.to_indices(total_pages);
    if indices.is_empty() && config.pages != PageSelection::All {
        return Err(OcrError::PageOutOfRange {
            page: config.pages.first_requested(),
            total: total_pages,
        });
    }
    let selected = indices.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(selected);
    }

    let scratch = scratch_dir()?;
    let render_config = render::render_config(config.dpi, config.max_rendered_pixels);
    let mut pages = Vec::with_capacity(selected);
    let mut render_duration_ms = 0u64;
    let mut ocr_duration_ms = 0u64;

    for idx in indices {
        let page_num = idx + 1;
        debug!("Processing page {}", page_num);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        let page_start = Instant::now();
        let (png, dpi) = {
            let rendered = render::render_page(&document, idx, config.dpi, &render_config)?;
            let png = encode::write_page_png(&rendered.image, scratch.path(), page_num)
                .map_err(|source| OcrError::ImageWriteFailed {
                    page: page_num,
                    source,
                })?;
            (png, rendered.effective_dpi)
        };
        let render_ms = page_start.elapsed().as_millis() as u64;

        let ocr_start = Instant::now();
        let text = handle.block_on(tesseract::recognise(&png, config, Some(dpi)))?;
        let ocr_ms = ocr_start.elapsed().as_millis() as u64;
        let _ = std::fs::remove_file(&png);

        debug!(
            "Extracted text from page {} ({} chars, render {}ms, ocr {}ms)",
            page_num,
            text.chars().count(),
            render_ms,
            ocr_ms
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, selected, text.chars().count());
        }

        render_duration_ms += render_ms;
        ocr_duration_ms += ocr_ms;
        pages.push(PageText {
            page_num,
            text,
            duration_ms: render_ms + ocr_ms,
        });
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(selected);
    }

    let stats = OcrStats {
        total_pages,
        processed_pages: pages.len(),
        total_chars: pages.iter().map(|p| p.text.chars().count()).sum(),
        render_duration_ms,
        ocr_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "OCR complete: {}/{} pages, {} chars, {}ms",
        stats.processed_pages, total_pages, stats.total_chars, stats.total_duration_ms
    );

    Ok(OcrOutput {
        pages,
        metadata,
        stats,
    })
}
