//! PDF rasterisation through pdfium.
//!
//! pdfium is not async-safe and its document handles borrow the bound
//! library, so everything here is synchronous and is called from inside
//! `tokio::task::spawn_blocking` by the conversion entry points.
//!
//! PDF user space is 72 units per inch: a page is rendered at a scale factor
//! of `dpi / 72`, optionally capped to `max_rendered_pixels` on either edge.

use crate::error::OcrError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Bind to the pdfium shared library (see `ocralign-pdfium` for lookup order).
pub fn bind() -> Result<Pdfium, OcrError> {
    Ok(ocralign_pdfium::bind_pdfium(None)?)
}

/// Open a PDF, translating pdfium's load errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, OcrError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let detail = format!("{:?}", e);
        if detail.contains("Password") || detail.contains("password") {
            if password.is_some() {
                OcrError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                OcrError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            OcrError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail,
            }
        }
    })
}

/// Number of pages in an open document.
pub fn page_count(document: &PdfDocument<'_>) -> usize {
    document.pages().len() as usize
}

/// Scale factor from PDF points to pixels at `dpi`.
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / 72.0
}

/// Render settings for every page of one run.
pub fn render_config(dpi: u32, max_rendered_pixels: Option<u32>) -> PdfRenderConfig {
    let config = PdfRenderConfig::new().scale_page_by_factor(scale_for_dpi(dpi));
    match max_rendered_pixels {
        Some(px) => config
            .set_maximum_width(px as i32)
            .set_maximum_height(px as i32),
        None => config,
    }
}

/// A rasterised page and the resolution it was actually rendered at.
pub struct RenderedPage {
    pub image: DynamicImage,
    /// Equals the requested DPI unless `max_rendered_pixels` shrank the page.
    pub effective_dpi: u32,
}

/// Rasterise the page at 0-based `idx`.
pub fn render_page(
    document: &PdfDocument<'_>,
    idx: usize,
    dpi: u32,
    render_config: &PdfRenderConfig,
) -> Result<RenderedPage, OcrError> {
    let page_num = idx + 1;
    let page = document
        .pages()
        .get(idx as u16)
        .map_err(|e| OcrError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| OcrError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    let long_edge_points = page.width().value.max(page.height().value);
    let dpi_used = effective_dpi(image.width().max(image.height()), long_edge_points, dpi);
    debug!(
        "Rendered page {} → {}x{} px @ {} dpi",
        page_num,
        image.width(),
        image.height(),
        dpi_used
    );
    Ok(RenderedPage {
        image,
        effective_dpi: dpi_used,
    })
}

/// Resolution implied by `pixels` spanning `points` (1/72 inch each).
fn effective_dpi(pixels: u32, points: f32, requested: u32) -> u32 {
    if points <= 0.0 {
        return requested;
    }
    ((pixels as f32 * 72.0 / points).round() as u32).clamp(1, requested)
}

/// Metadata and page count of an open document.
pub fn document_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty())
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: page_count(document),
        pdf_version: format!("{:?}", document.version()),
    }
}

/// Open `pdf_path` and read its metadata. Blocking.
pub fn read_metadata(pdf_path: &Path, password: Option<&str>) -> Result<DocumentMetadata, OcrError> {
    let pdfium = bind()?;
    let document = open_document(&pdfium, pdf_path, password)?;
    Ok(document_metadata(&document))
}
