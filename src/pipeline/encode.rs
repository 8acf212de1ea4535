//! Image hand-off: write a rendered page as a PNG the OCR engine can read.
//!
//! Tesseract takes a file path, so each rendered page is written into a
//! scratch directory owned by the caller and read back by the engine. PNG is
//! lossless; JPEG artefacts around glyph edges measurably hurt recognition.
//! The alpha channel is dropped because PDF pages are rendered opaque.

use image::{DynamicImage, ImageFormat};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `img` as `page-NNNN.png` inside `dir` and return the file path.
pub fn write_page_png(
    img: &DynamicImage,
    dir: &Path,
    page_num: usize,
) -> Result<PathBuf, image::ImageError> {
    let path = dir.join(format!("page-{page_num:04}.png"));
    let mut out = BufWriter::new(File::create(&path)?);

    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => {
            img.write_to(&mut out, ImageFormat::Png)?
        }
        _ => DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut out, ImageFormat::Png)?,
    }

    debug!(
        "Wrote page {} image {}x{} → {}",
        page_num,
        img.width(),
        img.height(),
        path.display()
    );
    Ok(path)
}
