//! Pipeline stages for image and PDF OCR.
//!
//! Each submodule wraps exactly one step of the call chain:
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ tesseract
//! (path)    (pdfium)   (PNG)      (subprocess)
//! ```
//!
//! 1. [`input`]     — check the path and sniff PDF vs image
//! 2. [`render`]    — rasterise one PDF page at the requested DPI; blocking,
//!    called from `spawn_blocking`
//! 3. [`encode`]    — write the rendered page as a PNG in a scratch directory
//! 4. [`tesseract`] — run the OCR engine on an image file and collect stdout
//!
//! Images skip straight from [`input`] to [`tesseract`].

pub mod encode;
pub mod input;
pub mod render;
pub mod tesseract;
