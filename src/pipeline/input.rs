//! Input resolution: validate a user-supplied path and sniff what it holds.
//!
//! PDFium and Tesseract both want a file-system path, so input handling is
//! limited to checking that path up front. A missing or unreadable file then
//! surfaces as [`OcrError::FileNotFound`] / [`OcrError::PermissionDenied`]
//! instead of a less helpful error from deep inside an external tool.

use crate::error::OcrError;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What kind of document a path holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputKind {
    /// Starts with the `%PDF` magic.
    Pdf,
    /// Anything else; handed to the OCR engine as an image.
    Image,
}

/// A validated local input file.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub kind: InputKind,
}

/// Classify a file by its first bytes.
pub fn sniff_kind(head: &[u8]) -> InputKind {
    if head.starts_with(b"%PDF") {
        InputKind::Pdf
    } else {
        InputKind::Image
    }
}

/// Validate that `path` exists and is readable, and detect its kind.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput, OcrError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(OcrError::FileNotFound { path });
    }

    let mut head = [0u8; 4];
    // A directory opens fine on unix and only fails on read.
    let read = match std::fs::File::open(&path).and_then(|mut f| f.read(&mut head)) {
        Ok(n) => n,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(OcrError::PermissionDenied { path });
        }
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            return Err(OcrError::FileNotFound { path });
        }
    };

    let kind = sniff_kind(&head[..read]);
    debug!("Resolved input {} as {:?}", path.display(), kind);
    Ok(ResolvedInput { path, kind })
}
