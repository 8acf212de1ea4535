//! Configuration types for OCR runs.
//!
//! Every knob lives in [`OcrConfig`], built via [`OcrConfigBuilder`]. The
//! fields split into three groups: how PDF pages are rasterised (`dpi`,
//! `max_rendered_pixels`, `password`, `pages`), how Tesseract is invoked
//! (`language`, `page_segmentation_mode`, `engine_mode`, `tessdata_dir`,
//! `tesseract_cmd`, `tesseract_vars`), and how results are written
//! (`page_separator`, `progress_callback`).

use crate::error::OcrError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lowest accepted rendering resolution.
pub const MIN_DPI: u32 = 72;
/// Highest accepted rendering resolution.
pub const MAX_DPI: u32 = 600;

/// Configuration for an OCR run.
///
/// # Example
/// ```rust
/// use ocralign::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .dpi(200)
///     .language("eng+deu")
///     .page_segmentation_mode(6)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Rendering DPI for PDF pages. Range: 72–600. Default: 300.
    ///
    /// PDF user space is 72 units per inch, so pages are rendered at a scale
    /// factor of `dpi / 72`. Tesseract is tuned for text around 300 DPI;
    /// lower values lose small print, higher ones mostly cost time.
    pub dpi: u32,

    /// Optional cap on the rendered width and height, in pixels. Default: none.
    ///
    /// When set, a page whose `dpi` rendering would exceed the cap on either
    /// edge is scaled down to fit, keeping the aspect ratio.
    pub max_rendered_pixels: Option<u32>,

    /// Tesseract language(s), e.g. `"eng"` or `"eng+fra"`. Default: `"eng"`.
    pub language: String,

    /// Tesseract page segmentation mode (`--psm`, 0–13). Default: engine default.
    pub page_segmentation_mode: Option<u8>,

    /// Tesseract OCR engine mode (`--oem`, 0–3). Default: engine default.
    pub engine_mode: Option<u8>,

    /// Directory holding `*.traineddata` (`--tessdata-dir`). Default: engine default.
    pub tessdata_dir: Option<PathBuf>,

    /// Tesseract executable. If None, uses `$TESSERACT_CMD`, then `tesseract` on `PATH`.
    pub tesseract_cmd: Option<PathBuf>,

    /// Extra Tesseract variables passed as `-c key=value`.
    pub tesseract_vars: Vec<(String, String)>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// How pages are joined when written to a file. Default: page headers.
    pub page_separator: PageSeparator,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: None,
            language: "eng".to_string(),
            page_segmentation_mode: None,
            engine_mode: None,
            tessdata_dir: None,
            tesseract_cmd: None,
            tesseract_vars: Vec::new(),
            password: None,
            pages: PageSelection::default(),
            page_separator: PageSeparator::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("language", &self.language)
            .field("page_segmentation_mode", &self.page_segmentation_mode)
            .field("engine_mode", &self.engine_mode)
            .field("tessdata_dir", &self.tessdata_dir)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("tesseract_vars", &self.tesseract_vars)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("page_separator", &self.page_separator)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn OcrProgressCallback>"),
            )
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = Some(px.max(100));
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.page_segmentation_mode = Some(psm);
        self
    }

    pub fn engine_mode(mut self, oem: u8) -> Self {
        self.config.engine_mode = Some(oem);
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = Some(cmd.into());
        self
    }

    pub fn tesseract_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.tesseract_vars.push((key.into(), value.into()));
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if !(MIN_DPI..=MAX_DPI).contains(&c.dpi) {
            return Err(OcrError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if c.language.trim().is_empty() {
            return Err(OcrError::InvalidConfig("Language must not be empty".into()));
        }
        if let Some(psm) = c.page_segmentation_mode {
            if psm > 13 {
                return Err(OcrError::InvalidConfig(format!(
                    "Page segmentation mode must be 0–13, got {psm}"
                )));
            }
        }
        if let Some(oem) = c.engine_mode {
            if oem > 3 {
                return Err(OcrError::InvalidConfig(format!(
                    "Engine mode must be 0–3, got {oem}"
                )));
            }
        }
        if let Some((key, _)) = c
            .tesseract_vars
            .iter()
            .find(|(k, _)| k.is_empty() || k.contains('='))
        {
            return Err(OcrError::InvalidConfig(format!(
                "Invalid Tesseract variable name '{key}'"
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to OCR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if (1..=total_pages).contains(p) {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| (1..=total_pages).contains(&p))
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// The first page this selection names, for error reporting.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}

/// How pages are joined in the written text file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// `-- Page N --` header before each page, text trimmed, blank line after. (default)
    #[default]
    Header,
    /// Form feed (`\x0c`) between pages, text untouched.
    FormFeed,
    /// Plain concatenation of the page texts.
    None,
    /// Custom string on its own line between pages.
    Custom(String),
}
