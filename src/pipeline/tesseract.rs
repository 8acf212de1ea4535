//! OCR engine call-through: run the Tesseract CLI on an image file.
//!
//! The engine is driven as a subprocess rather than through `libtesseract`
//! bindings, so nothing native has to be present at build time and any
//! installed Tesseract (3.05 through 5.x) works. The command line is:
//!
//! ```text
//! tesseract <image> stdout -l <lang> [--dpi N] [--psm N] [--oem N]
//!           [--tessdata-dir DIR] [-c key=value]...
//! ```
//!
//! Recognised text arrives on stdout. Tesseract terminates each page of text
//! output with a form feed (`\x0c`); that one marker is stripped, everything
//! else is returned exactly as the engine produced it.

use crate::config::OcrConfig;
use crate::error::OcrError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Program spawned when neither the config nor `$TESSERACT_CMD` names one.
pub const DEFAULT_PROGRAM: &str = "tesseract";

/// Resolve the Tesseract executable: config, then `$TESSERACT_CMD`, then `PATH`.
pub fn resolve_program(configured: Option<&Path>) -> PathBuf {
    if let Some(p) = configured {
        return p.to_path_buf();
    }
    std::env::var_os("TESSERACT_CMD")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM))
}

/// Build the argument vector for one recognition run.
///
/// `dpi` is passed for rendered PDF pages, whose PNGs carry no resolution
/// metadata; for user-supplied images Tesseract reads it from the file.
pub fn build_args(image: &Path, config: &OcrConfig, dpi: Option<u32>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        image.as_os_str().to_owned(),
        "stdout".into(),
        "-l".into(),
        config.language.clone().into(),
    ];

    if let Some(dpi) = dpi {
        args.push("--dpi".into());
        args.push(dpi.to_string().into());
    }
    if let Some(psm) = config.page_segmentation_mode {
        args.push("--psm".into());
        args.push(psm.to_string().into());
    }
    if let Some(oem) = config.engine_mode {
        args.push("--oem".into());
        args.push(oem.to_string().into());
    }
    if let Some(ref dir) = config.tessdata_dir {
        args.push("--tessdata-dir".into());
        args.push(dir.as_os_str().to_owned());
    }
    for (key, value) in &config.tesseract_vars {
        args.push("-c".into());
        args.push(format!("{key}={value}").into());
    }

    args
}

/// Decode engine stdout and drop the trailing page-separator form feed.
pub fn normalise_output(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    match text.strip_suffix('\u{c}') {
        Some(stripped) => stripped.to_string(),
        None => text.into_owned(),
    }
}

/// Run Tesseract on `image` and return the recognised text.
pub async fn recognise(
    image: &Path,
    config: &OcrConfig,
    dpi: Option<u32>,
) -> Result<String, OcrError> {
    let program = resolve_program(config.tesseract_cmd.as_deref());
    let args = build_args(image, config, dpi);
    debug!("Running {} {:?}", program.display(), args);

    let output = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error(&program, e))?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(OcrError::EngineFailed {
            program: program.display().to_string(),
            status: output.status,
            stderr,
        });
    }

    if !stderr.is_empty() {
        debug!("{}: {}", program.display(), stderr);
    }

    Ok(normalise_output(&output.stdout))
}

fn spawn_error(program: &Path, e: std::io::Error) -> OcrError {
    if e.kind() == std::io::ErrorKind::NotFound {
        OcrError::EngineNotFound {
            program: program.display().to_string(),
        }
    } else {
        OcrError::EngineIo {
            program: program.display().to_string(),
            source: e,
        }
    }
}

// ── Engine version ─────────────────────────────────────────────────────────

/// What `tesseract --version` reported.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub program: PathBuf,
    /// Parsed version number, e.g. `"5.3.0"`.
    pub version: Option<String>,
    /// Full `--version` banner.
    pub banner: String,
}

static RE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^tesseract\s+v?(\d[^\s]*)").unwrap());

/// Extract the version number from a `tesseract --version` banner.
pub fn parse_version(banner: &str) -> Option<String> {
    RE_VERSION.captures(banner).map(|c| c[1].to_string())
}

/// Probe the OCR engine by running `<program> --version`.
///
/// Older releases print the banner on stderr, newer ones on stdout; both are
/// read.
pub async fn tesseract_version(program: Option<&Path>) -> Result<EngineInfo, OcrError> {
    let program = resolve_program(program);
    let output = Command::new(&program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error(&program, e))?;

    let mut banner = String::from_utf8_lossy(&output.stdout).into_owned();
    banner.push_str(&String::from_utf8_lossy(&output.stderr));
    let banner = banner.trim().to_string();

    if !output.status.success() {
        return Err(OcrError::EngineFailed {
            program: program.display().to_string(),
            status: output.status,
            stderr: banner,
        });
    }

    Ok(EngineInfo {
        version: parse_version(&banner),
        program,
        banner,
    })
}
