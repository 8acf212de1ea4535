//! # ocralign-pdfium
//!
//! Find a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render` and bind to it.
//!
//! ## Lookup order
//!
//! [`bind_pdfium`] tries, in order:
//!
//! 1. `PDFIUM_LIB_PATH` — an explicit path to `libpdfium.{so,dylib}` / `pdfium.dll`.
//! 2. The per-user cache, `<cache>/ocralign/pdfium-{VERSION}/`.
//! 3. The system library search path (`Pdfium::bind_to_system_library`).
//! 4. A download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    into the cache directory.
//!
//! Step 4 happens at most once per machine; later runs stop at step 2.
//!
//! ```rust,no_run
//! let pdfium = ocralign_pdfium::bind_pdfium(None).expect("PDFium unavailable");
//! ```
//!
//! ## Environment variables
//!
//! - `PDFIUM_LIB_PATH` — use this library, never download.
//! - `PDFIUM_AUTO_CACHE_DIR` — override the cache root.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Progress hook for the one-off download: `(bytes_downloaded, total_bytes)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors raised while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumLocateError {
    #[error("Unsupported platform for PDFium download: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("PDFium download failed: {0}")]
    Download(String),

    #[error("PDFium archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform table ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Platform {
    archive: &'static str,
    member: &'static str,
    lib_name: &'static str,
}

const fn entry(archive: &'static str, lib_name: &'static str, member: &'static str) -> Platform {
    Platform {
        archive,
        member,
        lib_name,
    }
}

fn platform_for(os: &str, arch: &str) -> Result<Platform, PdfiumLocateError> {
    let platform = match (os, arch) {
        ("macos", "aarch64") => entry("pdfium-mac-arm64.tgz", "libpdfium.dylib", "lib/libpdfium.dylib"),
        ("macos", "x86_64") => entry("pdfium-mac-x64.tgz", "libpdfium.dylib", "lib/libpdfium.dylib"),
        ("linux", "x86_64") => entry("pdfium-linux-x64.tgz", "libpdfium.so", "lib/libpdfium.so"),
        ("linux", "aarch64") => entry("pdfium-linux-arm64.tgz", "libpdfium.so", "lib/libpdfium.so"),
        ("windows", "x86_64") => entry("pdfium-win-x64.tgz", "pdfium.dll", "bin/pdfium.dll"),
        ("windows", "aarch64") => entry("pdfium-win-arm64.tgz", "pdfium.dll", "bin/pdfium.dll"),
        ("windows", "x86") => entry("pdfium-win-x86.tgz", "pdfium.dll", "bin/pdfium.dll"),
        (os, arch) => {
            return Err(PdfiumLocateError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };
    Ok(platform)
}

fn current_platform() -> Result<Platform, PdfiumLocateError> {
    platform_for(std::env::consts::OS, std::env::consts::ARCH)
}

// ── Cache directory ──────────────────────────────────────────────────────────

/// Per-version directory the downloaded library is cached in.
///
/// Default: `~/.cache/ocralign/pdfium-{VERSION}/` on Linux,
/// `~/Library/Caches/ocralign/...` on macOS, `%LOCALAPPDATA%\ocralign\...`
/// on Windows. `PDFIUM_AUTO_CACHE_DIR` replaces the `<cache>/ocralign` part.
pub fn pdfium_cache_dir() -> PathBuf {
    cache_dir_from(std::env::var_os("PDFIUM_AUTO_CACHE_DIR"))
}

fn cache_dir_from(override_root: Option<OsString>) -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Some(root) = override_root.filter(|r| !r.is_empty()) {
        return PathBuf::from(root).join(versioned);
    }

    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("ocralign")
        .join(versioned)
}

// ── Public API ───────────────────────────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Path of a PDFium library already on disk (`PDFIUM_LIB_PATH` or cache), if any.
pub fn cached_pdfium_path() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from) {
        if p.exists() {
            return Some(p);
        }
        warn!("PDFIUM_LIB_PATH '{}' does not exist; ignoring", p.display());
    }
    let platform = current_platform().ok()?;
    let p = pdfium_cache_dir().join(platform.lib_name);
    p.exists().then_some(p)
}

/// `true` when no network access is needed to bind PDFium from a file.
pub fn is_pdfium_cached() -> bool {
    cached_pdfium_path().is_some()
}

/// Make sure a PDFium library file exists locally, downloading it if needed.
///
/// Does not consult the system library search path; use [`bind_pdfium`] for
/// the full lookup.
pub fn ensure_pdfium_library(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumLocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = match cached_pdfium_path() {
        Some(p) => p,
        None => download_to_cache(on_progress)?,
    };

    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Bind to PDFium using the full lookup order described in the crate docs.
pub fn bind_pdfium(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Pdfium, PdfiumLocateError> {
    if let Some(path) = RESOLVED_PATH.get().cloned().or_else(cached_pdfium_path) {
        return bind_pdfium_from_path(&path);
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            debug!("Bound to system PDFium library");
            return Ok(Pdfium::new(bindings));
        }
        Err(e) => debug!("No system PDFium library: {e}"),
    }

    let path = ensure_pdfium_library(on_progress)?;
    bind_pdfium_from_path(&path)
}

/// Bind to the PDFium library at `path`, bypassing lookup.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumLocateError> {
    debug!("Binding PDFium from {}", path.display());
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumLocateError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Download ─────────────────────────────────────────────────────────────────

fn download_to_cache(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumLocateError> {
    let platform = current_platform()?;
    let cache_dir = pdfium_cache_dir();
    let lib_path = cache_dir.join(platform.lib_name);

    let url = format!("{BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", platform.archive);
    info!("Downloading PDFium {PDFIUM_VERSION} from {url}");

    std::fs::create_dir_all(&cache_dir).map_err(PdfiumLocateError::CacheDir)?;
    let archive = download_bytes(&url, on_progress)?;
    extract_member(&archive, platform.member, &lib_path)?;

    info!("PDFium cached at {}", lib_path.display());
    Ok(lib_path)
}

fn download_bytes(
    url: &str,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Vec<u8>, PdfiumLocateError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("ocralign-pdfium/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumLocateError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumLocateError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumLocateError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumLocateError::Download(format!("read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Unpack the single archive member `member` of a `.tgz` into `dest`.
fn extract_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumLocateError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let extract_err = |e: std::io::Error| PdfiumLocateError::Extract(e.to_string());
    let mut archive = Archive::new(GzDecoder::new(archive));

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let is_member = entry.path().map_err(extract_err)?.to_string_lossy() == member;
        if is_member {
            entry.unpack(dest).map_err(extract_err)?;
            return Ok(());
        }
    }

    Err(PdfiumLocateError::Extract(format!(
        "'{member}' not found in archive"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tgz_with(member: &str, body: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, member, body).unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn known_platforms_resolve() {
        let linux = platform_for("linux", "x86_64").unwrap();
        assert_eq!(linux.lib_name, "libpdfium.so");
        assert_eq!(linux.member, "lib/libpdfium.so");

        let win = platform_for("windows", "x86").unwrap();
        assert_eq!(win.member, "bin/pdfium.dll");
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let err = platform_for("haiku", "riscv64").unwrap_err();
        assert!(err.to_string().contains("haiku/riscv64"));
    }

    #[test]
    fn cache_dir_honours_override() {
        let d = cache_dir_from(Some("/tmp/ocralign-cache".into()));
        assert_eq!(
            d,
            PathBuf::from("/tmp/ocralign-cache").join(format!("pdfium-{PDFIUM_VERSION}"))
        );
    }

    #[test]
    fn cache_dir_default_is_namespaced() {
        let d = cache_dir_from(None);
        let s = d.to_string_lossy();
        assert!(s.contains("ocralign"), "got {s}");
        assert!(s.ends_with(&format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn empty_override_falls_back_to_default() {
        assert_eq!(cache_dir_from(Some(OsString::new())), cache_dir_from(None));
    }

    #[test]
    fn extract_member_writes_library() {
        let archive = tgz_with("lib/libpdfium.so", b"not really a library");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libpdfium.so");

        extract_member(&archive, "lib/libpdfium.so", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"not really a library");
    }

    #[test]
    fn extract_member_reports_missing_entry() {
        let archive = tgz_with("include/fpdfview.h", b"/* header */");
        let dir = tempfile::tempdir().unwrap();
        let err = extract_member(&archive, "lib/libpdfium.so", &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, PdfiumLocateError::Extract(_)));
    }
}
