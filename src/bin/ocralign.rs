//! CLI binary for ocralign.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `OcrConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocralign::pipeline::input::{resolve_input, InputKind};
use ocralign::{
    inspect, ocr_image, ocr_pdf, ocr_pdf_to_file, tesseract_version, OcrConfig,
    OcrProgressCallback, PageSelection, PageSeparator, ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar with one log line per finished page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_document_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing Pages");
        self.bar.reset_eta();
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_document_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running OCR on {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, _total: usize, text_len: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}  {:<8}  {}",
            green("✓"),
            page_num,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages recognised",
            green("✔"),
            bold(&total_pages.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR a scanned PDF (text to stdout)
  ocralign scan.pdf

  # Write to a file, German + English, 400 DPI
  ocralign scan.pdf -o scan.txt --lang deu+eng --dpi 400

  # OCR a single image
  ocralign receipt.jpg

  # Pages 2 to 5, form feed between pages
  ocralign --pages 2-5 --separator formfeed book.pdf -o book.txt

  # Single-column block text, keep inter-word spacing
  ocralign --psm 6 -c preserve_interword_spaces=1 table.pdf

  # Inspect PDF metadata without running OCR
  ocralign --inspect-only scan.pdf

  # Check that Tesseract and PDFium are available
  ocralign --check

  # JSON output with per-page texts and timings
  ocralign --json scan.pdf > scan.json

ENVIRONMENT VARIABLES:
  TESSERACT_CMD           Tesseract executable (default: tesseract on PATH)
  TESSDATA_PREFIX         Tesseract language data directory
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter (overrides -v / -q)

SETUP:
  1. Install Tesseract:  apt install tesseract-ocr  /  brew install tesseract
  2. Run:                ocralign scan.pdf -o scan.txt

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/ocralign/pdfium-7690/. No manual library setup is required.
"#;

/// OCR scanned PDFs and images to plain text with Tesseract.
#[derive(Parser, Debug)]
#[command(
    name = "ocralign",
    version,
    about = "OCR scanned PDFs and images to plain text with Tesseract",
    long_about = "Rasterise each page of a PDF with PDFium and recognise it with the Tesseract \
OCR engine, or OCR an image directly. Prints the text or writes it to a file, one section \
per page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or image file.
    #[arg(required_unless_present = "check")]
    input: Option<PathBuf>,

    /// Write text to this file instead of stdout.
    #[arg(short, long, env = "OCRALIGN_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI for PDF pages (72–600).
    #[arg(long, env = "OCRALIGN_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Cap on rendered page width/height in pixels.
    #[arg(long, env = "OCRALIGN_MAX_PIXELS")]
    max_pixels: Option<u32>,

    /// Tesseract language(s), e.g. eng or eng+fra.
    #[arg(short, long, env = "OCRALIGN_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "OCRALIGN_PSM",
          value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// Tesseract OCR engine mode (0–3).
    #[arg(long, env = "OCRALIGN_OEM",
          value_parser = clap::value_parser!(u8).range(0..=3))]
    oem: Option<u8>,

    /// Directory containing *.traineddata files.
    #[arg(long, env = "OCRALIGN_TESSDATA_DIR")]
    tessdata_dir: Option<PathBuf>,

    /// Tesseract executable.
    #[arg(long, env = "OCRALIGN_TESSERACT_CMD")]
    tesseract_cmd: Option<PathBuf>,

    /// Tesseract variable KEY=VALUE (repeatable; the value may contain commas).
    #[arg(short = 'c', long = "config-var", value_name = "KEY=VALUE",
          env = "OCRALIGN_CONFIG_VAR", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "OCRALIGN_PAGES", default_value = "all")]
    pages: String,

    /// Page separator: header, formfeed, none, or a custom string.
    #[arg(long, env = "OCRALIGN_SEPARATOR", default_value = "header")]
    separator: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "OCRALIGN_PASSWORD")]
    password: Option<String>,

    /// Output structured JSON instead of text.
    #[arg(long, env = "OCRALIGN_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "OCRALIGN_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no OCR.
    #[arg(long)]
    inspect_only: bool,

    /// Report Tesseract and PDFium availability, then exit.
    #[arg(long)]
    check: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCRALIGN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCRALIGN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs when it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.check {
        return run_check(&cli).await;
    }

    let input = cli
        .input
        .clone()
        .context("An input file is required")?;
    let resolved = resolve_input(&input).context("Cannot read input")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        if resolved.kind != InputKind::Pdf {
            anyhow::bail!("--inspect-only needs a PDF, {} is an image", input.display());
        }
        ensure_pdfium(cli.quiet)?;
        let meta = inspect(&input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Image input ──────────────────────────────────────────────────────
    if resolved.kind == InputKind::Image {
        let config = build_config(&cli, None)?;
        let text = ocr_image(&input, &config).await.context("OCR failed")?;
        emit_image_text(&cli, &input, text).await?;
        return Ok(());
    }

    // ── PDF input ────────────────────────────────────────────────────────
    ensure_pdfium(cli.quiet)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn OcrProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if let Some(ref output_path) = cli.output {
        let output = ocr_pdf_to_file(&input, output_path, &config)
            .await
            .context("OCR failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?
            );
        }
        if !cli.quiet {
            eprintln!(
                "{}  {}/{} pages  {}ms  →  {}",
                green("✔"),
                output.stats.processed_pages,
                output.stats.total_pages,
                output.stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let output = ocr_pdf(&input, &config).await.context("OCR failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            write_stdout(&output.to_text(&config.page_separator))?;
        }

        if !cli.quiet && !show_progress && !cli.json {
            eprintln!(
                "Recognised {}/{} pages in {}ms",
                output.stats.processed_pages, output.stats.total_pages, output.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// Locate or download PDFium before the first page is rendered, so the
/// download gets its own progress bar.
fn ensure_pdfium(quiet: bool) -> Result<PathBuf> {
    if ocralign_pdfium::is_pdfium_cached() || quiet {
        return tokio::task::block_in_place(|| ocralign_pdfium::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine");
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    let path = tokio::task::block_in_place(|| {
        ocralign_pdfium::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(path)
}

/// `--check`: report the OCR engine and the PDFium library.
async fn run_check(cli: &Cli) -> Result<()> {
    let engine = tesseract_version(cli.tesseract_cmd.as_deref())
        .await
        .context("Tesseract is not usable")?;
    let pdfium = ensure_pdfium(cli.quiet)?;

    if cli.json {
        let report = serde_json::json!({
            "tesseract": engine,
            "pdfium": pdfium,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else {
        println!("Tesseract:    {}", engine.program.display());
        println!(
            "Version:      {}",
            engine.version.as_deref().unwrap_or("unknown")
        );
        println!("PDFium:       {}", pdfium.display());
    }
    Ok(())
}

async fn emit_image_text(cli: &Cli, input: &std::path::Path, text: String) -> Result<()> {
    if let Some(ref output_path) = cli.output {
        let page = ocralign::PageText {
            page_num: 1,
            text: text.clone(),
            duration_ms: 0,
        };
        ocralign::write_pages(output_path, &[page], &PageSeparator::None)
            .await
            .context("Failed to write output")?;
    }

    if cli.json {
        let json = serde_json::json!({
            "input": input,
            "text": text,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
    } else if cli.output.is_none() {
        write_stdout(&text)?;
    }
    Ok(())
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.is_empty() && !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Map CLI args to `OcrConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let mut builder = OcrConfig::builder()
        .dpi(cli.dpi)
        .language(cli.lang.clone())
        .pages(parse_pages(&cli.pages)?)
        .page_separator(parse_separator(&cli.separator));

    if let Some(px) = cli.max_pixels {
        builder = builder.max_rendered_pixels(px);
    }
    if let Some(psm) = cli.psm {
        builder = builder.page_segmentation_mode(psm);
    }
    if let Some(oem) = cli.oem {
        builder = builder.engine_mode(oem);
    }
    if let Some(ref dir) = cli.tessdata_dir {
        builder = builder.tessdata_dir(dir.clone());
    }
    if let Some(ref cmd) = cli.tesseract_cmd {
        builder = builder.tesseract_cmd(cmd.clone());
    }
    for (key, value) in &cli.vars {
        builder = builder.tesseract_var(key.clone(), value.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if pages.contains(&0) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got 0)");
        }
        return Ok(PageSelection::Set(pages));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "header" => PageSeparator::Header,
        "formfeed" | "ff" => PageSeparator::FormFeed,
        "none" => PageSeparator::None,
        _ => PageSeparator::Custom(s.to_string()),
    }
}

/// Parse one `-c KEY=VALUE` Tesseract variable.
fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
