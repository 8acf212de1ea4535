//! Integration tests that drive the library against a stand-in `tesseract`.
//!
//! The stand-ins are small shell scripts, so these tests need neither
//! Tesseract nor PDFium installed. Every subprocess is spawned from the one
//! `engine_scenarios` test, after all scripts are written: writing an
//! executable while another thread forks can make the later exec fail with
//! ETXTBSY.
//!
//! The PDF scenarios build their input with PDFium itself and are skipped
//! when no PDFium library can be bound.

#![cfg(unix)]

use image::{DynamicImage, GrayImage, Luma};
use ocralign::{
    ocr_dynamic_image, ocr_image, ocr_image_sync, ocr_pdf, ocr_pdf_sync, ocr_pdf_to_file,
    tesseract_version, write_pages, OcrConfig, OcrError, OcrProgressCallback,
    PageSelection, PageSeparator, PageText,
};
use pdfium_render::prelude::PdfPagePaperSize;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn sample_image(dir: &Path) -> PathBuf {
    let path = dir.join("scan.png");
    GrayImage::from_pixel(16, 16, Luma([255u8])).save(&path).unwrap();
    path
}

fn config_for(program: &Path) -> OcrConfig {
    OcrConfig::builder().tesseract_cmd(program).build().unwrap()
}

/// Write a blank A4 PDF with `pages` pages, or `None` when PDFium is unavailable.
fn blank_pdf(path: &Path, pages: usize) -> Option<PathBuf> {
    let pdfium = match ocralign_pdfium::bind_pdfium(None) {
        Ok(p) => p,
        Err(e) => {
            println!("SKIP PDF scenarios — PDFium unavailable: {e}");
            return None;
        }
    };
    let mut doc = pdfium.create_new_pdf().unwrap();
    for _ in 0..pages {
        doc.pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .unwrap();
    }
    doc.save_to_file(path).unwrap();
    Some(path.to_path_buf())
}

#[derive(Default)]
struct PageCounter {
    started: AtomicUsize,
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl OcrProgressCallback for PageCounter {
    fn on_document_start(&self, total_pages: usize) {
        self.total.store(total_pages, Ordering::SeqCst);
    }

    fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _chars: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runs the whole PDF loop with the echo engine standing in for Tesseract,
/// so each page text names the PNG it was read from.
async fn pdf_scenarios(echo: &Path, dir: &Path) -> Option<PathBuf> {
    let target = dir.join("three.pdf");
    let pdf = tokio::task::spawn_blocking(move || blank_pdf(&target, 3))
        .await
        .unwrap()?;

    // One text per page, in page order.
    let counter = Arc::new(PageCounter::default());
    let config = OcrConfig::builder()
        .tesseract_cmd(echo)
        .dpi(72)
        .progress_callback(counter.clone())
        .build()
        .unwrap();
    let output = ocr_pdf(&pdf, &config).await.unwrap();
    assert_eq!(output.pages.len(), 3);
    assert_eq!(output.metadata.page_count, 3);
    assert_eq!(output.stats.processed_pages, 3);
    for (i, page) in output.pages.iter().enumerate() {
        assert_eq!(page.page_num, i + 1);
        assert!(
            page.text.contains(&format!("page-{:04}.png stdout -l eng --dpi 72", i + 1)),
            "{}",
            page.text
        );
        assert!(!page.text.ends_with('\u{c}'));
    }
    assert_eq!(counter.total.load(Ordering::SeqCst), 3);
    assert_eq!(counter.started.load(Ordering::SeqCst), 3);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 3);

    // The written file is exactly the returned texts, concatenated.
    let out = dir.join("out/three.txt");
    let config = OcrConfig::builder()
        .tesseract_cmd(echo)
        .dpi(72)
        .page_separator(PageSeparator::None)
        .build()
        .unwrap();
    let output = ocr_pdf_to_file(&pdf, &out, &config).await.unwrap();
    assert_eq!(output.pages.len(), 3);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        output.texts().concat()
    );

    // Selected pages keep their source page numbers.
    let config = OcrConfig::builder()
        .tesseract_cmd(echo)
        .dpi(72)
        .pages(PageSelection::Set(vec![3, 1, 3]))
        .build()
        .unwrap();
    let output = ocr_pdf(&pdf, &config).await.unwrap();
    let numbers: Vec<usize> = output.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(output.stats.total_pages, 3);

    let config = OcrConfig::builder()
        .tesseract_cmd(echo)
        .pages(PageSelection::Single(9))
        .build()
        .unwrap();
    let err = ocr_pdf(&pdf, &config).await.unwrap_err();
    assert!(
        matches!(err, OcrError::PageOutOfRange { page: 9, total: 3 }),
        "got {err:?}"
    );

    Some(pdf)
}

#[test]
fn engine_scenarios() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dir = tempfile::tempdir().unwrap();

    // Echo the arguments back as the recognised text, form feed included.
    let echo = write_script(dir.path(), "echo-tess", r#"printf 'args: %s\n\f' "$*""#);
    let noisy = write_script(
        dir.path(),
        "noisy-tess",
        r#"echo 'Warning: Invalid resolution 0 dpi. Using 70 instead.' >&2
printf 'Quiet text\n\f'"#,
    );
    let failing = write_script(
        dir.path(),
        "failing-tess",
        r#"echo 'Error opening data file eng.traineddata' >&2
exit 1"#,
    );
    let versioned = write_script(
        dir.path(),
        "versioned-tess",
        r#"echo 'tesseract 5.3.0'
echo ' leptonica-1.82.0'"#,
    );
    let image = sample_image(dir.path());

    let rt = tokio::runtime::Runtime::new().unwrap();
    let pdf = rt.block_on(async {
        // Text comes back verbatim minus the trailing form feed.
        let config = OcrConfig::builder()
            .tesseract_cmd(&echo)
            .language("eng+fra")
            .page_segmentation_mode(6)
            .tesseract_var("preserve_interword_spaces", "1")
            .build()
            .unwrap();
        let text = ocr_image(&image, &config).await.unwrap();
        assert!(!text.ends_with('\u{c}'), "form feed not stripped: {text:?}");
        assert!(text.starts_with("args: "));
        assert!(text.contains("scan.png stdout -l eng+fra"), "{text}");
        assert!(text.contains("--psm 6"), "{text}");
        assert!(text.contains("-c preserve_interword_spaces=1"), "{text}");
        assert!(!text.contains("--dpi"), "images keep their own resolution: {text}");

        // In-memory images go through a scratch PNG.
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([0u8])));
        let text = ocr_dynamic_image(&img, &config_for(&echo)).await.unwrap();
        assert!(text.contains("page-0001.png stdout -l eng"), "{text}");

        // Warnings on stderr do not fail a successful run.
        let text = ocr_image(&image, &config_for(&noisy)).await.unwrap();
        assert_eq!(text, "Quiet text\n");

        // A non-zero exit carries the engine's stderr.
        let err = ocr_image(&image, &config_for(&failing)).await.unwrap_err();
        match err {
            OcrError::EngineFailed { stderr, status, .. } => {
                assert!(!status.success());
                assert!(stderr.contains("eng.traineddata"), "{stderr}");
            }
            other => panic!("expected EngineFailed, got {other:?}"),
        }

        let missing = dir.path().join("no-such-tesseract");
        let err = ocr_image(&image, &config_for(&missing)).await.unwrap_err();
        assert!(matches!(err, OcrError::EngineNotFound { .. }), "got {err:?}");

        // A missing input is reported before the engine is started.
        let err = ocr_image(dir.path().join("absent.png"), &config_for(&failing))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::FileNotFound { .. }), "got {err:?}");

        let info = tesseract_version(Some(versioned.as_path())).await.unwrap();
        assert_eq!(info.version.as_deref(), Some("5.3.0"));
        assert!(info.banner.contains("leptonica"));

        pdf_scenarios(&echo, dir.path()).await
    });
    drop(rt);

    let text = ocr_image_sync(&image, &config_for(&noisy)).unwrap();
    assert_eq!(text, "Quiet text\n");

    if let Some(pdf) = pdf {
        let config = OcrConfig::builder()
            .tesseract_cmd(&echo)
            .dpi(72)
            .build()
            .unwrap();
        let output = ocr_pdf_sync(&pdf, &config).unwrap();
        assert_eq!(output.texts().len(), 3);

        // An engine failure on a page aborts the whole document.
        let err = ocr_pdf_sync(&pdf, &config_for(&failing)).unwrap_err();
        assert!(matches!(err, OcrError::EngineFailed { .. }), "got {err:?}");
    }
}

fn pages() -> Vec<PageText> {
    vec![
        PageText {
            page_num: 1,
            text: "Invoice 42\nTotal: 10.00\n".into(),
            duration_ms: 12,
        },
        PageText {
            page_num: 2,
            text: "Thank you\n".into(),
            duration_ms: 9,
        },
    ]
}

#[tokio::test]
async fn writing_twice_gives_identical_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");

    write_pages(&out, &pages(), &PageSeparator::Header).await.unwrap();
    let first = std::fs::read(&out).unwrap();
    write_pages(&out, &pages(), &PageSeparator::Header).await.unwrap();
    let second = std::fs::read(&out).unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn plain_layout_is_concatenation() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reports/2024/out.txt");

    write_pages(&out, &pages(), &PageSeparator::None).await.unwrap();

    let expected: String = pages().iter().map(|p| p.text.as_str()).collect();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), expected);
}

#[tokio::test]
async fn form_feed_layout_splits_back_into_pages() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");

    write_pages(&out, &pages(), &PageSeparator::FormFeed).await.unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    let split: Vec<&str> = written.split('\u{c}').collect();
    assert_eq!(split, vec!["Invoice 42\nTotal: 10.00\n", "Thank you\n"]);
}

#[tokio::test]
async fn empty_page_list_writes_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.txt");

    write_pages(&out, &[], &PageSeparator::Header).await.unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
}
