use std::io::Write;
use std::time::Instant;

use lopdf::Document;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{PageWarning, UploadedDocument};
use crate::services::ocr_service::{OcrEngine, PageRasterizer, PdftoppmRasterizer, TesseractOcr};

/// Access to the embedded text of an opened PDF, page by page.
pub trait PdfSource {
    fn page_count(&self) -> usize;

    /// Embedded text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> AppResult<String>;
}

/// When to fall back to OCR, and how large to render pages for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionPolicy {
    /// Pages whose trimmed embedded text has fewer characters than this are OCR'd.
    pub min_chars: usize,
    /// Rasterization scale; 1.0 renders at 72 DPI.
    pub zoom: f32,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            min_chars: 50,
            zoom: 2.0,
        }
    }
}

impl From<&Config> for ExtractionPolicy {
    fn from(config: &Config) -> Self {
        Self {
            min_chars: config.ocr_min_chars,
            zoom: config.ocr_zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Embedded,
    Ocr,
    /// OCR was attempted and failed; the short embedded text was kept.
    EmbeddedAfterOcrFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub index: usize,
    pub text: String,
    pub source: TextSource,
}

#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub pages: Vec<PageText>,
    pub warnings: Vec<PageWarning>,
    pub ocr_pages: usize,
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page texts joined in page order.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// Runs the per-page extraction policy over `source`.
///
/// Pages with enough embedded text are taken as-is. Every other page is
/// rasterized and OCR'd exactly once; if either step fails the embedded text
/// is kept and a warning is recorded. Page order is preserved.
pub fn extract_pages(
    source: &dyn PdfSource,
    rasterizer: &dyn PageRasterizer,
    ocr: &dyn OcrEngine,
    policy: &ExtractionPolicy,
) -> ExtractionResult {
    let start = Instant::now();
    let page_count = source.page_count();
    let mut result = ExtractionResult {
        pages: Vec::with_capacity(page_count),
        ..ExtractionResult::default()
    };

    for index in 0..page_count {
        let embedded = match source.page_text(index) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(page = index + 1, error = %e, "Embedded text extraction failed");
                String::new()
            }
        };

        let embedded_chars = embedded.trim().chars().count();
        if embedded_chars >= policy.min_chars {
            result.pages.push(PageText {
                index,
                text: embedded,
                source: TextSource::Embedded,
            });
            continue;
        }

        tracing::debug!(
            page = index + 1,
            embedded_chars,
            threshold = policy.min_chars,
            "Embedded text below threshold, running OCR"
        );

        match rasterizer
            .rasterize(index, policy.zoom)
            .and_then(|image| ocr.recognize(&image))
        {
            Ok(text) => {
                result.ocr_pages += 1;
                result.pages.push(PageText {
                    index,
                    text,
                    source: TextSource::Ocr,
                });
            }
            Err(e) => {
                tracing::warn!(page = index + 1, error = %e, "OCR failed, keeping embedded text");
                result.warnings.push(PageWarning {
                    page: index + 1,
                    message: format!("OCR failed on page {}: {}", index + 1, e),
                });
                result.pages.push(PageText {
                    index,
                    text: embedded,
                    source: TextSource::EmbeddedAfterOcrFailure,
                });
            }
        }
    }

    result.processing_time_ms = start.elapsed().as_millis() as u64;
    result
}

/// Embedded text via lopdf.
pub struct LopdfSource {
    document: Document,
    page_numbers: Vec<u32>,
}

impl LopdfSource {
    pub fn load(content: &[u8]) -> AppResult<Self> {
        let document = Document::load_mem(content)
            .map_err(|e| AppError::invalid_file(format!("Could not open PDF: {}", e)))?;
        let page_numbers = document.get_pages().keys().copied().collect();
        Ok(Self {
            document,
            page_numbers,
        })
    }
}

impl PdfSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> AppResult<String> {
        let page_number = self
            .page_numbers
            .get(index)
            .copied()
            .ok_or_else(|| AppError::internal(format!("Page index {} out of range", index)))?;
        self.document
            .extract_text(&[page_number])
            .map_err(|e| AppError::internal(format!("Text extraction failed: {}", e)))
    }
}

/// Extraction pipeline wired to lopdf, pdftoppm and tesseract.
#[derive(Debug, Clone)]
pub struct PdfProcessor {
    policy: ExtractionPolicy,
    pdftoppm_path: String,
    tesseract_path: String,
    ocr_language: String,
}

impl PdfProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            policy: ExtractionPolicy::from(config),
            pdftoppm_path: config.pdftoppm_path.clone(),
            tesseract_path: config.tesseract_path.clone(),
            ocr_language: config.ocr_language.clone(),
        }
    }

    pub fn policy(&self) -> &ExtractionPolicy {
        &self.policy
    }

    /// Blocking. The upload is written to a temporary file that is removed
    /// when this returns, whether extraction succeeded or not.
    pub fn extract(&self, file: &UploadedDocument) -> AppResult<ExtractionResult> {
        tracing::info!(
            "Starting PDF text extraction for file: {} ({} bytes)",
            file.name,
            file.size
        );

        if !file.is_pdf() {
            return Err(AppError::invalid_file("Only .pdf files are accepted"));
        }

        let mut temp_file = NamedTempFile::new().map_err(|e| {
            AppError::internal(format!("Failed to create temporary file: {}", e))
        })?;
        temp_file.write_all(&file.content).map_err(|e| {
            AppError::internal(format!("Failed to write PDF to temporary file: {}", e))
        })?;
        temp_file.flush()?;

        let source = LopdfSource::load(&file.content)?;
        let rasterizer = PdftoppmRasterizer::new(&self.pdftoppm_path, temp_file.path());
        let ocr = TesseractOcr::new(&self.tesseract_path, &self.ocr_language);

        let result = extract_pages(&source, &rasterizer, &ocr, &self.policy);

        tracing::info!(
            pages = result.page_count(),
            ocr_pages = result.ocr_pages,
            warnings = result.warnings.len(),
            processing_time_ms = result.processing_time_ms,
            "PDF extraction completed"
        );

        Ok(result)
    }
}
