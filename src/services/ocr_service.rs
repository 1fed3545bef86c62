use image::DynamicImage;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a single page of a PDF into a bitmap.
pub trait PageRasterizer {
    /// `index` is 0-based. `zoom` of 1.0 is 72 DPI.
    fn rasterize(&self, index: usize, zoom: f32) -> Result<DynamicImage, OcrError>;
}

/// Turns a bitmap into text.
pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Rasterizes pages with poppler's `pdftoppm`, one page per invocation.
pub struct PdftoppmRasterizer {
    program: String,
    pdf_path: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<String>, pdf_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            pdf_path: pdf_path.into(),
        }
    }

    pub fn dpi_for_zoom(zoom: f32) -> u32 {
        (72.0 * zoom).round().max(1.0) as u32
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, index: usize, zoom: f32) -> Result<DynamicImage, OcrError> {
        let page_number = (index + 1).to_string();
        let dpi = Self::dpi_for_zoom(zoom);
        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join("page");

        debug!(page = index + 1, dpi, "Rasterizing page");

        let output = Command::new(&self.program)
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(&self.pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|source| OcrError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let image = image::open(prefix.with_extension("png"))?;
        Ok(image)
    }
}

/// Runs the `tesseract` command line tool against a grayscale copy of the bitmap.
pub struct TesseractOcr {
    program: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let work_dir = tempfile::tempdir()?;
        let image_path = work_dir.path().join("page.png");
        image.to_luma8().save(&image_path)?;

        let output = Command::new(&self.program)
            .arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|source| OcrError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        info!(
            chars = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "OCR pass completed"
        );
        Ok(text)
    }
}

/// Whether `program` can be launched. Used by the health probe.
pub fn is_program_available(program: &str, version_flag: &str) -> bool {
    let available = Command::new(program)
        .arg(version_flag)
        .output()
        .is_ok();
    if !available {
        warn!(program, "External program not found");
    }
    available
}

pub fn is_tesseract_available(program: &str) -> bool {
    is_program_available(program, "--version")
}

pub fn is_pdftoppm_available(program: &str) -> bool {
    is_program_available(program, "-v")
}
