pub mod chatbot;
pub mod inference;
pub mod ocr_service;
pub mod pdf_processor;
pub mod resume_builder;
pub mod resume_pdf;
pub mod summarizer;

pub use inference::{InferenceBackend, InferenceError, OllamaClient};
pub use ocr_service::{OcrEngine, OcrError, PageRasterizer, PdftoppmRasterizer, TesseractOcr};
pub use pdf_processor::{ExtractionPolicy, ExtractionResult, PdfProcessor, PdfSource};
