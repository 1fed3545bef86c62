use serde::{Deserialize, Serialize};

/// Non-fatal problem on a single page, reported next to the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWarning {
    /// 1-based page number.
    pub page: usize,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub data: SummaryData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryData {
    pub file_name: String,
    pub summary: String,
    pub pages: usize,
    pub ocr_pages: usize,
    pub warnings: Vec<PageWarning>,
}

impl SummaryResponse {
    pub fn new(data: SummaryData, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            data,
            processing_time_ms,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub username: String,
    pub token: Option<String>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatFailure {
    pub error: String,
}

impl ChatFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub message: String,
    pub response: String,
    pub timestamp: String,
}
