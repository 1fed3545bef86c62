use std::env;
use anyhow::{Result, Context};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub max_file_size_mb: usize,
    pub max_concurrent_requests: usize,
    pub inference_url: String,
    pub inference_model: String,
    pub inference_timeout_seconds: u64,
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub ocr_language: String,
    pub ocr_min_chars: usize,
    pub ocr_zoom: f32,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Read separately from [`Config`] so logging is up before config loading logs anything.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Config {
            server_host: Self::string_var("SERVER_HOST", "0.0.0.0"),
            server_port: Self::parse_env_var("SERVER_PORT", 8080)
                .context("Failed to parse SERVER_PORT")?,
            database_url: Self::string_var("DATABASE_URL", "sqlite://formease.db?mode=rwc"),
            max_file_size_mb: Self::parse_env_var("MAX_FILE_SIZE_MB", 10)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            max_concurrent_requests: Self::parse_env_var("MAX_CONCURRENT_REQUESTS", 32)
                .context("Failed to parse MAX_CONCURRENT_REQUESTS")?,
            inference_url: Self::string_var("INFERENCE_URL", "http://localhost:11434"),
            inference_model: Self::string_var("INFERENCE_MODEL", "llama3"),
            inference_timeout_seconds: Self::parse_env_var("INFERENCE_TIMEOUT_SECONDS", 120)
                .context("Failed to parse INFERENCE_TIMEOUT_SECONDS")?,
            tesseract_path: Self::string_var("TESSERACT_PATH", "tesseract"),
            pdftoppm_path: Self::string_var("PDFTOPPM_PATH", "pdftoppm"),
            ocr_language: Self::string_var("OCR_LANGUAGE", "eng"),
            ocr_min_chars: Self::parse_env_var("OCR_MIN_CHARS", 50)
                .context("Failed to parse OCR_MIN_CHARS")?,
            ocr_zoom: Self::parse_env_var("OCR_ZOOM", 2.0)
                .context("Failed to parse OCR_ZOOM")?,
            session_ttl_hours: Self::parse_env_var("SESSION_TTL_HOURS", 336)
                .context("Failed to parse SESSION_TTL_HOURS")?,
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn string_var(var_name: &str, default: &str) -> String {
        env::var(var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                info!("{} not set, using default: {}", var_name, default);
                default.to_string()
            })
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        if self.inference_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("INFERENCE_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.session_ttl_hours <= 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_HOURS must be greater than 0"));
        }
        if !(self.ocr_zoom > 0.0 && self.ocr_zoom <= 8.0) {
            return Err(anyhow::anyhow!("OCR_ZOOM must be in (0, 8]"));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            database_url: "sqlite::memory:".to_string(),
            max_file_size_mb: 10,
            max_concurrent_requests: 32,
            inference_url: "http://localhost:11434".to_string(),
            inference_model: "llama3".to_string(),
            inference_timeout_seconds: 120,
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            ocr_language: "eng".to_string(),
            ocr_min_chars: 50,
            ocr_zoom: 2.0,
            session_ttl_hours: 336,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_zoom() {
        let config = Config {
            ocr_zoom: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            ocr_zoom: 12.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        let config = Config {
            max_concurrent_requests: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
