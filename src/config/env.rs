use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub page: PageConfig,
    pub classifier: ClassifierConfig,
    pub scan: ScanConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct PageConfig {
    pub url: Url,
    pub source_file: Option<PathBuf>,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadStyle {
    /// `{ message, url, platform }`
    Message,
    /// `{ email }`
    Email,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: Url,
    pub payload: PayloadStyle,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub debounce: Duration,
    pub surface_poll_interval: Duration,
    pub lobby_poll_interval: Duration,
    pub manual_timeout: Duration,
    pub recent_message_limit: usize,
    pub drop_stale_responses: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1_500),
            surface_poll_interval: Duration::from_millis(5_000),
            lobby_poll_interval: Duration::from_millis(3_000),
            manual_timeout: Duration::from_millis(10_000),
            recent_message_limit: 5,
            drop_stale_responses: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub overlay_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid url in {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported CLASSIFIER_PAYLOAD value: {0} (expected `message` or `email`)")]
    UnknownPayload(String),
}
