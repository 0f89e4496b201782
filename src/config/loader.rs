use std::{env, path::PathBuf, time::Duration};

use url::Url;

use super::env::{
    AppConfig, ClassifierConfig, ConfigError, DirectoryConfig, LoggingConfig, PageConfig,
    PayloadStyle, ScanConfig,
};

const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:5000/predict";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_page_url =
            env::var("MONITOR_PAGE_URL").map_err(|_| ConfigError::Missing("MONITOR_PAGE_URL"))?;
        let page_url = Url::parse(raw_page_url.trim()).map_err(|source| ConfigError::InvalidUrl {
            key: "MONITOR_PAGE_URL",
            source,
        })?;

        let page = PageConfig {
            url: page_url,
            source_file: env::var("MONITOR_PAGE_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            refresh_interval: parse_millis("PAGE_REFRESH_MS", 2_000),
            fetch_timeout: parse_millis("PAGE_FETCH_TIMEOUT_MS", 10_000),
        };

        let endpoint = env::var("CLASSIFIER_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string());
        let classifier = ClassifierConfig {
            endpoint: Url::parse(endpoint.trim()).map_err(|source| ConfigError::InvalidUrl {
                key: "CLASSIFIER_URL",
                source,
            })?,
            payload: parse_payload(env::var("CLASSIFIER_PAYLOAD").ok().as_deref())?,
        };

        let defaults = ScanConfig::default();
        let scan = ScanConfig {
            debounce: parse_millis("SCAN_DEBOUNCE_MS", defaults.debounce.as_millis() as u64),
            surface_poll_interval: parse_millis(
                "SURFACE_POLL_MS",
                defaults.surface_poll_interval.as_millis() as u64,
            ),
            lobby_poll_interval: parse_millis(
                "LOBBY_POLL_MS",
                defaults.lobby_poll_interval.as_millis() as u64,
            ),
            manual_timeout: parse_millis(
                "MANUAL_SCAN_TIMEOUT_MS",
                defaults.manual_timeout.as_millis() as u64,
            ),
            recent_message_limit: env::var("RECENT_MESSAGE_LIMIT")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.recent_message_limit),
            drop_stale_responses: env::var("DROP_STALE_RESPONSES")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.drop_stale_responses),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            overlay_filename: env::var("OVERLAY_FILENAME")
                .unwrap_or_else(|_| "overlay.html".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        Ok(Self {
            page,
            classifier,
            scan,
            directories,
            logging,
        })
    }
}

fn parse_millis(key: &str, default: u64) -> Duration {
    Duration::from_millis(
        env::var(key)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default),
    )
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_payload(value: Option<&str>) -> Result<PayloadStyle, ConfigError> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(PayloadStyle::Message),
        Some(v) if v.is_empty() || v == "message" => Ok(PayloadStyle::Message),
        Some(v) if v == "email" => Ok(PayloadStyle::Email),
        Some(other) => Err(ConfigError::UnknownPayload(other)),
    }
}
