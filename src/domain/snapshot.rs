use chrono::{DateTime, Utc};

use super::types::Platform;

/// Text extracted for one scan attempt. Never mutated after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub url: String,
    pub platform: Platform,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(text: String, url: String, platform: Platform) -> Self {
        Self {
            text,
            url,
            platform,
            taken_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
