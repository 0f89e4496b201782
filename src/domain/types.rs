use std::fmt;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Telegram,
    Discord,
    Gmail,
    Generic,
}

impl Platform {
    pub fn detect(location: &Url) -> Self {
        let host = location.host_str().unwrap_or_default().to_ascii_lowercase();
        if host.contains("telegram.org") {
            Platform::Telegram
        } else if host.contains("discord.com") {
            Platform::Discord
        } else if host.contains("mail.google.com") {
            Platform::Gmail
        } else {
            Platform::Generic
        }
    }

    /// Label sent to the classifier in the `platform` field.
    pub fn wire_label(&self) -> &'static str {
        match self {
            Platform::Telegram => "Telegram Web",
            Platform::Discord => "Discord Web",
            Platform::Gmail => "Gmail",
            Platform::Generic => "Web Detector",
        }
    }
}

/// What triggered a scan. Governs debounce and overlay visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Auto,
    Manual,
    DeepLink,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Intent::Auto => "auto",
            Intent::Manual => "manual",
            Intent::DeepLink => "deep-link",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    Idle,
    Scanning,
    Safe,
    Suspicious,
    Danger,
}

impl IndicatorState {
    pub fn glyph(&self) -> &'static str {
        match self {
            IndicatorState::Idle | IndicatorState::Safe => "🛡️",
            IndicatorState::Scanning => "🔎",
            IndicatorState::Suspicious => "⚠️",
            IndicatorState::Danger => "🚨",
        }
    }
}

impl fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndicatorState::Idle => "idle",
            IndicatorState::Scanning => "scanning",
            IndicatorState::Safe => "safe",
            IndicatorState::Suspicious => "suspicious",
            IndicatorState::Danger => "danger",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_platform_from_host() {
        let cases = [
            ("https://web.telegram.org/k/#@durov", Platform::Telegram),
            ("https://discord.com/channels/1/2", Platform::Discord),
            ("https://mail.google.com/mail/u/0/#inbox", Platform::Gmail),
            ("https://www.google.com/search?q=mail", Platform::Generic),
            ("file:///tmp/page.html", Platform::Generic),
        ];
        for (raw, expected) in cases {
            let url = Url::parse(raw).unwrap();
            assert_eq!(Platform::detect(&url), expected, "{raw}");
        }
    }
}
