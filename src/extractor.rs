use crate::{
    domain::{Platform, Snapshot},
    host::HostPage,
};

/// Shorter snapshots are not worth a classifier round-trip.
pub const MIN_SCAN_CHARS: usize = 5;
pub const BLOCK_MIN_CHARS: usize = 6;
pub const BLOCK_MAX_CHARS: usize = 999;

const TELEGRAM_CHAIN: &[&str] = &[
    ".message .text-content",
    ".text-content",
    ".message-content-text",
    ".bubbles-group .message",
    "div[class*=\"message\"]",
];
const DISCORD_CHAIN: &[&str] = &[
    "[id^=\"message-content\"]",
    "div[class*=\"messageContent\"]",
    "li[class*=\"messageListItem\"] div[class*=\"markup\"]",
];
const GMAIL_CHAIN: &[&str] = &[".a3s.aiL", ".ii.gt", "div[role=\"listitem\"]"];

pub fn locator_chain(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Telegram => TELEGRAM_CHAIN,
        Platform::Discord => DISCORD_CHAIN,
        Platform::Gmail => GMAIL_CHAIN,
        Platform::Generic => &[],
    }
}

pub struct Extractor {
    recent_limit: usize,
}

impl Extractor {
    pub fn new(recent_limit: usize) -> Self {
        Self { recent_limit }
    }

    /// Best-effort text for the page's current state. An empty snapshot
    /// means "nothing to scan", never "safe".
    pub fn extract(&self, host: &dyn HostPage) -> Snapshot {
        let location = host.location();
        let platform = Platform::detect(&location);

        let text = locator_chain(platform)
            .iter()
            .map(|locator| (locator, join_texts(host.recent_texts(locator, self.recent_limit))))
            .find(|(_, text)| !text.is_empty())
            .map(|(locator, text)| {
                tracing::trace!(target: "extractor", %locator, chars = text.chars().count(), "locator hit");
                text
            })
            .unwrap_or_else(|| join_texts(host.block_texts(BLOCK_MIN_CHARS, BLOCK_MAX_CHARS)));

        let text = if text.chars().count() < MIN_SCAN_CHARS {
            String::new()
        } else {
            text
        };
        Snapshot::new(text, location.to_string(), platform)
    }
}

fn join_texts(texts: Vec<String>) -> String {
    texts.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::host::DocumentPage;

    fn page(url: &str, html: &str) -> DocumentPage {
        DocumentPage::new(Url::parse(url).unwrap(), html)
    }

    #[test]
    fn telegram_uses_first_matching_locator_and_recent_messages() {
        let bubbles: String = (1..=7)
            .map(|i| format!(r#"<div class="message"><span class="text-content">msg {i}</span></div>"#))
            .collect();
        let html = format!(r#"<div class="bubbles-group">{bubbles}</div><p>unrelated sidebar text</p>"#);
        let host = page("https://web.telegram.org/k/#@someone", &html);

        let snapshot = Extractor::new(5).extract(&host);
        assert_eq!(snapshot.platform, Platform::Telegram);
        assert_eq!(snapshot.text, "msg 3\nmsg 4\nmsg 5\nmsg 6\nmsg 7");
        assert_eq!(snapshot.url, "https://web.telegram.org/k/#@someone");
    }

    #[test]
    fn discord_falls_through_to_later_locators() {
        let host = page(
            "https://discord.com/channels/1/2",
            r#"<ul><li class="messageListItem_abc"><div class="markup_x">free nitro here</div></li></ul>"#,
        );
        let snapshot = Extractor::new(5).extract(&host);
        assert_eq!(snapshot.text, "free nitro here");
    }

    #[test]
    fn hidden_matches_do_not_count_as_hits() {
        let host = page(
            "https://mail.google.com/mail/u/0/#inbox/abc",
            r#"<div class="a3s aiL" style="display:none">stale body</div>
               <div class="ii gt">Your parcel is waiting, confirm delivery</div>"#,
        );
        let snapshot = Extractor::new(5).extract(&host);
        assert_eq!(snapshot.platform, Platform::Gmail);
        assert_eq!(snapshot.text, "Your parcel is waiting, confirm delivery");
    }

    #[test]
    fn generic_pages_use_block_heuristic() {
        let host = page(
            "https://example.org/inbox",
            "<body><p>hey</p><p>Please reset your password today</p></body>",
        );
        let snapshot = Extractor::new(5).extract(&host);
        assert_eq!(snapshot.platform, Platform::Generic);
        assert_eq!(snapshot.text, "Please reset your password today");
    }

    #[test]
    fn nothing_qualifying_yields_empty_snapshot() {
        let host = page("https://web.telegram.org/k/", "<body><span>hi</span></body>");
        assert!(Extractor::new(5).extract(&host).is_empty());

        let host = page("https://example.org/", "<body><p>tiny</p></body>");
        assert!(Extractor::new(5).extract(&host).is_empty());
    }
}
