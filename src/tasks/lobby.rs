use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    host::{HostPage, WarningBadge},
    infrastructure::shutdown::ShutdownListener,
};

pub const LOBBY_ITEM_LOCATOR: &str = ".chat-list .chat-item, .sidebar-left .chat-list a";
pub const LOBBY_SUMMARY_LOCATOR: &str = ".last-message, .subtitle, .short-message";

/// Cheap local triage of chat-list previews. Never talks to the classifier
/// and never touches the indicator.
pub struct LobbyTriage {
    host: Arc<dyn HostPage>,
    poll_interval: Duration,
}

impl LobbyTriage {
    pub fn new(host: Arc<dyn HostPage>, poll_interval: Duration) -> Self {
        Self {
            host,
            poll_interval,
        }
    }

    pub fn spawn(self: Arc<Self>, mut shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            while shutdown.pause(self.poll_interval).await {
                self.sweep();
            }
            tracing::info!(target: "lobby", "lobby triage stopped");
        })
    }

    /// One pass over the list. Returns how many badges were attached.
    pub fn sweep(&self) -> usize {
        let mut flagged = 0;
        for item in self
            .host
            .lobby_items(LOBBY_ITEM_LOCATOR, LOBBY_SUMMARY_LOCATOR)
        {
            if item.scanned || item.badge.is_some() {
                continue;
            }
            // Items still rendering their preview are retried next sweep.
            let Some(summary) = item.summary.as_deref() else {
                continue;
            };
            if looks_risky(summary) {
                let badge = WarningBadge::link_or_keyword();
                tracing::info!(
                    target: "lobby",
                    item = %item.key,
                    badge = badge.glyph,
                    reason = badge.title,
                    "flagged lobby preview"
                );
                self.host.attach_badge(&item.key, badge);
                flagged += 1;
            }
            self.host.mark_scanned(&item.key);
        }
        flagged
    }
}

pub fn looks_risky(summary: &str) -> bool {
    summary.contains("http") || summary.contains("www") || summary.to_lowercase().contains("login")
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::host::DocumentPage;

    fn lobby(previews: &[(&str, &str)]) -> String {
        let items: String = previews
            .iter()
            .map(|(id, text)| {
                format!(r#"<a class="chat-item" data-peer-id="{id}"><span class="last-message">{text}</span></a>"#)
            })
            .collect();
        format!(r#"<div class="chat-list">{items}</div>"#)
    }

    #[test]
    fn keyword_heuristic() {
        assert!(looks_risky("click http://evil.example to login"));
        assert!(looks_risky("visit www.example.com"));
        assert!(looks_risky("Please LOGIN again"));
        assert!(!looks_risky("see you at lunch"));
    }

    #[test]
    fn badges_are_attached_once_per_item() {
        let page = Arc::new(DocumentPage::new(
            Url::parse("https://web.telegram.org/k/").unwrap(),
            lobby(&[("1", "click http://evil.example to login"), ("2", "lunch?")]),
        ));
        let triage = LobbyTriage::new(page.clone(), Duration::from_secs(3));

        assert_eq!(triage.sweep(), 1);
        assert_eq!(triage.sweep(), 0);

        let items = page.lobby_items(LOBBY_ITEM_LOCATOR, LOBBY_SUMMARY_LOCATOR);
        assert!(items.iter().all(|item| item.scanned));
        assert_eq!(items[0].badge, Some(WarningBadge::link_or_keyword()));
        assert_eq!(items[1].badge, None);
    }

    #[test]
    fn new_items_after_rerender_are_triaged() {
        let page = Arc::new(DocumentPage::new(
            Url::parse("https://web.telegram.org/k/").unwrap(),
            lobby(&[("1", "hello")]),
        ));
        let triage = LobbyTriage::new(page.clone(), Duration::from_secs(3));
        assert_eq!(triage.sweep(), 0);

        page.replace_document(lobby(&[("1", "hello"), ("9", "verify at www.example.com")]));
        assert_eq!(triage.sweep(), 1);
    }

    #[test]
    fn items_without_preview_stay_unscanned() {
        let page = Arc::new(DocumentPage::new(
            Url::parse("https://web.telegram.org/k/").unwrap(),
            r#"<div class="chat-list"><a class="chat-item" data-peer-id="5"></a></div>"#,
        ));
        let triage = LobbyTriage::new(page.clone(), Duration::from_secs(3));
        assert_eq!(triage.sweep(), 0);
        assert!(!page.lobby_items(LOBBY_ITEM_LOCATOR, LOBBY_SUMMARY_LOCATOR)[0].scanned);
    }
}
