//! Observation seam between the scan pipeline and the monitored page.
//!
//! The pipeline never owns page structure. It reads text through
//! [`HostPage`], and it follows surfaces through `Weak` handles so that a
//! page re-render silently detaches whoever was watching the old structure.

mod document;
mod loader;

use std::sync::Arc;

use tokio::sync::broadcast;
use url::Url;

use crate::domain::Platform;

pub use document::DocumentPage;
pub use loader::{PageError, PageLoader};

const MUTATION_BUFFER: usize = 16;

pub trait HostPage: Send + Sync {
    fn location(&self) -> Url;

    /// Rewrites the visible address without reloading (history replace).
    fn replace_location(&self, location: Url);

    /// Text of the last `limit` matches of `locator` that are visible.
    fn recent_texts(&self, locator: &str, limit: usize) -> Vec<String>;

    /// Visible paragraph/block texts whose length lies in `min_chars..=max_chars`.
    fn block_texts(&self, min_chars: usize, max_chars: usize) -> Vec<String>;

    fn resolve_surface(&self, locator: &str) -> Option<Arc<SurfaceNode>>;

    fn lobby_items(&self, item_locator: &str, summary_locator: &str) -> Vec<LobbyItem>;

    fn mark_scanned(&self, key: &str);

    fn attach_badge(&self, key: &str, badge: WarningBadge);

    fn platform(&self) -> Platform {
        Platform::detect(&self.location())
    }
}

/// A live, host-owned region that announces structural/content mutations.
#[derive(Debug)]
pub struct SurfaceNode {
    locator: String,
    mutations: broadcast::Sender<()>,
}

impl SurfaceNode {
    pub(crate) fn new(locator: impl Into<String>) -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_BUFFER);
        Self {
            locator: locator.into(),
            mutations,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.mutations.subscribe()
    }

    pub(crate) fn announce_mutation(&self) {
        // No subscribers is fine: nobody is watching this surface yet.
        let _ = self.mutations.send(());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyItem {
    pub key: String,
    pub summary: Option<String>,
    pub scanned: bool,
    pub badge: Option<WarningBadge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningBadge {
    pub glyph: &'static str,
    pub title: &'static str,
}

impl WarningBadge {
    pub fn link_or_keyword() -> Self {
        Self {
            glyph: "⚠️",
            title: "Contains link or keyword - Be Careful",
        }
    }
}
