use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    sync::Arc,
};

use parking_lot::RwLock;
use scraper::{node::Element, ElementRef, Html, Selector};
use url::Url;

use super::{HostPage, LobbyItem, SurfaceNode, WarningBadge};

const BLOCK_LOCATOR: &str = "p, div";
const STABLE_KEY_ATTRS: [&str; 3] = ["data-peer-id", "data-id", "id"];

/// A host page backed by a static HTML document that is swapped wholesale
/// whenever the page re-renders.
pub struct DocumentPage {
    state: RwLock<PageState>,
}

struct PageState {
    location: Url,
    source: String,
    surfaces: HashMap<String, LiveSurface>,
    lobby: HashMap<String, LobbyMark>,
}

struct LiveSurface {
    node: Arc<SurfaceNode>,
    fingerprint: u64,
}

#[derive(Default)]
struct LobbyMark {
    scanned: bool,
    badge: Option<WarningBadge>,
}

impl DocumentPage {
    pub fn new(location: Url, source: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(PageState {
                location,
                source: source.into(),
                surfaces: HashMap::new(),
                lobby: HashMap::new(),
            }),
        }
    }

    /// Swaps in new markup. Surfaces whose locator stopped matching are
    /// dropped; surfaces whose markup changed announce one mutation.
    /// Returns `false` when the markup is identical to the current one.
    pub fn replace_document(&self, source: String) -> bool {
        let mut state = self.state.write();
        if state.source == source {
            return false;
        }

        let document = Html::parse_document(&source);
        state.surfaces.retain(|locator, live| {
            let Some(fingerprint) = first_match_fingerprint(&document, locator) else {
                tracing::debug!(target: "page", locator = %locator, "surface vanished");
                return false;
            };
            if fingerprint != live.fingerprint {
                live.fingerprint = fingerprint;
                live.node.announce_mutation();
            }
            true
        });
        state.source = source;
        true
    }

    fn with_document<T>(&self, f: impl FnOnce(&Html) -> T) -> T {
        let state = self.state.read();
        let document = Html::parse_document(&state.source);
        f(&document)
    }
}

impl HostPage for DocumentPage {
    fn location(&self) -> Url {
        self.state.read().location.clone()
    }

    fn replace_location(&self, location: Url) {
        self.state.write().location = location;
    }

    fn recent_texts(&self, locator: &str, limit: usize) -> Vec<String> {
        let Some(selector) = parse_selector(locator) else {
            return Vec::new();
        };
        self.with_document(|document| {
            let matches: Vec<ElementRef<'_>> = document.select(&selector).collect();
            let start = matches.len().saturating_sub(limit);
            matches[start..]
                .iter()
                .filter(|element| is_visible(**element))
                .map(|element| visible_text(*element))
                .filter(|text| !text.is_empty())
                .collect()
        })
    }

    fn block_texts(&self, min_chars: usize, max_chars: usize) -> Vec<String> {
        let Some(selector) = parse_selector(BLOCK_LOCATOR) else {
            return Vec::new();
        };
        self.with_document(|document| {
            document
                .select(&selector)
                .filter(|element| is_visible(*element))
                .map(visible_text)
                .filter(|text| (min_chars..=max_chars).contains(&text.chars().count()))
                .collect()
        })
    }

    fn resolve_surface(&self, locator: &str) -> Option<Arc<SurfaceNode>> {
        let mut state = self.state.write();
        let fingerprint = {
            let document = Html::parse_document(&state.source);
            first_match_fingerprint(&document, locator)?
        };
        let live = state
            .surfaces
            .entry(locator.to_string())
            .or_insert_with(|| LiveSurface {
                node: Arc::new(SurfaceNode::new(locator)),
                fingerprint,
            });
        Some(live.node.clone())
    }

    fn lobby_items(&self, item_locator: &str, summary_locator: &str) -> Vec<LobbyItem> {
        let (Some(items), Some(summary)) =
            (parse_selector(item_locator), parse_selector(summary_locator))
        else {
            return Vec::new();
        };
        let state = self.state.read();
        let document = Html::parse_document(&state.source);
        document
            .select(&items)
            .map(|item| {
                let key = item_key(item);
                let mark = state.lobby.get(&key);
                LobbyItem {
                    summary: item.select(&summary).next().map(visible_text),
                    scanned: mark.is_some_and(|m| m.scanned),
                    badge: mark.and_then(|m| m.badge.clone()),
                    key,
                }
            })
            .collect()
    }

    fn mark_scanned(&self, key: &str) {
        self.state
            .write()
            .lobby
            .entry(key.to_string())
            .or_default()
            .scanned = true;
    }

    fn attach_badge(&self, key: &str, badge: WarningBadge) {
        self.state
            .write()
            .lobby
            .entry(key.to_string())
            .or_default()
            .badge = Some(badge);
    }
}

fn parse_selector(locator: &str) -> Option<Selector> {
    match Selector::parse(locator) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!(target: "page", locator, error = %err, "invalid locator");
            None
        }
    }
}

fn first_match_fingerprint(document: &Html, locator: &str) -> Option<u64> {
    let selector = parse_selector(locator)?;
    let element = document.select(&selector).next()?;
    Some(fingerprint(&element.html()))
}

fn fingerprint(markup: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    markup.hash(&mut hasher);
    hasher.finish()
}

fn item_key(item: ElementRef<'_>) -> String {
    STABLE_KEY_ATTRS
        .iter()
        .find_map(|attr| item.value().attr(attr).filter(|v| !v.is_empty()))
        .map(|value| value.to_string())
        .unwrap_or_else(|| format!("item:{:016x}", fingerprint(&item.html())))
}

fn hides(element: &Element) -> bool {
    if matches!(element.name(), "script" | "style" | "template" | "noscript") {
        return true;
    }
    if element.attr("hidden").is_some() {
        return true;
    }
    if element
        .attr("aria-hidden")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return true;
    }
    element.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

fn is_visible(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .all(|el| !hides(el.value()))
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "li" | "ul" | "ol" | "section" | "article" | "blockquote" | "pre" | "tr"
            | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

/// Rough `innerText`: hidden descendants are skipped, blocks break lines,
/// runs of whitespace collapse.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if hides(child.value()) {
            continue;
        }
        if name == "br" {
            out.push('\n');
            continue;
        }
        let block = is_block(name);
        if block {
            out.push('\n');
        }
        collect_text(child, out);
        if block {
            out.push('\n');
        }
    }
}
