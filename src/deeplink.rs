use url::Url;

use crate::{host::HostPage, session::ScanSession};

/// Query pair appended by external alert links to force the overlay once.
pub const MARKER: &str = "phishing_show=true";

/// Inspects the page address once at start-up. When the marker is present it
/// is removed from the visible address (so a reload does not re-arm it) and
/// the session's one-shot flag is armed.
pub fn arm_from_location(host: &dyn HostPage, session: &ScanSession) -> bool {
    let location = host.location();
    let Some(cleaned) = strip_marker(&location) else {
        return false;
    };

    tracing::info!(target: "deeplink", from = %location, to = %cleaned, "deep link detected");
    host.replace_location(cleaned);
    session.arm_deep_link();
    true
}

/// Returns the address without the marker, or `None` if it carried none.
/// Hash-routed apps keep their parameters in the fragment, so both the
/// query and a `#route?params` fragment are checked.
pub fn strip_marker(location: &Url) -> Option<Url> {
    let mut cleaned = location.clone();
    let mut found = false;

    if let Some(query) = location.query() {
        if let Some(rest) = without_marker(query) {
            found = true;
            cleaned.set_query((!rest.is_empty()).then_some(rest.as_str()));
        }
    }

    if let Some((route, params)) = location.fragment().and_then(|f| f.split_once('?')) {
        if let Some(rest) = without_marker(params) {
            found = true;
            let fragment = if rest.is_empty() {
                route.to_string()
            } else {
                format!("{route}?{rest}")
            };
            cleaned.set_fragment(Some(&fragment));
        }
    }

    found.then_some(cleaned)
}

fn without_marker(params: &str) -> Option<String> {
    let pairs: Vec<&str> = params.split('&').collect();
    if !pairs.contains(&MARKER) {
        return None;
    }
    Some(
        pairs
            .into_iter()
            .filter(|pair| *pair != MARKER && !pair.is_empty())
            .collect::<Vec<_>>()
            .join("&"),
    )
}
