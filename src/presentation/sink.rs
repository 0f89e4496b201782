use std::{fs, path::PathBuf};

use crate::domain::IndicatorState;

use super::overlay::Overlay;

/// Where the state machine's output lands.
pub trait PresentationSink: Send + Sync {
    fn indicator(&self, state: IndicatorState);
    fn overlay(&self, overlay: &Overlay);
    fn notice(&self, message: &str);
}

/// Logs indicator changes and notices; writes overlays to an HTML file.
pub struct ConsoleSink {
    overlay_path: PathBuf,
}

impl ConsoleSink {
    pub fn new(overlay_path: PathBuf) -> Self {
        Self { overlay_path }
    }

    fn write_overlay(&self, overlay: &Overlay) -> std::io::Result<()> {
        let document = format!(
            "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
             <style>.highlight-phish{{background:#ff5252;color:#fff;padding:0 2px;border-radius:3px}}\
             .phish-divider{{border:0;border-top:1px solid rgba(0,0,0,.2);margin:10px 0}}</style>\
             </head><body>\n{body}\n</body></html>\n",
            title = overlay.title,
            body = overlay.to_html(),
        );
        fs::write(&self.overlay_path, document)
    }
}

impl PresentationSink for ConsoleSink {
    fn indicator(&self, state: IndicatorState) {
        tracing::info!(target: "presentation", indicator = %state, glyph = state.glyph(), "indicator updated");
    }

    fn overlay(&self, overlay: &Overlay) {
        match self.write_overlay(overlay) {
            Ok(()) => tracing::warn!(
                target: "presentation",
                title = overlay.title,
                confidence = %overlay.confidence,
                path = %self.overlay_path.display(),
                "overlay shown"
            ),
            Err(err) => tracing::error!(
                target: "presentation",
                error = %err,
                path = %self.overlay_path.display(),
                "failed to write overlay"
            ),
        }
    }

    fn notice(&self, message: &str) {
        tracing::warn!(target: "presentation", "{message}");
    }
}
