use regex::{Regex, RegexBuilder};

use crate::domain::{Verdict, VerdictLabel};

const SNIPPET_DIVIDER: &str = "<hr class=\"phish-divider\">";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub label: VerdictLabel,
    pub title: &'static str,
    pub confidence: String,
    /// Already escaped and highlighted; safe to embed as markup.
    pub body_html: String,
}

impl Overlay {
    pub fn build(verdict: &Verdict, scanned_text: &str) -> Self {
        let highlighter = Highlighter::new(&verdict.keywords);
        let body_html = if verdict.snippets.is_empty() {
            highlighter.apply(scanned_text)
        } else {
            verdict
                .snippets
                .iter()
                .map(|snippet| {
                    format!(
                        "<div class=\"phish-snippet\">{}</div>",
                        highlighter.apply(snippet)
                    )
                })
                .collect::<Vec<_>>()
                .join(SNIPPET_DIVIDER)
        };

        Self {
            label: verdict.label,
            title: title(verdict.label),
            confidence: verdict.confidence.clone(),
            body_html,
        }
    }

    fn css_class(&self) -> &'static str {
        match self.label {
            VerdictLabel::Safe => "phishing-alert-overlay safe-alert-overlay",
            VerdictLabel::Suspicious => "phishing-alert-overlay suspicious-alert-overlay",
            VerdictLabel::Phishing => "phishing-alert-overlay",
        }
    }

    /// Standalone fragment for the overlay container.
    pub fn to_html(&self) -> String {
        format!(
            "<div id=\"phishing-alert-overlay\" class=\"{class}\">\n\
             <h2>{title}</h2>\n\
             <p>Confidence: {confidence}</p>\n\
             <div class=\"scanned-text-container\">\n\
             <strong>Suspicious Content:</strong><br>\n\
             {body}\n\
             </div>\n\
             </div>",
            class = self.css_class(),
            title = self.title,
            confidence = escape_html(&self.confidence),
            body = self.body_html,
        )
    }
}

fn title(label: VerdictLabel) -> &'static str {
    match label {
        VerdictLabel::Phishing => "🚨 PHISHING DETECTED",
        VerdictLabel::Suspicious => "⚠️ SUSPICIOUS",
        VerdictLabel::Safe => "✅ SAFE",
    }
}

/// Wraps case-insensitive keyword occurrences in highlight markup.
///
/// Matching runs over the raw text and every literal segment is escaped on
/// its own, so the inserted markup is never escaped and never re-scanned.
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new(keywords: &[String]) -> Self {
        let mut literals: Vec<&str> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        literals.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        literals.dedup();

        let pattern = if literals.is_empty() {
            None
        } else {
            let alternation = literals
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            match RegexBuilder::new(&alternation).case_insensitive(true).build() {
                Ok(regex) => Some(regex),
                Err(err) => {
                    tracing::warn!(target: "presentation", error = %err, "keyword pattern rejected");
                    None
                }
            }
        };
        Self { pattern }
    }

    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return escape_html(text);
        };

        let mut out = String::with_capacity(text.len() + 32);
        let mut cursor = 0;
        for found in pattern.find_iter(text) {
            out.push_str(&escape_html(&text[cursor..found.start()]));
            out.push_str("<span class=\"highlight-phish\">");
            out.push_str(&escape_html(found.as_str()));
            out.push_str("</span>");
            cursor = found.end();
        }
        out.push_str(&escape_html(&text[cursor..]));
        out
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(label: &str, keywords: &[&str], snippets: &[&str]) -> Verdict {
        Verdict {
            label: VerdictLabel::from_prediction(label),
            prediction: label.to_string(),
            confidence: "91.00%".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            snippets: snippets.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn escapes_before_highlighting() {
        let highlighter = Highlighter::new(&["login".to_string()]);
        assert_eq!(
            highlighter.apply("<script>login</script>"),
            "&lt;script&gt;<span class=\"highlight-phish\">login</span>&lt;/script&gt;"
        );
    }

    #[test]
    fn highlights_every_case_insensitive_occurrence() {
        let highlighter = Highlighter::new(&["Verify".to_string(), "".to_string()]);
        assert_eq!(
            highlighter.apply("verify now, VERIFY later"),
            "<span class=\"highlight-phish\">verify</span> now, <span class=\"highlight-phish\">VERIFY</span> later"
        );
    }

    #[test]
    fn keywords_are_literals_and_markup_is_not_rescanned() {
        let highlighter = Highlighter::new(&[
            "a+b".to_string(),
            "span".to_string(),
            "class".to_string(),
            "amp".to_string(),
        ]);
        assert_eq!(
            highlighter.apply("aab a+b & span"),
            "aab <span class=\"highlight-phish\">a+b</span> &amp; <span class=\"highlight-phish\">span</span>"
        );
    }

    #[test]
    fn longer_keywords_win_over_prefixes() {
        let highlighter = Highlighter::new(&["pay".to_string(), "paypal".to_string()]);
        assert_eq!(
            highlighter.apply("PayPal"),
            "<span class=\"highlight-phish\">PayPal</span>"
        );
    }

    #[test]
    fn snippets_render_separately() {
        let overlay = Overlay::build(
            &verdict("Phishing Message", &["bank"], &["your bank <account>", "call the BANK"]),
            "full text is ignored",
        );
        assert_eq!(overlay.title, "🚨 PHISHING DETECTED");
        assert_eq!(
            overlay.body_html,
            "<div class=\"phish-snippet\">your <span class=\"highlight-phish\">bank</span> &lt;account&gt;</div>\
             <hr class=\"phish-divider\">\
             <div class=\"phish-snippet\">call the <span class=\"highlight-phish\">BANK</span></div>"
        );
    }

    #[test]
    fn falls_back_to_scanned_text() {
        let overlay = Overlay::build(&verdict("Safe Message", &[], &[]), "it's \"fine\"");
        assert_eq!(overlay.title, "✅ SAFE");
        assert_eq!(overlay.body_html, "it&#39;s &quot;fine&quot;");
        let html = overlay.to_html();
        assert!(html.contains("safe-alert-overlay"));
        assert!(html.contains("Confidence: 91.00%"));
    }
}
