use serde::{Deserialize, Serialize};

use crate::{
    config::PayloadStyle,
    domain::{Snapshot, Verdict, VerdictLabel},
};

use super::ClassifyError;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictRequest<'a> {
    Message {
        message: &'a str,
        url: &'a str,
        platform: &'a str,
    },
    Email {
        email: &'a str,
    },
}

pub fn build_request(style: PayloadStyle, snapshot: &Snapshot) -> PredictRequest<'_> {
    match style {
        PayloadStyle::Message => PredictRequest::Message {
            message: &snapshot.text,
            url: &snapshot.url,
            platform: snapshot.platform.wire_label(),
        },
        PayloadStyle::Email => PredictRequest::Email {
            email: &snapshot.text,
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub snippets: Option<Vec<String>>,
}

/// Some deployments send the confidence as a bare number instead of "97.20%".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Text(String),
    Number(serde_json::Number),
}

impl Confidence {
    fn into_display(self) -> String {
        match self {
            Confidence::Text(text) => text,
            Confidence::Number(number) => number.to_string(),
        }
    }
}

pub fn parse_response(body: &str) -> Result<Verdict, ClassifyError> {
    let response: PredictResponse =
        serde_json::from_str(body).map_err(|err| ClassifyError::Malformed(err.to_string()))?;

    Ok(Verdict {
        label: VerdictLabel::from_prediction(&response.prediction),
        prediction: response.prediction,
        confidence: response.confidence.into_display(),
        keywords: clean_list(response.keywords),
        snippets: clean_list(response.snippets),
    })
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::Platform;

    fn snapshot() -> Snapshot {
        Snapshot::new(
            "verify your account".into(),
            "https://web.telegram.org/k/".into(),
            Platform::Telegram,
        )
    }

    #[test]
    fn message_payload_carries_url_and_platform() {
        let snap = snapshot();
        let value = serde_json::to_value(build_request(PayloadStyle::Message, &snap)).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "verify your account",
                "url": "https://web.telegram.org/k/",
                "platform": "Telegram Web",
            })
        );
    }

    #[test]
    fn email_payload_only_carries_text() {
        let snap = snapshot();
        let value = serde_json::to_value(build_request(PayloadStyle::Email, &snap)).unwrap();
        assert_eq!(value, json!({ "email": "verify your account" }));
    }

    #[test]
    fn parses_full_response() {
        let verdict = parse_response(
            r#"{"prediction":"Phishing Message","confidence":"97.20%","keywords":["verify",""],"snippets":["verify your account"]}"#,
        )
        .unwrap();
        assert_eq!(verdict.label, VerdictLabel::Phishing);
        assert_eq!(verdict.confidence, "97.20%");
        assert_eq!(verdict.keywords, vec!["verify".to_string()]);
        assert_eq!(verdict.snippets, vec!["verify your account".to_string()]);
    }

    #[test]
    fn optional_lists_default_to_empty() {
        let verdict =
            parse_response(r#"{"prediction":"Safe Message","confidence":0.88}"#).unwrap();
        assert_eq!(verdict.label, VerdictLabel::Safe);
        assert_eq!(verdict.confidence, "0.88");
        assert!(verdict.keywords.is_empty());
        assert!(verdict.snippets.is_empty());
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        for body in ["", "<html>502</html>", r#"{"confidence":"1%"}"#, r#"{"error":"No email text provided"}"#] {
            assert!(
                matches!(parse_response(body), Err(ClassifyError::Malformed(_))),
                "{body:?}"
            );
        }
    }
}
