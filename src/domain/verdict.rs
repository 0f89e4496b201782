use super::types::IndicatorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictLabel {
    Safe,
    Suspicious,
    Phishing,
}

impl VerdictLabel {
    /// Maps the classifier's free-form prediction onto a label.
    /// Anything that is neither "Safe" nor "Suspicious" is treated as phishing.
    pub fn from_prediction(prediction: &str) -> Self {
        if prediction.contains("Safe") {
            VerdictLabel::Safe
        } else if prediction.contains("Suspicious") {
            VerdictLabel::Suspicious
        } else {
            VerdictLabel::Phishing
        }
    }

    pub fn indicator(&self) -> IndicatorState {
        match self {
            VerdictLabel::Safe => IndicatorState::Safe,
            VerdictLabel::Suspicious => IndicatorState::Suspicious,
            VerdictLabel::Phishing => IndicatorState::Danger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub label: VerdictLabel,
    pub prediction: String,
    /// Displayed verbatim, never interpreted.
    pub confidence: String,
    pub keywords: Vec<String>,
    pub snippets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_labels_map_to_indicator_states() {
        let cases = [
            ("Phishing Message", IndicatorState::Danger),
            ("Safe Message", IndicatorState::Safe),
            ("Suspicious Message", IndicatorState::Suspicious),
            ("Spam?", IndicatorState::Danger),
            ("", IndicatorState::Danger),
            ("safe message", IndicatorState::Danger),
        ];
        for (prediction, expected) in cases {
            assert_eq!(
                VerdictLabel::from_prediction(prediction).indicator(),
                expected,
                "{prediction:?}"
            );
        }
    }
}
