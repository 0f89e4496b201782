use futures::future::BoxFuture;
use reqwest::Client;

use crate::{
    config::ClassifierConfig,
    domain::{Snapshot, Verdict},
};

use super::{
    inference::{build_request, parse_response},
    ClassifyError,
};

/// One request, one verdict. No retries; timeouts are the caller's concern.
pub trait Classifier: Send + Sync {
    fn classify<'a>(&'a self, snapshot: &'a Snapshot) -> BoxFuture<'a, Result<Verdict, ClassifyError>>;
}

#[derive(Clone)]
pub struct HttpClassifier {
    http: Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    pub fn new(http: Client, config: ClassifierConfig) -> Self {
        Self { http, config }
    }

    async fn request(&self, snapshot: &Snapshot) -> Result<Verdict, ClassifyError> {
        let payload = build_request(self.config.payload, snapshot);
        let response = self
            .http
            .post(self.config.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|err| ClassifyError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| ClassifyError::Network(err.to_string()))?;
        let verdict = parse_response(&body)?;

        tracing::debug!(
            target: "classifier",
            prediction = %verdict.prediction,
            confidence = %verdict.confidence,
            keywords = verdict.keywords.len(),
            snippets = verdict.snippets.len(),
            "verdict received"
        );
        Ok(verdict)
    }
}

impl Classifier for HttpClassifier {
    fn classify<'a>(&'a self, snapshot: &'a Snapshot) -> BoxFuture<'a, Result<Verdict, ClassifyError>> {
        Box::pin(self.request(snapshot))
    }
}
