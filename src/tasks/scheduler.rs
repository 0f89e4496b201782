use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{
    task::JoinHandle,
    time::{sleep, timeout},
};

use crate::{
    classifier::{Classifier, ClassifyError},
    domain::Intent,
    extractor::Extractor,
    host::HostPage,
    presentation::{PresentationStateMachine, Presented},
    session::ScanSession,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Parked in the debounce slot; a later change may replace it.
    Deferred,
    Skipped(SkipReason),
    Presented(Presented),
    Failed(ClassifyError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    Unchanged,
}

pub struct ScanScheduler {
    host: Arc<dyn HostPage>,
    extractor: Extractor,
    classifier: Arc<dyn Classifier>,
    presentation: Arc<PresentationStateMachine>,
    session: Arc<ScanSession>,
    debounce: Duration,
    manual_timeout: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ScanScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: Arc<dyn HostPage>,
        extractor: Extractor,
        classifier: Arc<dyn Classifier>,
        presentation: Arc<PresentationStateMachine>,
        session: Arc<ScanSession>,
        debounce: Duration,
        manual_timeout: Duration,
    ) -> Self {
        Self {
            host,
            extractor,
            classifier,
            presentation,
            session,
            debounce,
            manual_timeout,
            pending: Mutex::new(None),
        }
    }

    /// Entry point for every scan trigger. `Auto` collapses into a trailing
    /// debounce window; `Manual` and `DeepLink` run right away.
    pub async fn on_change(self: &Arc<Self>, intent: Intent) -> ScanOutcome {
        match intent {
            Intent::Auto => {
                self.schedule_debounced();
                ScanOutcome::Deferred
            }
            Intent::Manual | Intent::DeepLink => self.run_scan(intent).await,
        }
    }

    /// Runs `on_change` on its own task so the caller never waits on the
    /// classifier. Deep-link scans have no timeout.
    pub fn dispatch(self: &Arc<Self>, intent: Intent) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.on_change(intent).await;
            tracing::info!(target: "scheduler", %intent, ?outcome, "dispatched scan finished");
        })
    }

    fn schedule_debounced(self: &Arc<Self>) {
        let this = self.clone();
        let task = tokio::spawn(async move {
            sleep(this.debounce).await;
            // Detached: replacing the slot later must not abort a live request.
            tokio::spawn(async move {
                this.run_scan(Intent::Auto).await;
            });
        });
        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    pub fn cancel_pending(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }

    pub async fn run_scan(&self, intent: Intent) -> ScanOutcome {
        let snapshot = self.extractor.extract(self.host.as_ref());
        if snapshot.is_empty() {
            tracing::trace!(target: "scheduler", %intent, "nothing to scan");
            return ScanOutcome::Skipped(SkipReason::Empty);
        }
        if !self.session.claim_text(&snapshot.text, intent == Intent::Auto) {
            tracing::trace!(target: "scheduler", "snapshot unchanged or already in flight; skipping");
            return ScanOutcome::Skipped(SkipReason::Unchanged);
        }

        let sequence = self.session.next_sequence();
        tracing::info!(
            target: "scheduler",
            %intent,
            sequence,
            platform = snapshot.platform.wire_label(),
            chars = snapshot.text.chars().count(),
            taken_at = %snapshot.taken_at,
            "dispatching scan"
        );
        self.presentation.begin_scan();

        let result = match intent {
            Intent::Manual => timeout(self.manual_timeout, self.classifier.classify(&snapshot))
                .await
                .unwrap_or(Err(ClassifyError::TimedOut(self.manual_timeout))),
            Intent::Auto | Intent::DeepLink => self.classifier.classify(&snapshot).await,
        };

        self.session.release_text(&snapshot.text, result.is_ok());
        match result {
            Ok(verdict) => {
                tracing::info!(
                    target: "scheduler",
                    %intent,
                    sequence,
                    prediction = %verdict.prediction,
                    confidence = %verdict.confidence,
                    "scan resolved"
                );
                ScanOutcome::Presented(self.presentation.apply(sequence, intent, &verdict, &snapshot))
            }
            Err(err) => {
                tracing::warn!(target: "scheduler", %intent, sequence, error = %err, "scan failed");
                self.presentation.fail(intent, &err);
                ScanOutcome::Failed(err)
            }
        }
    }
}
