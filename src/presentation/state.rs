use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    classifier::ClassifyError,
    domain::{IndicatorState, Intent, Snapshot, Verdict},
    session::ScanSession,
};

use super::{overlay::Overlay, sink::PresentationSink};

/// Reconciles verdicts into the always-on indicator and the interruptive overlay.
///
/// The indicator follows every resolved response. The overlay is reserved
/// for explicit user requests and for the single verdict that follows an
/// alert deep link.
pub struct PresentationStateMachine {
    session: Arc<ScanSession>,
    sink: Arc<dyn PresentationSink>,
    drop_stale: bool,
    track: Mutex<Track>,
}

#[derive(Debug, Default)]
struct Track {
    current: IndicatorState,
    settled: IndicatorState,
    newest_applied: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presented {
    IndicatorOnly(IndicatorState),
    WithOverlay(IndicatorState, Overlay),
    /// An older response arrived after a newer one had been applied and
    /// nothing asked to see it.
    Stale,
}

impl PresentationStateMachine {
    pub fn new(session: Arc<ScanSession>, sink: Arc<dyn PresentationSink>, drop_stale: bool) -> Self {
        Self {
            session,
            sink,
            drop_stale,
            track: Mutex::new(Track::default()),
        }
    }

    pub fn indicator(&self) -> IndicatorState {
        self.track.lock().current
    }

    pub fn begin_scan(&self) {
        self.track.lock().current = IndicatorState::Scanning;
        self.sink.indicator(IndicatorState::Scanning);
    }

    pub fn apply(&self, sequence: u64, intent: Intent, verdict: &Verdict, snapshot: &Snapshot) -> Presented {
        let (state, fresh) = {
            let mut track = self.track.lock();
            let fresh = !(self.drop_stale && sequence < track.newest_applied);
            if fresh {
                track.newest_applied = track.newest_applied.max(sequence);
                track.settled = verdict.label.indicator();
            }
            track.current = track.settled;
            (track.current, fresh)
        };
        self.sink.indicator(state);
        if !fresh {
            tracing::debug!(
                target: "presentation",
                sequence,
                indicator = %state,
                "stale verdict kept off the indicator"
            );
        }

        // A stale verdict still answers an explicit request.
        if !self.overlay_allowed(intent) {
            tracing::debug!(target: "presentation", %intent, indicator = %state, "overlay suppressed");
            return if fresh {
                Presented::IndicatorOnly(state)
            } else {
                Presented::Stale
            };
        }

        let overlay = Overlay::build(verdict, &snapshot.text);
        self.sink.overlay(&overlay);
        Presented::WithOverlay(state, overlay)
    }

    /// Ends a scan without a verdict. The indicator falls back to the last
    /// settled state; an error never reads as "safe".
    pub fn fail(&self, intent: Intent, error: &ClassifyError) {
        let settled = {
            let mut track = self.track.lock();
            track.current = track.settled;
            track.settled
        };
        self.sink.indicator(settled);

        if intent == Intent::Manual {
            self.sink.notice(&format!("Scan failed: {error}"));
        }
    }

    fn overlay_allowed(&self, intent: Intent) -> bool {
        // A pending deep link is spent by whichever verdict lands first.
        let deep_link = self.session.consume_deep_link();
        match intent {
            Intent::Manual => true,
            Intent::Auto | Intent::DeepLink => deep_link,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{Platform, VerdictLabel};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Event {
        Indicator(IndicatorState),
        Overlay(String),
        Notice(String),
    }

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) events: Mutex<Vec<Event>>,
    }

    impl RecordingSink {
        pub(crate) fn overlays(&self) -> usize {
            self.events
                .lock()
                .iter()
                .filter(|e| matches!(e, Event::Overlay(_)))
                .count()
        }

        pub(crate) fn notices(&self) -> Vec<String> {
            self.events
                .lock()
                .iter()
                .filter_map(|e| match e {
                    Event::Notice(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl PresentationSink for RecordingSink {
        fn indicator(&self, state: IndicatorState) {
            self.events.lock().push(Event::Indicator(state));
        }

        fn overlay(&self, overlay: &Overlay) {
            self.events.lock().push(Event::Overlay(overlay.body_html.clone()));
        }

        fn notice(&self, message: &str) {
            self.events.lock().push(Event::Notice(message.to_string()));
        }
    }

    pub(crate) fn verdict(prediction: &str) -> Verdict {
        Verdict {
            label: VerdictLabel::from_prediction(prediction),
            prediction: prediction.to_string(),
            confidence: "88.00%".to_string(),
            keywords: vec![],
            snippets: vec![],
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new("click here to login".into(), "https://web.telegram.org/k/".into(), Platform::Telegram)
    }

    fn machine(drop_stale: bool) -> (PresentationStateMachine, Arc<RecordingSink>, Arc<ScanSession>) {
        let session = Arc::new(ScanSession::new());
        let sink = Arc::new(RecordingSink::default());
        let machine = PresentationStateMachine::new(session.clone(), sink.clone(), drop_stale);
        (machine, sink, session)
    }

    #[test]
    fn auto_verdicts_only_touch_the_indicator() {
        let (machine, sink, _) = machine(false);
        machine.begin_scan();
        assert_eq!(machine.indicator(), IndicatorState::Scanning);

        let presented = machine.apply(1, Intent::Auto, &verdict("Phishing Message"), &snapshot());
        assert_eq!(presented, Presented::IndicatorOnly(IndicatorState::Danger));
        assert_eq!(machine.indicator(), IndicatorState::Danger);
        assert_eq!(sink.overlays(), 0);
        assert_eq!(
            *sink.events.lock(),
            vec![
                Event::Indicator(IndicatorState::Scanning),
                Event::Indicator(IndicatorState::Danger)
            ]
        );
    }

    #[test]
    fn manual_verdicts_always_show_overlay() {
        let (machine, sink, _) = machine(false);
        for _ in 0..2 {
            machine.begin_scan();
            let presented = machine.apply(1, Intent::Manual, &verdict("Safe Message"), &snapshot());
            assert!(matches!(presented, Presented::WithOverlay(IndicatorState::Safe, _)));
        }
        assert_eq!(sink.overlays(), 2);
    }

    #[test]
    fn deep_link_overlay_fires_once() {
        let (machine, sink, session) = machine(false);
        session.arm_deep_link();

        machine.apply(1, Intent::Auto, &verdict("Suspicious Message"), &snapshot());
        machine.apply(2, Intent::Auto, &verdict("Suspicious Message"), &snapshot());
        machine.apply(3, Intent::DeepLink, &verdict("Phishing Message"), &snapshot());

        assert_eq!(sink.overlays(), 1);
        assert!(session.deep_link().consumed);
    }

    #[test]
    fn deep_link_intent_without_pending_flag_stays_quiet() {
        let (machine, sink, _) = machine(false);
        let presented = machine.apply(1, Intent::DeepLink, &verdict("Phishing Message"), &snapshot());
        assert_eq!(presented, Presented::IndicatorOnly(IndicatorState::Danger));
        assert_eq!(sink.overlays(), 0);
    }

    #[test]
    fn manual_verdict_spends_pending_deep_link() {
        let (machine, sink, session) = machine(false);
        session.arm_deep_link();
        machine.apply(1, Intent::Manual, &verdict("Safe Message"), &snapshot());
        machine.apply(2, Intent::Auto, &verdict("Phishing Message"), &snapshot());
        assert_eq!(sink.overlays(), 1);
    }

    #[test]
    fn failure_restores_prior_state_and_notifies_on_manual_only() {
        let (machine, sink, _) = machine(false);
        machine.apply(1, Intent::Auto, &verdict("Suspicious Message"), &snapshot());

        machine.begin_scan();
        machine.fail(Intent::Auto, &ClassifyError::Status(502));
        assert_eq!(machine.indicator(), IndicatorState::Suspicious);
        assert!(sink.notices().is_empty());

        machine.begin_scan();
        machine.fail(Intent::Manual, &ClassifyError::Network("connection refused".into()));
        assert_eq!(machine.indicator(), IndicatorState::Suspicious);
        assert_eq!(
            sink.notices(),
            vec!["Scan failed: classifier unreachable: connection refused".to_string()]
        );
        assert_eq!(sink.overlays(), 0);
    }

    #[test]
    fn failure_before_any_verdict_never_reads_as_safe() {
        let (machine, _, _) = machine(false);
        machine.begin_scan();
        machine.fail(Intent::Auto, &ClassifyError::Malformed("eof".into()));
        assert_eq!(machine.indicator(), IndicatorState::Idle);
    }

    #[test]
    fn last_arrival_wins_by_default() {
        let (machine, _, _) = machine(false);
        machine.apply(2, Intent::Auto, &verdict("Phishing Message"), &snapshot());
        machine.apply(1, Intent::Auto, &verdict("Safe Message"), &snapshot());
        assert_eq!(machine.indicator(), IndicatorState::Safe);
    }

    #[test]
    fn stale_responses_can_be_dropped() {
        let (machine, _, _) = machine(true);
        machine.begin_scan();
        machine.begin_scan();
        machine.apply(2, Intent::Auto, &verdict("Phishing Message"), &snapshot());
        let presented = machine.apply(1, Intent::Auto, &verdict("Safe Message"), &snapshot());
        assert_eq!(presented, Presented::Stale);
        assert_eq!(machine.indicator(), IndicatorState::Danger);
    }

    #[test]
    fn stale_manual_verdict_still_shows_overlay() {
        let (machine, sink, _) = machine(true);
        machine.apply(2, Intent::Auto, &verdict("Phishing Message"), &snapshot());
        let presented = machine.apply(1, Intent::Manual, &verdict("Safe Message"), &snapshot());

        match presented {
            Presented::WithOverlay(state, overlay) => {
                assert_eq!(state, IndicatorState::Danger);
                assert_eq!(overlay.label, VerdictLabel::Safe);
            }
            other => panic!("expected an overlay, got {other:?}"),
        }
        assert_eq!(machine.indicator(), IndicatorState::Danger);
        assert_eq!(sink.overlays(), 1);
    }
}
