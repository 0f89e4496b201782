//! Per-page-load scan state.
//!
//! Each field has exactly one writer: the scheduler owns the text marks, the
//! presentation state machine consumes the deep-link flag (the deep-link
//! controller only arms it at start-up), and the sequence counter is
//! advanced by the scheduler.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct ScanSession {
    text: Mutex<TextMarks>,
    deep_link: Mutex<DeepLinkFlag>,
    sequence: AtomicU64,
}

/// `last` is the most recent text that produced a verdict; `in_flight` is
/// the text of the request currently on the wire.
#[derive(Debug, Default)]
struct TextMarks {
    last: Option<String>,
    in_flight: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeepLinkFlag {
    pub pending: bool,
    pub consumed: bool,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `text` as in flight. With `skip_unchanged` the claim is refused
    /// when the same text already produced a verdict or is still awaiting one.
    pub fn claim_text(&self, text: &str, skip_unchanged: bool) -> bool {
        let mut marks = self.text.lock();
        if skip_unchanged
            && (marks.last.as_deref() == Some(text) || marks.in_flight.as_deref() == Some(text))
        {
            return false;
        }
        marks.in_flight = Some(text.to_string());
        true
    }

    /// Releases a claim. Only a scanned text becomes `last`; a failed one
    /// stays eligible for the next attempt.
    pub fn release_text(&self, text: &str, scanned: bool) {
        let mut marks = self.text.lock();
        if marks.in_flight.as_deref() == Some(text) {
            marks.in_flight = None;
        }
        if scanned {
            marks.last = Some(text.to_string());
        }
    }

    pub fn arm_deep_link(&self) {
        let mut flag = self.deep_link.lock();
        if !flag.consumed {
            flag.pending = true;
        }
    }

    pub fn deep_link(&self) -> DeepLinkFlag {
        *self.deep_link.lock()
    }

    /// Consumes the one-shot flag. Returns `true` only for the first caller
    /// after arming.
    pub fn consume_deep_link(&self) -> bool {
        let mut flag = self.deep_link.lock();
        if flag.pending && !flag.consumed {
            flag.pending = false;
            flag.consumed = true;
            true
        } else {
            false
        }
    }

    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}
