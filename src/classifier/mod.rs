mod client;
pub mod inference;

use std::time::Duration;

use thiserror::Error;

pub use client::{Classifier, HttpClassifier};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("classifier unreachable: {0}")]
    Network(String),
    #[error("classifier answered with HTTP {0}")]
    Status(u16),
    #[error("classifier response was malformed: {0}")]
    Malformed(String),
    #[error("classifier did not answer within {0:?}")]
    TimedOut(Duration),
}
