pub mod snapshot;
pub mod types;
pub mod verdict;

pub use snapshot::Snapshot;
pub use types::{IndicatorState, Intent, Platform};
pub use verdict::{Verdict, VerdictLabel};
