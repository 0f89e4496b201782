pub mod overlay;
mod sink;
mod state;

pub use sink::ConsoleSink;
pub use state::{PresentationStateMachine, Presented};

#[cfg(test)]
pub(crate) use state::tests as testing;
