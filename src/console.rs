use std::sync::Arc;

use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    task::JoinHandle,
};

use crate::{
    domain::Intent,
    infrastructure::shutdown::{Shutdown, ShutdownListener},
    presentation::PresentationStateMachine,
    tasks::scheduler::{ScanOutcome, ScanScheduler, SkipReason},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Scan,
    Status,
    Quit,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "scan" | "s" => Some(Command::Scan),
            "status" => Some(Command::Status),
            "quit" | "exit" | "q" => Some(Command::Quit),
            _ => Some(Command::Unknown),
        }
    }
}

/// Stdin stand-in for the floating on-page button.
pub struct ConsoleControls {
    scheduler: Arc<ScanScheduler>,
    presentation: Arc<PresentationStateMachine>,
    shutdown: Shutdown,
}

impl ConsoleControls {
    pub fn new(
        scheduler: Arc<ScanScheduler>,
        presentation: Arc<PresentationStateMachine>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            scheduler,
            presentation,
            shutdown,
        }
    }

    pub fn spawn(self, mut listener: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut lines = BufReader::new(io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    _ = listener.notified() => break,
                    line = lines.next_line() => line,
                };
                match line {
                    Ok(Some(line)) => {
                        if let Some(command) = Command::parse(&line) {
                            if !self.handle(command).await {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(target: "console", "stdin closed; console controls disabled");
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(target: "console", error = %err, "failed to read stdin");
                        break;
                    }
                }
            }
        })
    }

    /// Returns `false` once the controls should stop.
    async fn handle(&self, command: Command) -> bool {
        match command {
            Command::Scan => {
                match self.scheduler.on_change(Intent::Manual).await {
                    ScanOutcome::Skipped(SkipReason::Empty) => {
                        tracing::info!(target: "console", "no scannable text on the page yet");
                    }
                    outcome => tracing::debug!(target: "console", ?outcome, "manual scan finished"),
                }
                true
            }
            Command::Status => {
                let indicator = self.presentation.indicator();
                tracing::info!(target: "console", %indicator, glyph = indicator.glyph(), "current status");
                true
            }
            Command::Quit => {
                self.shutdown.trigger();
                false
            }
            Command::Unknown => {
                tracing::info!(target: "console", "commands: scan | status | quit");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  SCAN\n"), Some(Command::Scan));
        assert_eq!(Command::parse("s"), Some(Command::Scan));
        assert_eq!(Command::parse("status"), Some(Command::Status));
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(Command::parse("help"), Some(Command::Unknown));
        assert_eq!(Command::parse("   "), None);
    }
}
