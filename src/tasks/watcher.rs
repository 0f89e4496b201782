use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

use crate::{
    domain::{Intent, Platform},
    host::{HostPage, SurfaceNode},
    infrastructure::shutdown::ShutdownListener,
    tasks::scheduler::ScanScheduler,
};

const TELEGRAM_WATCH: &[&str] = &[".chat-input-main", ".bubbles-group", "body"];
const DISCORD_WATCH: &[&str] = &["[data-list-id=\"chat-messages\"]", "body"];
const GMAIL_WATCH: &[&str] = &["div[role=\"main\"]", "body"];
const GENERIC_WATCH: &[&str] = &["body"];

pub fn watch_locators(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Telegram => TELEGRAM_WATCH,
        Platform::Discord => DISCORD_WATCH,
        Platform::Gmail => GMAIL_WATCH,
        Platform::Generic => GENERIC_WATCH,
    }
}

/// Follows the best available surface and turns its mutations into `auto`
/// scan requests. The surface itself belongs to the page; only a weak
/// handle is kept, so a re-render that drops it detaches the watcher until
/// the next poll tick finds a replacement.
pub struct ChangeWatcher {
    host: Arc<dyn HostPage>,
    scheduler: Arc<ScanScheduler>,
    poll_interval: Duration,
}

struct Attachment {
    surface: Weak<SurfaceNode>,
    mutations: broadcast::Receiver<()>,
}

enum WatchEvent {
    Tick,
    Mutation,
    Detached,
    Shutdown,
}

impl ChangeWatcher {
    pub fn new(host: Arc<dyn HostPage>, scheduler: Arc<ScanScheduler>, poll_interval: Duration) -> Self {
        Self {
            host,
            scheduler,
            poll_interval,
        }
    }

    pub fn spawn(self: Arc<Self>, mut shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(&mut shutdown).await;
            tracing::info!(target: "watcher", "change watcher stopped");
        })
    }

    async fn run(&self, shutdown: &mut ShutdownListener) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut attachment: Option<Attachment> = None;

        loop {
            let event = tokio::select! {
                _ = shutdown.notified() => WatchEvent::Shutdown,
                _ = ticker.tick() => WatchEvent::Tick,
                event = next_mutation(attachment.as_mut()) => event,
            };

            match event {
                WatchEvent::Shutdown => break,
                WatchEvent::Tick => self.reattach(&mut attachment),
                WatchEvent::Mutation => {
                    self.scheduler.on_change(Intent::Auto).await;
                }
                WatchEvent::Detached => {
                    tracing::debug!(target: "watcher", "surface dropped by the page; waiting for re-attach");
                    attachment = None;
                }
            }
        }
    }

    /// Attaches to the first locator that currently resolves. Re-attaching
    /// to the surface already held is a no-op.
    fn reattach(&self, attachment: &mut Option<Attachment>) {
        let locators = watch_locators(self.host.platform());
        let Some(surface) = locators
            .iter()
            .find_map(|locator| self.host.resolve_surface(locator))
        else {
            return;
        };

        if let Some(current) = attachment.as_ref() {
            if Weak::ptr_eq(&current.surface, &Arc::downgrade(&surface)) {
                return;
            }
        }

        tracing::info!(target: "watcher", locator = surface.locator(), "attached to surface");
        *attachment = Some(Attachment {
            surface: Arc::downgrade(&surface),
            mutations: surface.subscribe(),
        });
    }
}

async fn next_mutation(attachment: Option<&mut Attachment>) -> WatchEvent {
    let Some(attachment) = attachment else {
        return futures::future::pending().await;
    };
    match attachment.mutations.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => WatchEvent::Mutation,
        Err(RecvError::Closed) => WatchEvent::Detached,
    }
}
