use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::{
    classifier::HttpClassifier,
    config::AppConfig,
    console::ConsoleControls,
    deeplink,
    domain::Intent,
    extractor::Extractor,
    host::{DocumentPage, HostPage, PageLoader},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    presentation::{ConsoleSink, PresentationStateMachine},
    session::ScanSession,
    tasks::{lobby::LobbyTriage, scheduler::ScanScheduler, watcher::ChangeWatcher},
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct SentinelApp {
    _paths: ResolvedPaths,
    config: Arc<AppConfig>,
    page: Arc<DocumentPage>,
    loader: Arc<PageLoader>,
    session: Arc<ScanSession>,
    presentation: Arc<PresentationStateMachine>,
    scheduler: Arc<ScanScheduler>,
    shutdown: Shutdown,
}

impl SentinelApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let http_client = Client::builder()
            .user_agent(format!("phish-sentinel/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let page = Arc::new(DocumentPage::new(config.page.url.clone(), String::new()));
        let loader = Arc::new(PageLoader::new(
            http_client.clone(),
            config.page.clone(),
            page.clone(),
        ));

        let session = Arc::new(ScanSession::new());
        let sink = Arc::new(ConsoleSink::new(paths.overlay_path.clone()));
        let presentation = Arc::new(PresentationStateMachine::new(
            session.clone(),
            sink,
            config.scan.drop_stale_responses,
        ));
        let classifier = Arc::new(HttpClassifier::new(http_client, config.classifier.clone()));
        let scheduler = Arc::new(ScanScheduler::new(
            page.clone(),
            Extractor::new(config.scan.recent_message_limit),
            classifier,
            presentation.clone(),
            session.clone(),
            config.scan.debounce,
            config.scan.manual_timeout,
        ));

        Ok(Self {
            _paths: paths,
            config,
            page,
            loader,
            session,
            presentation,
            scheduler,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let SentinelApp {
            _paths: _,
            config,
            page,
            loader,
            session,
            presentation,
            scheduler,
            shutdown,
        } = self;

        tracing::info!(
            page = %config.page.url,
            platform = ?page.platform(),
            "phishing sentinel started"
        );

        let armed = deeplink::arm_from_location(page.as_ref(), &session);

        if let Err(err) = loader.refresh().await {
            tracing::warn!(target: "page", error = %err, "initial page load failed; will retry");
        }

        let host: Arc<dyn HostPage> = page.clone();
        let mut handles: Vec<JoinHandle<()>> = vec![
            loader.clone().spawn(shutdown.subscribe()),
            Arc::new(ChangeWatcher::new(
                host.clone(),
                scheduler.clone(),
                config.scan.surface_poll_interval,
            ))
            .spawn(shutdown.subscribe()),
            Arc::new(LobbyTriage::new(host, config.scan.lobby_poll_interval))
                .spawn(shutdown.subscribe()),
        ];
        let console = ConsoleControls::new(scheduler.clone(), presentation.clone(), shutdown.clone())
            .spawn(shutdown.subscribe());

        if armed {
            tracing::info!(target: "deeplink", "dispatching deep-link scan");
            handles.push(scheduler.dispatch(Intent::DeepLink));
        }

        let mut listener = shutdown.subscribe();
        listener.notified().await;
        tracing::info!("shutdown requested");
        scheduler.cancel_pending();

        // The stdin reader cannot be interrupted; do not wait on it.
        console.abort();
        handles.retain(|handle| !handle.is_finished());
        let wait_all = futures::future::join_all(handles.iter_mut());
        if tokio::time::timeout(SHUTDOWN_GRACE, wait_all).await.is_err() {
            tracing::warn!("background tasks did not stop within {:?}; aborting", SHUTDOWN_GRACE);
            for handle in &handles {
                handle.abort();
            }
        }

        tracing::info!(
            indicator = %presentation.indicator(),
            deep_link = ?session.deep_link(),
            "phishing sentinel stopped"
        );
        Ok(())
    }
}
