mod app;
mod classifier;
mod config;
mod console;
mod deeplink;
mod domain;
mod extractor;
mod host;
mod infrastructure;
mod presentation;
mod session;
mod tasks;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::SentinelApp::initialize(config, paths, shutdown.clone()).await?;
    app.run().await?;

    // A pending blocking stdin read would keep the runtime from shutting down.
    std::process::exit(0);
}
