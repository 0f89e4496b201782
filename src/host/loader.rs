use std::{path::PathBuf, sync::Arc};

use reqwest::Client;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{config::PageConfig, infrastructure::shutdown::ShutdownListener};

use super::{DocumentPage, HostPage};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to read page file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("page answered with HTTP {0}")]
    Status(u16),
    #[error("cannot fetch a page over the `{0}` scheme")]
    UnsupportedScheme(String),
}

/// Keeps a [`DocumentPage`] current by re-reading its markup on a fixed tick.
pub struct PageLoader {
    client: Client,
    config: PageConfig,
    page: Arc<DocumentPage>,
}

impl PageLoader {
    pub fn new(client: Client, config: PageConfig, page: Arc<DocumentPage>) -> Self {
        Self {
            client,
            config,
            page,
        }
    }

    /// Reads the markup once. Returns whether the document changed.
    pub async fn refresh(&self) -> Result<bool, PageError> {
        let markup = match &self.config.source_file {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| PageError::Io {
                    path: path.clone(),
                    source,
                })?,
            None => self.fetch_remote().await?,
        };
        Ok(self.page.replace_document(markup))
    }

    async fn fetch_remote(&self) -> Result<String, PageError> {
        let url = self.page.location();
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PageError::UnsupportedScheme(url.scheme().to_string()));
        }

        let response = self
            .client
            .get(url)
            .timeout(self.config.fetch_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PageError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }

    pub fn spawn(self: Arc<Self>, mut shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            while shutdown.pause(self.config.refresh_interval).await {
                match self.refresh().await {
                    Ok(true) => tracing::trace!(target: "page", "page re-rendered"),
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!(target: "page", error = %err, "page refresh failed");
                    }
                }
            }
            tracing::info!(target: "page", "page loader stopped");
        })
    }
}
