use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use nt_core::config::FetchConfig;
use nt_core::{ArticleSource, Error, MarkupFetcher, Result};
use tracing::{debug, info};
use url::Url;

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MarkupFetcher for HttpFetcher {
    async fn fetch_article_markup(&self, url: &str) -> Result<ArticleSource> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("Unsupported scheme: {}", url)));
        }

        info!(url = %parsed, "Fetching article markup");
        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned {}", parsed, status)));
        }
        let markup = response.text().await?;
        debug!(url = %parsed, bytes = markup.len(), "Fetched article markup");

        Ok(ArticleSource {
            url: parsed.to_string(),
            markup,
        })
    }
}

/// Reads saved pages from disk; accepts plain paths and `file://` URLs.
#[derive(Debug, Default, Clone)]
pub struct FileFetcher;

#[async_trait]
impl MarkupFetcher for FileFetcher {
    async fn fetch_article_markup(&self, url: &str) -> Result<ArticleSource> {
        let path = match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map_err(|_| Error::InvalidUrl(url.to_string()))?,
            _ => PathBuf::from(url),
        };
        let markup = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", path.display(), e)))?;
        Ok(ArticleSource {
            url: url.to_string(),
            markup,
        })
    }
}

/// HTTP(S) links go over the network, anything else is read from disk.
pub fn fetcher_for(input: &str, config: &FetchConfig) -> Result<Box<dyn MarkupFetcher>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        Ok(Box::new(HttpFetcher::new(config)?))
    } else {
        Ok(Box::new(FileFetcher))
    }
}
