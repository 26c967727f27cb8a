use async_trait::async_trait;
use crate::types::ArticleSource;
use crate::Result;

#[async_trait]
pub trait MarkupFetcher: Send + Sync {
    /// Retrieve the raw markup of an article page
    async fn fetch_article_markup(&self, url: &str) -> Result<ArticleSource>;
}
