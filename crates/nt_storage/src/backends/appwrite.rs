use std::fmt;

use async_trait::async_trait;
use nt_core::config::StoreConfig;
use nt_core::{Error, ProfileStore, Result, UserProfile};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

/// Profile documents stored in an Appwrite database collection, reached over
/// its REST API.
pub struct AppwriteProfileStore {
    client: Client,
    config: StoreConfig,
}

impl fmt::Debug for AppwriteProfileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteProfileStore")
            .field("endpoint", &self.config.endpoint)
            .field("project_id", &self.config.project_id)
            .field("database_id", &self.config.database_id)
            .field("user_collection_id", &self.config.user_collection_id)
            .field("api_key", &self.config.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AppwriteProfileStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        if !config.is_complete() {
            return Err(Error::Config(
                "store.endpoint, store.project_id, store.database_id and store.user_collection_id are required"
                    .to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    fn document_url(&self, user_id: &str) -> Result<Url> {
        let endpoint = &self.config.endpoint;
        let mut url =
            Url::parse(endpoint).map_err(|e| Error::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{}: not a base URL", endpoint)))?
            .pop_if_empty()
            .extend([
                "databases",
                self.config.database_id.as_str(),
                "collections",
                self.config.user_collection_id.as_str(),
                "documents",
                user_id,
            ]);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("X-Appwrite-Project", &self.config.project_id);
        match &self.config.api_key {
            Some(key) => request.header("X-Appwrite-Key", key),
            None => request,
        }
    }

    async fn read_profile(url: &Url, response: Response) -> Result<UserProfile> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!("{} returned {}: {}", url, status, body)));
        }
        let profile = response.json::<UserProfile>().await?;
        Ok(profile)
    }
}

#[async_trait]
impl ProfileStore for AppwriteProfileStore {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        let url = self.document_url(user_id)?;
        debug!(%url, "Fetching profile document");
        let response = self.authorize(self.client.get(url.clone())).send().await?;
        Self::read_profile(&url, response).await
    }

    async fn update_bookmark_list(&self, user_id: &str, ids: &[String]) -> Result<UserProfile> {
        let url = self.document_url(user_id)?;
        info!(user_id, bookmarks = ids.len(), "Updating bookmark list");
        let body = json!({ "data": { "articlesBookmarked": ids } });
        let response = self
            .authorize(self.client.patch(url.clone()))
            .json(&body)
            .send()
            .await?;
        Self::read_profile(&url, response).await
    }
}
