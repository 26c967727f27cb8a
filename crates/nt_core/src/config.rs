use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

pub const CONFIG_ENV: &str = "NT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extractor: Markers,
    pub speech: SpeechConfig,
    pub fetch: FetchConfig,
    pub store: StoreConfig,
}

/// Structural markers of the supported page layout family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub article_id_prefix: String,
    pub author_name: String,
    pub author_avatar: String,
    pub title: String,
    pub lead: String,
    pub cover_image: String,
    pub views_test_id: String,
    pub content: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            article_id_prefix: "article-".into(),
            author_name: "post-meta__author-name".into(),
            author_avatar: "post-meta__author-avatar".into(),
            title: "post__title".into(),
            lead: "post__block_lead-text".into(),
            cover_image: "post-cover__image".into(),
            views_test_id: "post-views".into(),
            content: "post-content".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub words_per_minute: f64,
    /// Failed chunks in a row before playback pauses itself.
    pub max_consecutive_errors: usize,
    /// Program and leading arguments; the chunk text is appended last.
    pub command: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150.0,
            max_consecutive_errors: 3,
            command: vec!["espeak-ng".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: concat!("nt/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub user_collection_id: String,
    pub api_key: Option<String>,
}

impl StoreConfig {
    fn apply_env(&mut self) {
        let overrides: [(&str, &mut String); 4] = [
            ("NT_STORE_ENDPOINT", &mut self.endpoint),
            ("NT_STORE_PROJECT", &mut self.project_id),
            ("NT_STORE_DATABASE_ID", &mut self.database_id),
            ("NT_STORE_USER_COLLECTION_ID", &mut self.user_collection_id),
        ];
        for (key, slot) in overrides {
            if let Ok(value) = env::var(key) {
                *slot = value;
            }
        }
        if let Ok(key) = env::var("NT_STORE_API_KEY") {
            self.api_key = Some(key);
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.endpoint.is_empty()
            && !self.project_id.is_empty()
            && !self.database_id.is_empty()
            && !self.user_collection_id.is_empty()
    }
}

impl Config {
    /// Load from `path`, else from `$NT_CONFIG`, else defaults. Store settings
    /// can be overridden through `NT_STORE_*` variables in every case.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration");
                let raw = fs::read_to_string(&path)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.store.apply_env();
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }
}
