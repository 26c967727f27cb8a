pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod speech;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use fetch::MarkupFetcher;
pub use speech::SpeechEngine;
pub use storage::ProfileStore;
pub use types::{
    ArticleRef, ArticleSource, BookmarkDocument, BookmarkEntry, ContentBlock, ExtractedArticle,
    UserProfile,
};

pub mod prelude {
    pub use super::config::Config;
    pub use super::types::*;
    pub use super::{Error, MarkupFetcher, ProfileStore, Result, SpeechEngine};
}
