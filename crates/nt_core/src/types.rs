use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw markup of an article page, as fetched.
#[derive(Debug, Clone)]
pub struct ArticleSource {
    pub url: String,
    pub markup: String,
}

/// List item that opens an article screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "titleUrl")]
    pub title_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedArticle {
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub lead: String,
    pub cover_image_url: String,
    pub view_count: String,
    pub content_blocks: Vec<ContentBlock>,
}

impl ExtractedArticle {
    pub fn text_blocks(&self) -> impl Iterator<Item = &str> {
        self.content_blocks.iter().filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Image { .. } => None,
        })
    }

    /// Title, lead and every paragraph, in reading order, joined by single spaces.
    pub fn speakable_text(&self) -> String {
        [self.title.as_str(), self.lead.as_str()]
            .into_iter()
            .chain(self.text_blocks())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkDocument {
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "titleUrl", default, skip_serializing_if = "Option::is_none")]
    pub title_url: Option<String>,
}

/// One entry of a profile's bookmark list. The store hands back either bare
/// identifiers or the expanded article documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookmarkEntry {
    Id(String),
    Document(BookmarkDocument),
}

impl BookmarkEntry {
    pub fn id(&self) -> Option<&str> {
        let id = match self {
            BookmarkEntry::Id(id) => Some(id.as_str()),
            BookmarkEntry::Document(doc) => doc.doc_id.as_deref().or(doc.id.as_deref()),
        };
        id.filter(|id| !id.is_empty())
    }
}

impl From<&str> for BookmarkEntry {
    fn from(id: &str) -> Self {
        BookmarkEntry::Id(id.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "accountId", default)]
    pub account_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "articlesBookmarked", default)]
    pub articles_bookmarked: Vec<BookmarkEntry>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Bookmark list normalized to unique identifiers, first occurrence wins.
    pub fn bookmarked_ids(&self) -> Vec<String> {
        normalize_bookmarks(&self.articles_bookmarked)
    }

    pub fn has_bookmarked(&self, article_id: &str) -> bool {
        self.articles_bookmarked
            .iter()
            .any(|entry| entry.id() == Some(article_id))
    }
}

pub fn normalize_bookmarks(entries: &[BookmarkEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(BookmarkEntry::id)
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
