use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use nt_core::{BookmarkEntry, Error, ProfileStore, Result, UserProfile};
use tokio::sync::RwLock;

/// Process-local profile documents, keyed by user id.
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();
        Self {
            profiles: Arc::new(RwLock::new(profiles)),
        }
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::Store(format!("No profile for user {}", user_id)))
    }

    async fn update_bookmark_list(&self, user_id: &str, ids: &[String]) -> Result<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| Error::Store(format!("No profile for user {}", user_id)))?;
        profile.articles_bookmarked = ids.iter().map(|id| BookmarkEntry::Id(id.clone())).collect();
        Ok(profile.clone())
    }
}
