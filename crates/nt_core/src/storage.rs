use async_trait::async_trait;
use crate::types::UserProfile;
use crate::Result;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile document of a user
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile>;

    /// Replace the bookmark list of a user, returning the stored profile
    async fn update_bookmark_list(&self, user_id: &str, ids: &[String]) -> Result<UserProfile>;
}
