use std::sync::Arc;

use nt_core::{BookmarkEntry, ProfileStore, Result, UserProfile};
use tokio::sync::watch;
use tracing::{debug, info};

/// The signed-in user's profile, shared by every screen. Writers replace the
/// bookmark list as a whole; readers can subscribe to changes.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<UserProfile>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_user(profile: UserProfile) -> Self {
        let session = Self::new();
        session.sign_in(profile);
        session
    }

    pub fn sign_in(&self, profile: UserProfile) {
        info!(user_id = %profile.id, "Session started");
        self.tx.send_replace(Some(profile));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("Session ended");
        }
    }

    pub fn current(&self) -> Option<UserProfile> {
        self.tx.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|profile| profile.id.clone())
    }

    pub fn bookmarks(&self) -> Vec<String> {
        self.tx
            .borrow()
            .as_ref()
            .map(UserProfile::bookmarked_ids)
            .unwrap_or_default()
    }

    pub fn is_bookmarked(&self, article_id: &str) -> bool {
        self.tx
            .borrow()
            .as_ref()
            .is_some_and(|profile| profile.has_bookmarked(article_id))
    }

    /// Replace the bookmark list of the current user. Returns false when
    /// nobody is signed in.
    pub fn set_bookmarks(&self, entries: Vec<BookmarkEntry>) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(profile) => {
                profile.articles_bookmarked = entries;
                true
            }
            None => false,
        })
    }

    /// Like [`Self::set_bookmarks`], but only while `user_id` is still the
    /// signed-in user.
    pub fn set_bookmarks_for(&self, user_id: &str, entries: Vec<BookmarkEntry>) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(profile) if profile.id == user_id => {
                profile.articles_bookmarked = entries;
                true
            }
            _ => {
                debug!(user_id, "Dropping bookmark update for a user no longer signed in");
                false
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.tx.subscribe()
    }

    /// Re-read the signed-in user's profile from the store.
    pub async fn refresh(&self, store: &dyn ProfileStore) -> Result<Option<UserProfile>> {
        let Some(user_id) = self.user_id() else {
            return Ok(None);
        };
        let profile = store.get_profile(&user_id).await?;
        let replaced = self.tx.send_if_modified(|current| match current {
            Some(existing) if existing.id == profile.id => {
                *existing = profile.clone();
                true
            }
            _ => false,
        });
        Ok(replaced.then_some(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryProfileStore;

    fn profile(id: &str, bookmarks: &[&str]) -> UserProfile {
        UserProfile {
            articles_bookmarked: bookmarks.iter().map(|b| BookmarkEntry::from(*b)).collect(),
            ..UserProfile::new(id)
        }
    }

    #[test]
    fn test_no_session() {
        let session = SessionStore::new();
        assert!(session.current().is_none());
        assert!(session.bookmarks().is_empty());
        assert!(!session.is_bookmarked("a"));
        assert!(!session.set_bookmarks(vec!["a".into()]));
    }

    #[test]
    fn test_set_bookmarks_notifies() {
        let session = SessionStore::with_user(profile("u1", &["a", "a", "b"]));
        assert_eq!(session.bookmarks(), vec!["a", "b"]);

        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());
        assert!(session.set_bookmarks(vec!["c".into()]));
        assert!(rx.has_changed().unwrap());
        assert_eq!(session.bookmarks(), vec!["c"]);
    }

    #[test]
    fn test_set_bookmarks_for_other_user_is_ignored() {
        let session = SessionStore::with_user(profile("u1", &["a"]));
        assert!(!session.set_bookmarks_for("u2", vec!["z".into()]));
        assert_eq!(session.bookmarks(), vec!["a"]);
        session.sign_out();
        assert!(!session.set_bookmarks_for("u1", vec!["z".into()]));
    }

    #[test]
    fn test_clones_share_state() {
        let session = SessionStore::with_user(profile("u1", &[]));
        let other = session.clone();
        other.set_bookmarks(vec!["x".into()]);
        assert!(session.is_bookmarked("x"));
    }

    #[tokio::test]
    async fn test_refresh_from_store() {
        let store = MemoryProfileStore::with_profiles([profile("u1", &["remote"])]);
        let session = SessionStore::with_user(profile("u1", &["stale"]));
        let refreshed = session.refresh(&store).await.unwrap();
        assert_eq!(refreshed.map(|p| p.bookmarked_ids()), Some(vec!["remote".to_string()]));
        assert_eq!(session.bookmarks(), vec!["remote"]);

        let nobody = SessionStore::new();
        assert!(nobody.refresh(&store).await.unwrap().is_none());
    }
}
