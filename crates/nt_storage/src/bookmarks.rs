//! Optimistic bookmark toggling.
//!
//! The flag flips the moment a toggle is requested; the new list is then
//! written to the profile store. On success the session takes the store's
//! list as-is, on failure the flag goes back and the session is untouched.
//! One request at a time per synchronizer: a toggle while another is pending
//! is rejected without flipping.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nt_core::{Error, ProfileStore, Result, UserProfile};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookmarkState {
    pub is_bookmarked: bool,
    pub in_flight: bool,
}

/// Appends `article_id` unless it is already present.
pub fn add_bookmark(ids: &[String], article_id: &str) -> Vec<String> {
    let mut updated = ids.to_vec();
    if !updated.iter().any(|id| id == article_id) {
        updated.push(article_id.to_string());
    }
    updated
}

pub fn remove_bookmark(ids: &[String], article_id: &str) -> Vec<String> {
    ids.iter().filter(|id| *id != article_id).cloned().collect()
}

struct PendingToggle {
    previous: bool,
    target: bool,
    user: UserProfile,
}

/// Bookmark flag of one article for the signed-in user.
#[derive(Clone)]
pub struct BookmarkSynchronizer {
    article_id: Arc<str>,
    store: Arc<dyn ProfileStore>,
    session: SessionStore,
    state: Arc<Mutex<BookmarkState>>,
}

impl BookmarkSynchronizer {
    pub fn new(store: Arc<dyn ProfileStore>, session: SessionStore, article_id: &str) -> Self {
        Self {
            article_id: Arc::from(article_id),
            store,
            session,
            state: Arc::new(Mutex::new(BookmarkState::default())),
        }
    }

    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    pub fn state(&self) -> BookmarkState {
        *self.lock()
    }

    /// Re-derive the flag from the session's bookmark list. A pending toggle
    /// keeps its optimistic value.
    pub fn focus(&self) -> BookmarkState {
        let bookmarked = self.session.is_bookmarked(&self.article_id);
        let mut state = self.lock();
        if !state.in_flight {
            state.is_bookmarked = bookmarked;
        }
        *state
    }

    /// Flip and persist, resolving with the stored bookmark ids.
    pub async fn toggle(&self) -> Result<Vec<String>> {
        let pending = self.begin()?;
        self.commit(pending).await
    }

    /// Flip now and persist on a background task. Dropping the handle does
    /// not cancel the request; its outcome still reaches the session.
    pub fn spawn_toggle(&self) -> Result<JoinHandle<Result<Vec<String>>>> {
        let pending = self.begin()?;
        let this = self.clone();
        Ok(tokio::spawn(async move { this.commit(pending).await }))
    }

    fn lock(&self) -> MutexGuard<'_, BookmarkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<PendingToggle> {
        let user = self.session.current().ok_or(Error::NoSession)?;
        let mut state = self.lock();
        if state.in_flight {
            return Err(Error::BookmarkInFlight(self.article_id.to_string()));
        }
        let previous = state.is_bookmarked;
        state.is_bookmarked = !previous;
        state.in_flight = true;
        Ok(PendingToggle {
            previous,
            target: !previous,
            user,
        })
    }

    async fn commit(&self, pending: PendingToggle) -> Result<Vec<String>> {
        let current = pending.user.bookmarked_ids();
        let ids = if pending.target {
            add_bookmark(&current, &self.article_id)
        } else {
            remove_bookmark(&current, &self.article_id)
        };
        debug!(
            article_id = %self.article_id,
            adding = pending.target,
            before = current.len(),
            after = ids.len(),
            "Persisting bookmark list"
        );

        match self.store.update_bookmark_list(&pending.user.id, &ids).await {
            Ok(updated) => {
                let stored = updated.bookmarked_ids();
                let bookmarked = stored.iter().any(|id| **id == *self.article_id);
                self.session
                    .set_bookmarks_for(&pending.user.id, updated.articles_bookmarked);
                {
                    let mut state = self.lock();
                    state.is_bookmarked = bookmarked;
                    state.in_flight = false;
                }
                info!(article_id = %self.article_id, bookmarked, "Bookmark saved");
                Ok(stored)
            }
            Err(e) => {
                {
                    let mut state = self.lock();
                    state.is_bookmarked = pending.previous;
                    state.in_flight = false;
                }
                warn!(
                    article_id = %self.article_id,
                    error = %e,
                    "Failed to save bookmark, rolled back"
                );
                Err(e)
            }
        }
    }
}
