use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nt_core::{BookmarkDocument, BookmarkEntry, Error, ProfileStore, Result, UserProfile};
use nt_storage::{BookmarkSynchronizer, MemoryProfileStore, SessionStore};
use tokio::sync::Semaphore;

fn profile(id: &str, bookmarks: &[&str]) -> UserProfile {
    UserProfile {
        articles_bookmarked: bookmarks.iter().map(|b| BookmarkEntry::from(*b)).collect(),
        ..UserProfile::new(id)
    }
}

fn setup(bookmarks: &[&str]) -> (Arc<MemoryProfileStore>, SessionStore) {
    let store = Arc::new(MemoryProfileStore::with_profiles([profile("u1", bookmarks)]));
    let session = SessionStore::with_user(profile("u1", bookmarks));
    (store, session)
}

/// Holds every write until the test releases a permit.
struct GatedStore {
    inner: MemoryProfileStore,
    gate: Semaphore,
}

impl GatedStore {
    fn new(inner: MemoryProfileStore) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl ProfileStore for GatedStore {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        self.inner.get_profile(user_id).await
    }

    async fn update_bookmark_list(&self, user_id: &str, ids: &[String]) -> Result<UserProfile> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        permit.forget();
        self.inner.update_bookmark_list(user_id, ids).await
    }
}

struct RejectingStore;

#[async_trait]
impl ProfileStore for RejectingStore {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        Ok(UserProfile::new(user_id))
    }

    async fn update_bookmark_list(&self, _user_id: &str, _ids: &[String]) -> Result<UserProfile> {
        Err(Error::Store("permission denied".into()))
    }
}

#[tokio::test]
async fn test_add_then_remove() {
    let (store, session) = setup(&["a", "b"]);
    let sync = BookmarkSynchronizer::new(store.clone(), session.clone(), "c");
    assert!(!sync.focus().is_bookmarked);

    let stored = sync.toggle().await.unwrap();
    assert_eq!(stored, vec!["a", "b", "c"]);
    assert!(sync.state().is_bookmarked);
    assert!(!sync.state().in_flight);
    assert_eq!(session.bookmarks(), vec!["a", "b", "c"]);

    let sync_b = BookmarkSynchronizer::new(store.clone(), session.clone(), "b");
    assert!(sync_b.focus().is_bookmarked);
    let stored = sync_b.toggle().await.unwrap();
    assert_eq!(stored, vec!["a", "c"]);
    assert!(!sync_b.state().is_bookmarked);
    assert_eq!(store.get_profile("u1").await.unwrap().bookmarked_ids(), vec!["a", "c"]);
}

#[tokio::test]
async fn test_add_existing_keeps_single_entry() {
    let (store, session) = setup(&["a"]);
    let sync = BookmarkSynchronizer::new(store, session.clone(), "a");
    // Local flag says "not bookmarked" although the list has it.
    let stored = sync.toggle().await.unwrap();
    assert_eq!(stored, vec!["a"]);
    assert!(sync.state().is_bookmarked);
    assert_eq!(session.bookmarks(), vec!["a"]);
}

#[tokio::test]
async fn test_remove_absent_is_noop() {
    let (store, session) = setup(&["a", "b"]);
    let sync = BookmarkSynchronizer::new(store, session.clone(), "z");
    sync.toggle().await.unwrap();
    assert!(sync.state().is_bookmarked);

    // Removed elsewhere while the local flag still says bookmarked.
    session.set_bookmarks(vec!["a".into(), "b".into()]);
    let stored = sync.toggle().await.unwrap();
    assert_eq!(stored, vec!["a", "b"]);
    assert!(!sync.state().is_bookmarked);
    assert_eq!(session.bookmarks(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_rejected_write_rolls_back() {
    let session = SessionStore::with_user(profile("u1", &["a"]));
    let sync = BookmarkSynchronizer::new(Arc::new(RejectingStore), session.clone(), "x");
    sync.focus();

    let err = sync.toggle().await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert!(!sync.state().is_bookmarked);
    assert!(!sync.state().in_flight);
    assert_eq!(session.bookmarks(), vec!["a"]);
}

#[tokio::test]
async fn test_flag_flips_before_store_resolves() {
    let (memory, session) = setup(&[]);
    let store = Arc::new(GatedStore::new((*memory).clone()));
    let sync = BookmarkSynchronizer::new(store.clone(), session.clone(), "x");

    let handle = sync.spawn_toggle().unwrap();
    let state = sync.state();
    assert!(state.is_bookmarked);
    assert!(state.in_flight);
    assert!(session.bookmarks().is_empty());

    let second = sync.toggle().await.unwrap_err();
    assert!(matches!(second, Error::BookmarkInFlight(id) if id == "x"));
    assert!(sync.state().is_bookmarked);

    // Focus while pending keeps the optimistic value.
    assert!(sync.focus().is_bookmarked);

    store.gate.add_permits(1);
    assert_eq!(handle.await.unwrap().unwrap(), vec!["x"]);
    assert!(!sync.state().in_flight);
    assert_eq!(session.bookmarks(), vec!["x"]);
}

#[tokio::test]
async fn test_abandoned_toggle_still_updates_session() {
    let (memory, session) = setup(&["a"]);
    let store = Arc::new(GatedStore::new((*memory).clone()));
    let mut changes = session.subscribe();
    {
        let sync = BookmarkSynchronizer::new(store.clone(), session.clone(), "b");
        drop(sync.spawn_toggle().unwrap());
    }

    store.gate.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), changes.changed())
        .await
        .expect("session update")
        .unwrap();
    assert_eq!(session.bookmarks(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_focus_reads_document_entries() {
    let store = Arc::new(MemoryProfileStore::new());
    let mut user = UserProfile::new("u1");
    user.articles_bookmarked = vec![
        BookmarkEntry::Document(BookmarkDocument {
            doc_id: Some("x".into()),
            title: Some("X".into()),
            ..Default::default()
        }),
        BookmarkEntry::from("x"),
        BookmarkEntry::from("y"),
    ];
    let session = SessionStore::with_user(user);
    assert_eq!(session.bookmarks(), vec!["x", "y"]);

    let sync = BookmarkSynchronizer::new(store, session.clone(), "x");
    assert!(sync.focus().is_bookmarked);

    session.set_bookmarks(vec!["y".into()]);
    assert!(!sync.focus().is_bookmarked);
}

#[tokio::test]
async fn test_toggle_without_session() {
    let store = Arc::new(MemoryProfileStore::new());
    let sync = BookmarkSynchronizer::new(store, SessionStore::new(), "x");
    assert!(matches!(sync.toggle().await, Err(Error::NoSession)));
    assert!(matches!(sync.spawn_toggle(), Err(Error::NoSession)));
    assert!(!sync.state().is_bookmarked);
}

#[tokio::test]
async fn test_user_switch_drops_stale_update() {
    let (memory, session) = setup(&[]);
    let store = Arc::new(GatedStore::new((*memory).clone()));
    let sync = BookmarkSynchronizer::new(store.clone(), session.clone(), "x");

    let handle = sync.spawn_toggle().unwrap();
    session.sign_in(profile("u2", &["other"]));
    store.gate.add_permits(1);
    handle.await.unwrap().unwrap();

    assert_eq!(session.bookmarks(), vec!["other"]);
    assert_eq!(memory.get_profile("u1").await.unwrap().bookmarked_ids(), vec!["x"]);
}
