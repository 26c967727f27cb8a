pub mod backends;
pub mod bookmarks;
pub mod session;

pub use backends::*;
pub use bookmarks::{add_bookmark, remove_bookmark, BookmarkState, BookmarkSynchronizer};
pub use session::SessionStore;

pub mod prelude {
    pub use super::backends::*;
    pub use super::bookmarks::{BookmarkState, BookmarkSynchronizer};
    pub use super::session::SessionStore;
    pub use nt_core::{Error, ProfileStore, Result, UserProfile};
}
