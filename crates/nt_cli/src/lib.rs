pub mod screen;

pub use screen::{ArticleScreen, LoadState};
