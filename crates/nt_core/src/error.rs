use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Utterance cancelled")]
    SpeechCancelled,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Bookmark request already in flight for article {0}")]
    BookmarkInFlight(String),

    #[error("No user session")]
    NoSession,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Failures that keep the article from rendering at all.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::Fetch(_) | Error::Http(_) | Error::InvalidUrl(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
