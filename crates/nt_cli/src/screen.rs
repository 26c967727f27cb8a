//! The article detail screen: loads one article, narrates it on demand and
//! keeps its bookmark flag in sync with the signed-in user's profile.

use std::fmt::Write as _;
use std::sync::Arc;

use nt_core::config::Config;
use nt_core::{
    ArticleRef, ContentBlock, ExtractedArticle, MarkupFetcher, ProfileStore, Result, SpeechEngine,
};
use nt_extract::Extractor;
use nt_speech::{estimate_duration, format_duration, PlaybackController, PlaybackState};
use nt_storage::{BookmarkState, BookmarkSynchronizer, SessionStore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded(ExtractedArticle),
    Failed(String),
}

pub struct ArticleScreen {
    article: ArticleRef,
    extractor: Extractor,
    words_per_minute: f64,
    load_state: LoadState,
    audio_duration: String,
    playback: PlaybackController,
    bookmark: BookmarkSynchronizer,
}

impl ArticleScreen {
    pub fn new(
        article: ArticleRef,
        config: &Config,
        engine: Arc<dyn SpeechEngine>,
        store: Arc<dyn ProfileStore>,
        session: SessionStore,
    ) -> Self {
        let bookmark = BookmarkSynchronizer::new(store, session, &article.id);
        Self {
            extractor: Extractor::new(&config.extractor),
            words_per_minute: config.speech.words_per_minute,
            load_state: LoadState::Loading,
            audio_duration: format_duration(Default::default()),
            playback: PlaybackController::new(engine, &config.speech),
            bookmark,
            article,
        }
    }

    pub fn article(&self) -> &ArticleRef {
        &self.article
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn extracted(&self) -> Option<&ExtractedArticle> {
        match &self.load_state {
            LoadState::Loaded(article) => Some(article),
            _ => None,
        }
    }

    pub fn audio_duration(&self) -> &str {
        &self.audio_duration
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn bookmark(&self) -> &BookmarkSynchronizer {
        &self.bookmark
    }

    /// Fetch and extract the article, then queue its text for narration.
    /// A failed fetch leaves the screen in [`LoadState::Failed`].
    pub async fn open(&mut self, fetcher: &dyn MarkupFetcher) -> Result<()> {
        self.load_state = LoadState::Loading;
        let source = match fetcher.fetch_article_markup(&self.article.title_url).await {
            Ok(source) => source,
            Err(e) => {
                warn!(url = %self.article.title_url, error = %e, "Failed to load article");
                self.load_state = LoadState::Failed(e.to_string());
                return Err(e);
            }
        };

        let extracted = self.extractor.extract_source(&source);
        let text = extracted.speakable_text();
        self.audio_duration = format_duration(estimate_duration(&text, self.words_per_minute));
        self.playback.load_article(&extracted);
        info!(
            article_id = %self.article.id,
            blocks = extracted.content_blocks.len(),
            duration = %self.audio_duration,
            "📰 Article ready"
        );
        self.load_state = LoadState::Loaded(extracted);
        Ok(())
    }

    pub fn focus(&self) -> BookmarkState {
        self.bookmark.focus()
    }

    /// Silences narration. Pending bookmark writes are left to finish.
    pub fn blur(&self) {
        self.playback.stop();
    }

    pub fn toggle_listen(&self) -> PlaybackState {
        if self.extracted().is_none() {
            return self.playback.state();
        }
        self.playback.toggle()
    }

    pub fn rewind(&self) {
        self.playback.rewind();
    }

    pub fn toggle_bookmark(&self) -> Result<JoinHandle<Result<Vec<String>>>> {
        self.bookmark.spawn_toggle()
    }

    pub fn render(&self) -> String {
        let heart = if self.bookmark.state().is_bookmarked { "♥" } else { "♡" };
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", heart, self.article.title);

        let article = match &self.load_state {
            LoadState::Loading => {
                out.push_str("Loading...\n");
                return out;
            }
            LoadState::Failed(reason) => {
                let _ = writeln!(out, "Could not load article: {}", reason);
                return out;
            }
            LoadState::Loaded(article) => article,
        };

        let mut meta = Vec::new();
        if let Some(avatar) = &article.author_avatar_url {
            meta.push(format!("[{}]", avatar));
        }
        if !article.author_name.is_empty() {
            meta.push(article.author_name.clone());
        }
        if let Some(published) = article.published_at {
            meta.push(published.format("%Y-%m-%d %H:%M UTC").to_string());
        }
        if !meta.is_empty() {
            let _ = writeln!(out, "{}", meta.join(" · "));
        }
        out.push('\n');
        let _ = writeln!(out, "{}", article.title);
        if !article.lead.is_empty() {
            let _ = writeln!(out, "{}", article.lead);
        }
        out.push('\n');

        let icon = if self.playback.state().is_playing() { "⏸️" } else { "▶️" };
        let _ = write!(out, "{} Listen {}", icon, self.audio_duration);
        if !article.view_count.is_empty() {
            let _ = write!(out, "    👁️ {}", article.view_count);
        }
        out.push('\n');
        if !article.cover_image_url.is_empty() {
            let _ = writeln!(out, "[cover: {}]", article.cover_image_url);
        }

        for block in &article.content_blocks {
            out.push('\n');
            match block {
                ContentBlock::Text { text } => {
                    let _ = writeln!(out, "{}", text);
                }
                ContentBlock::Image { src, caption } => {
                    if !src.is_empty() {
                        let _ = writeln!(out, "[image: {}]", src);
                    }
                    if let Some(caption) = caption {
                        let _ = writeln!(out, "  {}", caption);
                    }
                }
            }
        }
        out
    }
}

impl Drop for ArticleScreen {
    fn drop(&mut self) {
        self.blur();
    }
}
