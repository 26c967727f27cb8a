//! Sentence segmentation and reading-time estimate.

use std::time::Duration;

use lazy_static::lazy_static;
use nt_core::ExtractedArticle;
use regex::Regex;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.?!]\s+").expect("static regex");
}

/// Split at `.`, `?` or `!` followed by whitespace. The punctuation stays with
/// its sentence, the whitespace is dropped, empty pieces are discarded.
pub fn segment_into_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut push = |piece: &str| {
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
    };

    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(text) {
        // the punctuation mark is a single ASCII byte
        push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    push(&text[start..]);

    chunks
}

pub fn chunks_for(article: &ExtractedArticle) -> Vec<String> {
    segment_into_chunks(&article.speakable_text())
}

pub fn estimate_duration(text: &str, words_per_minute: f64) -> Duration {
    let words = text.split_whitespace().count();
    if words == 0 || words_per_minute <= 0.0 {
        return Duration::ZERO;
    }
    let millis = (words as f64 / words_per_minute * 60.0 * 1000.0).ceil();
    Duration::from_millis(millis as u64)
}

/// `m:ss`, seconds zero padded.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
