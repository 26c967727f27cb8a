//! Sequential narration of an article, one chunk at a time.
//!
//! [`PlaybackMachine`] holds the whole state and is mutated only through its
//! transitions; [`PlaybackController`] drives it against a [`SpeechEngine`] on
//! a tokio task. Every playback session gets a new generation number so that
//! completions arriving after a pause, stop or reload are ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nt_core::config::SpeechConfig;
use nt_core::{Error, ExtractedArticle, SpeechEngine};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chunking::chunks_for;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// Index of the next chunk to speak.
    pub current_chunk_index: usize,
    pub chunk_count: usize,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.status == PlaybackStatus::Paused
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start { generation: u64 },
    Pause,
}

#[derive(Debug)]
pub struct PlaybackMachine {
    chunks: Vec<String>,
    status: PlaybackStatus,
    index: usize,
    generation: u64,
    consecutive_errors: usize,
    max_consecutive_errors: usize,
}

impl PlaybackMachine {
    pub fn new(max_consecutive_errors: usize) -> Self {
        Self {
            chunks: Vec::new(),
            status: PlaybackStatus::Idle,
            index: 0,
            generation: 0,
            consecutive_errors: 0,
            max_consecutive_errors: max_consecutive_errors.max(1),
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            status: self.status,
            current_chunk_index: self.index,
            chunk_count: self.chunks.len(),
        }
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fresh article: the only way besides [`Self::rewind`] back to index 0.
    pub fn load(&mut self, chunks: Vec<String>) {
        self.chunks = chunks;
        self.rewind();
    }

    pub fn rewind(&mut self) {
        self.generation += 1;
        self.status = PlaybackStatus::Idle;
        self.index = 0;
        self.consecutive_errors = 0;
    }

    pub fn toggle(&mut self) -> Transition {
        self.generation += 1;
        match self.status {
            PlaybackStatus::Playing => {
                self.status = PlaybackStatus::Paused;
                Transition::Pause
            }
            PlaybackStatus::Idle | PlaybackStatus::Paused | PlaybackStatus::Finished => {
                self.status = PlaybackStatus::Playing;
                self.consecutive_errors = 0;
                Transition::Start {
                    generation: self.generation,
                }
            }
        }
    }

    /// Invalidates the running session. A playing machine ends up paused so a
    /// later toggle resumes at the same chunk. Returns whether it was playing.
    pub fn interrupt(&mut self) -> bool {
        self.generation += 1;
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
            true
        } else {
            false
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.status == PlaybackStatus::Playing
    }

    /// Chunk to speak next for `generation`, or `None` when the session is
    /// stale or the article is done (which moves to `Finished`).
    pub fn next_utterance(&mut self, generation: u64) -> Option<(usize, String)> {
        if !self.is_current(generation) {
            return None;
        }
        match self.chunks.get(self.index) {
            Some(chunk) => Some((self.index, chunk.clone())),
            None => {
                self.status = PlaybackStatus::Finished;
                None
            }
        }
    }

    /// The utterance at the current index finished. Returns whether the
    /// session should keep going.
    pub fn complete(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.index >= self.chunks.len() {
            return false;
        }
        self.index += 1;
        self.consecutive_errors = 0;
        true
    }

    /// The utterance failed: skip the chunk, or pause after too many failures
    /// in a row, leaving the failed chunk as the resume point.
    pub fn fail(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.index >= self.chunks.len() {
            return false;
        }
        self.consecutive_errors += 1;
        if self.consecutive_errors >= self.max_consecutive_errors {
            self.status = PlaybackStatus::Paused;
            self.generation += 1;
            return false;
        }
        self.index += 1;
        true
    }

    /// The engine cut the utterance short on its own.
    pub fn cancelled(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.status = PlaybackStatus::Paused;
            self.generation += 1;
        }
    }
}

fn lock(machine: &Mutex<PlaybackMachine>) -> MutexGuard<'_, PlaybackMachine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PlaybackController {
    engine: Arc<dyn SpeechEngine>,
    machine: Arc<Mutex<PlaybackMachine>>,
    state_tx: Arc<watch::Sender<PlaybackState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackController {
    pub fn new(engine: Arc<dyn SpeechEngine>, config: &SpeechConfig) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::default());
        Self {
            engine,
            machine: Arc::new(Mutex::new(PlaybackMachine::new(config.max_consecutive_errors))),
            state_tx: Arc::new(state_tx),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.machine).state()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    pub fn chunks(&self) -> Vec<String> {
        lock(&self.machine).chunks().to_vec()
    }

    pub fn load(&self, chunks: Vec<String>) {
        self.halt();
        let mut machine = lock(&self.machine);
        machine.load(chunks);
        info!(chunks = machine.chunks().len(), "Loaded speech chunks");
        self.state_tx.send_replace(machine.state());
    }

    pub fn load_article(&self, article: &ExtractedArticle) {
        self.load(chunks_for(article));
    }

    /// Play from the current chunk, or pause if playing. Must be called from
    /// within a tokio runtime.
    pub fn toggle(&self) -> PlaybackState {
        let (transition, state) = {
            let mut machine = lock(&self.machine);
            let transition = machine.toggle();
            (transition, machine.state())
        };
        self.state_tx.send_replace(state);

        match transition {
            Transition::Start { generation } => {
                debug!(generation, index = state.current_chunk_index, "Starting playback");
                self.abort_task();
                let handle = tokio::spawn(run(
                    self.engine.clone(),
                    self.machine.clone(),
                    self.state_tx.clone(),
                    generation,
                ));
                *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
            }
            Transition::Pause => {
                debug!(index = state.current_chunk_index, "Pausing playback");
                self.halt();
            }
        }
        self.state()
    }

    /// Silence everything, whatever the state. Used when the screen loses focus.
    pub fn stop(&self) {
        let was_playing = {
            let mut machine = lock(&self.machine);
            let was_playing = machine.interrupt();
            self.state_tx.send_replace(machine.state());
            was_playing
        };
        self.halt();
        if was_playing {
            info!("Playback stopped");
        }
    }

    pub fn rewind(&self) {
        self.halt();
        let mut machine = lock(&self.machine);
        machine.rewind();
        self.state_tx.send_replace(machine.state());
    }

    fn abort_task(&self) {
        if let Some(handle) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }

    fn halt(&self) {
        self.abort_task();
        self.engine.stop();
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.halt();
    }
}

async fn run(
    engine: Arc<dyn SpeechEngine>,
    machine: Arc<Mutex<PlaybackMachine>>,
    state_tx: Arc<watch::Sender<PlaybackState>>,
    generation: u64,
) {
    loop {
        let next = {
            let mut guard = lock(&machine);
            let next = guard.next_utterance(generation);
            state_tx.send_replace(guard.state());
            next
        };
        let Some((index, text)) = next else {
            break;
        };

        debug!(index, engine = engine.name(), "Speaking chunk");
        let outcome = engine.speak(&text).await;

        let proceed = {
            let mut guard = lock(&machine);
            let proceed = match outcome {
                Ok(()) => guard.complete(generation),
                Err(Error::SpeechCancelled) => {
                    guard.cancelled(generation);
                    false
                }
                Err(e) => {
                    warn!(index, error = %e, "Speech synthesis failed, skipping chunk");
                    guard.fail(generation)
                }
            };
            state_tx.send_replace(guard.state());
            proceed
        };
        if !proceed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(chunks: &[&str]) -> PlaybackMachine {
        let mut machine = PlaybackMachine::new(3);
        machine.load(chunks.iter().map(|c| c.to_string()).collect());
        machine
    }

    fn start(machine: &mut PlaybackMachine) -> u64 {
        match machine.toggle() {
            Transition::Start { generation } => generation,
            Transition::Pause => panic!("expected start"),
        }
    }

    #[test]
    fn test_plays_through_in_order() {
        let mut m = machine(&["One.", "Two!"]);
        let gen = start(&mut m);
        assert_eq!(m.next_utterance(gen), Some((0, "One.".to_string())));
        assert!(m.complete(gen));
        assert_eq!(m.next_utterance(gen), Some((1, "Two!".to_string())));
        assert!(m.complete(gen));
        assert_eq!(m.next_utterance(gen), None);
        assert_eq!(m.state().status, PlaybackStatus::Finished);
        assert_eq!(m.state().current_chunk_index, 2);
    }

    #[test]
    fn test_pause_keeps_index_and_ignores_stale_completion() {
        let mut m = machine(&["One.", "Two!"]);
        let gen = start(&mut m);
        assert!(m.next_utterance(gen).is_some());
        assert_eq!(m.toggle(), Transition::Pause);
        assert!(!m.complete(gen));
        assert_eq!(m.state().current_chunk_index, 0);
        assert!(m.state().is_paused());

        let resumed = start(&mut m);
        assert_ne!(resumed, gen);
        assert_eq!(m.next_utterance(resumed), Some((0, "One.".to_string())));
    }

    #[test]
    fn test_finished_does_not_reset_without_reload() {
        let mut m = machine(&["Only."]);
        let gen = start(&mut m);
        m.next_utterance(gen);
        m.complete(gen);
        assert_eq!(m.next_utterance(gen), None);

        let again = start(&mut m);
        assert_eq!(m.next_utterance(again), None);
        assert_eq!(m.state().status, PlaybackStatus::Finished);
        assert_eq!(m.state().current_chunk_index, 1);

        m.load(vec!["Fresh.".into()]);
        assert_eq!(m.state().current_chunk_index, 0);
        assert_eq!(m.state().status, PlaybackStatus::Idle);
    }

    #[test]
    fn test_empty_article_finishes_immediately() {
        let mut m = machine(&[]);
        let gen = start(&mut m);
        assert_eq!(m.next_utterance(gen), None);
        assert_eq!(m.state().status, PlaybackStatus::Finished);
        assert_eq!(m.state().current_chunk_index, 0);
    }

    #[test]
    fn test_errors_skip_then_pause() {
        let mut m = machine(&["a.", "b.", "c.", "d."]);
        let gen = start(&mut m);
        assert!(m.fail(gen));
        assert!(m.fail(gen));
        assert_eq!(m.state().current_chunk_index, 2);
        assert!(!m.fail(gen));
        assert!(m.state().is_paused());
        assert_eq!(m.state().current_chunk_index, 2);
        assert!(m.next_utterance(gen).is_none());
    }

    #[test]
    fn test_success_resets_error_streak() {
        let mut m = machine(&["a.", "b.", "c.", "d.", "e."]);
        let gen = start(&mut m);
        assert!(m.fail(gen));
        assert!(m.fail(gen));
        assert!(m.complete(gen));
        assert!(m.fail(gen));
        assert!(m.fail(gen));
        assert!(m.state().is_playing());
    }

    #[test]
    fn test_interrupt_pauses_only_when_playing() {
        let mut m = machine(&["a."]);
        assert!(!m.interrupt());
        assert_eq!(m.state().status, PlaybackStatus::Idle);
        let gen = start(&mut m);
        assert!(m.interrupt());
        assert!(m.state().is_paused());
        assert!(m.next_utterance(gen).is_none());
    }

    #[test]
    fn test_engine_cancellation_does_not_leave_playing() {
        let mut m = machine(&["a.", "b."]);
        let gen = start(&mut m);
        m.cancelled(gen);
        assert!(m.state().is_paused());
        assert_eq!(m.state().current_chunk_index, 0);
    }

    #[test]
    fn test_index_never_exceeds_chunk_count() {
        let mut m = machine(&["a.", "b.", "c."]);
        let gen = start(&mut m);
        while m.next_utterance(gen).is_some() {
            assert!(m.state().current_chunk_index < m.state().chunk_count);
            m.complete(gen);
        }
        assert!(!m.complete(gen));
        assert_eq!(m.state().current_chunk_index, m.state().chunk_count);
    }

    #[test]
    fn test_outcomes_after_skipping_last_chunk_keep_index() {
        let mut m = machine(&["a.", "b."]);
        let gen = start(&mut m);
        assert!(m.next_utterance(gen).is_some());
        assert!(m.complete(gen));
        assert!(m.next_utterance(gen).is_some());
        assert!(m.fail(gen));
        assert_eq!(m.state().current_chunk_index, 2);
        assert!(m.state().is_playing());

        assert!(!m.complete(gen));
        assert!(!m.fail(gen));
        assert_eq!(m.state().current_chunk_index, 2);
        assert_eq!(m.state().chunk_count, 2);

        assert_eq!(m.next_utterance(gen), None);
        assert_eq!(m.state().status, PlaybackStatus::Finished);
    }
}
