//! Debounced word aggregator.
//!
//! Holds at most one cached notepad. Words are appended to the cached
//! content and a single update is sent once no word has arrived for the
//! whole quiet period (trailing debounce). A failed flush keeps the cache so
//! the next word re-arms the timer without re-fetching the notepad.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::api::{NotepadApi, find_notepad_id};
use crate::config::{DEFAULT_DELIMITER, DEFAULT_PAGE_LIMIT, DEFAULT_QUIET_PERIOD_MS};
use crate::error::{NotepadError, NotepadResult, unpack_error};
use crate::model::{Notepad, WordList};

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub quiet_period: Duration,
    pub delimiter: String,
    pub page_limit: u32,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        AggregatorSettings {
            quiet_period: Duration::from_millis(DEFAULT_QUIET_PERIOD_MS),
            delimiter: DEFAULT_DELIMITER.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Accumulating,
}

#[derive(Debug)]
struct CachedNotepad {
    notepad_id: String,
    notepad: Notepad,
    /// Token of the most recent addition; the flush authenticates with it.
    token: String,
    pending: usize,
    generation: u64,
}

#[derive(Debug)]
enum Slot {
    Empty,
    Accumulating(CachedNotepad),
}

#[derive(Debug)]
pub struct AggregatorState {
    slot: Slot,
    timer: Option<CancellationToken>,
}

impl AggregatorState {
    fn new() -> Self {
        AggregatorState {
            slot: Slot::Empty,
            timer: None,
        }
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

/// Result of a locally accepted word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub notepad_id: String,
    pub pending: usize,
    pub total_words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub notepad_id: String,
    pub words_flushed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSnapshot {
    pub phase: Phase,
    pub notepad_id: Option<String>,
    pub content: Option<String>,
    pub pending: usize,
    pub timer_armed: bool,
}

#[derive(Clone)]
pub struct Aggregator {
    api: Arc<dyn NotepadApi>,
    settings: Arc<AggregatorSettings>,
    state: Arc<Mutex<AggregatorState>>,
    /// Held for the whole of a flush so at most one update is in flight.
    flush_gate: Arc<Mutex<()>>,
}

impl Aggregator {
    pub fn new(api: Arc<dyn NotepadApi>, settings: AggregatorSettings) -> Self {
        Self {
            api,
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(AggregatorState::new())),
            flush_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Appends `word` to the cached notepad and (re)arms the delayed flush.
    ///
    /// Returns as soon as the word is accepted locally; the remote update
    /// happens later and its failure is only logged.
    pub async fn add_word(&self, token: &str, title: &str, word: &str) -> NotepadResult<AddOutcome> {
        let word = word.trim();
        if word.is_empty() {
            return Err(NotepadError::EmptyWord);
        }

        let mut state = self.state.lock().await;
        let mut cached = match std::mem::replace(&mut state.slot, Slot::Empty) {
            Slot::Accumulating(cached) => cached,
            Slot::Empty => self.populate(token, title).await?,
        };

        let delimiter = &self.settings.delimiter;
        let mut words = WordList::parse(cached.notepad.content(), delimiter);
        if words.contains_ignore_case(word) {
            tracing::warn!(word, notepad_id = %cached.notepad_id, "word already collected");
            if cached.pending > 0 {
                state.slot = Slot::Accumulating(cached);
            }
            return Err(NotepadError::DuplicateWord(word.to_string()));
        }

        words.push(word);
        cached.notepad.content = Some(words.join(delimiter));
        cached.token = token.to_string();
        cached.pending += 1;
        cached.generation += 1;

        let outcome = AddOutcome {
            notepad_id: cached.notepad_id.clone(),
            pending: cached.pending,
            total_words: words.len(),
        };
        state.slot = Slot::Accumulating(cached);
        self.arm(&mut state);

        tracing::info!(
            word,
            notepad_id = %outcome.notepad_id,
            pending = outcome.pending,
            "word queued for notepad"
        );
        Ok(outcome)
    }

    async fn populate(&self, token: &str, title: &str) -> NotepadResult<CachedNotepad> {
        let notepad_id =
            find_notepad_id(self.api.as_ref(), token, title, self.settings.page_limit).await?;
        let notepad = self.api.get_notepad(&notepad_id, token).await?;
        tracing::info!(%notepad_id, title, "notepad cached");
        Ok(CachedNotepad {
            notepad_id,
            notepad,
            token: token.to_string(),
            pending: 0,
            generation: 0,
        })
    }

    fn arm(&self, state: &mut AggregatorState) {
        state.disarm();
        let timer = CancellationToken::new();
        state.timer = Some(timer.clone());

        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(this.settings.quiet_period) => {}
                _ = timer.cancelled() => return,
            }
            match this.flush_inner(Some(&timer)).await {
                Ok(Some(report)) => {
                    tracing::info!(
                        notepad_id = %report.notepad_id,
                        words = report.words_flushed,
                        "notepad updated"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %unpack_error(&e), "failed to update notepad, words kept in cache");
                }
            }
        });
    }

    /// Flushes pending words immediately, cancelling any armed timer. Unlike
    /// the timer-driven flush, errors are returned to the caller. An update
    /// already in flight is awaited first and its content is not resent.
    pub async fn flush_now(&self) -> NotepadResult<Option<FlushReport>> {
        self.flush_inner(None).await
    }

    async fn flush_inner(
        &self,
        timer: Option<&CancellationToken>,
    ) -> NotepadResult<Option<FlushReport>> {
        let _gate = self.flush_gate.lock().await;
        let (notepad_id, update, token, generation, flushed) = {
            let mut state = self.state.lock().await;
            match timer {
                // A newer word replaced this timer after it woke up.
                Some(t) if t.is_cancelled() => return Ok(None),
                Some(_) => state.timer = None,
                None => state.disarm(),
            }
            match &state.slot {
                Slot::Empty => return Ok(None),
                Slot::Accumulating(cached) => (
                    cached.notepad_id.clone(),
                    cached.notepad.to_update(),
                    cached.token.clone(),
                    cached.generation,
                    cached.pending,
                ),
            }
        };

        self.api.update_notepad(&notepad_id, &update, &token).await?;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let superseded = match &mut state.slot {
            // Words added while the update was in flight stay pending under
            // the timer they armed.
            Slot::Accumulating(cached) if cached.generation != generation => {
                cached.pending = cached.pending.saturating_sub(flushed);
                true
            }
            _ => false,
        };
        if !superseded {
            state.slot = Slot::Empty;
        }

        Ok(Some(FlushReport {
            notepad_id,
            words_flushed: flushed,
        }))
    }

    pub async fn snapshot(&self) -> AggregatorSnapshot {
        let state = self.state.lock().await;
        let timer_armed = state.timer.as_ref().is_some_and(|t| !t.is_cancelled());
        match &state.slot {
            Slot::Empty => AggregatorSnapshot {
                phase: Phase::Empty,
                notepad_id: None,
                content: None,
                pending: 0,
                timer_armed,
            },
            Slot::Accumulating(cached) => AggregatorSnapshot {
                phase: Phase::Accumulating,
                notepad_id: Some(cached.notepad_id.clone()),
                content: Some(cached.notepad.content().to_string()),
                pending: cached.pending,
                timer_armed,
            },
        }
    }
}
