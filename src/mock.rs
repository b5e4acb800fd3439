//! In-memory notepad service for tests.
//!
//! Records every call and can be told to fail updates, so the aggregator can
//! be driven without a network.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::NotepadApi;
use crate::error::{NotepadError, NotepadResult};
use crate::model::{Notepad, NotepadStatus, NotepadSummary, NotepadUpdate};

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    List { limit: u32 },
    Get(String),
    Update(String, NotepadUpdate),
}

#[derive(Default)]
pub struct MockNotepadApi {
    notepads: Mutex<Vec<Notepad>>,
    calls: Mutex<Vec<MockCall>>,
    update_failure: Mutex<Option<u16>>,
    update_delay: Mutex<Duration>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MockNotepadApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a notepad; listing order follows insertion order.
    pub fn with_notepad(self, id: &str, title: &str, content: &str) -> Self {
        lock(&self.notepads).push(Notepad {
            id: id.to_string(),
            title: title.to_string(),
            brief: Some(format!("{} brief", title)),
            tags: Some(vec!["collected".to_string()]),
            status: Some(NotepadStatus::Published),
            list: Some(json!([])),
            content: Some(content.to_string()),
        });
        self
    }

    /// Makes every update fail with the given HTTP status until cleared.
    pub fn fail_updates(&self, status: Option<u16>) {
        *lock(&self.update_failure) = status;
    }

    /// Makes every update take `delay` before it answers.
    pub fn delay_updates(&self, delay: Duration) {
        *lock(&self.update_delay) = delay;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn list_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::List { .. }))
            .count()
    }

    pub fn get_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Get(_)))
            .count()
    }

    pub fn updates(&self) -> Vec<NotepadUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Update(_, update) => Some(update),
                _ => None,
            })
            .collect()
    }

    /// Remote content of the notepad, as last written.
    pub fn content_of(&self, id: &str) -> Option<String> {
        lock(&self.notepads)
            .iter()
            .find(|np| np.id == id)
            .map(|np| np.content().to_string())
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl NotepadApi for MockNotepadApi {
    async fn list_notepads(&self, _token: &str, limit: u32) -> NotepadResult<Vec<NotepadSummary>> {
        self.record(MockCall::List { limit });
        Ok(lock(&self.notepads)
            .iter()
            .take(limit as usize)
            .map(|np| NotepadSummary {
                id: np.id.clone(),
                title: np.title.clone(),
            })
            .collect())
    }

    async fn get_notepad(&self, id: &str, _token: &str) -> NotepadResult<Notepad> {
        self.record(MockCall::Get(id.to_string()));
        lock(&self.notepads)
            .iter()
            .find(|np| np.id == id)
            .cloned()
            .ok_or(NotepadError::RequestFailed {
                action: "get notepad",
                status: 404,
            })
    }

    async fn update_notepad(
        &self,
        id: &str,
        update: &NotepadUpdate,
        _token: &str,
    ) -> NotepadResult<Value> {
        self.record(MockCall::Update(id.to_string(), update.clone()));
        let delay = *lock(&self.update_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = *lock(&self.update_failure) {
            return Err(NotepadError::UpdateFailed { status });
        }
        let mut notepads = lock(&self.notepads);
        let notepad = notepads
            .iter_mut()
            .find(|np| np.id == id)
            .ok_or(NotepadError::UpdateFailed { status: 404 })?;
        notepad.content = Some(update.content.clone());
        notepad.status = Some(update.status.clone());
        Ok(json!({ "success": true }))
    }
}
