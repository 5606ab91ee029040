//! Session State
//!
//! The session is the raw input plus the last result of each transformation.
//! [`SessionController`] owns the in-memory copy and writes it through to a
//! [`KeyValueStore`]. Loading never fails: anything missing or unreadable
//! degrades to empty strings.
//!
//! Raw input edits go through a [`Debounce`] so that a burst of keystrokes
//! produces a single write once typing pauses. Output commits are written
//! immediately. Writes go through the async [`KeyValueStore`], so nothing
//! here blocks the runtime thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::messages::Tab;
use crate::request::TransformKind;
use crate::storage::{KeyValueStore, PersistenceError, OUTPUTS_KEY, RAW_INPUT_KEY};

/// Last-known result per transformation kind
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outputs {
    /// Summary tab content
    pub summary: String,
    /// Bullets tab content
    pub bullets: String,
    /// Proofread tab content
    pub proofread: String,
}

impl Outputs {
    /// Content for a tab
    #[must_use]
    pub fn get(&self, tab: Tab) -> &str {
        match tab {
            Tab::Summary => &self.summary,
            Tab::Bullets => &self.bullets,
            Tab::Proofread => &self.proofread,
        }
    }

    /// Replace the content written by `kind`
    pub fn set(&mut self, kind: TransformKind, content: String) {
        match kind.tab() {
            Tab::Summary => self.summary = content,
            Tab::Bullets => self.bullets = content,
            Tab::Proofread => self.proofread = content,
        }
    }

    /// Whether every tab is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.bullets.is_empty() && self.proofread.is_empty()
    }

    /// Decode a stored record, keeping every string field that parses.
    ///
    /// Unknown keys are ignored, non-string values and malformed JSON fall
    /// back to empty strings.
    #[must_use]
    pub fn from_json_lenient(raw: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Stored outputs record is corrupt, using defaults");
                return Self::default();
            }
        };
        let field = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            summary: field("summary"),
            bullets: field("bullets"),
            proofread: field("proofread"),
        }
    }
}

/// The persisted session record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Last-known user input
    pub raw_input: String,
    /// Last-known outputs
    pub outputs: Outputs,
}

impl SessionState {
    /// Whether there is anything worth restoring
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_input.is_empty() && self.outputs.is_empty()
    }
}

/// Fields to merge into the session; `None` leaves a field untouched
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionPatch {
    /// New raw input
    pub raw_input: Option<String>,
    /// New outputs (always written as a whole record)
    pub outputs: Option<Outputs>,
}

impl SessionPatch {
    /// Patch touching only the raw input
    pub fn raw_input(text: impl Into<String>) -> Self {
        Self {
            raw_input: Some(text.into()),
            outputs: None,
        }
    }

    /// Patch touching only the outputs
    #[must_use]
    pub fn outputs(outputs: Outputs) -> Self {
        Self {
            raw_input: None,
            outputs: Some(outputs),
        }
    }

    /// Patch replacing the whole session
    #[must_use]
    pub fn full(state: &SessionState) -> Self {
        Self {
            raw_input: Some(state.raw_input.clone()),
            outputs: Some(state.outputs.clone()),
        }
    }
}

/// Owner of the in-memory session and its durable copy
///
/// Memory updates are synchronous; writes are awaited with no lock held on
/// the in-memory state. Writes are serialized and each one stores the
/// latest in-memory values of the keys it touches, so an older write can
/// never land after a newer one.
pub struct SessionController {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
    writes: tokio::sync::Mutex<()>,
}

impl SessionController {
    /// Create a controller with an empty in-memory session.
    ///
    /// Call [`SessionController::load`] to restore from the store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            state: Mutex::new(SessionState::default()),
            writes: tokio::sync::Mutex::new(()),
        }
    }

    /// Read the persisted session into memory and return it
    pub async fn load(&self) -> SessionState {
        let raw_input = match self.store.get(RAW_INPUT_KEY).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored input");
                String::new()
            }
        };

        let outputs = match self.store.get(OUTPUTS_KEY).await {
            Ok(Some(raw)) => Outputs::from_json_lenient(&raw),
            Ok(None) => Outputs::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored outputs");
                Outputs::default()
            }
        };

        let state = SessionState { raw_input, outputs };
        *self.state.lock() = state.clone();
        state
    }

    /// Snapshot of the in-memory session
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// In-memory content of one tab
    #[must_use]
    pub fn output(&self, tab: Tab) -> String {
        self.state.lock().outputs.get(tab).to_string()
    }

    /// Update the in-memory raw input without writing it
    pub fn set_raw_input(&self, text: &str) {
        text.clone_into(&mut self.state.lock().raw_input);
    }

    /// Record a transformation result in memory without writing it
    pub fn commit_output(&self, kind: TransformKind, content: String) {
        self.state.lock().outputs.set(kind, content);
    }

    /// Merge `patch` into memory and write the touched keys.
    ///
    /// The in-memory state is updated before the write starts, and stays
    /// updated when the write fails. Failures are logged here; the returned
    /// error is informational.
    pub async fn save(&self, patch: SessionPatch) -> Result<(), PersistenceError> {
        let touch_input = patch.raw_input.is_some();
        let touch_outputs = patch.outputs.is_some();
        {
            let mut state = self.state.lock();
            if let Some(raw_input) = patch.raw_input {
                state.raw_input = raw_input;
            }
            if let Some(outputs) = patch.outputs {
                state.outputs = outputs;
            }
        }
        self.persist(touch_input, touch_outputs).await
    }

    /// Write the whole in-memory session
    pub async fn save_all(&self) -> Result<(), PersistenceError> {
        self.persist(true, true).await
    }

    async fn persist(&self, input: bool, outputs: bool) -> Result<(), PersistenceError> {
        let _writing = self.writes.lock().await;
        let snapshot = self.state();
        let mut first_error = None;

        if input {
            if let Err(e) = self.store.set(RAW_INPUT_KEY, &snapshot.raw_input).await {
                tracing::warn!(error = %e, "Failed to persist input");
                first_error.get_or_insert(e);
            }
        }

        if outputs {
            let written = match serde_json::to_string(&snapshot.outputs) {
                Ok(json) => self.store.set(OUTPUTS_KEY, &json).await,
                Err(e) => Err(PersistenceError::from(e)),
            };
            if let Err(e) = written {
                tracing::warn!(error = %e, "Failed to persist outputs");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Trailing-edge debounce window
///
/// Each [`Debounce::push`] replaces the pending value and restarts the
/// window. [`Debounce::take_due`] yields the value once the window has
/// elapsed with no further pushes.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    /// Create a window of `delay`
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Window length
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the window at `now`
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Whether a value is waiting
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its window has elapsed by `now`
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value regardless of the window
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    /// Drop the pending value
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn controller() -> (SessionController, MemoryStore) {
        let store = MemoryStore::new();
        (SessionController::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_load_empty_store_gives_defaults() {
        let (session, _) = controller();
        assert_eq!(session.load().await, SessionState::default());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (session, store) = controller();
        session
            .save(SessionPatch {
                raw_input: Some("X".to_string()),
                outputs: Some(Outputs {
                    summary: "S".to_string(),
                    bullets: "B".to_string(),
                    proofread: "P".to_string(),
                }),
            })
            .await
            .unwrap();

        let reloaded = SessionController::new(Arc::new(store));
        assert_eq!(
            reloaded.load().await,
            SessionState {
                raw_input: "X".to_string(),
                outputs: Outputs {
                    summary: "S".to_string(),
                    bullets: "B".to_string(),
                    proofread: "P".to_string(),
                },
            }
        );
    }

    #[tokio::test]
    async fn test_corrupt_outputs_keep_raw_input() {
        let (session, store) = controller();
        store.insert(RAW_INPUT_KEY, "kept");
        store.insert(OUTPUTS_KEY, "{not json");

        let state = session.load().await;
        assert_eq!(state.raw_input, "kept");
        assert_eq!(state.outputs, Outputs::default());
    }

    #[tokio::test]
    async fn test_partial_outputs_are_merged_with_defaults() {
        let (session, store) = controller();
        store.insert(OUTPUTS_KEY, r#"{"bullets":"- a","summary":42,"extra":"x"}"#);

        let outputs = session.load().await.outputs;
        assert_eq!(outputs.bullets, "- a");
        assert_eq!(outputs.summary, "");
        assert_eq!(outputs.proofread, "");
    }

    #[tokio::test]
    async fn test_failed_write_still_updates_memory() {
        let (session, store) = controller();
        store.fail_writes(true);

        let result = session.save(SessionPatch::raw_input("typed")).await;
        assert!(result.is_err());
        assert_eq!(session.state().raw_input, "typed");
        assert!(store.raw(RAW_INPUT_KEY).is_none());
    }

    #[tokio::test]
    async fn test_outputs_patch_leaves_raw_input_alone() {
        let (session, store) = controller();
        session.save(SessionPatch::raw_input("in")).await.unwrap();
        let mut outputs = Outputs::default();
        outputs.set(TransformKind::Proofread, "fixed".to_string());
        session.save(SessionPatch::outputs(outputs)).await.unwrap();

        assert_eq!(store.raw(RAW_INPUT_KEY).as_deref(), Some("in"));
        assert_eq!(session.output(Tab::Proofread), "fixed");
    }

    #[tokio::test]
    async fn test_concurrent_saves_store_latest_input() {
        let (session, store) = controller();

        let first = session.save(SessionPatch::raw_input("old"));
        let second = session.save(SessionPatch::raw_input("new"));
        let (a, b) = tokio::join!(first, second);
        a.unwrap();
        b.unwrap();

        assert_eq!(store.raw(RAW_INPUT_KEY).as_deref(), Some("new"));
        assert_eq!(session.state().raw_input, "new");
    }

    #[test]
    fn test_debounce_resets_on_push() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(300));

        debounce.push("a", start);
        debounce.push("ab", start + Duration::from_millis(200));
        assert_eq!(debounce.take_due(start + Duration::from_millis(400)), None);
        assert_eq!(
            debounce.take_due(start + Duration::from_millis(500)),
            Some("ab")
        );
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_debounce_flush_ignores_window() {
        let mut debounce = Debounce::new(Duration::from_secs(60));
        debounce.push(1, Instant::now());
        assert_eq!(debounce.flush(), Some(1));
        assert_eq!(debounce.flush(), None);
    }
}
