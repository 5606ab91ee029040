//! Request Orchestrator
//!
//! The orchestrator is the only component that mutates session state. Every
//! user action arrives here, either as a direct method call or through
//! [`Orchestrator::handle_event`], and every visible effect leaves as a
//! [`ViewMessage`].
//!
//! All methods take `&self` so a surface can keep one transformation future
//! in flight while it keeps handling tab switches and typing. At most one
//! transformation runs at a time: [`BusyGate`] turns overlapping requests
//! into no-ops, and the permit releases the gate on every exit path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::backend::ProviderEvent;
use crate::clipboard::ClipboardChain;
use crate::events::SurfaceEvent;
use crate::gate::BusyGate;
use crate::messages::{StatusLevel, Tab, ViewMessage};
use crate::provider::{ProviderError, ProviderFacade};
use crate::request::{TransformKind, TransformationRequest};
use crate::session::{Debounce, SessionController, SessionPatch, SessionState};
use crate::storage::KeyValueStore;
use crate::tabs::TabController;

/// Status shown when no backend could take the request
pub const UNAVAILABLE_STATUS: &str = "AI unavailable on this device/browser.";

/// Default raw-input autosave window
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(300);

/// Drives transformations and owns the session
pub struct Orchestrator {
    /// Backend fallback chain
    facade: ProviderFacade,
    /// Session state and its durable copy
    session: SessionController,
    /// Context hint attached to summarize requests
    summary_context: Option<String>,
    /// Active tab
    tabs: Mutex<TabController>,
    /// Pending raw-input save
    autosave: Mutex<Debounce<String>>,
    /// Whether the surface is showing its invalid-input cue
    input_invalid: Mutex<bool>,
    /// Copy target
    clipboard: ClipboardChain,
    /// Single-flight gate for transformations
    gate: BusyGate,
    /// Channel to the UI surface
    tx: mpsc::Sender<ViewMessage>,
}

impl Orchestrator {
    /// Create an orchestrator with an empty in-memory session.
    ///
    /// Call [`Orchestrator::start`] to restore the persisted session.
    pub fn new(
        facade: ProviderFacade,
        store: Arc<dyn KeyValueStore>,
        clipboard: ClipboardChain,
        tx: mpsc::Sender<ViewMessage>,
    ) -> Self {
        Self {
            facade,
            session: SessionController::new(store),
            summary_context: None,
            tabs: Mutex::new(TabController::new()),
            autosave: Mutex::new(Debounce::new(DEFAULT_AUTOSAVE_DELAY)),
            input_invalid: Mutex::new(false),
            clipboard,
            gate: BusyGate::new(),
            tx,
        }
    }

    /// Use a different raw-input autosave window
    #[must_use]
    pub fn with_autosave_delay(self, delay: Duration) -> Self {
        *self.autosave.lock() = Debounce::new(delay);
        self
    }

    /// Attach `context` to every summarize request; blank means none
    #[must_use]
    pub fn with_summary_context(mut self, context: Option<String>) -> Self {
        self.summary_context = context.filter(|c| !c.trim().is_empty());
        self
    }

    // ============================================
    // Accessors
    // ============================================

    /// Whether a transformation is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Snapshot of the in-memory session
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// The active tab
    #[must_use]
    pub fn current_tab(&self) -> Tab {
        self.tabs.lock().current_active()
    }

    /// Current content of a tab
    #[must_use]
    pub fn content_of(&self, tab: Tab) -> String {
        self.session.output(tab)
    }

    /// Backend names in fallback order
    #[must_use]
    pub fn backend_names(&self) -> Vec<String> {
        self.facade
            .backend_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // ============================================
    // Lifecycle
    // ============================================

    /// Restore the persisted session and tell the surface about it
    pub async fn start(&self) {
        let state = self.session.load().await;
        tracing::info!(
            restored = !state.is_empty(),
            backends = ?self.facade.backend_names(),
            "Orchestrator started"
        );

        if !state.raw_input.is_empty() {
            self.send(ViewMessage::InputRestored {
                text: state.raw_input.clone(),
            })
            .await;
        }
        for tab in Tab::ALL {
            self.send(ViewMessage::OutputUpdated {
                tab,
                content: state.outputs.get(tab).to_string(),
            })
            .await;
        }

        self.activate_tab(Tab::Summary).await;

        if state.is_empty() {
            self.notify(StatusLevel::Info, "Ready.").await;
        } else {
            self.notify(StatusLevel::Success, "Restored last session.")
                .await;
        }
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::InputChanged { text } => self.input_changed(&text).await,
            SurfaceEvent::Transform { kind, text } => self.handle(kind, &text).await,
            SurfaceEvent::Clear => self.clear().await,
            SurfaceEvent::Save => self.save().await,
            SurfaceEvent::CopyActive => self.copy_active().await,
            SurfaceEvent::SelectTab { tab } => self.activate_tab(tab).await,
            SurfaceEvent::Quit => self.flush_autosave().await,
        }
    }

    // ============================================
    // Transformations
    // ============================================

    /// Run one transformation end to end.
    ///
    /// Empty input is rejected before the gate is touched. A request made
    /// while another is in flight does nothing at all.
    pub async fn handle(&self, kind: TransformKind, raw_text: &str) {
        let request = match TransformationRequest::new(kind, raw_text) {
            Ok(request) => match self.summary_context {
                Some(ref context) if kind == TransformKind::Summarize => {
                    request.with_context(context.clone())
                }
                _ => request,
            },
            Err(e) => {
                *self.input_invalid.lock() = true;
                self.send(ViewMessage::InputInvalid).await;
                self.notify(StatusLevel::Error, &e.to_string()).await;
                return;
            }
        };

        let Some(permit) = self.gate.try_acquire() else {
            tracing::debug!(kind = %kind, "Ignoring request while busy");
            return;
        };

        self.send(ViewMessage::Busy { busy: true }).await;
        self.notify(StatusLevel::Info, kind.progress_label()).await;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ProviderEvent>();
        let call = async move {
            let result = self.facade.execute(&request, &events_tx).await;
            drop(events_tx);
            result
        };
        let forward = async {
            while let Some(event) = events_rx.recv().await {
                self.notify(StatusLevel::Info, &event.status_text()).await;
            }
        };
        let (result, ()) = tokio::join!(call, forward);

        match result {
            Ok(text) => self.commit(kind, text).await,
            Err(ProviderError::Unavailable) => {
                tracing::warn!(kind = %kind, "No backend available");
                self.notify(StatusLevel::Error, UNAVAILABLE_STATUS).await;
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Transformation failed");
                self.notify(StatusLevel::Error, &format!("Failed to {kind}."))
                    .await;
            }
        }

        drop(permit);
        self.send(ViewMessage::Busy { busy: false }).await;
    }

    /// Store a result, persist the session, then update the surface
    async fn commit(&self, kind: TransformKind, text: String) {
        let tab = kind.tab();
        self.session.commit_output(kind, text.clone());
        // The full save below writes the latest raw input.
        self.autosave.lock().cancel();
        let _ = self.session.save_all().await;
        tracing::info!(kind = %kind, chars = text.chars().count(), "Committed result");

        self.send(ViewMessage::OutputUpdated { tab, content: text })
            .await;
        self.activate_tab(tab).await;
        self.notify(StatusLevel::Success, "Done.").await;
    }

    // ============================================
    // Other actions
    // ============================================

    /// Persist the raw input and all outputs now
    pub async fn save(&self) {
        if self.ignored_while_busy("save") {
            return;
        }
        self.autosave.lock().cancel();
        let _ = self.session.save_all().await;
        self.notify(StatusLevel::Success, "Saved.").await;
    }

    /// Empty the input and every output, in memory and on disk
    pub async fn clear(&self) {
        if self.ignored_while_busy("clear") {
            return;
        }
        self.autosave.lock().cancel();
        let _ = self
            .session
            .save(SessionPatch::full(&SessionState::default()))
            .await;
        *self.input_invalid.lock() = false;

        self.send(ViewMessage::InputCleared).await;
        for tab in Tab::ALL {
            self.send(ViewMessage::OutputUpdated {
                tab,
                content: String::new(),
            })
            .await;
        }
        self.notify(StatusLevel::Info, "Cleared. Paste new text to begin.")
            .await;
    }

    /// Copy the active tab's content to the clipboard
    pub async fn copy_active(&self) {
        if self.ignored_while_busy("copy") {
            return;
        }
        let tab = self.current_tab();
        let content = self.content_of(tab);
        if content.is_empty() {
            self.notify(StatusLevel::Error, "Nothing to copy.").await;
            return;
        }

        match self.clipboard.copy(&content).await {
            Ok(()) => {
                let message = format!(
                    "Copied {} chars from {}.",
                    content.chars().count(),
                    tab.title()
                );
                self.notify(StatusLevel::Success, &message).await;
            }
            Err(e) => {
                tracing::warn!(tab = %tab, error = %e, "Copy failed");
                self.notify(StatusLevel::Error, "Copy failed.").await;
            }
        }
    }

    /// Switch the active tab
    pub async fn activate_tab(&self, tab: Tab) {
        let tabs = self.tabs.lock().activate(tab);
        self.send(ViewMessage::TabActivated { active: tab, tabs })
            .await;
    }

    // ============================================
    // Input and autosave
    // ============================================

    /// Record an edit of the raw input and schedule an autosave.
    ///
    /// Every non-blank edit reports "Ready." unless a transformation is in
    /// flight, whose progress keeps the status line.
    pub async fn input_changed(&self, text: &str) {
        self.session.set_raw_input(text);
        self.autosave.lock().push(text.to_string(), Instant::now());
        if text.trim().is_empty() {
            return;
        }

        let was_invalid = std::mem::replace(&mut *self.input_invalid.lock(), false);
        if was_invalid {
            self.send(ViewMessage::InputAccepted).await;
        }
        if !self.gate.is_busy() {
            self.notify(StatusLevel::Info, "Ready.").await;
        }
    }

    /// Write the pending raw input if its window has elapsed
    ///
    /// Returns whether a write was attempted. Nothing is taken while a
    /// transformation is in flight; its commit writes the raw input anyway.
    pub async fn poll_autosave(&self) -> bool {
        self.poll_autosave_at(Instant::now()).await
    }

    /// [`Orchestrator::poll_autosave`] against an explicit clock
    pub async fn poll_autosave_at(&self, now: Instant) -> bool {
        if self.gate.is_busy() {
            return false;
        }
        let due = self.autosave.lock().take_due(now);
        match due {
            Some(text) => {
                let _ = self.session.save(SessionPatch::raw_input(text)).await;
                true
            }
            None => false,
        }
    }

    /// Write the pending raw input immediately, if any
    pub async fn flush_autosave(&self) {
        let pending = self.autosave.lock().flush();
        if let Some(text) = pending {
            tracing::debug!("Flushing pending input save");
            let _ = self.session.save(SessionPatch::raw_input(text)).await;
        }
    }

    // ============================================
    // Helpers
    // ============================================

    fn ignored_while_busy(&self, action: &str) -> bool {
        let busy = self.gate.is_busy();
        if busy {
            tracing::debug!(action, "Ignoring action while busy");
        }
        busy
    }

    /// Replace the surface's status line
    async fn notify(&self, level: StatusLevel, text: &str) {
        self.send(ViewMessage::Status {
            text: text.to_string(),
            level,
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: ViewMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use super::*;
    use crate::backend::{CapabilityStatus, HeuristicBackend, ProviderEvents, TransformBackend};
    use crate::clipboard::{Clipboard, ClipboardError, NoClipboard};
    use crate::messages::TabState;
    use crate::session::Outputs;
    use crate::storage::{MemoryStore, OUTPUTS_KEY, RAW_INPUT_KEY};

    // ============================================
    // Test doubles
    // ============================================

    /// Backend replying with a fixed result, optionally waiting for a signal
    struct MockBackend {
        status: CapabilityStatus,
        reply: Result<String, String>,
        progress: Vec<f64>,
        gate: Option<Arc<Notify>>,
        calls: Arc<AtomicUsize>,
        contexts: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl MockBackend {
        fn replying(text: &str) -> Self {
            Self {
                status: CapabilityStatus::Available,
                reply: Ok(text.to_string()),
                progress: Vec::new(),
                gate: None,
                calls: Arc::new(AtomicUsize::new(0)),
                contexts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl TransformBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn probe(&self) -> CapabilityStatus {
            self.status
        }

        async fn execute(
            &self,
            request: &TransformationRequest,
            events: &ProviderEvents,
        ) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.contexts.lock().push(request.context.clone());
            for fraction in &self.progress {
                let _ = events.send(ProviderEvent::DownloadProgress {
                    backend: "mock".to_string(),
                    fraction: *fraction,
                });
            }
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[derive(Clone, Default)]
    struct CountingClipboard {
        writes: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Clipboard for CountingClipboard {
        fn name(&self) -> &str {
            "counting"
        }

        async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            self.writes.lock().push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        store: MemoryStore,
        rx: mpsc::Receiver<ViewMessage>,
    }

    impl Harness {
        fn with_facade(facade: ProviderFacade, clipboard: ClipboardChain) -> Self {
            let store = MemoryStore::new();
            let (tx, rx) = mpsc::channel(100);
            let orchestrator = Orchestrator::new(facade, Arc::new(store.clone()), clipboard, tx);
            Self {
                orchestrator,
                store,
                rx,
            }
        }

        fn with_backend(backend: MockBackend) -> Self {
            Self::with_facade(
                ProviderFacade::new(vec![Box::new(backend)]),
                ClipboardChain::new(NoClipboard),
            )
        }

        fn drain(&mut self) -> Vec<ViewMessage> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                out.push(msg);
            }
            out
        }

        fn statuses(&mut self) -> Vec<(String, StatusLevel)> {
            self.drain()
                .into_iter()
                .filter_map(|m| match m {
                    ViewMessage::Status { text, level } => Some((text, level)),
                    _ => None,
                })
                .collect()
        }
    }

    fn status(text: &str, level: StatusLevel) -> ViewMessage {
        ViewMessage::Status {
            text: text.to_string(),
            level,
        }
    }

    // ============================================
    // handle
    // ============================================

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_gate() {
        let backend = MockBackend::replying("unused");
        let calls = Arc::clone(&backend.calls);
        let mut h = Harness::with_backend(backend);

        h.orchestrator
            .handle(TransformKind::Summarize, "  \n\t ")
            .await;

        assert_eq!(
            h.drain(),
            vec![
                ViewMessage::InputInvalid,
                status("Please paste some text first.", StatusLevel::Error),
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!h.orchestrator.is_busy());
        assert_eq!(h.orchestrator.state(), SessionState::default());
        assert_eq!(h.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_success_commits_activates_and_persists() {
        let mut h = Harness::with_backend(MockBackend::replying("- crisp bullet"));
        h.orchestrator.input_changed("raw notes").await;
        h.drain();

        h.orchestrator.handle(TransformKind::Refine, "raw notes").await;

        let messages = h.drain();
        assert_eq!(messages.first(), Some(&ViewMessage::Busy { busy: true }));
        assert_eq!(messages.last(), Some(&ViewMessage::Busy { busy: false }));
        assert!(messages.contains(&status("Generating 5 bullets...", StatusLevel::Info)));
        assert!(messages.contains(&ViewMessage::OutputUpdated {
            tab: Tab::Bullets,
            content: "- crisp bullet".to_string(),
        }));
        assert!(messages.contains(&status("Done.", StatusLevel::Success)));

        assert_eq!(h.orchestrator.current_tab(), Tab::Bullets);
        assert_eq!(h.orchestrator.content_of(Tab::Bullets), "- crisp bullet");

        let stored = Outputs::from_json_lenient(&h.store.raw(OUTPUTS_KEY).unwrap());
        assert_eq!(stored.bullets, "- crisp bullet");
        assert_eq!(h.store.raw(RAW_INPUT_KEY).as_deref(), Some("raw notes"));
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_tab_activation_has_single_selection() {
        let mut h = Harness::with_backend(MockBackend::replying("fixed"));
        h.orchestrator.handle(TransformKind::Proofread, "teh text").await;

        let activated: Vec<[TabState; 3]> = h
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                ViewMessage::TabActivated { tabs, .. } => Some(tabs),
                _ => None,
            })
            .collect();
        assert_eq!(activated.len(), 1);
        let selected: Vec<Tab> = activated[0]
            .iter()
            .filter(|t| t.selected)
            .map(|t| t.tab)
            .collect();
        assert_eq!(selected, vec![Tab::Proofread]);
    }

    #[tokio::test]
    async fn test_second_request_while_busy_is_noop() {
        let notify = Arc::new(Notify::new());
        let backend = MockBackend {
            gate: Some(Arc::clone(&notify)),
            ..MockBackend::replying("summary")
        };
        let calls = Arc::clone(&backend.calls);
        let mut h = Harness::with_backend(backend);

        let first = h.orchestrator.handle(TransformKind::Summarize, "text");
        let second = async {
            tokio::task::yield_now().await;
            assert!(h.orchestrator.is_busy());
            h.orchestrator.handle(TransformKind::Refine, "text").await;
            h.orchestrator.clear().await;
            notify.notify_one();
        };
        tokio::join!(first, second);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.orchestrator.content_of(Tab::Summary), "summary");
        assert_eq!(h.orchestrator.content_of(Tab::Bullets), "");

        let messages = h.drain();
        let busy_on = messages
            .iter()
            .filter(|m| **m == ViewMessage::Busy { busy: true })
            .count();
        assert_eq!(busy_on, 1);
        assert!(!messages.contains(&ViewMessage::InputCleared));
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_unavailable_leaves_state_identical() {
        let backend = MockBackend {
            status: CapabilityStatus::Unavailable,
            ..MockBackend::replying("never")
        };
        let mut h = Harness::with_backend(backend);
        h.store.insert(RAW_INPUT_KEY, "kept");
        h.store
            .insert(OUTPUTS_KEY, r#"{"summary":"old","bullets":"","proofread":""}"#);
        h.orchestrator.start().await;
        h.drain();
        let before = h.orchestrator.state();
        let writes = h.store.write_count();

        h.orchestrator.handle(TransformKind::Summarize, "kept").await;

        assert_eq!(h.orchestrator.state(), before);
        assert_eq!(h.store.write_count(), writes);
        assert!(!h.orchestrator.is_busy());
        let statuses = h.statuses();
        assert_eq!(
            statuses.last(),
            Some(&(UNAVAILABLE_STATUS.to_string(), StatusLevel::Error))
        );
    }

    #[tokio::test]
    async fn test_backend_failure_reports_kind() {
        let backend = MockBackend {
            reply: Err("boom".to_string()),
            ..MockBackend::replying("")
        };
        let mut h = Harness::with_backend(backend);

        h.orchestrator.handle(TransformKind::Proofread, "text").await;

        let statuses = h.statuses();
        assert_eq!(
            statuses.last(),
            Some(&("Failed to proofread.".to_string(), StatusLevel::Error))
        );
        assert_eq!(h.orchestrator.state(), SessionState::default());
        assert!(h.orchestrator.gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_download_progress_is_forwarded() {
        let backend = MockBackend {
            progress: vec![0.25, 1.0],
            ..MockBackend::replying("done")
        };
        let mut h = Harness::with_backend(backend);

        h.orchestrator.handle(TransformKind::Summarize, "text").await;

        let statuses: Vec<String> = h.statuses().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            statuses,
            vec![
                "Summarizing...".to_string(),
                "Downloading on-device model… 25%".to_string(),
                "Downloading on-device model… 100%".to_string(),
                "Done.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_legacy_proofread_scenario() {
        let facade = ProviderFacade::builder()
            .legacy(HeuristicBackend::new())
            .build();
        let mut h = Harness::with_facade(facade, ClipboardChain::new(NoClipboard));

        h.orchestrator
            .handle(TransformKind::Proofread, "Hello world. This is a test.")
            .await;

        assert_eq!(
            h.orchestrator.content_of(Tab::Proofread),
            "1. Hello world. This is a test."
        );
        assert_eq!(h.orchestrator.current_tab(), Tab::Proofread);
        h.drain();
    }

    // ============================================
    // Other actions
    // ============================================

    #[tokio::test]
    async fn test_start_restores_session() {
        let mut h = Harness::with_backend(MockBackend::replying(""));
        h.store.insert(RAW_INPUT_KEY, "X");
        h.store
            .insert(OUTPUTS_KEY, r#"{"summary":"S","bullets":"B","proofread":"P"}"#);

        h.orchestrator.start().await;

        let messages = h.drain();
        assert_eq!(
            messages.first(),
            Some(&ViewMessage::InputRestored {
                text: "X".to_string()
            })
        );
        assert!(messages.contains(&ViewMessage::OutputUpdated {
            tab: Tab::Proofread,
            content: "P".to_string(),
        }));
        assert_eq!(
            messages.last(),
            Some(&status("Restored last session.", StatusLevel::Success))
        );
        assert_eq!(h.orchestrator.current_tab(), Tab::Summary);
    }

    #[tokio::test]
    async fn test_start_with_nothing_stored_is_ready() {
        let mut h = Harness::with_backend(MockBackend::replying(""));
        h.orchestrator.start().await;

        let messages = h.drain();
        assert!(!messages
            .iter()
            .any(|m| matches!(m, ViewMessage::InputRestored { .. })));
        assert_eq!(messages.last(), Some(&status("Ready.", StatusLevel::Info)));
    }

    #[tokio::test]
    async fn test_clear_empties_memory_and_storage() {
        let mut h = Harness::with_backend(MockBackend::replying("S"));
        h.orchestrator.input_changed("X").await;
        h.orchestrator.handle(TransformKind::Summarize, "X").await;
        h.drain();

        h.orchestrator.clear().await;

        assert_eq!(h.orchestrator.state(), SessionState::default());
        assert_eq!(h.store.raw(RAW_INPUT_KEY).as_deref(), Some(""));
        let stored = Outputs::from_json_lenient(&h.store.raw(OUTPUTS_KEY).unwrap());
        assert_eq!(stored, Outputs::default());
        let messages = h.drain();
        assert_eq!(messages[0], ViewMessage::InputCleared);
        assert_eq!(
            messages.last(),
            Some(&status("Cleared. Paste new text to begin.", StatusLevel::Info))
        );
    }

    #[tokio::test]
    async fn test_save_writes_everything() {
        let mut h = Harness::with_backend(MockBackend::replying(""));
        h.orchestrator.input_changed("draft").await;

        h.orchestrator.save().await;

        assert_eq!(h.store.raw(RAW_INPUT_KEY).as_deref(), Some("draft"));
        assert!(h.store.raw(OUTPUTS_KEY).is_some());
        assert_eq!(
            h.statuses(),
            vec![
                ("Ready.".to_string(), StatusLevel::Info),
                ("Saved.".to_string(), StatusLevel::Success),
            ]
        );
        assert!(
            !h.orchestrator
                .poll_autosave_at(Instant::now() + Duration::from_secs(5))
                .await
        );
    }

    #[tokio::test]
    async fn test_copy_empty_does_not_touch_clipboard() {
        let clipboard = CountingClipboard::default();
        let mut h = Harness::with_facade(
            ProviderFacade::new(Vec::new()),
            ClipboardChain::new(clipboard.clone()),
        );

        h.orchestrator.copy_active().await;

        assert!(clipboard.writes.lock().is_empty());
        assert_eq!(
            h.statuses(),
            vec![("Nothing to copy.".to_string(), StatusLevel::Error)]
        );
    }

    #[tokio::test]
    async fn test_copy_reports_char_count() {
        let clipboard = CountingClipboard::default();
        let mut h = Harness::with_facade(
            ProviderFacade::new(vec![Box::new(MockBackend::replying("héllo"))]),
            ClipboardChain::new(NoClipboard).with_fallback(clipboard.clone()),
        );
        h.orchestrator.handle(TransformKind::Summarize, "x").await;
        h.drain();

        h.orchestrator.copy_active().await;

        assert_eq!(*clipboard.writes.lock(), vec!["héllo".to_string()]);
        assert_eq!(
            h.statuses(),
            vec![(
                "Copied 5 chars from Summary.".to_string(),
                StatusLevel::Success
            )]
        );
    }

    #[tokio::test]
    async fn test_copy_failure_is_error_status() {
        let mut h = Harness::with_backend(MockBackend::replying("text"));
        h.orchestrator.handle(TransformKind::Summarize, "x").await;
        h.drain();

        h.orchestrator.copy_active().await;

        assert_eq!(
            h.statuses(),
            vec![("Copy failed.".to_string(), StatusLevel::Error)]
        );
    }

    // ============================================
    // Input and autosave
    // ============================================

    #[tokio::test]
    async fn test_autosave_waits_for_quiet_window() {
        let h = Harness::with_backend(MockBackend::replying(""));
        let orchestrator = h.orchestrator.with_autosave_delay(Duration::from_millis(300));

        orchestrator.input_changed("a").await;
        orchestrator.input_changed("ab").await;
        assert!(!orchestrator.poll_autosave_at(Instant::now()).await);
        assert_eq!(h.store.write_count(), 0);

        assert!(
            orchestrator
                .poll_autosave_at(Instant::now() + Duration::from_millis(301))
                .await
        );
        assert_eq!(h.store.raw(RAW_INPUT_KEY).as_deref(), Some("ab"));
        assert_eq!(h.store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_flush_autosave_writes_pending_input() {
        let h = Harness::with_backend(MockBackend::replying(""));
        h.orchestrator.input_changed("unsaved").await;

        h.orchestrator.handle_event(SurfaceEvent::Quit).await;

        assert_eq!(h.store.raw(RAW_INPUT_KEY).as_deref(), Some("unsaved"));
    }

    #[tokio::test]
    async fn test_valid_input_clears_invalid_cue() {
        let mut h = Harness::with_backend(MockBackend::replying(""));
        h.orchestrator.handle(TransformKind::Summarize, "").await;
        h.drain();

        h.orchestrator.input_changed("   ").await;
        assert!(h.drain().is_empty());

        h.orchestrator.input_changed("now text").await;
        assert_eq!(
            h.drain(),
            vec![ViewMessage::InputAccepted, status("Ready.", StatusLevel::Info)]
        );

        h.orchestrator.input_changed("more text").await;
        assert_eq!(h.drain(), vec![status("Ready.", StatusLevel::Info)]);
    }

    #[tokio::test]
    async fn test_edit_after_done_reports_ready() {
        let mut h = Harness::with_backend(MockBackend::replying("- One."));
        h.orchestrator
            .handle(TransformKind::Summarize, "One. Two.")
            .await;
        assert!(h.drain().contains(&status("Done.", StatusLevel::Success)));

        h.orchestrator.input_changed("One. Two. Three.").await;

        assert_eq!(h.drain(), vec![status("Ready.", StatusLevel::Info)]);
        assert_eq!(h.orchestrator.state().raw_input, "One. Two. Three.");
    }

    #[tokio::test]
    async fn test_edit_while_busy_keeps_progress_status() {
        let notify = Arc::new(Notify::new());
        let backend = MockBackend {
            gate: Some(Arc::clone(&notify)),
            ..MockBackend::replying("summary")
        };
        let mut h = Harness::with_backend(backend);
        let later = Instant::now() + Duration::from_secs(5);

        let first = h.orchestrator.handle(TransformKind::Summarize, "text");
        let second = async {
            tokio::task::yield_now().await;
            h.orchestrator.input_changed("text, edited").await;
            assert!(!h.orchestrator.poll_autosave_at(later).await);
            notify.notify_one();
        };
        tokio::join!(first, second);

        let statuses: Vec<String> = h.statuses().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            statuses,
            vec!["Summarizing...".to_string(), "Done.".to_string()]
        );
        assert_eq!(h.store.raw(RAW_INPUT_KEY).as_deref(), Some("text, edited"));
        assert!(!h.orchestrator.poll_autosave_at(later).await);
    }

    #[tokio::test]
    async fn test_summary_context_reaches_summarize_only() {
        let backend = MockBackend::replying("out");
        let contexts = Arc::clone(&backend.contexts);
        let mut h = Harness::with_backend(backend);
        h.orchestrator = h
            .orchestrator
            .with_summary_context(Some("meeting notes".to_string()));

        h.orchestrator.handle(TransformKind::Summarize, "text").await;
        h.orchestrator.handle(TransformKind::Proofread, "text").await;

        assert_eq!(
            *contexts.lock(),
            vec![Some("meeting notes".to_string()), None]
        );
        h.drain();
    }

    #[tokio::test]
    async fn test_blank_summary_context_is_dropped() {
        let backend = MockBackend::replying("out");
        let contexts = Arc::clone(&backend.contexts);
        let mut h = Harness::with_backend(backend);
        h.orchestrator = h.orchestrator.with_summary_context(Some("  ".to_string()));

        h.orchestrator.handle(TransformKind::Summarize, "text").await;

        assert_eq!(*contexts.lock(), vec![None]);
        h.drain();
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory() {
        let mut h = Harness::with_backend(MockBackend::replying("S"));
        h.store.fail_writes(true);

        h.orchestrator.handle(TransformKind::Summarize, "x").await;

        assert_eq!(h.orchestrator.content_of(Tab::Summary), "S");
        assert!(h.statuses().contains(&("Done.".to_string(), StatusLevel::Success)));
    }
}
