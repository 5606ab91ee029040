//! Display State Types
//!
//! State the TUI renders from. It is derived from `ViewMessage`s plus the
//! local input editor, and carries no business rules: the orchestrator
//! decides what the status says, which tab is active, and when the surface
//! is busy.

use inklens_core::{StatusLevel, Tab, ViewMessage};

/// Spinner frames shown while busy
const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Everything the TUI draws
#[derive(Clone, Debug)]
pub struct DisplayState {
    /// Input editor contents
    pub input: String,
    /// Whether the input box shows its invalid cue
    pub input_invalid: bool,
    /// Tab contents in display order
    outputs: [String; 3],
    /// The active tab
    pub active: Tab,
    /// Status line text
    pub status: String,
    /// Status line severity
    pub status_level: StatusLevel,
    /// Whether a transformation is running
    pub busy: bool,
    /// Spinner animation frame
    spinner_frame: usize,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayState {
    /// Create an empty display state
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: String::new(),
            input_invalid: false,
            outputs: Default::default(),
            active: Tab::Summary,
            status: String::new(),
            status_level: StatusLevel::Info,
            busy: false,
            spinner_frame: 0,
        }
    }

    /// Apply a message from the orchestrator
    pub fn apply_message(&mut self, msg: ViewMessage) {
        match msg {
            ViewMessage::Status { text, level } => {
                self.status = text;
                self.status_level = level;
            }
            ViewMessage::Busy { busy } => {
                self.busy = busy;
                self.spinner_frame = 0;
            }
            ViewMessage::TabActivated { active, .. } => {
                self.active = active;
            }
            ViewMessage::OutputUpdated { tab, content } => {
                self.outputs[tab_index(tab)] = content;
            }
            ViewMessage::InputRestored { text } => {
                self.input = text;
            }
            ViewMessage::InputInvalid => {
                self.input_invalid = true;
            }
            ViewMessage::InputAccepted => {
                self.input_invalid = false;
            }
            ViewMessage::InputCleared => {
                self.input.clear();
                self.input_invalid = false;
            }
        }
    }

    /// Content of a tab
    #[must_use]
    pub fn output(&self, tab: Tab) -> &str {
        &self.outputs[tab_index(tab)]
    }

    /// Content of the active tab
    #[must_use]
    pub fn active_output(&self) -> &str {
        self.output(self.active)
    }

    /// Advance timers
    pub fn tick(&mut self) {
        if self.busy {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
        }
    }

    /// Busy indicator glyph, if busy
    #[must_use]
    pub fn spinner(&self) -> Option<char> {
        self.busy.then(|| SPINNER[self.spinner_frame])
    }
}

fn tab_index(tab: Tab) -> usize {
    match tab {
        Tab::Summary => 0,
        Tab::Bullets => 1,
        Tab::Proofread => 2,
    }
}
