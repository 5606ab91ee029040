//! Tab Controller
//!
//! Tracks which result tab is active. The selection is a single field, so a
//! snapshot of all three tabs always has exactly one selected entry.

use crate::messages::{Tab, TabState};
use crate::session::Outputs;

/// Active-tab tracker
#[derive(Clone, Debug, Default)]
pub struct TabController {
    active: Tab,
}

impl TabController {
    /// Create a controller with `Summary` active
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `tab` the active tab and return the resulting selection flags
    pub fn activate(&mut self, tab: Tab) -> [TabState; 3] {
        self.active = tab;
        self.snapshot()
    }

    /// The active tab
    #[must_use]
    pub fn current_active(&self) -> Tab {
        self.active
    }

    /// Selection flags for every tab, in display order
    #[must_use]
    pub fn snapshot(&self) -> [TabState; 3] {
        Tab::ALL.map(|tab| TabState {
            tab,
            selected: tab == self.active,
        })
    }

    /// Backing text for a tab
    #[must_use]
    pub fn content_of<'a>(&self, tab: Tab, outputs: &'a Outputs) -> &'a str {
        outputs.get(tab)
    }

    /// Backing text for the active tab
    #[must_use]
    pub fn active_content<'a>(&self, outputs: &'a Outputs) -> &'a str {
        self.content_of(self.active, outputs)
    }
}
