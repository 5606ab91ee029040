//! Theme and Colors
//!
//! InkLens uses a small ink-and-paper palette: a blue accent, and status
//! colours keyed to the orchestrator's status levels.

use inklens_core::StatusLevel;
use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// UI Colors
// ============================================================================

/// Accent ink blue (titles, selected tab)
pub const INK_BLUE: Color = Color::Rgb(110, 160, 255);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Info text
pub const INFO_TEXT: Color = Color::Rgb(200, 200, 200);

/// Busy indicator
pub const BUSY_AMBER: Color = Color::Rgb(255, 200, 90);

// ============================================================================
// Styles
// ============================================================================

/// Style for a status line of the given level
#[must_use]
pub fn status_style(level: StatusLevel) -> Style {
    let color = match level {
        StatusLevel::Info => INFO_TEXT,
        StatusLevel::Success => SUCCESS_GREEN,
        StatusLevel::Error => ERROR_RED,
    };
    Style::default().fg(color)
}

/// Style for the selected tab title
#[must_use]
pub fn selected_tab_style() -> Style {
    Style::default().fg(INK_BLUE).add_modifier(Modifier::BOLD)
}

/// Border style for the input box, red while input is invalid
#[must_use]
pub fn input_border_style(invalid: bool) -> Style {
    if invalid {
        Style::default().fg(ERROR_RED)
    } else {
        Style::default().fg(DIM_GRAY)
    }
}
