//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! 1. Converts terminal events to `SurfaceEvent`s
//! 2. Hands them to the orchestrator
//! 3. Applies the `ViewMessage`s it gets back to `DisplayState`
//! 4. Renders based on `DisplayState`
//!
//! A transformation can take seconds, so its future is kept in a single
//! slot and polled by the same `select!` that reads keys and view messages.
//! The UI keeps rendering status and progress while a request is pending.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;

use inklens_core::{Orchestrator, SurfaceEvent, Tab, TransformKind, ViewMessage};

use crate::display::DisplayState;
use crate::theme;

/// Autosave and spinner tick
const TICK: Duration = Duration::from_millis(100);

/// Key hints for the help line
const HELP: &[(&str, &str)] = &[
    ("^S", "summarize"),
    ("^B", "bullets"),
    ("^P", "proofread"),
    ("^Y", "copy"),
    ("^W", "save"),
    ("^L", "clear"),
    ("Tab", "switch"),
    ("Esc", "quit"),
];

/// The one transformation allowed in flight
type InFlight<'a> = Pin<Box<dyn Future<Output = ()> + 'a>>;

/// Outcome of one `select!` round, applied after the borrowed futures drop
enum Step {
    Terminal(Option<std::io::Result<Event>>),
    View(ViewMessage),
    Settled,
    Tick,
}

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// Display state derived from view messages
    display: DisplayState,
    /// Backend chain, for the header
    backends: Vec<String>,
}

impl App {
    /// Create a new App instance
    #[must_use]
    pub fn new(backends: Vec<String>) -> Self {
        Self {
            running: true,
            display: DisplayState::new(),
            backends,
        }
    }

    /// Current display state
    #[must_use]
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Whether the event loop should keep going
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Main event loop
    pub async fn run<'o, B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        orchestrator: &'o Orchestrator,
        rx: &mut mpsc::Receiver<ViewMessage>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut tick = tokio::time::interval(TICK);
        let mut in_flight: Option<InFlight<'o>> = None;

        orchestrator.start().await;
        self.drain(rx);

        while self.running {
            terminal.draw(|frame| self.draw(frame))?;

            let step = tokio::select! {
                maybe_event = event_stream.next() => Step::Terminal(maybe_event),
                Some(msg) = rx.recv() => Step::View(msg),
                () = async {
                    if let Some(fut) = in_flight.as_mut() {
                        fut.await;
                    }
                }, if in_flight.is_some() => Step::Settled,
                _ = tick.tick() => Step::Tick,
            };

            match step {
                Step::Terminal(Some(Ok(event))) => {
                    if let Some(event) = self.handle_terminal_event(event) {
                        self.dispatch(event, orchestrator, &mut in_flight).await;
                    }
                }
                Step::Terminal(Some(Err(e))) => {
                    tracing::warn!("Terminal event error: {}", e);
                }
                Step::Terminal(None) => {
                    tracing::info!("Terminal event stream closed");
                    // The pending request may hold the session writer.
                    in_flight = None;
                    orchestrator.flush_autosave().await;
                    self.running = false;
                }
                Step::View(msg) => self.apply_message(msg),
                Step::Settled => in_flight = None,
                Step::Tick => {
                    orchestrator.poll_autosave().await;
                    self.display.tick();
                }
            }

            self.drain(rx);
        }

        Ok(())
    }

    /// Route a surface event to the orchestrator
    async fn dispatch<'o>(
        &mut self,
        event: SurfaceEvent,
        orchestrator: &'o Orchestrator,
        in_flight: &mut Option<InFlight<'o>>,
    ) {
        match event {
            // Action keys are disabled while a request runs.
            event if event.is_long_running() && in_flight.is_some() => {
                tracing::debug!(?event, "Transformation already in flight");
            }
            event if event.is_long_running() => {
                *in_flight = Some(Box::pin(orchestrator.handle_event(event)));
            }
            SurfaceEvent::Quit => {
                // Abandon the pending request; the quit flush must not wait on it.
                *in_flight = None;
                orchestrator.handle_event(SurfaceEvent::Quit).await;
                self.running = false;
            }
            other => orchestrator.handle_event(other).await,
        }
    }

    /// Apply one view message
    pub fn apply_message(&mut self, msg: ViewMessage) {
        self.display.apply_message(msg);
    }

    /// Apply all pending view messages
    fn drain(&mut self, rx: &mut mpsc::Receiver<ViewMessage>) {
        while let Ok(msg) = rx.try_recv() {
            self.apply_message(msg);
        }
    }

    /// Translate a terminal event, editing the input buffer as needed
    pub fn handle_terminal_event(&mut self, event: Event) -> Option<SurfaceEvent> {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Paste(text) => {
                self.display.input.push_str(&text.replace("\r\n", "\n"));
                Some(self.input_changed())
            }
            _ => None,
        }
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: KeyEvent) -> Option<SurfaceEvent> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            // Quit
            KeyCode::Esc => Some(SurfaceEvent::Quit),
            KeyCode::Char('c') if ctrl => Some(SurfaceEvent::Quit),

            // Transformations
            KeyCode::Char('s') if ctrl => Some(self.transform(TransformKind::Summarize)),
            KeyCode::Char('b') if ctrl => Some(self.transform(TransformKind::Refine)),
            KeyCode::Char('p') if ctrl => Some(self.transform(TransformKind::Proofread)),

            // Session actions
            KeyCode::Char('l') if ctrl => Some(SurfaceEvent::Clear),
            KeyCode::Char('y') if ctrl => Some(SurfaceEvent::CopyActive),
            KeyCode::Char('w') if ctrl => Some(SurfaceEvent::Save),

            // Tabs
            KeyCode::Tab => Some(SurfaceEvent::SelectTab {
                tab: self.display.active.next(),
            }),
            KeyCode::BackTab => Some(SurfaceEvent::SelectTab {
                tab: self.display.active.previous(),
            }),
            KeyCode::F(n @ 1..=3) => Some(SurfaceEvent::SelectTab {
                tab: Tab::ALL[usize::from(n - 1)],
            }),

            // Editing
            KeyCode::Enter => {
                self.display.input.push('\n');
                Some(self.input_changed())
            }
            KeyCode::Char(c) if !ctrl => {
                self.display.input.push(c);
                Some(self.input_changed())
            }
            KeyCode::Backspace => self
                .display
                .input
                .pop()
                .map(|_| self.input_changed()),

            _ => None,
        }
    }

    fn transform(&self, kind: TransformKind) -> SurfaceEvent {
        SurfaceEvent::Transform {
            kind,
            text: self.display.input.clone(),
        }
    }

    fn input_changed(&self) -> SurfaceEvent {
        SurfaceEvent::InputChanged {
            text: self.display.input.clone(),
        }
    }

    // ============================================
    // Rendering
    // ============================================

    /// Draw the whole screen
    pub fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Percentage(40),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        frame.render_widget(self.header(), chunks[0]);
        frame.render_widget(self.input(chunks[1].height), chunks[1]);
        frame.render_widget(self.tabs(), chunks[2]);
        frame.render_widget(self.output(), chunks[3]);
        frame.render_widget(self.status(), chunks[4]);
        frame.render_widget(self.help(), chunks[5]);
    }

    fn header(&self) -> Paragraph<'_> {
        let chain = if self.backends.is_empty() {
            "no backends".to_string()
        } else {
            self.backends.join(" -> ")
        };
        Paragraph::new(Line::from(vec![
            Span::styled(" InkLens ", theme::selected_tab_style()),
            Span::styled(format!("[{chain}]"), Style::default().fg(theme::DIM_GRAY)),
        ]))
    }

    fn input(&self, height: u16) -> Paragraph<'_> {
        let text = format!("{}_", self.display.input);
        let inner_height = usize::from(height.saturating_sub(2));
        let lines = text.lines().count().max(1);
        let scroll = u16::try_from(lines.saturating_sub(inner_height)).unwrap_or(u16::MAX);
        let title = if self.display.input_invalid {
            " Input (paste some text) "
        } else {
            " Input "
        };
        Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(title)
                    .border_style(theme::input_border_style(self.display.input_invalid)),
            )
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
    }

    fn tabs(&self) -> Tabs<'_> {
        let selected = Tab::ALL
            .iter()
            .position(|t| *t == self.display.active)
            .unwrap_or(0);
        Tabs::new(Tab::ALL.iter().enumerate().map(|(i, t)| format!("F{} {}", i + 1, t.title())))
            .select(selected)
            .style(Style::default().fg(theme::DIM_GRAY))
            .highlight_style(theme::selected_tab_style())
            .divider("|")
    }

    fn output(&self) -> Paragraph<'_> {
        Paragraph::new(self.display.active_output())
            .block(
                Block::bordered()
                    .title(format!(" {} ", self.display.active.title()))
                    .border_style(Style::default().fg(theme::INK_BLUE)),
            )
            .wrap(Wrap { trim: false })
    }

    fn status(&self) -> Paragraph<'_> {
        let mut spans = Vec::with_capacity(2);
        if let Some(glyph) = self.display.spinner() {
            spans.push(Span::styled(
                format!("{glyph} "),
                Style::default().fg(theme::BUSY_AMBER),
            ));
        }
        spans.push(Span::styled(
            self.display.status.as_str(),
            theme::status_style(self.display.status_level),
        ));
        Paragraph::new(Line::from(spans))
    }

    fn help(&self) -> Paragraph<'_> {
        let key_style = if self.display.busy {
            Style::default().fg(theme::DIM_GRAY)
        } else {
            Style::default().fg(theme::INK_BLUE)
        };
        let spans: Vec<Span<'_>> = HELP
            .iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(*key, key_style),
                    Span::styled(format!(" {action}  "), Style::default().fg(theme::DIM_GRAY)),
                ]
            })
            .collect();
        Paragraph::new(Line::from(spans))
    }
}
