//! Terminal Clipboards
//!
//! Two implementations of the core `Clipboard` trait:
//!
//! - [`CommandClipboard`] pipes text into the platform's clipboard helper
//!   (`wl-copy`, `xclip`, `xsel`, `pbcopy`, `clip.exe`), trying each
//!   installed one in turn.
//! - [`Osc52Clipboard`] writes an OSC 52 escape sequence to the terminal,
//!   which most modern terminals (and tmux with `set-clipboard on`) turn
//!   into a clipboard write. Works over SSH; used as the fallback.

use std::io::{self, Write};
use std::process::Stdio;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use inklens_core::{Clipboard, ClipboardError};

/// One clipboard helper program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipboardCommand {
    /// Program name
    pub program: &'static str,
    /// Arguments selecting the clipboard
    pub args: &'static [&'static str],
}

const WL_COPY: ClipboardCommand = ClipboardCommand {
    program: "wl-copy",
    args: &[],
};
const XCLIP: ClipboardCommand = ClipboardCommand {
    program: "xclip",
    args: &["-selection", "clipboard"],
};
const XSEL: ClipboardCommand = ClipboardCommand {
    program: "xsel",
    args: &["--clipboard", "--input"],
};
const PBCOPY: ClipboardCommand = ClipboardCommand {
    program: "pbcopy",
    args: &[],
};
const CLIP_EXE: ClipboardCommand = ClipboardCommand {
    program: "clip.exe",
    args: &[],
};

/// Clipboard backed by helper programs
#[derive(Clone, Debug)]
pub struct CommandClipboard {
    candidates: Vec<ClipboardCommand>,
}

impl CommandClipboard {
    /// Candidates for the current platform, most specific first
    #[must_use]
    pub fn detect() -> Self {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();
        Self::new(platform_candidates(std::env::consts::OS, wayland))
    }

    /// Use an explicit candidate list
    #[must_use]
    pub fn new(candidates: Vec<ClipboardCommand>) -> Self {
        Self { candidates }
    }

    /// Candidate programs in try order
    #[must_use]
    pub fn candidates(&self) -> &[ClipboardCommand] {
        &self.candidates
    }
}

/// Helper programs worth trying on `os`
#[must_use]
pub fn platform_candidates(os: &str, wayland: bool) -> Vec<ClipboardCommand> {
    match os {
        "macos" => vec![PBCOPY],
        "windows" => vec![CLIP_EXE],
        _ => {
            let mut candidates = Vec::with_capacity(4);
            if wayland {
                candidates.push(WL_COPY);
            }
            // clip.exe covers WSL.
            candidates.extend([XCLIP, XSEL, CLIP_EXE]);
            candidates
        }
    }
}

async fn run_command(command: ClipboardCommand, text: &str) -> Result<(), ClipboardError> {
    // Helpers like wl-copy fork a daemon that keeps inherited pipes open, so
    // only stdin is piped.
    let mut child = Command::new(command.program)
        .args(command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
        stdin.shutdown().await?;
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(ClipboardError::Command {
            command: command.program.to_string(),
            message: status.to_string(),
        })
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    fn name(&self) -> &str {
        "system"
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut last_error = None;
        for &command in &self.candidates {
            match run_command(command, text).await {
                Ok(()) => {
                    tracing::debug!(command = command.program, "Copied via helper");
                    return Ok(());
                }
                Err(ClipboardError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::debug!(command = command.program, error = %e, "Clipboard helper failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(ClipboardError::NoClipboard))
    }
}

/// Clipboard that asks the terminal to copy via OSC 52
pub struct Osc52Clipboard {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Osc52Clipboard {
    /// Write sequences to stdout
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Write sequences to `sink`
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

/// The OSC 52 "set clipboard" sequence for `text`
#[must_use]
pub fn osc52_sequence(text: &str) -> String {
    let encoded = BASE64.encode(text.as_bytes());
    if std::env::var_os("TMUX").is_some() {
        // tmux passthrough
        format!("\x1bPtmux;\x1b\x1b]52;c;{encoded}\x07\x1b\\")
    } else {
        format!("\x1b]52;c;{encoded}\x07")
    }
}

#[async_trait]
impl Clipboard for Osc52Clipboard {
    fn name(&self) -> &str {
        "osc52"
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let sequence = osc52_sequence(text);
        let mut sink = self.sink.lock();
        sink.write_all(sequence.as_bytes())?;
        sink.flush()?;
        Ok(())
    }
}
