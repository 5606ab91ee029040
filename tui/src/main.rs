//! InkLens TUI Entry Point
//!
//! Launches the terminal UI for InkLens.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (Ollama on localhost:11434)
//! inklens
//!
//! # Another Ollama server and model
//! inklens --ollama-host gpu-box --model mistral
//!
//! # No model at all; rule-based transformations only
//! inklens --offline
//!
//! # Verbose logging (written to the data directory)
//! RUST_LOG=debug inklens
//! ```

use std::io::{self, IsTerminal};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inklens_core::{
    load_config, load_config_from_path, ClipboardChain, ConfigOverrides, FileStore, Orchestrator,
    ProviderFacade,
};
use inklens_tui::clipboard::{CommandClipboard, Osc52Clipboard};
use inklens_tui::App;

/// InkLens - summarize, refine and proofread pasted text
#[derive(Parser, Debug)]
#[command(name = "inklens")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "INKLENS_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ollama host
    #[arg(long, value_name = "HOST")]
    ollama_host: Option<String>,

    /// Ollama port
    #[arg(long, value_name = "PORT")]
    ollama_port: Option<u16>,

    /// Model for the prompt backend
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Skip Ollama and use the rule-based backend only
    #[arg(long)]
    offline: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new().with_offline(self.offline);
        if let Some(ref host) = self.ollama_host {
            overrides = overrides.with_host(host.clone());
        }
        if let Some(port) = self.ollama_port {
            overrides = overrides.with_port(port);
        }
        if let Some(ref model) = self.model {
            overrides = overrides.with_prompt_model(model.clone());
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate()?;

    let data_dir = config
        .storage_dir()
        .context("No data directory available; set INKLENS_STORAGE_DIR")?;
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    init_logging(&data_dir)?;

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: inklens requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means stdin or stdout is piped, or SSH ran without -t.");
        std::process::exit(1);
    }

    tracing::info!(
        source = %config.source(),
        data_dir = %data_dir.display(),
        "Starting InkLens"
    );

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (tx, mut rx) = mpsc::channel(100);
    let clipboard =
        ClipboardChain::new(CommandClipboard::detect()).with_fallback(Osc52Clipboard::stdout());
    let orchestrator = Orchestrator::new(
        ProviderFacade::from_config(&config),
        Arc::new(FileStore::new(data_dir)),
        clipboard,
        tx,
    )
    .with_autosave_delay(config.autosave_debounce)
    .with_summary_context(config.summary_context.clone());

    // Run the app
    let mut app = App::new(orchestrator.backend_names());
    let result = app.run(&mut terminal, &orchestrator, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "InkLens exited with an error");
    }
    result
}

/// Log to `inklens.log` in the data directory; the terminal belongs to the UI
fn init_logging(dir: &Path) -> anyhow::Result<()> {
    let log_path = dir.join("inklens.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("inklens=info,inklens_tui=info,inklens_core=info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}
