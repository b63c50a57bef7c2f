mod tui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use groovebox::GrooveBox;
use groovebox::pipeline::config;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// the terminal is in raw mode, so logs go to <project>/.groovebox/groovebox.log
fn init_logging(project_dir: &Path) -> anyhow::Result<()> {
    let path = config::log_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("GROOVEBOX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("no current directory")?,
    };
    init_logging(&project_dir)?;

    let cfg = config::load_config(&project_dir)?;
    let mut gb = GrooveBox::new(&cfg).context("invalid groovebox config")?;
    info!(dir = %project_dir.display(), tempo = cfg.tempo, "groovebox ready");

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_rate = Duration::from_millis(16); // ~60fps
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &gb, &tui_state);
        })?;

        let events = tui::input::poll_input(frame_rate)?;
        for event in events {
            if !tui_state.apply(&mut gb, event) {
                // save before quitting
                if let Err(e) = config::save_config(&project_dir, &gb.config()) {
                    warn!("could not save config: {e:#}");
                }
                gb.shutdown()?;
                term.clear()?;
                return Ok(());
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
