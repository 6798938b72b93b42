use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use prompthub_service::BlockingHttpService;
use prompthub_tui::app::{App, AppSettings};
use prompthub_tui::clipboard::SystemClipboard;
use prompthub_tui::config::Config;
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// How often the loop wakes up without input to apply poll results.
const TICK: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // stdout belongs to the terminal UI, so logs go to a file.
    let log_path = config.log_path();
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    info!(api_url = %config.api_url, "starting prompthub");
    let service = BlockingHttpService::new(&config.api_url)
        .context("failed to create async runtime")?;

    run_tui(service, config.app_settings())
}

fn run_tui(service: BlockingHttpService, settings: AppSettings) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, service, settings);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    service: BlockingHttpService,
    settings: AppSettings,
) -> Result<()> {
    let mut app = App::new(service, settings, Box::new(SystemClipboard::new()));

    while !app.should_quit() {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Ctrl+C always quits
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        break;
                    }
                    app.handle_key(key);
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::FocusLost => app.focus_lost(),
                Event::FocusGained => app.focus_gained(),
                _ => {}
            }
        }
        app.tick();
    }

    info!("prompthub exiting");
    Ok(())
}
