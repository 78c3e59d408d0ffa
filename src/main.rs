mod app;
mod chart;
mod config;
mod error;
mod history;
mod orchestrator;
mod types;
mod ui;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::config::{Config, TUI_TICK_MS};
use crate::history::fetch::ClobHistoryClient;
use crate::orchestrator::{ChartOrchestrator, ChartPhase};
use crate::types::{SeriesRequest, TimeWindow};

#[tokio::main]
async fn main() -> io::Result<()> {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    // Log to stderr so the alternate screen stays clean; redirect 2> to capture.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(io::stderr)
        .init();

    let client = match ClobHistoryClient::new(cfg.clob_api_url.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("HTTP client error: {e}");
            std::process::exit(1);
        }
    };

    let requests: Vec<SeriesRequest> = cfg
        .markets
        .iter()
        .map(|(token_id, label)| SeriesRequest {
            token_id: token_id.clone(),
            label: label.clone(),
        })
        .collect();

    let mut orchestrator = ChartOrchestrator::new(client);
    let rx = orchestrator.subscribe();
    let mut app = AppState::new(requests.clone(), cfg.start_ts);
    orchestrator.request(requests, cfg.start_ts);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &mut orchestrator, rx).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    orchestrator: &mut ChartOrchestrator<ClobHistoryClient>,
    mut rx: watch::Receiver<ChartPhase>,
) -> io::Result<()> {
    loop {
        if rx.has_changed().unwrap_or(false) {
            let phase = rx.borrow_and_update().clone();
            app.apply_phase(phase);
        }

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(TUI_TICK_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        orchestrator.request(app.requests.clone(), app.start_ts);
                    }
                    KeyCode::Char('d') => {
                        app.select_window(TimeWindow::OneDay);
                    }
                    KeyCode::Char('w') => {
                        app.select_window(TimeWindow::OneWeek);
                    }
                    KeyCode::Char('m') => {
                        app.select_window(TimeWindow::OneMonth);
                    }
                    KeyCode::Char('a') => {
                        app.select_window(TimeWindow::All);
                    }
                    KeyCode::Tab => app.cycle_active(),
                    KeyCode::Left => app.move_cursor(-1),
                    KeyCode::Right => app.move_cursor(1),
                    KeyCode::Esc => app.clear_cursor(),
                    _ => {}
                }
            }
        }
    }
}
