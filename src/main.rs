use std::io;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod ai;
mod app;
mod citation;
mod config;
mod db;
mod error;
mod models;
mod nav;
mod services;
#[cfg(test)]
mod test_support;
mod tui;

use app::App;
use citation::CitationStyle;
use config::Config;
use db::Repository;
use tui::{draw, handle_key_event, handle_mouse_event, AppAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Check for --list flag (headless topic listing)
    if args.len() >= 2 && args[1] == "--list" {
        let repository = Repository::new(&config.db_path)
            .await
            .context("failed to open storage")?;
        for row in repository.topic_rows().await? {
            println!(
                "{}\tCreated {}\t{} summaries",
                row.topic.name,
                row.topic.created_label(),
                row.summary_count
            );
        }
        return Ok(());
    }

    // Check for --citations flag (headless citation export)
    if args.len() >= 3 && args[1] == "--citations" {
        let style = match args.get(3) {
            Some(name) => CitationStyle::parse(name)
                .with_context(|| format!("unknown citation style {name:?}"))?,
            None => CitationStyle::Apa,
        };
        let repository = Repository::new(&config.db_path)
            .await
            .context("failed to open storage")?;
        let topic = repository
            .find_topic_by_name(&args[2])
            .await?
            .with_context(|| format!("no topic named {:?}", args[2]))?;
        let sources = repository.list_sources(&topic.id).await?;
        let today = chrono::Local::now().date_naive();
        println!("{}", citation::render(style, &sources, today));
        return Ok(());
    }

    // Initialize app
    let mut app = App::new(&config).await.context("failed to start")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Expire notifications
        app.tick();

        // Poll for completed summarize/suggest requests
        app.poll_process_result().await;

        // Poll for events with timeout to allow async operations
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                handle_key_event(key, app.input_context())
            }
            Event::Mouse(mouse) => {
                let size = terminal.size()?;
                let screen = Rect::new(0, 0, size.width, size.height);
                let open = app.nav.modals.topmost().filter(|_| {
                    app.prompt.is_none() && app.confirm.is_none() && !app.show_help
                });
                handle_mouse_event(mouse, screen, open)
            }
            Event::Paste(text) => Some(AppAction::Paste(text)),
            _ => None,
        };

        if let Some(action) = action {
            if app.dispatch(action).await {
                return Ok(());
            }
        }
    }
}
