use clap::Parser;
use crossterm::{
    event::{self, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::{error::Error, io, time::Duration};

mod actions;
mod app;
mod backup;
mod board;
mod cli;
mod clipboard;
mod config;
mod editor;
mod input;
mod logging;
mod markdown;
mod models;
mod runtime;
mod storage;
mod sync;
mod ui;

use app::App;
use config::Config;

fn main() -> Result<(), Box<dyn Error>> {
    let args = cli::Cli::parse();
    let config = Config::load();

    let logger = match logging::init_logging(&config.log.level, &config.log.dir) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("weekplan: logging disabled: {err}");
            None
        }
    };

    if let Some(command) = args.command {
        if let Err(err) = cli::run(command, &config) {
            log::error!("event=cli status=error error={err}");
            eprintln!("weekplan: {err}");
            drop(logger);
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut app = App::new(config);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Keyboard enhancement flags may fail on unsupported terminals (e.g., Windows Legacy Console).
    let _ = execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    );

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("event=app_exit status=error error={err}");
        eprintln!("{err:?}");
    }
    log::info!("event=app_exit status=ok");
    drop(logger);

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        runtime::tick(app);

        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            input::handle_event(app, event::read()?);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
