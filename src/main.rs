use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use taskers::{
    app::App,
    config::Config,
    logging,
    persistence::{self, DetachedPersistence, TaskPersistence},
    storage::FileStore,
    task_list::TaskList,
    ui,
};
use tracing::info;

fn open_persistence(config: &Config) -> (Box<dyn TaskPersistence>, String) {
    if config.no_persist {
        info!("persistence disabled by flag");
        return (
            Box::new(DetachedPersistence),
            "persistence disabled, changes are not saved".to_string(),
        );
    }
    let persistence = persistence::attach(FileStore::new(&config.store));
    let status = if persistence.is_attached() {
        format!("saving to {}", config.store.display())
    } else {
        "storage unavailable, changes are not saved".to_string()
    };
    (persistence, status)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    if let Err(err) = logging::init(&config.log_file) {
        eprintln!("logging disabled: {}", err);
    }

    let (persistence, status) = open_persistence(&config);
    let mut app = App::new(TaskList::new(persistence)).with_status(status);
    app.load();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("{:?}", err);
    }
    info!(count = app.list.len(), "exiting");
    Ok(())
}
