pub mod app;
pub mod ui;

use std::sync::mpsc::{self, Receiver, Sender};
use std::{error::Error, io, thread};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{debug, error};

use app::App;
use ui::ui;

/// Everything the event loop reacts to.
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
}

pub fn run_tui(mut app: App) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    spawn_input_reader(tx.clone());
    app.attach_events(tx);

    // Run loop
    let res = run_app(&mut terminal, &mut app, &rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "dashboard loop failed");
        println!("{:?}", err)
    }

    Ok(())
}

fn spawn_input_reader(tx: Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "input reader stopped");
                break;
            }
        }
    });
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &Receiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match events.recv() {
            Ok(AppEvent::Key(key)) => {
                if app.handle_key(key) {
                    return Ok(());
                }
            }
            Ok(AppEvent::Tick) => app.on_tick(),
            Err(_) => return Ok(()),
        }
    }
}
