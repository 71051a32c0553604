//! Terminal lifecycle and the dashboard event loop.

pub mod app;
pub mod widgets;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use self::app::App;

pub type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// How long one pass of the event loop waits for input. Refreshes run on
/// their own interval inside [`App::maybe_refresh`].
const FRAME_BUDGET: Duration = Duration::from_millis(200);

pub fn init_terminal() -> io::Result<TuiTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

pub fn restore_terminal(terminal: &mut TuiTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()
}

/// Drive the dashboard until the user quits.
pub async fn run(terminal: &mut TuiTerminal, app: &mut App) -> Result<()> {
    while app.running {
        app.maybe_refresh().await;
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(FRAME_BUDGET)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}
