use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Drives the "Analyzing..." animation
const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    Resize,
    Tick,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    reader: JoinHandle<()>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::with_stream(event::EventStream::new())
    }

    /// Read terminal events from `stream` until it ends or fails
    pub fn with_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Event>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        // Terminal input reader
        let tx_events = tx.clone();
        let reader = tokio::spawn(async move {
            tokio::pin!(stream);
            while let Some(evt) = stream.next().await {
                let app_event = match evt {
                    // Only key presses; releases and repeats are noise here
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Ok(Event::Mouse(mouse)) => Some(AppEvent::Mouse(mouse)),
                    Ok(Event::Paste(text)) => Some(AppEvent::Paste(text)),
                    Ok(Event::Resize(_, _)) => Some(AppEvent::Resize),
                    Ok(_) => None,
                    Err(e) => {
                        log::error!("Terminal event stream failed: {}", e);
                        break;
                    }
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_RATE);
            loop {
                interval.tick().await;
                if tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, reader }
    }

    /// Next queued event. Fails once the input reader has stopped, since
    /// ticks alone would leave the UI running deaf to the keyboard.
    pub async fn next(&mut self) -> Result<AppEvent> {
        tokio::select! {
            biased;
            Some(event) = self.rx.recv() => Ok(event),
            joined = &mut self.reader => match joined {
                Err(e) if e.is_panic() => bail!("Terminal input reader panicked"),
                Err(e) => bail!("Terminal input reader stopped: {}", e),
                Ok(()) => bail!("Terminal input stream closed"),
            },
        }
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(io::stderr());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableBracketedPaste, DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic.
///
/// Panics on runtime worker threads are caught by a join handle: the
/// session turns an analyst panic into the apology message, and
/// [`EventHandler::next`] turns an input reader panic into an error that
/// ends the event loop and restores the terminal. Those are only logged here.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if std::thread::current().name() != Some("main") {
            log::error!("Worker panicked: {}", panic_info);
            return;
        }
        let _ = restore();
        original_hook(panic_info);
    }));
}
