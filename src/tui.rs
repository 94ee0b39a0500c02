use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::backend::{AskReply, BackendError};

// Drives the typing-indicator animation.
const TICK_INTERVAL: Duration = Duration::from_millis(300);

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Everything the run loop reacts to: terminal input, the animation tick,
/// and backend completions. Routing completions through the same channel
/// keeps all state mutation on the event loop task, in arrival order.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    UploadDone {
        result: Result<String, BackendError>,
    },
    AskDone {
        generation: u64,
        result: Result<AskReply, BackendError>,
    },
}

/// Owns the channel the run loop drains. A reader task folds crossterm
/// input and the tick interval into it; the [`Dispatcher`] feeds backend
/// completions through a cloned sender.
///
/// [`Dispatcher`]: crate::backend::Dispatcher
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let input_tx = tx.clone();
        tokio::spawn(async move {
            let mut stream = event::EventStream::new();
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                let app_event = tokio::select! {
                    _ = ticker.tick() => Some(AppEvent::Tick),
                    maybe = stream.next() => match maybe {
                        Some(Ok(evt)) => translate(evt),
                        Some(Err(_)) => None,
                        // Terminal input closed; the loop ends with us.
                        None => break,
                    },
                };
                if let Some(app_event) = app_event {
                    if input_tx.send(app_event).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx, tx }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// Handle for feeding completions back into the event loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }
}

fn translate(event: Event) -> Option<AppEvent> {
    match event {
        // Press only; release and repeat would double keystrokes on Windows.
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

/// Enter raw mode on stderr, leaving stdout free for shell redirection.
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Restore the terminal before the default panic output, so the message
/// lands on a usable screen.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
