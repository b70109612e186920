//! Terminal input events

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// TUI Events
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press
    Key(KeyEvent),

    /// Terminal resize
    Resize(u16, u16),

    /// Ctrl-C
    Quit,
}

/// Reads crossterm events on a blocking thread and forwards them
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<TuiEvent>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedSender<TuiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }

    /// Start the reader; it stops once the handler is dropped
    pub fn start(tx: mpsc::UnboundedSender<TuiEvent>) {
        tokio::task::spawn_blocking(move || {
            while !tx.is_closed() {
                if !event::poll(POLL_INTERVAL).unwrap_or(false) {
                    continue;
                }
                let forwarded = match event::read() {
                    // Windows reports releases too
                    Ok(Event::Key(key)) if key.kind != KeyEventKind::Press => continue,
                    Ok(Event::Key(key))
                        if key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL) =>
                    {
                        let _ = tx.send(TuiEvent::Quit);
                        break;
                    }
                    Ok(Event::Key(key)) => TuiEvent::Key(key),
                    Ok(Event::Resize(w, h)) => TuiEvent::Resize(w, h),
                    _ => continue,
                };
                if tx.send(forwarded).is_err() {
                    break;
                }
            }
        });
    }

    /// Receive next event
    pub async fn next(&mut self) -> Option<TuiEvent> {
        self.rx.recv().await
    }
}
