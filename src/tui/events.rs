use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{Board, Thread};

/// Screens the application can navigate to
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Board index
    Home,
    /// Threads of one board
    Board(Board),
    /// Posts of one thread
    Thread(Thread),
    /// Current user's profile
    Profile,
    Login,
}

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Mouse input event
    Mouse(MouseEvent),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,

    /// Push a page
    Navigate(Route),

    /// Pop the current page
    Back,

    /// Status message event
    StatusMessage(String),

    /// Clear status message event
    ClearStatus,
}

/// Event handler for managing input events
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create an event handler that reads terminal input on a blocking task
    /// and emits a tick whenever `tick_rate` passes without input
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        let input_sender = sender.clone();
        tokio::task::spawn_blocking(move || loop {
            let event = match crossterm::event::poll(tick_rate) {
                Ok(true) => match crossterm::event::read() {
                    Ok(event) => match convert_crossterm_event(event) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(e) => {
                        warn!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => Event::Tick,
                Err(e) => {
                    warn!("Failed to poll terminal events: {}", e);
                    break;
                }
            };

            if input_sender.send(event).is_err() {
                debug!("Event receiver dropped, stopping input reader");
                break;
            }
        });

        Self { receiver, sender }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

/// Convert crossterm events to application events. Key releases and focus
/// or paste events are dropped.
fn convert_crossterm_event(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            Some(Event::Key(key_event))
        }
        CrosstermEvent::Mouse(mouse_event) => Some(Event::Mouse(mouse_event)),
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn test_key_release_is_dropped() {
        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(convert_crossterm_event(CrosstermEvent::Key(release)).is_none());

        let press = KeyEvent::from(KeyCode::Char('a'));
        assert!(matches!(
            convert_crossterm_event(CrosstermEvent::Key(press)),
            Some(Event::Key(_))
        ));
        assert!(matches!(
            convert_crossterm_event(CrosstermEvent::Resize(80, 24)),
            Some(Event::Resize(80, 24))
        ));
        assert!(convert_crossterm_event(CrosstermEvent::FocusLost).is_none());
    }
}
