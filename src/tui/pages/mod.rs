pub mod board;
pub mod home;
pub mod login;
pub mod profile;
pub mod thread;

use crate::api::ForumClient;
use crate::session::SessionStore;
use crate::tui::{
    events::{Event, Route},
    styles::Theme,
    Frame,
};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::debug;

/// Shared handles every page is built with
#[derive(Clone)]
pub struct PageContext {
    pub client: ForumClient,
    pub session: SessionStore,
    pub page_size: usize,
    events: mpsc::UnboundedSender<Event>,
}

impl PageContext {
    pub fn new(
        client: ForumClient,
        session: SessionStore,
        page_size: usize,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            client,
            session,
            page_size,
            events,
        }
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("Event loop has stopped, dropping page event");
        }
    }

    pub fn navigate(&self, route: Route) {
        self.send(Event::Navigate(route));
    }

    pub fn back(&self) {
        self.send(Event::Back);
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(Event::StatusMessage(message.into()));
    }
}

/// Base trait for all pages
#[async_trait]
pub trait Page: Send + Sync {
    /// Stable identifier, used in logs
    fn id(&self) -> &'static str;

    /// Title shown in the breadcrumb
    fn title(&self) -> String;

    /// Handle keyboard input. Returns whether the page consumed the key.
    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<bool>;

    /// Handle mouse input
    async fn handle_mouse_event(&mut self, event: MouseEvent) -> Result<bool> {
        let _ = event;
        Ok(false)
    }

    /// Handle periodic updates
    async fn tick(&mut self) -> Result<()> {
        Ok(())
    }

    /// Render the page
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Called once when the page is first pushed
    async fn on_enter(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when the page is on top again after the page above it closed
    async fn on_resume(&mut self) -> Result<()> {
        Ok(())
    }

    /// Get page-specific help text
    fn help_text(&self) -> Vec<(&'static str, &'static str)> {
        vec![]
    }
}

/// Build the page for a route
pub fn page_for(route: Route, ctx: PageContext) -> Box<dyn Page> {
    match route {
        Route::Home => Box::new(home::HomePage::new(ctx)),
        Route::Board(board) => Box::new(board::BoardPage::new(ctx, board)),
        Route::Thread(thread) => Box::new(thread::ThreadPage::new(ctx, thread)),
        Route::Profile => Box::new(profile::ProfilePage::new(ctx)),
        Route::Login => Box::new(login::LoginPage::new(ctx)),
    }
}

/// Stack of open pages. The bottom page is never popped.
pub struct PageManager {
    stack: Vec<Box<dyn Page>>,
}

impl PageManager {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Open a page on top of the current one
    pub async fn push(&mut self, mut page: Box<dyn Page>) -> Result<()> {
        debug!(page = page.id(), depth = self.stack.len() + 1, "opening page");
        page.on_enter().await?;
        self.stack.push(page);
        Ok(())
    }

    /// Close the current page. Returns false at the bottom of the stack.
    pub async fn pop(&mut self) -> Result<bool> {
        if self.stack.len() <= 1 {
            return Ok(false);
        }

        if let Some(page) = self.stack.pop() {
            debug!(page = page.id(), "closing page");
        }
        if let Some(current) = self.stack.last_mut() {
            current.on_resume().await?;
        }
        Ok(true)
    }

    pub fn current_page(&self) -> Option<&dyn Page> {
        self.stack.last().map(|page| page.as_ref())
    }

    pub fn current_page_mut(&mut self) -> Option<&mut (dyn Page + 'static)> {
        self.stack.last_mut().map(|page| page.as_mut())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Tick every open page so background lists keep receiving results
    pub async fn tick(&mut self) -> Result<()> {
        for page in self.stack.iter_mut() {
            page.tick().await?;
        }
        Ok(())
    }

    /// Page titles from the bottom of the stack up
    pub fn breadcrumb(&self) -> String {
        self.stack
            .iter()
            .map(|page| page.title())
            .collect::<Vec<_>>()
            .join(" › ")
    }
}

impl Default for PageManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct StubPage {
        id: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Page for StubPage {
        fn id(&self) -> &'static str {
            self.id
        }

        fn title(&self) -> String {
            self.id.to_string()
        }

        async fn handle_key_event(&mut self, _event: KeyEvent) -> Result<bool> {
            Ok(false)
        }

        async fn tick(&mut self) -> Result<()> {
            self.log.lock().unwrap().push(format!("tick {}", self.id));
            Ok(())
        }

        fn render(&mut self, _frame: &mut Frame, _area: Rect, _theme: &Theme) {}

        async fn on_enter(&mut self) -> Result<()> {
            self.log.lock().unwrap().push(format!("enter {}", self.id));
            Ok(())
        }

        async fn on_resume(&mut self) -> Result<()> {
            self.log.lock().unwrap().push(format!("resume {}", self.id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stack_navigation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stub = |id| Box::new(StubPage { id, log: Arc::clone(&log) });

        let mut pages = PageManager::new();
        pages.push(stub("boards")).await.unwrap();
        pages.push(stub("general")).await.unwrap();
        assert_eq!(pages.depth(), 2);
        assert_eq!(pages.breadcrumb(), "boards › general");
        assert_eq!(pages.current_page().map(|p| p.id()), Some("general"));

        pages.tick().await.unwrap();

        assert!(pages.pop().await.unwrap());
        assert!(!pages.pop().await.unwrap());
        assert_eq!(pages.depth(), 1);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "enter boards",
                "enter general",
                "tick boards",
                "tick general",
                "resume boards",
            ]
        );
    }
}
