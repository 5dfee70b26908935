use crate::api::ForumClient;
use crate::config::Config;
use crate::session::SessionStore;
use crate::tui::{
    events::{Event, Route},
    keys::KeyMap,
    pages::{page_for, PageContext, PageManager},
    styles::Theme,
    utils::layout,
    Frame,
};
use crate::version;
use anyhow::Result;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Status messages disappear after this long
const STATUS_TTL: Duration = Duration::from_secs(5);

/// Main application state and controller
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Key mappings for the application
    pub key_map: KeyMap,

    /// Stack of open pages
    pub page_manager: PageManager,

    /// Current theme for styling
    pub theme: Theme,

    /// Status message to display, with the time it was set
    pub status_message: Option<(String, Instant)>,

    pub show_help: bool,
    pub mouse_enabled: bool,

    ctx: PageContext,
}

impl App {
    /// Create a new application instance
    pub fn new(
        config: &Config,
        client: ForumClient,
        session: SessionStore,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            should_quit: false,
            key_map: KeyMap::default(),
            page_manager: PageManager::new(),
            theme: Theme::default(),
            status_message: None,
            show_help: false,
            mouse_enabled: config.mouse_enabled,
            ctx: PageContext::new(client, session, config.page_size, events),
        }
    }

    /// Open the board index and look up the existing session
    pub async fn start(&mut self) -> Result<()> {
        let client = self.ctx.client.clone();
        let session = self.ctx.session.clone();
        tokio::spawn(async move {
            match client.session_user().await {
                Ok(Some(user)) => {
                    info!(user_id = user.id, "Resumed session");
                    session.set_current_user(user);
                }
                Ok(None) => debug!("No active session"),
                Err(e) => debug!("Session lookup failed: {}", e),
            }
        });

        self.page_manager
            .push(page_for(Route::Home, self.ctx.clone()))
            .await
    }

    /// Handle incoming events. Returns true when the application should exit.
    pub async fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key_event) => {
                if self.key_map.should_quit(&key_event) {
                    self.should_quit = true;
                    return Ok(true);
                }

                if self.key_map.should_show_help(&key_event) {
                    self.show_help = !self.show_help;
                    return Ok(false);
                }

                if self.show_help && self.key_map.should_go_back(&key_event) {
                    self.show_help = false;
                    return Ok(false);
                }

                let consumed = match self.page_manager.current_page_mut() {
                    Some(page) => page.handle_key_event(key_event).await?,
                    None => false,
                };

                if !consumed && self.key_map.should_go_back(&key_event) {
                    self.page_manager.pop().await?;
                }
            }

            Event::Mouse(mouse_event) => {
                if self.mouse_enabled {
                    if let Some(page) = self.page_manager.current_page_mut() {
                        page.handle_mouse_event(mouse_event).await?;
                    }
                }
            }

            // Layout is recomputed from the frame size on every draw
            Event::Resize(_, _) => {}

            Event::Tick => {
                self.page_manager.tick().await?;
                if let Some((_, set_at)) = &self.status_message {
                    if set_at.elapsed() >= STATUS_TTL {
                        self.status_message = None;
                    }
                }
            }

            Event::Navigate(route) => {
                self.page_manager
                    .push(page_for(route, self.ctx.clone()))
                    .await?;
            }

            Event::Back => {
                self.page_manager.pop().await?;
            }

            Event::StatusMessage(message) => {
                self.status_message = Some((message, Instant::now()));
            }

            Event::ClearStatus => {
                self.status_message = None;
            }
        }

        Ok(self.should_quit)
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Breadcrumb
                Constraint::Min(1),    // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(frame.size());

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" forumterm ", self.theme.user_style()),
                Span::styled(format!(" {}", self.page_manager.breadcrumb()), self.theme.dim_style()),
            ])),
            chunks[0],
        );

        if let Some(page) = self.page_manager.current_page_mut() {
            page.render(frame, chunks[1], &self.theme);
        }

        self.render_status_bar(frame, chunks[2]);

        if self.show_help {
            self.render_help_overlay(frame);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let user = match self.ctx.session.current_user() {
            Some(user) => Span::styled(format!(" {} ", user.label()), self.theme.user_style()),
            None => Span::styled(" not logged in ", self.theme.status_bar_style()),
        };

        let message = match &self.status_message {
            Some((message, _)) => message.clone(),
            None => "Ctrl+G help | Esc back | Ctrl+C quit".to_string(),
        };

        let status = Line::from(vec![
            user,
            Span::styled(format!(" {}", message), self.theme.status_bar_style()),
        ]);
        frame.render_widget(
            Paragraph::new(status).style(self.theme.status_bar_style()),
            area,
        );
    }

    fn help_lines(&self) -> Vec<Line<'static>> {
        let mut entries = self.key_map.help_entries();
        if let Some(page) = self.page_manager.current_page() {
            entries.extend(page.help_text());
        }

        let mut lines: Vec<Line<'static>> = entries
            .into_iter()
            .map(|(key, description)| {
                Line::from(vec![
                    Span::styled(format!("{:>10}  ", key), self.theme.navigation_style()),
                    Span::styled(description, self.theme.text_style()),
                ])
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            version::full_version(),
            self.theme.dim_style(),
        )));
        lines
    }

    fn render_help_overlay(&self, frame: &mut Frame) {
        let lines = self.help_lines();
        let help_area = layout::centered_rect(56, lines.len() as u16 + 2, frame.size());

        let help_block = Block::default()
            .borders(Borders::ALL)
            .title("Help")
            .border_style(self.theme.focused_border_style())
            .style(self.theme.help_style());

        frame.render_widget(Clear, help_area);
        frame.render_widget(Paragraph::new(lines).block(help_block), help_area);
    }
}
