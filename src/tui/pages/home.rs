use super::{Page, PageContext};
use crate::api::{ApiResult, Board, BoardList, Envelope};
use crate::tui::{
    events::Route,
    styles::Theme,
    tasks::{take_finished, Pending},
    Frame,
};
use crate::utils::text::{format, string};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::{info, warn};

/// Board index
pub struct HomePage {
    ctx: PageContext,
    boards: Vec<Board>,
    list_state: ListState,
    loading: Option<Pending<Envelope<BoardList>>>,
    logging_out: Option<Pending<()>>,
    error: Option<String>,
}

impl HomePage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            boards: Vec::new(),
            list_state: ListState::default(),
            loading: None,
            logging_out: None,
            error: None,
        }
    }

    fn load(&mut self) {
        let client = self.ctx.client.clone();
        self.error = None;
        self.loading = Some(Pending::spawn(async move { client.list_boards().await }));
    }

    fn apply_boards(&mut self, result: ApiResult<Envelope<BoardList>>) {
        match result {
            Ok(envelope) => {
                if let Some(user) = envelope.session_user {
                    self.ctx.session.set_current_user(user);
                }
                self.boards = envelope.result.boards;
                self.list_state
                    .select(if self.boards.is_empty() { None } else { Some(0) });
            }
            Err(e) => {
                warn!("Failed to load boards: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn selected_board(&self) -> Option<&Board> {
        self.list_state.selected().and_then(|i| self.boards.get(i))
    }

    fn move_selection(&mut self, down: bool) {
        if self.boards.is_empty() {
            return;
        }
        let last = self.boards.len() - 1;
        let next = match self.list_state.selected() {
            Some(i) if down => (i + 1).min(last),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    fn toggle_login(&mut self) {
        if !self.ctx.session.is_logged_in() {
            self.ctx.navigate(Route::Login);
            return;
        }
        if self.logging_out.is_some() {
            return;
        }
        let client = self.ctx.client.clone();
        self.logging_out = Some(Pending::spawn(async move { client.logout().await }));
    }

    fn board_item(board: &Board, theme: &Theme) -> ListItem<'static> {
        let mut lines = vec![Line::from(Span::styled(board.name.clone(), theme.title_style()))];

        let mut details = Vec::new();
        if let Some(count) = board.thread_count {
            details.push(format::count(count, "thread", "threads"));
        }
        if let Some(description) = board.description.as_deref().filter(|d| !d.is_empty()) {
            details.push(string::truncate(&string::normalize_whitespace(description), 100));
        }
        if !details.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  {}", details.join(" · ")),
                theme.dim_style(),
            )));
        }

        ListItem::new(Text::from(lines))
    }
}

#[async_trait]
impl Page for HomePage {
    fn id(&self) -> &'static str {
        "home"
    }

    fn title(&self) -> String {
        "Boards".to_string()
    }

    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<bool> {
        match event.code {
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Enter => {
                if let Some(board) = self.selected_board().cloned() {
                    self.ctx.navigate(Route::Board(board));
                }
            }
            KeyCode::Char('r') => self.load(),
            KeyCode::Char('p') => {
                let route = if self.ctx.session.is_logged_in() {
                    Route::Profile
                } else {
                    Route::Login
                };
                self.ctx.navigate(route);
            }
            KeyCode::Char('L') => self.toggle_login(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn handle_mouse_event(&mut self, event: MouseEvent) -> Result<bool> {
        match event.kind {
            MouseEventKind::ScrollDown => self.move_selection(true),
            MouseEventKind::ScrollUp => self.move_selection(false),
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn tick(&mut self) -> Result<()> {
        if let Some(result) = take_finished(&mut self.loading) {
            self.apply_boards(result);
        }

        if let Some(result) = take_finished(&mut self.logging_out) {
            match result {
                Ok(()) => {
                    info!("Logged out");
                    self.ctx.session.clear();
                    self.ctx.status("Logged out");
                }
                Err(e) => self.ctx.status(format!("Logout failed: {}", e)),
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Boards")
            .border_style(theme.border_style());

        if self.boards.is_empty() {
            let message = if let Some(error) = &self.error {
                Line::from(Span::styled(
                    format!("Could not load boards: {} (r to retry)", error),
                    theme.error_style(),
                ))
            } else if self.loading.is_some() {
                Line::from(Span::styled("Loading…", theme.placeholder_style()))
            } else {
                Line::from(Span::styled("No boards yet", theme.placeholder_style()))
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        }

        let items: Vec<ListItem> = self
            .boards
            .iter()
            .map(|board| Self::board_item(board, theme))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(theme.selection_style());
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    async fn on_enter(&mut self) -> Result<()> {
        self.load();
        Ok(())
    }

    fn help_text(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("↑/k ↓/j", "Move selection"),
            ("Enter", "Open board"),
            ("r", "Reload boards"),
            ("p", "Profile"),
            ("L", "Log in / log out"),
        ]
    }
}
