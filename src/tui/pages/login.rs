use super::{Page, PageContext};
use crate::api::{ApiError, Credentials, User};
use crate::tui::{
    components::form::InputField,
    styles::Theme,
    tasks::{take_finished, Pending},
    utils::layout,
    Frame,
};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tracing::info;

pub struct LoginPage {
    ctx: PageContext,
    username: InputField,
    password: InputField,
    password_focused: bool,
    submitting: Option<Pending<User>>,
    error: Option<String>,
}

impl LoginPage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            username: InputField::new("Username"),
            password: InputField::new("Password").masked(),
            password_focused: false,
            submitting: None,
            error: None,
        }
    }

    fn submit(&mut self) {
        let credentials = Credentials {
            username: self.username.value().trim().to_string(),
            password: self.password.value().to_string(),
        };
        if credentials.username.is_empty() || credentials.password.is_empty() {
            self.error = Some("Enter a username and password".to_string());
            return;
        }

        self.error = None;
        let client = self.ctx.client.clone();
        self.submitting = Some(Pending::spawn(async move { client.login(&credentials).await }));
    }

    fn finish_login(&mut self, result: Result<User, ApiError>) {
        match result {
            Ok(user) => {
                info!(user_id = user.id, "Logged in");
                self.ctx.status(format!("Logged in as {}", user.label()));
                self.ctx.session.set_current_user(user);
                self.ctx.back();
            }
            Err(e) => {
                self.password.clear();
                self.error = Some(if e.is_unauthorized() {
                    "Invalid username or password".to_string()
                } else {
                    e.to_string()
                });
            }
        }
    }
}

#[async_trait]
impl Page for LoginPage {
    fn id(&self) -> &'static str {
        "login"
    }

    fn title(&self) -> String {
        "Log in".to_string()
    }

    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<bool> {
        if self.submitting.is_some() {
            return Ok(event.code != KeyCode::Esc);
        }

        match event.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.password_focused = !self.password_focused;
            }
            KeyCode::Enter if !self.password_focused => self.password_focused = true,
            KeyCode::Enter => self.submit(),
            _ => {
                let field = if self.password_focused {
                    &mut self.password
                } else {
                    &mut self.username
                };
                return Ok(field.handle_key_event(&event));
            }
        }
        Ok(true)
    }

    async fn tick(&mut self) -> Result<()> {
        if let Some(result) = take_finished(&mut self.submitting) {
            self.finish_login(result);
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let form_area = layout::centered_rect(50, 11, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Log in")
            .border_style(theme.focused_border_style());
        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        self.username
            .render(frame, chunks[0], theme, !self.password_focused);
        self.password
            .render(frame, chunks[1], theme, self.password_focused);

        let footer = if self.submitting.is_some() {
            Line::from(Span::styled("Logging in…", theme.dim_style()))
        } else if let Some(error) = &self.error {
            Line::from(Span::styled(error.clone(), theme.error_style()))
        } else {
            Line::from(Span::styled("Enter submit  Tab switch  Esc back", theme.dim_style()))
        };
        frame.render_widget(Paragraph::new(footer), chunks[2]);
    }

    fn help_text(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Tab", "Switch field"), ("Enter", "Log in")]
    }
}
