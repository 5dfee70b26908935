//! Text inputs and client-side validation for the composer, login and
//! profile forms.

use std::sync::OnceLock;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use regex::Regex;
use thiserror::Error;

use crate::api::{NewPost, NewThread, ProfileField};
use crate::tui::{styles::Theme, utils::layout, Frame};

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 20_000;
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 500;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Input rejected before it reaches the server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
}

fn check_length(
    field: &'static str,
    value: &str,
    required: bool,
    max: usize,
) -> Result<(), ValidationError> {
    if required && value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

pub fn validate_new_thread(thread: &NewThread) -> Result<(), ValidationError> {
    check_length("Title", &thread.title, true, TITLE_MAX_CHARS)?;
    check_length("Body", &thread.body, true, BODY_MAX_CHARS)
}

pub fn validate_new_post(post: &NewPost) -> Result<(), ValidationError> {
    check_length("Body", &post.body, true, BODY_MAX_CHARS)
}

/// Validate one profile field. Email and bio may be cleared.
pub fn validate_profile_field(field: ProfileField, value: &str) -> Result<(), ValidationError> {
    match field {
        ProfileField::DisplayName => {
            check_length(field.label(), value, true, DISPLAY_NAME_MAX_CHARS)
        }
        ProfileField::Email => {
            if value.is_empty() || is_valid_email(value) {
                Ok(())
            } else {
                Err(ValidationError::InvalidEmail(value.to_string()))
            }
        }
        ProfileField::Bio => check_length(field.label(), value, false, BIO_MAX_CHARS),
    }
}

pub fn is_valid_email(value: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Editable text with a character cursor
#[derive(Debug, Clone, Default)]
pub struct InputField {
    label: String,
    placeholder: String,
    value: String,
    /// Cursor position in chars
    cursor: usize,
    masked: bool,
    multiline: bool,
}

impl InputField {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Hide the value behind bullets
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    /// Enter inserts a newline instead of being left to the owner
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Editing keys. Returns whether the key was consumed.
    pub fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }

        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Enter if self.multiline => self.insert_char('\n'),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.char_count() {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_count(),
            _ => return false,
        }
        true
    }

    /// Value as lines with the cursor cell highlighted when focused
    pub fn display_lines(&self, focused: bool, theme: &Theme) -> Vec<Line<'static>> {
        if self.value.is_empty() && !focused {
            return vec![Line::from(Span::styled(
                self.placeholder.clone(),
                theme.placeholder_style(),
            ))];
        }

        let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
        let text: String = if self.masked {
            "•".repeat(self.char_count())
        } else {
            self.value.clone()
        };

        let mut lines = Vec::new();
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();

        for (index, c) in text.chars().enumerate() {
            let at_cursor = focused && index == self.cursor;
            if at_cursor || c == '\n' {
                if !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), theme.text_style()));
                }
            }
            if at_cursor {
                let shown = if c == '\n' { " ".to_string() } else { c.to_string() };
                spans.push(Span::styled(shown, cursor_style));
            }
            if c == '\n' {
                lines.push(Line::from(std::mem::take(&mut spans)));
            } else if !at_cursor {
                run.push(c);
            }
        }

        if !run.is_empty() {
            spans.push(Span::styled(run, theme.text_style()));
        }
        if focused && self.cursor >= self.char_count() {
            spans.push(Span::styled(" ", cursor_style));
        }
        lines.push(Line::from(spans));
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme, focused: bool) {
        let border_style = if focused {
            theme.focused_border_style()
        } else {
            theme.border_style()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.label.clone())
            .border_style(border_style);

        let paragraph = Paragraph::new(self.display_lines(focused, theme))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}

/// What the composer is writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerKind {
    NewThread,
    Reply,
}

/// Validated content ready to send
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    NewThread(NewThread),
    Reply(NewPost),
}

/// Outcome of a key press in the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerAction {
    None,
    Submit,
    Cancel,
}

/// Modal form for a new thread or a reply.
///
/// Tab cycles fields, Ctrl+S submits, Esc cancels.
#[derive(Debug, Clone)]
pub struct ComposerForm {
    kind: ComposerKind,
    title: InputField,
    body: InputField,
    title_focused: bool,
    error: Option<String>,
    submitting: bool,
}

impl ComposerForm {
    pub fn new(kind: ComposerKind) -> Self {
        Self {
            kind,
            title: InputField::new("Title").with_placeholder("Thread title"),
            body: InputField::new("Body")
                .with_placeholder("Write something")
                .multiline(),
            title_focused: kind == ComposerKind::NewThread,
            error: None,
            submitting: false,
        }
    }

    pub fn kind(&self) -> ComposerKind {
        self.kind
    }

    pub fn title_field_mut(&mut self) -> &mut InputField {
        &mut self.title
    }

    pub fn body_field_mut(&mut self) -> &mut InputField {
        &mut self.body
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Server-side failure shown inside the form
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.submitting = false;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn handle_key_event(&mut self, key: &KeyEvent) -> ComposerAction {
        if self.submitting {
            return ComposerAction::None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return ComposerAction::Cancel,
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => return ComposerAction::Submit,
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => {
                if self.kind == ComposerKind::NewThread {
                    self.title_focused = !self.title_focused;
                }
                return ComposerAction::None;
            }
            _ => {}
        }

        if self.title_focused {
            self.title.handle_key_event(key);
        } else {
            self.body.handle_key_event(key);
        }
        ComposerAction::None
    }

    /// Validate the fields. On success the form is marked as submitting until
    /// [`ComposerForm::set_error`] is called or the form is closed.
    pub fn submit(&mut self) -> Result<Submission, ValidationError> {
        let submission = match self.kind {
            ComposerKind::NewThread => {
                let thread = NewThread {
                    title: self.title.value().trim().to_string(),
                    body: self.body.value().to_string(),
                };
                validate_new_thread(&thread)?;
                Submission::NewThread(thread)
            }
            ComposerKind::Reply => {
                let post = NewPost {
                    body: self.body.value().to_string(),
                };
                validate_new_post(&post)?;
                Submission::Reply(post)
            }
        };

        self.error = None;
        self.submitting = true;
        Ok(submission)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup = layout::centered_rect(area.width.saturating_sub(8).max(20), 18, area);
        frame.render_widget(Clear, popup);

        let heading = match self.kind {
            ComposerKind::NewThread => "New thread",
            ComposerKind::Reply => "Reply",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(heading)
            .border_style(theme.focused_border_style());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let title_height = if self.kind == ComposerKind::NewThread { 3 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(title_height),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);

        if self.kind == ComposerKind::NewThread {
            self.title.render(frame, chunks[0], theme, self.title_focused);
        }
        self.body.render(frame, chunks[1], theme, !self.title_focused);

        let footer = if self.submitting {
            Line::from(Span::styled("Sending…", theme.dim_style()))
        } else if let Some(error) = &self.error {
            Line::from(Span::styled(error.clone(), theme.error_style()))
        } else {
            Line::from(Span::styled(
                "Ctrl+S send  Tab switch field  Esc cancel",
                theme.dim_style(),
            ))
        };
        frame.render_widget(Paragraph::new(footer), chunks[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(field: &mut InputField, text: &str) {
        for c in text.chars() {
            field.handle_key_event(&KeyEvent::from(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_input_editing() {
        let mut field = InputField::new("Name");
        type_text(&mut field, "héllo");
        assert_eq!(field.value(), "héllo");
        assert_eq!(field.cursor(), 5);

        field.handle_key_event(&KeyEvent::from(KeyCode::Left));
        field.handle_key_event(&KeyEvent::from(KeyCode::Left));
        field.handle_key_event(&KeyEvent::from(KeyCode::Backspace));
        assert_eq!(field.value(), "hélo");

        field.handle_key_event(&KeyEvent::from(KeyCode::Home));
        field.handle_key_event(&KeyEvent::from(KeyCode::Delete));
        assert_eq!(field.value(), "élo");

        field.handle_key_event(&KeyEvent::from(KeyCode::End));
        type_text(&mut field, "!");
        assert_eq!(field.value(), "élo!");

        assert!(!field.handle_key_event(&KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_enter_only_inserts_in_multiline() {
        let mut single = InputField::new("Title");
        assert!(!single.handle_key_event(&KeyEvent::from(KeyCode::Enter)));

        let mut multi = InputField::new("Body").multiline();
        type_text(&mut multi, "a");
        assert!(multi.handle_key_event(&KeyEvent::from(KeyCode::Enter)));
        type_text(&mut multi, "b");
        assert_eq!(multi.value(), "a\nb");
        assert_eq!(multi.display_lines(false, &Theme::default()).len(), 2);
    }

    #[test]
    fn test_masked_display() {
        let mut field = InputField::new("Password").masked();
        field.set_value("secret");
        let lines = field.display_lines(false, &Theme::default());
        let shown: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(shown, "••••••");
    }

    #[test]
    fn test_thread_validation() {
        let ok = NewThread {
            title: "Hello".to_string(),
            body: "First!".to_string(),
        };
        assert!(validate_new_thread(&ok).is_ok());

        let blank_title = NewThread {
            title: "   ".to_string(),
            ..ok.clone()
        };
        assert_eq!(
            validate_new_thread(&blank_title),
            Err(ValidationError::Required { field: "Title" })
        );

        let long_title = NewThread {
            title: "x".repeat(TITLE_MAX_CHARS + 1),
            ..ok.clone()
        };
        assert_eq!(
            validate_new_thread(&long_title),
            Err(ValidationError::TooLong {
                field: "Title",
                max: TITLE_MAX_CHARS
            })
        );

        let long_body = NewPost {
            body: "x".repeat(BODY_MAX_CHARS + 1),
        };
        assert!(validate_new_post(&long_body).is_err());
        assert!(validate_new_post(&NewPost { body: String::new() }).is_err());
    }

    #[test]
    fn test_profile_validation() {
        assert!(validate_profile_field(ProfileField::DisplayName, "Dana").is_ok());
        assert!(validate_profile_field(ProfileField::DisplayName, "").is_err());
        assert!(validate_profile_field(ProfileField::DisplayName, &"x".repeat(51)).is_err());

        assert!(validate_profile_field(ProfileField::Email, "dana@example.com").is_ok());
        assert!(validate_profile_field(ProfileField::Email, "").is_ok());
        assert_eq!(
            validate_profile_field(ProfileField::Email, "not-an-email"),
            Err(ValidationError::InvalidEmail("not-an-email".to_string()))
        );

        assert!(validate_profile_field(ProfileField::Bio, "").is_ok());
        assert!(validate_profile_field(ProfileField::Bio, &"x".repeat(501)).is_err());
    }

    #[test]
    fn test_composer_submit_flow() {
        let mut composer = ComposerForm::new(ComposerKind::NewThread);
        assert_eq!(
            composer.submit(),
            Err(ValidationError::Required { field: "Title" })
        );

        type_text(composer.title_field_mut(), "Topic");
        assert_eq!(
            composer.handle_key_event(&KeyEvent::from(KeyCode::Tab)),
            ComposerAction::None
        );
        type_text(composer.body_field_mut(), "Body text");

        let submission = composer.submit().unwrap();
        assert_eq!(
            submission,
            Submission::NewThread(NewThread {
                title: "Topic".to_string(),
                body: "Body text".to_string(),
            })
        );
        assert!(composer.is_submitting());

        // Keys are ignored while the request is in flight
        assert_eq!(
            composer.handle_key_event(&KeyEvent::from(KeyCode::Esc)),
            ComposerAction::None
        );

        composer.set_error("Request failed with 500: boom");
        assert!(!composer.is_submitting());
        assert_eq!(composer.error(), Some("Request failed with 500: boom"));
        assert_eq!(
            composer.handle_key_event(&KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            ComposerAction::Submit
        );
    }

    #[test]
    fn test_reply_composer_types_into_body() {
        let mut composer = ComposerForm::new(ComposerKind::Reply);
        composer.handle_key_event(&KeyEvent::from(KeyCode::Char('o')));
        composer.handle_key_event(&KeyEvent::from(KeyCode::Char('k')));
        assert_eq!(
            composer.submit(),
            Ok(Submission::Reply(NewPost {
                body: "ok".to_string()
            }))
        );
    }
}
