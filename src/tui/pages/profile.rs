//! Profile of the logged-in user with inline field editing.
//!
//! Every editable field runs its own small state machine:
//!
//! ```text
//! Viewing --Enter--> Editing(draft) --Enter/valid--> Saving --ok--> Viewing
//!                        |                              |
//!                        +--Esc--> Viewing              +--error--> Viewing (reverted)
//! ```
//!
//! Saving is optimistic: the draft is shown as the field value while the
//! request is in flight and reverted if the server rejects it.

use super::{Page, PageContext};
use crate::api::{ApiResult, ProfileField, User};
use crate::tui::{
    components::form::{validate_profile_field, InputField, ValidationError},
    events::Route,
    styles::Theme,
    tasks::Pending,
    Frame,
};
use crate::utils::text::string;
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tracing::{info, warn};

/// Where one field is in the edit cycle
#[derive(Debug, Clone)]
pub enum FieldState {
    Viewing,
    Editing(InputField),
    /// Request in flight; `previous` is restored on failure
    Saving { previous: String },
}

#[derive(Debug, Clone)]
struct FieldEdit {
    field: ProfileField,
    state: FieldState,
    error: Option<String>,
    /// Last save succeeded; cleared when editing starts again
    saved: bool,
}

/// A validated change to send to the server
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub user_id: i64,
    pub field: ProfileField,
    pub value: String,
}

/// Profile edit state, independent of any transport
#[derive(Debug, Clone)]
pub struct ProfileEditor {
    user: Option<User>,
    fields: Vec<FieldEdit>,
    selected: usize,
}

impl ProfileEditor {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user,
            fields: ProfileField::ALL
                .into_iter()
                .map(|field| FieldEdit {
                    field,
                    state: FieldState::Viewing,
                    error: None,
                    saved: false,
                })
                .collect(),
            selected: 0,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Replace the displayed user unless a save is in flight
    pub fn set_user(&mut self, user: Option<User>) {
        if !self.is_saving() {
            self.user = user;
        }
    }

    pub fn selected_field(&self) -> ProfileField {
        self.fields[self.selected].field
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1).min(self.fields.len() - 1);
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn edit(&self, field: ProfileField) -> &FieldEdit {
        let index = ProfileField::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default();
        &self.fields[index]
    }

    fn edit_mut(&mut self, field: ProfileField) -> &mut FieldEdit {
        let index = ProfileField::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default();
        &mut self.fields[index]
    }

    pub fn state(&self, field: ProfileField) -> &FieldState {
        &self.edit(field).state
    }

    pub fn error(&self, field: ProfileField) -> Option<&str> {
        self.edit(field).error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.fields
            .iter()
            .any(|edit| matches!(edit.state, FieldState::Saving { .. }))
    }

    /// The field currently taking keyboard input, if any
    pub fn editing_field(&self) -> Option<ProfileField> {
        self.fields
            .iter()
            .find(|edit| matches!(edit.state, FieldState::Editing(_)))
            .map(|edit| edit.field)
    }

    /// Viewing -> Editing with the current value as the draft
    pub fn start_editing(&mut self, field: ProfileField) -> bool {
        let Some(user) = &self.user else {
            return false;
        };
        if self.editing_field().is_some() {
            return false;
        }

        let mut input = InputField::new(field.label());
        input.set_value(user.field_value(field));

        let edit = self.edit_mut(field);
        if !matches!(edit.state, FieldState::Viewing) {
            return false;
        }
        edit.state = FieldState::Editing(input);
        edit.error = None;
        edit.saved = false;
        true
    }

    /// Editing -> Viewing without saving
    pub fn cancel(&mut self, field: ProfileField) {
        let edit = self.edit_mut(field);
        if matches!(edit.state, FieldState::Editing(_)) {
            edit.state = FieldState::Viewing;
        }
    }

    /// Forward a key to the draft being edited
    pub fn edit_key(&mut self, key: &KeyEvent) -> bool {
        let Some(field) = self.editing_field() else {
            return false;
        };
        match &mut self.edit_mut(field).state {
            FieldState::Editing(input) => input.handle_key_event(key),
            _ => false,
        }
    }

    /// Editing -> Saving. The draft becomes the displayed value immediately.
    ///
    /// Returns `Ok(None)` when the draft equals the current value; the field
    /// goes straight back to viewing.
    pub fn begin_save(&mut self, field: ProfileField) -> Result<Option<SaveRequest>, ValidationError> {
        let draft = match &self.edit(field).state {
            FieldState::Editing(input) => input.value().trim().to_string(),
            _ => return Ok(None),
        };

        if let Err(e) = validate_profile_field(field, &draft) {
            self.edit_mut(field).error = Some(e.to_string());
            return Err(e);
        }

        let Some(user) = self.user.as_mut() else {
            return Ok(None);
        };
        let previous = user.field_value(field).to_string();
        if previous == draft {
            self.edit_mut(field).state = FieldState::Viewing;
            return Ok(None);
        }

        user.set_field_value(field, draft.clone());
        let user_id = user.id;

        let edit = self.edit_mut(field);
        edit.state = FieldState::Saving { previous };
        edit.error = None;

        Ok(Some(SaveRequest {
            user_id,
            field,
            value: draft,
        }))
    }

    /// Saving -> Viewing. On success the server's copy of the user is adopted
    /// and returned; on failure the previous value is restored.
    pub fn finish_save(&mut self, field: ProfileField, result: ApiResult<User>) -> Option<User> {
        let previous = match &self.edit(field).state {
            FieldState::Saving { previous } => previous.clone(),
            _ => return None,
        };

        match result {
            Ok(updated) => {
                let edit = self.edit_mut(field);
                edit.state = FieldState::Viewing;
                edit.error = None;
                edit.saved = true;

                match &mut self.user {
                    // Other fields may still be saving; keep their optimistic values
                    Some(user) => user.set_field_value(field, updated.field_value(field).to_string()),
                    slot @ None => *slot = Some(updated.clone()),
                }
                Some(updated)
            }
            Err(e) => {
                if let Some(user) = self.user.as_mut() {
                    user.set_field_value(field, previous);
                }
                let edit = self.edit_mut(field);
                edit.state = FieldState::Viewing;
                edit.error = Some(e.to_string());
                None
            }
        }
    }

    fn field_lines(&self, edit: &FieldEdit, selected: bool, theme: &Theme) -> Vec<Line<'static>> {
        let marker = if selected { "▸ " } else { "  " };
        let label_style = if selected {
            theme.navigation_style()
        } else {
            theme.dim_style()
        };
        let mut lines = vec![Line::from(Span::styled(
            format!("{}{}", marker, edit.field.label()),
            label_style,
        ))];

        match &edit.state {
            FieldState::Editing(input) => {
                for line in input.display_lines(true, theme) {
                    let mut spans = vec![Span::raw("    ")];
                    spans.extend(line.spans);
                    lines.push(Line::from(spans));
                }
            }
            FieldState::Viewing | FieldState::Saving { .. } => {
                let value = self
                    .user
                    .as_ref()
                    .map(|user| user.field_value(edit.field))
                    .unwrap_or_default();
                let shown = if value.is_empty() {
                    Span::styled("    (not set)", theme.placeholder_style())
                } else {
                    Span::styled(format!("    {}", value), theme.text_style())
                };
                let mut spans = vec![shown];
                if matches!(edit.state, FieldState::Saving { .. }) {
                    spans.push(Span::styled("  saving…", theme.dim_style()));
                } else if edit.saved {
                    spans.push(Span::styled("  saved", theme.success_style()));
                }
                lines.push(Line::from(spans));
            }
        }

        if let Some(error) = &edit.error {
            lines.push(Line::from(Span::styled(format!("    {}", error), theme.error_style())));
        }
        lines.push(Line::default());
        lines
    }
}

pub struct ProfilePage {
    ctx: PageContext,
    editor: ProfileEditor,
    saves: Vec<(ProfileField, Pending<User>)>,
}

impl ProfilePage {
    pub fn new(ctx: PageContext) -> Self {
        let editor = ProfileEditor::new(ctx.session.current_user());
        Self {
            ctx,
            editor,
            saves: Vec::new(),
        }
    }

    fn save(&mut self, field: ProfileField) {
        match self.editor.begin_save(field) {
            Ok(Some(request)) => {
                let client = self.ctx.client.clone();
                let pending = Pending::spawn(async move {
                    client
                        .update_user_field(request.user_id, request.field, &request.value)
                        .await
                });
                self.saves.push((field, pending));
            }
            Ok(None) => {}
            Err(e) => warn!(field = field.label(), "Profile edit rejected: {}", e),
        }
    }
}

#[async_trait]
impl Page for ProfilePage {
    fn id(&self) -> &'static str {
        "profile"
    }

    fn title(&self) -> String {
        "Profile".to_string()
    }

    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<bool> {
        if self.editor.user().is_none() {
            if event.code == KeyCode::Char('L') {
                self.ctx.navigate(Route::Login);
                return Ok(true);
            }
            return Ok(false);
        }

        if let Some(field) = self.editor.editing_field() {
            match event.code {
                KeyCode::Esc => self.editor.cancel(field),
                KeyCode::Enter => self.save(field),
                _ => {
                    self.editor.edit_key(&event);
                }
            }
            return Ok(true);
        }

        match event.code {
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => self.editor.select_next(),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => self.editor.select_previous(),
            KeyCode::Enter | KeyCode::Char('e') => {
                let field = self.editor.selected_field();
                self.editor.start_editing(field);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn tick(&mut self) -> Result<()> {
        let mut finished = Vec::new();
        self.saves.retain_mut(|(field, pending)| match pending.poll() {
            Some(result) => {
                finished.push((*field, result));
                false
            }
            None => true,
        });

        for (field, result) in finished {
            let failed = result.as_ref().err().map(|e| e.to_string());
            match self.editor.finish_save(field, result) {
                Some(updated) => {
                    info!(field = field.label(), "Profile updated");
                    self.ctx.session.set_current_user(updated);
                    self.ctx.status(format!("{} saved", field.label()));
                }
                None => {
                    if let Some(error) = failed {
                        self.ctx.status(format!("Could not save {}: {}", field.label(), error));
                    }
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Profile")
            .border_style(theme.border_style());

        let Some(user) = self.editor.user() else {
            let message = Line::from(Span::styled(
                "Not logged in. Press L to log in.",
                theme.placeholder_style(),
            ));
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(user.label().to_string(), theme.title_style()),
                Span::styled(format!("  @{}", user.username), theme.dim_style()),
            ]),
        ];
        if let Some(created_at) = user.created_at {
            lines.push(Line::from(Span::styled(
                format!("Member since {}", created_at.format("%Y-%m-%d")),
                theme.dim_style(),
            )));
        }
        lines.push(Line::default());

        for (index, edit) in self.editor.fields.iter().enumerate() {
            lines.extend(self.editor.field_lines(edit, index == self.editor.selected, theme));
        }

        let hint = if self.editor.editing_field().is_some() {
            "Enter save  Esc cancel"
        } else {
            "Enter edit  ↑/↓ select field  Esc back"
        };
        lines.push(Line::from(Span::styled(
            string::truncate(hint, area.width as usize),
            theme.dim_style(),
        )));

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    async fn on_resume(&mut self) -> Result<()> {
        self.editor.set_user(self.ctx.session.current_user());
        Ok(())
    }

    fn help_text(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("↑/k ↓/j", "Select field"),
            ("Enter/e", "Edit field"),
            ("Enter", "Save while editing"),
            ("Esc", "Cancel edit"),
        ]
    }
}
