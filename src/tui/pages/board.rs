use super::{Page, PageContext};
use crate::api::{Board, Thread};
use crate::tui::{
    components::{
        form::{ComposerAction, ComposerForm, ComposerKind, Submission},
        lists::EntityList,
    },
    events::Route,
    keys::KeyMap,
    sources::ThreadSource,
    styles::Theme,
    tasks::{take_finished, Pending},
    Frame,
};
use crate::utils::text::{format, string};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
};
use tracing::{info, warn};

/// Threads of one board
pub struct BoardPage {
    ctx: PageContext,
    board: Board,
    threads: EntityList<Thread>,
    composer: Option<ComposerForm>,
    creating: Option<Pending<Thread>>,
    need_refresh: bool,
}

impl BoardPage {
    pub fn new(ctx: PageContext, board: Board) -> Self {
        let threads = EntityList::new(
            ThreadSource::new(ctx.client.clone(), board.id),
            render_thread,
            ctx.session.clone(),
        )
        .with_limit(ctx.page_size)
        .with_empty_message("No threads yet. Press n to start one.");

        Self {
            ctx,
            board,
            threads,
            composer: None,
            creating: None,
            need_refresh: false,
        }
    }

    fn open_composer(&mut self) {
        if !self.ctx.session.is_logged_in() {
            self.ctx.status("Log in to start a thread");
            self.ctx.navigate(Route::Login);
            return;
        }
        self.composer = Some(ComposerForm::new(ComposerKind::NewThread));
    }

    fn handle_composer_key(&mut self, event: &KeyEvent) {
        let Some(composer) = self.composer.as_mut() else {
            return;
        };

        match composer.handle_key_event(event) {
            ComposerAction::None => {}
            ComposerAction::Cancel => self.composer = None,
            ComposerAction::Submit => match composer.submit() {
                Ok(Submission::NewThread(thread)) => {
                    let client = self.ctx.client.clone();
                    let board_id = self.board.id;
                    self.creating = Some(Pending::spawn(async move {
                        client.create_thread(board_id, &thread).await
                    }));
                }
                Ok(Submission::Reply(_)) => {}
                Err(e) => composer.set_error(e.to_string()),
            },
        }
    }

    fn finish_create(&mut self) {
        let Some(result) = take_finished(&mut self.creating) else {
            return;
        };

        match result {
            Ok(thread) => {
                info!(thread_id = thread.id, board_id = self.board.id, "Thread created");
                self.composer = None;
                self.need_refresh = true;
                self.ctx.status(format!("Started \"{}\"", thread.title));
            }
            Err(e) => {
                warn!("Failed to create thread: {}", e);
                let message = if e.is_unauthorized() {
                    "Your session has expired. Log in again.".to_string()
                } else {
                    e.to_string()
                };
                if let Some(composer) = self.composer.as_mut() {
                    composer.set_error(message);
                }
            }
        }
    }
}

fn render_thread(thread: &Thread, index: usize) -> Vec<Line<'static>> {
    let theme = Theme::default();
    let author = thread
        .author
        .as_ref()
        .map_or("unknown", |author| author.label())
        .to_string();
    let activity = thread.last_post_at.unwrap_or(thread.created_at);

    vec![
        Line::from(vec![
            Span::styled(format!("{:>4}. ", index), theme.dim_style()),
            Span::styled(string::truncate(&thread.title, 120), theme.title_style()),
        ]),
        Line::from(Span::styled(
            format!(
                "      by {} · {} · {}",
                author,
                format::count(thread.post_count, "post", "posts"),
                format::relative_time(activity, Utc::now())
            ),
            theme.dim_style(),
        )),
    ]
}

#[async_trait]
impl Page for BoardPage {
    fn id(&self) -> &'static str {
        "board"
    }

    fn title(&self) -> String {
        self.board.name.clone()
    }

    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<bool> {
        if self.composer.is_some() {
            self.handle_composer_key(&event);
            return Ok(true);
        }

        match event.code {
            KeyCode::Enter => {
                if let Some(thread) = self.threads.selected_entity().cloned() {
                    self.ctx.navigate(Route::Thread(thread));
                }
                Ok(true)
            }
            KeyCode::Char('n') => {
                self.open_composer();
                Ok(true)
            }
            KeyCode::Char('r') => {
                self.need_refresh = true;
                Ok(true)
            }
            _ => Ok(self.threads.handle_key_event(&event)),
        }
    }

    async fn handle_mouse_event(&mut self, event: MouseEvent) -> Result<bool> {
        if self.composer.is_some() {
            return Ok(false);
        }
        Ok(self.threads.handle_mouse_event(&event))
    }

    async fn tick(&mut self) -> Result<()> {
        self.finish_create();
        self.threads.set_need_refresh(self.need_refresh);
        self.need_refresh = false;
        self.threads.poll();
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let title = format!(
            "{} · page {}",
            self.board.name,
            self.threads.state().page_number()
        );
        self.threads.render(frame, area, theme, &title);

        if let Some(composer) = &self.composer {
            composer.render(frame, area, theme);
        }
    }

    async fn on_enter(&mut self) -> Result<()> {
        self.threads.mount();
        Ok(())
    }

    fn help_text(&self) -> Vec<(&'static str, &'static str)> {
        let mut help = KeyMap::list_help_entries();
        help.extend([
            ("Enter", "Open thread"),
            ("n", "New thread"),
            ("r", "Refresh"),
        ]);
        help
    }
}
