use super::{Page, PageContext};
use crate::api::{Post, Thread};
use crate::tui::{
    components::{
        form::{ComposerAction, ComposerForm, ComposerKind, Submission},
        lists::EntityList,
    },
    events::Route,
    keys::KeyMap,
    sources::PostSource,
    styles::Theme,
    tasks::{take_finished, Pending},
    Frame,
};
use crate::utils::text::{format, html, string};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tracing::{info, warn};

const DEFAULT_WRAP_WIDTH: usize = 76;

/// Posts of one thread
pub struct ThreadPage {
    ctx: PageContext,
    thread: Thread,
    posts: EntityList<Post>,
    /// Width available to post bodies, updated on every render
    wrap_width: Arc<AtomicUsize>,
    composer: Option<ComposerForm>,
    replying: Option<Pending<Post>>,
    need_refresh: bool,
}

impl ThreadPage {
    pub fn new(ctx: PageContext, thread: Thread) -> Self {
        let wrap_width = Arc::new(AtomicUsize::new(DEFAULT_WRAP_WIDTH));
        let width = Arc::clone(&wrap_width);
        let posts = EntityList::new(
            PostSource::new(ctx.client.clone(), thread.id),
            move |post: &Post, index| render_post(post, index, width.load(Ordering::Relaxed)),
            ctx.session.clone(),
        )
        .with_limit(ctx.page_size)
        .with_empty_message("No posts in this thread");

        Self {
            ctx,
            thread,
            posts,
            wrap_width,
            composer: None,
            replying: None,
            need_refresh: false,
        }
    }

    fn open_composer(&mut self) {
        if !self.ctx.session.is_logged_in() {
            self.ctx.status("Log in to reply");
            self.ctx.navigate(Route::Login);
            return;
        }
        self.composer = Some(ComposerForm::new(ComposerKind::Reply));
    }

    fn handle_composer_key(&mut self, event: &KeyEvent) {
        let Some(composer) = self.composer.as_mut() else {
            return;
        };

        match composer.handle_key_event(event) {
            ComposerAction::None => {}
            ComposerAction::Cancel => self.composer = None,
            ComposerAction::Submit => match composer.submit() {
                Ok(Submission::Reply(post)) => {
                    let client = self.ctx.client.clone();
                    let thread_id = self.thread.id;
                    self.replying = Some(Pending::spawn(async move {
                        client.create_post(thread_id, &post).await
                    }));
                }
                Ok(Submission::NewThread(_)) => {}
                Err(e) => composer.set_error(e.to_string()),
            },
        }
    }

    fn finish_reply(&mut self) {
        let Some(result) = take_finished(&mut self.replying) else {
            return;
        };

        match result {
            Ok(post) => {
                info!(post_id = post.id, thread_id = self.thread.id, "Reply posted");
                self.composer = None;
                self.need_refresh = true;
                self.ctx.status("Reply posted. Press End to jump to the last page.");
            }
            Err(e) => {
                warn!("Failed to post reply: {}", e);
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

/// Header line plus the HTML body as wrapped plain text
fn render_post(post: &Post, index: usize, width: usize) -> Vec<Line<'static>> {
    let theme = Theme::default();
    let author = post
        .author
        .as_ref()
        .map_or("unknown", |author| author.label())
        .to_string();

    let mut header = vec![
        Span::styled(format!("#{} ", index), theme.dim_style()),
        Span::styled(author, theme.title_style()),
        Span::styled(
            format!(" · {}", format::relative_time(post.created_at, Utc::now())),
            theme.dim_style(),
        ),
    ];
    if post.updated_at.is_some_and(|updated| updated > post.created_at) {
        header.push(Span::styled(" (edited)", theme.dim_style()));
    }

    let mut lines = vec![Line::from(header)];
    let body = html::to_plain_text(&post.body);
    lines.extend(
        string::word_wrap(&body, width.saturating_sub(2).max(20))
            .into_iter()
            .map(|line| Line::from(Span::styled(format!("  {}", line), theme.text_style()))),
    );
    lines.push(Line::default());
    lines
}

#[async_trait]
impl Page for ThreadPage {
    fn id(&self) -> &'static str {
        "thread"
    }

    fn title(&self) -> String {
        string::truncate(&self.thread.title, 40)
    }

    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<bool> {
        if self.composer.is_some() {
            self.handle_composer_key(&event);
            return Ok(true);
        }

        match event.code {
            KeyCode::Char('r') => {
                self.open_composer();
                Ok(true)
            }
            KeyCode::Char('R') => {
                self.need_refresh = true;
                Ok(true)
            }
            _ => Ok(self.posts.handle_key_event(&event)),
        }
    }

    async fn handle_mouse_event(&mut self, event: MouseEvent) -> Result<bool> {
        if self.composer.is_some() {
            return Ok(false);
        }
        Ok(self.posts.handle_mouse_event(&event))
    }

    async fn tick(&mut self) -> Result<()> {
        self.finish_reply();
        self.posts.set_need_refresh(self.need_refresh);
        self.need_refresh = false;
        self.posts.poll();
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.wrap_width
            .store(area.width.saturating_sub(4) as usize, Ordering::Relaxed);

        let title = format!(
            "{} · page {}",
            self.thread.title,
            self.posts.state().page_number()
        );
        self.posts.render(frame, area, theme, &title);

        if let Some(composer) = &self.composer {
            composer.render(frame, area, theme);
        }
    }

    async fn on_enter(&mut self) -> Result<()> {
        self.posts.mount();
        Ok(())
    }

    fn help_text(&self) -> Vec<(&'static str, &'static str)> {
        let mut help = KeyMap::list_help_entries();
        help.extend([("r", "Reply"), ("R", "Refresh")]);
        help
    }
}
