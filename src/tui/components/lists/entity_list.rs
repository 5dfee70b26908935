//! Server-backed paginated list.
//!
//! [`EntityList`] binds the pagination reducer to an injected asynchronous
//! search and an injected per-item renderer. Two independent triggers issue a
//! search:
//!
//! - mounting, and any dispatch that changes `offset` or `limit`;
//! - `set_need_refresh(true)` after the flag was last seen `false`.
//!
//! Searches run as spawned tasks. Their completions come back over a channel
//! and are applied by [`EntityList::poll`] (once per UI tick) or
//! [`EntityList::settle`]. Each request is tagged with a sequence number and
//! only the response to the newest request is applied, so a slow response to
//! an earlier page can never overwrite a newer one. A failed search (`None`,
//! or a panic inside the search future) leaves the list as it was.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use futures::{Future, FutureExt};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::pagination::{
    reduce, DisplayInfo, PaginationAction, SearchResult, SearchState, DEFAULT_LIMIT,
};
use super::pagination_bar::PaginationBar;
use crate::api::User;
use crate::session::SessionStore;
use crate::tui::{styles::Theme, Frame};

/// Page requested from a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub offset: usize,
    pub limit: usize,
}

/// Successful search: one page plus the session user the server reported
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<T> {
    pub result: SearchResult<T>,
    pub session_user: Option<User>,
}

impl<T> SearchOutcome<T> {
    pub fn new(result: SearchResult<T>) -> Self {
        Self {
            result,
            session_user: None,
        }
    }

    pub fn with_session_user(mut self, user: Option<User>) -> Self {
        self.session_user = user;
        self
    }
}

/// Data source for an [`EntityList`].
///
/// `None` means the search failed; implementations turn their own transport
/// errors into `None`.
#[async_trait]
pub trait SearchEntity<T>: Send + Sync {
    async fn search(&self, options: SearchOptions) -> Option<SearchOutcome<T>>;
}

#[async_trait]
impl<T, F, Fut> SearchEntity<T> for F
where
    T: Send + 'static,
    F: Fn(SearchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Option<SearchOutcome<T>>> + Send + 'static,
{
    async fn search(&self, options: SearchOptions) -> Option<SearchOutcome<T>> {
        (self)(options).await
    }
}

/// Renders one entity given its 1-based absolute position in the result set
pub type RenderChild<T> = Box<dyn Fn(&T, usize) -> Vec<Line<'static>> + Send + Sync>;

/// Completed search delivered back to the list
#[derive(Debug)]
struct SearchResponse<T> {
    seq: u64,
    options: SearchOptions,
    outcome: Option<SearchOutcome<T>>,
}

pub struct EntityList<T> {
    state: SearchState<T>,
    search: Arc<dyn SearchEntity<T>>,
    render_child: RenderChild<T>,
    session: SessionStore,

    /// Last observed value of the external refresh signal
    need_refresh: bool,

    /// Sequence number of the newest issued request
    latest_seq: u64,
    in_flight: usize,
    responses_tx: mpsc::UnboundedSender<SearchResponse<T>>,
    responses_rx: mpsc::UnboundedReceiver<SearchResponse<T>>,

    list_state: ListState,
    bar_areas: [Rect; 2],
    empty_message: String,
    /// Page of the most recently applied result
    applied: Option<SearchOptions>,
}

impl<T: Send + 'static> EntityList<T> {
    pub fn new<S, R>(search: S, render_child: R, session: SessionStore) -> Self
    where
        S: SearchEntity<T> + 'static,
        R: Fn(&T, usize) -> Vec<Line<'static>> + Send + Sync + 'static,
    {
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();

        Self {
            state: SearchState::new(DEFAULT_LIMIT),
            search: Arc::new(search),
            render_child: Box::new(render_child),
            session,
            need_refresh: false,
            latest_seq: 0,
            in_flight: 0,
            responses_tx,
            responses_rx,
            list_state: ListState::default(),
            bar_areas: [Rect::default(); 2],
            empty_message: "Nothing here yet".to_string(),
            applied: None,
        }
    }

    /// Override the page size. Call before [`EntityList::mount`].
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.state = SearchState::new(limit);
        self
    }

    /// Text shown when a completed search returned no items
    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Issue the initial search
    pub fn mount(&mut self) {
        self.fetch("mount");
    }

    pub fn state(&self) -> &SearchState<T> {
        &self.state
    }

    pub fn display_info(&self) -> DisplayInfo {
        self.state.display_info()
    }

    /// Props for both pagination bars
    pub fn pagination_bar(&self) -> PaginationBar {
        PaginationBar::from_state(&self.state)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Whether at least one search has succeeded
    pub fn is_loaded(&self) -> bool {
        self.applied.is_some()
    }

    /// Whether the entities on screen were fetched for the current offset
    /// and limit. False while a page move is loading or after it failed.
    pub fn is_current(&self) -> bool {
        self.applied
            == Some(SearchOptions {
                offset: self.state.offset,
                limit: self.state.limit,
            })
    }

    /// Run an action through the reducer; re-fetch if the page moved
    pub fn dispatch(&mut self, action: PaginationAction<T>) {
        let before = (self.state.offset, self.state.limit);
        let name = action.name();

        self.state = reduce(std::mem::take(&mut self.state), action);

        if (self.state.offset, self.state.limit) != before {
            debug!(
                action = name,
                offset = self.state.offset,
                limit = self.state.limit,
                "page changed"
            );
            self.fetch(name);
        }
    }

    /// Feed the external refresh signal. A false-to-true edge re-fetches the
    /// current page.
    pub fn set_need_refresh(&mut self, need_refresh: bool) {
        let rising = need_refresh && !self.need_refresh;
        self.need_refresh = need_refresh;
        if rising {
            self.fetch("refresh");
        }
    }

    fn fetch(&mut self, trigger: &'static str) {
        self.latest_seq += 1;
        self.in_flight += 1;

        let seq = self.latest_seq;
        let options = SearchOptions {
            offset: self.state.offset,
            limit: self.state.limit,
        };
        debug!(trigger, seq, offset = options.offset, limit = options.limit, "searching");

        let search = Arc::clone(&self.search);
        let responses = self.responses_tx.clone();
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(search.search(options)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(seq, "search task panicked");
                    None
                }
            };
            // The list may have been dropped; nothing to deliver to then.
            let _ = responses.send(SearchResponse {
                seq,
                options,
                outcome,
            });
        });
    }

    /// Apply every completed search without waiting. Returns whether the
    /// visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.responses_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            changed |= self.apply(response);
        }
        changed
    }

    /// Wait for every in-flight search and apply the results
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.responses_rx.recv().await {
                Some(response) => {
                    self.in_flight -= 1;
                    self.apply(response);
                }
                None => break,
            }
        }
    }

    fn apply(&mut self, response: SearchResponse<T>) -> bool {
        if response.seq != self.latest_seq {
            debug!(
                seq = response.seq,
                latest = self.latest_seq,
                offset = response.options.offset,
                "discarding superseded search response"
            );
            return false;
        }

        let Some(outcome) = response.outcome else {
            debug!(seq = response.seq, "search failed, keeping current page");
            return false;
        };

        if let Some(user) = outcome.session_user {
            self.session.set_current_user(user);
        }

        self.dispatch(PaginationAction::SearchResult(outcome.result));
        self.applied = Some(response.options);
        self.list_state
            .select(if self.state.entities.is_empty() { None } else { Some(0) });
        true
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn selected_entity(&self) -> Option<&T> {
        self.list_state
            .selected()
            .and_then(|index| self.state.entities.get(index))
    }

    pub fn select_next(&mut self) {
        let len = self.state.entities.len();
        if len == 0 {
            return;
        }
        let next = self.list_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.state.entities.is_empty() {
            return;
        }
        let previous = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(previous));
    }

    /// Each entity rendered with its absolute 1-based index
    pub fn rendered_children(&self) -> Vec<Vec<Line<'static>>> {
        let offset = self.state.offset;
        self.state
            .entities
            .iter()
            .enumerate()
            .map(|(local, entity)| (self.render_child)(entity, offset + local + 1))
            .collect()
    }

    /// Selection and pagination keys. Returns whether the key was consumed.
    pub fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                return true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
                return true;
            }
            _ => {}
        }

        let bar = self.pagination_bar();
        let mut pending = None;
        let handled = bar.handle_key_event(key, |action| pending = Some(action));
        if let Some(action) = pending {
            self.dispatch(action);
        }
        handled
    }

    /// Clicks on either pagination bar, wheel scrolling over the rows
    pub fn handle_mouse_event(&mut self, event: &MouseEvent) -> bool {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let bar = self.pagination_bar();
                let control = self
                    .bar_areas
                    .iter()
                    .find_map(|area| bar.control_at(*area, event.column, event.row));
                let Some(control) = control else {
                    return false;
                };
                let mut pending = None;
                bar.press(control, |action| pending = Some(action));
                if let Some(action) = pending {
                    self.dispatch(action);
                }
                true
            }
            MouseEventKind::ScrollDown => {
                self.select_next();
                true
            }
            MouseEventKind::ScrollUp => {
                self.select_previous();
                true
            }
            _ => false,
        }
    }

    /// Draw the list with a pagination bar above and below the rows
    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme, title: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(theme.border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let bar = self.pagination_bar();
        self.bar_areas = [chunks[0], chunks[2]];
        bar.render(frame, chunks[0], theme);
        bar.render(frame, chunks[2], theme);

        if self.state.entities.is_empty() {
            let message = if self.is_loading() {
                "Loading…"
            } else if !self.is_loaded() {
                "Could not load this list"
            } else {
                self.empty_message.as_str()
            };
            frame.render_widget(
                Paragraph::new(message).style(theme.placeholder_style()),
                chunks[1],
            );
            return;
        }

        let items: Vec<ListItem> = self
            .rendered_children()
            .into_iter()
            .map(|lines| ListItem::new(Text::from(lines)))
            .collect();
        let list = List::new(items).highlight_style(theme.selection_style());
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    type Calls = Arc<Mutex<Vec<SearchOptions>>>;

    /// Search over `total` integers where each entity is its absolute index
    fn numbers(total: usize, calls: Calls) -> impl SearchEntity<usize> {
        move |options: SearchOptions| {
            calls.lock().unwrap().push(options);
            async move {
                let end = (options.offset + options.limit).min(total);
                let entities = (options.offset..end).collect();
                Some(SearchOutcome::new(SearchResult::new(entities, total)))
            }
        }
    }

    fn render_index(entity: &usize, index: usize) -> Vec<Line<'static>> {
        vec![Line::from(format!("{}: {}", index, entity))]
    }

    fn list_over(total: usize) -> (EntityList<usize>, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let list = EntityList::new(
            numbers(total, Arc::clone(&calls)),
            render_index,
            SessionStore::new(),
        );
        (list, calls)
    }

    fn call_count(calls: &Calls) -> usize {
        calls.lock().unwrap().len()
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[tokio::test]
    async fn test_mount_fetches_first_page_once() {
        let (mut list, calls) = list_over(50);
        list.mount();
        list.settle().await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec![SearchOptions { offset: 0, limit: 10 }]
        );
    }

    #[tokio::test]
    async fn test_custom_limit_is_used_for_search() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut list = EntityList::new(
            numbers(50, Arc::clone(&calls)),
            render_index,
            SessionStore::new(),
        )
        .with_limit(25);
        list.mount();
        list.settle().await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec![SearchOptions { offset: 0, limit: 25 }]
        );
        assert_eq!(list.state().entities.len(), 25);
    }

    #[tokio::test]
    async fn test_round_trip_and_next_page_fetch() {
        let (mut list, calls) = list_over(50);
        list.mount();
        list.settle().await;

        assert_eq!(list.state().entities.len(), 10);
        assert_eq!(
            list.display_info(),
            DisplayInfo {
                first_item_idx: 1,
                last_item_idx: 10,
                total_count: 50
            }
        );

        list.dispatch(PaginationAction::NextPage);
        assert_eq!(
            calls.lock().unwrap().last().copied(),
            Some(SearchOptions { offset: 10, limit: 10 })
        );
        list.settle().await;
        assert_eq!(list.state().entities[0], 10);
    }

    #[tokio::test]
    async fn test_render_child_receives_absolute_indices() {
        let (mut list, _calls) = list_over(50);
        list.mount();
        list.settle().await;
        list.dispatch(PaginationAction::NextPage);
        list.settle().await;

        let texts: Vec<String> = list
            .rendered_children()
            .iter()
            .map(|lines| line_text(&lines[0]))
            .collect();
        let expected: Vec<String> = (11..=20).map(|i| format!("{}: {}", i, i - 1)).collect();
        assert_eq!(texts, expected);
    }

    #[tokio::test]
    async fn test_boundary_flags_follow_the_page() {
        let (mut list, _calls) = list_over(50);
        list.mount();
        list.settle().await;

        let bar = list.pagination_bar();
        assert!(bar.disable_back);
        assert!(!bar.disable_next);

        list.dispatch(PaginationAction::NextPage);
        list.settle().await;
        let bar = list.pagination_bar();
        assert!(!bar.disable_back);
        assert!(!bar.disable_next);

        list.dispatch(PaginationAction::LastPage);
        list.settle().await;
        assert_eq!(list.state().offset, 40);
        let bar = list.pagination_bar();
        assert!(!bar.disable_back);
        assert!(bar.disable_next);
    }

    #[tokio::test]
    async fn test_unchanged_page_does_not_fetch() {
        let (mut list, calls) = list_over(50);
        list.mount();
        list.settle().await;

        list.dispatch(PaginationAction::FirstPage);
        list.dispatch(PaginationAction::PrevPage);
        list.settle().await;
        assert_eq!(call_count(&calls), 1);
    }

    #[tokio::test]
    async fn test_need_refresh_rising_edge_fetches_once() {
        let (mut list, calls) = list_over(50);
        list.set_need_refresh(false);
        list.mount();
        list.settle().await;
        assert_eq!(call_count(&calls), 1);

        list.set_need_refresh(true);
        list.settle().await;
        assert_eq!(call_count(&calls), 2);
        assert_eq!(
            calls.lock().unwrap()[1],
            SearchOptions { offset: 0, limit: 10 }
        );

        list.set_need_refresh(true);
        list.settle().await;
        assert_eq!(call_count(&calls), 2);

        list.set_need_refresh(false);
        list.set_need_refresh(true);
        list.settle().await;
        assert_eq!(call_count(&calls), 3);
    }

    #[tokio::test]
    async fn test_failed_search_keeps_state() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let search = move |options: SearchOptions| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    let entities = (options.offset..options.offset + options.limit).collect();
                    Some(SearchOutcome::new(SearchResult::new(entities, 30)))
                } else {
                    None
                }
            }
        };
        let mut list = EntityList::new(search, render_index, SessionStore::new());
        list.mount();
        list.settle().await;
        let before = list.state().clone();

        list.set_need_refresh(true);
        list.settle().await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(list.state().entities, before.entities);
        assert_eq!(list.state().total_count, before.total_count);
        assert!(!list.is_loading());
        assert!(list.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_page_move_is_not_current() {
        let search = |options: SearchOptions| async move {
            if options.offset == 10 {
                return None;
            }
            let entities = (options.offset..options.offset + options.limit).collect();
            Some(SearchOutcome::new(SearchResult::new(entities, 50)))
        };
        let mut list = EntityList::new(search, render_index, SessionStore::new());
        assert!(!list.is_current());
        list.mount();
        list.settle().await;
        assert!(list.is_current());

        list.dispatch(PaginationAction::NextPage);
        assert!(!list.is_current());
        list.settle().await;

        // Offset moved but the rows are still the first page
        assert_eq!(list.state().offset, 10);
        assert_eq!(list.state().entities.first(), Some(&0));
        assert!(!list.is_current());

        list.dispatch(PaginationAction::NextPage);
        list.settle().await;
        assert!(list.is_current());
        assert_eq!(list.state().entities.first(), Some(&20));
    }

    #[tokio::test]
    async fn test_failed_first_search_leaves_initial_state() {
        let search = |_options: SearchOptions| async move { None::<SearchOutcome<usize>> };
        let mut list = EntityList::new(search, render_index, SessionStore::new());
        list.mount();
        list.settle().await;

        assert!(!list.is_loaded());
        assert!(list.state().entities.is_empty());
        assert_eq!(list.state().offset, 0);
        assert_eq!(list.state().total_count, 0);

        use ratatui::{backend::TestBackend, Terminal};
        let mut terminal = Terminal::new(TestBackend::new(60, 6)).unwrap();
        terminal
            .draw(|frame| list.render(frame, frame.size(), &Theme::default(), "Posts"))
            .unwrap();
        let row: String = (0..60)
            .map(|x| terminal.backend().buffer().get(x, 2).symbol())
            .collect();
        assert!(row.contains("Could not load this list"));
    }

    #[tokio::test]
    async fn test_panicking_search_is_a_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let search = move |_options: SearchOptions| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt > 0 {
                    panic!("transport blew up");
                }
                Some(SearchOutcome::new(SearchResult::new(vec![1usize, 2, 3], 3)))
            }
        };
        let mut list = EntityList::new(search, render_index, SessionStore::new());
        list.mount();
        list.settle().await;

        list.set_need_refresh(true);
        list.settle().await;

        assert_eq!(list.state().entities, vec![1, 2, 3]);
        assert_eq!(list.state().total_count, 3);
    }

    #[tokio::test]
    async fn test_superseded_response_is_discarded() {
        let search = |options: SearchOptions| async move {
            // Page 2 answers slower than page 3
            if options.offset == 10 {
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let entities = (options.offset..options.offset + options.limit).collect();
            Some(SearchOutcome::new(SearchResult::new(entities, 50)))
        };
        let mut list = EntityList::new(search, render_index, SessionStore::new());
        list.mount();
        list.settle().await;

        list.dispatch(PaginationAction::NextPage);
        list.dispatch(PaginationAction::NextPage);
        list.settle().await;

        assert_eq!(list.state().offset, 20);
        assert_eq!(list.state().entities.first(), Some(&20));
    }

    #[tokio::test]
    async fn test_session_user_is_published() {
        let session = SessionStore::new();
        let search = |_options: SearchOptions| async move {
            let user = User {
                id: 9,
                username: "dana".to_string(),
                display_name: None,
                email: None,
                bio: None,
                created_at: None,
            };
            Some(SearchOutcome::new(SearchResult::new(vec![1usize], 1)).with_session_user(Some(user)))
        };
        let mut list = EntityList::new(search, render_index, session.clone());
        list.mount();
        list.settle().await;

        assert_eq!(session.current_user().map(|u| u.id), Some(9));
    }

    #[tokio::test]
    async fn test_poll_applies_completed_searches() {
        let (mut list, _calls) = list_over(5);
        list.mount();
        assert!(list.is_loading());

        for _ in 0..50 {
            if list.poll() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(!list.is_loading());
        assert_eq!(list.state().entities, vec![0, 1, 2, 3, 4]);
        assert_eq!(list.selected_index(), Some(0));
    }

    #[tokio::test]
    async fn test_keys_move_selection_and_pages() {
        let (mut list, calls) = list_over(50);
        list.mount();
        list.settle().await;

        assert!(list.handle_key_event(&KeyEvent::from(KeyCode::Down)));
        assert!(list.handle_key_event(&KeyEvent::from(KeyCode::Char('j'))));
        assert_eq!(list.selected_entity(), Some(&2));
        assert!(list.handle_key_event(&KeyEvent::from(KeyCode::Up)));
        assert_eq!(list.selected_index(), Some(1));

        // Back is disabled on the first page
        assert!(list.handle_key_event(&KeyEvent::from(KeyCode::Left)));
        assert_eq!(call_count(&calls), 1);

        assert!(list.handle_key_event(&KeyEvent::from(KeyCode::End)));
        list.settle().await;
        assert_eq!(list.state().offset, 40);
        assert_eq!(list.selected_index(), Some(0));

        assert!(!list.handle_key_event(&KeyEvent::from(KeyCode::Enter)));
    }

    #[tokio::test]
    async fn test_render_draws_both_bars() {
        use ratatui::{backend::TestBackend, Terminal};

        let (mut list, _calls) = list_over(50);
        list.mount();
        list.settle().await;

        let mut terminal = Terminal::new(TestBackend::new(90, 16)).unwrap();
        terminal
            .draw(|frame| list.render(frame, frame.size(), &Theme::default(), "Threads"))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String {
            (0..buffer.area.width)
                .map(|x| buffer.get(x, y).symbol())
                .collect()
        };
        assert!(row(1).contains("Displaying 1-10 of 50"));
        assert!(row(14).contains("Displaying 1-10 of 50"));
        assert!(row(2).contains("1: 0"));
    }
}
