//! Range text and first/back/next/last controls for a paginated list.
//!
//! The bar holds no pagination state of its own. It is built from the list's
//! [`DisplayInfo`] and boundary flags each frame and hands navigation actions
//! to a dispatch callback supplied by the owner.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use super::pagination::{DisplayInfo, PaginationAction, SearchState};
use crate::tui::{styles::Theme, Frame};

const CONTROL_GAP: &str = " ";
const RANGE_GAP: &str = "   ";

/// One of the four navigation controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageControl {
    First,
    Back,
    Next,
    Last,
}

impl PageControl {
    pub const ALL: [PageControl; 4] = [
        PageControl::First,
        PageControl::Back,
        PageControl::Next,
        PageControl::Last,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PageControl::First => "[« First]",
            PageControl::Back => "[‹ Back]",
            PageControl::Next => "[Next ›]",
            PageControl::Last => "[Last »]",
        }
    }

    /// Action dispatched when the control is pressed
    pub fn action<T>(self) -> PaginationAction<T> {
        match self {
            PageControl::First => PaginationAction::FirstPage,
            PageControl::Back => PaginationAction::PrevPage,
            PageControl::Next => PaginationAction::NextPage,
            PageControl::Last => PaginationAction::LastPage,
        }
    }

    /// Key bindings: Home/g, Left/h, Right/l, End/G
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }

        match key.code {
            KeyCode::Home | KeyCode::Char('g') => Some(PageControl::First),
            KeyCode::Left | KeyCode::Char('h') => Some(PageControl::Back),
            KeyCode::Right | KeyCode::Char('l') => Some(PageControl::Next),
            KeyCode::End | KeyCode::Char('G') => Some(PageControl::Last),
            _ => None,
        }
    }
}

/// Presentational pagination bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationBar {
    pub display_info: DisplayInfo,
    pub disable_back: bool,
    pub disable_next: bool,
}

impl PaginationBar {
    pub fn new(display_info: DisplayInfo, disable_back: bool, disable_next: bool) -> Self {
        Self {
            display_info,
            disable_back,
            disable_next,
        }
    }

    /// Props for the current page of a list
    pub fn from_state<T>(state: &SearchState<T>) -> Self {
        Self::new(state.display_info(), state.is_first_page(), state.is_last_page())
    }

    pub fn is_enabled(&self, control: PageControl) -> bool {
        match control {
            PageControl::First | PageControl::Back => !self.disable_back,
            PageControl::Next | PageControl::Last => !self.disable_next,
        }
    }

    /// Press a control. Disabled controls never reach `dispatch`.
    pub fn press<T, F>(&self, control: PageControl, dispatch: F) -> bool
    where
        F: FnOnce(PaginationAction<T>),
    {
        if !self.is_enabled(control) {
            return false;
        }
        dispatch(control.action());
        true
    }

    /// Translate a key press. Returns whether the key belonged to the bar,
    /// even if its control was disabled.
    pub fn handle_key_event<T, F>(&self, key: &KeyEvent, dispatch: F) -> bool
    where
        F: FnOnce(PaginationAction<T>),
    {
        match PageControl::from_key(key) {
            Some(control) => {
                self.press(control, dispatch);
                true
            }
            None => false,
        }
    }

    /// The bar as a single line of spans
    pub fn line(&self, theme: &Theme) -> Line<'static> {
        let mut spans = vec![
            Span::styled(self.display_info.range_text(), theme.text_style()),
            Span::raw(RANGE_GAP),
        ];

        for (index, control) in PageControl::ALL.into_iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw(CONTROL_GAP));
            }
            spans.push(Span::styled(control.label(), self.control_style(control, theme)));
        }

        Line::from(spans)
    }

    fn control_style(&self, control: PageControl, theme: &Theme) -> Style {
        if self.is_enabled(control) {
            theme.navigation_style()
        } else {
            theme.disabled_style()
        }
    }

    /// Screen rectangles of each control when the bar is drawn into `area`
    pub fn control_areas(&self, area: Rect) -> Vec<(PageControl, Rect)> {
        let mut x = area.x + (self.display_info.range_text().width() + RANGE_GAP.width()) as u16;
        let mut areas = Vec::with_capacity(PageControl::ALL.len());

        for (index, control) in PageControl::ALL.into_iter().enumerate() {
            if index > 0 {
                x += CONTROL_GAP.width() as u16;
            }
            let width = control.label().width() as u16;
            let right = area.x.saturating_add(area.width);
            if x >= right {
                break;
            }
            areas.push((control, Rect::new(x, area.y, width.min(right - x), 1)));
            x += width;
        }

        areas
    }

    /// Control under a mouse position, if any
    pub fn control_at(&self, area: Rect, column: u16, row: u16) -> Option<PageControl> {
        if row != area.y {
            return None;
        }
        self.control_areas(area)
            .into_iter()
            .find(|(_, rect)| column >= rect.x && column < rect.x + rect.width)
            .map(|(control, _)| control)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Paragraph::new(self.line(theme)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn bar(first: usize, last: usize, total: usize, back: bool, next: bool) -> PaginationBar {
        PaginationBar::new(
            DisplayInfo {
                first_item_idx: first,
                last_item_idx: last,
                total_count: total,
            },
            back,
            next,
        )
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_line_contains_range_and_controls() {
        let text = line_text(&bar(11, 20, 50, false, false).line(&Theme::default()));
        assert!(text.starts_with("Displaying 11-20 of 50"));
        for control in PageControl::ALL {
            assert!(text.contains(control.label()));
        }
    }

    #[test]
    fn test_disabled_controls_do_not_dispatch() {
        let bar = bar(1, 10, 50, true, false);
        let mut dispatched: Vec<PaginationAction<()>> = Vec::new();

        assert!(!bar.press(PageControl::Back, |action| dispatched.push(action)));
        assert!(!bar.press(PageControl::First, |action| dispatched.push(action)));
        assert!(dispatched.is_empty());

        assert!(bar.press(PageControl::Next, |action| dispatched.push(action)));
        assert!(bar.press(PageControl::Last, |action| dispatched.push(action)));
        assert_eq!(
            dispatched,
            vec![PaginationAction::NextPage, PaginationAction::LastPage]
        );
    }

    #[test]
    fn test_disabled_controls_use_disabled_style() {
        let theme = Theme::default();
        let line = bar(41, 50, 50, false, true).line(&theme);
        let style_of = |label: &str| {
            line.spans
                .iter()
                .find(|span| span.content == label)
                .map(|span| span.style)
                .unwrap()
        };

        assert_eq!(style_of(PageControl::Next.label()), theme.disabled_style());
        assert_eq!(style_of(PageControl::Last.label()), theme.disabled_style());
        assert_eq!(style_of(PageControl::Back.label()), theme.navigation_style());
    }

    #[test]
    fn test_key_bindings() {
        let bar = bar(11, 20, 50, false, false);
        let mut dispatched: Vec<PaginationAction<()>> = Vec::new();

        for code in [KeyCode::Home, KeyCode::Left, KeyCode::Right, KeyCode::End] {
            assert!(bar.handle_key_event(&KeyEvent::from(code), |a| dispatched.push(a)));
        }
        assert_eq!(
            dispatched,
            vec![
                PaginationAction::FirstPage,
                PaginationAction::PrevPage,
                PaginationAction::NextPage,
                PaginationAction::LastPage,
            ]
        );

        let ctrl_l = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
        assert!(!bar.handle_key_event(&ctrl_l, |a: PaginationAction<()>| dispatched.push(a)));
        assert!(!bar.handle_key_event(&KeyEvent::from(KeyCode::Enter), |a: PaginationAction<()>| {
            dispatched.push(a)
        }));
        assert_eq!(dispatched.len(), 4);
    }

    #[test]
    fn test_mouse_hit_testing() {
        let bar = bar(1, 10, 50, true, false);
        let area = Rect::new(2, 5, 120, 1);
        let areas = bar.control_areas(area);
        assert_eq!(areas.len(), 4);

        let (control, next_rect) = areas[2];
        assert_eq!(control, PageControl::Next);
        assert_eq!(bar.control_at(area, next_rect.x, 5), Some(PageControl::Next));
        assert_eq!(
            bar.control_at(area, next_rect.x + next_rect.width - 1, 5),
            Some(PageControl::Next)
        );
        assert_eq!(bar.control_at(area, next_rect.x, 6), None);
        assert_eq!(bar.control_at(area, area.x, 5), None);
    }

    #[test]
    fn test_renders_into_buffer() {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        let bar = bar(1, 10, 50, true, false);

        terminal
            .draw(|frame| bar.render(frame, frame.size(), &Theme::default()))
            .unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.starts_with("Displaying 1-10 of 50"));
        assert!(rendered.contains("[Next ›]"));
    }
}
