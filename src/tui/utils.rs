use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Layout helpers shared by pages and overlays
pub mod layout {
    use super::*;

    /// Rectangle of at most `width` x `height` centered in `area`
    pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let width = width.min(area.width);
        let height = height.min(area.height);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((area.height - height) / 2),
                Constraint::Length(height),
                Constraint::Min(0),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length((area.width - width) / 2),
                Constraint::Length(width),
                Constraint::Min(0),
            ])
            .split(rows[1])[1]
    }
}
