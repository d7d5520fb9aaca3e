use ratatui::layout::Rect;
use finsight_core::{Intent, Message, Session, PREDEFINED_QUERIES};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: Session,
    pub analyst_label: String,

    // Input bar
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height, for scroll calculations
    pub chat_width: u16,  // inner width, for wrap calculations
    pub chat_area: Option<Rect>,

    // Chart pane: index into the chart-bearing messages, None follows the newest
    pub chart_cursor: Option<usize>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(session: Session) -> Self {
        let analyst_label = session.analyst_label();
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session,
            analyst_label,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            chart_cursor: None,

            animation_frame: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.session.conversation().is_loading()
    }

    pub fn messages(&self) -> &[Message] {
        self.session.conversation().messages()
    }

    /// Send whatever is in the input bar
    pub fn submit_input(&mut self) {
        let text = self.input.clone();
        if self.session.handle(Intent::Submit(text)) {
            self.input.clear();
            self.cursor = 0;
            self.scroll_to_bottom();
        }
    }

    /// Send one of the suggestion chips (0-based)
    pub fn submit_suggestion(&mut self, index: usize) {
        if let Some(query) = PREDEFINED_QUERIES.get(index) {
            if self.session.handle(Intent::Submit(query.to_string())) {
                self.input.clear();
                self.cursor = 0;
                self.scroll_to_bottom();
            }
        }
    }

    pub fn reset(&mut self) {
        if self.session.handle(Intent::Reset) {
            self.chart_cursor = None;
            self.chat_scroll = 0;
        }
    }

    /// Called once the in-flight request has been recorded
    pub fn on_settled(&mut self) {
        self.chart_cursor = None;
        self.animation_frame = 0;
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Charts
    pub fn chart_messages(&self) -> Vec<&Message> {
        self.messages().iter().filter(|m| m.chart().is_some()).collect()
    }

    /// Position of the shown chart among chart-bearing messages
    pub fn selected_chart_index(&self) -> Option<usize> {
        resolve_chart_index(self.chart_cursor, self.chart_messages().len())
    }

    pub fn chart_prev(&mut self) {
        if let Some(i) = self.selected_chart_index() {
            self.chart_cursor = Some(i.saturating_sub(1));
        }
    }

    pub fn chart_next(&mut self) {
        let count = self.chart_messages().len();
        if let Some(i) = self.selected_chart_index() {
            if i + 1 >= count {
                self.chart_cursor = None;
            } else {
                self.chart_cursor = Some(i + 1);
            }
        }
    }

    // Chat scrolling
    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.visible_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.visible_height() / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.visible_height() / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Scroll chat to bottom so the newest message (or "Analyzing...") is visible
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.total_chat_lines();
        let visible_height = self.visible_height();
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    fn total_chat_lines(&self) -> u16 {
        // Default to 50 columns before the first render
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        ui::chat_line_count(self.messages(), self.is_loading(), wrap_width)
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }
}

/// Clamp a chart selection to the available charts; `None` means the newest
pub fn resolve_chart_index(cursor: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some(cursor.map_or(count - 1, |i| i.min(count - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_chart_index_follows_newest() {
        assert_eq!(resolve_chart_index(None, 0), None);
        assert_eq!(resolve_chart_index(None, 3), Some(2));
        assert_eq!(resolve_chart_index(Some(0), 3), Some(0));
        assert_eq!(resolve_chart_index(Some(7), 3), Some(2));
        assert_eq!(resolve_chart_index(Some(1), 0), None);
    }
}
