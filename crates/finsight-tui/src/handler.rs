use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Rows moved per mouse wheel notch
const WHEEL_LINES: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => insert_text(app, &text),
        AppEvent::Resize => app.scroll_to_bottom(),
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Tab | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Suggestion chips
        KeyCode::Char(c @ '1'..='4') => {
            let index = (c as usize) - ('1' as usize);
            app.submit_suggestion(index);
        }

        KeyCode::Char('r') => app.reset(),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        // Chart history
        KeyCode::Char('[') => app.chart_prev(),
        KeyCode::Char(']') => app.chart_next(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.input_mode = InputMode::Normal;
        return;
    }

    // Input bar is disabled until the answer arrives
    if app.is_loading() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

/// Pasted text goes into the input bar as a single line
fn insert_text(app: &mut App, text: &str) {
    if app.input_mode != InputMode::Editing || app.is_loading() {
        return;
    }

    let flattened: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    let byte_pos = char_to_byte_index(&app.input, app.cursor);
    app.input.insert_str(byte_pos, &flattened);
    app.cursor += flattened.chars().count();
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crossterm::event::KeyEventState;
    use finsight_core::{OllamaClient, Session, RESET_MESSAGE};

    // Points at a closed port; accepted questions fail in the background
    fn app() -> App {
        let analyst = Arc::new(OllamaClient::new("http://127.0.0.1:9", "test-model", "system"));
        App::new(Session::new(analyst))
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 0), 0);
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("héllo", 10), 6);
    }

    #[test]
    fn test_typing_and_utf8_editing() {
        let mut app = app();
        assert_eq!(app.input_mode, InputMode::Editing);

        type_str(&mut app, "€ rev");
        assert_eq!(app.input, "€ rev");
        assert_eq!(app.cursor, 5);

        handle_event(&mut app, key(KeyCode::Home));
        handle_event(&mut app, key(KeyCode::Delete));
        assert_eq!(app.input, " rev");

        handle_event(&mut app, key(KeyCode::Char('Q')));
        handle_event(&mut app, key(KeyCode::End));
        handle_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.input, "Q re");
        assert_eq!(app.cursor, 4);
    }

    #[test]
    fn test_blank_submit_keeps_log_unchanged() {
        let mut app = app();
        type_str(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.messages().len(), 1);
        assert!(!app.is_loading());
        assert_eq!(app.input, "   ");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut app = app();
        type_str(&mut app, "ab");
        handle_event(&mut app, key(KeyCode::Left));
        handle_event(&mut app, AppEvent::Paste("x\ny".to_string()));

        assert_eq!(app.input, "ax yb");
        assert_eq!(app.cursor, 4);
    }

    #[test]
    fn test_normal_mode_keys() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);

        // Typing in normal mode does not touch the input
        handle_event(&mut app, key(KeyCode::Char('x')));
        assert!(app.input.is_empty());

        handle_event(&mut app, key(KeyCode::Char('r')));
        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.messages()[0].content(), RESET_MESSAGE);

        handle_event(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.input_mode, InputMode::Editing);

        handle_event(&mut app, key(KeyCode::Esc));
        handle_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_editing() {
        let mut app = app();
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_mouse_outside_chat_is_ignored() {
        let mut app = app();
        app.chat_area = Some(Rect::new(0, 0, 10, 10));
        app.chat_scroll = 4;

        let wheel = |column| MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column,
            row: 2,
            modifiers: KeyModifiers::NONE,
        };

        handle_event(&mut app, AppEvent::Mouse(wheel(20)));
        assert_eq!(app.chat_scroll, 4);

        handle_event(&mut app, AppEvent::Mouse(wheel(2)));
        assert_eq!(app.chat_scroll, 1);
    }

    #[tokio::test]
    async fn test_suggestion_chip_clears_draft() {
        let mut app = app();
        type_str(&mut app, "draft");
        handle_event(&mut app, key(KeyCode::Esc));
        handle_event(&mut app, key(KeyCode::Char('1')));

        assert!(app.is_loading());
        assert_eq!(app.messages().len(), 2);
        assert_eq!(app.messages()[1].content(), finsight_core::PREDEFINED_QUERIES[0]);
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
    }
}
