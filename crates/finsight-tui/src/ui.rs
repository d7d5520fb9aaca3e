use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use finsight_core::{ChatRole, Message, PREDEFINED_QUERIES};
use crate::app::{App, InputMode};
use crate::chart;

pub const DISCLAIMER: &str =
    "AI generated responses. Financial data is simulated for demonstration purposes.";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn role_line(role: ChatRole, time: Option<String>) -> Line<'static> {
    let (label, color) = match role {
        ChatRole::User => ("You:", Color::Cyan),
        ChatRole::Assistant => ("FinSight:", Color::Yellow),
    };

    let mut spans = vec![Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(time) = time {
        spans.push(Span::styled(format!(" {}", time), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

/// Unwrapped chat transcript
pub fn chat_lines(messages: &[Message], loading: bool, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in messages {
        let time = msg.timestamp.format("%H:%M").to_string();
        lines.push(role_line(msg.role(), Some(time)));

        for line in msg.content().lines() {
            match msg.role() {
                ChatRole::User => lines.push(Line::from(line.to_string())),
                ChatRole::Assistant => lines.push(parse_markdown_line(line)),
            }
        }

        if let Some(spec) = msg.chart() {
            let title = spec.title.as_deref().unwrap_or("untitled");
            lines.push(Line::from(Span::styled(
                format!("[{} chart: {}]", spec.chart_type.as_str(), title),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
            )));
        }

        lines.push(Line::default());
    }

    if loading {
        lines.push(role_line(ChatRole::Assistant, None));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize % 3) + 1);
        lines.push(Line::from(Span::styled(
            format!("Analyzing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn chat_paragraph(lines: Vec<Line<'static>>) -> Paragraph<'static> {
    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true })
}

/// Rows the chat pane needs once word-wrapped to `width` columns.
/// Saturates at `u16::MAX`, the furthest a paragraph can scroll.
pub fn chat_line_count(messages: &[Message], loading: bool, width: u16) -> u16 {
    // Widest frame of the loading animation
    let lines = chat_lines(messages, loading, 2);
    let rows = chat_paragraph(lines).line_count(width.max(1));
    u16::try_from(rows).unwrap_or(u16::MAX)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, chips_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(2),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.chart_messages().is_empty() {
        render_chat(app, frame, body_area);
    } else {
        let [chat_area, chart_area] = Layout::horizontal([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .areas(body_area);
        render_chat(app, frame, chat_area);
        render_chart_pane(app, frame, chart_area);
    }

    render_chips(app, frame, chips_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" FinSight ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}]", app.analyst_label),
            Style::default().fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let loading = app.is_loading();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if loading { Color::Yellow } else { Color::DarkGray }))
        .title(" Chat ");

    let lines = chat_lines(app.messages(), loading, app.animation_frame);
    let chat = chat_paragraph(lines)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    let total_lines = chat_line_count(app.messages(), loading, app.chat_width);
    if total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(total_lines as usize)
            .position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_chart_pane(app: &App, frame: &mut Frame, area: Rect) {
    let charts = app.chart_messages();
    let Some(index) = app.selected_chart_index() else {
        return;
    };
    let Some(spec) = charts.get(index).and_then(|m| m.chart()) else {
        return;
    };

    // Highlighted while browsing older charts
    let focused = app.chart_cursor.is_some();
    chart::render_chart(frame, area, spec, index, charts.len(), focused);
}

fn render_chips(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.is_loading();
    let (key_style, label_style) = if loading {
        (
            Style::default().bg(Color::Black).fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (
            Style::default().bg(Color::Blue).fg(Color::White),
            Style::default().fg(Color::Gray),
        )
    };

    let mut spans = Vec::new();
    for (i, query) in PREDEFINED_QUERIES.iter().enumerate() {
        spans.push(Span::styled(format!(" {} ", i + 1), key_style));
        spans.push(Span::styled(format!(" {}  ", query), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.is_loading();
    let editing = app.input_mode == InputMode::Editing;

    let (border_color, title) = if loading {
        (Color::DarkGray, " Analyzing... ")
    } else if editing {
        (Color::Yellow, " Ask about the financial data ")
    } else {
        (Color::DarkGray, " Ask (i to type) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible; inner width excludes borders
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if loading { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);

    frame.render_widget(input, area);

    if editing && !loading {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let [hints_area, disclaimer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" 1-4 ", key_style),
                Span::styled(" suggest ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            if app.chart_messages().len() > 1 {
                hints.extend(vec![
                    Span::styled(" [/] ", key_style),
                    Span::styled(" charts ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" r ", key_style),
                Span::styled(" reset ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, hints_area);

    let disclaimer = Paragraph::new(Span::styled(
        DISCLAIMER,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))
    .centered();
    frame.render_widget(disclaimer, disclaimer_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::{AnalystResponse, ChartDataPoint, ChartType, Conversation};
    use ratatui::{buffer::Buffer, widgets::Widget};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("Revenue was **1.6M** in Q4");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "1.6M");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line_text(&line), "Revenue was 1.6M in Q4");
    }

    #[test]
    fn test_parse_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("growth **strong");
        assert_eq!(line_text(&line), "growth **strong");
        assert!(line.spans.iter().all(|s| !s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn test_parse_markdown_single_star_and_empty() {
        assert_eq!(line_text(&parse_markdown_line("5 * 3")), "5 * 3");
        assert!(parse_markdown_line("").spans.is_empty());
    }

    #[test]
    fn test_chat_lines_match_line_count() {
        let mut conversation = Conversation::new();
        conversation.begin_request("Show revenue");
        conversation.finish_request(Ok(AnalystResponse {
            answer: "Q4 led with **1.6M**.\nQ3 was lowest.".to_string(),
            show_chart: true,
            chart_type: Some(ChartType::Bar),
            chart_title: Some("Revenue".to_string()),
            chart_data: Some(vec![ChartDataPoint {
                name: "Q4 2023".to_string(),
                value: 1_600_000.0,
                category: None,
            }]),
        }));
        conversation.begin_request("And expenses?");

        let lines = chat_lines(conversation.messages(), true, 2);
        let counted = chat_line_count(conversation.messages(), true, u16::MAX);
        assert_eq!(lines.len(), counted as usize);

        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(texts.contains(&"[bar chart: Revenue]".to_string()));
        assert_eq!(texts.last().map(String::as_str), Some("Analyzing..."));
        assert!(texts[0].starts_with("FinSight:"));
        assert!(texts.iter().any(|t| t.starts_with("You:")));
    }

    #[test]
    fn test_welcome_line_count() {
        let conversation = Conversation::new();

        // Role line, welcome text and a blank line
        assert_eq!(chat_line_count(conversation.messages(), false, 200), 3);
        // Loading indicator adds two rows
        assert_eq!(chat_line_count(conversation.messages(), true, 200), 5);
        assert!(chat_line_count(conversation.messages(), false, 0) > 0);
    }

    #[test]
    fn test_line_count_matches_word_wrapped_render() {
        let mut conversation = Conversation::new();
        conversation.begin_request("How did revenue move?");
        conversation.finish_request(Ok(AnalystResponse::text(
            "Revenue dipped in the third quarter, then the fourth quarter set a record at 1.6M for the year.",
        )));

        let width: u16 = 20;
        let counted = chat_line_count(conversation.messages(), false, width);

        let area = Rect::new(0, 0, width, 200);
        let mut buf = Buffer::empty(area);
        chat_paragraph(chat_lines(conversation.messages(), false, 0)).render(area, &mut buf);

        let last_used_row = buf
            .content
            .chunks(width as usize)
            .rposition(|row| row.iter().any(|cell| cell.symbol() != " "))
            .unwrap();

        // Everything up to the last text row, plus the trailing blank line
        assert_eq!(counted as usize, last_used_row + 2);
    }

    #[test]
    fn test_line_count_saturates_on_long_sessions() {
        let mut conversation = Conversation::new();
        for _ in 0..17_000 {
            conversation.begin_request("q");
            conversation.finish_request(Ok(AnalystResponse::text("a")));
        }

        assert_eq!(chat_line_count(conversation.messages(), false, 80), u16::MAX);
    }
}
