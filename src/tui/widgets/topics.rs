use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::analytics;
use crate::schedule::relative_due_label;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = if let Some(tag) = &app.filter_tag {
        format!(" Topics (filter: {}) ", tag)
    } else {
        " Topics ".to_string()
    };

    let items: Vec<ListItem> = app
        .topics
        .items
        .iter()
        .map(|topic| {
            let strength = analytics::knowledge_strength(topic, app.now);
            let strength_bar = create_strength_bar(strength);

            let overdue = app.buckets.overdue.iter().any(|t| t.id == topic.id);
            let (next_color, next_text) = if topic.completed {
                (Color::Green, "mastered".to_string())
            } else if overdue {
                (Color::Red, format!("{} !", relative_due_label(topic, app.now)))
            } else {
                (Color::White, relative_due_label(topic, app.now))
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&topic.title, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(strength_bar, Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {:<4}", strength),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!("{:<10}", topic.priority.label()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(next_text, Style::default().fg(next_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    // Header
    let header = Line::from(vec![
        Span::styled(
            format!("{:<30}", "Title"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Strength  ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<10}", "Priority"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Next Review",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.topics.selected);

    // Render header separately at the top of content area
    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(ratatui::widgets::Paragraph::new(header), header_area);

    // Adjust list area to account for header
    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}

fn create_strength_bar(strength: i64) -> String {
    let filled = (strength / 20).clamp(0, 5) as usize;
    let empty = 5 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
