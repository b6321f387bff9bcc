use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::models::Topic;
use crate::schedule::relative_due_label;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let buckets = &app.buckets;

    let mut items: Vec<ListItem> = Vec::new();
    push_bucket(&mut items, app, "Overdue", &buckets.overdue, Color::Red);
    push_bucket(&mut items, app, "Today", &buckets.today, Color::Yellow);
    push_bucket(&mut items, app, "Tomorrow", &buckets.tomorrow, Color::Cyan);
    push_bucket(&mut items, app, "This Week", &buckets.this_week, Color::Green);
    push_bucket(&mut items, app, "Later", &buckets.later, Color::Gray);

    let title = if buckets.total() == 0 {
        " Schedule (empty) ".to_string()
    } else {
        format!(" Schedule ({} topics) ", buckets.total())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn push_bucket(
    items: &mut Vec<ListItem>,
    app: &App,
    label: &str,
    topics: &[Topic],
    color: Color,
) {
    if topics.is_empty() {
        return;
    }

    items.push(ListItem::new(Line::from(Span::styled(
        format!("{} ({})", label, topics.len()),
        Style::default().fg(color),
    ))));

    for topic in topics {
        items.push(ListItem::new(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("{:<32}", truncate(&topic.title, 30)),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("{:<16}", truncate(&topic.subject, 14)),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                relative_due_label(topic, app.now),
                Style::default().fg(color),
            ),
        ])));
    }
    items.push(ListItem::new(Line::from("")));
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
