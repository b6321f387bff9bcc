use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::format_study_time;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Stats + Due topics row
            Constraint::Min(0),    // Recent sessions
        ])
        .split(area);

    // Top row: Stats and Due Topics side by side
    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_due_topics(f, app, top_chunks[1]);
    draw_recent_sessions(f, app, chunks[1]);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let report = &app.report;
    let due_now = app.buckets.due_now().count();

    let text = vec![
        Line::from(vec![
            Span::styled("Streak: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} day(s)", report.streak),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Sessions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", report.total_sessions),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Study time: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_study_time(report.total_study_time),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Topics: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", report.topics_tracked),
                Style::default().fg(Color::White),
            ),
            Span::styled("  Mastered: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", report.topics_completed),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("Due now: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", due_now),
                Style::default().fg(if due_now > 0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Avg score: ", Style::default().fg(Color::Gray)),
            Span::styled(
                report
                    .performance
                    .average_score
                    .map(|s| format!("{}%", s))
                    .unwrap_or_else(|| "N/A".to_string()),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_due_topics(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .buckets
        .due_now()
        .take(5)
        .enumerate()
        .map(|(i, topic)| {
            let style = if app.buckets.overdue.iter().any(|t| t.id == topic.id) {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Yellow)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(truncate(&topic.title, 20), style),
                Span::raw(" "),
                Span::styled(
                    crate::schedule::relative_due_label(topic, app.now),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Due Topics ")
        .title_style(Style::default().fg(Color::Yellow));

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn draw_recent_sessions(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .recent_sessions
        .iter()
        .map(|(session, topic_title)| {
            let date = session.completed_at.format("%b %d").to_string();
            let title = topic_title.as_deref().unwrap_or("(free study)");
            let (quality_text, quality_color) = match session.quality {
                Some(q) if q >= 4 => (format!("Quality {}", q), Color::Green),
                Some(q) if q >= 3 => (format!("Quality {}", q), Color::Yellow),
                Some(q) => (format!("Quality {}", q), Color::Red),
                None => ("Unrated".to_string(), Color::DarkGray),
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10}", date),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<22}", truncate(title, 20)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<10}", format_study_time(session.duration)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(quality_text, Style::default().fg(quality_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Sessions ")
        .title_style(Style::default().fg(Color::Magenta));

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
