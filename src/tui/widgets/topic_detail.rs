use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::models::{format_study_time, Topic};
use crate::schedule::relative_due_label;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(topic) = &app.selected_topic else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Topic Detail ");
        let paragraph = Paragraph::new("No topic selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Header info
            Constraint::Length(5), // Memory state
            Constraint::Min(0),    // Sessions
        ])
        .split(area);

    draw_header(f, topic, chunks[0]);
    draw_memory(f, app, topic, chunks[1]);
    draw_sessions(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, topic: &Topic, area: Rect) {
    let notes = if topic.notes.is_empty() {
        "No notes"
    } else {
        &topic.notes
    };

    let tags = if topic.tags.is_empty() {
        "None".to_string()
    } else {
        topic.tags.join(", ")
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Subject: ", Style::default().fg(Color::Gray)),
            Span::styled(&topic.subject, Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled("Difficulty: ", Style::default().fg(Color::Gray)),
            Span::styled(topic.difficulty.label(), Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled("Priority: ", Style::default().fg(Color::Gray)),
            Span::styled(topic.priority.label(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Notes: ", Style::default().fg(Color::Gray)),
            Span::styled(notes, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Tags: ", Style::default().fg(Color::Gray)),
            Span::styled(tags, Style::default().fg(Color::Cyan)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", topic.title))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_memory(f: &mut Frame, app: &App, topic: &Topic, area: Rect) {
    let (strength, retention) = app
        .selected_topic_stats
        .as_ref()
        .map(|s| (s.strength, s.retention))
        .unwrap_or((0, 0));
    let strength_bar = create_strength_bar(strength);

    let next_review = if topic.completed {
        "mastered".to_string()
    } else {
        relative_due_label(topic, app.now)
    };

    let success_rate = topic
        .success_rate
        .map(|r| format!("{}%", r))
        .unwrap_or_else(|| "N/A".to_string());
    let success_color = match topic.success_rate {
        Some(r) if r >= 70 => Color::Green,
        Some(r) if r >= 50 => Color::Yellow,
        Some(_) => Color::Red,
        None => Color::DarkGray,
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Strength: ", Style::default().fg(Color::Gray)),
            Span::styled(strength_bar, Style::default().fg(Color::Green)),
            Span::styled(
                format!(" {}/100", strength),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::styled("Retention: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}%", retention), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Repetitions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", topic.repetitions),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Interval: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} day(s)", topic.interval),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Easiness: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.2}", topic.easiness_factor),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Success: ", Style::default().fg(Color::Gray)),
            Span::styled(success_rate, Style::default().fg(success_color)),
            Span::raw("  "),
            Span::styled("Next: ", Style::default().fg(Color::Gray)),
            Span::styled(next_review, Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled("Time: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_study_time(topic.study_time),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Memory ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_sessions(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .selected_topic_sessions
        .iter()
        .rev()
        .take(10)
        .map(|session| {
            let date = session.completed_at.format("%b %d").to_string();
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
                    format!("{:<8}", session.kind.as_str()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<10}", format_study_time(session.duration)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(quality_text, Style::default().fg(quality_color)),
            ]))
        })
        .collect();

    let title = if app.selected_topic_sessions.is_empty() {
        " Sessions (none) ".to_string()
    } else {
        format!(" Sessions ({}) ", app.selected_topic_sessions.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Magenta));

    if items.is_empty() {
        let paragraph = Paragraph::new("No sessions yet. Study this topic to start the clock.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        let list = List::new(items).block(block);
        f.render_widget(list, area);
    }
}

fn create_strength_bar(strength: i64) -> String {
    let filled = (strength / 20).clamp(0, 5) as usize;
    let empty = 5 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
