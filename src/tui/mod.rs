mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::analytics::{self, Report};
use crate::db::Database;
use crate::models::{Session, Topic};
use crate::schedule::DueBuckets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Topics,
    TopicDetail,
    Schedule,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Topics,
            View::Topics => View::Schedule,
            View::TopicDetail => View::Topics,
            View::Schedule => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Schedule,
            View::Topics => View::Dashboard,
            View::TopicDetail => View::Topics,
            View::Schedule => View::Topics,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// Per-topic figures shown on the detail view, computed on selection.
pub struct TopicStats {
    pub retention: i64,
    pub strength: i64,
    pub session_count: usize,
}

pub struct App {
    db: Database,
    pub view: View,
    pub now: DateTime<Utc>,
    pub topics: StatefulList<Topic>,
    pub selected_topic: Option<Topic>,
    pub selected_topic_sessions: Vec<Session>,
    pub selected_topic_stats: Option<TopicStats>,
    pub report: Report,
    pub buckets: DueBuckets,
    pub recent_sessions: Vec<(Session, Option<String>)>, // session + topic title
    pub filter_tag: Option<String>,
    pub filter_input: String,
    pub filter_mode: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self, Box<dyn std::error::Error>> {
        let now = Utc::now();
        let report = db.report(now)?;
        let topics = db.all_topics()?;
        let buckets = db.schedule(now)?;
        let recent_sessions = db.recent_sessions_with_titles(5)?;

        Ok(Self {
            db,
            view: View::Dashboard,
            now,
            topics: StatefulList::with_items(topics),
            selected_topic: None,
            selected_topic_sessions: Vec::new(),
            selected_topic_stats: None,
            report,
            buckets,
            recent_sessions,
            filter_tag: None,
            filter_input: String::new(),
            filter_mode: false,
            should_quit: false,
        })
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.now = Utc::now();
        self.report = self.db.report(self.now)?;
        self.topics = StatefulList::with_items(
            self.db.list_topics(None, self.filter_tag.as_deref())?,
        );
        self.buckets = self.db.schedule(self.now)?;
        self.recent_sessions = self.db.recent_sessions_with_titles(5)?;
        Ok(())
    }

    fn apply_filter(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.filter_input.is_empty() {
            self.filter_tag = None;
        } else {
            self.filter_tag = Some(self.filter_input.clone());
        }
        self.topics = StatefulList::with_items(
            self.db.list_topics(None, self.filter_tag.as_deref())?,
        );
        Ok(())
    }

    fn select_topic(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(topic) = self.topics.selected_item() {
            let topic = topic.clone();
            let sessions = self.db.sessions_for_topic(topic.id)?;
            self.selected_topic_stats = Some(TopicStats {
                retention: analytics::retention_rate(&topic, &sessions),
                strength: analytics::knowledge_strength(&topic, self.now),
                session_count: sessions.len(),
            });
            self.selected_topic = Some(topic);
            self.selected_topic_sessions = sessions;
            self.view = View::TopicDetail;
        }
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        // Handle filter mode input (vim-like / search)
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter()?;
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            // Refresh: Ctrl+r (vim-like redo/refresh)
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            // Search/filter: / (vim search)
            KeyCode::Char('/') if self.view == View::Topics => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc => match self.view {
                View::TopicDetail => {
                    self.view = View::Topics;
                    self.selected_topic = None;
                }
                View::Topics if self.filter_tag.is_some() => {
                    self.filter_tag = None;
                    self.filter_input.clear();
                    self.apply_filter()?;
                }
                _ => {}
            },

            // Navigation between views: h/l (left/right like vim)
            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::TopicDetail => {
                    self.view = View::Topics;
                    self.selected_topic = None;
                }
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Topics => self.select_topic()?,
                _ => self.view = self.view.next(),
            },

            // Tab still works for quick view switching
            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
            }

            // List navigation: j/k (vim up/down)
            KeyCode::Char('j') | KeyCode::Down => {
                if self.view == View::Topics {
                    self.topics.next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.view == View::Topics {
                    self.topics.previous();
                }
            }

            // Jump to top/bottom: g for top, G for bottom
            KeyCode::Char('g') => {
                if self.view == View::Topics && !self.topics.items.is_empty() {
                    self.topics.selected = Some(0);
                }
            }
            KeyCode::Char('G') => {
                if self.view == View::Topics && !self.topics.items.is_empty() {
                    self.topics.selected = Some(self.topics.items.len() - 1);
                }
            }

            KeyCode::Enter => {
                if self.view == View::Topics {
                    self.select_topic()?;
                }
            }

            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(db)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
