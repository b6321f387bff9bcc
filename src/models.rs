use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The six-point SM-2 recall scale, surfaced to the UI for rating prompts.
pub const QUALITY_SCALE: [(u8, &str); 6] = [
    (0, "Complete blackout"),
    (1, "Incorrect - remembered answer after seeing it"),
    (2, "Incorrect - answer seemed easy"),
    (3, "Correct with serious difficulty"),
    (4, "Correct after hesitation"),
    (5, "Perfect recall"),
];

pub fn quality_label(quality: u8) -> Option<&'static str> {
    QUALITY_SCALE
        .iter()
        .find(|(q, _)| *q == quality)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "medium" | "m" => Some(Difficulty::Medium),
            "hard" | "h" | "difficult" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" | "l" => Some(Priority::Low),
            "medium" | "m" => Some(Priority::Medium),
            "high" | "h" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Weight used when picking the next topic to study.
    pub fn weight(&self) -> f64 {
        match self {
            Priority::Low => 1.0,
            Priority::Medium => 2.0,
            Priority::High => 3.0,
        }
    }
}

/// Whether a session was the first study of a topic or a scheduled review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    New,
    Review,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::New => "new",
            SessionKind::Review => "review",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(SessionKind::New),
            "review" => Some(SessionKind::Review),
            _ => None,
        }
    }
}

/// A unit of knowledge under spaced repetition.
///
/// The memory state (`easiness_factor`, `interval`, `repetitions`,
/// `next_review`) is owned by the scheduling engine and written back
/// only through `session::complete_session`; everything else is
/// descriptive and freely editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub notes: String,
    pub easiness_factor: f64,
    pub interval: i64,
    pub repetitions: i64,
    pub next_review: Option<DateTime<Utc>>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub total_reviews: i64,
    pub success_rate: Option<i64>,
    pub study_time: i64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// An immutable record of one completed study event.
///
/// `topic_id` is `None` for free study not tied to spaced repetition;
/// `quality` is present only when the session rated a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub topic_id: Option<i64>,
    pub duration: i64,
    pub quality: Option<u8>,
    pub kind: SessionKind,
    pub completed_at: DateTime<Utc>,
}

/// A session as produced by the recorder, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub topic_id: Option<i64>,
    pub duration: i64,
    pub quality: Option<u8>,
    pub kind: SessionKind,
    pub completed_at: DateTime<Utc>,
}

impl NewSession {
    pub fn into_session(self, id: i64) -> Session {
        Session {
            id,
            topic_id: self.topic_id,
            duration: self.duration,
            quality: self.quality,
            kind: self.kind,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub topic_count: i64,
}

pub fn format_study_time(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
