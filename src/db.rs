use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, types::Type, Connection, Row};
use std::path::Path;

use crate::analytics::{self, Report};
use crate::error::{Error, Result};
use crate::models::{Difficulty, Priority, Session, SessionKind, Tag, Topic};
use crate::schedule::{self, DueBuckets};
use crate::session;
use crate::srs::INITIAL_EASINESS;

/// Descriptive fields that may be edited after creation. Memory state
/// (easiness, interval, repetitions, next_review) is never editable;
/// it only changes through `record_review`.
#[derive(Debug, Default)]
pub struct TopicUpdate<'a> {
    pub title: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub difficulty: Option<Difficulty>,
    pub priority: Option<Priority>,
    pub notes: Option<&'a str>,
    pub tags: Option<&'a [String]>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                subject TEXT NOT NULL,
                difficulty TEXT NOT NULL CHECK(difficulty IN ('easy', 'medium', 'hard')),
                priority TEXT NOT NULL CHECK(priority IN ('low', 'medium', 'high')),
                notes TEXT NOT NULL DEFAULT '',
                easiness_factor REAL NOT NULL DEFAULT 2.5,
                interval INTEGER NOT NULL DEFAULT 0,
                repetitions INTEGER NOT NULL DEFAULT 0,
                next_review TEXT,
                last_reviewed TEXT,
                total_reviews INTEGER NOT NULL DEFAULT 0,
                success_rate INTEGER,
                study_time INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS topic_tags (
                topic_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (topic_id, tag_id),
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER,
                duration INTEGER NOT NULL CHECK(duration > 0),
                quality INTEGER CHECK(quality BETWEEN 0 AND 5),
                kind TEXT NOT NULL CHECK(kind IN ('new', 'review')),
                completed_at TEXT NOT NULL,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_topics_next_review ON topics(next_review);
            CREATE INDEX IF NOT EXISTS idx_topics_subject ON topics(subject);
            CREATE INDEX IF NOT EXISTS idx_topic_tags_topic ON topic_tags(topic_id);
            CREATE INDEX IF NOT EXISTS idx_topic_tags_tag ON topic_tags(tag_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_topic ON sessions(topic_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            "#,
        )?;

        Ok(())
    }

    // Topic operations

    pub fn add_topic(
        &self,
        title: &str,
        subject: &str,
        difficulty: Difficulty,
        priority: Priority,
        tags: &[String],
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        // New topics are due immediately: next_review starts at creation time.
        self.conn.execute(
            r#"
            INSERT INTO topics (title, subject, difficulty, priority, notes,
                                easiness_factor, next_review, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                title,
                subject,
                difficulty.as_str(),
                priority.as_str(),
                notes,
                INITIAL_EASINESS,
                now,
                now
            ],
        )?;
        let topic_id = self.conn.last_insert_rowid();

        for tag in tags {
            let tag_id = self.get_or_create_tag(tag)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO topic_tags (topic_id, tag_id) VALUES (?1, ?2)",
                params![topic_id, tag_id],
            )?;
        }

        log::debug!("added topic {} ({})", topic_id, title);
        Ok(topic_id)
    }

    pub fn get_topic(&self, id: i64) -> Result<Option<Topic>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1", SELECT_TOPIC))?;

        let topic = stmt.query_row(params![id], row_to_topic);
        match topic {
            Ok(mut t) => {
                t.tags = self.get_topic_tags(id)?;
                Ok(Some(t))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_topics(
        &self,
        subject_filter: Option<&str>,
        tag_filter: Option<&str>,
    ) -> Result<Vec<Topic>> {
        let mut topics: Vec<Topic> = if let Some(tag) = tag_filter {
            let mut stmt = self.conn.prepare(&format!(
                r#"
                SELECT DISTINCT t.* FROM ({}) t
                JOIN topic_tags tt ON t.id = tt.topic_id
                JOIN tags tg ON tt.tag_id = tg.id
                WHERE tg.name = ?1
                ORDER BY t.subject, t.title
                "#,
                SELECT_TOPIC
            ))?;
            let rows = stmt.query_map(params![tag], row_to_topic)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            let mut stmt = self
                .conn
                .prepare(&format!("{} ORDER BY subject, title", SELECT_TOPIC))?;
            let rows = stmt.query_map([], row_to_topic)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        if let Some(subject) = subject_filter {
            topics.retain(|t| t.subject.eq_ignore_ascii_case(subject));
        }
        for topic in &mut topics {
            topic.tags = self.get_topic_tags(topic.id)?;
        }
        Ok(topics)
    }

    pub fn all_topics(&self) -> Result<Vec<Topic>> {
        self.list_topics(None, None)
    }

    pub fn update_topic(&self, id: i64, update: TopicUpdate) -> Result<Topic> {
        let tx = self.conn.unchecked_transaction()?;
        let current = self.get_topic(id)?.ok_or(Error::TopicNotFound(id))?;

        tx.execute(
            r#"
            UPDATE topics
            SET title = ?1, subject = ?2, difficulty = ?3, priority = ?4, notes = ?5
            WHERE id = ?6
            "#,
            params![
                update.title.unwrap_or(&current.title),
                update.subject.unwrap_or(&current.subject),
                update.difficulty.unwrap_or(current.difficulty).as_str(),
                update.priority.unwrap_or(current.priority).as_str(),
                update.notes.unwrap_or(&current.notes),
                id
            ],
        )?;

        if let Some(tags) = update.tags {
            tx.execute("DELETE FROM topic_tags WHERE topic_id = ?1", params![id])?;
            for tag in tags {
                let tag_id = self.get_or_create_tag(tag)?;
                tx.execute(
                    "INSERT OR IGNORE INTO topic_tags (topic_id, tag_id) VALUES (?1, ?2)",
                    params![id, tag_id],
                )?;
            }
        }

        tx.commit()?;
        self.get_topic(id)?.ok_or(Error::TopicNotFound(id))
    }

    /// Removes a topic; its sessions go with it via the foreign key.
    pub fn delete_topic(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM topics WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(Error::TopicNotFound(id));
        }
        log::debug!("deleted topic {}", id);
        Ok(())
    }

    // Tag operations

    fn get_or_create_tag(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1)",
            params![name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM tags WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_topic_tags(&self, topic_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tg.name FROM tags tg
            JOIN topic_tags tt ON tg.id = tt.tag_id
            WHERE tt.topic_id = ?1
            ORDER BY tg.name
            "#,
        )?;
        let rows = stmt.query_map(params![topic_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tg.id, tg.name, COUNT(tt.topic_id)
            FROM tags tg
            LEFT JOIN topic_tags tt ON tg.id = tt.tag_id
            GROUP BY tg.id
            ORDER BY tg.name
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                topic_count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // Session operations

    /// Rates a study session against a topic. The topic read, the
    /// scheduling update and the session insert happen inside one
    /// transaction, so a review is all-or-nothing.
    pub fn record_review(
        &self,
        topic_id: i64,
        quality: u8,
        elapsed_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<(Topic, Session)> {
        let tx = self.conn.unchecked_transaction()?;

        let mut topic = self.get_topic(topic_id)?.ok_or(Error::TopicNotFound(topic_id))?;
        let history = self.sessions_for_topic(topic_id)?;
        let new_session = session::complete_session(&mut topic, quality, elapsed_secs, &history, now)?;

        tx.execute(
            r#"
            UPDATE topics
            SET easiness_factor = ?1, interval = ?2, repetitions = ?3,
                next_review = ?4, last_reviewed = ?5, total_reviews = ?6,
                success_rate = ?7, study_time = ?8, completed = ?9
            WHERE id = ?10
            "#,
            params![
                topic.easiness_factor,
                topic.interval,
                topic.repetitions,
                topic.next_review,
                topic.last_reviewed,
                topic.total_reviews,
                topic.success_rate,
                topic.study_time,
                topic.completed,
                topic_id
            ],
        )?;
        tx.execute(
            "INSERT INTO sessions (topic_id, duration, quality, kind, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new_session.topic_id,
                new_session.duration,
                new_session.quality,
                new_session.kind.as_str(),
                new_session.completed_at
            ],
        )?;
        let session_id = tx.last_insert_rowid();
        tx.commit()?;

        log::debug!(
            "recorded review of topic {}: quality {}, next review {:?}",
            topic_id,
            quality,
            topic.next_review
        );
        Ok((topic, new_session.into_session(session_id)))
    }

    /// Records study time not tied to any topic. No rating, no effect on
    /// scheduling; it still counts towards streaks and rollups.
    pub fn record_free_session(&self, duration: i64, now: DateTime<Utc>) -> Result<Session> {
        if duration <= 0 {
            return Err(Error::InvalidDuration(duration));
        }
        self.conn.execute(
            "INSERT INTO sessions (topic_id, duration, quality, kind, completed_at)
             VALUES (NULL, ?1, NULL, ?2, ?3)",
            params![duration, SessionKind::New.as_str(), now],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(Session {
            id,
            topic_id: None,
            duration,
            quality: None,
            kind: SessionKind::New,
            completed_at: now,
        })
    }

    pub fn sessions_for_topic(&self, topic_id: i64) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE topic_id = ?1 ORDER BY completed_at",
            SELECT_SESSION
        ))?;
        let rows = stmt.query_map(params![topic_id], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_sessions(&self, limit: Option<usize>) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY completed_at DESC, id DESC LIMIT ?1",
            SELECT_SESSION
        ))?;
        let rows = stmt.query_map(params![limit.map(|n| n as i64).unwrap_or(-1)], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Recent sessions newest first, with the owning topic's title
    /// resolved in the same query.
    pub fn recent_sessions_with_titles(
        &self,
        limit: usize,
    ) -> Result<Vec<(Session, Option<String>)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.topic_id, s.duration, s.quality, s.kind, s.completed_at, t.title
            FROM sessions s
            LEFT JOIN topics t ON s.topic_id = t.id
            ORDER BY s.completed_at DESC, s.id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let session = row_to_session(row)?;
            let title: Option<String> = row.get(6)?;
            Ok((session, title))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn all_sessions(&self) -> Result<Vec<Session>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY completed_at, id", SELECT_SESSION))?;
        let rows = stmt.query_map([], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // Derived views

    pub fn schedule(&self, now: DateTime<Utc>) -> Result<DueBuckets> {
        Ok(schedule::classify(&self.all_topics()?, now))
    }

    pub fn report(&self, now: DateTime<Utc>) -> Result<Report> {
        Ok(analytics::aggregate(
            &self.all_topics()?,
            &self.all_sessions()?,
            now,
        ))
    }

    /// Picks one topic to study now, weighted towards high priority and
    /// long-overdue reviews. Returns `None` when nothing is due.
    pub fn next_topic(&self, now: DateTime<Utc>) -> Result<Option<Topic>> {
        let buckets = self.schedule(now)?;
        let candidates: Vec<&Topic> = buckets.due_now().collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let weights: Vec<f64> = candidates
            .iter()
            .map(|t| {
                let overdue_days = t
                    .next_review
                    .map(|n| (now.date_naive() - n.date_naive()).num_days().max(0))
                    .unwrap_or(0) as f64;
                (overdue_days + 1.0) * t.priority.weight()
            })
            .collect();
        let total: f64 = weights.iter().sum();

        let mut pick = rand::thread_rng().gen_range(0.0..total);
        for (topic, weight) in candidates.iter().zip(&weights) {
            if pick < *weight {
                return Ok(Some((*topic).clone()));
            }
            pick -= weight;
        }
        Ok(candidates.last().map(|t| (*t).clone()))
    }
}

const SELECT_TOPIC: &str = r#"
    SELECT id, title, subject, difficulty, priority, notes,
           easiness_factor, interval, repetitions, next_review, last_reviewed,
           total_reviews, success_rate, study_time, completed, created_at
    FROM topics
"#;

const SELECT_SESSION: &str = r#"
    SELECT id, topic_id, duration, quality, kind, completed_at
    FROM sessions
"#;

fn row_to_topic(row: &Row) -> rusqlite::Result<Topic> {
    let difficulty_raw: String = row.get(3)?;
    let difficulty = Difficulty::from_str(&difficulty_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown difficulty {:?}", difficulty_raw).into(),
        )
    })?;
    let priority_raw: String = row.get(4)?;
    let priority = Priority::from_str(&priority_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown priority {:?}", priority_raw).into(),
        )
    })?;

    Ok(Topic {
        id: row.get(0)?,
        title: row.get(1)?,
        subject: row.get(2)?,
        difficulty,
        priority,
        tags: vec![],
        notes: row.get(5)?,
        easiness_factor: row.get(6)?,
        interval: row.get(7)?,
        repetitions: row.get(8)?,
        next_review: row.get(9)?,
        last_reviewed: row.get(10)?,
        total_reviews: row.get(11)?,
        success_rate: row.get(12)?,
        study_time: row.get(13)?,
        completed: row.get(14)?,
        created_at: row.get(15)?,
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    let quality: Option<i64> = row.get(3)?;
    let kind_raw: String = row.get(4)?;
    let kind = SessionKind::from_str(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown session kind {:?}", kind_raw).into(),
        )
    })?;

    Ok(Session {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        duration: row.get(2)?,
        quality: quality.map(|q| q as u8),
        kind,
        completed_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn setup_db() -> Database {
        let db = Database::open(":memory:").unwrap();
        db.init().unwrap();
        db
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn add_basic_topic(db: &Database, title: &str, subject: &str) -> i64 {
        db.add_topic(
            title,
            subject,
            Difficulty::Medium,
            Priority::Medium,
            &[],
            "",
            fixed_now(),
        )
        .unwrap()
    }

    mod topic_tests {
        use super::*;

        #[test]
        fn add_and_get_round_trip() {
            let db = setup_db();
            let id = db
                .add_topic(
                    "Lifetimes",
                    "Rust",
                    Difficulty::Hard,
                    Priority::High,
                    &["borrowck".to_string(), "core".to_string()],
                    "re-read the nomicon chapter",
                    fixed_now(),
                )
                .unwrap();

            let topic = db.get_topic(id).unwrap().unwrap();
            assert_eq!(topic.title, "Lifetimes");
            assert_eq!(topic.subject, "Rust");
            assert_eq!(topic.difficulty, Difficulty::Hard);
            assert_eq!(topic.priority, Priority::High);
            assert_eq!(topic.tags, vec!["borrowck", "core"]);
            assert_eq!(topic.notes, "re-read the nomicon chapter");
            assert!((topic.easiness_factor - INITIAL_EASINESS).abs() < 1e-9);
            assert_eq!(topic.interval, 0);
            assert_eq!(topic.repetitions, 0);
            assert_eq!(topic.next_review, Some(fixed_now()));
            assert_eq!(topic.success_rate, None);
            assert!(!topic.completed);
        }

        #[test]
        fn get_missing_topic_is_none() {
            let db = setup_db();
            assert!(db.get_topic(99).unwrap().is_none());
        }

        #[test]
        fn new_topics_are_due_immediately() {
            let db = setup_db();
            add_basic_topic(&db, "Traits", "Rust");
            let buckets = db.schedule(fixed_now()).unwrap();
            assert_eq!(buckets.today.len(), 1);
        }

        #[test]
        fn list_filters_by_subject() {
            let db = setup_db();
            add_basic_topic(&db, "Traits", "Rust");
            add_basic_topic(&db, "Closures", "Rust");
            add_basic_topic(&db, "Integrals", "Calculus");

            let rust = db.list_topics(Some("rust"), None).unwrap();
            assert_eq!(rust.len(), 2);
            assert!(rust.iter().all(|t| t.subject == "Rust"));
        }

        #[test]
        fn list_filters_by_tag() {
            let db = setup_db();
            db.add_topic(
                "Traits",
                "Rust",
                Difficulty::Medium,
                Priority::Medium,
                &["exam".to_string()],
                "",
                fixed_now(),
            )
            .unwrap();
            add_basic_topic(&db, "Closures", "Rust");

            let tagged = db.list_topics(None, Some("exam")).unwrap();
            assert_eq!(tagged.len(), 1);
            assert_eq!(tagged[0].title, "Traits");
        }

        #[test]
        fn update_touches_descriptive_fields_only() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            db.record_review(id, 4, 600, fixed_now()).unwrap();
            let before = db.get_topic(id).unwrap().unwrap();

            let updated = db
                .update_topic(
                    id,
                    TopicUpdate {
                        title: Some("Trait objects"),
                        priority: Some(Priority::High),
                        ..Default::default()
                    },
                )
                .unwrap();

            assert_eq!(updated.title, "Trait objects");
            assert_eq!(updated.priority, Priority::High);
            assert_eq!(updated.subject, before.subject);
            assert_eq!(updated.easiness_factor, before.easiness_factor);
            assert_eq!(updated.interval, before.interval);
            assert_eq!(updated.repetitions, before.repetitions);
            assert_eq!(updated.next_review, before.next_review);
        }

        #[test]
        fn update_replaces_tags() {
            let db = setup_db();
            let id = db
                .add_topic(
                    "Traits",
                    "Rust",
                    Difficulty::Medium,
                    Priority::Medium,
                    &["old".to_string()],
                    "",
                    fixed_now(),
                )
                .unwrap();
            let tags = ["fresh".to_string()];
            let updated = db
                .update_topic(
                    id,
                    TopicUpdate {
                        tags: Some(&tags),
                        ..Default::default()
                    },
                )
                .unwrap();
            assert_eq!(updated.tags, vec!["fresh"]);
        }

        #[test]
        fn update_missing_topic_fails() {
            let db = setup_db();
            let result = db.update_topic(42, TopicUpdate::default());
            assert!(matches!(result, Err(Error::TopicNotFound(42))));
        }

        #[test]
        fn delete_cascades_to_sessions() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            db.record_review(id, 4, 600, fixed_now()).unwrap();
            db.record_review(id, 5, 600, fixed_now() + Duration::days(1))
                .unwrap();
            assert_eq!(db.all_sessions().unwrap().len(), 2);

            db.delete_topic(id).unwrap();
            assert!(db.get_topic(id).unwrap().is_none());
            assert!(db.all_sessions().unwrap().is_empty());
        }

        #[test]
        fn delete_missing_topic_fails() {
            let db = setup_db();
            assert!(matches!(db.delete_topic(7), Err(Error::TopicNotFound(7))));
        }
    }

    mod tag_tests {
        use super::*;

        #[test]
        fn tags_are_shared_and_counted() {
            let db = setup_db();
            for title in ["A", "B"] {
                db.add_topic(
                    title,
                    "Rust",
                    Difficulty::Easy,
                    Priority::Low,
                    &["exam".to_string()],
                    "",
                    fixed_now(),
                )
                .unwrap();
            }
            let tags = db.list_tags().unwrap();
            assert_eq!(tags.len(), 1);
            assert_eq!(tags[0].name, "exam");
            assert_eq!(tags[0].topic_count, 2);
        }
    }

    mod review_tests {
        use super::*;

        #[test]
        fn review_updates_topic_and_inserts_session() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            let (topic, session) = db.record_review(id, 4, 1500, fixed_now()).unwrap();

            assert_eq!(topic.repetitions, 1);
            assert_eq!(topic.interval, 1);
            assert_eq!(topic.next_review, Some(fixed_now() + Duration::days(1)));
            assert_eq!(topic.success_rate, Some(100));
            assert_eq!(topic.study_time, 1500);
            assert_eq!(session.topic_id, Some(id));
            assert_eq!(session.quality, Some(4));
            assert_eq!(session.kind, SessionKind::New);

            // Persisted state matches what was returned.
            let stored = db.get_topic(id).unwrap().unwrap();
            assert_eq!(stored, topic);
        }

        #[test]
        fn review_of_missing_topic_fails() {
            let db = setup_db();
            let result = db.record_review(5, 4, 600, fixed_now());
            assert!(matches!(result, Err(Error::TopicNotFound(5))));
        }

        #[test]
        fn failed_validation_writes_nothing() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            let before = db.get_topic(id).unwrap().unwrap();

            assert!(db.record_review(id, 9, 600, fixed_now()).is_err());
            assert!(db.record_review(id, 4, 0, fixed_now()).is_err());

            assert_eq!(db.get_topic(id).unwrap().unwrap(), before);
            assert!(db.all_sessions().unwrap().is_empty());
        }

        #[test]
        fn second_review_is_a_review_session() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            db.record_review(id, 4, 600, fixed_now()).unwrap();
            let (_, session) = db
                .record_review(id, 5, 600, fixed_now() + Duration::days(1))
                .unwrap();
            assert_eq!(session.kind, SessionKind::Review);
        }

        #[test]
        fn repeated_perfect_recall_masters_the_topic() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            let mut now = fixed_now();
            for _ in 0..5 {
                let (topic, _) = db.record_review(id, 5, 600, now).unwrap();
                now = topic.next_review.unwrap();
            }
            let topic = db.get_topic(id).unwrap().unwrap();
            assert_eq!(topic.repetitions, 5);
            assert!(topic.completed);
            // Mastered topics drop out of the schedule.
            assert_eq!(db.schedule(now).unwrap().total(), 0);
        }

        #[test]
        fn free_session_has_no_topic_or_rating() {
            let db = setup_db();
            let session = db.record_free_session(1800, fixed_now()).unwrap();
            assert_eq!(session.topic_id, None);
            assert_eq!(session.quality, None);
            assert_eq!(db.all_sessions().unwrap().len(), 1);
        }

        #[test]
        fn free_session_duration_is_validated() {
            let db = setup_db();
            assert!(matches!(
                db.record_free_session(0, fixed_now()),
                Err(Error::InvalidDuration(0))
            ));
        }

        #[test]
        fn recent_sessions_resolve_topic_titles() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            db.record_review(id, 4, 600, fixed_now()).unwrap();
            db.record_free_session(900, fixed_now() + Duration::hours(1))
                .unwrap();

            let recent = db.recent_sessions_with_titles(5).unwrap();
            assert_eq!(recent.len(), 2);
            assert_eq!(recent[0].1, None);
            assert_eq!(recent[1].1.as_deref(), Some("Traits"));

            let limited = db.recent_sessions_with_titles(1).unwrap();
            assert_eq!(limited.len(), 1);
            assert_eq!(limited[0].1, None);
        }

        #[test]
        fn list_sessions_is_newest_first() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            db.record_review(id, 4, 600, fixed_now()).unwrap();
            db.record_review(id, 5, 600, fixed_now() + Duration::days(1))
                .unwrap();

            let sessions = db.list_sessions(None).unwrap();
            assert_eq!(sessions.len(), 2);
            assert!(sessions[0].completed_at > sessions[1].completed_at);

            let limited = db.list_sessions(Some(1)).unwrap();
            assert_eq!(limited.len(), 1);
            assert_eq!(limited[0].id, sessions[0].id);
        }
    }

    mod derived_view_tests {
        use super::*;

        #[test]
        fn schedule_buckets_across_topics() {
            let db = setup_db();
            let due = add_basic_topic(&db, "Due", "Rust");
            add_basic_topic(&db, "Fresh", "Rust");
            // One review pushes the first topic to tomorrow; four days on,
            // both it and the untouched fresh topic are overdue.
            db.record_review(due, 4, 600, fixed_now()).unwrap();

            let later = fixed_now() + Duration::days(4);
            let buckets = db.schedule(later).unwrap();
            assert_eq!(buckets.overdue.len(), 2);
        }

        #[test]
        fn report_reflects_stored_history() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            db.record_review(id, 4, 600, fixed_now()).unwrap();
            db.record_free_session(900, fixed_now()).unwrap();

            let report = db.report(fixed_now()).unwrap();
            assert_eq!(report.total_sessions, 2);
            assert_eq!(report.total_study_time, 1500);
            assert_eq!(report.topics_tracked, 1);
            assert_eq!(report.streak, 1);
        }

        #[test]
        fn next_topic_picks_a_due_topic() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            let next = db.next_topic(fixed_now()).unwrap();
            assert_eq!(next.map(|t| t.id), Some(id));
        }

        #[test]
        fn next_topic_is_none_when_nothing_is_due() {
            let db = setup_db();
            let id = add_basic_topic(&db, "Traits", "Rust");
            db.record_review(id, 5, 600, fixed_now()).unwrap();
            // The only topic is now scheduled for tomorrow.
            assert!(db.next_topic(fixed_now()).unwrap().is_none());
        }
    }
}
