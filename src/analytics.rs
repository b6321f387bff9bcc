use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Session, Topic};
use crate::srs::MIN_EASINESS;

// Trailing calendar days kept in the daily rollup.
pub const DAILY_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStat {
    pub day: NaiveDate,
    pub sessions: i64,
    pub study_time: i64,
    pub topics: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekStat {
    // Monday of the ISO week.
    pub week_start: NaiveDate,
    pub sessions: i64,
    pub study_time: i64,
    pub topics: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStat {
    // "YYYY-MM"
    pub month: String,
    pub sessions: i64,
    pub study_time: i64,
    pub topics: i64,
}

// Each figure is None when its denominator is zero, rendered "N/A".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub average_score: Option<i64>,
    pub completion_rate: Option<i64>,
    pub daily_average: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub streak: i64,
    pub total_sessions: i64,
    pub total_study_time: i64,
    pub topics_tracked: i64,
    pub topics_completed: i64,
    pub daily: Vec<DayStat>,
    pub weekly: Vec<WeekStat>,
    pub monthly: Vec<MonthStat>,
    pub performance: Performance,
}

pub fn aggregate(topics: &[Topic], sessions: &[Session], now: DateTime<Utc>) -> Report {
    Report {
        streak: study_streak(sessions, now),
        total_sessions: sessions.len() as i64,
        total_study_time: sessions.iter().map(|s| s.duration).sum(),
        topics_tracked: topics.len() as i64,
        topics_completed: topics.iter().filter(|t| t.completed).count() as i64,
        daily: daily_rollup(sessions, now),
        weekly: weekly_rollup(sessions),
        monthly: monthly_rollup(sessions),
        performance: performance(topics, sessions),
    }
}

// Trailing run of calendar days with at least one session, walked back
// from today. An empty today does not break a run reaching yesterday.
pub fn study_streak(sessions: &[Session], now: DateTime<Utc>) -> i64 {
    let days: HashSet<NaiveDate> = sessions.iter().map(|s| s.completed_at.date_naive()).collect();
    let today = now.date_naive();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

pub fn retention_rate(topic: &Topic, sessions: &[Session]) -> i64 {
    let count = sessions
        .iter()
        .filter(|s| s.topic_id == Some(topic.id))
        .count() as i64;
    if count == 0 {
        return 0;
    }
    (topic.repetitions as f64 / count as f64 * 100.0).round() as i64
}

// 0..=100: repetitions contribute up to 50, easiness above the floor up
// to 25, and reviews overdue relative to their interval erode the total.
pub fn knowledge_strength(topic: &Topic, now: DateTime<Utc>) -> i64 {
    if topic.repetitions == 0 {
        return 0;
    }

    let rep_strength = (topic.repetitions as f64 * 10.0).min(50.0);
    let ease_strength = ((topic.easiness_factor - MIN_EASINESS) * 20.0).min(25.0);

    let mut penalty = 0.0;
    if let Some(last) = topic.last_reviewed {
        if topic.interval > 0 {
            let days_since = (now - last).num_days() as f64;
            let overdue_ratio = ((days_since - topic.interval as f64) / topic.interval as f64)
                .max(0.0);
            penalty = overdue_ratio * 0.3 * 25.0;
        }
    }

    (rep_strength + ease_strength - penalty).clamp(0.0, 100.0).round() as i64
}

// The last DAILY_WINDOW calendar days ending today, zero-filled.
pub fn daily_rollup(sessions: &[Session], now: DateTime<Utc>) -> Vec<DayStat> {
    let today = now.date_naive();
    let window_start = today - Duration::days(DAILY_WINDOW as i64 - 1);

    let mut by_day: BTreeMap<NaiveDate, (i64, i64, HashSet<i64>)> = BTreeMap::new();
    for session in sessions {
        let day = session.completed_at.date_naive();
        if day < window_start || day > today {
            continue;
        }
        let entry = by_day.entry(day).or_default();
        entry.0 += 1;
        entry.1 += session.duration;
        if let Some(id) = session.topic_id {
            entry.2.insert(id);
        }
    }

    (0..DAILY_WINDOW as i64)
        .map(|offset| {
            let day = window_start + Duration::days(offset);
            match by_day.get(&day) {
                Some((sessions, study_time, topics)) => DayStat {
                    day,
                    sessions: *sessions,
                    study_time: *study_time,
                    topics: topics.len() as i64,
                },
                None => DayStat {
                    day,
                    sessions: 0,
                    study_time: 0,
                    topics: 0,
                },
            }
        })
        .collect()
}

pub fn weekly_rollup(sessions: &[Session]) -> Vec<WeekStat> {
    let mut by_week: BTreeMap<NaiveDate, (i64, i64, HashSet<i64>)> = BTreeMap::new();
    for session in sessions {
        let day = session.completed_at.date_naive();
        let week_start = day - Duration::days(day.weekday().num_days_from_monday() as i64);
        let entry = by_week.entry(week_start).or_default();
        entry.0 += 1;
        entry.1 += session.duration;
        if let Some(id) = session.topic_id {
            entry.2.insert(id);
        }
    }
    by_week
        .into_iter()
        .map(|(week_start, (sessions, study_time, topics))| WeekStat {
            week_start,
            sessions,
            study_time,
            topics: topics.len() as i64,
        })
        .collect()
}

pub fn monthly_rollup(sessions: &[Session]) -> Vec<MonthStat> {
    let mut by_month: BTreeMap<String, (i64, i64, HashSet<i64>)> = BTreeMap::new();
    for session in sessions {
        let day = session.completed_at.date_naive();
        let month = format!("{:04}-{:02}", day.year(), day.month());
        let entry = by_month.entry(month).or_default();
        entry.0 += 1;
        entry.1 += session.duration;
        if let Some(id) = session.topic_id {
            entry.2.insert(id);
        }
    }
    by_month
        .into_iter()
        .map(|(month, (sessions, study_time, topics))| MonthStat {
            month,
            sessions,
            study_time,
            topics: topics.len() as i64,
        })
        .collect()
}

pub fn performance(topics: &[Topic], sessions: &[Session]) -> Performance {
    let qualities: Vec<u8> = sessions.iter().filter_map(|s| s.quality).collect();
    let average_score = if qualities.is_empty() {
        None
    } else {
        let avg = qualities.iter().map(|&q| q as f64).sum::<f64>() / qualities.len() as f64;
        Some((avg * 20.0).round() as i64)
    };

    let completion_rate = if topics.is_empty() {
        None
    } else {
        let done = topics.iter().filter(|t| t.completed).count();
        Some((done as f64 / topics.len() as f64 * 100.0).round() as i64)
    };

    let study_days: HashSet<NaiveDate> =
        sessions.iter().map(|s| s.completed_at.date_naive()).collect();
    let daily_average = if study_days.is_empty() {
        None
    } else {
        let avg = sessions.len() as f64 / study_days.len() as f64;
        Some((avg * 10.0).round() / 10.0)
    };

    Performance {
        average_score,
        completion_rate,
        daily_average,
    }
}
