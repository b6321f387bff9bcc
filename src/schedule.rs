use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::Topic;

// Topics partitioned by review urgency, each bucket sorted ascending
// by next_review.
#[derive(Debug, Default, Serialize)]
pub struct DueBuckets {
    pub overdue: Vec<Topic>,
    pub today: Vec<Topic>,
    pub tomorrow: Vec<Topic>,
    pub this_week: Vec<Topic>,
    pub later: Vec<Topic>,
}

impl DueBuckets {
    pub fn total(&self) -> usize {
        self.overdue.len()
            + self.today.len()
            + self.tomorrow.len()
            + self.this_week.len()
            + self.later.len()
    }

    // Overdue plus due today.
    pub fn due_now(&self) -> impl Iterator<Item = &Topic> {
        self.overdue.iter().chain(self.today.iter())
    }
}

// Buckets by the calendar day the next review falls on. Completed
// topics and topics without a scheduled review are excluded.
pub fn classify(topics: &[Topic], now: DateTime<Utc>) -> DueBuckets {
    let today = now.date_naive();
    let tomorrow = today + Duration::days(1);
    let week_end = today + Duration::days(7);

    let mut buckets = DueBuckets::default();
    for topic in topics {
        if topic.completed {
            continue;
        }
        let next = match topic.next_review {
            Some(next) => next,
            None => continue,
        };
        let day = next.date_naive();
        let bucket = if day < today {
            &mut buckets.overdue
        } else if day == today {
            &mut buckets.today
        } else if day == tomorrow {
            &mut buckets.tomorrow
        } else if day <= week_end {
            &mut buckets.this_week
        } else {
            &mut buckets.later
        };
        bucket.push(topic.clone());
    }

    for bucket in [
        &mut buckets.overdue,
        &mut buckets.today,
        &mut buckets.tomorrow,
        &mut buckets.this_week,
        &mut buckets.later,
    ] {
        bucket.sort_by_key(|t| t.next_review);
    }

    buckets
}

// "3 days overdue", "due today", "in 5 days", ...
pub fn relative_due_label(topic: &Topic, now: DateTime<Utc>) -> String {
    let next = match topic.next_review {
        Some(next) => next,
        None => return "not scheduled".to_string(),
    };
    let days = (next.date_naive() - now.date_naive()).num_days();
    match days {
        d if d < -1 => format!("{} days overdue", -d),
        -1 => "1 day overdue".to_string(),
        0 => "due today".to_string(),
        1 => "due tomorrow".to_string(),
        d => format!("in {} days", d),
    }
}
