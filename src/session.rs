use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{NewSession, Session, SessionKind, Topic};
use crate::srs::{self, FailurePolicy};

// A perfect recall at or past this repetition count masters the topic.
pub const MASTERY_REPETITIONS: i64 = 5;

pub fn complete_session(
    topic: &mut Topic,
    quality: u8,
    elapsed_secs: i64,
    history: &[Session],
    now: DateTime<Utc>,
) -> Result<NewSession> {
    complete_session_with(FailurePolicy::default(), topic, quality, elapsed_secs, history, now)
}

// Applies one rated session to the topic and returns the record to
// persist. `history` is the topic's prior sessions; the mastery flag
// only ever flips from false to true.
pub fn complete_session_with(
    policy: FailurePolicy,
    topic: &mut Topic,
    quality: u8,
    elapsed_secs: i64,
    history: &[Session],
    now: DateTime<Utc>,
) -> Result<NewSession> {
    if elapsed_secs <= 0 {
        return Err(Error::InvalidDuration(elapsed_secs));
    }

    let kind = if topic.repetitions == 0 {
        SessionKind::New
    } else {
        SessionKind::Review
    };

    let review = srs::compute_next_review_with(
        policy,
        quality,
        topic.easiness_factor,
        topic.interval,
        topic.repetitions,
        now,
    )?;

    let prior_successes = history
        .iter()
        .filter(|s| s.quality.map_or(false, |q| q >= 3))
        .count() as i64;
    let prior_rated = history.iter().filter(|s| s.quality.is_some()).count() as i64;
    let successes = prior_successes + i64::from(quality >= 3);
    let rated = prior_rated + 1;
    topic.success_rate = Some((successes as f64 / rated as f64 * 100.0).round() as i64);

    topic.easiness_factor = review.easiness_factor;
    topic.interval = review.interval;
    topic.repetitions = review.repetitions;
    topic.next_review = Some(review.next_review);
    topic.last_reviewed = Some(now);
    topic.total_reviews += 1;
    topic.study_time += elapsed_secs;

    if quality == 5 && topic.repetitions >= MASTERY_REPETITIONS {
        topic.completed = true;
    }

    Ok(NewSession {
        topic_id: Some(topic.id),
        duration: elapsed_secs,
        quality: Some(quality),
        kind,
        completed_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Priority};
    use crate::srs::INITIAL_EASINESS;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn fresh_topic() -> Topic {
        Topic {
            id: 1,
            title: "Ownership and borrowing".to_string(),
            subject: "Rust".to_string(),
            difficulty: Difficulty::Medium,
            priority: Priority::Medium,
            tags: vec![],
            notes: String::new(),
            easiness_factor: INITIAL_EASINESS,
            interval: 0,
            repetitions: 0,
            next_review: Some(fixed_now()),
            last_reviewed: None,
            total_reviews: 0,
            success_rate: None,
            study_time: 0,
            completed: false,
            created_at: fixed_now(),
        }
    }

    fn rated_session(id: i64, quality: u8) -> Session {
        Session {
            id,
            topic_id: Some(1),
            duration: 600,
            quality: Some(quality),
            kind: SessionKind::Review,
            completed_at: fixed_now(),
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn zero_duration_is_rejected() {
            let mut topic = fresh_topic();
            let result = complete_session(&mut topic, 4, 0, &[], fixed_now());
            assert!(matches!(result, Err(Error::InvalidDuration(0))));
        }

        #[test]
        fn negative_duration_is_rejected() {
            let mut topic = fresh_topic();
            let result = complete_session(&mut topic, 4, -30, &[], fixed_now());
            assert!(matches!(result, Err(Error::InvalidDuration(-30))));
        }

        #[test]
        fn rejected_session_leaves_topic_untouched() {
            let mut topic = fresh_topic();
            let before = topic.clone();
            let _ = complete_session(&mut topic, 4, 0, &[], fixed_now());
            assert_eq!(topic, before);
        }

        #[test]
        fn invalid_quality_leaves_topic_untouched() {
            let mut topic = fresh_topic();
            let before = topic.clone();
            let result = complete_session(&mut topic, 9, 600, &[], fixed_now());
            assert!(matches!(result, Err(Error::InvalidQuality(9))));
            assert_eq!(topic, before);
        }
    }

    mod session_kind_tests {
        use super::*;

        #[test]
        fn first_study_is_new() {
            let mut topic = fresh_topic();
            let s = complete_session(&mut topic, 4, 600, &[], fixed_now()).unwrap();
            assert_eq!(s.kind, SessionKind::New);
        }

        #[test]
        fn subsequent_study_is_review() {
            let mut topic = fresh_topic();
            topic.repetitions = 2;
            topic.interval = 6;
            let s = complete_session(&mut topic, 4, 600, &[], fixed_now()).unwrap();
            assert_eq!(s.kind, SessionKind::Review);
        }

        #[test]
        fn study_after_failure_reset_is_new_again() {
            // A failure resets repetitions to 0, so the next session
            // counts as studying the topic afresh.
            let mut topic = fresh_topic();
            topic.repetitions = 3;
            topic.interval = 15;
            complete_session(&mut topic, 1, 600, &[], fixed_now()).unwrap();
            assert_eq!(topic.repetitions, 0);
            let s = complete_session(&mut topic, 4, 600, &[], fixed_now()).unwrap();
            assert_eq!(s.kind, SessionKind::New);
        }
    }

    mod bookkeeping_tests {
        use super::*;

        #[test]
        fn updates_review_bookkeeping() {
            let mut topic = fresh_topic();
            let s = complete_session(&mut topic, 4, 1500, &[], fixed_now()).unwrap();
            assert_eq!(topic.last_reviewed, Some(fixed_now()));
            assert_eq!(topic.total_reviews, 1);
            assert_eq!(topic.study_time, 1500);
            assert_eq!(topic.repetitions, 1);
            assert_eq!(topic.interval, 1);
            assert_eq!(s.topic_id, Some(1));
            assert_eq!(s.duration, 1500);
            assert_eq!(s.quality, Some(4));
            assert_eq!(s.completed_at, fixed_now());
        }

        #[test]
        fn study_time_accumulates() {
            let mut topic = fresh_topic();
            complete_session(&mut topic, 4, 600, &[], fixed_now()).unwrap();
            let history = [rated_session(1, 4)];
            complete_session(&mut topic, 5, 900, &history, fixed_now()).unwrap();
            assert_eq!(topic.study_time, 1500);
            assert_eq!(topic.total_reviews, 2);
        }

        #[test]
        fn success_rate_counts_this_session() {
            let mut topic = fresh_topic();
            complete_session(&mut topic, 4, 600, &[], fixed_now()).unwrap();
            assert_eq!(topic.success_rate, Some(100));
        }

        #[test]
        fn success_rate_over_mixed_history() {
            // Two successes and one failure out of three rated sessions.
            let mut topic = fresh_topic();
            topic.repetitions = 2;
            topic.interval = 6;
            let history = [rated_session(1, 4), rated_session(2, 5)];
            complete_session(&mut topic, 1, 600, &history, fixed_now()).unwrap();
            assert_eq!(topic.success_rate, Some(67));
        }

        #[test]
        fn unrated_history_sessions_are_ignored() {
            let mut topic = fresh_topic();
            let free = Session {
                id: 3,
                topic_id: Some(1),
                duration: 1200,
                quality: None,
                kind: SessionKind::New,
                completed_at: fixed_now(),
            };
            let history = [rated_session(1, 4), free];
            complete_session(&mut topic, 2, 600, &history, fixed_now()).unwrap();
            assert_eq!(topic.success_rate, Some(50));
        }
    }

    mod mastery_tests {
        use super::*;

        #[test]
        fn perfect_recall_at_five_repetitions_completes() {
            let mut topic = fresh_topic();
            topic.repetitions = 4;
            topic.interval = 30;
            topic.easiness_factor = 2.5;
            complete_session(&mut topic, 5, 600, &[], fixed_now()).unwrap();
            assert_eq!(topic.repetitions, 5);
            assert!(topic.completed);
        }

        #[test]
        fn perfect_recall_below_threshold_does_not_complete() {
            let mut topic = fresh_topic();
            topic.repetitions = 2;
            topic.interval = 6;
            complete_session(&mut topic, 5, 600, &[], fixed_now()).unwrap();
            assert_eq!(topic.repetitions, 3);
            assert!(!topic.completed);
        }

        #[test]
        fn high_repetitions_without_perfect_recall_does_not_complete() {
            let mut topic = fresh_topic();
            topic.repetitions = 7;
            topic.interval = 60;
            complete_session(&mut topic, 4, 600, &[], fixed_now()).unwrap();
            assert!(!topic.completed);
        }

        #[test]
        fn completion_is_never_revoked() {
            let mut topic = fresh_topic();
            topic.completed = true;
            topic.repetitions = 6;
            topic.interval = 60;
            complete_session(&mut topic, 1, 600, &[], fixed_now()).unwrap();
            assert!(topic.completed);
        }
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn keep_easiness_policy_flows_through() {
            let mut topic = fresh_topic();
            topic.repetitions = 3;
            topic.interval = 15;
            topic.easiness_factor = 2.4;
            complete_session_with(
                FailurePolicy::KeepEasiness,
                &mut topic,
                1,
                600,
                &[],
                fixed_now(),
            )
            .unwrap();
            assert!((topic.easiness_factor - 2.4).abs() < 1e-9);
            assert_eq!(topic.repetitions, 0);
        }
    }
}
