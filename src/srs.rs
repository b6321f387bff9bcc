use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MIN_EASINESS: f64 = 1.3;
pub const INITIAL_EASINESS: f64 = 2.5;

const FAILURE_EASINESS_PENALTY: f64 = 0.2;

// How easiness reacts to a failed review (quality < 3). Both lineages
// of SM-2 exist in the wild; the decaying variant is the default here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    #[default]
    DecayEasiness,
    KeepEasiness,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Review {
    pub easiness_factor: f64,
    pub interval: i64,
    pub repetitions: i64,
    pub next_review: DateTime<Utc>,
}

pub fn compute_next_review(
    quality: u8,
    easiness_factor: f64,
    interval: i64,
    repetitions: i64,
    now: DateTime<Utc>,
) -> Result<Review> {
    compute_next_review_with(
        FailurePolicy::default(),
        quality,
        easiness_factor,
        interval,
        repetitions,
        now,
    )
}

pub fn compute_next_review_with(
    policy: FailurePolicy,
    quality: u8,
    easiness_factor: f64,
    interval: i64,
    repetitions: i64,
    now: DateTime<Utc>,
) -> Result<Review> {
    if quality > 5 {
        return Err(Error::InvalidQuality(quality as i64));
    }
    if interval < 0 || repetitions < 0 || !easiness_factor.is_finite() || easiness_factor < 0.0 {
        return Err(Error::InconsistentState(format!(
            "ef={} interval={} repetitions={}",
            easiness_factor, interval, repetitions
        )));
    }

    if quality < 3 {
        // Forgotten: the review chain restarts tomorrow.
        let new_ef = match policy {
            FailurePolicy::DecayEasiness => {
                (easiness_factor - FAILURE_EASINESS_PENALTY).max(MIN_EASINESS)
            }
            FailurePolicy::KeepEasiness => easiness_factor,
        };
        return Ok(Review {
            easiness_factor: new_ef,
            interval: 1,
            repetitions: 0,
            next_review: now + Duration::days(1),
        });
    }

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
    let q = quality as f64;
    let new_ef = (easiness_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MIN_EASINESS);

    let new_interval = match repetitions {
        0 => 1,
        1 => 6,
        _ => (interval as f64 * new_ef).round() as i64,
    };

    Ok(Review {
        easiness_factor: new_ef,
        interval: new_interval,
        repetitions: repetitions + 1,
        next_review: now + Duration::days(new_interval),
    })
}
