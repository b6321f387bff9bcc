use thiserror::Error;

/// Failures surfaced by the scheduling core and the store.
///
/// None of these are retried internally; they indicate caller misuse
/// (bad rating, unknown topic) or a corrupted row, and are propagated
/// to the CLI/TUI for display.
#[derive(Debug, Error)]
pub enum Error {
    #[error("quality rating must be an integer between 0 and 5, got {0}")]
    InvalidQuality(i64),

    #[error("session duration must be positive, got {0}s")]
    InvalidDuration(i64),

    #[error("topic {0} not found")]
    TopicNotFound(i64),

    #[error("inconsistent memory state: {0}")]
    InconsistentState(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_quality_names_the_value() {
        let e = Error::InvalidQuality(7);
        assert!(e.to_string().contains('7'));
    }

    #[test]
    fn storage_errors_convert() {
        let e: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(e, Error::Storage(_)));
    }
}
