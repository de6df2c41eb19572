//! Error types for famcal.

use thiserror::Error;

/// Errors that can occur in famcal operations.
#[derive(Error, Debug)]
pub enum FamcalError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(#[from] RuleError),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Reasons a stored recurrence record can't be turned into a rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("interval must be at least 1")]
    ZeroInterval,

    #[error("interval {0} is larger than {max}", max = crate::constants::MAX_RULE_INTERVAL)]
    IntervalTooLarge(u32),

    #[error("day of month {0} is outside 1..=31")]
    DayOfMonthOutOfRange(u32),

    #[error("occurrence count {0} is outside 1..={max}", max = crate::constants::MAX_RULE_COUNT)]
    CountOutOfRange(u32),

    #[error("unknown weekday code '{0}'")]
    UnknownWeekday(String),

    #[error("unknown frequency '{0}'")]
    UnknownFrequency(String),
}

/// Result type alias for famcal operations.
pub type FamcalResult<T> = Result<T, FamcalError>;
