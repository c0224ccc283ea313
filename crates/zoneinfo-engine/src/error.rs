//! Error types for the zoneinfo-engine crate.

use thiserror::Error;

/// Errors that can occur while loading or querying zone data.
///
/// Resolution itself is total: once rule sets, zones, and aliases have been
/// constructed, every point-in-time query succeeds. These errors surface
/// malformed data at construction time and unknown names at registration
/// time.
#[derive(Error, Debug)]
pub enum ZoneInfoError {
    /// A month number outside `1..=12`.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// A day selector anchored to a day-of-month outside `1..=31`.
    #[error("Invalid day selector: {0}")]
    InvalidDaySelector(String),

    /// A transition time whose magnitude reaches a full week.
    #[error("Invalid transition time: {0} seconds")]
    InvalidTransitionTime(i64),

    /// A literal year outside the supported year domain.
    #[error("Year out of range: {0}")]
    YearOutOfRange(i32),

    /// A rule whose final year precedes its starting year.
    #[error("Invalid year range: {from}..={to}")]
    InvalidYearRange {
        /// Resolved first year of the span.
        from: i32,
        /// Resolved final year, earlier than `from`.
        to: i32,
    },

    /// An alias target that names no registered zone.
    #[error("Unknown zone: {0}")]
    UnknownZone(String),
}

/// Convenience result type for fallible zoneinfo operations.
pub type Result<T> = std::result::Result<T, ZoneInfoError>;
