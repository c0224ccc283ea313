//! Transition instant resolution.
//!
//! Zoneinfo rules and period boundaries describe a moment within a year as
//! a month, a day selector inside that month, and a clock time tagged with
//! a reference frame. This module turns such a description into a concrete
//! [`DateTime<Utc>`].
//!
//! Absent pieces cascade rather than error: no month means January 1 at
//! midnight UTC (any day or time present is ignored), a month without a day
//! selector means the first of that month at midnight UTC, and a missing
//! clock time means midnight UTC with no frame correction applied. Clock
//! times of 24 hours or more, and anchor days past the end of a month,
//! spill forward into the following days.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZoneInfoError};

/// Earliest year a rule or period boundary may name.
pub const MIN_RULE_YEAR: i32 = -9999;

/// Latest year a rule or period boundary may name.
pub const MAX_RULE_YEAR: i32 = 9999;

/// Upper bound (exclusive) on the magnitude of a transition clock time.
const SECONDS_PER_WEEK: i64 = 7 * 24 * 60 * 60;

// ── Time frames ─────────────────────────────────────────────────────────────

/// Reference frame of a transition clock time.
///
/// The frame decides how much is subtracted from the naively resolved
/// date-time to reach UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    /// Already UTC; no correction.
    Universal,
    /// Local standard time; the period's base offset is subtracted.
    Standard,
    /// Local wall-clock time; base offset plus the saving in force is
    /// subtracted.
    Wall,
}

impl TimeFrame {
    /// Seconds to subtract from a naive resolution in this frame, given the
    /// owning period's base UTC offset and the saving in force.
    pub fn utc_correction(self, utc_offset: i64, save: i64) -> i64 {
        match self {
            TimeFrame::Universal => 0,
            TimeFrame::Standard => utc_offset,
            TimeFrame::Wall => utc_offset + save,
        }
    }
}

/// A clock time within a transition day, tagged with its reference frame.
///
/// The time is a signed second count from the resolved day's midnight.
/// Values of 24 hours or more spill into subsequent days, mirroring the
/// `24:00` and `25:00` spellings found in zoneinfo data; negative values
/// back into the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTime {
    /// Seconds from midnight of the resolved day. May exceed a day.
    pub seconds: i64,
    /// Frame in which `seconds` is expressed.
    pub frame: TimeFrame,
}

impl TransitionTime {
    /// A wall-clock time of `seconds` from midnight.
    pub const fn wall(seconds: i64) -> Self {
        TransitionTime {
            seconds,
            frame: TimeFrame::Wall,
        }
    }

    /// A local standard time of `seconds` from midnight.
    pub const fn standard(seconds: i64) -> Self {
        TransitionTime {
            seconds,
            frame: TimeFrame::Standard,
        }
    }

    /// A universal time of `seconds` from midnight.
    pub const fn universal(seconds: i64) -> Self {
        TransitionTime {
            seconds,
            frame: TimeFrame::Universal,
        }
    }

    /// Checks that the time's magnitude stays under a week.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.seconds.abs() >= SECONDS_PER_WEEK {
            return Err(ZoneInfoError::InvalidTransitionTime(self.seconds));
        }
        Ok(())
    }
}

// ── Day selectors ───────────────────────────────────────────────────────────

/// Selects a day within a known month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaySelector {
    /// A fixed day of the month. Days past the month's end spill into the
    /// next month.
    Day(u32),
    /// The last occurrence of a weekday in the month.
    Last(Weekday),
    /// The first occurrence of a weekday on or after a day of the month.
    OnOrAfter(Weekday, u32),
    /// The last occurrence of a weekday on or before a day of the month.
    OnOrBefore(Weekday, u32),
}

impl DaySelector {
    /// Checks that any anchor day-of-month lies in `1..=31`.
    pub(crate) fn validate(&self) -> Result<()> {
        let day = match *self {
            DaySelector::Day(day)
            | DaySelector::OnOrAfter(_, day)
            | DaySelector::OnOrBefore(_, day) => day,
            DaySelector::Last(_) => return Ok(()),
        };
        if !(1..=31).contains(&day) {
            return Err(ZoneInfoError::InvalidDaySelector(format!("{self:?}")));
        }
        Ok(())
    }

    /// Resolves the selector to a calendar date in `month` of `year`.
    fn resolve(&self, year: i32, month: u32) -> NaiveDate {
        match *self {
            DaySelector::Day(day) => date_with_spill(year, month, day),
            DaySelector::Last(weekday) => {
                let last = end_of_month(year, month);
                let back = (last.weekday().num_days_from_monday() as i64
                    - weekday.num_days_from_monday() as i64
                    + 7)
                    % 7;
                last - Duration::days(back)
            }
            DaySelector::OnOrAfter(weekday, day) => {
                let anchor = date_with_spill(year, month, day);
                let forward = (weekday.num_days_from_monday() as i64
                    - anchor.weekday().num_days_from_monday() as i64
                    + 7)
                    % 7;
                anchor + Duration::days(forward)
            }
            DaySelector::OnOrBefore(weekday, day) => {
                let anchor = date_with_spill(year, month, day);
                let back = (anchor.weekday().num_days_from_monday() as i64
                    - weekday.num_days_from_monday() as i64
                    + 7)
                    % 7;
                anchor - Duration::days(back)
            }
        }
    }
}

/// First day of `month` in `year`. The month must already be validated.
pub(crate) fn month_start(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("validated month has a first day")
}

/// Last day of `month` in `year`.
fn end_of_month(year: i32, month: u32) -> NaiveDate {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.expect("validated month has a successor") - Duration::days(1)
}

/// `year`/`month`/`day` with days past the month's end carried forward.
fn date_with_spill(year: i32, month: u32, day: u32) -> NaiveDate {
    month_start(year, month) + Duration::days(i64::from(day) - 1)
}

// ── Transition resolution ───────────────────────────────────────────────────

/// Resolves a transition description to a concrete UTC instant.
///
/// The cascade for absent pieces follows zoneinfo conventions:
///
/// * no `month`: January 1 of `year` at midnight UTC, ignoring `day` and
///   `time` even when supplied;
/// * `month` without `day`: the first of the month at midnight UTC,
///   ignoring `time`;
/// * no `time`: midnight UTC, with no frame correction applied.
///
/// `utc_offset` and `save` feed the frame correction of `time`; they do not
/// affect the midnight-UTC defaults.
///
/// # Arguments
///
/// * `year` - Calendar year of the transition.
/// * `month` - Month `1..=12`, when the description names one.
/// * `day` - Day selector within `month`, when named.
/// * `time` - Clock time within the selected day, when named.
/// * `utc_offset` - Base UTC offset of the governing period, in seconds.
/// * `save` - Daylight saving in force, in seconds.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc, Weekday};
/// use zoneinfo_engine::{resolve_transition, DaySelector, TransitionTime};
///
/// // First Sunday of April 2010 at 03:00 wall clock, +10h base, +1h save.
/// let at = resolve_transition(
///     2010,
///     Some(4),
///     Some(DaySelector::OnOrAfter(Weekday::Sun, 1)),
///     Some(TransitionTime::wall(3 * 3600)),
///     10 * 3600,
///     3600,
/// );
/// assert_eq!(at, Utc.with_ymd_and_hms(2010, 4, 3, 16, 0, 0).unwrap());
/// ```
pub fn resolve_transition(
    year: i32,
    month: Option<u32>,
    day: Option<DaySelector>,
    time: Option<TransitionTime>,
    utc_offset: i64,
    save: i64,
) -> DateTime<Utc> {
    let (month, day, time) = match (month, day) {
        (Some(month), Some(day)) => (month, Some(day), time),
        (Some(month), None) => (month, None, None),
        (None, _) => (1, None, None),
    };

    let date = match day {
        Some(selector) => selector.resolve(year, month),
        None => month_start(year, month),
    };
    let midnight = date.and_time(NaiveTime::MIN).and_utc();

    match time {
        Some(time) => {
            midnight + Duration::seconds(time.seconds)
                - Duration::seconds(time.frame.utc_correction(utc_offset, save))
        }
        None => midnight,
    }
}

// ── Validation helpers ──────────────────────────────────────────────────────

/// Checks that a literal year lies within the supported year domain.
pub(crate) fn validate_year(year: i32) -> Result<()> {
    if !(MIN_RULE_YEAR..=MAX_RULE_YEAR).contains(&year) {
        return Err(ZoneInfoError::YearOutOfRange(year));
    }
    Ok(())
}

/// Checks the optional month/day/time triple shared by rules and period
/// boundaries.
pub(crate) fn validate_fields(
    month: Option<u32>,
    day: Option<DaySelector>,
    time: Option<TransitionTime>,
) -> Result<()> {
    if let Some(month) = month {
        if !(1..=12).contains(&month) {
            return Err(ZoneInfoError::InvalidMonth(month));
        }
    }
    if let Some(day) = day {
        day.validate()?;
    }
    if let Some(time) = time {
        time.validate()?;
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
