//! Zones and their offset periods.
//!
//! A zone is an ordered sequence of [`Period`]s, authored earliest first.
//! Each period carries a base UTC offset and either a fixed saving or a
//! reference to a shared [`RuleSet`]; an optional `until` descriptor bounds
//! the period, and its absence means the period never expires. Boundaries
//! are expected to be non-decreasing in document order; the backward scan
//! in [`Zone::active_period`] relies on that to stop early.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::instant::{
    resolve_transition, validate_fields, validate_year, DaySelector, TransitionTime,
};
use crate::rule::RuleSet;

// ── Periods ─────────────────────────────────────────────────────────────────

/// How a period derives its daylight saving.
#[derive(Debug, Clone)]
pub enum Saving {
    /// A fixed saving in seconds, zero for plain standard time.
    Fixed(i64),
    /// The saving follows whichever rule of the set is active.
    Rules(Arc<RuleSet>),
}

/// Upper boundary descriptor of a period.
///
/// Shaped like a rule's transition description, but the year is always a
/// literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntilSpec {
    /// Calendar year of the boundary.
    pub year: i32,
    /// Month `1..=12`, when the boundary names one.
    pub month: Option<u32>,
    /// Day selector within `month`, when named.
    pub day: Option<DaySelector>,
    /// Clock time within the day, when named.
    pub at: Option<TransitionTime>,
}

/// One span of a zone's offset history.
#[derive(Debug, Clone)]
pub struct Period {
    /// Base UTC offset in seconds while the period is in force.
    pub utc_offset: i64,
    /// Saving source for the period.
    pub saving: Saving,
    /// Abbreviation format template; a `%s` token is replaced by rule
    /// letters.
    pub format: String,
    /// Template used instead of `format` when a daylight abbreviation is
    /// requested, when the zone provides one.
    pub dst_format: Option<String>,
    /// Exclusive upper boundary; the period is open-ended when absent.
    pub until: Option<UntilSpec>,
}

impl Period {
    /// Saving in force at `at`, in seconds.
    ///
    /// Fixed-save periods report their fixed value; rule-governed periods
    /// report the active rule's save, or zero when no rule is active.
    pub fn save_at(&self, at: DateTime<Utc>) -> i64 {
        match &self.saving {
            Saving::Fixed(save) => *save,
            Saving::Rules(rules) => rules
                .active_rule(self.utc_offset, at)
                .map_or(0, |rule| rule.save),
        }
    }

    /// The period's exclusive upper boundary as a UTC instant, resolved
    /// for a query at `at`.
    ///
    /// Open-ended periods report the maximum representable instant. A
    /// wall-clock boundary time is converted with the saving in force at
    /// the queried instant, so the boundary of a rule-governed period can
    /// shift with the season of the query.
    pub fn boundary(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let Some(until) = &self.until else {
            return DateTime::<Utc>::MAX_UTC;
        };
        let save = self.save_at(at);
        resolve_transition(
            until.year,
            until.month,
            until.day,
            until.at,
            self.utc_offset,
            save,
        )
    }

    /// Checks the period's boundary fields at construction time.
    fn validate(&self) -> Result<()> {
        if let Some(until) = &self.until {
            validate_year(until.year)?;
            validate_fields(until.month, until.day, until.at)?;
        }
        Ok(())
    }
}

// ── Zones ───────────────────────────────────────────────────────────────────

/// A named zone: an ordered sequence of offset periods.
#[derive(Debug)]
pub struct Zone {
    name: String,
    periods: Vec<Period>,
}

impl Zone {
    /// Builds a zone, validating every period boundary.
    ///
    /// # Arguments
    ///
    /// * `name` - Zone name, e.g. `Australia/Sydney`.
    /// * `periods` - Periods in document order, earliest first.
    ///
    /// # Errors
    ///
    /// Returns the first boundary validation failure found. Rules inside
    /// [`Saving::Rules`] were already validated when their set was built.
    pub fn new(name: impl Into<String>, periods: Vec<Period>) -> Result<Arc<Self>> {
        for period in &periods {
            period.validate()?;
        }
        Ok(Arc::new(Zone {
            name: name.into(),
            periods,
        }))
    }

    /// The zone's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Periods in document order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Selects the period governing `at`.
    ///
    /// Periods are scanned latest-authored first. A boundary strictly
    /// before `at` ends the scan, since earlier periods expire earlier
    /// still. Among periods whose boundary is at or after `at` the earliest
    /// boundary wins; an exact-boundary tie keeps the later-authored
    /// candidate already held.
    ///
    /// Returns `None` for a zone with no periods or one whose every period
    /// has expired.
    pub fn active_period(&self, at: DateTime<Utc>) -> Option<&Period> {
        let mut candidate: Option<(&Period, DateTime<Utc>)> = None;
        for period in self.periods.iter().rev() {
            let boundary = period.boundary(at);
            if boundary < at {
                break;
            }
            if boundary == at && candidate.is_some() {
                break;
            }
            match candidate {
                Some((_, held)) if boundary >= held => {}
                _ => candidate = Some((period, boundary)),
            }
        }
        candidate.map(|(period, _)| period)
    }

    /// Effective UTC offset at `at` in seconds: the active period's base
    /// offset plus the saving in force.
    ///
    /// A zone with no applicable period reports zero.
    pub fn effective_offset(&self, at: DateTime<Utc>) -> i64 {
        match self.active_period(at) {
            Some(period) => period.utc_offset + period.save_at(at),
            None => {
                trace!("zone {} has no applicable period at {at}", self.name);
                0
            }
        }
    }

    /// Base UTC offset at `at` in seconds, ignoring any saving.
    pub fn standard_offset(&self, at: DateTime<Utc>) -> i64 {
        self.active_period(at)
            .map_or(0, |period| period.utc_offset)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
