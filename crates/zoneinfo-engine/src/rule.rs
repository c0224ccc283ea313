//! Recurring transition rules.
//!
//! A rule describes a yearly offset transition: the month, day selector,
//! and clock time it fires at, the span of years it is active over, the
//! saving it introduces, and the abbreviation letters it contributes to
//! period format templates. A [`RuleSet`] is a named, ordered collection of
//! rules; zones reference sets by sharing the same [`Arc`], which is what
//! makes rule identity comparisons across zones meaningful.
//!
//! Resolution walks a two-year candidate window and picks the rule with the
//! latest transition at or before the queried instant, so a query in July
//! still sees the transition that fired in April, and a query in January
//! sees the previous year's final transition.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZoneInfoError};
use crate::instant::{
    resolve_transition, validate_fields, validate_year, DaySelector, TransitionTime,
    MAX_RULE_YEAR, MIN_RULE_YEAR,
};

// ── Year spans ──────────────────────────────────────────────────────────────

/// Starting year of a rule's active span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearSpec {
    /// The earliest supported year.
    Min,
    /// The latest supported year.
    Max,
    /// A literal year.
    Year(i32),
}

/// Final year of a rule's active span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToYear {
    /// The earliest supported year.
    Min,
    /// The latest supported year.
    Max,
    /// A literal year.
    Year(i32),
    /// The span covers exactly the starting year.
    Only,
}

/// Restricts which years within a rule's span the rule fires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YearKind {
    /// Every year in the span.
    #[default]
    Any,
    /// Even-numbered years only.
    Even,
    /// Odd-numbered years only.
    Odd,
    /// Years divisible by four, the US presidential election cadence.
    UsPresidential,
    /// Years not divisible by four.
    NonUsPresidential,
}

impl YearKind {
    /// Whether the kind admits `year`.
    pub fn matches(self, year: i32) -> bool {
        match self {
            YearKind::Any => true,
            YearKind::Even => year % 2 == 0,
            YearKind::Odd => year % 2 != 0,
            YearKind::UsPresidential => year % 4 == 0,
            YearKind::NonUsPresidential => year % 4 != 0,
        }
    }
}

// ── Rules ───────────────────────────────────────────────────────────────────

/// A single recurring transition rule.
///
/// Field values mirror the source data; absent month, day, or time fall
/// back through the cascade described in [`resolve_transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// First year of the active span.
    pub from: YearSpec,
    /// Last year of the active span.
    pub to: ToYear,
    /// Year filter within the span.
    pub year_kind: YearKind,
    /// Month of the transition, `1..=12`, when the rule names one.
    pub month: Option<u32>,
    /// Day selector within `month`, when named.
    pub day: Option<DaySelector>,
    /// Clock time of the transition, when named.
    pub at: Option<TransitionTime>,
    /// Saving the rule introduces, in seconds. Zero returns the zone to
    /// standard time.
    pub save: i64,
    /// Abbreviation fragment substituted into period format templates.
    pub letters: Option<String>,
}

impl Rule {
    /// First calendar year the rule can fire in.
    pub fn start_year(&self) -> i32 {
        match self.from {
            YearSpec::Min => MIN_RULE_YEAR,
            YearSpec::Max => MAX_RULE_YEAR,
            YearSpec::Year(year) => year,
        }
    }

    /// Last calendar year the rule can fire in.
    pub fn end_year(&self) -> i32 {
        match self.to {
            ToYear::Min => MIN_RULE_YEAR,
            ToYear::Max => MAX_RULE_YEAR,
            ToYear::Year(year) => year,
            ToYear::Only => self.start_year(),
        }
    }

    /// The rule's transition instant in `year`, under a period whose base
    /// offset is `utc_offset`.
    ///
    /// A wall-clock transition time is converted with the rule's own
    /// saving, since the rule states its time in the clock it leaves in
    /// force.
    pub fn trigger_in(&self, year: i32, utc_offset: i64) -> DateTime<Utc> {
        resolve_transition(year, self.month, self.day, self.at, utc_offset, self.save)
    }

    /// Checks the rule's fields at construction time.
    fn validate(&self) -> Result<()> {
        validate_fields(self.month, self.day, self.at)?;
        if let YearSpec::Year(year) = self.from {
            validate_year(year)?;
        }
        if let ToYear::Year(year) = self.to {
            validate_year(year)?;
        }
        // Bounds are compared resolved; a literal start over `ToYear::Min`
        // is as reversed as a literal pair. `Only` resolves to the start
        // year and always passes.
        if self.end_year() < self.start_year() {
            return Err(ZoneInfoError::InvalidYearRange {
                from: self.start_year(),
                to: self.end_year(),
            });
        }
        Ok(())
    }
}

// ── Rule sets ───────────────────────────────────────────────────────────────

/// A named, ordered set of rules.
///
/// Order is the document order of the source data; both the matcher's scan
/// and its tie-breaking depend on it. Sets are handed out as [`Arc`]s so
/// that every zone referencing the same set shares the identical rules.
#[derive(Debug)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Builds a rule set, validating every rule.
    ///
    /// # Arguments
    ///
    /// * `name` - Name the set is referenced by from zone periods.
    /// * `rules` - Rules in document order.
    ///
    /// # Errors
    ///
    /// Returns the first field validation failure found.
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Result<Arc<Self>> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Arc::new(RuleSet {
            name: name.into(),
            rules,
        }))
    }

    /// Name of the set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in document order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Finds the rule governing `at` under a period whose base offset is
    /// `utc_offset`.
    ///
    /// Candidate transitions are collected from the year of `at` and the
    /// year before, each rule's trigger normalized to the candidate year.
    /// The governing rule is the one with the latest trigger at or before
    /// `at`, an exact trigger match winning outright. A rule whose
    /// final-year transition has already passed contributes nothing and
    /// cuts the scan short.
    ///
    /// Returns `None` before the set's first transition and after its last.
    pub fn active_rule(&self, utc_offset: i64, at: DateTime<Utc>) -> Option<&Rule> {
        let year = at.year();
        let from_year = if year > MIN_RULE_YEAR { year - 1 } else { year };
        let triggers = self.candidate_triggers(from_year, year, utc_offset, at);

        let index = match triggers.get(&at) {
            Some(&index) => Some(index),
            None => triggers.range(..at).next_back().map(|(_, &index)| index),
        };
        if index.is_none() {
            trace!("rule set {} has no active rule at {at}", self.name);
        }
        index.map(|index| &self.rules[index])
    }

    /// Collects normalized transition triggers for the candidate window
    /// `from_year..=to_year`, keyed by trigger instant.
    ///
    /// Each year is scanned in reverse document order. When two rules fire
    /// at the same instant the insert of the later-scanned rule overwrites
    /// the earlier, leaving the rule authored first in the map.
    fn candidate_triggers(
        &self,
        from_year: i32,
        to_year: i32,
        utc_offset: i64,
        limit: DateTime<Utc>,
    ) -> BTreeMap<DateTime<Utc>, usize> {
        let mut triggers = BTreeMap::new();
        for year in from_year..=to_year {
            for (index, rule) in self.rules.iter().enumerate().rev() {
                if !rule.year_kind.matches(year) {
                    continue;
                }
                // A rule whose final transition has passed ends the scan
                // for this year.
                if rule.trigger_in(rule.end_year(), utc_offset) <= limit {
                    break;
                }
                if rule.trigger_in(rule.start_year(), utc_offset) <= limit {
                    triggers.insert(rule.trigger_in(year, utc_offset), index);
                }
            }
        }
        triggers
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
