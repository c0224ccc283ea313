//! Per-zone query handles.
//!
//! A [`ZoneHandle`] wraps a registry entry and answers every point-in-time
//! query: effective and standard offsets, daylight state, abbreviations,
//! and governing-rule identity. Handles created from aliases keep the alias
//! name but answer with the target zone's data, however deep the chain.

use std::ptr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::ZoneEntry;
use crate::rule::{Rule, RuleSet};
use crate::zone::{Period, Saving, Zone};

/// A zone's complete offset picture at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetInfo {
    /// Effective UTC offset in seconds, saving included.
    pub offset_seconds: i64,
    /// Daylight saving portion of the offset, in seconds.
    pub dst_seconds: i64,
    /// Whether daylight saving is in force.
    pub daylight: bool,
    /// Abbreviation for the instant, when one can be derived.
    pub abbreviation: Option<String>,
}

/// A query handle over a registry entry.
#[derive(Debug, Clone)]
pub struct ZoneHandle {
    entry: ZoneEntry,
    zone: Arc<Zone>,
}

impl ZoneHandle {
    /// Wraps a registry entry, resolving any alias chain once up front.
    pub(crate) fn new(entry: ZoneEntry) -> Self {
        let zone = entry.zone();
        ZoneHandle { entry, zone }
    }

    /// The name this handle was looked up under. Aliases keep their own
    /// name.
    pub fn name(&self) -> &str {
        self.entry.name()
    }

    /// The concrete zone answering this handle's queries.
    pub fn zone(&self) -> &Arc<Zone> {
        &self.zone
    }

    /// Name of the concrete zone, after following aliases.
    pub fn zone_name(&self) -> &str {
        self.zone.name()
    }

    /// The zone's periods in document order.
    pub fn periods(&self) -> &[Period] {
        self.zone.periods()
    }

    /// Effective UTC offset in seconds at `at`, saving included.
    pub fn offset_at(&self, at: DateTime<Utc>) -> i64 {
        self.zone.effective_offset(at)
    }

    /// Base UTC offset in seconds at `at`, ignoring any saving.
    pub fn standard_offset_at(&self, at: DateTime<Utc>) -> i64 {
        self.zone.standard_offset(at)
    }

    /// The recurring rule governing `at`, when the active period is
    /// rule-governed.
    pub fn active_rule_at(&self, at: DateTime<Utc>) -> Option<&Rule> {
        let period = self.zone.active_period(at)?;
        match &period.saving {
            Saving::Rules(rules) => rules.active_rule(period.utc_offset, at),
            Saving::Fixed(_) => None,
        }
    }

    /// Daylight saving introduced by the governing rule at `at`, in
    /// seconds.
    ///
    /// Zero when the active period is fixed-save, whatever its fixed
    /// value, and when no rule is currently active.
    pub fn dst_savings_at(&self, at: DateTime<Utc>) -> i64 {
        self.active_rule_at(at).map_or(0, |rule| rule.save)
    }

    /// Whether a rule-introduced saving is in force at `at`.
    pub fn is_daylight_at(&self, at: DateTime<Utc>) -> bool {
        self.dst_savings_at(at) != 0
    }

    /// Renders the zone's abbreviation for `at`.
    ///
    /// `want_daylight` picks the period's DST template when it carries one
    /// and steers the letter search toward rules with or without a saving.
    /// The letter search is a best-effort heuristic over the owning rule
    /// sequence; when it comes up empty the substitution token is replaced
    /// by an empty string. Returns `None` when no period applies at `at`.
    pub fn display_name(&self, want_daylight: bool, at: DateTime<Utc>) -> Option<String> {
        let period = self.zone.active_period(at)?;
        let template = if want_daylight {
            period.dst_format.as_deref().unwrap_or(&period.format)
        } else {
            period.format.as_str()
        };
        let letters = match &period.saving {
            Saving::Rules(rules) => {
                let active = rules.active_rule(period.utc_offset, at);
                daylight_rule(rules, active, want_daylight)
                    .and_then(|rule| rule.letters.as_deref())
            }
            Saving::Fixed(_) => None,
        };
        Some(template.replacen("%s", letters.unwrap_or(""), 1))
    }

    /// Whether this zone and `other` are governed by the same shared rule
    /// at `at`.
    ///
    /// True only when both handles resolve the identical rule object out of
    /// a shared rule set. Rules with equal field values in distinct sets do
    /// not count, and neither does a pair of zones with no active rule.
    pub fn same_rules_at(&self, other: &ZoneHandle, at: DateTime<Utc>) -> bool {
        match (self.active_rule_at(at), other.active_rule_at(at)) {
            (Some(mine), Some(theirs)) => ptr::eq(mine, theirs),
            _ => false,
        }
    }

    /// The full offset picture at `at`.
    pub fn offset_info_at(&self, at: DateTime<Utc>) -> OffsetInfo {
        let daylight = self.is_daylight_at(at);
        OffsetInfo {
            offset_seconds: self.offset_at(at),
            dst_seconds: self.dst_savings_at(at),
            daylight,
            abbreviation: self.display_name(daylight, at),
        }
    }
}

/// Best-effort search for a rule whose saving matches the requested
/// daylight sense.
///
/// The active rule wins when its sign already matches. Otherwise the
/// sequence is scanned backward from its end, skipping entries until the
/// active rule is passed; the first sign match after that point is taken.
/// The scan can miss a matching rule that precedes the active one in scan
/// order, which callers treat as "no letters".
fn daylight_rule<'a>(
    rules: &'a RuleSet,
    active: Option<&'a Rule>,
    want_daylight: bool,
) -> Option<&'a Rule> {
    let wanted = |rule: &Rule| (rule.save != 0) == want_daylight;
    if let Some(rule) = active {
        if wanted(rule) {
            return Some(rule);
        }
    }
    let mut passed = false;
    for rule in rules.rules().iter().rev() {
        if active.is_some_and(|active| ptr::eq(rule, active)) {
            passed = true;
            continue;
        }
        if passed && wanted(rule) {
            return Some(rule);
        }
    }
    None
}

// ── Tests ───────────────────────────────────────────────────────────────────
