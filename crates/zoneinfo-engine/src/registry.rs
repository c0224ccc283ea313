//! Zone registry and aliases.
//!
//! The registry maps names to entries: concrete zones or aliases pointing
//! at other entries. Loading registers entries while queries run; entries
//! are never mutated or removed once registered, so lookups hand out
//! handles that stay valid however the registry grows afterwards.
//!
//! A process-wide registry is available through [`global`] for callers
//! that load one data set at startup and query it from anywhere.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::debug;
use once_cell::sync::Lazy;

use crate::error::{Result, ZoneInfoError};
use crate::timezone::ZoneHandle;
use crate::zone::Zone;

// ── Entries ─────────────────────────────────────────────────────────────────

/// A registry entry: a concrete zone or an alias to another entry.
#[derive(Debug, Clone)]
pub enum ZoneEntry {
    /// A zone with its own period data.
    Concrete(Arc<Zone>),
    /// An alternative name for another entry.
    Alias(Arc<ZoneAlias>),
}

impl ZoneEntry {
    /// The name the entry answers to.
    pub fn name(&self) -> &str {
        match self {
            ZoneEntry::Concrete(zone) => zone.name(),
            ZoneEntry::Alias(alias) => alias.name(),
        }
    }

    /// The concrete zone behind the entry, following aliases.
    pub fn zone(&self) -> Arc<Zone> {
        match self {
            ZoneEntry::Concrete(zone) => Arc::clone(zone),
            ZoneEntry::Alias(alias) => alias.target().zone(),
        }
    }
}

/// An alternative name for a zone.
///
/// The target entry is captured when the alias is created, so chains of
/// aliases are finite by construction and resolve without registry access.
#[derive(Debug)]
pub struct ZoneAlias {
    name: String,
    target: ZoneEntry,
}

impl ZoneAlias {
    /// Creates an alias named `name` pointing at `target`.
    pub fn new(name: impl Into<String>, target: ZoneEntry) -> Arc<Self> {
        Arc::new(ZoneAlias {
            name: name.into(),
            target,
        })
    }

    /// The alias name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The aliased entry.
    pub fn target(&self) -> &ZoneEntry {
        &self.target
    }
}

// ── Registry ────────────────────────────────────────────────────────────────

/// A concurrent name-to-entry map of zones and aliases.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    entries: RwLock<HashMap<String, ZoneEntry>>,
}

impl ZoneRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        ZoneRegistry::default()
    }

    // Entries are write-once, so a panic mid-registration cannot leave a
    // half-updated entry behind and lock poisoning is recoverable.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, ZoneEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, ZoneEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `entry` under its own name, replacing any previous entry
    /// with that name.
    pub fn register(&self, entry: ZoneEntry) {
        let name = entry.name().to_owned();
        debug!("registering zone entry {name}");
        self.write_entries().insert(name, entry);
    }

    /// Registers a concrete zone.
    pub fn register_zone(&self, zone: Arc<Zone>) {
        self.register(ZoneEntry::Concrete(zone));
    }

    /// Registers `alias` as an alternative name for the entry currently
    /// registered under `target`, and returns the created alias.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneInfoError::UnknownZone`] when `target` names no entry.
    pub fn alias(&self, alias: impl Into<String>, target: &str) -> Result<Arc<ZoneAlias>> {
        let target = self
            .entry(target)
            .ok_or_else(|| ZoneInfoError::UnknownZone(target.to_owned()))?;
        let alias = ZoneAlias::new(alias, target);
        self.register(ZoneEntry::Alias(Arc::clone(&alias)));
        Ok(alias)
    }

    /// The entry registered under `name`, if any.
    pub fn entry(&self, name: &str) -> Option<ZoneEntry> {
        self.read_entries().get(name).cloned()
    }

    /// A query handle on the entry registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<ZoneHandle> {
        let entry = self.entry(name);
        if entry.is_none() {
            debug!("zone lookup miss for {name}");
        }
        entry.map(ZoneHandle::new)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.read_entries().keys().cloned().collect()
    }

    /// Registered names whose effective UTC offset at `at` equals
    /// `offset_seconds`, sorted. Aliases are listed under their own name.
    pub fn names_with_offset_at(
        &self,
        offset_seconds: i64,
        at: DateTime<Utc>,
    ) -> BTreeSet<String> {
        self.read_entries()
            .iter()
            .filter(|(_, entry)| entry.zone().effective_offset(at) == offset_seconds)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Registered names whose effective UTC offset right now equals
    /// `offset_seconds`, sorted.
    pub fn names_with_offset(&self, offset_seconds: i64) -> BTreeSet<String> {
        self.names_with_offset_at(offset_seconds, Utc::now())
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }
}

static GLOBAL: Lazy<ZoneRegistry> = Lazy::new(ZoneRegistry::new);

/// The process-wide shared registry.
pub fn global() -> &'static ZoneRegistry {
    &GLOBAL
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{Period, Saving};
    use chrono::TimeZone;

    fn fixed_zone(name: &str, utc_offset: i64) -> Arc<Zone> {
        Zone::new(
            name,
            vec![Period {
                utc_offset,
                saving: Saving::Fixed(0),
                format: "TEST".to_owned(),
                dst_format: None,
                until: None,
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ZoneRegistry::new();
        registry.register_zone(fixed_zone("Australia/Sydney", 10 * 3600));
        let handle = registry.lookup("Australia/Sydney").unwrap();
        assert_eq!(handle.name(), "Australia/Sydney");
        assert!(registry.lookup("Australia/Perth").is_none());
    }

    #[test]
    fn test_alias_keeps_own_name_but_answers_with_target() {
        let registry = ZoneRegistry::new();
        registry.register_zone(fixed_zone("Australia/Sydney", 10 * 3600));
        registry.alias("Australia/ACT", "Australia/Sydney").unwrap();

        let handle = registry.lookup("Australia/ACT").unwrap();
        assert_eq!(handle.name(), "Australia/ACT");
        assert_eq!(handle.zone_name(), "Australia/Sydney");

        let at = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(handle.offset_at(at), 10 * 3600);
    }

    #[test]
    fn test_alias_to_unknown_target_errors() {
        let registry = ZoneRegistry::new();
        let err = registry.alias("Australia/ACT", "Australia/Sydney").unwrap_err();
        assert!(matches!(err, ZoneInfoError::UnknownZone(name) if name == "Australia/Sydney"));
    }

    #[test]
    fn test_alias_chains_resolve_recursively() {
        let registry = ZoneRegistry::new();
        registry.register_zone(fixed_zone("Europe/Rome", 3600));
        registry.alias("Europe/Vatican", "Europe/Rome").unwrap();
        registry.alias("Europe/San_Marino", "Europe/Vatican").unwrap();

        let handle = registry.lookup("Europe/San_Marino").unwrap();
        assert_eq!(handle.name(), "Europe/San_Marino");
        assert_eq!(handle.zone_name(), "Europe/Rome");
    }

    #[test]
    fn test_alias_pins_target_at_creation() {
        let registry = ZoneRegistry::new();
        registry.register_zone(fixed_zone("Europe/Rome", 3600));
        registry.alias("Europe/Vatican", "Europe/Rome").unwrap();

        // Re-registering the target name later does not retarget the alias.
        registry.register_zone(fixed_zone("Europe/Rome", 2 * 3600));
        let at = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let alias = registry.lookup("Europe/Vatican").unwrap();
        assert_eq!(alias.offset_at(at), 3600);
        let direct = registry.lookup("Europe/Rome").unwrap();
        assert_eq!(direct.offset_at(at), 2 * 3600);
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = ZoneRegistry::new();
        registry.register_zone(fixed_zone("Europe/Rome", 3600));
        registry.register_zone(fixed_zone("Australia/Sydney", 10 * 3600));
        registry.alias("Europe/Vatican", "Europe/Rome").unwrap();

        let names: Vec<String> = registry.names().into_iter().collect();
        assert_eq!(
            names,
            ["Australia/Sydney", "Europe/Rome", "Europe/Vatican"]
        );
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_names_with_offset_filters_by_effective_offset() {
        use crate::instant::{DaySelector, TransitionTime};
        use crate::rule::{Rule, RuleSet, ToYear, YearKind, YearSpec};
        use chrono::Weekday;

        let rule = |month, save| Rule {
            from: YearSpec::Year(2008),
            to: ToYear::Max,
            year_kind: YearKind::Any,
            month: Some(month),
            day: Some(DaySelector::OnOrAfter(Weekday::Sun, 1)),
            at: Some(TransitionTime::standard(2 * 3600)),
            save,
            letters: None,
        };
        let set = RuleSet::new("AN", vec![rule(4, 0), rule(10, 3600)]).unwrap();
        let sydney = Zone::new(
            "Australia/Sydney",
            vec![Period {
                utc_offset: 10 * 3600,
                saving: Saving::Rules(set),
                format: "AE%sT".to_owned(),
                dst_format: None,
                until: None,
            }],
        )
        .unwrap();

        let registry = ZoneRegistry::new();
        registry.register_zone(sydney);
        registry.register_zone(fixed_zone("Etc/GMT-11", 11 * 3600));

        // January is daylight time in Sydney, so its effective offset is
        // +11h and it files alongside the fixed +11h zone.
        let summer = Utc.with_ymd_and_hms(2010, 1, 15, 0, 0, 0).unwrap();
        let names: Vec<String> = registry
            .names_with_offset_at(11 * 3600, summer)
            .into_iter()
            .collect();
        assert_eq!(names, ["Australia/Sydney", "Etc/GMT-11"]);

        let winter = Utc.with_ymd_and_hms(2010, 6, 15, 0, 0, 0).unwrap();
        let names: Vec<String> = registry
            .names_with_offset_at(11 * 3600, winter)
            .into_iter()
            .collect();
        assert_eq!(names, ["Etc/GMT-11"]);
    }

    #[test]
    fn test_global_registry_is_shared() {
        global().register_zone(fixed_zone("Test/GlobalProbe", 1234));
        let handle = global().lookup("Test/GlobalProbe").unwrap();
        let at = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(handle.offset_at(at), 1234);
    }
}
