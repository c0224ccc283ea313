//! # zoneinfo-engine
//!
//! Rule-based timezone resolution over zoneinfo-style data.
//!
//! The crate models named rule sets (recurring offset transitions), zones
//! (ordered sequences of offset periods), and aliases, and answers
//! point-in-time queries over them: effective UTC offset, daylight state,
//! and abbreviation for any instant. Data is assembled by an external
//! parser, registered in a [`ZoneRegistry`], and queried through
//! [`ZoneHandle`]s, which follow aliases transparently.
//!
//! Everything but the registry is immutable after construction, so all
//! resolution is lock-free and safe to call from any number of threads.
//!
//! ## Modules
//!
//! - [`instant`]: transition instant resolution, day selectors, time
//!   frames, and the absent-field cascade
//! - [`rule`]: recurring rules, rule sets, and the active-rule matcher
//! - [`zone`]: zones, offset periods, and period boundaries
//! - [`registry`]: the name-to-zone map and aliases
//! - [`timezone`]: per-zone query handles
//! - [`error`]: error types

pub mod error;
pub mod instant;
pub mod registry;
pub mod rule;
pub mod timezone;
pub mod zone;

pub use error::{Result, ZoneInfoError};
pub use instant::{
    resolve_transition, DaySelector, TimeFrame, TransitionTime, MAX_RULE_YEAR, MIN_RULE_YEAR,
};
pub use registry::{global, ZoneAlias, ZoneEntry, ZoneRegistry};
pub use rule::{Rule, RuleSet, ToYear, YearKind, YearSpec};
pub use timezone::{OffsetInfo, ZoneHandle};
pub use zone::{Period, Saving, UntilSpec, Zone};
