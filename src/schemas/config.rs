//! Config schema - Configuration for ticketflow

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Unit that SLA durations and escalation timeouts are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    #[default]
    Hours,
    Days,
}

/// Largest SLA duration or escalation timeout accepted, in any unit
pub const MAX_TIME_AMOUNT: i64 = 1_000_000;

impl TimeUnit {
    /// Convert an amount of this unit into a duration.
    ///
    /// Returns None when the amount does not fit in a `Duration`.
    pub fn to_duration(self, amount: i64) -> Option<Duration> {
        match self {
            TimeUnit::Minutes => Duration::try_minutes(amount),
            TimeUnit::Hours => Duration::try_hours(amount),
            TimeUnit::Days => Duration::try_days(amount),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Minutes => write!(f, "minutes"),
            TimeUnit::Hours => write!(f, "hours"),
            TimeUnit::Days => write!(f, "days"),
        }
    }
}

/// Escalation timeouts applied to new workflows that leave them unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDefaults {
    #[serde(default = "default_level1")]
    pub level1: i64,

    #[serde(default = "default_level2")]
    pub level2: i64,

    #[serde(default = "default_level3")]
    pub level3: i64,
}

fn default_level1() -> i64 {
    4
}

fn default_level2() -> i64 {
    8
}

fn default_level3() -> i64 {
    24
}

impl Default for EscalationDefaults {
    fn default() -> Self {
        EscalationDefaults {
            level1: default_level1(),
            level2: default_level2(),
            level3: default_level3(),
        }
    }
}

/// Main configuration for ticketflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Unit for SLA durations and escalation timeouts
    #[serde(default)]
    pub time_unit: TimeUnit,

    #[serde(default)]
    pub default_escalation: EscalationDefaults,

    /// Whether next-state queries offer "stay in current state" unless told otherwise
    #[serde(default)]
    pub include_self_default: bool,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Config {
            schema_version: 1,
            time_unit: TimeUnit::Hours,
            default_escalation: EscalationDefaults::default(),
            include_self_default: false,
        }
    }
}
