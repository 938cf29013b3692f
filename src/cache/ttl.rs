//! TTL Policy Module
//!
//! Maps data-category labels to cache lifetimes.

use std::collections::HashMap;
use std::fmt;

/// Fallback lifetime for unregistered or misconfigured categories.
pub const DEFAULT_TTL_SECS: u64 = 3600;

// == TTL Category ==
/// Data categories attached to each resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlCategory {
    /// Catalog data that changes through the day (rover photos, NEO feed)
    HourlyCatalog,
    /// One value per day (APOD)
    DailyImagery,
    /// Rarely changing reference data (GIBS capabilities, EONET layers)
    StaticReference,
    /// Natural event feeds
    LiveEvents,
}

impl TtlCategory {
    pub const ALL: [TtlCategory; 4] = [
        TtlCategory::HourlyCatalog,
        TtlCategory::DailyImagery,
        TtlCategory::StaticReference,
        TtlCategory::LiveEvents,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TtlCategory::HourlyCatalog => "hourly-catalog",
            TtlCategory::DailyImagery => "daily-imagery",
            TtlCategory::StaticReference => "static-reference",
            TtlCategory::LiveEvents => "live-events",
        }
    }

    /// Built-in lifetime in seconds.
    pub fn default_secs(self) -> u64 {
        match self {
            TtlCategory::HourlyCatalog => 3600,
            TtlCategory::DailyImagery => 86_400,
            TtlCategory::StaticReference => 604_800,
            TtlCategory::LiveEvents => 900,
        }
    }
}

impl fmt::Display for TtlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// == TTL Policy ==
/// Category label to lifetime table with a global fallback.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    table: HashMap<String, u64>,
    default_ttl: u64,
}

impl TtlPolicy {
    /// Creates the built-in table. A `default_ttl` of zero is replaced by
    /// [`DEFAULT_TTL_SECS`].
    pub fn new(default_ttl: u64) -> Self {
        let table = TtlCategory::ALL
            .iter()
            .map(|c| (c.label().to_string(), c.default_secs()))
            .collect();

        Self {
            table,
            default_ttl: if default_ttl == 0 {
                DEFAULT_TTL_SECS
            } else {
                default_ttl
            },
        }
    }

    /// Registers or replaces a category lifetime.
    pub fn with_override(mut self, label: impl Into<String>, secs: u64) -> Self {
        self.table.insert(label.into(), secs);
        self
    }

    // == Resolve ==
    /// Resolves a category label to seconds. Never returns zero: unknown
    /// labels and entries configured to zero resolve to the default.
    pub fn resolve(&self, label: &str) -> u64 {
        match self.table.get(label) {
            Some(&secs) if secs > 0 => secs,
            _ => self.default_ttl,
        }
    }

    pub fn ttl_for(&self, category: TtlCategory) -> u64 {
        self.resolve(category.label())
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}

/// Resolves a label against the built-in table.
pub fn resolve_ttl(label: &str) -> u64 {
    TtlPolicy::default().resolve(label)
}
