//! Recency buckets for history entries.
//!
//! Classification is relative to a caller-supplied "today" so that the same
//! log regroups correctly as calendar days advance.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Recency group of a history entry. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketId {
    Today,
    Yesterday,
    ThisWeek,
    #[serde(rename = "older")]
    OlderThanWeek,
    Unknown,
}

impl BucketId {
    pub const ALL: [Self; 5] = [
        Self::Today,
        Self::Yesterday,
        Self::ThisWeek,
        Self::OlderThanWeek,
        Self::Unknown,
    ];

    /// Human-readable heading.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::ThisWeek => "This week",
            Self::OlderThanWeek => "Older than week",
            Self::Unknown => "Missing info",
        }
    }

    const fn slug(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "this-week",
            Self::OlderThanWeek => "older",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BucketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for BucketId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.slug() == s)
            .ok_or_else(|| {
                format!("unknown bucket '{s}' (expected today, yesterday, this-week, older or unknown)")
            })
    }
}

/// Source of the reference date used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Local calendar date, read on every call.
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(self) -> NaiveDate {
        match self {
            Self::System => Local::now().date_naive(),
            Self::Fixed(date) => date,
        }
    }
}

/// Map an entry date to its bucket relative to `today`.
pub fn classify(date: Option<NaiveDate>, today: NaiveDate) -> BucketId {
    let Some(date) = date else {
        return BucketId::Unknown;
    };
    let days_ago = today.signed_duration_since(date).num_days();
    match days_ago {
        0 => BucketId::Today,
        1 => BucketId::Yesterday,
        // Future dates land here as well.
        d if d < 7 => BucketId::ThisWeek,
        _ => BucketId::OlderThanWeek,
    }
}

/// Extract the calendar date from an ISO-8601 timestamp.
///
/// Returns `None` for anything that does not parse; such entries are grouped
/// under [`BucketId::Unknown`].
pub fn parse_date(timestamp: &str) -> Option<NaiveDate> {
    let ts = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d").ok()
}

/// Convenience wrapper over [`parse_date`] + [`classify`].
pub fn classify_timestamp(timestamp: Option<&str>, today: NaiveDate) -> BucketId {
    classify(timestamp.and_then(parse_date), today)
}
