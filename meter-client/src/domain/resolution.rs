use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Duration;

/// Chart/export resolution.
///
/// Each tag couples a lookback window (how far back from "now" readings are
/// kept) with the grain used to group readings into buckets. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    TenSeconds,
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    SixHours,
    TwelveHours,
    OneDay,
    OneWeek,
    OneMonth,
    SixMonths,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown resolution tag '{0}'")]
pub struct UnknownResolution(pub String);

impl Resolution {
    /// Display order of the chart selectors.
    pub const ALL: [Resolution; 11] = [
        Resolution::TenSeconds,
        Resolution::OneMinute,
        Resolution::FiveMinutes,
        Resolution::FifteenMinutes,
        Resolution::OneHour,
        Resolution::SixHours,
        Resolution::TwelveHours,
        Resolution::OneDay,
        Resolution::OneWeek,
        Resolution::OneMonth,
        Resolution::SixMonths,
    ];

    /// Resolutions offered for report export.
    pub const EXPORTABLE: [Resolution; 8] = [
        Resolution::FifteenMinutes,
        Resolution::OneHour,
        Resolution::SixHours,
        Resolution::TwelveHours,
        Resolution::OneDay,
        Resolution::OneWeek,
        Resolution::OneMonth,
        Resolution::SixMonths,
    ];

    /// Used for tags nobody recognizes: one hour back, minute buckets.
    pub const FALLBACK: Resolution = Resolution::OneMinute;

    pub fn tag(&self) -> &'static str {
        match self {
            Resolution::TenSeconds => "10s",
            Resolution::OneMinute => "1m",
            Resolution::FiveMinutes => "5m",
            Resolution::FifteenMinutes => "15m",
            Resolution::OneHour => "1h",
            Resolution::SixHours => "6h",
            Resolution::TwelveHours => "12h",
            Resolution::OneDay => "1d",
            Resolution::OneWeek => "1w",
            Resolution::OneMonth => "1M",
            Resolution::SixMonths => "6M",
        }
    }

    pub fn full_label(&self) -> &'static str {
        match self {
            Resolution::TenSeconds => "10 seconds",
            Resolution::OneMinute => "1 minute",
            Resolution::FiveMinutes => "5 minutes",
            Resolution::FifteenMinutes => "15 minutes",
            Resolution::OneHour => "1 hour",
            Resolution::SixHours => "6 hours",
            Resolution::TwelveHours => "12 hours",
            Resolution::OneDay => "1 day",
            Resolution::OneWeek => "1 week",
            Resolution::OneMonth => "1 month",
            Resolution::SixMonths => "6 months",
        }
    }

    /// How far back from "now" readings are retained.
    pub fn lookback(&self) -> Duration {
        match self {
            Resolution::TenSeconds => Duration::minutes(10),
            Resolution::OneMinute => Duration::hours(1),
            Resolution::FiveMinutes => Duration::hours(5),
            Resolution::FifteenMinutes => Duration::hours(15),
            Resolution::OneHour => Duration::hours(24),
            Resolution::SixHours => Duration::days(6),
            Resolution::TwelveHours => Duration::days(12),
            Resolution::OneDay => Duration::days(30),
            Resolution::OneWeek => Duration::weeks(12),
            Resolution::OneMonth => Duration::days(30),
            Resolution::SixMonths => Duration::days(180),
        }
    }

    pub fn is_exportable(&self) -> bool {
        Self::EXPORTABLE.contains(self)
    }

    /// Lenient parse: unknown tags fall back to [`Resolution::FALLBACK`].
    pub fn from_tag_or_default(tag: &str) -> Resolution {
        match tag.parse() {
            Ok(r) => r,
            Err(UnknownResolution(tag)) => {
                tracing::warn!(%tag, fallback = Self::FALLBACK.tag(), "unknown resolution tag");
                Self::FALLBACK
            }
        }
    }
}

impl FromStr for Resolution {
    type Err = UnknownResolution;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .into_iter()
            .find(|r| r.tag() == s)
            .ok_or_else(|| UnknownResolution(s.to_string()))
    }
}

impl TryFrom<String> for Resolution {
    type Error = UnknownResolution;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        r.tag().to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
