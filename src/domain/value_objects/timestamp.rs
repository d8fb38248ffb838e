//! # Timestamp Value Object
//!
//! UTC point in time used for creation, update and match stamps.
//!
//! # Examples
//!
//! ```
//! use produce_market::domain::value_objects::timestamp::Timestamp;
//!
//! let now = Timestamp::now();
//! let later = now.add_secs(60);
//!
//! assert!(later.is_after(&now));
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
///
/// Wraps `chrono::DateTime<Utc>`. Ordering follows chronological order,
/// which the repositories rely on for "most recent first" queries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix milliseconds.
    ///
    /// Returns `None` if the value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use produce_market::domain::value_objects::timestamp::Timestamp;
    ///
    /// let ts = Timestamp::from_millis(1704067200000).unwrap();
    /// assert_eq!(ts.timestamp_millis(), 1704067200000);
    /// ```
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Creates a timestamp from Unix seconds.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the Unix timestamp in milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns the Unix timestamp in seconds.
    #[inline]
    #[must_use]
    pub fn timestamp_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Adds seconds to the timestamp (negative values move backwards).
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Subtracts seconds from the timestamp.
    #[must_use]
    pub fn sub_secs(&self, secs: i64) -> Self {
        Self(self.0 - Duration::seconds(secs))
    }

    /// Returns true if this timestamp is before another.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns true if this timestamp is after another.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Returns the inner `DateTime<Utc>`.
    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_secs_roundtrips() {
        let ts = Timestamp::from_secs(1_704_067_200).unwrap();
        assert_eq!(ts.timestamp_secs(), 1_704_067_200);
        assert_eq!(ts.timestamp_millis(), 1_704_067_200_000);
    }

    #[test]
    fn add_and_sub_secs() {
        let ts = Timestamp::from_secs(1000).unwrap();
        assert_eq!(ts.add_secs(60).timestamp_secs(), 1060);
        assert_eq!(ts.sub_secs(60).timestamp_secs(), 940);
    }

    #[test]
    fn ordering_is_chronological() {
        let early = Timestamp::from_secs(1000).unwrap();
        let late = Timestamp::from_secs(2000).unwrap();
        assert!(early.is_before(&late));
        assert!(late.is_after(&early));
        assert!(early < late);
    }

    #[test]
    fn serde_is_transparent() {
        let ts = Timestamp::from_secs(0).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1970-01-01T00:00:00Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
