//! # Timestamps
//!
//! `Timestamp` is UTC, truncated to whole seconds, and renders as
//! `YYYY-MM-DDTHH:MM:SSZ`. Event-log entries and phase transition records
//! carry one, so the canonical bytes of an entry do not depend on the
//! host timezone or clock resolution.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A UTC timestamp with seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse RFC 3339. Only the `Z` suffix is accepted; explicit offsets,
    /// including `+00:00`, are rejected.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if !s.ends_with('Z') {
            return Err(ParseError::Timestamp {
                input: s.to_string(),
                reason: "must use Z suffix".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ParseError::Timestamp {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ParseError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| ParseError::Timestamp {
                input: secs.to_string(),
                reason: "out of range".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
