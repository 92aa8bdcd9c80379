use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{TypeError, TypeResult};

/// `2005-08-15T15:52:01+0000`
pub const ISO8601: &str = "%Y-%m-%dT%H:%M:%S%z";

/// `2005-08-15T15:52:01+00:00`
pub const ATOM: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// A UTC instant with a configurable string format.
///
/// `Display` renders the instant with the configured `strftime` format,
/// [`ISO8601`] unless changed with [`Timestamp::with_format`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    instant: DateTime<Utc>,
    format: String,
}

impl Timestamp {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            format: ISO8601.to_string(),
        }
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn from_epoch_seconds(secs: i64) -> TypeResult<Self> {
        DateTime::from_timestamp(secs, 0)
            .map(Self::new)
            .ok_or_else(|| {
                TypeError::InvalidTimestamp(format!("epoch seconds out of range: {secs}"))
            })
    }

    /// Parse RFC 3339, ISO 8601 with a numeric offset, `YYYY-MM-DD HH:MM:SS`
    /// (taken as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
    pub fn parse(s: &str) -> TypeResult<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::new(dt.with_timezone(&Utc)));
        }
        if let Ok(dt) = DateTime::parse_from_str(s, ISO8601) {
            return Ok(Self::new(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(Self::new(naive.and_utc()));
        }
        if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(Self::new(naive.and_utc()));
        }
        Err(TypeError::InvalidTimestamp(s.to_string()))
    }

    /// Replace the display format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.instant.timestamp()
    }

    /// Render in [`ATOM`] form regardless of the configured format.
    pub fn to_atom_string(&self) -> String {
        self.instant.format(ATOM).to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instant.format(&self.format))
    }
}
