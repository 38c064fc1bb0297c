//! Timezone offsets for local-time display.
//!
//! Offsets travel on the wire as `+HHMM` / `-HHMM` strings. Only fields with
//! a local date type are shifted; UTC granularities format the stored instant
//! as-is.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::error::ConvertError;

/// The offset assumed when a caller supplies none.
pub const DEFAULT_TIMEZONE: &str = "+0800";

/// A fixed UTC offset in minutes, east positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TzOffset {
    minutes: i32,
}

impl TzOffset {
    /// Parses a `+HHMM` / `-HHMM` offset string.
    pub fn parse(input: &str) -> Result<Self, ConvertError> {
        let invalid = || ConvertError::InvalidTimezone {
            input: input.to_owned(),
        };
        let bytes = input.as_bytes();
        if !input.is_ascii() || bytes.len() != 5 || !matches!(bytes[0], b'+' | b'-') {
            return Err(invalid());
        }
        let hours: i32 = input[1..3].parse().map_err(|_| invalid())?;
        let minutes: i32 = input[3..5].parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }
        let total = hours * 60 + minutes;
        Ok(Self {
            minutes: if bytes[0] == b'-' { -total } else { total },
        })
    }

    /// The offset in minutes east of UTC.
    pub fn minutes(self) -> i32 {
        self.minutes
    }

    /// Shifts a UTC instant to the wall-clock time at this offset.
    pub fn to_local(self, instant: DateTime<Utc>) -> DateTime<Utc> {
        instant + Duration::minutes(i64::from(self.minutes))
    }
}

impl Default for TzOffset {
    fn default() -> Self {
        Self { minutes: 8 * 60 }
    }
}

impl FromStr for TzOffset {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TzOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.abs();
        write!(f, "{sign}{:02}{:02}", abs / 60, abs % 60)
    }
}
