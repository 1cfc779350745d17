//! TTL Module
//!
//! Time-to-live argument accepted by every write.

use std::convert::Infallible;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};

// == Ttl ==
/// How long a written entry stays live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Never expires
    #[default]
    Never,
    /// Expires this many seconds after the write
    Seconds(u64),
    /// Expires at an absolute instant
    At(DateTime<Utc>),
}

impl Ttl {
    // == Parse ==
    /// Permissively interprets a textual TTL.
    ///
    /// - a finite number is relative seconds (fraction truncated toward zero,
    ///   negative values land in the past),
    /// - an RFC 3339 timestamp is an absolute instant,
    /// - anything else means `Never`.
    ///
    /// Never fails: an unreadable TTL silently disables expiry.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if let Ok(seconds) = input.parse::<f64>() {
            if seconds.is_finite() {
                return Self::from_signed_seconds(seconds.trunc() as i64);
            }
            return Self::Never;
        }

        match DateTime::parse_from_rfc3339(input) {
            Ok(at) => Self::At(at.with_timezone(&Utc)),
            Err(_) => Self::Never,
        }
    }

    fn from_signed_seconds(seconds: i64) -> Self {
        if seconds >= 0 {
            Self::Seconds(seconds.unsigned_abs())
        } else {
            let past = Duration::try_seconds(seconds.saturating_abs())
                .and_then(|ago| Utc::now().checked_sub_signed(ago))
                .filter(is_persistable)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            Self::At(past)
        }
    }

    // == Expires At ==
    /// Resolves the expiry instant for a write happening at `now`.
    ///
    /// Envelopes only carry four-digit years. Instants past year 9999 (or
    /// offsets that overflow entirely) resolve to `None`; instants before
    /// year 0 resolve to the Unix epoch, which is already expired.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let at = match *self {
            Self::Never => return None,
            Self::Seconds(seconds) => i64::try_from(seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl))?,
            Self::At(at) => at,
        };

        match at.year() {
            year if year > MAX_YEAR => None,
            year if year < MIN_YEAR => Some(DateTime::<Utc>::UNIX_EPOCH),
            _ => Some(at),
        }
    }
}

/// Range of years an ISO-8601 envelope timestamp can hold.
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

fn is_persistable(at: &DateTime<Utc>) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&at.year())
}

impl FromStr for Ttl {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<u64> for Ttl {
    fn from(seconds: u64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<DateTime<Utc>> for Ttl {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

impl From<Duration> for Ttl {
    /// Whole seconds of a non-negative duration; negative ones become an
    /// instant in the past.
    fn from(duration: Duration) -> Self {
        Self::from_signed_seconds(duration.num_seconds())
    }
}

impl<T: Into<Ttl>> From<Option<T>> for Ttl {
    fn from(ttl: Option<T>) -> Self {
        ttl.map(Into::into).unwrap_or_default()
    }
}
