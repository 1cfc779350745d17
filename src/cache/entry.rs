//! Cache Entry Module
//!
//! Defines the envelope persisted for every key and its TTL checks.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cache::Ttl;

// == Cache Entry ==
/// Envelope written to the backend for each key.
///
/// Serialized as `{"value": .., "createdAt": .., "expiresAt": ..}` with
/// millisecond-precision UTC timestamps (`2024-01-01T00:00:00.000Z`).
/// A missing `value` marks the placeholder written while a remembered value
/// is being computed; an explicit `null` is a real stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The stored value, None for a placeholder
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    /// Write timestamp
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp, None = no expiration
    #[serde(with = "timestamp::option", default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written now.
    pub fn new(value: Option<Value>, ttl: Ttl) -> Self {
        Self::new_at(value, ttl, current_timestamp())
    }

    /// Creates an entry as if written at `now`.
    pub fn new_at(value: Option<Value>, ttl: Ttl, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(3);
        Self {
            value,
            created_at: now,
            expires_at: ttl.expires_at(now).map(|at| at.trunc_subsecs(3)),
        }
    }

    // == Is Expired ==
    /// Checks whether a plain read at `now` must ignore this entry.
    ///
    /// An entry expiring exactly at `now` still reads as present.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires < now)
    }

    /// [`is_expired_at`](Self::is_expired_at) against the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    // == Is Fresh ==
    /// Checks whether `remember` may serve this entry at `now`.
    ///
    /// Stricter than [`is_expired_at`](Self::is_expired_at): an entry expiring
    /// exactly at `now` is no longer fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| expires > now)
    }

    // == Is Placeholder ==
    /// True for the value-less envelope written before a remembered value exists.
    pub fn is_placeholder(&self) -> bool {
        self.value.is_none()
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(zero)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        let now = current_timestamp();
        self.expires_at
            .map(|expires| (expires - now).max(Duration::zero()))
    }
}

// == Utility Functions ==
/// Returns the current UTC time at millisecond precision, the resolution
/// timestamps are persisted with.
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            at: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => super::serialize(at, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] DateTime<Utc>);

            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(at)| at))
        }
    }
}
