//! Orderer retry schedule.

use serde::{Deserialize, Serialize};
use shared_types::OrdererEndpoint;
use std::time::Duration;

/// Bounded retry across an ordered orderer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    #[serde(with = "millis")]
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Orderer to use for each attempt: `(attempt_number, orderer)`, starting
    /// at 1 and cycling through the list.
    pub fn schedule<'a>(
        &self,
        orderers: &'a [OrdererEndpoint],
    ) -> impl Iterator<Item = (u32, &'a OrdererEndpoint)> + 'a {
        let attempts = if orderers.is_empty() { 0 } else { self.max_attempts };
        (1..=attempts).zip(orderers.iter().cycle())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
