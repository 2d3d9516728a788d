use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STALE_MINUTES: i64 = 2;

/// How old a sample may get before the device is considered unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub threshold: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::minutes(DEFAULT_STALE_MINUTES)
    }
}

impl FreshnessPolicy {
    pub fn minutes(minutes: i64) -> Self {
        Self {
            threshold: Duration::minutes(minutes),
        }
    }

    pub fn is_fresh(&self, captured_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        is_fresh(captured_at, now, self.threshold)
    }
}

/// `true` while `now - captured_at <= threshold`.
///
/// The boundary is inclusive. Timestamps ahead of `now` (board clock drift)
/// count as fresh.
pub fn is_fresh(captured_at: DateTime<Utc>, now: DateTime<Utc>, threshold: Duration) -> bool {
    now.signed_duration_since(captured_at) <= threshold
}

/// Status indicator shown next to the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    Loading,
    Online,
    Stale,
}

impl FeedStatus {
    pub fn label(self) -> &'static str {
        match self {
            FeedStatus::Loading => "Loading",
            FeedStatus::Online => "Online",
            FeedStatus::Stale => "Data is stale",
        }
    }
}
