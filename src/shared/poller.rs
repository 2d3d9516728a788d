use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::EspResult;
use crate::shared::freshness::{FeedStatus, FreshnessPolicy, DEFAULT_STALE_MINUTES};
use crate::shared::types::TelemetrySample;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

pub type PollResult = EspResult<TelemetrySample>;

/// Cadence and staleness threshold, handed from the server to the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub interval_secs: u64,
    pub stale_minutes: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            stale_minutes: DEFAULT_STALE_MINUTES,
        }
    }
}

impl FeedConfig {
    pub fn policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::minutes(self.stale_minutes)
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs.max(1))
    }
}

/// What a view needs to render the telemetry feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    /// Last good sample. Kept across failed polls.
    pub sample: Option<TelemetrySample>,
    /// Local time of the last successful fetch.
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// The service refused the access key on the last poll.
    pub key_rejected: bool,
    pub in_flight: bool,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            status: FeedStatus::Loading,
            sample: None,
            last_fetch_at: None,
            last_error: None,
            key_rejected: false,
            in_flight: false,
        }
    }
}

/// Proof that a fetch was started under a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied(FeedStatus),
    /// The ticket predates a reset; the response was dropped.
    Discarded,
}

/// Runtime-agnostic state of the freshness-gated poller.
///
/// The browser loop and the tokio task both drive this: take a ticket with
/// [`PollerState::begin`], fetch, then hand the result to
/// [`PollerState::complete`]. Completions from an older generation never
/// touch the snapshot.
#[derive(Debug, Clone)]
pub struct PollerState {
    policy: FreshnessPolicy,
    generation: u64,
    snapshot: FeedSnapshot,
}

impl PollerState {
    pub fn new(policy: FreshnessPolicy) -> Self {
        Self {
            policy,
            generation: 0,
            snapshot: FeedSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &FeedSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> FeedStatus {
        self.snapshot.status
    }

    /// Takes effect from the next completion.
    pub fn set_policy(&mut self, policy: FreshnessPolicy) {
        self.policy = policy;
    }

    pub fn begin(&mut self) -> PollTicket {
        self.snapshot.in_flight = true;
        PollTicket {
            generation: self.generation,
        }
    }

    pub fn complete(
        &mut self,
        ticket: PollTicket,
        result: PollResult,
        now: DateTime<Utc>,
    ) -> PollOutcome {
        if ticket.generation != self.generation {
            return PollOutcome::Discarded;
        }
        self.snapshot.in_flight = false;
        self.snapshot.key_rejected = false;
        match result {
            Ok(sample) => {
                let fresh = self.policy.is_fresh(sample.captured_at, now);
                self.snapshot.status = if fresh {
                    FeedStatus::Online
                } else {
                    FeedStatus::Stale
                };
                self.snapshot.sample = Some(sample);
                self.snapshot.last_fetch_at = Some(now);
                self.snapshot.last_error = None;
            }
            Err(e) => {
                self.snapshot.key_rejected = e.is_auth();
                self.snapshot.status = FeedStatus::Stale;
                self.snapshot.last_error = Some(e.to_string());
            }
        }
        PollOutcome::Applied(self.snapshot.status)
    }

    /// Back to `Loading` with no data; outstanding tickets become invalid.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.snapshot = FeedSnapshot::default();
    }
}

impl Default for PollerState {
    fn default() -> Self {
        Self::new(FreshnessPolicy::default())
    }
}
