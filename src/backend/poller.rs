#![cfg(feature = "server")]
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use dioxus::logger::tracing::{info, warn};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::esp_client::EspClient;
use crate::shared::auth::AccessKey;
use crate::shared::poller::{FeedConfig, FeedSnapshot, PollOutcome, PollResult, PollerState};

/// Something that yields one telemetry sample per call.
pub trait TelemetrySource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = PollResult> + Send;
}

/// The real source: `GET /esp_service/telemetry` with a fixed key.
pub struct ServiceSource {
    client: EspClient,
    key: AccessKey,
}

impl ServiceSource {
    pub fn new(client: EspClient, key: AccessKey) -> Self {
        Self { client, key }
    }
}

impl TelemetrySource for ServiceSource {
    async fn fetch(&self) -> PollResult {
        self.client.telemetry(&self.key).await
    }
}

/// Running poller. Dropping the handle stops the task.
pub struct PollerHandle {
    state: Arc<RwLock<PollerState>>,
    updates: watch::Receiver<FeedSnapshot>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.updates.clone()
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.state.read().await.snapshot().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the timer and invalidate any response still in flight.
    pub async fn stop(self) {
        self.task.abort();
        self.state.write().await.reset();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fetch immediately, then every `config.interval()`.
///
/// Polls never overlap; a slow fetch pushes the next tick back instead of
/// bunching ticks up. The task ends on its own once the key is rejected.
pub fn start<S: TelemetrySource>(source: S, config: FeedConfig) -> PollerHandle {
    let state = Arc::new(RwLock::new(PollerState::new(config.policy())));
    let (tx, rx) = watch::channel(FeedSnapshot::default());
    let task = tokio::spawn(run(source, state.clone(), tx, config));
    PollerHandle {
        state,
        updates: rx,
        task,
    }
}

async fn run<S: TelemetrySource>(
    source: S,
    state: Arc<RwLock<PollerState>>,
    tx: watch::Sender<FeedSnapshot>,
    config: FeedConfig,
) {
    info!(
        "[poller] started; every {}s, stale after {} min",
        config.interval().as_secs(),
        config.stale_minutes
    );
    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        poll_once(&source, &state, &tx).await;
        if tx.borrow().key_rejected {
            warn!("[poller] access key rejected; stopping");
            break;
        }
    }
}

pub async fn poll_once<S: TelemetrySource>(
    source: &S,
    state: &RwLock<PollerState>,
    tx: &watch::Sender<FeedSnapshot>,
) -> PollOutcome {
    let ticket = state.write().await.begin();
    let result = source.fetch().await;
    let mut w = state.write().await;
    let outcome = w.complete(ticket, result, Utc::now());
    match outcome {
        PollOutcome::Applied(status) => {
            let snap = w.snapshot();
            match (&snap.sample, &snap.last_error) {
                (_, Some(err)) => warn!("[poller] poll failed: {} (status={:?})", err, status),
                (Some(s), None) => info!(
                    "[poller] {}: {:.1}°C {:.0}% captured {} (status={:?})",
                    s.device_id,
                    s.temperature,
                    s.humidity,
                    s.captured_at.to_rfc3339(),
                    status
                ),
                (None, None) => {}
            }
            tx.send_replace(snap.clone());
        }
        PollOutcome::Discarded => info!("[poller] dropped a response from a previous run"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::EspError;
    use crate::shared::freshness::FeedStatus;
    use crate::shared::types::TelemetrySample;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Replays scripted `(latency, result)` pairs; the last one repeats.
    struct ScriptedSource {
        script: Mutex<Vec<(Duration, PollResult)>>,
        calls: Arc<Mutex<Vec<Instant>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<(Duration, PollResult)>) -> (Self, Arc<Mutex<Vec<Instant>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    script: Mutex::new(script),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl TelemetrySource for ScriptedSource {
        async fn fetch(&self) -> PollResult {
            let (latency, result) = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.remove(0)
                } else {
                    script[0].clone()
                }
            };
            self.calls.lock().unwrap().push(Instant::now());
            tokio::time::sleep(latency).await;
            result
        }
    }

    fn fresh() -> PollResult {
        Ok(TelemetrySample {
            device_id: "greenhouse_01".into(),
            temperature: 20.0,
            humidity: 50.0,
            free_memory_bytes: None,
            uptime_seconds: None,
            captured_at: Utc::now(),
            bluetooth_active: None,
        })
    }

    fn config() -> FeedConfig {
        FeedConfig {
            interval_secs: 30,
            stale_minutes: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_is_immediate() {
        let (source, calls) = ScriptedSource::new(vec![(Duration::ZERO, fresh())]);
        let started = Instant::now();
        let handle = start(source, config());
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().status, FeedStatus::Online);
        assert_eq!(calls.lock().unwrap()[0], started);
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_are_never_closer_than_the_interval() {
        // the first fetch overruns the interval
        let (source, calls) = ScriptedSource::new(vec![
            (Duration::from_secs(40), fresh()),
            (Duration::from_millis(200), fresh()),
        ]);
        let handle = start(source, config());
        tokio::time::sleep(Duration::from_secs(200)).await;
        handle.stop().await;

        let calls = calls.lock().unwrap().clone();
        assert!(calls.len() >= 5, "only {} fetches", calls.len());
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(30));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_resolves_to_stale() {
        let (source, _calls) =
            ScriptedSource::new(vec![(Duration::ZERO, Err(EspError::Status(502)))]);
        let handle = start(source, config());
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().status, FeedStatus::Stale);
        assert_eq!(handle.snapshot().await.status, FeedStatus::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_key_stops_the_loop() {
        let (source, calls) =
            ScriptedSource::new(vec![(Duration::ZERO, Err(EspError::Auth(401)))]);
        let handle = start(source, config());
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(!handle.is_running());
        assert!(handle.snapshot().await.key_rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_polling() {
        let (source, calls) = ScriptedSource::new(vec![(Duration::ZERO, fresh())]);
        let handle = start(source, config());
        tokio::time::sleep(Duration::from_secs(65)).await;
        drop(handle);
        let seen = calls.lock().unwrap().len();
        assert_eq!(seen, 3);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(calls.lock().unwrap().len(), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_response() {
        let (source, _calls) =
            ScriptedSource::new(vec![(Duration::from_secs(10), fresh())]);
        let state = Arc::new(RwLock::new(PollerState::new(config().policy())));
        let (tx, _rx) = watch::channel(FeedSnapshot::default());

        let slow = {
            let state = state.clone();
            tokio::spawn(async move { poll_once(&source, &state, &tx).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        state.write().await.reset();

        assert_eq!(slow.await.unwrap(), PollOutcome::Discarded);
        assert_eq!(state.read().await.status(), FeedStatus::Loading);
    }
}
