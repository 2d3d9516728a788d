use std::rc::Rc;

use dioxus::prelude::*;

use crate::components::{close_gate_on_rejection, Gauge};
use crate::shared::auth::{AuthGate, KeyStore};
use crate::shared::freshness::FeedStatus;
use crate::shared::poller::PollerState;
use crate::utils::format::{bytes_to_kilobytes, format_humidity, format_local, format_temperature, format_uptime};

#[allow(non_snake_case)]
#[component]
pub fn TelemetryCard() -> Element {
    let gate = use_context::<Signal<AuthGate>>();
    let store = use_context::<Rc<dyn KeyStore>>();
    let poller = use_signal(PollerState::default);

    // Poll loop: one fetch right away, then one per interval. The future is
    // owned by this component, so unmounting drops both the timer and any
    // request still in flight.
    #[cfg(feature = "web")]
    let mut poll_task = {
        use chrono::Utc;
        use dioxus::logger::tracing::{info, warn};
        use gloo_timers::future::TimeoutFuture;

        use crate::api::{fetch_telemetry, get_feed_config, reply};
        use crate::shared::poller::PollOutcome;

        let mut poller = poller;
        use_future(move || {
            let store = store.clone();
            async move {
                let config = get_feed_config().await.unwrap_or_default();
                poller.write().set_policy(config.policy());
                let delay_ms = config.interval().as_millis() as u32;
                info!("[poller] polling every {} ms", delay_ms);
                loop {
                    let Some(key) = gate.peek().key.clone() else {
                        break;
                    };
                    let ticket = poller.write().begin();
                    let result = reply(fetch_telemetry(key).await);
                    if let Err(e) = &result {
                        warn!("[poller] telemetry fetch failed: {}", e);
                    }
                    let closed = close_gate_on_rejection(gate, &*store, &result);
                    let outcome = poller.write().complete(ticket, result, Utc::now());
                    if outcome == PollOutcome::Discarded || closed {
                        break;
                    }
                    TimeoutFuture::new(delay_ms).await;
                }
            }
        })
    };
    #[cfg(not(feature = "web"))]
    let _ = (gate, store);

    let on_refresh = move |_| {
        #[cfg(feature = "web")]
        poll_task.restart();
    };

    let state = poller.read();
    let snap = state.snapshot();
    let (pill_class, dot_class) = match snap.status {
        FeedStatus::Loading => ("pill pill-loading", "dot"),
        FeedStatus::Online => ("pill pill-online", "dot dot-pulse"),
        FeedStatus::Stale => ("pill pill-stale", "dot"),
    };
    let status_label = snap.status.label();
    let refreshing = snap.in_flight;

    rsx! {
        div { class: "card",
            div { class: "card-head",
                h1 { class: "card-title", "Greenhouse" }
                div { class: "{pill_class}",
                    span { class: "{dot_class}" }
                    "{status_label}"
                }
            }

            {
                match &snap.sample {
                    Some(s) => {
                        let captured = format_local(&s.captured_at);
                        let humidity = s.humidity.round() as i32;
                        rsx! {
                            if snap.status == FeedStatus::Stale {
                                div { class: "banner banner-stale",
                                    p { "Data is stale" }
                                    p { class: "muted", "Last update: {captured}" }
                                }
                            }
                            div { class: "readings",
                                div { class: "reading",
                                    div { class: "reading-value", "{format_temperature(Some(s.temperature))}" }
                                    div { class: "muted", "Temperature" }
                                }
                                Gauge {
                                    value: humidity,
                                    start_angle: 45.0,
                                    stop_angle: 315.0,
                                    size: 140,
                                    stroke: 10,
                                    track_class: "gauge-track".to_string(),
                                    progress_class: "gauge-progress".to_string(),
                                    div { class: "reading-value", "{format_humidity(Some(s.humidity))}" }
                                }
                            }
                            dl { class: "facts",
                                dt { "Device" } dd { "{s.device_id}" }
                                if let Some(bt) = s.bluetooth_active {
                                    dt { "Bluetooth" } dd { if bt { "On" } else { "Off" } }
                                }
                                if let Some(up) = s.uptime_seconds {
                                    dt { "Uptime" } dd { "{format_uptime(up)}" }
                                }
                                if let Some(free) = s.free_memory_bytes {
                                    dt { "Free memory" } dd { "{bytes_to_kilobytes(free)} KB" }
                                }
                            }
                            time { class: "muted small", datetime: "{s.captured_at.to_rfc3339()}", "Captured {captured}" }
                        }
                    }
                    None if snap.status == FeedStatus::Stale => rsx! {
                        div { class: "banner banner-stale",
                            p { "No data from the device" }
                            if let Some(err) = &snap.last_error { p { class: "muted small", "{err}" } }
                        }
                    },
                    None => rsx! {
                        div { class: "skeleton",
                            div { class: "skeleton-line wide" }
                            div { class: "skeleton-line" }
                        }
                    },
                }
            }

            button { class: "btn", disabled: refreshing, onclick: on_refresh,
                if refreshing { "Refreshing..." } else { "Refresh" }
            }
        }
    }
}
