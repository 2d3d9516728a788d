use std::rc::Rc;

use dioxus::prelude::*;

use crate::shared::auth::{AuthGate, KeyStore};
use crate::shared::types::WeatherData;
use crate::utils::format::format_local;

/// Outdoor conditions, refreshed on the telemetry cadence.
///
/// A failed refresh keeps the last forecast; with none yet the placeholders
/// stay in place.
#[allow(non_snake_case)]
#[component]
pub fn WeatherCard() -> Element {
    let gate = use_context::<Signal<AuthGate>>();
    let store = use_context::<Rc<dyn KeyStore>>();
    let weather = use_signal(|| Option::<WeatherData>::None);

    #[cfg(feature = "web")]
    {
        use dioxus::logger::tracing::debug;
        use gloo_timers::future::TimeoutFuture;

        use crate::api::{fetch_weather, get_feed_config, reply};
        use crate::components::close_gate_on_rejection;
        use crate::components::refresh::{refresh_every, Next};

        let mut weather = weather;
        use_future(move || {
            let store = store.clone();
            async move {
                let config = get_feed_config().await.unwrap_or_default();
                let delay_ms = config.interval().as_millis() as u32;
                refresh_every(
                    || {
                        let key = gate.peek().key.clone()?;
                        Some(async move { reply(fetch_weather(key).await) })
                    },
                    |result| {
                        if close_gate_on_rejection(gate, &*store, &result) {
                            return Next::Stop;
                        }
                        match result {
                            Ok(w) => weather.set(Some(w)),
                            Err(e) => debug!("[weather] refresh failed: {}", e),
                        }
                        Next::Wait
                    },
                    || TimeoutFuture::new(delay_ms),
                )
                .await;
            }
        });
    }
    #[cfg(not(feature = "web"))]
    let _ = (gate, store);

    let weather_v = weather.read();

    rsx! {
        div { class: "card",
            h2 { class: "card-subtitle", "Outside" }
            {
                match &*weather_v {
                    Some(w) => rsx! {
                        div { class: "weather-now",
                            div { class: "reading-value", "{w.current_temp}°" }
                            div {
                                div { "{w.condition_label()}" }
                                div { class: "muted small", "Feels like {w.current_feels_like}° · {w.humidity}% · {w.wind_speed:.1} m/s" }
                            }
                        }
                        div { class: "forecast",
                            for (name, temp) in w.forecast() {
                                div { key: "{name}", class: "forecast-slot",
                                    div { class: "muted small", "{name}" }
                                    div {
                                        {temp.map(|t| format!("{t}°")).unwrap_or_else(|| "--".to_string())}
                                    }
                                }
                            }
                        }
                        div { class: "muted small", "Updated {format_local(&w.timestamp)}" }
                    },
                    None => rsx! {
                        div { class: "weather-now",
                            div { class: "reading-value", "--°" }
                            div { class: "muted", "Weather unavailable" }
                        }
                    },
                }
            }
        }
    }
}
