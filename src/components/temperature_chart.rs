use std::rc::Rc;

use dioxus::prelude::*;

use crate::api::{fetch_history, fetch_stats, reply};
use crate::components::close_gate_on_rejection;
use crate::shared::auth::{AuthGate, KeyStore};
use crate::shared::history::{chart_points, value_bounds, ChartPoint, HistoryRange};
use crate::shared::types::StatsResponse;
use crate::utils::format::{format_humidity, format_temperature, local_offset};

#[allow(non_snake_case)]
#[component]
pub fn TemperatureChart() -> Element {
    let gate = use_context::<Signal<AuthGate>>();
    let store = use_context::<Rc<dyn KeyStore>>();
    let mut range = use_signal(HistoryRange::default);
    let mut hovered = use_signal(|| Option::<usize>::None);

    // Re-runs whenever `range` changes.
    let history = use_resource({
        let store = store.clone();
        move || {
            let store = store.clone();
            let range = range();
            async move {
                let key = gate.peek().key.clone()?;
                let result = reply(fetch_history(key, range).await);
                close_gate_on_rejection(gate, &*store, &result);
                result.ok().map(|h| chart_points(range, &h.records, local_offset))
            }
        }
    });
    let stats = use_resource(move || {
        let store = store.clone();
        let hours = range().hours();
        async move {
            let key = gate.peek().key.clone()?;
            let result = reply(fetch_stats(key, hours).await);
            close_gate_on_rejection(gate, &*store, &result);
            result.ok()
        }
    });

    let points: Vec<ChartPoint> = history.read_unchecked().clone().flatten().unwrap_or_default();
    let stats_v = stats.read_unchecked().clone().flatten();

    // Visual params
    let width = 640.0f64;
    let height = 180.0f64;
    let padding = 24.0f64;
    let (lo, hi) = value_bounds(&points)
        .map(|(lo, hi)| (lo.floor() - 1.0, hi.ceil() + 1.0))
        .unwrap_or((0.0, 1.0));
    let step = if points.len() > 1 {
        (width - padding * 2.0) / (points.len() - 1) as f64
    } else {
        0.0
    };
    let x_at = move |i: usize| padding + step * i as f64;
    let y_at = move |v: f64| padding + (hi - v) / (hi - lo) * height;
    let series = |pick: fn(&ChartPoint) -> Option<f64>| -> String {
        points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| pick(p).map(|v| format!("{:.1},{:.1}", x_at(i), y_at(v))))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let inside_line = series(|p| p.inside);
    let outside_line = series(|p| p.outside);
    let view_box = format!("0 0 {} {}", width, height + padding * 2.0);
    // Roughly six axis labels whatever the range.
    let label_every = (points.len() / 6).max(1);
    let current = range();

    rsx! {
        div { class: "card",
            div { class: "card-head",
                h2 { class: "card-subtitle", "Temperature" }
                div { class: "segmented",
                    for r in HistoryRange::ALL {
                        button {
                            key: "{r.label()}",
                            class: if r == current { "segment active" } else { "segment" },
                            onclick: move |_| {
                                hovered.set(None);
                                range.set(r);
                            },
                            "{r.label()}"
                        }
                    }
                }
            }
            if points.is_empty() {
                div { class: "muted chart-empty", "No history for this range" }
            } else {
                svg { class: "chart", view_box: "{view_box}", width: "100%",
                    line { x1: "{padding}", y1: "{padding + height}", x2: "{width - padding}", y2: "{padding + height}", class: "axis" }
                    polyline { class: "series-inside", points: "{inside_line}", fill: "none", stroke_width: "2" }
                    polyline { class: "series-outside", points: "{outside_line}", fill: "none", stroke_width: "2" }
                    {
                        points.iter().enumerate().filter(|(i, _)| i % label_every == 0).map(|(i, p)| {
                            rsx! { text { key: "{i}", x: "{x_at(i)}", y: "{height + padding + 16.0}", class: "axis-label", text_anchor: "middle", "{p.label}" } }
                        })
                    }
                    // Invisible hover columns
                    {
                        points.iter().enumerate().map(|(i, _)| {
                            let w = step.max(8.0);
                            rsx! { rect {
                                key: "hit-{i}", x: "{x_at(i) - w / 2.0}", y: "{padding}", width: "{w}", height: "{height}", fill: "transparent",
                                onmouseenter: move |_| hovered.set(Some(i)),
                                onmouseleave: move |_| hovered.set(None),
                                ontouchstart: move |_| hovered.set(Some(i)),
                                ontouchend: move |_| hovered.set(None),
                            }}
                        })
                    }
                    {
                        match hovered().and_then(|i| points.get(i).map(|p| (i, p))) {
                            Some((i, p)) => {
                                let x = x_at(i);
                                let tip_w = 120.0f64;
                                let tip_h = 50.0f64;
                                let tip_x = (x - tip_w / 2.0).clamp(padding, width - padding - tip_w);
                                rsx! { g { key: "tooltip",
                                    line { x1: "{x}", y1: "{padding}", x2: "{x}", y2: "{padding + height}", class: "cursor" }
                                    rect { x: "{tip_x}", y: "4", width: "{tip_w}", height: "{tip_h}", rx: "6", class: "tooltip" }
                                    text { x: "{tip_x + 8.0}", y: "20", class: "tooltip-text", "{p.label}" }
                                    text { x: "{tip_x + 8.0}", y: "34", class: "tooltip-text", "in {format_temperature(p.inside)}" }
                                    text { x: "{tip_x + 8.0}", y: "48", class: "tooltip-text", "out {format_temperature(p.outside)}" }
                                }}
                            }
                            None => rsx! { Fragment {} },
                        }
                    }
                }
                div { class: "legend",
                    span { class: "legend-inside", "Inside" }
                    span { class: "legend-outside", "Outside" }
                }
            }
            StatsRow { stats: stats_v }
        }
    }
}

#[allow(non_snake_case)]
#[component]
fn StatsRow(stats: Option<StatsResponse>) -> Element {
    let s = stats.unwrap_or_default();
    rsx! {
        div { class: "stats",
            div {
                div { class: "muted small", "Inside" }
                div { "{format_temperature(s.min_temp_in)} / {format_temperature(s.avg_temp_in)} / {format_temperature(s.max_temp_in)}" }
            }
            div {
                div { class: "muted small", "Humidity" }
                div { "{format_humidity(s.min_hum_in)} / {format_humidity(s.avg_hum_in)} / {format_humidity(s.max_hum_in)}" }
            }
            div {
                div { class: "muted small", "Outside" }
                div { "{format_temperature(s.min_temp_out)} / {format_temperature(s.avg_temp_out)} / {format_temperature(s.max_temp_out)}" }
            }
            div { class: "muted small stats-caption", "min / avg / max over {s.period_hours}h · {s.total_records} records" }
        }
    }
}
