use std::rc::Rc;

use dioxus::prelude::*;

use crate::api::{fetch_settings, reply, save_settings};
use crate::components::close_gate_on_rejection;
use crate::shared::auth::{AuthGate, KeyStore};
use crate::shared::settings::{Relay, Schedule, Settings, MAX_DISPLAY_MODE, MAX_DISPLAY_TIMEOUT_SECS};

#[derive(Debug, Clone, PartialEq)]
enum SaveState {
    Idle,
    Saving,
    Saved,
    Failed(String),
}

/// Board settings form. The whole object is posted on save.
#[allow(non_snake_case)]
#[component]
pub fn SettingsPanel(on_close: EventHandler<()>) -> Element {
    let gate = use_context::<Signal<AuthGate>>();
    let store = use_context::<Rc<dyn KeyStore>>();
    let mut draft = use_signal(|| Option::<Settings>::None);
    let mut save_state = use_signal(|| SaveState::Idle);
    let mut load_error = use_signal(|| Option::<String>::None);

    let _loaded = use_resource({
        let store = store.clone();
        move || {
            let store = store.clone();
            async move {
                let Some(key) = gate.peek().key.clone() else {
                    return;
                };
                let result = reply(fetch_settings(key).await);
                if close_gate_on_rejection(gate, &*store, &result) {
                    return;
                }
                match result {
                    Ok(s) => draft.set(Some(s)),
                    Err(e) => load_error.set(Some(e.to_string())),
                }
            }
        }
    });

    let on_save = move |_| {
        let Some(wanted) = draft() else {
            return;
        };
        let Some(key) = gate.peek().key.clone() else {
            return;
        };
        let store = store.clone();
        save_state.set(SaveState::Saving);
        spawn(async move {
            let result = reply(save_settings(key, wanted.clamped()).await);
            if close_gate_on_rejection(gate, &*store, &result) {
                return;
            }
            match result {
                Ok(saved) => {
                    draft.set(Some(saved));
                    save_state.set(SaveState::Saved);
                }
                Err(e) => save_state.set(SaveState::Failed(e.to_string())),
            }
        });
    };

    // Edits go through `clamped` so the form never shows an out-of-range value.
    let mut edit = move |f: &dyn Fn(&mut Settings)| {
        let mut w = draft.write();
        if let Some(s) = w.as_mut() {
            f(s);
            *s = s.clone().clamped();
        }
        save_state.set(SaveState::Idle);
    };

    let Some(settings) = draft() else {
        return rsx! {
            div { class: "card",
                div { class: "card-head",
                    h2 { class: "card-subtitle", "Settings" }
                    button { class: "btn btn-ghost", onclick: move |_| on_close.call(()), "Back" }
                }
                {
                    match load_error() {
                        Some(err) => rsx! { div { class: "banner banner-stale", "Could not load settings: {err}" } },
                        None => rsx! { div { class: "skeleton", div { class: "skeleton-line wide" } } },
                    }
                }
            }
        };
    };
    let saving = save_state() == SaveState::Saving;

    rsx! {
        div { class: "card",
            div { class: "card-head",
                h2 { class: "card-subtitle", "Settings" }
                button { class: "btn btn-ghost", onclick: move |_| on_close.call(()), "Back" }
            }

            section { class: "form-section",
                h3 { "Display" }
                label { class: "field",
                    span { "Mode" }
                    select {
                        value: "{settings.display_mode}",
                        onchange: move |e| {
                            let mode = e.value().parse().unwrap_or(0);
                            edit(&|s| s.display_mode = mode);
                        },
                        for m in 0..=MAX_DISPLAY_MODE {
                            option { key: "{m}", value: "{m}", selected: m == settings.display_mode,
                                {Settings { display_mode: m, ..Settings::default() }.display_mode_label()}
                            }
                        }
                    }
                }
                NumberField {
                    label: "Timeout (s)",
                    value: settings.display_timeout as u32,
                    max: MAX_DISPLAY_TIMEOUT_SECS as u32,
                    on_change: move |v: u32| edit(&|s| s.display_timeout = v as u16),
                }
                NumberField {
                    label: "Screen rotation (s)",
                    value: settings.display_change_mode_timeout as u32,
                    max: MAX_DISPLAY_TIMEOUT_SECS as u32,
                    on_change: move |v: u32| edit(&|s| s.display_change_mode_timeout = v as u16),
                }
                Toggle {
                    label: "Forecast screen",
                    checked: settings.show_forecast_screen,
                    on_change: move |v: bool| edit(&|s| s.show_forecast_screen = v),
                }
                Toggle {
                    label: "Temperature screen",
                    checked: settings.show_temp_screen,
                    on_change: move |v: bool| edit(&|s| s.show_temp_screen = v),
                }
            }

            section { class: "form-section",
                h3 { "Relays" }
                Toggle {
                    label: "Manual control",
                    checked: settings.relay_mode,
                    on_change: move |v: bool| edit(&|s| s.relay_mode = v),
                }
                if settings.relay_mode {
                    Toggle {
                        label: "Day relay on",
                        checked: settings.manual_day_state,
                        on_change: move |v: bool| edit(&|s| s.manual_day_state = v),
                    }
                    Toggle {
                        label: "Night relay on",
                        checked: settings.manual_night_state,
                        on_change: move |v: bool| edit(&|s| s.manual_night_state = v),
                    }
                }
                for relay in Relay::ALL {
                    ScheduleRow {
                        key: "{relay.label()}",
                        relay,
                        schedule: settings.schedule(relay),
                        on_change: move |sch: Schedule| edit(&|s| s.set_schedule(relay, sch)),
                    }
                }
            }

            section { class: "form-section",
                h3 { "Fan" }
                NumberField {
                    label: "Delay (s)",
                    value: settings.fan_delay,
                    max: u32::MAX,
                    on_change: move |v: u32| edit(&|s| s.fan_delay = v),
                }
                NumberField {
                    label: "Duration (min)",
                    value: settings.fan_duration,
                    max: u32::MAX,
                    on_change: move |v: u32| edit(&|s| s.fan_duration = v),
                }
                Toggle {
                    label: "Offline mode",
                    checked: settings.offline_mode_active,
                    on_change: move |v: bool| edit(&|s| s.offline_mode_active = v),
                }
            }

            div { class: "form-actions",
                {
                    match save_state() {
                        SaveState::Saved => rsx! { span { class: "ok", "Saved" } },
                        SaveState::Failed(err) => rsx! { span { class: "error", "Save failed: {err}" } },
                        _ => rsx! { Fragment {} },
                    }
                }
                button { class: "btn", disabled: saving, onclick: on_save,
                    if saving { "Saving..." } else { "Save" }
                }
            }
        }
    }
}

#[allow(non_snake_case)]
#[component]
fn NumberField(label: &'static str, value: u32, max: u32, on_change: EventHandler<u32>) -> Element {
    rsx! {
        label { class: "field",
            span { "{label}" }
            input {
                r#type: "number",
                min: "0",
                max: "{max}",
                value: "{value}",
                onchange: move |e| {
                    let v = e.value().trim().parse::<u32>().unwrap_or(0).min(max);
                    on_change.call(v);
                },
            }
        }
    }
}

#[allow(non_snake_case)]
#[component]
fn Toggle(label: &'static str, checked: bool, on_change: EventHandler<bool>) -> Element {
    rsx! {
        label { class: "field toggle",
            span { "{label}" }
            input {
                r#type: "checkbox",
                checked,
                onchange: move |e| on_change.call(e.checked()),
            }
        }
    }
}

#[allow(non_snake_case)]
#[component]
fn ScheduleRow(relay: Relay, schedule: Schedule, on_change: EventHandler<Schedule>) -> Element {
    let time = |(h, m): (u8, u8)| format!("{h:02}:{m:02}");
    let parse = |raw: &str| -> Option<(u8, u8)> {
        let (h, m) = raw.split_once(':')?;
        Some((h.parse().ok()?, m.parse().ok()?))
    };
    rsx! {
        div { class: "field schedule",
            span { "{relay.label()}" }
            input {
                r#type: "time",
                value: "{time(schedule.on)}",
                onchange: move |e| {
                    if let Some(on) = parse(&e.value()) {
                        on_change.call(Schedule { on, ..schedule });
                    }
                },
            }
            span { class: "muted", "to" }
            input {
                r#type: "time",
                value: "{time(schedule.off)}",
                onchange: move |e| {
                    if let Some(off) = parse(&e.value()) {
                        on_change.call(Schedule { off, ..schedule });
                    }
                },
            }
        }
    }
}
