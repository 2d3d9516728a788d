use std::rc::Rc;

use dioxus::prelude::*;

use crate::components::{Login, SettingsPanel, TelemetryCard, TemperatureChart, WeatherCard};
use crate::platform::{key_store, TelegramHost};
use crate::shared::auth::{AuthGate, AuthPhase, KeyStore};
use crate::MAIN_CSS;

#[allow(non_snake_case)]
#[component]
pub fn App() -> Element {
    let store: Rc<dyn KeyStore> = use_context_provider(key_store);
    let host = use_context_provider(TelegramHost::detect);
    let mut gate = use_context_provider(|| Signal::new(AuthGate::default()));
    let mut show_settings = use_signal(|| false);

    // Client only: pick the key up from `?key=` or storage, then probe it.
    #[cfg(feature = "web")]
    {
        use crate::api::{fetch_telemetry, reply};
        use crate::platform::{page_url, replace_url};
        use crate::shared::auth::bootstrap;
        use dioxus::logger::tracing::info;

        use_effect({
            let store = store.clone();
            let host = host.clone();
            move || {
                host.ready();
                host.apply_theme();
                let boot = bootstrap(&*store, &page_url().unwrap_or_default());
                if let Some(clean) = &boot.cleaned_url {
                    info!("[auth] access key taken from the link");
                    replace_url(clean);
                }
                gate.write().with_key(boot.key);
            }
        });

        use_effect({
            let store = store.clone();
            move || {
                if gate.read().phase != AuthPhase::Validating {
                    return;
                }
                let Some(key) = gate.peek().key.clone() else {
                    return;
                };
                let store = store.clone();
                spawn(async move {
                    let result = reply(fetch_telemetry(key).await);
                    gate.write().validated(&*store, &result);
                    info!("[auth] key check finished; phase={:?}", gate.peek().phase);
                });
            }
        });
    }

    let phase = gate.read().phase;
    let on_sign_out = {
        let store = store.clone();
        move |_| {
            show_settings.set(false);
            gate.write().sign_out(&*store);
        }
    };
    let on_close_app = {
        let host = host.clone();
        move |_| host.close()
    };

    rsx! {
        document::Stylesheet { href: MAIN_CSS }
        document::Meta { name: "viewport", content: "width=device-width, initial-scale=1" }
        document::Meta { name: "color-scheme", content: "dark light" }
        div { class: "page",
            {
                match phase {
                    AuthPhase::Bootstrapping | AuthPhase::Validating => rsx! {
                        div { class: "card splash", div { class: "spinner" } p { class: "muted", "Connecting..." } }
                    },
                    AuthPhase::SignedOut => rsx! { Login {} },
                    AuthPhase::Ready => rsx! {
                        header { class: "topbar",
                            span { class: "brand", "ESP32 Monitor" }
                            nav {
                                button {
                                    class: if show_settings() { "btn btn-ghost active" } else { "btn btn-ghost" },
                                    onclick: move |_| show_settings.toggle(),
                                    "Settings"
                                }
                                button { class: "btn btn-ghost", onclick: on_sign_out, "Sign out" }
                                if host.is_present() {
                                    button { class: "btn btn-ghost", onclick: on_close_app, "Close" }
                                }
                            }
                        }
                        if show_settings() {
                            SettingsPanel { on_close: move |_| show_settings.set(false) }
                        } else {
                            div { class: "grid",
                                TelemetryCard {}
                                WeatherCard {}
                            }
                            TemperatureChart {}
                        }
                    },
                }
            }
        }
    }
}
