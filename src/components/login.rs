use std::rc::Rc;

use dioxus::prelude::*;

use crate::shared::auth::{AccessKey, AuthGate, KeyStore};

/// Shown while no usable key is known.
#[allow(non_snake_case)]
#[component]
pub fn Login() -> Element {
    let mut gate = use_context::<Signal<AuthGate>>();
    let store = use_context::<Rc<dyn KeyStore>>();
    let mut input = use_signal(String::new);

    let mut submit = move || {
        if let Some(key) = AccessKey::new(input()) {
            gate.write().sign_in(&*store, key);
            input.set(String::new());
        }
    };
    let error = gate.read().error.clone();

    rsx! {
        div { class: "card login",
            h1 { class: "card-title", "Access key required" }
            p { class: "muted", "Open the dashboard from the link the bot sent you, or paste your key below." }
            if let Some(err) = error {
                div { class: "banner banner-error", "{err}" }
            }
            form {
                class: "login-form",
                onsubmit: move |e| {
                    e.prevent_default();
                    submit();
                },
                input {
                    r#type: "password",
                    placeholder: "Access key",
                    autocomplete: "off",
                    value: "{input}",
                    oninput: move |e| input.set(e.value()),
                }
                button { class: "btn", r#type: "submit", disabled: input().trim().is_empty(), "Continue" }
            }
        }
    }
}
