/// Host-theme colours handed over by the Telegram client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostTheme {
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub accent: Option<String>,
}

impl HostTheme {
    /// `(css variable, value)` pairs to set on the document root.
    pub fn css_vars(&self) -> Vec<(&'static str, &str)> {
        [
            ("--background", self.background.as_deref()),
            ("--foreground", self.foreground.as_deref()),
            ("--accent", self.accent.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
        .collect()
    }
}

/// Whether the page runs inside a Telegram Mini App.
///
/// Detected once at startup and provided through context; every call is a
/// no-op when the host is absent.
#[derive(Clone, Default)]
pub enum TelegramHost {
    #[default]
    Absent,
    #[cfg(feature = "web")]
    Present(wasm_bindgen::JsValue),
}

impl TelegramHost {
    #[cfg(feature = "web")]
    pub fn detect() -> Self {
        use js_sys::Reflect;
        use wasm_bindgen::JsValue;

        let Some(window) = web_sys::window() else {
            return Self::Absent;
        };
        let web_app = Reflect::get(&window, &JsValue::from_str("Telegram"))
            .ok()
            .filter(|t| t.is_object())
            .and_then(|t| Reflect::get(&t, &JsValue::from_str("WebApp")).ok())
            .filter(|w| w.is_object());
        match web_app {
            Some(w) => {
                dioxus::logger::tracing::info!("[telegram] running inside Telegram");
                Self::Present(w)
            }
            None => Self::Absent,
        }
    }

    #[cfg(not(feature = "web"))]
    pub fn detect() -> Self {
        Self::Absent
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Tell the host the page is ready and take the full height.
    pub fn ready(&self) {
        self.call("ready");
        self.call("expand");
    }

    pub fn close(&self) {
        self.call("close");
    }

    pub fn theme(&self) -> HostTheme {
        match self {
            Self::Absent => HostTheme::default(),
            #[cfg(feature = "web")]
            Self::Present(w) => {
                use js_sys::Reflect;
                use wasm_bindgen::JsValue;

                let params = Reflect::get(w, &JsValue::from_str("themeParams"))
                    .ok()
                    .filter(|p| p.is_object());
                let colour = |name: &str| {
                    params
                        .as_ref()
                        .and_then(|p| Reflect::get(p, &JsValue::from_str(name)).ok())
                        .and_then(|v| v.as_string())
                };
                HostTheme {
                    background: colour("bg_color"),
                    foreground: colour("text_color"),
                    accent: colour("button_color"),
                }
            }
        }
    }

    /// Copy the host colours onto `:root` as CSS variables.
    pub fn apply_theme(&self) {
        #[cfg(feature = "web")]
        {
            use wasm_bindgen::JsCast;

            let theme = self.theme();
            let Some(root) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.document_element())
            else {
                return;
            };
            let style = root.unchecked_into::<web_sys::HtmlElement>().style();
            for (name, value) in theme.css_vars() {
                let _ = style.set_property(name, value);
            }
        }
    }

    fn call(&self, method: &str) {
        match self {
            Self::Absent => {
                let _ = method;
            }
            #[cfg(feature = "web")]
            Self::Present(w) => {
                use js_sys::{Function, Reflect};
                use wasm_bindgen::{JsCast, JsValue};

                let called = Reflect::get(w, &JsValue::from_str(method))
                    .ok()
                    .and_then(|f| f.dyn_into::<Function>().ok())
                    .map(|f| f.call0(w));
                if !matches!(called, Some(Ok(_))) {
                    dioxus::logger::tracing::warn!("[telegram] WebApp.{}() failed", method);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_host_is_inert() {
        let host = TelegramHost::detect();
        assert!(!host.is_present());
        host.ready();
        host.apply_theme();
        host.close();
        assert_eq!(host.theme(), HostTheme::default());
    }

    #[test]
    fn only_known_colours_become_css_vars() {
        let theme = HostTheme {
            background: Some("#17212b".into()),
            foreground: None,
            accent: Some("#5288c1".into()),
        };
        assert_eq!(
            theme.css_vars(),
            vec![("--background", "#17212b"), ("--accent", "#5288c1")]
        );
    }
}
