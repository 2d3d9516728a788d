pub mod gauge;
pub mod login;
#[cfg(any(feature = "web", test))]
pub mod refresh;
pub mod settings_panel;
pub mod telemetry_card;
pub mod temperature_chart;
pub mod weather_card;

pub use gauge::Gauge;
pub use login::Login;
pub use settings_panel::SettingsPanel;
pub use telemetry_card::TelemetryCard;
pub use temperature_chart::TemperatureChart;
pub use weather_card::WeatherCard;

use dioxus::prelude::*;

use crate::shared::auth::{is_rejection, AuthGate, KeyStore};
use crate::shared::error::EspResult;

/// Sign out on a 401/403. Any other result leaves the gate signal untouched.
pub fn close_gate_on_rejection<T>(
    mut gate: Signal<AuthGate>,
    store: &dyn KeyStore,
    result: &EspResult<T>,
) -> bool {
    let rejected = is_rejection(result);
    if rejected {
        gate.write().reject(store);
    }
    rejected
}
