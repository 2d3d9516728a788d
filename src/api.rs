use dioxus::prelude::*;

use crate::shared::auth::AccessKey;
use crate::shared::error::{EspError, EspResult};
use crate::shared::history::HistoryRange;
use crate::shared::poller::FeedConfig;
use crate::shared::settings::Settings;
use crate::shared::types::{HistoryResponse, StatsResponse, TelemetrySample, WeatherData};

// Each call carries the caller's key; the server only forwards it to
// `esp_service`. Service failures travel as `EspError` inside `Ok` so the
// view can single out auth rejections.

#[cfg(feature = "server")]
fn service() -> EspResult<&'static crate::backend::Service> {
    crate::backend::SERVICE.get().ok_or_else(|| {
        eprintln!("esp service client not initialized");
        EspError::Transport("service client not initialized".into())
    })
}

#[server(GetFeedConfig)]
pub async fn get_feed_config() -> Result<FeedConfig, ServerFnError> {
    #[cfg(feature = "server")]
    {
        Ok(service().map(|s| s.feed).unwrap_or_default())
    }
    #[cfg(not(feature = "server"))]
    {
        Ok(FeedConfig::default())
    }
}

#[server(FetchTelemetry)]
pub async fn fetch_telemetry(key: AccessKey) -> Result<EspResult<TelemetrySample>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let svc = match service() {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        Ok(svc.client.telemetry(&key).await)
    }
    #[cfg(not(feature = "server"))]
    {
        let _ = key;
        Ok(Err(EspError::MissingKey))
    }
}

#[server(FetchWeather)]
pub async fn fetch_weather(key: AccessKey) -> Result<EspResult<WeatherData>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let svc = match service() {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        Ok(svc.client.weather(&key).await)
    }
    #[cfg(not(feature = "server"))]
    {
        let _ = key;
        Ok(Err(EspError::MissingKey))
    }
}

#[server(FetchHistory)]
pub async fn fetch_history(
    key: AccessKey,
    range: HistoryRange,
) -> Result<EspResult<HistoryResponse>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let svc = match service() {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        Ok(svc.client.history(&key, range).await)
    }
    #[cfg(not(feature = "server"))]
    {
        let _ = (key, range);
        Ok(Err(EspError::MissingKey))
    }
}

#[server(FetchStats)]
pub async fn fetch_stats(key: AccessKey, hours: u32) -> Result<EspResult<StatsResponse>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let svc = match service() {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        Ok(svc.client.stats(&key, hours).await)
    }
    #[cfg(not(feature = "server"))]
    {
        let _ = (key, hours);
        Ok(Err(EspError::MissingKey))
    }
}

#[server(FetchSettings)]
pub async fn fetch_settings(key: AccessKey) -> Result<EspResult<Settings>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let svc = match service() {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        Ok(svc.client.settings(&key).await)
    }
    #[cfg(not(feature = "server"))]
    {
        let _ = key;
        Ok(Err(EspError::MissingKey))
    }
}

#[server(SaveSettings)]
pub async fn save_settings(
    key: AccessKey,
    settings: Settings,
) -> Result<EspResult<Settings>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let svc = match service() {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        Ok(svc.client.save_settings(&key, settings).await)
    }
    #[cfg(not(feature = "server"))]
    {
        let _ = (key, settings);
        Ok(Err(EspError::MissingKey))
    }
}

/// Fold a server-function failure into the service error space.
pub fn reply<T>(result: Result<EspResult<T>, ServerFnError>) -> EspResult<T> {
    result.unwrap_or_else(|e| Err(EspError::Transport(e.to_string())))
}
