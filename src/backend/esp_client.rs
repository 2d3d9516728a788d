#![cfg(feature = "server")]
use std::error::Error as _;
use std::time::Duration;

use dioxus::logger::tracing::{debug, warn};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

use crate::backend::config::ServiceArgs;
use crate::shared::auth::{AccessKey, HEADER_NAME};
use crate::shared::error::{EspError, EspResult};
use crate::shared::history::HistoryRange;
use crate::shared::settings::Settings;
use crate::shared::types::{HistoryResponse, StatsResponse, TelemetrySample, WeatherData};

/// Typed client for `esp_service`.
///
/// Holds the connection pool only; the access key travels with each call.
#[derive(Debug, Clone)]
pub struct EspClient {
    http: Client,
    base_url: String,
}

impl EspClient {
    pub fn new(args: &ServiceArgs) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(args.connect_timeout_secs))
            .timeout(Duration::from_secs(args.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: args.service_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn telemetry(&self, key: &AccessKey) -> EspResult<TelemetrySample> {
        self.fetch(key, Method::GET, "/esp_service/telemetry", None)
            .await
    }

    pub async fn weather(&self, key: &AccessKey) -> EspResult<WeatherData> {
        self.fetch(key, Method::GET, "/esp_service/weather", None).await
    }

    pub async fn history(&self, key: &AccessKey, range: HistoryRange) -> EspResult<HistoryResponse> {
        let path = format!(
            "/esp_service/history?hours={}&max_points={}",
            range.hours(),
            range.max_points()
        );
        self.fetch(key, Method::GET, &path, None).await
    }

    pub async fn stats(&self, key: &AccessKey, hours: u32) -> EspResult<StatsResponse> {
        let path = format!("/esp_service/stats?hours={}", hours);
        self.fetch(key, Method::GET, &path, None).await
    }

    pub async fn settings(&self, key: &AccessKey) -> EspResult<Settings> {
        self.fetch(key, Method::GET, "/esp_service/settings", None)
            .await
    }

    /// Replace the board settings. Values are clamped into range first.
    pub async fn save_settings(&self, key: &AccessKey, settings: Settings) -> EspResult<Settings> {
        let settings = settings.clamped();
        let body =
            serde_json::to_value(&settings).map_err(|e| EspError::Decode(e.to_string()))?;
        // The service answers with `null` or an empty body.
        self.send(key, Method::POST, "/esp_service/settings", Some(body))
            .await?;
        Ok(settings)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        key: &AccessKey,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> EspResult<T> {
        let method_s = method.as_str().to_string();
        let bytes = self.send(key, method, path, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            let snip = String::from_utf8_lossy(&bytes);
            let snip = snip.chars().take(300).collect::<String>();
            warn!(
                "[esp] decoding JSON from {} {} failed: {}\nBody snippet: {}",
                method_s, path, e, snip
            );
            EspError::Decode(e.to_string())
        })
    }

    async fn send(
        &self,
        key: &AccessKey,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> EspResult<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[esp] {} {}", method.as_str(), url);
        let method_s = method.as_str().to_string();
        let mut req = self
            .http
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header(HEADER_NAME, key.as_str())
            .header("Cache-Control", "no-store");
        if let Some(b) = body {
            req = req.json(&b);
        }
        let res = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("[esp] request error on {} {}: {}", method_s, url, e);
                if e.is_timeout() {
                    warn!("[esp] hint: request timed out");
                }
                if e.is_connect() {
                    warn!("[esp] hint: connection failed; check ESP_SERVICE_URL and network reachability");
                }
                let mut chain = Vec::new();
                let mut src: Option<&dyn std::error::Error> = e.source();
                while let Some(s) = src {
                    chain.push(s.to_string());
                    src = s.source();
                }
                if !chain.is_empty() {
                    debug!("[esp] error chain: {}", chain.join(" -> "));
                }
                return Err(EspError::Transport(e.to_string()));
            }
        };
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(
                "[esp] {} {} failed: status={} body={}",
                method_s, url, status, text
            );
            return Err(EspError::from_status(status.as_u16()));
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| EspError::Transport(format!("reading body from {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const GOOD_KEY: &str = "abc123";

    #[derive(Clone, Default)]
    struct FakeService {
        settings: Arc<Mutex<Option<Settings>>>,
        posts: Arc<Mutex<usize>>,
    }

    fn authorised(headers: &HeaderMap) -> Result<(), StatusCode> {
        match headers.get(HEADER_NAME).and_then(|v| v.to_str().ok()) {
            Some(GOOD_KEY) => Ok(()),
            Some(_) => Err(StatusCode::UNAUTHORIZED),
            None => Err(StatusCode::FORBIDDEN),
        }
    }

    async fn telemetry(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        authorised(&headers)?;
        Ok(Json(json!({
            "device_id": "greenhouse_01",
            "temperature": 22.5,
            "humidity": 41.0,
            "free_memory": 150000,
            "uptime": 3600,
            "timestamp": "2026-10-17T11:59:30.000001",
            "bluetooth_is_active": false
        })))
    }

    async fn history(
        headers: HeaderMap,
        Query(q): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        authorised(&headers)?;
        let hours: u32 = q.get("hours").and_then(|h| h.parse().ok()).unwrap_or(0);
        let points: usize = q.get("max_points").and_then(|p| p.parse().ok()).unwrap_or(0);
        let records: Vec<Value> = (0..points.min(3))
            .map(|i| {
                json!({
                    "timestamp": format!("2026-10-17T0{}:00:00", i),
                    "temp_in": 20.0 + i as f64,
                    "temp_out": null,
                    "device_id": "greenhouse_01"
                })
            })
            .collect();
        Ok(Json(json!({
            "period_hours": hours,
            "records_count": records.len(),
            "records": records
        })))
    }

    async fn stats(
        headers: HeaderMap,
        Query(q): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        authorised(&headers)?;
        Ok(Json(json!({
            "period_hours": q.get("hours").and_then(|h| h.parse::<u32>().ok()).unwrap_or(24),
            "total_records": 10,
            "esp_records": 6,
            "weather_records": 4,
            "avg_temp_in": 21.0,
            "min_temp_in": 19.5,
            "max_temp_in": 23.0,
            "avg_hum_in": null,
            "min_hum_in": null,
            "max_hum_in": null,
            "avg_temp_out": 3.0,
            "min_temp_out": -1.0,
            "max_temp_out": 6.0
        })))
    }

    async fn weather(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        authorised(&headers)?;
        Err(StatusCode::NOT_FOUND)
    }

    async fn get_settings(
        State(svc): State<FakeService>,
        headers: HeaderMap,
    ) -> Result<Json<Settings>, StatusCode> {
        authorised(&headers)?;
        let current = svc.settings.lock().unwrap().clone();
        current.map(Json).ok_or(StatusCode::NOT_FOUND)
    }

    async fn post_settings(
        State(svc): State<FakeService>,
        headers: HeaderMap,
        Json(body): Json<Settings>,
    ) -> Result<Json<Value>, StatusCode> {
        authorised(&headers)?;
        *svc.settings.lock().unwrap() = Some(body);
        *svc.posts.lock().unwrap() += 1;
        Ok(Json(Value::Null))
    }

    async fn spawn_fake() -> (EspClient, FakeService) {
        let svc = FakeService::default();
        let app = Router::new()
            .route("/esp_service/telemetry", get(telemetry))
            .route("/esp_service/history", get(history))
            .route("/esp_service/stats", get(stats))
            .route("/esp_service/weather", get(weather))
            .route(
                "/esp_service/settings",
                get(get_settings).post(post_settings),
            )
            .with_state(svc.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = EspClient::new(&ServiceArgs {
            service_url: format!("http://{}/", addr),
            connect_timeout_secs: 2,
            request_timeout_secs: 5,
        })
        .unwrap();
        (client, svc)
    }

    fn key(s: &str) -> AccessKey {
        AccessKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn telemetry_is_fetched_with_access_key() {
        let (client, _svc) = spawn_fake().await;
        let sample = client.telemetry(&key(GOOD_KEY)).await.unwrap();
        assert_eq!(sample.device_id, "greenhouse_01");
        assert_eq!(sample.free_memory_bytes, Some(150_000));
        assert!(!client.base_url().ends_with('/'));
    }

    #[tokio::test]
    async fn wrong_key_is_an_auth_error() {
        let (client, _svc) = spawn_fake().await;
        let err = client.telemetry(&key("nope")).await.unwrap_err();
        assert_eq!(err, EspError::Auth(401));
        assert!(client.settings(&key("nope")).await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn other_statuses_are_not_auth_errors() {
        let (client, _svc) = spawn_fake().await;
        let err = client.weather(&key(GOOD_KEY)).await.unwrap_err();
        assert_eq!(err, EspError::Status(404));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let client = EspClient::new(&ServiceArgs {
            service_url: "http://127.0.0.1:1".into(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
        })
        .unwrap();
        let err = client.telemetry(&key(GOOD_KEY)).await.unwrap_err();
        assert!(matches!(err, EspError::Transport(_)));
    }

    #[tokio::test]
    async fn history_passes_range_preset() {
        let (client, _svc) = spawn_fake().await;
        let resp = client.history(&key(GOOD_KEY), HistoryRange::H12).await.unwrap();
        assert_eq!(resp.period_hours, 12);
        assert_eq!(resp.records.len(), 3);
        assert_eq!(resp.records[1].temp_in, Some(21.0));
    }

    #[tokio::test]
    async fn stats_decode_missing_aggregates() {
        let (client, _svc) = spawn_fake().await;
        let stats = client.stats(&key(GOOD_KEY), 48).await.unwrap();
        assert_eq!(stats.period_hours, 48);
        assert_eq!(stats.min_temp_out, Some(-1.0));
        assert_eq!(stats.avg_hum_in, None);
    }

    #[tokio::test]
    async fn saving_same_settings_twice_is_idempotent() {
        let (client, svc) = spawn_fake().await;
        let k = key(GOOD_KEY);
        let wanted = Settings {
            display_mode: 2,
            fan_duration: 15,
            relay_mode: true,
            manual_day_state: true,
            ..Settings::default()
        };

        client.save_settings(&k, wanted.clone()).await.unwrap();
        let first = client.settings(&k).await.unwrap();
        client.save_settings(&k, wanted.clone()).await.unwrap();
        let second = client.settings(&k).await.unwrap();

        assert_eq!(first, wanted);
        assert_eq!(second, first);
        assert_eq!(*svc.posts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn saved_settings_are_clamped() {
        let (client, _svc) = spawn_fake().await;
        let k = key(GOOD_KEY);
        let saved = client
            .save_settings(
                &k,
                Settings {
                    day_on_hour: 30,
                    display_timeout: 10_000,
                    ..Settings::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.day_on_hour, 23);
        assert_eq!(client.settings(&k).await.unwrap().display_timeout, 3600);
    }
}
