use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One snapshot of the board's sensors plus device health fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    /// Free heap in bytes.
    #[serde(rename = "free_memory", default)]
    pub free_memory_bytes: Option<u64>,
    #[serde(rename = "uptime", default)]
    pub uptime_seconds: Option<u64>,
    #[serde(rename = "timestamp", deserialize_with = "utc_lenient::deserialize")]
    pub captured_at: DateTime<Utc>,
    #[serde(rename = "bluetooth_is_active", default)]
    pub bluetooth_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(deserialize_with = "utc_lenient::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub temp_in: Option<f64>,
    #[serde(default)]
    pub hum_in: Option<f64>,
    #[serde(default)]
    pub temp_out: Option<f64>,
    #[serde(default)]
    pub hum_out: Option<f64>,
    #[serde(default)]
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub period_hours: u32,
    #[serde(default)]
    pub records_count: usize,
    pub records: Vec<HistoryRecord>,
}

/// Aggregates over a period, as computed by `esp_service`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub period_hours: u32,
    pub total_records: u64,
    pub esp_records: u64,
    pub weather_records: u64,

    pub avg_temp_in: Option<f64>,
    pub min_temp_in: Option<f64>,
    pub max_temp_in: Option<f64>,

    pub avg_hum_in: Option<f64>,
    pub min_hum_in: Option<f64>,
    pub max_hum_in: Option<f64>,

    pub avg_temp_out: Option<f64>,
    pub min_temp_out: Option<f64>,
    pub max_temp_out: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub current_temp: i32,
    pub current_feels_like: i32,
    pub current_condition: String,
    pub humidity: i32,
    pub wind_speed: f64,
    #[serde(default)]
    pub morning_temp: Option<i32>,
    #[serde(default)]
    pub day_temp: Option<i32>,
    #[serde(default)]
    pub evening_temp: Option<i32>,
    #[serde(default)]
    pub night_temp: Option<i32>,
    #[serde(deserialize_with = "utc_lenient::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "utc_lenient::deserialize")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub api_calls_today: u32,
}

impl WeatherData {
    /// Display label for the condition code; unknown codes pass through.
    pub fn condition_label(&self) -> &str {
        condition_label(&self.current_condition)
    }

    /// `(label, temperature)` pairs for the time-of-day forecast row.
    pub fn forecast(&self) -> [(&'static str, Option<i32>); 4] {
        [
            ("Morning", self.morning_temp),
            ("Day", self.day_temp),
            ("Evening", self.evening_temp),
            ("Night", self.night_temp),
        ]
    }
}

/// `esp_service` serialises naive datetimes (no offset) for some records.
/// Those are read as UTC; anything with an offset is converted.
mod utc_lenient {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }
}

pub fn condition_label(code: &str) -> &str {
    match code {
        "clear" => "Clear",
        "partly_cloudy" => "Partly cloudy",
        "cloudy" => "Cloudy",
        "overcast" => "Overcast",
        "light_rain" => "Light rain",
        "rain" => "Rain",
        "heavy_rain" => "Heavy rain",
        "thunderstorm" => "Thunderstorm",
        "snow" => "Snow",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_decodes_service_payload() {
        let raw = r#"{
            "device_id": "greenhouse_01",
            "temperature": 21.4,
            "humidity": 48.0,
            "free_memory": 153600,
            "uptime": 7260,
            "timestamp": "2026-10-17T12:00:00Z",
            "bluetooth_is_active": true
        }"#;
        let sample: TelemetrySample = serde_json::from_str(raw).unwrap();
        assert_eq!(sample.device_id, "greenhouse_01");
        assert_eq!(sample.free_memory_bytes, Some(153_600));
        assert_eq!(sample.uptime_seconds, Some(7260));
        assert_eq!(sample.bluetooth_active, Some(true));
        assert_eq!(sample.captured_at.to_rfc3339(), "2026-10-17T12:00:00+00:00");
    }

    #[test]
    fn telemetry_optional_fields_may_be_missing() {
        let raw = r#"{"device_id":"d","temperature":1.0,"humidity":2.0,"timestamp":"2026-10-17T12:00:00Z"}"#;
        let sample: TelemetrySample = serde_json::from_str(raw).unwrap();
        assert_eq!(sample.free_memory_bytes, None);
        assert_eq!(sample.uptime_seconds, None);
        assert_eq!(sample.bluetooth_active, None);
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let raw = r#"{"timestamp":"2026-10-17T09:30:00.250000","temp_in":20.5}"#;
        let record: HistoryRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.timestamp.to_rfc3339(), "2026-10-17T09:30:00.250+00:00");
        assert_eq!(record.temp_out, None);
        assert!(utc_lenient::parse("yesterday").is_none());
    }

    #[test]
    fn unknown_weather_condition_is_shown_verbatim() {
        assert_eq!(condition_label("heavy_rain"), "Heavy rain");
        assert_eq!(condition_label("fog"), "fog");
    }
}
