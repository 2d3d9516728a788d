use chrono::{DateTime, FixedOffset, Utc};

/// Offset of the viewer's time zone at `at`: the browser's on web, the
/// host's elsewhere.
#[cfg(feature = "web")]
pub fn local_offset(at: &DateTime<Utc>) -> FixedOffset {
    use chrono::Offset;
    use js_sys::Date;
    let d = Date::new(&wasm_bindgen::JsValue::from_f64(at.timestamp_millis() as f64));
    // minutes behind UTC
    let behind = d.get_timezone_offset();
    let east = if behind.is_finite() { -(behind as i32) * 60 } else { 0 };
    FixedOffset::east_opt(east).unwrap_or(Utc.fix())
}

#[cfg(not(feature = "web"))]
pub fn local_offset(at: &DateTime<Utc>) -> FixedOffset {
    use chrono::{Local, Offset, TimeZone};
    Local.offset_from_utc_datetime(&at.naive_utc()).fix()
}

/// Local `dd.mm.yyyy hh:mm`.
pub fn format_local(at: &DateTime<Utc>) -> String {
    at.with_timezone(&local_offset(at))
        .format("%d.%m.%Y %H:%M")
        .to_string()
}

/// `7260` -> `2h 1m`.
pub fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

pub fn bytes_to_kilobytes(bytes: u64) -> u64 {
    (bytes as f64 / 1024.0).round() as u64
}

pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}°", v),
        None => "--".to_string(),
    }
}

pub fn format_humidity(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}%", v),
        None => "--%".to_string(),
    }
}

/// Coarse "how long ago" for the stale banner.
pub fn format_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(since).num_seconds().max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{} min ago", secs / 60)
    } else {
        format!("{}h {}m ago", secs / 3600, (secs % 3600) / 60)
    }
}
