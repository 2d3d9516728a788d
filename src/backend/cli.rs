#![cfg(feature = "server")]
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use dioxus::logger::tracing::{info, warn};

use crate::backend::config::{Cli, Command, SettingsAction};
use crate::backend::key_file::FileKeyStore;
use crate::backend::poller::{self, ServiceSource};
use crate::backend::{EspClient, Service, SERVICE};
use crate::shared::auth::{AccessKey, KeyStore, INVALID_KEY_MESSAGE};
use crate::shared::error::EspResult;
use crate::shared::history::{chart_points, HistoryRange};
use crate::shared::poller::{FeedConfig, FeedSnapshot};
use crate::shared::settings::{Relay, Settings};
use crate::shared::types::StatsResponse;
use crate::utils::format::{
    bytes_to_kilobytes, format_age, format_humidity, format_temperature, format_uptime,
    local_offset,
};

/// Set up the shared service and run the requested command.
///
/// Returns `true` when no command was given and the dashboard should start.
pub fn run(cli: Cli) -> Result<bool> {
    let Cli {
        service,
        feed,
        data_dir,
        key,
        command,
    } = cli;
    let client = EspClient::new(&service).context("building HTTP client")?;
    let feed = feed.feed_config();
    let _ = SERVICE.set(Service {
        client: client.clone(),
        feed,
    });
    info!("[esp] service at {}", client.base_url());

    let Some(command) = command else {
        return Ok(true);
    };
    let store = FileKeyStore::in_dir(&data_dir);
    match command {
        Command::Login { access_key } => {
            let key = AccessKey::new(&access_key).ok_or_else(|| anyhow!("access key is empty"))?;
            store.save(&key);
            eprintln!("stored access key in {}", store.path().display());
        }
        Command::Logout => {
            store.clear();
            eprintln!("access key removed");
        }
        other => {
            let key = key
                .as_deref()
                .and_then(AccessKey::new)
                .or_else(|| store.load())
                .ok_or_else(|| anyhow!("no access key; pass --key or run `esp-dash login <KEY>`"))?;
            let rt = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            rt.block_on(remote(other, client, key, feed, &store))?;
        }
    }
    Ok(false)
}

async fn remote(
    command: Command,
    client: EspClient,
    key: AccessKey,
    feed: FeedConfig,
    store: &FileKeyStore,
) -> Result<()> {
    match command {
        Command::Watch { once } => watch(client, key, feed, once, store).await,
        Command::Settings {
            action: SettingsAction::Show,
        } => {
            let settings = checked(store, client.settings(&key).await)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            for relay in Relay::ALL {
                eprintln!("{:<12} {}", relay.label(), settings.schedule(relay).describe());
            }
            Ok(())
        }
        Command::Settings {
            action: SettingsAction::Apply { file },
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let wanted: Settings = serde_json::from_str(&raw)
                .with_context(|| format!("parsing settings from {}", file.display()))?;
            let saved = checked(store, client.save_settings(&key, wanted).await)?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
            Ok(())
        }
        Command::History { range } => {
            let range = HistoryRange::parse(&range)
                .ok_or_else(|| anyhow!("unknown range {range:?}; use 6h, 12h, 24h, 48h or 7d"))?;
            let history = checked(store, client.history(&key, range).await)?;
            for p in chart_points(range, &history.records, local_offset) {
                println!(
                    "{}\tin {}\tout {}",
                    p.label,
                    format_temperature(p.inside),
                    format_temperature(p.outside)
                );
            }
            Ok(())
        }
        Command::Stats { hours } => {
            let stats = checked(store, client.stats(&key, hours).await)?;
            println!("{}", render_stats(&stats));
            Ok(())
        }
        Command::Login { .. } | Command::Logout => Ok(()),
    }
}

async fn watch(
    client: EspClient,
    key: AccessKey,
    feed: FeedConfig,
    once: bool,
    store: &FileKeyStore,
) -> Result<()> {
    let handle = poller::start(ServiceSource::new(client, key), feed);
    let mut rx = handle.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("[poller] interrupted");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = rx.borrow_and_update().clone();
                println!("{}", render_line(&snap, Utc::now()));
                if snap.key_rejected {
                    store.clear();
                    bail!("{INVALID_KEY_MESSAGE}; run `esp-dash login <KEY>`");
                }
                if once {
                    break;
                }
            }
        }
    }
    handle.stop().await;
    Ok(())
}

/// Map a service result, forgetting the stored key on auth rejection.
fn checked<T>(store: &FileKeyStore, result: EspResult<T>) -> Result<T> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.is_auth() => {
            warn!("[auth] {}; clearing stored key", e);
            store.clear();
            bail!("{INVALID_KEY_MESSAGE}; run `esp-dash login <KEY>`")
        }
        Err(e) => Err(anyhow!(e)),
    }
}

pub fn render_line(snap: &FeedSnapshot, now: DateTime<Utc>) -> String {
    let mut line = format!("[{}]", snap.status.label());
    if let Some(s) = &snap.sample {
        line.push_str(&format!(
            " {} {} {}",
            s.device_id,
            format_temperature(Some(s.temperature)),
            format_humidity(Some(s.humidity))
        ));
        if let Some(up) = s.uptime_seconds {
            line.push_str(&format!(" up {}", format_uptime(up)));
        }
        if let Some(free) = s.free_memory_bytes {
            line.push_str(&format!(" free {} KB", bytes_to_kilobytes(free)));
        }
        if let Some(bt) = s.bluetooth_active {
            line.push_str(if bt { " bt on" } else { " bt off" });
        }
        line.push_str(&format!(" captured {}", format_age(s.captured_at, now)));
    }
    if let Some(err) = &snap.last_error {
        line.push_str(&format!(" error: {}", err));
    }
    line
}

fn render_stats(stats: &StatsResponse) -> String {
    let row = |name: &str, min: Option<f64>, avg: Option<f64>, max: Option<f64>| {
        format!(
            "{:<10} min {:>6}  avg {:>6}  max {:>6}",
            name,
            format_temperature(min),
            format_temperature(avg),
            format_temperature(max)
        )
    };
    [
        format!(
            "last {}h: {} records ({} device, {} weather)",
            stats.period_hours, stats.total_records, stats.esp_records, stats.weather_records
        ),
        row("temp in", stats.min_temp_in, stats.avg_temp_in, stats.max_temp_in),
        row("hum in", stats.min_hum_in, stats.avg_hum_in, stats.max_hum_in),
        row("temp out", stats.min_temp_out, stats.avg_temp_out, stats.max_temp_out),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::freshness::FeedStatus;
    use crate::shared::types::TelemetrySample;
    use chrono::{Duration, TimeZone};

    #[test]
    fn line_shows_sample_and_status() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let snap = FeedSnapshot {
            status: FeedStatus::Online,
            sample: Some(TelemetrySample {
                device_id: "greenhouse_01".into(),
                temperature: 21.46,
                humidity: 47.6,
                free_memory_bytes: Some(153_600),
                uptime_seconds: Some(7260),
                captured_at: now - Duration::seconds(12),
                bluetooth_active: Some(true),
            }),
            last_fetch_at: Some(now),
            ..FeedSnapshot::default()
        };
        assert_eq!(
            render_line(&snap, now),
            "[Online] greenhouse_01 21.5° 48% up 2h 1m free 150 KB bt on captured 12s ago"
        );
    }

    #[test]
    fn line_shows_error_without_sample() {
        let snap = FeedSnapshot {
            status: FeedStatus::Stale,
            last_error: Some("request failed: timeout".into()),
            ..FeedSnapshot::default()
        };
        assert_eq!(
            render_line(&snap, Utc::now()),
            "[Data is stale] error: request failed: timeout"
        );
    }

    #[test]
    fn stats_render_placeholders() {
        let text = render_stats(&StatsResponse {
            period_hours: 24,
            total_records: 3,
            min_temp_in: Some(19.0),
            ..StatsResponse::default()
        });
        assert!(text.starts_with("last 24h: 3 records"));
        assert!(text.contains("min  19.0°"));
        assert!(text.contains("avg     --"));
    }
}
