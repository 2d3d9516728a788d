use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::types::HistoryRecord;

/// Range presets offered above the temperature chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRange {
    H6,
    H12,
    H24,
    H48,
    D7,
}

impl HistoryRange {
    pub const ALL: [HistoryRange; 5] = [
        HistoryRange::H6,
        HistoryRange::H12,
        HistoryRange::H24,
        HistoryRange::H48,
        HistoryRange::D7,
    ];

    pub fn hours(self) -> u32 {
        match self {
            HistoryRange::H6 => 6,
            HistoryRange::H12 => 12,
            HistoryRange::H24 => 24,
            HistoryRange::H48 => 48,
            HistoryRange::D7 => 168,
        }
    }

    /// Downsampling target sent as `max_points`.
    pub fn max_points(self) -> u32 {
        match self {
            HistoryRange::H6 => 50,
            HistoryRange::H12 => 75,
            HistoryRange::H24 => 100,
            HistoryRange::H48 => 120,
            HistoryRange::D7 => 168,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HistoryRange::H6 => "6h",
            HistoryRange::H12 => "12h",
            HistoryRange::H24 => "24h",
            HistoryRange::H48 => "48h",
            HistoryRange::D7 => "7d",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == s)
    }

    fn axis_label(self, at: DateTime<FixedOffset>) -> String {
        match self {
            HistoryRange::D7 => at.format("%d.%m").to_string(),
            _ => at.format("%H:%M").to_string(),
        }
    }
}

impl Default for HistoryRange {
    fn default() -> Self {
        HistoryRange::H24
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub at: DateTime<Utc>,
    pub label: String,
    pub inside: Option<f64>,
    pub outside: Option<f64>,
}

/// Reshape service records into chart points, oldest first.
///
/// Labels are in the viewer's zone; `offset` gives its UTC offset at each
/// record (see `utils::format::local_offset`).
pub fn chart_points(
    range: HistoryRange,
    records: &[HistoryRecord],
    offset: impl Fn(&DateTime<Utc>) -> FixedOffset,
) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = records
        .iter()
        .map(|r| ChartPoint {
            at: r.timestamp,
            label: range.axis_label(r.timestamp.with_timezone(&offset(&r.timestamp))),
            inside: r.temp_in,
            outside: r.temp_out,
        })
        .collect();
    points.sort_by_key(|p| p.at);
    points
}

/// `(min, max)` over every value present, for the chart's y axis.
pub fn value_bounds(points: &[ChartPoint]) -> Option<(f64, f64)> {
    points
        .iter()
        .flat_map(|p| [p.inside, p.outside])
        .flatten()
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(h: u32, temp_in: Option<f64>, temp_out: Option<f64>) -> HistoryRecord {
        HistoryRecord {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 17, h, 5, 0).unwrap(),
            temp_in,
            hum_in: None,
            temp_out,
            hum_out: None,
            device_id: "greenhouse_01".into(),
        }
    }

    #[test]
    fn presets_match_dashboard_ranges() {
        let pairs: Vec<(u32, u32)> = HistoryRange::ALL
            .iter()
            .map(|r| (r.hours(), r.max_points()))
            .collect();
        assert_eq!(pairs, vec![(6, 50), (12, 75), (24, 100), (48, 120), (168, 168)]);
        assert_eq!(HistoryRange::parse("7d"), Some(HistoryRange::D7));
        assert_eq!(HistoryRange::parse("3h"), None);
    }

    fn utc(_: &DateTime<Utc>) -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn points_are_sorted_and_labelled_per_range() {
        let records = vec![record(14, Some(22.0), None), record(9, Some(20.0), Some(4.5))];
        let hourly = chart_points(HistoryRange::H24, &records, utc);
        assert_eq!(hourly[0].label, "09:05");
        assert_eq!(hourly[1].label, "14:05");
        assert_eq!(hourly[0].outside, Some(4.5));

        let weekly = chart_points(HistoryRange::D7, &records, utc);
        assert_eq!(weekly[0].label, "17.10");
    }

    #[test]
    fn labels_are_shifted_into_the_viewer_zone() {
        let plus_two = |_: &DateTime<Utc>| FixedOffset::east_opt(2 * 3600).unwrap();
        let late = vec![HistoryRecord {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 17, 23, 30, 0).unwrap(),
            ..record(0, Some(18.0), None)
        }];
        assert_eq!(chart_points(HistoryRange::H24, &late, plus_two)[0].label, "01:30");
        assert_eq!(chart_points(HistoryRange::D7, &late, plus_two)[0].label, "18.10");
        // the instant itself stays in UTC
        assert_eq!(chart_points(HistoryRange::H24, &late, plus_two)[0].at, late[0].timestamp);
    }

    #[test]
    fn bounds_skip_missing_values() {
        let records = vec![record(1, Some(21.0), None), record(2, None, Some(-3.0))];
        let points = chart_points(HistoryRange::H6, &records, utc);
        assert_eq!(value_bounds(&points), Some((-3.0, 21.0)));
        assert_eq!(value_bounds(&[]), None);
    }
}
