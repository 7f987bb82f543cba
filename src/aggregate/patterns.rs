//! Peak/idle detection and hour-of-day bucketing.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use super::stats::{mean, population_std_dev};
use crate::Timestamp;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: Timestamp,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityPatterns {
    pub mean: f64,
    pub std_dev: f64,
    /// Samples with activity strictly above `mean + std_dev`.
    pub peaks: Vec<ActivityEvent>,
    /// Samples with activity strictly below `mean - std_dev`.
    pub idles: Vec<ActivityEvent>,
}

/// Classify each sample of a total-activity series against `mean ± std_dev`.
///
/// Events keep the order of `series`. Returns `None` for an empty series.
pub fn detect_patterns(series: &[(Timestamp, f64)]) -> Option<ActivityPatterns> {
    let values: Vec<f64> = series.iter().map(|(_, value)| *value).collect();
    let mean = mean(&values)?;
    let std_dev = population_std_dev(&values)?;
    let upper = mean + std_dev;
    let lower = mean - std_dev;

    let mut peaks = Vec::new();
    let mut idles = Vec::new();
    for (timestamp, value) in series {
        let event = ActivityEvent {
            timestamp: *timestamp,
            value: *value,
        };
        if *value > upper {
            peaks.push(event);
        } else if *value < lower {
            idles.push(event);
        }
    }

    Some(ActivityPatterns {
        mean,
        std_dev,
        peaks,
        idles,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    /// Local wall-clock hour, 0 to 23.
    pub hour: u32,
    pub samples: usize,
    pub mean_activity: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyHistogram {
    /// Only hours with at least one sample, ascending.
    pub buckets: Vec<HourBucket>,
    /// Hour with the highest mean activity. The earliest hour wins a tie.
    pub peak_hour: Option<u32>,
}

/// Bucket a total-activity series by the local hour of each timestamp.
pub fn hourly_histogram(series: &[(Timestamp, f64)]) -> HourlyHistogram {
    let mut sums: BTreeMap<u32, (usize, f64)> = BTreeMap::new();
    for (timestamp, value) in series {
        let slot = sums.entry(timestamp.hour()).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += value;
    }

    let buckets: Vec<HourBucket> = sums
        .into_iter()
        .map(|(hour, (samples, total))| HourBucket {
            hour,
            samples,
            mean_activity: total / samples as f64,
        })
        .collect();

    let mut peak: Option<&HourBucket> = None;
    for bucket in &buckets {
        if peak.map_or(true, |best| bucket.mean_activity > best.mean_activity) {
            peak = Some(bucket);
        }
    }

    HourlyHistogram {
        peak_hour: peak.map(|bucket| bucket.hour),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at(hour: u32, minute: u32) -> Timestamp {
        Local.with_ymd_and_hms(2024, 5, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn single_outlier_is_a_peak() {
        let series: Vec<(Timestamp, f64)> = [10.0, 10.0, 10.0, 10.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, v)| (at(10, i as u32), *v))
            .collect();
        let patterns = detect_patterns(&series).unwrap();
        assert_eq!(patterns.mean, 28.0);
        assert_eq!(patterns.std_dev, 36.0);
        assert_eq!(patterns.peaks.len(), 1);
        assert_eq!(patterns.peaks[0].timestamp, at(10, 4));
        assert_eq!(patterns.peaks[0].value, 100.0);
        // 10 is above 28 - 36.
        assert!(patterns.idles.is_empty());
    }

    #[test]
    fn boundary_values_are_not_events() {
        // mean 1, std-dev 1: values sit exactly on mean ± std-dev.
        let series = vec![(at(9, 0), 0.0), (at(9, 1), 2.0)];
        let patterns = detect_patterns(&series).unwrap();
        assert!(patterns.peaks.is_empty());
        assert!(patterns.idles.is_empty());
        assert!(detect_patterns(&[]).is_none());
    }

    #[test]
    fn histogram_reports_peak_hour() {
        let series = vec![
            (at(14, 0), 1.0),
            (at(9, 0), 0.5),
            (at(14, 30), 3.0),
            (at(9, 45), 0.5),
            (at(11, 0), 2.0),
        ];
        let histogram = hourly_histogram(&series);
        let hours: Vec<u32> = histogram.buckets.iter().map(|b| b.hour).collect();
        assert_eq!(hours, vec![9, 11, 14]);
        assert_eq!(histogram.buckets[2].samples, 2);
        assert_eq!(histogram.buckets[2].mean_activity, 2.0);
        // 11:00 and 14:00 tie at 2.0; the earlier hour wins.
        assert_eq!(histogram.peak_hour, Some(11));
        assert_eq!(hourly_histogram(&[]).peak_hour, None);
    }
}
