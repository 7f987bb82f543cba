//! Temporal Aggregator.
//!
//! `aggregate` is a pure function of the snapshots it is given. Ordering is
//! derived from timestamps, not from slice position: the series used for the
//! trend, the analysis period, peak/idle events and the peak-activity moment
//! follow timestamp order.
//! An empty window yields `Measured::InsufficientData` for every statistic.

pub mod frequency;
pub mod patterns;
pub mod stats;

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

pub use frequency::{FrequencyEntry, FrequencyTable};
pub use patterns::{
    detect_patterns, hourly_histogram, ActivityEvent, ActivityPatterns, HourBucket,
    HourlyHistogram,
};
pub use stats::{linear_trend, summarize, Measured, SummaryStats, Trend, TrendDirection};

use crate::{Snapshot, Timestamp};

/// More than this share of empty samples raises a low-activity warning.
pub const LOW_ACTIVITY_RATIO: f64 = 0.8;
/// More than this many people in one sample raises an activity-peak notice.
pub const CROWD_THRESHOLD: usize = 5;
const RUNNER_UP_ACTIVITIES: usize = 2;
/// Mean per-sample activity above which the window counts as highly active.
pub const HIGH_ACTIVITY_MEAN: f64 = 1.0;
/// Mean per-sample activity above which the window counts as moderately active.
pub const MEDIUM_ACTIVITY_MEAN: f64 = 0.5;
/// More peaks than this adds a "multiple peaks" observation.
pub const MANY_PEAKS: usize = 5;
/// More idle samples than this adds a "long inactivity" observation.
pub const MANY_IDLES: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration_secs: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub samples: usize,
    pub persons: usize,
    pub objects: usize,
    pub interactions: usize,
    pub avg_persons_per_sample: f64,
    pub avg_objects_per_sample: f64,
}

/// Per-metric statistics over the window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSummaries {
    pub motion: Measured<SummaryStats>,
    pub persons: Measured<SummaryStats>,
    pub objects: Measured<SummaryStats>,
    pub interactions: Measured<SummaryStats>,
    pub activity: Measured<SummaryStats>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTables {
    pub activity: FrequencyTable,
    pub posture: FrequencyTable,
    pub hand: FrequencyTable,
    pub head: FrequencyTable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub fn from_mean(mean_activity: f64) -> Self {
        if mean_activity > HIGH_ACTIVITY_MEAN {
            ActivityLevel::High
        } else if mean_activity > MEDIUM_ACTIVITY_MEAN {
            ActivityLevel::Medium
        } else {
            ActivityLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Medium => "medium",
            ActivityLevel::High => "high",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    /// Percentage of samples with at least one person, one decimal.
    pub occupancy_percent: f64,
    pub samples_with_people: usize,
    pub total_samples: usize,
    pub primary_activity: Option<String>,
    pub total_activity_labels: usize,
    pub activity_variety: usize,
    /// Level of the mean per-sample activity.
    pub activity_level: ActivityLevel,
    /// Direction of the activity trend.
    pub main_trend: TrendDirection,
    /// Hour with the highest mean activity, as `"HH:00"`.
    pub peak_hour: Option<String>,
    pub observations: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertLevel {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub sample_count: usize,
    pub period: Measured<AnalysisPeriod>,
    pub totals: Measured<Totals>,
    pub statistics: MetricSummaries,
    /// Trend of per-sample total activity.
    pub activity_trend: Trend,
    /// Trend of per-sample person count.
    pub occupancy_trend: Trend,
    pub patterns: Measured<ActivityPatterns>,
    pub hourly: HourlyHistogram,
    /// Activity label frequencies keyed by `"HH:00"`.
    pub hourly_activities: BTreeMap<String, FrequencyTable>,
    pub frequencies: FrequencyTables,
    pub executive_summary: Measured<ExecutiveSummary>,
    pub alerts: Vec<Alert>,
    pub narrative: String,
}

impl AggregateReport {
    pub fn is_insufficient(&self) -> bool {
        self.sample_count == 0
    }
}

/// Aggregate a window of snapshots.
pub fn aggregate(snapshots: &[Snapshot]) -> AggregateReport {
    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|snapshot| snapshot.timestamp);

    let activity_series: Vec<(Timestamp, f64)> = ordered
        .iter()
        .map(|s| (s.timestamp, s.total_activity()))
        .collect();
    let ordered_activity: Vec<f64> = ordered.iter().map(|s| s.total_activity()).collect();
    let ordered_persons: Vec<f64> = ordered.iter().map(|s| s.persons.len() as f64).collect();

    let frequencies = frequency_tables(snapshots);
    let totals = totals(snapshots);
    let period = analysis_period(&ordered);
    let activity_trend = linear_trend(&ordered_activity);
    let patterns = detect_patterns(&activity_series);
    let hourly = hourly_histogram(&activity_series);

    let statistics = MetricSummaries {
        motion: summarize(&metric(&ordered, |s| s.motion_intensity)),
        persons: summarize(&ordered_persons),
        objects: summarize(&metric(&ordered, |s| s.objects.len() as f64)),
        interactions: summarize(&metric(&ordered, |s| s.interactions.len() as f64)),
        activity: summarize(&ordered_activity),
    };

    let narrative = consolidated_narrative(
        &ordered,
        period.as_ref(),
        totals.as_ref(),
        &frequencies,
    );
    let executive_summary = executive_summary(
        snapshots,
        &frequencies,
        &activity_trend,
        patterns.as_ref(),
        &hourly,
    );

    log::debug!("aggregated {} snapshots", snapshots.len());

    AggregateReport {
        sample_count: snapshots.len(),
        executive_summary: executive_summary.into(),
        alerts: alerts(snapshots),
        period: period.into(),
        totals: totals.into(),
        statistics,
        activity_trend,
        occupancy_trend: linear_trend(&ordered_persons),
        patterns: patterns.into(),
        hourly,
        hourly_activities: hourly_activities(snapshots),
        frequencies,
        narrative,
    }
}

fn metric(ordered: &[&Snapshot], value: impl Fn(&Snapshot) -> f64) -> Vec<f64> {
    ordered.iter().map(|s| value(*s)).collect()
}

fn analysis_period(ordered: &[&Snapshot]) -> Option<AnalysisPeriod> {
    let start = ordered.first()?.timestamp;
    let end = ordered.last()?.timestamp;
    Some(AnalysisPeriod {
        start,
        end,
        duration_secs: (end - start).num_seconds(),
    })
}

fn totals(snapshots: &[Snapshot]) -> Option<Totals> {
    if snapshots.is_empty() {
        return None;
    }
    let samples = snapshots.len();
    let persons: usize = snapshots.iter().map(|s| s.persons.len()).sum();
    let objects: usize = snapshots.iter().map(|s| s.objects.len()).sum();
    let interactions = snapshots.iter().map(|s| s.interactions.len()).sum();
    Some(Totals {
        samples,
        persons,
        objects,
        interactions,
        avg_persons_per_sample: persons as f64 / samples as f64,
        avg_objects_per_sample: objects as f64 / samples as f64,
    })
}

fn frequency_tables(snapshots: &[Snapshot]) -> FrequencyTables {
    let signals = || snapshots.iter().flat_map(|s| s.person_signals.iter());
    FrequencyTables {
        activity: FrequencyTable::from_labels(signals().map(|p| p.probable_activity.as_str())),
        posture: FrequencyTable::from_labels(signals().map(|p| p.posture.as_str())),
        hand: FrequencyTable::from_labels(signals().map(|p| p.hand_activity.as_str())),
        head: FrequencyTable::from_labels(signals().map(|p| p.head_orientation.as_str())),
    }
}

fn hourly_activities(snapshots: &[Snapshot]) -> BTreeMap<String, FrequencyTable> {
    let mut by_hour: BTreeMap<u32, Vec<&'static str>> = BTreeMap::new();
    for snapshot in snapshots {
        let labels = by_hour.entry(snapshot.timestamp.hour()).or_default();
        labels.extend(
            snapshot
                .person_signals
                .iter()
                .map(|p| p.probable_activity.as_str()),
        );
    }
    by_hour
        .into_iter()
        .map(|(hour, labels)| (format!("{:02}:00", hour), FrequencyTable::from_labels(labels)))
        .collect()
}

fn executive_summary(
    snapshots: &[Snapshot],
    frequencies: &FrequencyTables,
    activity_trend: &Trend,
    patterns: Option<&ActivityPatterns>,
    hourly: &HourlyHistogram,
) -> Option<ExecutiveSummary> {
    if snapshots.is_empty() {
        return None;
    }
    let total_samples = snapshots.len();
    let samples_with_people = snapshots.iter().filter(|s| !s.persons.is_empty()).count();
    let occupancy = samples_with_people as f64 / total_samples as f64 * 100.0;
    let mean_activity =
        snapshots.iter().map(|s| s.total_activity()).sum::<f64>() / total_samples as f64;

    let mut observations = Vec::new();
    if let Some(patterns) = patterns {
        if patterns.peaks.len() > MANY_PEAKS {
            observations.push("Multiple activity peaks detected".to_string());
        }
        if patterns.idles.len() > MANY_IDLES {
            observations.push("Long periods of inactivity identified".to_string());
        }
    }

    Some(ExecutiveSummary {
        occupancy_percent: (occupancy * 10.0).round() / 10.0,
        samples_with_people,
        total_samples,
        primary_activity: frequencies.activity.dominant().map(|e| e.label.clone()),
        total_activity_labels: frequencies.activity.total(),
        activity_variety: frequencies.activity.len(),
        activity_level: ActivityLevel::from_mean(mean_activity),
        main_trend: activity_trend.direction,
        peak_hour: hourly.peak_hour.map(|hour| format!("{:02}:00", hour)),
        observations,
    })
}

fn alerts(snapshots: &[Snapshot]) -> Vec<Alert> {
    if snapshots.is_empty() {
        return vec![Alert {
            level: AlertLevel::Info,
            message: "No activity detected in the period".to_string(),
        }];
    }

    let mut alerts = Vec::new();
    let empty_samples = snapshots.iter().filter(|s| s.persons.is_empty()).count();
    if empty_samples as f64 > snapshots.len() as f64 * LOW_ACTIVITY_RATIO {
        alerts.push(Alert {
            level: AlertLevel::Warning,
            message: format!(
                "Low activity detected: {}/{} samples without people",
                empty_samples,
                snapshots.len()
            ),
        });
    }

    let max_persons = snapshots.iter().map(|s| s.persons.len()).max().unwrap_or(0);
    if max_persons > CROWD_THRESHOLD {
        alerts.push(Alert {
            level: AlertLevel::Info,
            message: format!(
                "Activity peak: up to {} people detected simultaneously",
                max_persons
            ),
        });
    }
    alerts
}

fn consolidated_narrative(
    ordered: &[&Snapshot],
    period: Option<&AnalysisPeriod>,
    totals: Option<&Totals>,
    frequencies: &FrequencyTables,
) -> String {
    let (Some(period), Some(totals)) = (period, totals) else {
        return "No activity detected in the period.".to_string();
    };

    let mut clauses = vec![format!(
        "Between {} and {}, {} samples were captured.",
        period.start.format("%Y-%m-%d %H:%M:%S"),
        period.end.format("%Y-%m-%d %H:%M:%S"),
        totals.samples
    )];

    match frequencies.activity.dominant() {
        Some(primary) => {
            clauses.push(format!(
                "The most frequent activity was '{}' ({} occurrences).",
                primary.label, primary.count
            ));
            let others: Vec<String> = frequencies
                .activity
                .entries()
                .iter()
                .skip(1)
                .take(RUNNER_UP_ACTIVITIES)
                .map(|e| format!("'{}' ({}x)", e.label, e.count))
                .collect();
            if !others.is_empty() {
                clauses.push(format!(
                    "Other activities detected include: {}.",
                    others.join(", ")
                ));
            }
        }
        None => clauses.push("No person activity was identified.".to_string()),
    }

    if let Some(posture) = frequencies.posture.dominant() {
        clauses.push(format!("Dominant posture: {}.", posture.label));
    }
    if let Some(hand) = frequencies.hand.dominant() {
        clauses.push(format!("Dominant hand signal: {}.", hand.label));
    }

    if totals.persons > 0 {
        clauses.push(format!(
            "On average, {:.1} people were detected per sample.",
            totals.avg_persons_per_sample
        ));
    }
    if totals.objects > 0 {
        clauses.push(format!(
            "On average, {:.1} objects were detected per sample.",
            totals.avg_objects_per_sample
        ));
    }

    let mut peak: Option<(&Snapshot, f64)> = None;
    for snapshot in ordered {
        let activity = snapshot.total_activity();
        if activity > 0.0 && peak.map_or(true, |(_, best)| activity > best) {
            peak = Some((snapshot, activity));
        }
    }
    if let Some((snapshot, _)) = peak {
        clauses.push(format!(
            "Peak activity at {}.",
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    clauses.join(" ")
}
