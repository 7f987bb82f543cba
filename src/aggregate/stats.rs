//! Descriptive statistics and least-squares trend.

use serde::{Deserialize, Serialize};

/// A statistic that is only defined for a non-empty window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "kebab-case")]
pub enum Measured<T> {
    InsufficientData,
    Computed(T),
}

impl<T> Measured<T> {
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Measured::InsufficientData)
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Measured::Computed(value) => Some(value),
            Measured::InsufficientData => None,
        }
    }
}

impl<T> From<Option<T>> for Measured<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Measured::InsufficientData, Measured::Computed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// `max - min`.
    pub range: f64,
}

/// Count, mean, median, std-dev, min, max and range of `values`.
pub fn summarize(values: &[f64]) -> Measured<SummaryStats> {
    let (Some(mean), Some(std_dev)) = (mean(values), population_std_dev(values)) else {
        return Measured::InsufficientData;
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Measured::Computed(SummaryStats {
        count: values.len(),
        mean,
        median,
        std_dev,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        range: sorted[sorted.len() - 1] - sorted[0],
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    Insufficient,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Least-squares slope per sample. Absent with fewer than 2 points.
    pub slope: Option<f64>,
}

impl Trend {
    pub fn insufficient() -> Self {
        Self {
            direction: TrendDirection::Insufficient,
            slope: None,
        }
    }
}

/// First-degree least-squares fit of `values` against their index.
///
/// The direction uses the exact sign of the slope.
pub fn linear_trend(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend::insufficient();
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        covariance += dx * (y - y_mean);
        variance += dx * dx;
    }
    let slope = covariance / variance;

    let direction = if slope > 0.0 {
        TrendDirection::Increasing
    } else if slope < 0.0 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    Trend {
        direction,
        slope: Some(slope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_classification() {
        let up = linear_trend(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(up.direction, TrendDirection::Increasing);
        assert_eq!(up.slope, Some(1.0));

        let down = linear_trend(&[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(down.direction, TrendDirection::Decreasing);
        assert_eq!(down.slope, Some(-1.0));

        let flat = linear_trend(&[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(flat.direction, TrendDirection::Stable);
        assert_eq!(flat.slope, Some(0.0));

        let single = linear_trend(&[7.0]);
        assert_eq!(single.direction, TrendDirection::Insufficient);
        assert_eq!(single.slope, None);
        assert_eq!(linear_trend(&[]).direction, TrendDirection::Insufficient);
    }

    #[test]
    fn summary_of_known_series() {
        let stats = summarize(&[3.0, 1.0, 4.0, 2.0]);
        let stats = stats.computed().unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.range, stats.max - stats.min);
        assert!((stats.std_dev - 1.118_034).abs() < 1e-6);

        let odd = summarize(&[9.0, 1.0, 5.0]);
        assert_eq!(odd.computed().unwrap().median, 5.0);
    }

    #[test]
    fn empty_series_is_insufficient() {
        assert!(summarize(&[]).is_insufficient());
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std_dev(&[]), None);
    }

    #[test]
    fn measured_serializes_with_status_tag() {
        let empty: Measured<SummaryStats> = Measured::InsufficientData;
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["status"], "insufficient-data");
    }
}
