//! Metric Record - validation metrics extracted from one finished run

use serde::{Deserialize, Serialize};

/// Metric names, in export column order.
pub const METRIC_NAMES: [&str; 4] = ["mAP50", "mAP50-95", "Precision", "Recall"];

/// Validation metrics for one successful run.
///
/// `params` and `flops` are only known when the trainer supports model
/// introspection; the export writes `0` for missing values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    map50: f64,
    map50_95: f64,
    precision: f64,
    recall: f64,
    params: Option<u64>,
    flops: Option<f64>,
}

impl RunMetrics {
    /// Create metrics without introspection data.
    #[must_use]
    pub const fn new(map50: f64, map50_95: f64, precision: f64, recall: f64) -> Self {
        Self {
            map50,
            map50_95,
            precision,
            recall,
            params: None,
            flops: None,
        }
    }

    /// Attach parameter count and compute cost.
    #[must_use]
    pub const fn with_model_info(mut self, params: Option<u64>, flops: Option<f64>) -> Self {
        self.params = params;
        self.flops = flops;
        self
    }

    /// mAP at IoU 0.5 (primary ranking metric).
    #[must_use]
    pub const fn map50(&self) -> f64 {
        self.map50
    }

    /// mAP averaged over IoU 0.5..0.95.
    #[must_use]
    pub const fn map50_95(&self) -> f64 {
        self.map50_95
    }

    /// Mean precision.
    #[must_use]
    pub const fn precision(&self) -> f64 {
        self.precision
    }

    /// Mean recall.
    #[must_use]
    pub const fn recall(&self) -> f64 {
        self.recall
    }

    /// Parameter count, if known.
    #[must_use]
    pub const fn params(&self) -> Option<u64> {
        self.params
    }

    /// Compute cost in FLOPs, if known.
    #[must_use]
    pub const fn flops(&self) -> Option<f64> {
        self.flops
    }

    /// True if either introspection field is present.
    #[must_use]
    pub const fn has_model_info(&self) -> bool {
        self.params.is_some() || self.flops.is_some()
    }

    /// Look up a metric by its export name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "mAP50" => Some(self.map50),
            "mAP50-95" => Some(self.map50_95),
            "Precision" => Some(self.precision),
            "Recall" => Some(self.recall),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_lookup_by_name() {
        let metrics = RunMetrics::new(0.8, 0.5, 0.7, 0.6);
        for name in METRIC_NAMES {
            assert!(metrics.get(name).is_some(), "{name}");
        }
        assert!((metrics.get("mAP50").unwrap() - 0.8).abs() < f64::EPSILON);
        assert!(metrics.get("loss").is_none());
    }

    #[test]
    fn test_model_info_optional() {
        let metrics = RunMetrics::new(0.8, 0.5, 0.7, 0.6);
        assert!(!metrics.has_model_info());
        let metrics = metrics.with_model_info(Some(3_200_000), None);
        assert!(metrics.has_model_info());
        assert_eq!(metrics.params(), Some(3_200_000));
    }
}
