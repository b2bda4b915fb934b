//! Results Aggregator - collects run outcomes, ranks them and exports the table
//!
//! Failed runs are kept for diagnostics but never enter the ranked table.

use super::{RunMetrics, RunOutcome, METRIC_NAMES};
use crate::{Error, Result};
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MODEL_COLUMN: &str = "Model";
const INFO_COLUMNS: [&str; 2] = ["Params(M)", "FLOPs(G)"];

/// One row of the ranked comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    model: String,
    registry_index: usize,
    metrics: RunMetrics,
}

impl ResultRow {
    /// Model display name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Position of the model in the registry.
    #[must_use]
    pub const fn registry_index(&self) -> usize {
        self.registry_index
    }

    /// Validation metrics.
    #[must_use]
    pub const fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    #[allow(clippy::cast_precision_loss)]
    fn cells(&self, with_info: bool) -> Vec<String> {
        let m = &self.metrics;
        let mut cells = vec![self.model.clone()];
        cells.extend(
            METRIC_NAMES
                .iter()
                .filter_map(|name| m.get(name))
                .map(|value| format!("{value:.4}")),
        );
        if with_info {
            cells.push(format!("{:.2}", m.params().unwrap_or(0) as f64 / 1e6));
            cells.push(format!("{:.2}", m.flops().unwrap_or(0.0) / 1e9));
        }
        cells
    }
}

/// Descending by value, NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Append-only collection of run outcomes for one session.
#[derive(Debug, Default)]
pub struct ResultsAggregator {
    outcomes: Vec<RunOutcome>,
}

impl ResultsAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if an outcome for the same display
    /// name was already recorded.
    pub fn record(&mut self, outcome: RunOutcome) -> Result<()> {
        let name = outcome.model().display_name();
        if self.outcomes.iter().any(|o| o.model().display_name() == name) {
            return Err(Error::configuration(format!(
                "outcome for model {name:?} already recorded"
            )));
        }
        self.outcomes.push(outcome);
        Ok(())
    }

    /// All outcomes, in the order recorded.
    #[must_use]
    pub fn outcomes(&self) -> &[RunOutcome] {
        &self.outcomes
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of successful runs.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// `(display name, reason)` for every failed run, in the order recorded.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.failure_reason()
                    .map(|reason| (o.model().display_name(), reason))
            })
            .collect()
    }

    /// Successful runs sorted by mAP50 descending, ties in registry order.
    #[must_use]
    pub fn ranked(&self) -> Vec<ResultRow> {
        let mut rows: Vec<ResultRow> = self
            .outcomes
            .iter()
            .filter_map(|o| {
                o.metrics().map(|metrics| ResultRow {
                    model: o.model().display_name().to_string(),
                    registry_index: o.registry_index(),
                    metrics: *metrics,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            descending(a.metrics.map50(), b.metrics.map50())
                .then(a.registry_index.cmp(&b.registry_index))
        });
        rows
    }

    fn header(rows: &[ResultRow]) -> (Vec<&'static str>, bool) {
        let with_info = rows.iter().any(|r| r.metrics.has_model_info());
        let mut header = vec![MODEL_COLUMN];
        header.extend(METRIC_NAMES);
        if with_info {
            header.extend(INFO_COLUMNS);
        }
        (header, with_info)
    }

    /// Write the ranked table as CSV, creating parent directories.
    ///
    /// Params/FLOPs columns are written when any successful run reported
    /// model introspection.
    ///
    /// # Errors
    ///
    /// - [`Error::NoResults`] if no run succeeded; no file is created
    /// - [`Error::Io`] / [`Error::Csv`] on write failure
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let rows = self.ranked();
        if rows.is_empty() {
            warn!(attempted = self.outcomes.len(), "No successful runs, refusing to export");
            return Err(Error::NoResults {
                attempted: self.outcomes.len(),
            });
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let (header, with_info) = Self::header(&rows);
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&header)?;
        for row in &rows {
            writer.write_record(row.cells(with_info))?;
        }
        writer.flush()?;

        info!(file = %path.display(), rows = rows.len(), "Exported results");
        Ok(path.to_path_buf())
    }

    /// Render the ranked table as aligned text for the console summary.
    #[must_use]
    pub fn render_table(&self) -> String {
        let rows = self.ranked();
        let (header, with_info) = Self::header(&rows);
        let body: Vec<Vec<String>> = rows.iter().map(|r| r.cells(with_info)).collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
        for cells in &body {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        let mut push_line = |cells: &[&str]| {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (cell, width))| {
                    if col == 0 {
                        format!("{cell:<width$}")
                    } else {
                        format!("{cell:>width$}")
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", line.join("  ").trim_end());
        };

        push_line(&header);
        for cells in &body {
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            push_line(&cells);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{FailedPhase, ModelSpec};
    use chrono::Utc;

    fn ok(name: &str, idx: usize, map50: f64) -> RunOutcome {
        RunOutcome::succeeded(
            ModelSpec::new(name, format!("{name}.pt")),
            idx,
            RunMetrics::new(map50, map50 / 2.0, 0.8, 0.7),
            Utc::now(),
        )
    }

    #[test]
    fn test_ranked_ties_keep_registry_order() {
        let mut agg = ResultsAggregator::new();
        agg.record(ok("A", 0, 0.80)).unwrap();
        agg.record(ok("B", 1, 0.91)).unwrap();
        agg.record(ok("C", 2, 0.91)).unwrap();

        let names: Vec<String> = agg.ranked().iter().map(|r| r.model().to_string()).collect();
        assert_eq!(names, ["B", "C", "A"]);
    }

    #[test]
    fn test_ranked_tie_break_ignores_record_order() {
        let mut agg = ResultsAggregator::new();
        agg.record(ok("C", 2, 0.5)).unwrap();
        agg.record(ok("B", 1, 0.5)).unwrap();
        let names: Vec<String> = agg.ranked().iter().map(|r| r.model().to_string()).collect();
        assert_eq!(names, ["B", "C"]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let mut agg = ResultsAggregator::new();
        agg.record(ok("A", 0, f64::NAN)).unwrap();
        agg.record(ok("B", 1, 0.1)).unwrap();
        assert_eq!(agg.ranked()[0].model(), "B");
    }

    #[test]
    fn test_duplicate_outcome_rejected() {
        let mut agg = ResultsAggregator::new();
        agg.record(ok("A", 0, 0.5)).unwrap();
        assert!(agg.record(ok("A", 0, 0.6)).is_err());
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_failures_excluded_from_ranking() {
        let mut agg = ResultsAggregator::new();
        agg.record(ok("A", 0, 0.5)).unwrap();
        agg.record(RunOutcome::failed(
            ModelSpec::new("B", "b.pt"),
            1,
            FailedPhase::Validating,
            "no val split",
            Utc::now(),
        ))
        .unwrap();

        assert_eq!(agg.ranked().len(), 1);
        assert_eq!(agg.failures(), vec![("B", "no val split")]);
        assert_eq!(agg.success_count(), 1);
    }

    #[test]
    fn test_render_table_alignment() {
        let mut agg = ResultsAggregator::new();
        agg.record(ok("YOLOv8n", 0, 0.5)).unwrap();
        let table = agg.render_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].split_whitespace().collect::<Vec<_>>(),
            ["Model", "mAP50", "mAP50-95", "Precision", "Recall"]
        );
        assert!(lines[1].starts_with("YOLOv8n  0.5000"));
        // numeric columns are right-aligned to a common edge
        assert_eq!(lines[0].len(), lines[1].len());
    }
}
