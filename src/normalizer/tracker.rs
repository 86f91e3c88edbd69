use tracing::info;

use crate::table::Table;

/// Row and column counts around each normalizer stage.
#[derive(Debug, Default)]
pub struct StageTracker {
    metrics: Vec<StageMetric>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageMetric {
    pub stage: &'static str,
    pub rows_before: usize,
    pub rows_after: usize,
    pub cols_before: usize,
    pub cols_after: usize,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: &'static str, before: (usize, usize), after: &Table) {
        let metric = StageMetric {
            stage,
            rows_before: before.0,
            rows_after: after.len(),
            cols_before: before.1,
            cols_after: after.width(),
        };
        info!(
            stage,
            rows = metric.rows_after,
            columns = metric.cols_after,
            "stage complete"
        );
        self.metrics.push(metric);
    }

    pub fn metrics(&self) -> &[StageMetric] {
        &self.metrics
    }

    pub fn print(&self) {
        println!("{:<22} | {:>11} | {:>11}", "Stage", "Rows", "Columns");
        println!("{}", "-".repeat(50));
        for m in self.metrics() {
            println!(
                "{:<22} | {:>4} -> {:>4} | {:>4} -> {:>4}",
                m.stage, m.rows_before, m.rows_after, m.cols_before, m.cols_after
            );
        }
    }
}
