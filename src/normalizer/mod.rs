pub mod rules;
pub mod stages;
pub mod tracker;

use crate::table::Table;
use tracker::StageTracker;

pub type Stage = fn(Table) -> Table;

/// Fixed stage order: each stage only sees the columns its predecessor left.
pub const STAGES: &[(&str, Stage)] = &[
    ("derive_brand", stages::derive_brand),
    ("filter_juniors", stages::filter_juniors),
    ("drop_sparse_columns", stages::drop_sparse_columns),
    ("extract_fields", stages::extract_fields),
    ("finalize_schema", stages::finalize_schema),
];

/// Raw table → clean table, plus the row/column counts of every stage.
/// Pure: the input is not modified.
pub fn normalize(raw: &Table) -> (Table, StageTracker) {
    let mut tracker = StageTracker::new();
    let clean = STAGES.iter().fold(raw.clone(), |table, &(name, stage)| {
        let before = (table.len(), table.width());
        let next = stage(table);
        tracker.record(name, before, &next);
        next
    });
    (clean, tracker)
}
