use std::collections::HashSet;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::debug;

use super::rules;
use crate::table::{Table, Value};

pub const NAME_COLUMN: &str = "racquet_name";
pub const BRAND_COLUMN: &str = "racquet_brand";
pub const JUNIOR_MARKER: &str = "Junior";
pub const SPARSE_THRESHOLD: f64 = 0.95;

/// Free-text spec columns replaced by the extracted numeric columns.
pub const SOURCE_COLUMNS: &[&str] = &[
    "Head Size",
    "Length",
    "Strung Weight",
    "Balance",
    "Beam Width",
    "String Pattern",
    "String Tension",
    "Stiffness",
];

/// Extracted columns, in the order they are appended.
pub const EXTRACTED_COLUMNS: &[&str] = &[
    "racquet_head_size_sq_in",
    "racquet_length_in",
    "racquet_strung_weight_oz",
    "racquet_balance_in",
    "racquet_balance_HH_HL",
    "racquet_stiffness",
    "racquet_avg_beam_width",
    "racquet_mains",
    "racquet_crosses",
    "racquet_tension_lower",
    "racquet_tension_upper",
];

/// Carry-over spec columns with a fixed clean name. Anything else is renamed
/// by `carry_over_name`.
const RENAMES: &[(&str, &str)] = &[
    ("Swingweight", "racquet_swingweight"),
    ("Composition", "racquet_composition"),
    ("Power Level", "racquet_power"),
    ("Stroke Style", "racquet_stroke_style"),
    ("Swing Speed", "racquet_swing_speed"),
    ("Racquet Colors", "racquet_colors"),
    ("Grip Type", "racquet_grip"),
];

const PREFIX: &str = "racquet_";

static NULL: Value = Value::Null;

/// Stage 1: brand is the first word of the name, placed as the first column.
pub fn derive_brand(mut table: Table) -> Table {
    let brands: Vec<Value> = match table.column(NAME_COLUMN) {
        Some(names) => names
            .into_iter()
            .map(|v| match v.as_text().and_then(|s| s.split_whitespace().next()) {
                Some(first) => Value::from(first),
                None => Value::Null,
            })
            .collect(),
        None => vec![Value::Null; table.len()],
    };
    table.insert_column(0, BRAND_COLUMN, brands);
    table
}

/// Stage 2: remove every row whose name contains "Junior". Other rows are
/// left untouched and in order.
pub fn filter_juniors(mut table: Table) -> Table {
    let Some(idx) = table.column_index(NAME_COLUMN) else {
        return table;
    };
    let before = table.len();
    table.retain_rows(|row| {
        !row[idx]
            .as_text()
            .is_some_and(|name| name.contains(JUNIOR_MARKER))
    });
    debug!("Removed {} junior racquets", before - table.len());
    table
}

/// Stage 3: drop columns more than 95% null. A column with no nulls is
/// always kept.
pub fn drop_sparse_columns(mut table: Table) -> Table {
    let rows = table.len();
    let sparse: Vec<String> = table
        .columns
        .iter()
        .filter(|c| {
            let nulls = table.null_count(c.as_str());
            nulls != 0 && nulls as f64 / rows as f64 > SPARSE_THRESHOLD
        })
        .cloned()
        .collect();

    if !sparse.is_empty() {
        debug!("Dropping sparse columns: {:?}", sparse);
    }
    let names: Vec<&str> = sparse.iter().map(String::as_str).collect();
    table.drop_columns(&names);
    table
}

/// Stage 4: append the extracted numeric columns. Each target is computed on
/// its own; a missing source column leaves its targets null.
pub fn extract_fields(mut table: Table) -> Table {
    let sources: Vec<Option<usize>> = [
        "Head Size",
        "Length",
        "Strung Weight",
        "Balance",
        "Stiffness",
        "Beam Width",
        "String Pattern",
        "String Tension",
    ]
    .iter()
    .map(|c| table.column_index(c))
    .collect();

    #[cfg(feature = "rayon")]
    let extracted: Vec<Vec<Value>> = table.rows.par_iter().map(|r| extract_row(r, &sources)).collect();
    #[cfg(not(feature = "rayon"))]
    let extracted: Vec<Vec<Value>> = table.rows.iter().map(|r| extract_row(r, &sources)).collect();

    for (i, name) in EXTRACTED_COLUMNS.iter().enumerate() {
        let values = extracted.iter().map(|row| row[i].clone()).collect();
        table.set_column(name, values);
    }
    table
}

fn extract_row(row: &[Value], sources: &[Option<usize>]) -> Vec<Value> {
    let cell = |i: usize| sources[i].map(|idx| &row[idx]).unwrap_or(&NULL);
    let text = |i: usize| cell(i).as_text();

    let head_size = text(0).and_then(rules::size_in);
    let length = text(1).and_then(rules::size_in);
    let weight = text(2).and_then(rules::leading_number);
    let balance_in = text(3).and_then(rules::balance_in);
    let balance_pts = text(3).and_then(rules::balance_points);
    let stiffness = rules::stiffness(cell(4));
    let beam = text(5).and_then(rules::avg_beam_width);
    let (mains, crosses) = text(6).map(rules::string_pattern).unwrap_or((None, None));
    let (lower, upper) = text(7).map(rules::tension_bounds).unwrap_or((None, None));

    [
        head_size,
        length,
        weight,
        balance_in,
        balance_pts,
        stiffness,
        beam,
        mains,
        crosses,
        lower,
        upper,
    ]
    .into_iter()
    .map(Value::from)
    .collect()
}

/// Stage 5: drop the superseded text columns and give every remaining
/// column a `racquet_` snake_case name.
///
/// Names stay unique: fixed renames are claimed first, and a generated name
/// that is already taken gets a `_2`, `_3`, ... suffix.
pub fn finalize_schema(mut table: Table) -> Table {
    table.drop_columns(SOURCE_COLUMNS);

    let mut taken: HashSet<String> = table
        .columns
        .iter()
        .filter(|c| c.starts_with(PREFIX))
        .cloned()
        .collect();
    let (fixed, generic): (Vec<String>, Vec<String>) = table
        .columns
        .iter()
        .filter(|c| !c.starts_with(PREFIX))
        .cloned()
        .partition(|c| RENAMES.iter().any(|(from, _)| *from == c.as_str()));

    for from in fixed.iter().chain(&generic) {
        let base = carry_over_name(from);
        let mut to = base.clone();
        let mut n = 2;
        while taken.contains(&to) {
            to = format!("{base}_{n}");
            n += 1;
        }
        if to != base {
            debug!("Renaming {:?} to {} ({} is taken)", from, to, base);
        }
        table.rename_column(from, &to);
        taken.insert(to);
    }
    table
}

pub fn carry_over_name(label: &str) -> String {
    if let Some((_, to)) = RENAMES.iter().find(|(from, _)| *from == label) {
        return to.to_string();
    }
    let snake = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    format!("{PREFIX}{snake}")
}
