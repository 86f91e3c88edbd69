use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::table::{Table, Value};

/// "Scraped Racquet Data" → "scraped_racquet_data.csv"
pub fn file_name(label: &str) -> PathBuf {
    let clean = label.trim().to_lowercase().replace(' ', "_");
    PathBuf::from(format!("{}.csv", clean))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        // Debug keeps the decimal point on whole numbers: 249.0, not 249.
        Value::Number(n) => format!("{:?}", n),
        Value::Text(s) => s.clone(),
    }
}

/// Header row plus one line per row, comma separated, no index column.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_to_file_name() {
        assert_eq!(file_name("Scraped Racquet Data"), PathBuf::from("scraped_racquet_data.csv"));
        assert_eq!(file_name("  Basic Cleaned Data "), PathBuf::from("basic_cleaned_data.csv"));
    }

    #[test]
    fn writes_header_rows_and_blank_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name("Scraped Racquet Data"));
        let table = Table {
            columns: vec!["racquet_name".into(), "racquet_price".into(), "Balance".into()],
            rows: vec![
                vec!["Head Speed MP".into(), Value::Number(249.0), Value::Null],
                vec!["Yonex EZONE 98, Blue".into(), Value::Number(259.5), "7 pts HL".into()],
            ],
        };
        write_csv(&table, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "racquet_name,racquet_price,Balance\n\
             Head Speed MP,249.0,\n\
             \"Yonex EZONE 98, Blue\",259.5,7 pts HL\n"
        );
    }
}
