//! CSV Export
//!
//! Serializes a table exactly as displayed: visible columns left to right,
//! labels as the header row, formatted cell text, current sort order.

use crate::table::Table;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// A finished export, ready to be offered as a file download
#[derive(Debug, Clone, PartialEq)]
pub struct CsvDownload {
    pub filename: String,
    pub body: String,
}

pub const FALLBACK_FILENAME: &str = "export.csv";

pub fn export<R>(table: &Table<'_, R>, filename: &str) -> Result<CsvDownload, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(table.columns().iter().map(|c| c.label()))?;

    for row in table.sorted_rows() {
        writer.write_record(table.columns().iter().map(|c| c.display(row)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))?;

    Ok(CsvDownload {
        filename: sanitize_filename(filename),
        body,
    })
}

/// Replaces path separators, control characters and characters reserved on
/// common filesystems. Always ends in `.csv`.
pub fn sanitize_filename(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let base = replaced.trim();
    let stem = if base.to_ascii_lowercase().ends_with(".csv") {
        &base[..base.len() - 4]
    } else {
        base
    };

    let stem = stem.trim().trim_matches('.').trim();
    if stem.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    format!("{}.csv", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{CellValue, Column, SortDirection, SortState};

    struct Row {
        id: &'static str,
        era: Option<f64>,
    }

    fn columns() -> Vec<Column<Row>> {
        vec![
            Column::new("id", "Name", |r: &Row| CellValue::Text(r.id.to_string())),
            Column::new("era", "ERA", |r: &Row| r.era.into()).fixed(2),
        ]
    }

    #[test]
    fn test_export_follows_sort_order() {
        let cols = columns();
        let rows = vec![
            Row { id: "A", era: Some(1.0) },
            Row { id: "B", era: Some(2.0) },
            Row { id: "C", era: Some(3.0) },
        ];
        let table = Table::new(&cols, &rows)
            .unwrap()
            .with_sort(SortState::by("era", SortDirection::Descending));

        let download = export(&table, "Stats.csv").unwrap();
        assert_eq!(download.body, "Name,ERA\nC,3.00\nB,2.00\nA,1.00\n");
    }

    #[test]
    fn test_export_matches_display() {
        let cols = columns();
        let rows = vec![
            Row { id: "Pi, Jr.", era: Some(3.14159) },
            Row { id: "Nobody", era: None },
        ];
        let table = Table::new(&cols, &rows).unwrap();

        let download = export(&table, "x").unwrap();
        let lines: Vec<&str> = download.body.lines().collect();
        assert_eq!(lines, vec!["Name,ERA", "\"Pi, Jr.\",3.14", "Nobody,"]);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("Jessica Telephone Regular Season Pitching Stats.csv"),
            "Jessica Telephone Regular Season Pitching Stats.csv"
        );
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd.csv");
        assert_eq!(sanitize_filename("a\\b\nc\"d.csv"), "a_b_c_d.csv");
        assert_eq!(sanitize_filename("  "), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".csv"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("Stats.CSV"), "Stats.csv");
    }
}
