//! Transaction ingestion: semicolon-delimited CSV into typed records, plus
//! the calendar-year window view used for recency.

use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::IngestionError;

/// Source-specific column names for the five required fields. Defaults
/// match the sales export this pipeline was built for.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub customer_id: String,
    pub note_id: String,
    pub date: String,
    pub quantity: String,
    pub unit_price: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            customer_id: "kdplg".to_string(),
            note_id: "nota".to_string(),
            date: "tanggal".to_string(),
            quantity: "jumlah".to_string(),
            unit_price: "hgjual".to_string(),
        }
    }
}

/// One parsed input row. A note id identifies one purchase event, which may
/// span multiple line items (rows). Immutable after parse.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub customer_id: String,
    pub note_id: String,
    /// `None` when the source cell was missing or unparseable. The record
    /// is kept; it is only excluded from recency later on.
    pub date: Option<NaiveDate>,
    pub quantity: f64,
    pub unit_price: f64,
}

impl TransactionRecord {
    /// Line-item value: quantity x unit price.
    pub fn total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Date formats attempted in order before degrading to `None`.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Datetime cells keep their date part.
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_number(raw: &str, row: usize, column: &str) -> Result<f64, IngestionError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| IngestionError::InvalidNumber {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Read all transactions from a semicolon-delimited source.
///
/// Malformed dates become `None` and the record is kept; malformed numeric
/// cells and missing required columns are fatal.
pub fn read_transactions<R: Read>(
    reader: R,
    columns: &ColumnMap,
) -> Result<Vec<TransactionRecord>, IngestionError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let index_of = |name: &str| headers.iter().position(|h| h.trim() == name);

    let required = [
        &columns.customer_id,
        &columns.note_id,
        &columns.date,
        &columns.quantity,
        &columns.unit_price,
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|name| index_of(name.as_str()).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestionError::MissingColumns(missing));
    }

    let customer_idx = index_of(&columns.customer_id).unwrap();
    let note_idx = index_of(&columns.note_id).unwrap();
    let date_idx = index_of(&columns.date).unwrap();
    let quantity_idx = index_of(&columns.quantity).unwrap();
    let price_idx = index_of(&columns.unit_price).unwrap();

    let mut records = Vec::new();
    // Row numbers are 1-based over the whole file; the header is row 1.
    for (i, row) in csv_reader.records().enumerate() {
        let row = row?;
        let row_number = i + 2;
        let field = |idx: usize| row.get(idx).unwrap_or("");

        records.push(TransactionRecord {
            customer_id: field(customer_idx).trim().to_string(),
            note_id: field(note_idx).trim().to_string(),
            date: parse_date(field(date_idx)),
            quantity: parse_number(field(quantity_idx), row_number, &columns.quantity)?,
            unit_price: parse_number(field(price_idx), row_number, &columns.unit_price)?,
        });
    }

    debug!(rows = records.len(), "ingested transaction records");
    Ok(records)
}

/// Convenience wrapper over [`read_transactions`] for a file path.
pub fn read_transactions_from_path<P: AsRef<Path>>(
    path: P,
    columns: &ColumnMap,
) -> Result<Vec<TransactionRecord>, IngestionError> {
    let file = File::open(path)?;
    read_transactions(file, columns)
}

/// Restrict records to those whose date falls inside the inclusive calendar
/// year range. Dateless records never pass.
pub fn filter_by_years(
    records: &[TransactionRecord],
    years: &RangeInclusive<i32>,
) -> Vec<TransactionRecord> {
    use chrono::Datelike;
    records
        .iter()
        .filter(|r| r.date.map_or(false, |d| years.contains(&d.year())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
kdplg;nota;tanggal;jumlah;hgjual
C001;N001;2022-03-15;2;1500
C001;N001;2022-03-15;1;800
C002;N002;bad-date;3;200
C003;N003;2019-07-01;5;100
";

    #[test]
    fn parses_all_rows() {
        let records = read_transactions(SAMPLE.as_bytes(), &ColumnMap::default()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].customer_id, "C001");
        assert_eq!(records[0].total(), 3000.0);
    }

    #[test]
    fn malformed_date_becomes_null_not_an_error() {
        let records = read_transactions(SAMPLE.as_bytes(), &ColumnMap::default()).unwrap();
        assert!(records[2].date.is_none());
        assert_eq!(records[2].customer_id, "C002");
    }

    #[test]
    fn missing_columns_are_reported_by_name() {
        let input = "kdplg;tanggal;jumlah\nC001;2022-01-01;2\n";
        let err = read_transactions(input.as_bytes(), &ColumnMap::default()).unwrap_err();
        match err {
            IngestionError::MissingColumns(names) => {
                assert_eq!(names, vec!["nota".to_string(), "hgjual".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn malformed_quantity_is_fatal_with_row_context() {
        let input = "kdplg;nota;tanggal;jumlah;hgjual\nC001;N001;2022-01-01;abc;10\n";
        let err = read_transactions(input.as_bytes(), &ColumnMap::default()).unwrap_err();
        match err {
            IngestionError::InvalidNumber { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "jumlah");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn year_filter_keeps_only_in_window_dated_records() {
        let records = read_transactions(SAMPLE.as_bytes(), &ColumnMap::default()).unwrap();
        let filtered = filter_by_years(&records, &(2020..=2023));
        // Two 2022 rows survive; the dateless row and the 2019 row do not.
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.customer_id == "C001"));
    }

    #[test]
    fn alternate_date_formats_are_accepted() {
        assert_eq!(
            parse_date("15/03/2022"),
            NaiveDate::from_ymd_opt(2022, 3, 15)
        );
        assert_eq!(
            parse_date("2022-03-15 08:26:00"),
            NaiveDate::from_ymd_opt(2022, 3, 15)
        );
        assert_eq!(parse_date(""), None);
    }
}
