//! RFM feature aggregation.
//!
//! Frequency and Monetary come from the full, unfiltered transaction set;
//! Recency comes only from the year-filtered view. A customer active
//! outside the window keeps Frequency/Monetary but leaves Recency unset for
//! the imputation step.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::ingest::TransactionRecord;

/// Per-customer RFM features. One instance per distinct customer id in the
/// unfiltered set (the filtered view is a subset of it, so the union of
/// grouping keys is the unfiltered set's keys).
#[derive(Debug, Clone, Serialize)]
pub struct CustomerRfm {
    pub customer_id: String,
    /// Days between the reference date and the most recent in-window
    /// transaction. `None` until imputation when the customer has no dated
    /// transaction inside the accepted window.
    pub recency: Option<i64>,
    /// Count of distinct purchase events (note ids), not line items.
    pub frequency: u64,
    /// Total spend: sum of quantity x unit price over every line item.
    pub monetary: f64,
}

/// Aggregate transactions into one RFM row per customer, ordered by
/// customer id for deterministic downstream matrices.
pub fn build_rfm(
    all: &[TransactionRecord],
    filtered: &[TransactionRecord],
    reference_date: NaiveDate,
) -> Vec<CustomerRfm> {
    let mut notes: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    let mut monetary: BTreeMap<&str, f64> = BTreeMap::new();
    for record in all {
        notes
            .entry(record.customer_id.as_str())
            .or_default()
            .insert(record.note_id.as_str());
        *monetary.entry(record.customer_id.as_str()).or_default() += record.total();
    }

    let mut last_purchase: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for record in filtered {
        let Some(date) = record.date else { continue };
        last_purchase
            .entry(record.customer_id.as_str())
            .and_modify(|latest| {
                if date > *latest {
                    *latest = date;
                }
            })
            .or_insert(date);
    }

    let table: Vec<CustomerRfm> = notes
        .iter()
        .map(|(customer_id, note_ids)| CustomerRfm {
            customer_id: customer_id.to_string(),
            recency: last_purchase
                .get(customer_id)
                .map(|latest| (reference_date - *latest).num_days()),
            frequency: note_ids.len() as u64,
            monetary: monetary[customer_id],
        })
        .collect();

    debug!(customers = table.len(), "built RFM table");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::filter_by_years;

    fn record(customer: &str, note: &str, date: Option<&str>, qty: f64, price: f64) -> TransactionRecord {
        TransactionRecord {
            customer_id: customer.to_string(),
            note_id: note.to_string(),
            date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            quantity: qty,
            unit_price: price,
        }
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()
    }

    #[test]
    fn frequency_counts_events_not_line_items() {
        // Two line items on one note, plus a second note.
        let all = vec![
            record("C1", "N1", Some("2022-01-10"), 1.0, 10.0),
            record("C1", "N1", Some("2022-01-10"), 2.0, 5.0),
            record("C1", "N2", Some("2022-06-01"), 1.0, 7.0),
        ];
        let filtered = filter_by_years(&all, &(2020..=2023));
        let rfm = build_rfm(&all, &filtered, reference());
        assert_eq!(rfm.len(), 1);
        assert_eq!(rfm[0].frequency, 2);
        assert_eq!(rfm[0].monetary, 27.0);
    }

    #[test]
    fn monetary_and_frequency_ignore_the_year_filter() {
        let all = vec![
            record("C1", "N1", Some("2018-01-10"), 2.0, 100.0),
            record("C1", "N2", Some("2022-03-01"), 1.0, 50.0),
        ];
        let filtered = filter_by_years(&all, &(2020..=2023));
        let rfm = build_rfm(&all, &filtered, reference());
        // The 2018 note still counts toward frequency and monetary.
        assert_eq!(rfm[0].frequency, 2);
        assert_eq!(rfm[0].monetary, 250.0);
        // Recency only sees the 2022 purchase.
        let expected = (reference() - NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()).num_days();
        assert_eq!(rfm[0].recency, Some(expected));
    }

    #[test]
    fn customer_outside_window_keeps_row_with_unset_recency() {
        let all = vec![
            record("C1", "N1", Some("2019-05-05"), 1.0, 30.0),
            record("C2", "N2", Some("2022-05-05"), 1.0, 40.0),
        ];
        let filtered = filter_by_years(&all, &(2020..=2023));
        let rfm = build_rfm(&all, &filtered, reference());
        assert_eq!(rfm.len(), 2);
        assert_eq!(rfm[0].customer_id, "C1");
        assert_eq!(rfm[0].recency, None);
        assert!(rfm[1].recency.is_some());
    }

    #[test]
    fn recency_uses_latest_in_window_date() {
        let all = vec![
            record("C1", "N1", Some("2021-01-01"), 1.0, 1.0),
            record("C1", "N2", Some("2023-11-21"), 1.0, 1.0),
        ];
        let filtered = filter_by_years(&all, &(2020..=2023));
        let rfm = build_rfm(&all, &filtered, reference());
        assert_eq!(rfm[0].recency, Some(10));
    }

    #[test]
    fn output_is_sorted_by_customer_id() {
        let all = vec![
            record("C9", "N1", Some("2022-01-01"), 1.0, 1.0),
            record("C1", "N2", Some("2022-01-01"), 1.0, 1.0),
            record("C5", "N3", Some("2022-01-01"), 1.0, 1.0),
        ];
        let filtered = filter_by_years(&all, &(2020..=2023));
        let ids: Vec<_> = build_rfm(&all, &filtered, reference())
            .into_iter()
            .map(|c| c.customer_id)
            .collect();
        assert_eq!(ids, vec!["C1", "C5", "C9"]);
    }
}
