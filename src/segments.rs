//! Segment labeling and per-cluster reporting.
//!
//! Tier names are assigned positionally by cluster id, not by cluster value
//! ranking: cluster 1 is always "Bronze" whether or not it is the lowest-
//! value segment. Behavioral compatibility with the source system.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::rfm::CustomerRfm;

/// Tier names for cluster ids 1..=9, in positional order.
pub const TIER_NAMES: [&str; 9] = [
    "Bronze", "Silver", "Gold", "Platinum", "Diamond", "Elite", "Premier", "Prestige", "Royal",
];

/// Sentinel for cluster ids with no tier name.
pub const UNKNOWN_TIER: &str = "Unknown";

/// Tier name for a 1-based cluster id. Out-of-range ids map to the
/// explicit unknown sentinel rather than failing.
pub fn tier_name(cluster_id: usize) -> &'static str {
    match cluster_id {
        1..=9 => TIER_NAMES[cluster_id - 1],
        _ => UNKNOWN_TIER,
    }
}

/// One customer's RFM row annotated with its cluster assignment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentedCustomer {
    pub customer_id: String,
    pub recency: Option<i64>,
    pub frequency: u64,
    pub monetary: f64,
    /// 1-based cluster id.
    pub cluster_id: usize,
    pub segment: String,
}

/// Aggregate of one cluster's members.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub segment: String,
    pub mean_recency: f64,
    pub mean_frequency: f64,
    pub mean_monetary: f64,
    pub member_count: usize,
}

/// Labeled output: annotated rows, per-cluster summaries, and segment
/// population counts.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentedCustomers {
    pub customers: Vec<SegmentedCustomer>,
    /// One row per non-empty cluster, ordered by cluster id.
    pub summaries: Vec<ClusterSummary>,
    /// (segment name, population), ordered by descending population.
    pub segment_counts: Vec<(String, usize)>,
}

/// Annotate each RFM row with its 1-based cluster id and tier name, then
/// aggregate. `cluster_ids` is parallel to `rfm`. Imputed recency values
/// feed the summaries via `imputation_days`, matching what was clustered.
pub fn label_segments(
    rfm: &[CustomerRfm],
    cluster_ids: &[usize],
    imputation_days: i64,
) -> SegmentedCustomers {
    assert_eq!(
        rfm.len(),
        cluster_ids.len(),
        "one cluster id per customer row"
    );

    let customers: Vec<SegmentedCustomer> = rfm
        .iter()
        .zip(cluster_ids.iter())
        .map(|(customer, &cluster_id)| SegmentedCustomer {
            customer_id: customer.customer_id.clone(),
            recency: customer.recency,
            frequency: customer.frequency,
            monetary: customer.monetary,
            cluster_id,
            segment: tier_name(cluster_id).to_string(),
        })
        .collect();

    let mut groups: BTreeMap<usize, Vec<&SegmentedCustomer>> = BTreeMap::new();
    for customer in &customers {
        groups.entry(customer.cluster_id).or_default().push(customer);
    }

    let summaries: Vec<ClusterSummary> = groups
        .iter()
        .map(|(&cluster_id, members)| {
            let count = members.len() as f64;
            ClusterSummary {
                cluster_id,
                segment: tier_name(cluster_id).to_string(),
                mean_recency: members
                    .iter()
                    .map(|m| m.recency.unwrap_or(imputation_days) as f64)
                    .sum::<f64>()
                    / count,
                mean_frequency: members.iter().map(|m| m.frequency as f64).sum::<f64>() / count,
                mean_monetary: members.iter().map(|m| m.monetary).sum::<f64>() / count,
                member_count: members.len(),
            }
        })
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for customer in &customers {
        *counts.entry(customer.segment.as_str()).or_default() += 1;
    }
    let mut segment_counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(segment, count)| (segment.to_string(), count))
        .collect();
    // Descending population; name order breaks ties deterministically.
    segment_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    SegmentedCustomers {
        customers,
        summaries,
        segment_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn customer(id: &str, recency: Option<i64>, frequency: u64, monetary: f64) -> CustomerRfm {
        CustomerRfm {
            customer_id: id.to_string(),
            recency,
            frequency,
            monetary,
        }
    }

    #[test]
    fn tier_names_are_positional() {
        assert_eq!(tier_name(1), "Bronze");
        assert_eq!(tier_name(4), "Platinum");
        assert_eq!(tier_name(9), "Royal");
    }

    #[test]
    fn out_of_range_ids_map_to_unknown() {
        assert_eq!(tier_name(0), "Unknown");
        assert_eq!(tier_name(10), "Unknown");
    }

    #[test]
    fn every_customer_gets_a_nonempty_segment() {
        let rfm = vec![
            customer("C1", Some(10), 5, 1000.0),
            customer("C2", Some(200), 1, 50.0),
            customer("C3", Some(12), 6, 1100.0),
        ];
        let labeled = label_segments(&rfm, &[1, 2, 1], 5);
        assert_eq!(labeled.customers.len(), 3);
        assert!(labeled.customers.iter().all(|c| !c.segment.is_empty()));
        assert_eq!(labeled.customers[0].segment, "Bronze");
        assert_eq!(labeled.customers[1].segment, "Silver");
    }

    #[test]
    fn summaries_average_per_cluster() {
        let rfm = vec![
            customer("C1", Some(10), 4, 100.0),
            customer("C2", Some(20), 6, 300.0),
            customer("C3", Some(50), 1, 40.0),
        ];
        let labeled = label_segments(&rfm, &[1, 1, 2], 5);
        assert_eq!(labeled.summaries.len(), 2);
        let bronze = &labeled.summaries[0];
        assert_eq!(bronze.cluster_id, 1);
        assert_eq!(bronze.member_count, 2);
        assert_abs_diff_eq!(bronze.mean_recency, 15.0);
        assert_abs_diff_eq!(bronze.mean_frequency, 5.0);
        assert_abs_diff_eq!(bronze.mean_monetary, 200.0);
    }

    #[test]
    fn unset_recency_enters_summaries_as_the_imputed_value() {
        let rfm = vec![customer("C1", None, 2, 80.0), customer("C2", Some(15), 3, 90.0)];
        let labeled = label_segments(&rfm, &[1, 1], 5);
        assert_abs_diff_eq!(labeled.summaries[0].mean_recency, 10.0);
    }

    #[test]
    fn segment_counts_are_ordered_by_population() {
        let rfm = vec![
            customer("C1", Some(1), 1, 1.0),
            customer("C2", Some(1), 1, 2.0),
            customer("C3", Some(1), 1, 3.0),
            customer("C4", Some(1), 1, 4.0),
        ];
        let labeled = label_segments(&rfm, &[2, 2, 2, 1], 5);
        assert_eq!(
            labeled.segment_counts,
            vec![("Silver".to_string(), 3), ("Bronze".to_string(), 1)]
        );
    }
}
