//! Previous-vs-current comparison of aggregated buckets.
//!
//! Both periods are outer-merged on key: a key seen in only one period is
//! compared against zero rather than dropped. Only the `top_n` keys by
//! combined (previous + current) value take part in a comparison.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use sales_core::models::{AggregatedBucket, ComparisonRow, GroupingKey, Measure};
use serde::{Deserialize, Serialize};

// ── Row ordering ──────────────────────────────────────────────────────────────

/// Orderings used by the different report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Largest current value first (trend charts).
    CurrentDesc,
    /// Largest increase first (gainers).
    DeltaDesc,
    /// Largest decrease first (losers).
    DeltaAsc,
}

/// Stable in-place sort of comparison rows.
pub fn sort_rows(rows: &mut [ComparisonRow], order: RowOrder) {
    match order {
        RowOrder::CurrentDesc => rows.sort_by(|a, b| b.current_value.total_cmp(&a.current_value)),
        RowOrder::DeltaDesc => rows.sort_by(|a, b| b.delta.total_cmp(&a.delta)),
        RowOrder::DeltaAsc => rows.sort_by(|a, b| a.delta.total_cmp(&b.delta)),
    }
}

/// Top and bottom movers by delta, selected independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movers {
    pub gainers: Vec<ComparisonRow>,
    pub losers: Vec<ComparisonRow>,
}

/// The `k` highest-delta rows and the `k` lowest-delta rows.
///
/// A key lands in both lists only when fewer than `2 * k` rows are given.
pub fn movers(rows: &[ComparisonRow], k: usize) -> Movers {
    let mut gainers = rows.to_vec();
    sort_rows(&mut gainers, RowOrder::DeltaDesc);
    gainers.truncate(k);

    let mut losers = rows.to_vec();
    sort_rows(&mut losers, RowOrder::DeltaAsc);
    losers.truncate(k);

    Movers { gainers, losers }
}

// ── PeriodComparator ──────────────────────────────────────────────────────────

/// Stateless helper that merges two periods' buckets into comparison rows.
pub struct PeriodComparator;

impl PeriodComparator {
    /// Compare `prev` and `curr` on `rank_by`, keeping the `top_n` keys with the
    /// largest combined value.
    ///
    /// Key selection breaks ties by key order. Rows are returned in key order;
    /// use [`sort_rows`] for a presentation order.
    pub fn compare(
        prev: &[AggregatedBucket],
        curr: &[AggregatedBucket],
        rank_by: Measure,
        top_n: usize,
    ) -> Vec<ComparisonRow> {
        // key -> (previous, current); a side absent from one period stays 0.
        let mut merged: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for bucket in prev {
            merged.entry(bucket.key.as_str()).or_default().0 += bucket.measure(rank_by);
        }
        for bucket in curr {
            merged.entry(bucket.key.as_str()).or_default().1 += bucket.measure(rank_by);
        }

        let mut ranked: Vec<(&str, f64)> = merged
            .iter()
            .map(|(key, (previous, current))| (*key, previous + current))
            .collect();
        ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(b.0),
            other => other,
        });
        ranked.truncate(top_n);

        let mut selected: Vec<&str> = ranked.into_iter().map(|(key, _)| key).collect();
        selected.sort_unstable();

        selected
            .into_iter()
            .map(|key| {
                let (previous, current) = merged[key];
                ComparisonRow::new(key, previous, current)
            })
            .collect()
    }
}

// ── Comparison ────────────────────────────────────────────────────────────────

/// One comparison with the grouping and measure it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub grouping: GroupingKey,
    pub measure: Measure,
    /// Rows in key order.
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    pub fn build(
        prev: &[AggregatedBucket],
        curr: &[AggregatedBucket],
        grouping: GroupingKey,
        measure: Measure,
        top_n: usize,
    ) -> Self {
        Self {
            grouping,
            measure,
            rows: PeriodComparator::compare(prev, curr, measure, top_n),
        }
    }

    /// Rows ordered by current value, largest first.
    pub fn trend(&self) -> Vec<ComparisonRow> {
        let mut rows = self.rows.clone();
        sort_rows(&mut rows, RowOrder::CurrentDesc);
        rows
    }

    pub fn movers(&self, k: usize) -> Movers {
        movers(&self.rows, k)
    }
}

// ── PeriodTrend ───────────────────────────────────────────────────────────────

/// Overall change between two period totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodTrend {
    pub previous_total: f64,
    pub current_total: f64,
    pub delta: f64,
    /// Percentage change; `0.0` when the previous total is zero.
    pub delta_rate: f64,
}

impl PeriodTrend {
    pub fn between(previous_total: f64, current_total: f64) -> Self {
        let delta = current_total - previous_total;
        let delta_rate = if previous_total != 0.0 {
            delta / previous_total * 100.0
        } else {
            0.0
        };
        Self {
            previous_total,
            current_total,
            delta,
            delta_rate,
        }
    }

    pub fn is_increase(&self) -> bool {
        self.delta > 0.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(key: &str, amount: f64) -> AggregatedBucket {
        AggregatedBucket {
            key: key.to_string(),
            sum_amount: amount,
            sum_orders: amount / 10.0,
            count: 1,
        }
    }

    fn row<'a>(rows: &'a [ComparisonRow], key: &str) -> &'a ComparisonRow {
        rows.iter().find(|r| r.key == key).unwrap()
    }

    // ── compare ───────────────────────────────────────────────────────────────

    #[test]
    fn test_compare_outer_merge_scenario() {
        let prev = vec![bucket("A", 100.0), bucket("B", 50.0)];
        let curr = vec![bucket("A", 150.0), bucket("C", 20.0)];
        let rows = PeriodComparator::compare(&prev, &curr, Measure::SaleAmount, 10);

        assert_eq!(rows.len(), 3);

        let a = row(&rows, "A");
        assert_eq!((a.previous_value, a.current_value, a.delta), (100.0, 150.0, 50.0));
        assert!((a.delta_rate - 50.0).abs() < 1e-9);

        let b = row(&rows, "B");
        assert_eq!((b.previous_value, b.current_value, b.delta), (50.0, 0.0, -50.0));
        assert!((b.delta_rate + 100.0).abs() < 1e-9);

        let c = row(&rows, "C");
        assert_eq!((c.previous_value, c.current_value, c.delta), (0.0, 20.0, 20.0));
        assert!((c.delta_rate - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_selects_top_n_by_combined_value() {
        let prev = vec![bucket("A", 10.0), bucket("B", 100.0), bucket("C", 1.0)];
        let curr = vec![bucket("A", 95.0), bucket("D", 50.0)];
        let rows = PeriodComparator::compare(&prev, &curr, Measure::SaleAmount, 2);

        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        // Combined: A=105, B=100, D=50, C=1.
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_compare_ties_broken_by_key() {
        let prev = vec![bucket("Z", 10.0), bucket("M", 10.0), bucket("A", 10.0)];
        let rows = PeriodComparator::compare(&prev, &[], Measure::SaleAmount, 2);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "M"]);
    }

    #[test]
    fn test_compare_uses_rank_measure() {
        let prev = vec![bucket("A", 100.0)];
        let curr = vec![bucket("A", 300.0)];
        let rows = PeriodComparator::compare(&prev, &curr, Measure::OrderCount, 10);
        assert_eq!(rows[0].previous_value, 10.0);
        assert_eq!(rows[0].current_value, 30.0);
        assert!((rows[0].delta_rate - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_empty_inputs() {
        assert!(PeriodComparator::compare(&[], &[], Measure::SaleAmount, 10).is_empty());

        let prev = vec![bucket("A", 40.0)];
        let rows = PeriodComparator::compare(&prev, &[], Measure::SaleAmount, 10);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].current_value, 0.0);
        assert_eq!(rows[0].delta, -40.0);
    }

    #[test]
    fn test_compare_symmetry() {
        let prev = vec![bucket("A", 100.0), bucket("B", 50.0), bucket("D", 5.0)];
        let curr = vec![bucket("A", 150.0), bucket("C", 20.0), bucket("D", 7.0)];

        let forward = PeriodComparator::compare(&prev, &curr, Measure::SaleAmount, 3);
        let backward = PeriodComparator::compare(&curr, &prev, Measure::SaleAmount, 3);

        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(&backward) {
            assert_eq!(f.key, b.key);
            assert_eq!(f.previous_value, b.current_value);
            assert_eq!(f.current_value, b.previous_value);
            assert_eq!(f.delta, -b.delta);
        }
    }

    // ── sort_rows / movers ────────────────────────────────────────────────────

    fn scenario_rows() -> Vec<ComparisonRow> {
        vec![
            ComparisonRow::new("A", 100.0, 150.0),
            ComparisonRow::new("B", 50.0, 0.0),
            ComparisonRow::new("C", 0.0, 20.0),
            ComparisonRow::new("D", 30.0, 30.0),
        ]
    }

    #[test]
    fn test_sort_rows_current_desc() {
        let mut rows = scenario_rows();
        sort_rows(&mut rows, RowOrder::CurrentDesc);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "D", "C", "B"]);
    }

    #[test]
    fn test_sort_rows_delta_both_directions() {
        let mut rows = scenario_rows();
        sort_rows(&mut rows, RowOrder::DeltaDesc);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "C", "D", "B"]);

        sort_rows(&mut rows, RowOrder::DeltaAsc);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["B", "D", "C", "A"]);
    }

    #[test]
    fn test_movers_independent_lists() {
        let result = movers(&scenario_rows(), 1);
        assert_eq!(result.gainers[0].key, "A");
        assert_eq!(result.losers[0].key, "B");
    }

    #[test]
    fn test_movers_overlap_when_few_rows() {
        let result = movers(&scenario_rows(), 3);
        assert_eq!(result.gainers.len(), 3);
        assert_eq!(result.losers.len(), 3);
        // With 4 rows and k=3 the middle rows appear in both lists.
        assert!(result.gainers.iter().any(|r| r.key == "D"));
        assert!(result.losers.iter().any(|r| r.key == "D"));
    }

    #[test]
    fn test_movers_disjoint_when_enough_rows() {
        let rows: Vec<ComparisonRow> = (0..6)
            .map(|i| ComparisonRow::new(format!("K{i}"), 10.0, i as f64 * 5.0))
            .collect();
        let result = movers(&rows, 3);
        for gainer in &result.gainers {
            assert!(!result.losers.iter().any(|l| l.key == gainer.key));
        }
    }

    // ── Comparison ────────────────────────────────────────────────────────────

    #[test]
    fn test_comparison_trend_order() {
        let prev = vec![bucket("A", 100.0), bucket("B", 50.0)];
        let curr = vec![bucket("A", 150.0), bucket("C", 20.0)];
        let comparison = Comparison::build(
            &prev,
            &curr,
            GroupingKey::CategoryGroup,
            Measure::SaleAmount,
            10,
        );
        let keys: Vec<String> = comparison.trend().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["A", "C", "B"]);
        assert_eq!(comparison.movers(1).gainers[0].key, "A");
    }

    // ── PeriodTrend ───────────────────────────────────────────────────────────

    #[test]
    fn test_period_trend() {
        let trend = PeriodTrend::between(150.0, 170.0);
        assert_eq!(trend.delta, 20.0);
        assert!((trend.delta_rate - 13.333333).abs() < 1e-5);
        assert!(trend.is_increase());
    }

    #[test]
    fn test_period_trend_zero_previous() {
        let trend = PeriodTrend::between(0.0, 500.0);
        assert_eq!(trend.delta, 500.0);
        assert_eq!(trend.delta_rate, 0.0);
    }
}
