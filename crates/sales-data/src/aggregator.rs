//! Per-key aggregation of normalised sales records.

use std::collections::BTreeMap;

use sales_core::models::{AggregatedBucket, GroupingKey, Measure, NormalizedRecord};

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Stateless helper that groups records into [`AggregatedBucket`]s.
pub struct Aggregator;

impl Aggregator {
    /// Group `records` by `key` and total amount, orders and record count.
    ///
    /// Buckets are returned sorted by key, so the result does not depend on
    /// input order. Empty input yields no buckets.
    pub fn aggregate(records: &[NormalizedRecord], key: GroupingKey) -> Vec<AggregatedBucket> {
        // Use BTreeMap for automatically sorted keys.
        let mut map: BTreeMap<&str, AggregatedBucket> = BTreeMap::new();

        for record in records {
            let k = key.select(record);
            map.entry(k)
                .or_insert_with(|| AggregatedBucket::new(k))
                .add_record(record);
        }

        map.into_values().collect()
    }

    /// The `n` largest buckets by `measure`, descending.
    ///
    /// The sort is stable: buckets with equal values keep their input order,
    /// which for [`Aggregator::aggregate`] output is key order.
    pub fn rank(buckets: &[AggregatedBucket], measure: Measure, n: usize) -> Vec<AggregatedBucket> {
        let mut ranked = buckets.to_vec();
        ranked.sort_by(|a, b| b.measure(measure).total_cmp(&a.measure(measure)));
        ranked.truncate(n);
        ranked
    }

    /// Sum every bucket into a single totals bucket keyed `"total"`.
    pub fn calculate_totals(buckets: &[AggregatedBucket]) -> AggregatedBucket {
        let mut totals = AggregatedBucket::new("total");
        for bucket in buckets {
            totals.sum_amount += bucket.sum_amount;
            totals.sum_orders += bucket.sum_orders;
            totals.count += bucket.count;
        }
        totals
    }

    /// Best-selling products inside one category group, by sale amount.
    ///
    /// Used to break down the catch-all `"other"` group.
    pub fn top_products(
        records: &[NormalizedRecord],
        category_group: &str,
        n: usize,
    ) -> Vec<AggregatedBucket> {
        let members: Vec<NormalizedRecord> = records
            .iter()
            .filter(|r| r.category_group == category_group)
            .cloned()
            .collect();
        let products = Self::aggregate(&members, GroupingKey::Product);
        Self::rank(&products, Measure::SaleAmount, n)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sales_core::models::{RawAmount, Record};

    fn make_record(category: &str, product: &str, orders: f64, amount: f64) -> NormalizedRecord {
        NormalizedRecord::from_record(
            Record {
                category_raw: category.to_string(),
                product_name: product.to_string(),
                order_count: orders,
                sale_amount: RawAmount::Number(amount),
                branch_name: None,
                period_label: None,
            },
            "current",
        )
    }

    fn sample() -> Vec<NormalizedRecord> {
        vec![
            make_record("Snacks (Imported)", "Choco Pie", 3.0, 300.0),
            make_record("Drinks (Local)", "Barley Tea", 1.0, 50.0),
            make_record("Snacks (Local)", "Rice Cracker", 2.0, 120.0),
            make_record("Snacks (Imported)", "Gummies", 5.0, 200.0),
            make_record("Frozen", "Dumplings", 4.0, 80.0),
        ]
    }

    // ── aggregate ─────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_by_group() {
        let buckets = Aggregator::aggregate(&sample(), GroupingKey::CategoryGroup);

        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["Imported", "Local", "other"]);

        assert_eq!(buckets[0].sum_amount, 500.0);
        assert_eq!(buckets[0].sum_orders, 8.0);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[1].sum_amount, 170.0);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[2].count, 1);
    }

    #[test]
    fn test_aggregate_by_prefix() {
        let buckets = Aggregator::aggregate(&sample(), GroupingKey::CategoryPrefix);
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["Drinks", "Frozen", "Snacks"]);
        assert_eq!(buckets[2].sum_orders, 10.0);
        assert_eq!(buckets[2].count, 3);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(Aggregator::aggregate(&[], GroupingKey::CategoryGroup).is_empty());
    }

    #[test]
    fn test_aggregate_order_independent() {
        let records = sample();
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(2);

        let expected = Aggregator::aggregate(&records, GroupingKey::CategoryGroup);
        assert_eq!(
            Aggregator::aggregate(&reversed, GroupingKey::CategoryGroup),
            expected
        );
        assert_eq!(
            Aggregator::aggregate(&rotated, GroupingKey::CategoryGroup),
            expected
        );
    }

    #[test]
    fn test_aggregate_preserves_total_amount() {
        let records = sample();
        let input_total: f64 = records.iter().map(|r| r.sale_amount).sum();

        for key in [GroupingKey::CategoryGroup, GroupingKey::CategoryPrefix] {
            let buckets = Aggregator::aggregate(&records, key);
            let bucket_total: f64 = buckets.iter().map(|b| b.sum_amount).sum();
            assert!((bucket_total - input_total).abs() < 1e-9);
            let count: usize = buckets.iter().map(|b| b.count).sum();
            assert_eq!(count, records.len());
        }
    }

    // ── rank ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_rank_descending_and_truncated() {
        let buckets = Aggregator::aggregate(&sample(), GroupingKey::CategoryGroup);
        let ranked = Aggregator::rank(&buckets, Measure::SaleAmount, 2);
        let keys: Vec<&str> = ranked.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["Imported", "Local"]);
    }

    #[test]
    fn test_rank_ties_keep_key_order() {
        let records = vec![
            make_record("X (b)", "p", 1.0, 10.0),
            make_record("X (a)", "p", 1.0, 10.0),
            make_record("X (c)", "p", 1.0, 10.0),
        ];
        let buckets = Aggregator::aggregate(&records, GroupingKey::CategoryGroup);
        let ranked = Aggregator::rank(&buckets, Measure::RecordCount, 3);
        let keys: Vec<&str> = ranked.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_more_than_available() {
        let buckets = Aggregator::aggregate(&sample(), GroupingKey::CategoryPrefix);
        assert_eq!(Aggregator::rank(&buckets, Measure::OrderCount, 10).len(), 3);
    }

    // ── calculate_totals ──────────────────────────────────────────────────────

    #[test]
    fn test_calculate_totals() {
        let buckets = Aggregator::aggregate(&sample(), GroupingKey::CategoryGroup);
        let totals = Aggregator::calculate_totals(&buckets);
        assert_eq!(totals.sum_amount, 750.0);
        assert_eq!(totals.sum_orders, 15.0);
        assert_eq!(totals.count, 5);
    }

    #[test]
    fn test_calculate_totals_empty() {
        let totals = Aggregator::calculate_totals(&[]);
        assert_eq!(totals.count, 0);
        assert_eq!(totals.sum_amount, 0.0);
    }

    // ── top_products ──────────────────────────────────────────────────────────

    #[test]
    fn test_top_products_within_group() {
        let mut records = sample();
        records.push(make_record("Frozen", "Dumplings", 1.0, 40.0));
        records.push(make_record("Bakery", "Bagel", 1.0, 500.0));

        let products = Aggregator::top_products(&records, "other", 10);
        let keys: Vec<&str> = products.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["Bagel", "Dumplings"]);
        assert_eq!(products[1].sum_amount, 120.0);
    }

    #[test]
    fn test_top_products_unknown_group() {
        assert!(Aggregator::top_products(&sample(), "Nope", 5).is_empty());
    }
}
