use serde::{Deserialize, Serialize};

use crate::category::CategoryKeys;
use crate::normalizer::parse_amount;

/// Category key used when a label carries no usable grouping text.
pub const OTHER_CATEGORY: &str = "other";

/// Branch name assigned when the source has no branch column.
pub const UNASSIGNED_BRANCH: &str = "unassigned-branch";

/// A sale amount exactly as it arrived from the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A cell the decoder already typed as numeric.
    Number(f64),
    /// Free text such as `"(12,345)"`, `"8,000"` or `"N/A"`.
    Text(String),
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(value: String) -> Self {
        RawAmount::Text(value)
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

/// One sales line-item before normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Free-text category label, e.g. `"Snacks (Imported)"`.
    pub category_raw: String,
    pub product_name: String,
    pub order_count: f64,
    pub sale_amount: RawAmount,
    /// `None` when the source has no branch column.
    #[serde(default)]
    pub branch_name: Option<String>,
    /// `None` when the source has no period column.
    #[serde(default)]
    pub period_label: Option<String>,
}

/// A [`Record`] with its amount parsed and both category keys derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub category_raw: String,
    pub product_name: String,
    pub order_count: f64,
    /// Parsed amount; `0.0` when the raw value was unparseable.
    pub sale_amount: f64,
    /// `false` when `sale_amount` is a zero fallback rather than a parsed value.
    pub amount_parsed: bool,
    pub branch_name: String,
    pub period_label: String,
    /// Text inside the first parenthetical span of the label.
    pub category_group: String,
    /// Text before the first parenthesis of the label.
    pub category_prefix: String,
}

impl NormalizedRecord {
    /// Normalise `record`, filling absent defaultable fields.
    ///
    /// `default_period` is used when the record carries no period label.
    pub fn from_record(record: Record, default_period: &str) -> Self {
        let parsed = parse_amount(&record.sale_amount);
        let keys = CategoryKeys::extract(&record.category_raw);

        Self {
            category_raw: record.category_raw,
            product_name: record.product_name,
            order_count: record.order_count,
            sale_amount: parsed.unwrap_or(0.0),
            amount_parsed: parsed.is_some(),
            branch_name: record
                .branch_name
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_BRANCH.to_string()),
            period_label: record
                .period_label
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| default_period.to_string()),
            category_group: keys.group,
            category_prefix: keys.prefix,
        }
    }
}

/// Which record field buckets are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingKey {
    CategoryGroup,
    CategoryPrefix,
    Product,
    Branch,
}

impl GroupingKey {
    /// The key value of `record` under this grouping.
    pub fn select<'a>(&self, record: &'a NormalizedRecord) -> &'a str {
        match self {
            GroupingKey::CategoryGroup => &record.category_group,
            GroupingKey::CategoryPrefix => &record.category_prefix,
            GroupingKey::Product => &record.product_name,
            GroupingKey::Branch => &record.branch_name,
        }
    }
}

impl std::fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GroupingKey::CategoryGroup => "category group",
            GroupingKey::CategoryPrefix => "category prefix",
            GroupingKey::Product => "product",
            GroupingKey::Branch => "branch",
        };
        f.write_str(name)
    }
}

/// Which bucket value is ranked and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    SaleAmount,
    OrderCount,
    RecordCount,
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Measure::SaleAmount => "sale amount",
            Measure::OrderCount => "order count",
            Measure::RecordCount => "record count",
        };
        f.write_str(name)
    }
}

/// Sum and count totals for one grouping key within one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBucket {
    pub key: String,
    pub sum_amount: f64,
    pub sum_orders: f64,
    /// Number of source records mapped to `key`.
    pub count: usize,
}

impl AggregatedBucket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Add a single record's figures to the running totals.
    pub fn add_record(&mut self, record: &NormalizedRecord) {
        self.sum_amount += record.sale_amount;
        self.sum_orders += record.order_count;
        self.count += 1;
    }

    /// The value of `measure` for this bucket.
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::SaleAmount => self.sum_amount,
            Measure::OrderCount => self.sum_orders,
            Measure::RecordCount => self.count as f64,
        }
    }

    /// Mean sale amount per record, `0.0` for an empty bucket.
    pub fn average_amount(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_amount / self.count as f64
        }
    }
}

/// Previous and current values for one key, with the change between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub key: String,
    pub current_value: f64,
    pub previous_value: f64,
    pub delta: f64,
    /// Percentage change; a zero previous value is treated as 1.
    pub delta_rate: f64,
}

impl ComparisonRow {
    pub fn new(key: impl Into<String>, previous_value: f64, current_value: f64) -> Self {
        let delta = current_value - previous_value;
        let denominator = if previous_value == 0.0 {
            1.0
        } else {
            previous_value
        };
        Self {
            key: key.into(),
            current_value,
            previous_value,
            delta,
            delta_rate: delta / denominator * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, amount: RawAmount) -> Record {
        Record {
            category_raw: category.to_string(),
            product_name: "Chips".to_string(),
            order_count: 2.0,
            sale_amount: amount,
            branch_name: None,
            period_label: None,
        }
    }

    // ── NormalizedRecord ──────────────────────────────────────────────────────

    #[test]
    fn test_from_record_fills_defaults() {
        let raw = record("Snacks (Imported)", "(12,345)".into());
        let normalized = NormalizedRecord::from_record(raw, "current");

        assert_eq!(normalized.sale_amount, 12345.0);
        assert!(normalized.amount_parsed);
        assert_eq!(normalized.branch_name, UNASSIGNED_BRANCH);
        assert_eq!(normalized.period_label, "current");
        assert_eq!(normalized.category_group, "Imported");
        assert_eq!(normalized.category_prefix, "Snacks");
    }

    #[test]
    fn test_from_record_keeps_present_fields() {
        let mut raw = record("Drinks", "1200".into());
        raw.branch_name = Some("Gangnam".to_string());
        raw.period_label = Some("2024-05".to_string());

        let normalized = NormalizedRecord::from_record(raw, "current");
        assert_eq!(normalized.branch_name, "Gangnam");
        assert_eq!(normalized.period_label, "2024-05");
        assert_eq!(normalized.category_group, OTHER_CATEGORY);
        assert_eq!(normalized.category_prefix, "Drinks");
    }

    #[test]
    fn test_from_record_flags_unparseable_amount() {
        let raw = record("Drinks", "N/A".into());
        let normalized = NormalizedRecord::from_record(raw, "previous");
        assert_eq!(normalized.sale_amount, 0.0);
        assert!(!normalized.amount_parsed);
    }

    #[test]
    fn test_from_record_blank_branch_gets_default() {
        let mut raw = record("Drinks", "10".into());
        raw.branch_name = Some("   ".to_string());
        let normalized = NormalizedRecord::from_record(raw, "previous");
        assert_eq!(normalized.branch_name, UNASSIGNED_BRANCH);
    }

    // ── GroupingKey ───────────────────────────────────────────────────────────

    #[test]
    fn test_grouping_key_select() {
        let mut raw = record("Snacks (Imported)", "10".into());
        raw.branch_name = Some("Mapo".to_string());
        let normalized = NormalizedRecord::from_record(raw, "current");

        assert_eq!(GroupingKey::CategoryGroup.select(&normalized), "Imported");
        assert_eq!(GroupingKey::CategoryPrefix.select(&normalized), "Snacks");
        assert_eq!(GroupingKey::Product.select(&normalized), "Chips");
        assert_eq!(GroupingKey::Branch.select(&normalized), "Mapo");
    }

    // ── AggregatedBucket ──────────────────────────────────────────────────────

    #[test]
    fn test_bucket_measure_and_average() {
        let bucket = AggregatedBucket {
            key: "A".to_string(),
            sum_amount: 300.0,
            sum_orders: 7.0,
            count: 3,
        };
        assert_eq!(bucket.measure(Measure::SaleAmount), 300.0);
        assert_eq!(bucket.measure(Measure::OrderCount), 7.0);
        assert_eq!(bucket.measure(Measure::RecordCount), 3.0);
        assert_eq!(bucket.average_amount(), 100.0);
    }

    #[test]
    fn test_empty_bucket_average_is_zero() {
        assert_eq!(AggregatedBucket::new("A").average_amount(), 0.0);
    }

    // ── ComparisonRow ─────────────────────────────────────────────────────────

    #[test]
    fn test_comparison_row_rate() {
        let row = ComparisonRow::new("A", 100.0, 150.0);
        assert_eq!(row.delta, 50.0);
        assert!((row.delta_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_comparison_row_zero_previous_treated_as_one() {
        let row = ComparisonRow::new("C", 0.0, 20.0);
        assert_eq!(row.delta, 20.0);
        assert!((row.delta_rate - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_comparison_row_vanished_key() {
        let row = ComparisonRow::new("B", 50.0, 0.0);
        assert_eq!(row.delta, -50.0);
        assert!((row.delta_rate + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_raw_amount_untagged_deserialize() {
        let number: RawAmount = serde_json::from_str("1200.5").unwrap();
        let text: RawAmount = serde_json::from_str("\"(1,000)\"").unwrap();
        assert_eq!(number, RawAmount::Number(1200.5));
        assert_eq!(text, RawAmount::Text("(1,000)".to_string()));
    }
}
