//! Summary figures for one period, consumed by the report presenter.
//!
//! Everything here is a read-only view over a period's records: totals,
//! average order value, the top-category concentration ratio and the
//! category rankings used by the narrative sections.

use sales_core::formatting::percentage;
use sales_core::models::{AggregatedBucket, GroupingKey, Measure, NormalizedRecord};
use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregator;

/// Default number of categories counted in the concentration ratio.
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Default number of categories listed as high average order value.
pub const DEFAULT_HIGH_AVERAGE_COUNT: usize = 3;

/// Default length of the single-period ranked views.
pub const DEFAULT_BREAKDOWN_SIZE: usize = 10;

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub top_categories: usize,
    pub high_average_count: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            top_categories: DEFAULT_TOP_CATEGORIES,
            high_average_count: DEFAULT_HIGH_AVERAGE_COUNT,
        }
    }
}

/// One of the top categories by sale amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub key: String,
    pub amount: f64,
    /// Number of line-items in the category.
    pub count: usize,
    /// Share of the period's total amount, in percent.
    pub share: f64,
    /// Mean sale amount per line-item.
    pub average_amount: f64,
}

/// A category ranked by mean sale amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAverage {
    pub key: String,
    pub average_amount: f64,
}

/// How many amounts fell back to zero during normalisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub records: usize,
    pub unparsed_amounts: usize,
}

/// Summary figures for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub total_amount: f64,
    pub total_orders: f64,
    pub record_count: usize,
    /// `total_amount / total_orders`, or `0.0` without orders.
    pub average_order_value: f64,
    /// Top categories' share of the total amount, in `[0, 100]` for
    /// non-negative data; `0.0` when the total is zero.
    pub concentration_ratio: f64,
    pub top_categories: Vec<CategoryShare>,
    pub highest_average: Vec<CategoryAverage>,
    pub data_quality: DataQuality,
}

/// Single-period ranked views: groups by amount and by line-item count,
/// prefixes by orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodBreakdown {
    pub groups_by_amount: Vec<AggregatedBucket>,
    pub groups_by_count: Vec<AggregatedBucket>,
    pub prefixes_by_orders: Vec<AggregatedBucket>,
}

impl PeriodBreakdown {
    pub fn build(records: &[NormalizedRecord], n: usize) -> Self {
        let groups = Aggregator::aggregate(records, GroupingKey::CategoryGroup);
        let prefixes = Aggregator::aggregate(records, GroupingKey::CategoryPrefix);
        Self {
            groups_by_amount: Aggregator::rank(&groups, Measure::SaleAmount, n),
            groups_by_count: Aggregator::rank(&groups, Measure::RecordCount, n),
            prefixes_by_orders: Aggregator::rank(&prefixes, Measure::OrderCount, n),
        }
    }
}

// ── MetricsAssembler ──────────────────────────────────────────────────────────

/// Stateless builder for [`PeriodMetrics`].
pub struct MetricsAssembler;

impl MetricsAssembler {
    pub fn assemble(records: &[NormalizedRecord]) -> PeriodMetrics {
        Self::assemble_with(records, MetricsConfig::default())
    }

    pub fn assemble_with(records: &[NormalizedRecord], config: MetricsConfig) -> PeriodMetrics {
        let groups = Aggregator::aggregate(records, GroupingKey::CategoryGroup);
        let totals = Aggregator::calculate_totals(&groups);

        let average_order_value = if totals.sum_orders > 0.0 {
            totals.sum_amount / totals.sum_orders
        } else {
            0.0
        };

        let top = Aggregator::rank(&groups, Measure::SaleAmount, config.top_categories);
        let top_amount: f64 = top.iter().map(|b| b.sum_amount).sum();

        let top_categories = top
            .iter()
            .map(|bucket| CategoryShare {
                key: bucket.key.clone(),
                amount: bucket.sum_amount,
                count: bucket.count,
                share: percentage(bucket.sum_amount, totals.sum_amount),
                average_amount: bucket.average_amount(),
            })
            .collect();

        PeriodMetrics {
            total_amount: totals.sum_amount,
            total_orders: totals.sum_orders,
            record_count: totals.count,
            average_order_value,
            concentration_ratio: percentage(top_amount, totals.sum_amount),
            top_categories,
            highest_average: Self::highest_average(&groups, config.high_average_count),
            data_quality: DataQuality {
                records: records.len(),
                unparsed_amounts: records.iter().filter(|r| !r.amount_parsed).count(),
            },
        }
    }

    /// Categories with the largest mean sale amount per line-item.
    fn highest_average(groups: &[AggregatedBucket], n: usize) -> Vec<CategoryAverage> {
        let mut averages: Vec<CategoryAverage> = groups
            .iter()
            .map(|bucket| CategoryAverage {
                key: bucket.key.clone(),
                average_amount: bucket.average_amount(),
            })
            .collect();
        averages.sort_by(|a, b| b.average_amount.total_cmp(&a.average_amount));
        averages.truncate(n);
        averages
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
