//! Report pipeline.
//!
//! Loads one or two period exports through the [`DataManager`], then runs the
//! aggregation, comparison and metrics stages and collects the results into a
//! serialisable [`Report`]. With no previous period only the single-period
//! sections are produced.

use std::path::Path;

use chrono::Utc;
use sales_core::error::ReportError;
use sales_core::models::{AggregatedBucket, GroupingKey, Measure, NormalizedRecord, OTHER_CATEGORY};
use sales_core::settings::Settings;
use sales_data::aggregator::Aggregator;
use sales_data::comparator::{Comparison, Movers, PeriodTrend};
use sales_data::metrics::{
    MetricsAssembler, MetricsConfig, PeriodBreakdown, PeriodMetrics, DEFAULT_BREAKDOWN_SIZE,
};
use serde::{Deserialize, Serialize};

use crate::data_manager::DataManager;

// ── Options ───────────────────────────────────────────────────────────────────

/// Knobs for one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub previous_label: String,
    pub current_label: String,
    /// Keys kept in each period comparison.
    pub top_n: usize,
    /// Gainers and losers listed per comparison.
    pub movers: usize,
    pub metrics: MetricsConfig,
    /// Length of the single-period ranked views and the "other" drill-down.
    pub breakdown_size: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            previous_label: "previous".to_string(),
            current_label: "current".to_string(),
            top_n: 10,
            movers: 3,
            metrics: MetricsConfig::default(),
            breakdown_size: DEFAULT_BREAKDOWN_SIZE,
        }
    }
}

impl ReportOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            previous_label: settings.previous_label.clone(),
            current_label: settings.current_label.clone(),
            top_n: settings.top_n as usize,
            movers: settings.movers as usize,
            metrics: MetricsConfig {
                top_categories: settings.top_categories as usize,
                ..MetricsConfig::default()
            },
            breakdown_size: DEFAULT_BREAKDOWN_SIZE,
        }
    }
}

// ── Report types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// RFC 3339 timestamp of report generation.
    pub generated_at: String,
    pub previous_label: Option<String>,
    pub current_label: String,
    pub previous_records: usize,
    pub current_records: usize,
}

/// Everything computed from a single period's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub label: String,
    pub metrics: PeriodMetrics,
    pub breakdown: PeriodBreakdown,
    /// Best-selling products inside the catch-all `"other"` group.
    pub other_products: Vec<AggregatedBucket>,
}

impl PeriodReport {
    pub fn build(label: &str, records: &[NormalizedRecord], options: &ReportOptions) -> Self {
        Self {
            label: label.to_string(),
            metrics: MetricsAssembler::assemble_with(records, options.metrics),
            breakdown: PeriodBreakdown::build(records, options.breakdown_size),
            other_products: Aggregator::top_products(
                records,
                OTHER_CATEGORY,
                options.breakdown_size,
            ),
        }
    }
}

/// Previous-vs-current sections of a two-period report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Change in total sale amount.
    pub amount_trend: PeriodTrend,
    /// Change in total order count.
    pub orders_trend: PeriodTrend,
    /// Category groups compared on sale amount.
    pub by_group_amount: Comparison,
    /// Category prefixes compared on order count.
    pub by_prefix_orders: Comparison,
    pub amount_movers: Movers,
    pub order_movers: Movers,
}

impl ComparisonReport {
    pub fn build(
        previous: &[NormalizedRecord],
        current: &[NormalizedRecord],
        prev_metrics: &PeriodMetrics,
        curr_metrics: &PeriodMetrics,
        options: &ReportOptions,
    ) -> Self {
        let by_group_amount = compare_on(
            previous,
            current,
            GroupingKey::CategoryGroup,
            Measure::SaleAmount,
            options.top_n,
        );
        let by_prefix_orders = compare_on(
            previous,
            current,
            GroupingKey::CategoryPrefix,
            Measure::OrderCount,
            options.top_n,
        );

        Self {
            amount_trend: PeriodTrend::between(
                prev_metrics.total_amount,
                curr_metrics.total_amount,
            ),
            orders_trend: PeriodTrend::between(
                prev_metrics.total_orders,
                curr_metrics.total_orders,
            ),
            amount_movers: by_group_amount.movers(options.movers),
            order_movers: by_prefix_orders.movers(options.movers),
            by_group_amount,
            by_prefix_orders,
        }
    }
}

/// Full report output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub previous: Option<PeriodReport>,
    pub current: PeriodReport,
    pub comparison: Option<ComparisonReport>,
}

impl Report {
    /// Build a report from already-normalised records.
    ///
    /// `previous` is `None` for a single-period report.
    pub fn build(
        previous: Option<&[NormalizedRecord]>,
        current: &[NormalizedRecord],
        options: &ReportOptions,
    ) -> Self {
        let current_report = PeriodReport::build(&options.current_label, current, options);

        let (previous_report, comparison) = match previous {
            Some(prev_records) => {
                let prev_report =
                    PeriodReport::build(&options.previous_label, prev_records, options);
                let comparison = ComparisonReport::build(
                    prev_records,
                    current,
                    &prev_report.metrics,
                    &current_report.metrics,
                    options,
                );
                (Some(prev_report), Some(comparison))
            }
            None => (None, None),
        };

        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now().to_rfc3339(),
                previous_label: previous.map(|_| options.previous_label.clone()),
                current_label: options.current_label.clone(),
                previous_records: previous.map_or(0, <[NormalizedRecord]>::len),
                current_records: current.len(),
            },
            previous: previous_report,
            current: current_report,
            comparison,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.comparison.is_some()
    }

    /// Pretty-printed JSON for chart tooling.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ── ReportBuilder ─────────────────────────────────────────────────────────────

/// Loads period files and builds [`Report`]s, reusing cached loads across
/// runs.
pub struct ReportBuilder {
    manager: DataManager,
    options: ReportOptions,
}

impl ReportBuilder {
    pub fn new(options: ReportOptions) -> Self {
        Self::with_manager(DataManager::default(), options)
    }

    pub fn with_manager(manager: DataManager, options: ReportOptions) -> Self {
        Self { manager, options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn manager(&self) -> &DataManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut DataManager {
        &mut self.manager
    }

    /// Load `current` (and `previous`, when given) and build the report.
    pub fn generate(
        &mut self,
        previous: Option<&Path>,
        current: &Path,
    ) -> Result<Report, ReportError> {
        if previous.is_some() && self.options.previous_label == self.options.current_label {
            return Err(ReportError::Config(format!(
                "period labels must differ (both are '{}')",
                self.options.current_label
            )));
        }

        let prev_records = match previous {
            Some(path) => Some(
                self.manager
                    .get_records(path, &self.options.previous_label)
                    .map_err(|e| ReportError::load(&self.options.previous_label, e))?,
            ),
            None => None,
        };
        let curr_records = self
            .manager
            .get_records(current, &self.options.current_label)
            .map_err(|e| ReportError::load(&self.options.current_label, e))?;

        tracing::info!(
            previous_records = prev_records.as_ref().map_or(0, |r| r.len()),
            current_records = curr_records.len(),
            "building report"
        );

        let report = Report::build(
            prev_records.as_deref().map(Vec::as_slice),
            &curr_records,
            &self.options,
        );

        let stats = self.manager.stats();
        tracing::debug!(
            hits = stats.hits,
            misses = stats.misses,
            entries = stats.entries,
            "load cache stats"
        );
        Ok(report)
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn compare_on(
    previous: &[NormalizedRecord],
    current: &[NormalizedRecord],
    grouping: GroupingKey,
    measure: Measure,
    top_n: usize,
) -> Comparison {
    let prev_buckets = Aggregator::aggregate(previous, grouping);
    let curr_buckets = Aggregator::aggregate(current, grouping);
    Comparison::build(&prev_buckets, &curr_buckets, grouping, measure, top_n)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
