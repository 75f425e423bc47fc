//! Plain-text rendering of a [`Report`].
//!
//! Two-period reports lead with the overall trend and the movers; a
//! current-only report leads with the period totals. Both end with the
//! category concentration summary and the "other" group drill-down.

use sales_core::formatting::{format_amount, format_number, format_rate, format_signed_amount};
use sales_core::models::ComparisonRow;
use sales_data::comparator::{Movers, PeriodTrend};
use sales_runtime::report::{ComparisonReport, PeriodReport, Report};

/// Render the whole report as a narrative.
pub fn render_text(report: &Report) -> String {
    let mut lines = Vec::new();

    match (&report.previous, &report.comparison) {
        (Some(previous), Some(comparison)) => {
            lines.push(format!(
                "Sales report: {} vs {}",
                previous.label, report.current.label
            ));
            lines.push(String::new());
            render_comparison(&mut lines, previous, &report.current, comparison);
        }
        _ => {
            lines.push(format!("Sales report: {}", report.current.label));
            lines.push(String::new());
            render_overview(&mut lines, &report.current);
        }
    }

    render_concentration(&mut lines, &report.current);
    render_other_products(&mut lines, &report.current);
    render_data_quality(&mut lines, report);

    lines.join("\n")
}

// ── Two-period sections ──────────────────────────────────────────────────────

fn render_comparison(
    lines: &mut Vec<String>,
    previous: &PeriodReport,
    current: &PeriodReport,
    comparison: &ComparisonReport,
) {
    lines.push("1. Overall trend".to_string());
    render_trend(lines, &previous.label, &current.label, &comparison.amount_trend);
    lines.push(String::new());

    lines.push("2. Category groups with the largest sale amount change".to_string());
    render_movers(lines, &comparison.amount_movers, "");
    lines.push(String::new());

    lines.push("3. Category prefixes with the largest order count change".to_string());
    render_movers(lines, &comparison.order_movers, " orders");
    lines.push(String::new());

    lines.push(format!(
        "4. Top {} category groups by sale amount",
        comparison.by_group_amount.rows.len()
    ));
    lines.push(format!(
        "   {:<24} {:>14} {:>14} {:>14} {:>9}",
        "group", previous.label, current.label, "change", "rate"
    ));
    for row in comparison.by_group_amount.trend() {
        lines.push(format!(
            "   {:<24} {:>14} {:>14} {:>14} {:>9}",
            row.key,
            format_amount(row.previous_value),
            format_amount(row.current_value),
            format_signed_amount(row.delta),
            format_rate(row.delta_rate)
        ));
    }
    lines.push(String::new());
}

fn render_trend(lines: &mut Vec<String>, prev_label: &str, curr_label: &str, trend: &PeriodTrend) {
    lines.push(format!("   - {} total: {}", prev_label, format_amount(trend.previous_total)));
    lines.push(format!("   - {} total: {}", curr_label, format_amount(trend.current_total)));
    lines.push(format!(
        "   - Change: {} ({})",
        format_signed_amount(trend.delta),
        format_rate(trend.delta_rate)
    ));

    let direction = if trend.is_increase() {
        "increased"
    } else if trend.delta < 0.0 {
        "decreased"
    } else {
        "was unchanged"
    };
    if trend.delta == 0.0 {
        lines.push(format!("   > Total sales {} against {}.", direction, prev_label));
    } else {
        lines.push(format!(
            "   > Total sales {} by {}% against {}.",
            direction,
            format_number(trend.delta_rate.abs(), 1),
            prev_label
        ));
    }
}

fn render_movers(lines: &mut Vec<String>, movers: &Movers, unit: &str) {
    for row in &movers.gainers {
        lines.push(mover_line('▲', row, unit));
    }
    for row in &movers.losers {
        lines.push(mover_line('▼', row, unit));
    }
}

fn mover_line(marker: char, row: &ComparisonRow, unit: &str) -> String {
    format!(
        "   {} {}: {}{unit} -> {}{unit} ({}{unit}, {})",
        marker,
        row.key,
        format_amount(row.previous_value),
        format_amount(row.current_value),
        format_signed_amount(row.delta),
        format_rate(row.delta_rate),
    )
}

// ── Single-period sections ───────────────────────────────────────────────────

fn render_overview(lines: &mut Vec<String>, period: &PeriodReport) {
    let metrics = &period.metrics;
    lines.push("1. Overall sales".to_string());
    lines.push(format!("   - Total sales: {}", format_amount(metrics.total_amount)));
    lines.push(format!("   - Total orders: {}", format_amount(metrics.total_orders)));
    lines.push(format!(
        "   - Average order value: {}",
        format_amount(metrics.average_order_value)
    ));
    lines.push(String::new());

    lines.push("2. Highest average sale amount".to_string());
    for category in &metrics.highest_average {
        lines.push(format!(
            "   - {}: {}",
            category.key,
            format_amount(category.average_amount)
        ));
    }
    lines.push(String::new());

    lines.push("3. Top categories by line-items".to_string());
    for bucket in &period.breakdown.groups_by_count {
        lines.push(format!("   - {}: {} line-items", bucket.key, bucket.count));
    }
    lines.push(String::new());
}

// ── Shared sections ──────────────────────────────────────────────────────────

fn render_concentration(lines: &mut Vec<String>, period: &PeriodReport) {
    let metrics = &period.metrics;
    lines.push(format!("Sales concentration ({})", period.label));
    lines.push(format!(
        "   The top {} categories account for {}% of total sales.",
        metrics.top_categories.len(),
        format_number(metrics.concentration_ratio, 1)
    ));
    for category in &metrics.top_categories {
        lines.push(format!(
            "   - {}: {} ({}%, {} line-items)",
            category.key,
            format_amount(category.amount),
            format_number(category.share, 1),
            category.count
        ));
    }
    lines.push(String::new());
}

fn render_other_products(lines: &mut Vec<String>, period: &PeriodReport) {
    if period.other_products.is_empty() {
        return;
    }
    lines.push(format!("Uncategorised products ({})", period.label));
    for bucket in &period.other_products {
        lines.push(format!(
            "   - {}: {} ({} orders)",
            bucket.key,
            format_amount(bucket.sum_amount),
            format_amount(bucket.sum_orders)
        ));
    }
    lines.push(String::new());
}

fn render_data_quality(lines: &mut Vec<String>, report: &Report) {
    let periods = report.previous.iter().chain(std::iter::once(&report.current));
    for period in periods {
        let quality = period.metrics.data_quality;
        if quality.unparsed_amounts > 0 {
            lines.push(format!(
                "Note: {} of {} rows in {} had an unreadable sale amount and count as 0.",
                quality.unparsed_amounts, quality.records, period.label
            ));
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
