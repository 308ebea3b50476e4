//! Report assembly - one structured bundle per analysis run
//!
//! Validates configuration, runs the three engines over the shared model and
//! merges their outputs. Currency and percentage values are rounded to two
//! decimals here, at the output contract boundary; engines work at full
//! precision. Absent ratios stay absent and serialize as nulls.

use crate::config::AnalysisConfig;
use crate::engines::opportunity::{
    market_expansion, pareto_cutoff, pricing_opportunities, MarketRow, ParetoSummary,
    PricingOpportunityRow,
};
use crate::engines::segmentation::{segment_customers, SegmentationResult};
use crate::engines::trends::{cohort_retention, monthly_revenue_trend, CohortRow, MonthlyTrendRow};
use crate::error::AnalysisError;
use crate::facts::FactModel;
use chrono::NaiveDate;
use serde::Serialize;

/// Per-section counts of groups dropped by minimum-sample gates, kept for
/// auditability of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct Omissions {
    pub cohorts_before_start: usize,
    pub categories_below_sample: usize,
    pub states_below_top_quartiles: usize,
}

/// The full result bundle consumed by the presentation layer.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub as_of: NaiveDate,
    pub segmentation: SegmentationResult,
    pub monthly_trend: Vec<MonthlyTrendRow>,
    pub cohorts: Vec<CohortRow>,
    pub pareto: Option<ParetoSummary>,
    pub pricing: Vec<PricingOpportunityRow>,
    pub markets: Vec<MarketRow>,
    pub omissions: Omissions,
}

/// Run every engine over the model and assemble the report.
///
/// Fails fast on configuration errors before touching the model. The engines
/// are independent over the immutable snapshot, so their relative order does
/// not affect any output.
pub fn run_analysis(
    model: &FactModel,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;

    let mut segmentation = segment_customers(model, config);
    let mut monthly_trend = monthly_revenue_trend(model);
    let mut cohort_result = cohort_retention(model, config);
    let mut pareto = pareto_cutoff(model, config.pareto_threshold);
    let mut pricing_result = pricing_opportunities(model, config);
    let mut market_result = market_expansion(model, config);

    round_segmentation(&mut segmentation);
    for row in &mut monthly_trend {
        row.revenue = round2(row.revenue);
        row.growth_pct = row.growth_pct.map(round2);
        row.trailing_avg_3m = round2(row.trailing_avg_3m);
    }
    for row in &mut cohort_result.rows {
        for slot in &mut row.retention_pct {
            *slot = slot.map(round2);
        }
    }
    if let Some(summary) = &mut pareto {
        summary.catalog_pct = round2(summary.catalog_pct);
        summary.revenue_share_pct = round2(summary.revenue_share_pct);
    }
    for row in &mut pricing_result.rows {
        row.avg_price = round2(row.avg_price);
        row.avg_score = round2(row.avg_score);
        row.current_revenue = round2(row.current_revenue);
        row.projected_uplift = round2(row.projected_uplift);
    }
    for row in &mut market_result.rows {
        row.revenue = round2(row.revenue);
        row.avg_order_value = round2(row.avg_order_value);
        row.avg_review_score = row.avg_review_score.map(round2);
        row.potential_revenue = round2(row.potential_revenue);
    }

    let omissions = Omissions {
        cohorts_before_start: cohort_result.omitted_cohorts,
        categories_below_sample: pricing_result.omitted_categories,
        states_below_top_quartiles: market_result.omitted_states,
    };
    log::info!(
        "analysis complete: {} trend months, {} cohorts, {} pricing rows, {} market rows",
        monthly_trend.len(),
        cohort_result.rows.len(),
        pricing_result.rows.len(),
        market_result.rows.len(),
    );

    Ok(AnalysisReport {
        as_of: config.as_of,
        segmentation,
        monthly_trend,
        cohorts: cohort_result.rows,
        pareto,
        pricing: pricing_result.rows,
        markets: market_result.rows,
        omissions,
    })
}

fn round_segmentation(result: &mut SegmentationResult) {
    for customer in &mut result.customers {
        customer.monetary = round2(customer.monetary);
    }
    for rollup in result
        .rfm_rollups
        .iter_mut()
        .chain(result.ltv_rollups.iter_mut())
        .chain(result.churn_rollups.iter_mut())
    {
        rollup.total_value = round2(rollup.total_value);
        rollup.avg_value = round2(rollup.avg_value);
        rollup.avg_orders = round2(rollup.avg_orders);
        rollup.avg_days_inactive = round2(rollup.avg_days_inactive);
        rollup.potential_impact = round2(rollup.potential_impact);
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
