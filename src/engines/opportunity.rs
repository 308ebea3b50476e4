//! Revenue concentration, pricing opportunities and market expansion scoring
//!
//! Three independent analyses over delivered orders. Groups that fail a
//! minimum-sample gate are omitted from output and counted, never reported
//! with fabricated zeros.

use crate::config::AnalysisConfig;
use crate::facts::FactModel;
use crate::kernel::{group_avg, group_sum, quantile_bucket, running_sum, SortDirection};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// The smallest top-revenue product set covering the threshold share.
#[derive(Debug, Clone, Serialize)]
pub struct ParetoSummary {
    /// Products in the cut-off set.
    pub products: usize,
    /// Products with any delivered revenue.
    pub catalog: usize,
    pub catalog_pct: f64,
    pub revenue_share_pct: f64,
}

/// Walk products by delivered revenue, largest first, until the cumulative
/// share reaches `threshold`. Absent when no delivered revenue exists.
pub fn pareto_cutoff(model: &FactModel, threshold: f64) -> Option<ParetoSummary> {
    let delivered_lines: Vec<_> = model
        .delivered_orders()
        .flat_map(|order| model.lines_for_order(&order.id))
        .collect();
    let revenue_by_product = group_sum(
        &delivered_lines,
        |line| line.product_id.clone(),
        |line| Some(line.contribution()),
    );

    let entries: Vec<(String, f64)> = revenue_by_product.into_iter().collect();
    let cumulative = running_sum(&entries, |(_, revenue)| *revenue, |(id, _)| id.clone());

    // Total taken from the sorted walk itself so the float accumulation order
    // is reproducible run to run.
    let total = match cumulative.last() {
        Some((_, cum)) if *cum > 0.0 => *cum,
        _ => return None,
    };
    let target = threshold * total;
    let mut products = 0;
    let mut covered = 0.0;
    for (_, cum) in &cumulative {
        products += 1;
        covered = *cum;
        if covered >= target {
            break;
        }
    }

    Some(ParetoSummary {
        products,
        catalog: entries.len(),
        catalog_pct: products as f64 / entries.len() as f64 * 100.0,
        revenue_share_pct: covered / total * 100.0,
    })
}

/// A category with enough under-priced, well-rated products to support a
/// price increase.
#[derive(Debug, Clone, Serialize)]
pub struct PricingOpportunityRow {
    pub category: String,
    pub products: usize,
    pub avg_price: f64,
    pub avg_score: f64,
    pub review_count: usize,
    pub current_revenue: f64,
    pub projected_uplift: f64,
}

#[derive(Debug, Serialize)]
pub struct PricingResult {
    pub rows: Vec<PricingOpportunityRow>,
    /// Categories dropped by the minimum-sample gate.
    pub omitted_categories: usize,
}

#[derive(Debug)]
struct ProductStats {
    product_id: String,
    category_name: String,
    category_display: String,
    avg_price: f64,
    avg_score: Option<f64>,
    review_count: usize,
    revenue: f64,
}

/// Flag quartile-1 products with high ratings as upsell candidates and roll
/// them up per category.
pub fn pricing_opportunities(model: &FactModel, config: &AnalysisConfig) -> PricingResult {
    #[derive(Default)]
    struct Acc {
        orders: HashSet<String>,
        price_sum: f64,
        line_count: usize,
        revenue: f64,
        score_sum: f64,
        score_count: usize,
    }

    let mut per_product: HashMap<String, Acc> = HashMap::new();
    for order in model.delivered_orders() {
        let mut products_in_order: HashSet<&str> = HashSet::new();
        for line in model.lines_for_order(&order.id) {
            let acc = per_product.entry(line.product_id.clone()).or_default();
            acc.orders.insert(order.id.clone());
            acc.price_sum += line.price;
            acc.line_count += 1;
            acc.revenue += line.contribution();
            products_in_order.insert(line.product_id.as_str());
        }
        // Reviews attach to the order; each product in the order inherits
        // them once, and orders without reviews contribute nothing.
        let scores: Vec<u8> = model
            .reviews_for_order(&order.id)
            .map(|review| review.score)
            .collect();
        if scores.is_empty() {
            continue;
        }
        for product_id in products_in_order {
            if let Some(acc) = per_product.get_mut(product_id) {
                acc.score_sum += scores.iter().map(|&s| s as f64).sum::<f64>();
                acc.score_count += scores.len();
            }
        }
    }

    // Products below the order floor or without a resolvable category cannot
    // be priced against their peers.
    let mut stats: Vec<ProductStats> = Vec::new();
    for (product_id, acc) in per_product {
        if acc.orders.len() < config.min_orders_for_pricing {
            continue;
        }
        let Some(category) = model.category_of_product(&product_id) else {
            continue;
        };
        stats.push(ProductStats {
            product_id,
            category_name: category.name.clone(),
            category_display: category.display_name.clone(),
            avg_price: acc.price_sum / acc.line_count as f64,
            avg_score: (acc.score_count > 0).then(|| acc.score_sum / acc.score_count as f64),
            review_count: acc.score_count,
            revenue: acc.revenue,
        });
    }

    let mut by_category: BTreeMap<String, Vec<&ProductStats>> = BTreeMap::new();
    for stat in &stats {
        by_category
            .entry(stat.category_name.clone())
            .or_default()
            .push(stat);
    }

    let mut rows = Vec::new();
    let mut omitted_categories = 0;
    for (_, products) in by_category {
        let quartiles = quantile_bucket(
            &products,
            |p| p.avg_price,
            |p| p.product_id.clone(),
            SortDirection::Ascending,
            4,
        );
        let candidates: Vec<&ProductStats> = quartiles
            .into_iter()
            .filter(|(product, quartile)| {
                *quartile == 1
                    && product.avg_score.is_some_and(|score| score >= 4.5)
                    && product.review_count >= 10
            })
            .map(|(product, _)| *product)
            .collect();

        if candidates.is_empty() {
            continue;
        }
        if candidates.len() < config.min_category_sample_size {
            omitted_categories += 1;
            continue;
        }

        let count = candidates.len() as f64;
        let current_revenue: f64 = candidates.iter().map(|p| p.revenue).sum();
        rows.push(PricingOpportunityRow {
            category: candidates[0].category_display.clone(),
            products: candidates.len(),
            avg_price: candidates.iter().map(|p| p.avg_price).sum::<f64>() / count,
            avg_score: candidates
                .iter()
                .filter_map(|p| p.avg_score)
                .sum::<f64>()
                / count,
            review_count: candidates.iter().map(|p| p.review_count).sum(),
            current_revenue,
            projected_uplift: current_revenue * config.price_increase_pct,
        });
    }
    rows.sort_by(|a, b| {
        b.projected_uplift
            .total_cmp(&a.projected_uplift)
            .then_with(|| a.category.cmp(&b.category))
    });

    log::info!(
        "pricing opportunities: {} categories reported, {} below sample floor",
        rows.len(),
        omitted_categories
    );

    PricingResult {
        rows,
        omitted_categories,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketClass {
    #[serde(rename = "High Growth Potential")]
    HighGrowthPotential,
    #[serde(rename = "Premium Market")]
    PremiumMarket,
    #[serde(rename = "Expansion Target")]
    ExpansionTarget,
    #[serde(rename = "Established Market")]
    EstablishedMarket,
}

/// Quartile classification, first match wins. Quartile 1 is the top quartile.
fn classify_market(revenue_quartile: usize, customer_quartile: usize, avg_order_value: f64) -> MarketClass {
    if revenue_quartile == 1 && customer_quartile == 1 {
        MarketClass::HighGrowthPotential
    } else if revenue_quartile <= 2 && avg_order_value > 150.0 {
        MarketClass::PremiumMarket
    } else if revenue_quartile <= 2 {
        MarketClass::ExpansionTarget
    } else {
        MarketClass::EstablishedMarket
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketRow {
    pub state: String,
    pub customers: usize,
    pub orders: usize,
    pub revenue: f64,
    pub avg_order_value: f64,
    /// Absent when no order in the state carries a review.
    pub avg_review_score: Option<f64>,
    pub revenue_quartile: usize,
    pub customer_quartile: usize,
    pub classification: MarketClass,
    pub potential_revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct MarketResult {
    pub rows: Vec<MarketRow>,
    /// States outside the top two revenue quartiles.
    pub omitted_states: usize,
}

/// Score states by delivered revenue and customer base; report the top two
/// revenue quartiles.
pub fn market_expansion(model: &FactModel, config: &AnalysisConfig) -> MarketResult {
    #[derive(Default)]
    struct Acc {
        customers: HashSet<String>,
        orders: usize,
        revenue: f64,
    }

    let mut per_state: HashMap<String, Acc> = HashMap::new();
    let mut state_scores: Vec<(String, f64)> = Vec::new();
    for order in model.delivered_orders() {
        let Some(customer) = model.customer_of_order(&order.id) else {
            continue;
        };
        let acc = per_state.entry(customer.state.clone()).or_default();
        acc.customers.insert(customer.unique_id.clone());
        acc.orders += 1;
        acc.revenue += model.order_revenue(&order.id);
        for review in model.reviews_for_order(&order.id) {
            state_scores.push((customer.state.clone(), review.score as f64));
        }
    }
    // Orders without reviews contribute nothing here, so a state with no
    // reviews at all ends up absent rather than averaging to zero.
    let avg_scores = group_avg(
        &state_scores,
        |(state, _)| state.clone(),
        |(_, score)| Some(*score),
    );

    struct StateStats {
        state: String,
        customers: usize,
        orders: usize,
        revenue: f64,
        avg_review_score: Option<f64>,
    }
    let stats: Vec<StateStats> = per_state
        .into_iter()
        .map(|(state, acc)| StateStats {
            avg_review_score: avg_scores.get(&state).copied(),
            state,
            customers: acc.customers.len(),
            orders: acc.orders,
            revenue: acc.revenue,
        })
        .collect();

    let revenue_quartiles: HashMap<&str, usize> = quantile_bucket(
        &stats,
        |s| s.revenue,
        |s| s.state.clone(),
        SortDirection::Descending,
        4,
    )
    .into_iter()
    .map(|(s, q)| (s.state.as_str(), q))
    .collect();
    let customer_quartiles: HashMap<&str, usize> = quantile_bucket(
        &stats,
        |s| s.customers as f64,
        |s| s.state.clone(),
        SortDirection::Descending,
        4,
    )
    .into_iter()
    .map(|(s, q)| (s.state.as_str(), q))
    .collect();

    let mut rows = Vec::new();
    let mut omitted_states = 0;
    for stat in &stats {
        let revenue_quartile = revenue_quartiles
            .get(stat.state.as_str())
            .copied()
            .unwrap_or(4);
        if revenue_quartile > 2 {
            omitted_states += 1;
            continue;
        }
        let customer_quartile = customer_quartiles
            .get(stat.state.as_str())
            .copied()
            .unwrap_or(4);
        let avg_order_value = stat.revenue / stat.orders as f64;
        rows.push(MarketRow {
            state: stat.state.clone(),
            customers: stat.customers,
            orders: stat.orders,
            revenue: stat.revenue,
            avg_order_value,
            avg_review_score: stat.avg_review_score,
            revenue_quartile,
            customer_quartile,
            classification: classify_market(revenue_quartile, customer_quartile, avg_order_value),
            potential_revenue: stat.revenue * config.expansion_multiplier,
        });
    }
    rows.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.state.cmp(&b.state))
    });

    MarketResult {
        rows,
        omitted_states,
    }
}
