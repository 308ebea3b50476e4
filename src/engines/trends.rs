//! Monthly revenue trend and cohort retention
//!
//! Both analyses group delivered-order revenue by calendar month of purchase.
//! Months with no delivered orders are omitted, never emitted as zeros, and
//! growth against a zero or absent month is reported as absent.

use crate::config::AnalysisConfig;
use crate::facts::FactModel;
use crate::kernel::{group_sum, lag, moving_average};
use crate::month::Month;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One month of the revenue trend.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrendRow {
    pub month: Month,
    pub revenue: f64,
    pub orders: usize,
    /// Month-over-month growth, absent when the previous month is zero or absent.
    pub growth_pct: Option<f64>,
    /// Trailing 3-month moving average of revenue.
    pub trailing_avg_3m: f64,
}

/// Delivered-order revenue by purchase month, oldest first.
pub fn monthly_revenue_trend(model: &FactModel) -> Vec<MonthlyTrendRow> {
    let delivered: Vec<_> = model.delivered_orders().collect();

    let revenue_by_month = group_sum(
        &delivered,
        |order| Month::from_datetime(order.purchased_at),
        |order| Some(model.order_revenue(&order.id)),
    );
    let mut orders_by_month: HashMap<Month, usize> = HashMap::new();
    for order in &delivered {
        *orders_by_month
            .entry(Month::from_datetime(order.purchased_at))
            .or_insert(0) += 1;
    }

    let mut months: Vec<(Month, f64)> = revenue_by_month.into_iter().collect();
    months.sort_by_key(|(month, _)| *month);

    let previous = lag(&months, |(month, _)| *month, |(_, revenue)| *revenue);
    let revenues: Vec<f64> = months.iter().map(|(_, revenue)| *revenue).collect();
    let trailing = moving_average(&revenues, 3);

    previous
        .into_iter()
        .zip(trailing)
        .map(|((&(month, revenue), prev), trailing_avg_3m)| MonthlyTrendRow {
            month,
            revenue,
            orders: orders_by_month.get(&month).copied().unwrap_or(0),
            growth_pct: match prev {
                Some(p) if p != 0.0 => Some((revenue - p) / p * 100.0),
                _ => None,
            },
            trailing_avg_3m,
        })
        .collect()
}

/// Retention matrix row for one cohort. Offsets are months after the cohort
/// month; `active[0]` equals `size` because a person's first delivered order
/// falls in their cohort month by construction.
#[derive(Debug, Clone, Serialize)]
pub struct CohortRow {
    pub cohort: Month,
    pub size: usize,
    /// Distinct persons with a delivered order at cohort month + k, k = 0..=3.
    pub active: [usize; 4],
    /// active[k] / size as a percentage; absent for an empty cohort.
    pub retention_pct: [Option<f64>; 4],
}

#[derive(Debug, Serialize)]
pub struct CohortResult {
    pub rows: Vec<CohortRow>,
    /// Cohorts before the configured start month, omitted from `rows`.
    pub omitted_cohorts: usize,
}

/// Group persons into first-delivered-month cohorts and count activity at
/// offsets 0..=3. Cohorts before `cohort_start_month` are omitted and counted.
pub fn cohort_retention(model: &FactModel, config: &AnalysisConfig) -> CohortResult {
    // Person -> (cohort month, months with at least one delivered order)
    let mut per_person: HashMap<&str, (Month, BTreeSet<Month>)> = HashMap::new();
    for order in model.delivered_orders() {
        let Some(customer) = model.customer_of_order(&order.id) else {
            continue;
        };
        let month = Month::from_datetime(order.purchased_at);
        let entry = per_person
            .entry(customer.unique_id.as_str())
            .or_insert_with(|| (month, BTreeSet::new()));
        entry.0 = entry.0.min(month);
        entry.1.insert(month);
    }

    let mut cohorts: BTreeMap<Month, Vec<&BTreeSet<Month>>> = BTreeMap::new();
    for (cohort, months) in per_person.values() {
        cohorts.entry(*cohort).or_default().push(months);
    }

    let mut rows = Vec::new();
    let mut omitted_cohorts = 0;
    for (cohort, members) in cohorts {
        if cohort < config.cohort_start_month {
            omitted_cohorts += 1;
            continue;
        }
        let size = members.len();
        let mut active = [0usize; 4];
        for (k, slot) in active.iter_mut().enumerate() {
            let target = cohort.offset(k as u32);
            *slot = members.iter().filter(|m| m.contains(&target)).count();
        }
        let retention_pct = active.map(|count| {
            if size > 0 {
                Some(count as f64 / size as f64 * 100.0)
            } else {
                None
            }
        });
        rows.push(CohortRow {
            cohort,
            size,
            active,
            retention_pct,
        });
    }

    log::info!(
        "cohort retention: {} cohorts reported, {} before start month",
        rows.len(),
        omitted_cohorts
    );

    CohortResult {
        rows,
        omitted_cohorts,
    }
}
