//! Customer segmentation - RFM scoring, lifetime-value tiers, churn-risk bands
//!
//! Every classification is per person and derived from delivered orders only,
//! measured against the run's as-of date. Each scheme assigns exactly one tag
//! per person; the decision tables evaluate top to bottom, first match wins.

use crate::config::AnalysisConfig;
use crate::facts::{CustomerActivity, FactModel};
use crate::kernel::{quantile_bucket, SortDirection};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RfmSegment {
    Champions,
    Loyal,
    #[serde(rename = "Potential Loyalist")]
    PotentialLoyalist,
    #[serde(rename = "At Risk")]
    AtRisk,
    Lost,
    Others,
}

impl RfmSegment {
    /// Decision-table order; rollups report in this order.
    pub fn all() -> [RfmSegment; 6] {
        [
            RfmSegment::Champions,
            RfmSegment::Loyal,
            RfmSegment::PotentialLoyalist,
            RfmSegment::AtRisk,
            RfmSegment::Lost,
            RfmSegment::Others,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            RfmSegment::Champions => "Champions",
            RfmSegment::Loyal => "Loyal",
            RfmSegment::PotentialLoyalist => "Potential Loyalist",
            RfmSegment::AtRisk => "At Risk",
            RfmSegment::Lost => "Lost",
            RfmSegment::Others => "Others",
        }
    }
}

/// Segment from the (recency, frequency) score pair, first match wins.
pub fn classify_rfm(recency_score: usize, frequency_score: usize) -> RfmSegment {
    let (r, f) = (recency_score, frequency_score);
    if r >= 4 && f >= 4 {
        RfmSegment::Champions
    } else if r >= 3 && f >= 3 {
        RfmSegment::Loyal
    } else if r >= 3 && f <= 2 {
        RfmSegment::PotentialLoyalist
    } else if r <= 2 && f >= 4 {
        RfmSegment::AtRisk
    } else if r <= 2 && f <= 2 {
        RfmSegment::Lost
    } else {
        RfmSegment::Others
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LtvTier {
    #[serde(rename = "VIP")]
    Vip,
    #[serde(rename = "High Value")]
    HighValue,
    Repeat,
    #[serde(rename = "One-time")]
    OneTime,
}

impl LtvTier {
    pub fn all() -> [LtvTier; 4] {
        [
            LtvTier::Vip,
            LtvTier::HighValue,
            LtvTier::Repeat,
            LtvTier::OneTime,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            LtvTier::Vip => "VIP",
            LtvTier::HighValue => "High Value",
            LtvTier::Repeat => "Repeat",
            LtvTier::OneTime => "One-time",
        }
    }
}

/// Lifetime-value tier from absolute order count and monetary value,
/// first match wins.
pub fn classify_ltv(order_count: usize, monetary: f64) -> LtvTier {
    if order_count >= 5 && monetary >= 1000.0 {
        LtvTier::Vip
    } else if order_count >= 3 && monetary >= 500.0 {
        LtvTier::HighValue
    } else if order_count >= 2 {
        LtvTier::Repeat
    } else {
        LtvTier::OneTime
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChurnBand {
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Medium Risk")]
    MediumRisk,
    #[serde(rename = "Low Risk")]
    LowRisk,
    Active,
}

impl ChurnBand {
    pub fn all() -> [ChurnBand; 4] {
        [
            ChurnBand::HighRisk,
            ChurnBand::MediumRisk,
            ChurnBand::LowRisk,
            ChurnBand::Active,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChurnBand::HighRisk => "High Risk",
            ChurnBand::MediumRisk => "Medium Risk",
            ChurnBand::LowRisk => "Low Risk",
            ChurnBand::Active => "Active",
        }
    }
}

/// Churn band from days since the last delivered purchase. Customers with no
/// delivered order have no last-purchase date and are never banded.
pub fn classify_churn(days_inactive: i64) -> ChurnBand {
    if days_inactive > 180 {
        ChurnBand::HighRisk
    } else if days_inactive > 90 {
        ChurnBand::MediumRisk
    } else if days_inactive > 60 {
        ChurnBand::LowRisk
    } else {
        ChurnBand::Active
    }
}

/// Per-person segment assignment across all three schemes.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSegments {
    pub person_id: String,
    pub recency_days: i64,
    pub frequency: usize,
    pub monetary: f64,
    pub recency_score: usize,
    pub frequency_score: usize,
    pub monetary_score: usize,
    pub rfm_segment: RfmSegment,
    pub ltv_tier: LtvTier,
    pub churn_band: ChurnBand,
}

/// Aggregate view of one segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentRollup {
    pub segment: &'static str,
    pub customers: usize,
    pub total_value: f64,
    pub avg_value: f64,
    pub avg_orders: f64,
    pub avg_days_inactive: f64,
    /// Linear policy estimate: multiplier x total segment value. Not a forecast.
    pub potential_impact: f64,
}

#[derive(Debug, Serialize)]
pub struct SegmentationResult {
    pub customers: Vec<CustomerSegments>,
    pub rfm_rollups: Vec<SegmentRollup>,
    pub ltv_rollups: Vec<SegmentRollup>,
    pub churn_rollups: Vec<SegmentRollup>,
    /// Persons with zero delivered orders, reported outside the risk bands.
    pub never_purchased: usize,
}

/// Score and segment every person with at least one delivered order.
pub fn segment_customers(model: &FactModel, config: &AnalysisConfig) -> SegmentationResult {
    let activities = model.customer_activity();

    let recency_days = |activity: &CustomerActivity| -> i64 {
        (config.as_of - activity.last_purchase.date()).num_days()
    };

    // Bucket 5 must mean "good" on every dimension: recency sorts descending
    // (most recent lands in the last bucket), frequency and monetary ascending.
    let recency_scores = score_map(quantile_bucket(
        activities,
        |a| recency_days(a) as f64,
        |a| a.person_id.clone(),
        SortDirection::Descending,
        5,
    ));
    let frequency_scores = score_map(quantile_bucket(
        activities,
        |a| a.order_count as f64,
        |a| a.person_id.clone(),
        SortDirection::Ascending,
        5,
    ));
    let monetary_scores = score_map(quantile_bucket(
        activities,
        |a| a.monetary,
        |a| a.person_id.clone(),
        SortDirection::Ascending,
        5,
    ));

    let mut customers = Vec::with_capacity(activities.len());
    for activity in activities {
        let person = activity.person_id.as_str();
        let recency_score = recency_scores.get(person).copied().unwrap_or(1);
        let frequency_score = frequency_scores.get(person).copied().unwrap_or(1);
        let monetary_score = monetary_scores.get(person).copied().unwrap_or(1);
        let days_inactive = recency_days(activity);

        customers.push(CustomerSegments {
            person_id: activity.person_id.clone(),
            recency_days: days_inactive,
            frequency: activity.order_count,
            monetary: activity.monetary,
            recency_score,
            frequency_score,
            monetary_score,
            rfm_segment: classify_rfm(recency_score, frequency_score),
            ltv_tier: classify_ltv(activity.order_count, activity.monetary),
            churn_band: classify_churn(days_inactive),
        });
    }

    let rfm_rollups = RfmSegment::all()
        .into_iter()
        .filter_map(|segment| {
            rollup(
                customers.iter().filter(|c| c.rfm_segment == segment),
                segment.label(),
                config.retention_multiplier,
            )
        })
        .collect();
    let ltv_rollups = LtvTier::all()
        .into_iter()
        .filter_map(|tier| {
            rollup(
                customers.iter().filter(|c| c.ltv_tier == tier),
                tier.label(),
                config.retention_multiplier,
            )
        })
        .collect();
    let churn_rollups = ChurnBand::all()
        .into_iter()
        .filter_map(|band| {
            rollup(
                customers.iter().filter(|c| c.churn_band == band),
                band.label(),
                config.churn_loss_multiplier,
            )
        })
        .collect();

    log::info!(
        "segmented {} customers ({} never purchased)",
        customers.len(),
        model.never_purchased()
    );

    SegmentationResult {
        customers,
        rfm_rollups,
        ltv_rollups,
        churn_rollups,
        never_purchased: model.never_purchased(),
    }
}

fn score_map(assigned: Vec<(&CustomerActivity, usize)>) -> HashMap<&str, usize> {
    assigned
        .into_iter()
        .map(|(activity, bucket)| (activity.person_id.as_str(), bucket))
        .collect()
}

/// Roll one segment up; empty segments yield nothing rather than zero rows.
fn rollup<'a>(
    rows: impl Iterator<Item = &'a CustomerSegments>,
    label: &'static str,
    impact_multiplier: f64,
) -> Option<SegmentRollup> {
    let mut customers = 0;
    let mut total_value = 0.0;
    let mut total_orders = 0;
    let mut total_days = 0i64;
    for row in rows {
        customers += 1;
        total_value += row.monetary;
        total_orders += row.frequency;
        total_days += row.recency_days;
    }
    if customers == 0 {
        return None;
    }

    Some(SegmentRollup {
        segment: label,
        customers,
        total_value,
        avg_value: total_value / customers as f64,
        avg_orders: total_orders as f64 / customers as f64,
        avg_days_inactive: total_days as f64 / customers as f64,
        potential_impact: impact_multiplier * total_value,
    })
}
