//! Analysis configuration with policy parameters and their defaults

use crate::error::AnalysisError;
use crate::month::Month;
use chrono::NaiveDate;
use std::env;

/// Parameters for a single analysis run.
///
/// The as-of date anchors every recency and churn calculation so that two runs
/// over the same snapshot produce identical output. All other fields are policy
/// knobs with defaults; none of them is read from a wall clock.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Reference date for recency and churn, supplied by the caller.
    pub as_of: NaiveDate,

    /// Cumulative revenue share defining the Pareto cut-off set.
    pub pareto_threshold: f64,

    /// Price-increase multiplier for projected pricing uplift.
    pub price_increase_pct: f64,

    /// Share of segment value used as the retention potential-impact figure.
    pub retention_multiplier: f64,

    /// Share of at-risk value used as the churn potential-loss figure.
    pub churn_loss_multiplier: f64,

    /// First cohort month reported; earlier cohorts are omitted and counted.
    pub cohort_start_month: Month,

    /// Minimum distinct delivered orders for a product to enter pricing analysis.
    pub min_orders_for_pricing: usize,

    /// Minimum qualifying products for a category to be reported.
    pub min_category_sample_size: usize,

    /// Multiplier applied to current state revenue as expansion potential.
    pub expansion_multiplier: f64,
}

impl AnalysisConfig {
    /// Configuration with default policy parameters for the given as-of date.
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            pareto_threshold: 0.80,
            price_increase_pct: 0.15,
            retention_multiplier: 0.10,
            churn_loss_multiplier: 0.30,
            cohort_start_month: Month::new(2017, 1),
            min_orders_for_pricing: 10,
            min_category_sample_size: 3,
            expansion_multiplier: 1.0,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ORDERLENS_AS_OF` (required, `YYYY-MM-DD`)
    /// - `ORDERLENS_PARETO_THRESHOLD` (default: 0.80)
    /// - `ORDERLENS_PRICE_INCREASE_PCT` (default: 0.15)
    /// - `ORDERLENS_RETENTION_MULTIPLIER` (default: 0.10)
    /// - `ORDERLENS_CHURN_LOSS_MULTIPLIER` (default: 0.30)
    /// - `ORDERLENS_COHORT_START_MONTH` (default: 2017-01, `YYYY-MM`)
    /// - `ORDERLENS_MIN_ORDERS_FOR_PRICING` (default: 10)
    /// - `ORDERLENS_MIN_CATEGORY_SAMPLE` (default: 3)
    /// - `ORDERLENS_EXPANSION_MULTIPLIER` (default: 1.0)
    pub fn from_env() -> Result<Self, AnalysisError> {
        let as_of_raw = env::var("ORDERLENS_AS_OF")
            .map_err(|_| AnalysisError::config("ORDERLENS_AS_OF", "must be set (YYYY-MM-DD)"))?;
        let as_of = NaiveDate::parse_from_str(&as_of_raw, "%Y-%m-%d")
            .map_err(|_| AnalysisError::config("ORDERLENS_AS_OF", "expected YYYY-MM-DD"))?;

        let mut config = Self::new(as_of);

        if let Some(v) = parse_env("ORDERLENS_PARETO_THRESHOLD")? {
            config.pareto_threshold = v;
        }
        if let Some(v) = parse_env("ORDERLENS_PRICE_INCREASE_PCT")? {
            config.price_increase_pct = v;
        }
        if let Some(v) = parse_env("ORDERLENS_RETENTION_MULTIPLIER")? {
            config.retention_multiplier = v;
        }
        if let Some(v) = parse_env("ORDERLENS_CHURN_LOSS_MULTIPLIER")? {
            config.churn_loss_multiplier = v;
        }
        if let Some(v) = parse_env("ORDERLENS_EXPANSION_MULTIPLIER")? {
            config.expansion_multiplier = v;
        }
        if let Some(v) = parse_env("ORDERLENS_MIN_ORDERS_FOR_PRICING")? {
            config.min_orders_for_pricing = v;
        }
        if let Some(v) = parse_env("ORDERLENS_MIN_CATEGORY_SAMPLE")? {
            config.min_category_sample_size = v;
        }
        if let Ok(raw) = env::var("ORDERLENS_COHORT_START_MONTH") {
            config.cohort_start_month = Month::parse(&raw).ok_or_else(|| {
                AnalysisError::config("ORDERLENS_COHORT_START_MONTH", "expected YYYY-MM")
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range parameters before any computation starts.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.pareto_threshold.is_finite()
            || self.pareto_threshold <= 0.0
            || self.pareto_threshold > 1.0
        {
            return Err(AnalysisError::config(
                "pareto_threshold",
                "must be in (0, 1]",
            ));
        }
        for (name, value) in [
            ("price_increase_pct", self.price_increase_pct),
            ("retention_multiplier", self.retention_multiplier),
            ("churn_loss_multiplier", self.churn_loss_multiplier),
            ("expansion_multiplier", self.expansion_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::config(name, "must be a non-negative number"));
            }
        }
        if self.min_orders_for_pricing == 0 {
            return Err(AnalysisError::config(
                "min_orders_for_pricing",
                "must be at least 1",
            ));
        }
        if self.min_category_sample_size == 0 {
            return Err(AnalysisError::config(
                "min_category_sample_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, AnalysisError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AnalysisError::config(name, "unparseable value")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 9, 1).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::new(as_of());

        assert_eq!(config.pareto_threshold, 0.80);
        assert_eq!(config.price_increase_pct, 0.15);
        assert_eq!(config.retention_multiplier, 0.10);
        assert_eq!(config.churn_loss_multiplier, 0.30);
        assert_eq!(config.cohort_start_month, Month::new(2017, 1));
        assert_eq!(config.min_orders_for_pricing, 10);
        assert_eq!(config.min_category_sample_size, 3);
        assert_eq!(config.expansion_multiplier, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut config = AnalysisConfig::new(as_of());
        config.pareto_threshold = 0.0;
        assert!(config.validate().is_err());

        config.pareto_threshold = 1.5;
        assert!(config.validate().is_err());

        config.pareto_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_multiplier() {
        let mut config = AnalysisConfig::new(as_of());
        config.retention_multiplier = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_sample_floors() {
        let mut config = AnalysisConfig::new(as_of());
        config.min_orders_for_pricing = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new(as_of());
        config.min_category_sample_size = 0;
        assert!(config.validate().is_err());
    }
}
