//! Analysis engines over the shared fact model
//!
//! Each engine consumes the read-only `FactModel` plus kernel primitives and
//! produces an independent result set; none depends on another.
//!
//! ```text
//! FactModel (indexed snapshot)
//!     ├── segmentation: RFM scores, LTV tiers, churn bands
//!     ├── trends: monthly revenue trend, cohort retention
//!     └── opportunity: Pareto cut-off, pricing, market expansion
//!             ↓
//! Report assembler (ordered rows, omission tallies)
//! ```

pub mod opportunity;
pub mod segmentation;
pub mod trends;

pub use opportunity::{
    market_expansion, pareto_cutoff, pricing_opportunities, MarketClass, MarketResult, MarketRow,
    ParetoSummary, PricingOpportunityRow, PricingResult,
};
pub use segmentation::{
    classify_churn, classify_ltv, classify_rfm, segment_customers, ChurnBand, CustomerSegments,
    LtvTier, RfmSegment, SegmentRollup, SegmentationResult,
};
pub use trends::{
    cohort_retention, monthly_revenue_trend, CohortResult, CohortRow, MonthlyTrendRow,
};
