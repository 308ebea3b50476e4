//! orderlens - descriptive business analytics over an e-commerce snapshot
//!
//! Computes revenue concentration, customer segmentation, churn-risk bands,
//! cohort retention, pricing opportunities and market-expansion scores from a
//! closed, already-materialized set of orders, customers, products, payments
//! and reviews. Every run is a deterministic batch over an immutable snapshot:
//! the caller supplies the as-of date, and identical input plus identical
//! configuration always produces identical output.
//!
//! # Architecture
//!
//! ```text
//! FactSnapshot (validated records from the external loader)
//!     ↓
//! FactModel::build (indexes + referential integrity checks)
//!     ↓
//! kernel (group/rank/quantile/lag/moving-average primitives)
//!     ↓
//! engines: segmentation | trends | opportunity
//!     ↓
//! report::run_analysis → AnalysisReport (serde-serializable bundle)
//! ```
//!
//! Storage, ingestion and presentation are external collaborators; this crate
//! neither reads files nor writes results anywhere.

pub mod config;
pub mod engines;
pub mod error;
pub mod facts;
pub mod kernel;
pub mod month;
pub mod report;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use facts::{FactModel, FactSnapshot};
pub use month::Month;
pub use report::{run_analysis, AnalysisReport};
