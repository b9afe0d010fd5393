//! Performance scorecard engine for advisory practices.
//!
//! Raw per-metric weekly entries are aggregated into month, quarter and
//! year scorecards per role, graded against goals, and rolled up into a
//! company summary.

pub mod aggregate;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod grading;
pub mod import;
pub mod models;
pub mod period;
pub mod report;
pub mod seed;
pub mod store;

pub use engine::{Caller, GoalUpdate, NewMetric, ScorecardEngine};
pub use error::{BatchReport, OperationResult, ScorecardError};
pub use models::{Grade, MetricType, Period, PeriodType, Scorecard};
pub use store::{MemoryStore, PostgresStore, ScorecardStore};
