//! Persistence port used by the scorecard engine.
//!
//! Reads are batched by role and metric ids so a scorecard costs a fixed
//! number of round trips regardless of staff size.

use std::ops::RangeInclusive;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CompanySummary, Metric, MonthlySummary, Role, WeeklyDataPoint};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait ScorecardStore: Send + Sync {
    async fn get_roles(&self, owner_id: Uuid) -> anyhow::Result<Vec<Role>>;

    async fn create_role(&self, role: &Role) -> anyhow::Result<()>;

    async fn get_metrics(&self, role_ids: &[Uuid]) -> anyhow::Result<Vec<Metric>>;

    /// Inserts metrics, leaving existing rows with the same id untouched.
    async fn insert_metrics(&self, metrics: &[Metric]) -> anyhow::Result<()>;

    async fn get_weekly_data(
        &self,
        metric_ids: &[Uuid],
        year: i32,
        weeks: RangeInclusive<u32>,
    ) -> anyhow::Result<Vec<WeeklyDataPoint>>;

    /// Last writer wins on (metric, week, year).
    async fn upsert_weekly_data(&self, point: &WeeklyDataPoint) -> anyhow::Result<()>;

    async fn upsert_metric_goal(&self, metric_id: Uuid, goal: f64) -> anyhow::Result<()>;

    async fn get_monthly_summaries(
        &self,
        role_ids: &[Uuid],
        month: u32,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlySummary>>;

    async fn get_monthly_summary(
        &self,
        role_id: Uuid,
        month: u32,
        year: i32,
    ) -> anyhow::Result<Option<MonthlySummary>> {
        Ok(self
            .get_monthly_summaries(&[role_id], month, year)
            .await?
            .into_iter()
            .next())
    }

    /// Every (month, year) with a stored month summary for one of `role_ids`
    /// or a stored company summary for `owner_id`.
    async fn summary_months(
        &self,
        owner_id: Uuid,
        role_ids: &[Uuid],
    ) -> anyhow::Result<Vec<(u32, i32)>>;

    /// Replaces the summary and all of its score rows as one unit.
    async fn replace_monthly_summary(&self, summary: &MonthlySummary) -> anyhow::Result<()>;

    async fn get_company_summary(
        &self,
        owner_id: Uuid,
        month: u32,
        year: i32,
    ) -> anyhow::Result<Option<CompanySummary>>;

    /// Only month-level company summaries are stored.
    async fn upsert_company_summary(&self, summary: &CompanySummary) -> anyhow::Result<()>;
}
