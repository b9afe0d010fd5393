use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::RangeInclusive;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CompanySummary, Metric, MonthlySummary, Period, Role, WeeklyDataPoint};
use crate::store::ScorecardStore;

#[derive(Debug, Default)]
struct State {
    roles: HashMap<Uuid, Role>,
    metrics: HashMap<Uuid, Metric>,
    weekly: HashMap<(Uuid, u32, i32), f64>,
    monthly: HashMap<(Uuid, u32, i32), MonthlySummary>,
    company: HashMap<(Uuid, u32, i32), CompanySummary>,
    failing_metrics: HashSet<Uuid>,
}

/// In-process store for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write touching `metric_id` fail.
    pub async fn fail_writes_for(&self, metric_id: Uuid) {
        self.state.write().await.failing_metrics.insert(metric_id);
    }

    pub async fn weekly_value(&self, metric_id: Uuid, week_number: u32, year: i32) -> Option<f64> {
        self.state
            .read()
            .await
            .weekly
            .get(&(metric_id, week_number, year))
            .copied()
    }

    pub async fn metric(&self, metric_id: Uuid) -> Option<Metric> {
        self.state.read().await.metrics.get(&metric_id).cloned()
    }

    pub async fn summary_count(&self) -> usize {
        self.state.read().await.monthly.len()
    }
}

#[async_trait]
impl ScorecardStore for MemoryStore {
    async fn get_roles(&self, owner_id: Uuid) -> anyhow::Result<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .filter(|role| role.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_role(&self, role: &Role) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        if state
            .roles
            .values()
            .any(|existing| existing.owner_id == role.owner_id && existing.name == role.name)
        {
            bail!("role {} already exists for owner {}", role.name, role.owner_id);
        }
        state.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn get_metrics(&self, role_ids: &[Uuid]) -> anyhow::Result<Vec<Metric>> {
        let state = self.state.read().await;
        Ok(state
            .metrics
            .values()
            .filter(|metric| role_ids.contains(&metric.role_id))
            .cloned()
            .collect())
    }

    async fn insert_metrics(&self, metrics: &[Metric]) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        for metric in metrics {
            if !state.roles.contains_key(&metric.role_id) {
                bail!("role {} does not exist", metric.role_id);
            }
            state
                .metrics
                .entry(metric.id)
                .or_insert_with(|| metric.clone());
        }
        Ok(())
    }

    async fn get_weekly_data(
        &self,
        metric_ids: &[Uuid],
        year: i32,
        weeks: RangeInclusive<u32>,
    ) -> anyhow::Result<Vec<WeeklyDataPoint>> {
        let state = self.state.read().await;
        Ok(state
            .weekly
            .iter()
            .filter(|((metric_id, week_number, point_year), _)| {
                *point_year == year && weeks.contains(week_number) && metric_ids.contains(metric_id)
            })
            .map(|((metric_id, week_number, point_year), value)| WeeklyDataPoint {
                metric_id: *metric_id,
                week_number: *week_number,
                year: *point_year,
                actual_value: *value,
            })
            .collect())
    }

    async fn upsert_weekly_data(&self, point: &WeeklyDataPoint) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        if state.failing_metrics.contains(&point.metric_id) {
            bail!("simulated write failure for metric {}", point.metric_id);
        }
        if !state.metrics.contains_key(&point.metric_id) {
            bail!("metric {} does not exist", point.metric_id);
        }
        state.weekly.insert(
            (point.metric_id, point.week_number, point.year),
            point.actual_value,
        );
        Ok(())
    }

    async fn upsert_metric_goal(&self, metric_id: Uuid, goal: f64) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        if state.failing_metrics.contains(&metric_id) {
            bail!("simulated write failure for metric {metric_id}");
        }
        let metric = state
            .metrics
            .get_mut(&metric_id)
            .ok_or_else(|| anyhow!("metric {metric_id} does not exist"))?;
        metric.goal_value = goal;
        Ok(())
    }

    async fn get_monthly_summaries(
        &self,
        role_ids: &[Uuid],
        month: u32,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlySummary>> {
        let state = self.state.read().await;
        Ok(role_ids
            .iter()
            .filter_map(|role_id| state.monthly.get(&(*role_id, month, year)).cloned())
            .collect())
    }

    async fn summary_months(
        &self,
        owner_id: Uuid,
        role_ids: &[Uuid],
    ) -> anyhow::Result<Vec<(u32, i32)>> {
        let state = self.state.read().await;
        let months: BTreeSet<(u32, i32)> = state
            .monthly
            .keys()
            .filter(|(role_id, _, _)| role_ids.contains(role_id))
            .map(|(_, month, year)| (*month, *year))
            .chain(
                state
                    .company
                    .keys()
                    .filter(|(owner, _, _)| *owner == owner_id)
                    .map(|(_, month, year)| (*month, *year)),
            )
            .collect();
        Ok(months.into_iter().collect())
    }

    async fn replace_monthly_summary(&self, summary: &MonthlySummary) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        state.monthly.insert(
            (summary.role_id, summary.month, summary.year),
            summary.clone(),
        );
        Ok(())
    }

    async fn get_company_summary(
        &self,
        owner_id: Uuid,
        month: u32,
        year: i32,
    ) -> anyhow::Result<Option<CompanySummary>> {
        let state = self.state.read().await;
        Ok(state.company.get(&(owner_id, month, year)).cloned())
    }

    async fn upsert_company_summary(&self, summary: &CompanySummary) -> anyhow::Result<()> {
        let Period::Month(month) = summary.period else {
            bail!("only month company summaries are stored, got {}", summary.period);
        };
        let mut state = self.state.write().await;
        state
            .company
            .insert((summary.owner_id, month, summary.year), summary.clone());
        Ok(())
    }
}
