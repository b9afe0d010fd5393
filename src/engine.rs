//! Scorecard engine: loads the catalog and raw weekly data through an
//! injected [`ScorecardStore`], grades every metric for the requested period
//! and assembles role and company views.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate;
use crate::catalog::{self, RoleCatalog};
use crate::compose;
use crate::error::{BatchItemError, BatchReport, ErrorBody, Result, ScorecardError};
use crate::models::{
    CompanySummary, Metric, MetricScore, MetricType, MonthlySummary, Period, Role, Scorecard,
    WeeklyDataPoint,
};
use crate::period::{self, WeekIndex};
use crate::store::ScorecardStore;

/// Identity of whoever is asking; every operation is scoped to its owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct Caller {
    pub owner_id: Option<Uuid>,
}

impl Caller {
    pub fn owner(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }

    pub fn anonymous() -> Self {
        Self { owner_id: None }
    }

    fn require(&self) -> Result<Uuid> {
        self.owner_id.ok_or(ScorecardError::NotAuthenticated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub metric_id: Uuid,
    pub goal_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMetric {
    pub name: String,
    pub metric_type: MetricType,
    pub goal_value: f64,
    #[serde(default)]
    pub is_inverted: bool,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

/// A role's scored metrics, completed with any core behaviors the store lacks.
struct RoleView {
    role: Role,
    metrics: Vec<Metric>,
    /// All core behavior metrics exist in the store.
    synced: bool,
}

pub struct ScorecardEngine<S> {
    store: S,
}

impl<S: ScorecardStore> ScorecardEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Roles in name order with their stored metrics in display order.
    pub async fn catalog(&self, caller: &Caller) -> Result<Vec<RoleCatalog>> {
        let owner_id = caller.require()?;
        self.load_catalog(owner_id).await
    }

    async fn load_catalog(&self, owner_id: Uuid) -> Result<Vec<RoleCatalog>> {
        let mut roles = self.store.get_roles(owner_id).await?;
        catalog::sort_roles(&mut roles);

        let role_ids: Vec<Uuid> = roles.iter().map(|role| role.id).collect();
        let metrics = if role_ids.is_empty() {
            Vec::new()
        } else {
            self.store.get_metrics(&role_ids).await?
        };

        let mut by_role: HashMap<Uuid, Vec<Metric>> = HashMap::new();
        for metric in metrics {
            by_role.entry(metric.role_id).or_default().push(metric);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let mut metrics = by_role.remove(&role.id).unwrap_or_default();
                catalog::sort_metrics(&mut metrics);
                RoleCatalog { role, metrics }
            })
            .collect())
    }

    async fn owned_role(&self, owner_id: Uuid, role_id: Uuid) -> Result<RoleCatalog> {
        self.load_catalog(owner_id)
            .await?
            .into_iter()
            .find(|entry| entry.role.id == role_id)
            .ok_or_else(|| ScorecardError::NotFound(format!("role {role_id}")))
    }

    /// Adds any missing core behavior metrics to one role. Returns how many were added.
    pub async fn ensure_catalog(&self, caller: &Caller, role_id: Uuid) -> Result<usize> {
        let owner_id = caller.require()?;
        let entry = self.owned_role(owner_id, role_id).await?;
        self.ensure_role(&entry).await
    }

    pub async fn ensure_all_catalogs(&self, caller: &Caller) -> Result<usize> {
        let owner_id = caller.require()?;
        let mut added = 0;
        for entry in self.load_catalog(owner_id).await? {
            added += self.ensure_role(&entry).await?;
        }
        Ok(added)
    }

    async fn ensure_role(&self, entry: &RoleCatalog) -> Result<usize> {
        let missing = catalog::missing_core_metrics(&entry.role, &entry.metrics);
        if missing.is_empty() {
            return Ok(0);
        }
        self.store.insert_metrics(&missing).await?;
        info!(
            role = %entry.role.name,
            added = missing.len(),
            "core behavior metrics added"
        );
        Ok(missing.len())
    }

    pub async fn create_role(&self, caller: &Caller, name: &str) -> Result<RoleCatalog> {
        let owner_id = caller.require()?;
        let name = catalog::validate_name("role", name)?;

        let existing = self.store.get_roles(owner_id).await?;
        if existing.iter().any(|role| role.name == name) {
            return Err(ScorecardError::Validation(format!(
                "a role named {name:?} already exists"
            )));
        }

        let role = Role {
            id: Uuid::new_v4(),
            owner_id,
            name,
        };
        self.store.create_role(&role).await?;

        let entry = RoleCatalog {
            role,
            metrics: Vec::new(),
        };
        self.ensure_role(&entry).await?;
        self.owned_role(owner_id, entry.role.id).await
    }

    pub async fn add_metric(
        &self,
        caller: &Caller,
        role_id: Uuid,
        new_metric: NewMetric,
    ) -> Result<Metric> {
        let owner_id = caller.require()?;
        let name = catalog::validate_name("metric", &new_metric.name)?;
        catalog::validate_goal(new_metric.goal_value)?;

        let entry = self.owned_role(owner_id, role_id).await?;
        if entry.find_metric(&name).is_some() {
            return Err(ScorecardError::Validation(format!(
                "role {} already has a metric named {name:?}",
                entry.role.name
            )));
        }

        let metric = Metric {
            id: Uuid::new_v4(),
            role_id,
            name,
            metric_type: new_metric.metric_type,
            goal_value: new_metric.goal_value,
            is_inverted: new_metric.is_inverted,
            display_order: entry.next_display_order(),
            is_visible: new_metric.is_visible,
        };
        self.store.insert_metrics(std::slice::from_ref(&metric)).await?;
        Ok(metric)
    }

    async fn load_views(&self, owner_id: Uuid) -> Result<Vec<RoleView>> {
        Ok(self
            .load_catalog(owner_id)
            .await?
            .into_iter()
            .map(|entry| {
                let synced = catalog::missing_core_metrics(&entry.role, &entry.metrics).is_empty();
                let completed = catalog::with_core_metrics(&entry.role, entry.metrics);
                RoleView {
                    metrics: catalog::scored_metrics(&completed),
                    role: entry.role,
                    synced,
                }
            })
            .collect())
    }

    /// Scores every view for the period with a single weekly-data fetch.
    async fn score_views(
        &self,
        views: &[RoleView],
        period: Period,
        year: i32,
    ) -> Result<Vec<Vec<MetricScore>>> {
        let metric_ids: Vec<Uuid> = views
            .iter()
            .flat_map(|view| view.metrics.iter().map(|metric| metric.id))
            .collect();

        let points = if metric_ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .get_weekly_data(&metric_ids, year, period::week_range(period))
                .await?
        };
        debug!(
            metrics = metric_ids.len(),
            points = points.len(),
            %period,
            year,
            "weekly data loaded"
        );

        let index = WeekIndex::new(&points);
        Ok(views
            .iter()
            .map(|view| aggregate::score_metrics(&view.metrics, &index, period))
            .collect())
    }

    pub async fn get_scorecard(
        &self,
        caller: &Caller,
        period: Period,
        year: i32,
    ) -> Result<Scorecard> {
        let owner_id = caller.require()?;
        period::validate(period)?;

        let views = self.load_views(owner_id).await?;
        let scores = self.score_views(&views, period, year).await?;

        if let Period::Month(month) = period {
            self.persist_monthly(&views, &scores, month, year).await;
        }

        let role_scorecards: Vec<_> = views
            .iter()
            .zip(scores)
            .map(|(view, metric_scores)| compose::compose_role(&view.role, metric_scores))
            .collect();
        let company_summary = compose::company_summary(owner_id, period, year, &role_scorecards);

        if matches!(period, Period::Month(_)) {
            if let Err(error) = self.store.upsert_company_summary(&company_summary).await {
                warn!(error = %error, %period, year, "failed to store company summary");
            }
        }

        info!(
            roles = role_scorecards.len(),
            %period,
            year,
            company_average = company_summary.company_average,
            "scorecard computed"
        );

        Ok(Scorecard {
            period,
            year,
            role_scorecards,
            company_summary,
        })
    }

    /// Replaces stored month summaries that are missing or out of date.
    /// Returns how many were written.
    async fn persist_monthly(
        &self,
        views: &[RoleView],
        scores: &[Vec<MetricScore>],
        month: u32,
        year: i32,
    ) -> usize {
        let role_ids: Vec<Uuid> = views.iter().map(|view| view.role.id).collect();
        if role_ids.is_empty() {
            return 0;
        }

        let stored: HashMap<Uuid, MonthlySummary> =
            match self.store.get_monthly_summaries(&role_ids, month, year).await {
                Ok(summaries) => summaries
                    .into_iter()
                    .map(|summary| (summary.role_id, summary))
                    .collect(),
                Err(error) => {
                    warn!(
                        error = %error,
                        month,
                        year,
                        "failed to read monthly summaries, skipping persistence"
                    );
                    return 0;
                }
            };

        let computed_at = Utc::now();
        let mut pending = Vec::new();
        for (view, metric_scores) in views.iter().zip(scores) {
            if !view.synced {
                warn!(
                    role = %view.role.name,
                    "core behavior metrics not stored yet, summary not persisted"
                );
                continue;
            }

            let summary = aggregate::monthly_summary(
                view.role.id,
                month,
                year,
                metric_scores.clone(),
                computed_at,
            );
            let unchanged = stored
                .get(&view.role.id)
                .is_some_and(|existing| existing.same_scores(&summary));
            if !unchanged {
                pending.push(summary);
            }
        }

        let results = join_all(
            pending
                .iter()
                .map(|summary| self.store.replace_monthly_summary(summary)),
        )
        .await;

        let mut written = 0;
        for (summary, result) in pending.iter().zip(results) {
            match result {
                Ok(()) => written += 1,
                Err(error) => warn!(
                    error = %error,
                    role_id = %summary.role_id,
                    month,
                    year,
                    "failed to store monthly summary"
                ),
            }
        }
        debug!(written, month, year, "monthly summaries refreshed");
        written
    }

    /// Stored summary for a role-month, or one aggregated on the fly when none exists.
    pub async fn monthly_summary(
        &self,
        caller: &Caller,
        role_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<MonthlySummary> {
        let owner_id = caller.require()?;
        let period = Period::Month(month);
        period::validate(period)?;

        let views: Vec<RoleView> = self
            .load_views(owner_id)
            .await?
            .into_iter()
            .filter(|view| view.role.id == role_id)
            .collect();
        if views.is_empty() {
            return Err(ScorecardError::NotFound(format!("role {role_id}")));
        }

        if let Some(summary) = self.store.get_monthly_summary(role_id, month, year).await? {
            return Ok(summary);
        }

        let mut scores = self.score_views(&views, period, year).await?;
        let metric_scores = scores.pop().unwrap_or_default();
        Ok(aggregate::monthly_summary(
            role_id,
            month,
            year,
            metric_scores,
            Utc::now(),
        ))
    }

    /// Stored company summary for a month, or one aggregated on the fly.
    pub async fn company_summary(
        &self,
        caller: &Caller,
        month: u32,
        year: i32,
    ) -> Result<CompanySummary> {
        let owner_id = caller.require()?;
        let period = Period::Month(month);
        period::validate(period)?;

        if let Some(summary) = self.store.get_company_summary(owner_id, month, year).await? {
            return Ok(summary);
        }

        let views = self.load_views(owner_id).await?;
        let scores = self.score_views(&views, period, year).await?;
        let role_scorecards: Vec<_> = views
            .iter()
            .zip(scores)
            .map(|(view, metric_scores)| compose::compose_role(&view.role, metric_scores))
            .collect();
        Ok(compose::company_summary(owner_id, period, year, &role_scorecards))
    }

    /// Saves weekly values concurrently. Items are validated and checked for
    /// ownership first; failed items are reported while the rest stay saved.
    pub async fn save_weekly_data(
        &self,
        caller: &Caller,
        points: Vec<WeeklyDataPoint>,
    ) -> Result<BatchReport<WeeklyDataPoint>> {
        let owner_id = caller.require()?;
        let catalog = self.load_catalog(owner_id).await?;
        let metric_roles = metric_roles(&catalog);

        let mut errors = Vec::new();
        let mut accepted = Vec::new();
        for (index, point) in points.iter().enumerate() {
            match validate_point(point, &metric_roles) {
                Ok(()) => accepted.push(index),
                Err(error) => errors.push(item_error(index, point.clone(), &error)),
            }
        }

        let results = join_all(
            accepted
                .iter()
                .map(|index| self.store.upsert_weekly_data(&points[*index])),
        )
        .await;

        let mut touched: BTreeSet<(u32, i32)> = BTreeSet::new();
        for (index, result) in accepted.iter().zip(results) {
            let point = &points[*index];
            match result {
                Ok(()) => {
                    touched.insert((period::month_of_week(point.week_number), point.year));
                }
                Err(error) => {
                    let error = ScorecardError::Persistence(error);
                    errors.push(item_error(*index, point.clone(), &error));
                }
            }
        }

        let report = BatchReport::new(points.len(), errors);
        info!(
            attempted = report.attempted,
            failed = report.errors.len(),
            "weekly data saved"
        );

        if !touched.is_empty() {
            self.refresh_months(owner_id, &touched).await;
        }

        Ok(report)
    }

    /// Recomputes the stored month summaries and the month company summary
    /// for every listed month. Roles whose scores did not change are not
    /// rewritten.
    async fn refresh_months(&self, owner_id: Uuid, months: &BTreeSet<(u32, i32)>) {
        let views = match self.load_views(owner_id).await {
            Ok(views) => views,
            Err(error) => {
                warn!(error = %error, "failed to reload catalog for summary refresh");
                return;
            }
        };

        for (month, year) in months {
            let period = Period::Month(*month);
            let scores = match self.score_views(&views, period, *year).await {
                Ok(scores) => scores,
                Err(error) => {
                    warn!(error = %error, month, year, "failed to refresh monthly summaries");
                    continue;
                }
            };
            self.persist_monthly(&views, &scores, *month, *year).await;

            let role_scorecards: Vec<_> = views
                .iter()
                .zip(scores)
                .map(|(view, metric_scores)| compose::compose_role(&view.role, metric_scores))
                .collect();
            let company = compose::company_summary(owner_id, period, *year, &role_scorecards);
            if let Err(error) = self.store.upsert_company_summary(&company).await {
                warn!(error = %error, month, year, "failed to refresh company summary");
            }
        }
    }

    /// Updates goals concurrently with the same partial-failure policy as
    /// [`save_weekly_data`](Self::save_weekly_data).
    pub async fn update_goals(
        &self,
        caller: &Caller,
        updates: Vec<GoalUpdate>,
    ) -> Result<BatchReport<GoalUpdate>> {
        let owner_id = caller.require()?;
        let catalog = self.load_catalog(owner_id).await?;
        let metric_roles = metric_roles(&catalog);

        let mut errors = Vec::new();
        let mut accepted = Vec::new();
        for (index, update) in updates.iter().enumerate() {
            let checked = catalog::validate_goal(update.goal_value).and_then(|()| {
                if metric_roles.contains_key(&update.metric_id) {
                    Ok(())
                } else {
                    Err(ScorecardError::NotFound(format!("metric {}", update.metric_id)))
                }
            });
            match checked {
                Ok(()) => accepted.push(index),
                Err(error) => errors.push(item_error(index, update.clone(), &error)),
            }
        }

        let results = join_all(accepted.iter().map(|index| {
            let update = &updates[*index];
            self.store
                .upsert_metric_goal(update.metric_id, update.goal_value)
        }))
        .await;

        let mut touched_roles: BTreeSet<Uuid> = BTreeSet::new();
        for (index, result) in accepted.iter().zip(results) {
            let update = &updates[*index];
            match result {
                Ok(()) => {
                    if let Some(role_id) = metric_roles.get(&update.metric_id) {
                        touched_roles.insert(*role_id);
                    }
                }
                Err(error) => {
                    let error = ScorecardError::Persistence(error);
                    errors.push(item_error(*index, update.clone(), &error));
                }
            }
        }

        let report = BatchReport::new(updates.len(), errors);
        info!(
            attempted = report.attempted,
            failed = report.errors.len(),
            "goals updated"
        );

        if !touched_roles.is_empty() {
            let role_ids: Vec<Uuid> = touched_roles.into_iter().collect();
            match self.store.summary_months(owner_id, &role_ids).await {
                Ok(months) => {
                    let months: BTreeSet<(u32, i32)> = months.into_iter().collect();
                    self.refresh_months(owner_id, &months).await;
                }
                Err(error) => warn!(error = %error, "failed to list stored summary months"),
            }
        }

        Ok(report)
    }
}

fn metric_roles(catalog: &[RoleCatalog]) -> HashMap<Uuid, Uuid> {
    catalog
        .iter()
        .flat_map(|entry| entry.metrics.iter().map(|metric| (metric.id, metric.role_id)))
        .collect()
}

fn validate_point(point: &WeeklyDataPoint, metric_roles: &HashMap<Uuid, Uuid>) -> Result<()> {
    period::validate_week(point.week_number)?;
    if !point.actual_value.is_finite() {
        return Err(ScorecardError::Validation(format!(
            "actual value must be a finite number, got {}",
            point.actual_value
        )));
    }
    if !metric_roles.contains_key(&point.metric_id) {
        return Err(ScorecardError::NotFound(format!("metric {}", point.metric_id)));
    }
    Ok(())
}

fn item_error<I>(index: usize, item: I, error: &ScorecardError) -> BatchItemError<I> {
    BatchItemError {
        index,
        item,
        error: ErrorBody::from(error),
    }
}
