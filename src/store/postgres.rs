use std::collections::HashMap;
use std::ops::RangeInclusive;

use anyhow::{bail, Context};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    CompanySummary, Grade, Metric, MetricScore, MetricType, MonthlySummary, Period, Role,
    WeeklyDataPoint,
};
use crate::store::ScorecardStore;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_db(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn parse_metric_type(row: &PgRow) -> anyhow::Result<MetricType> {
    let raw: String = row.get("metric_type");
    MetricType::parse(&raw).with_context(|| format!("unknown metric type {raw:?}"))
}

fn parse_grade(row: &PgRow, column: &str) -> anyhow::Result<Grade> {
    let raw: String = row.get(column);
    Grade::parse(&raw).with_context(|| format!("unknown grade {raw:?} in {column}"))
}

fn metric_from_row(row: &PgRow) -> anyhow::Result<Metric> {
    Ok(Metric {
        id: row.get("id"),
        role_id: row.get("role_id"),
        name: row.get("name"),
        metric_type: parse_metric_type(row)?,
        goal_value: row.get("goal_value"),
        is_inverted: row.get("is_inverted"),
        display_order: row.get("display_order"),
        is_visible: row.get("is_visible"),
    })
}

#[async_trait]
impl ScorecardStore for PostgresStore {
    async fn get_roles(&self, owner_id: Uuid) -> anyhow::Result<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name
            FROM advisor_scorecard.roles
            WHERE owner_id = $1
            ORDER BY name
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch roles")?;

        Ok(rows
            .iter()
            .map(|row| Role {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn create_role(&self, role: &Role) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO advisor_scorecard.roles (id, owner_id, name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(role.id)
        .bind(role.owner_id)
        .bind(&role.name)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create role {}", role.name))?;
        Ok(())
    }

    async fn get_metrics(&self, role_ids: &[Uuid]) -> anyhow::Result<Vec<Metric>> {
        let rows = sqlx::query(
            r#"
            SELECT id, role_id, name, metric_type, goal_value, is_inverted,
                   display_order, is_visible
            FROM advisor_scorecard.metrics
            WHERE role_id = ANY($1)
            ORDER BY role_id, display_order, name
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch metrics")?;

        rows.iter().map(metric_from_row).collect()
    }

    async fn insert_metrics(&self, metrics: &[Metric]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for metric in metrics {
            sqlx::query(
                r#"
                INSERT INTO advisor_scorecard.metrics
                (id, role_id, name, metric_type, goal_value, is_inverted, display_order, is_visible)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(metric.id)
            .bind(metric.role_id)
            .bind(&metric.name)
            .bind(metric.metric_type.as_str())
            .bind(metric.goal_value)
            .bind(metric.is_inverted)
            .bind(metric.display_order)
            .bind(metric.is_visible)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert metric {}", metric.name))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_weekly_data(
        &self,
        metric_ids: &[Uuid],
        year: i32,
        weeks: RangeInclusive<u32>,
    ) -> anyhow::Result<Vec<WeeklyDataPoint>> {
        let rows = sqlx::query(
            r#"
            SELECT metric_id, week_number, year, actual_value
            FROM advisor_scorecard.weekly_data
            WHERE metric_id = ANY($1) AND year = $2 AND week_number BETWEEN $3 AND $4
            "#,
        )
        .bind(metric_ids)
        .bind(year)
        .bind(*weeks.start() as i32)
        .bind(*weeks.end() as i32)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch weekly data")?;

        debug!(rows = rows.len(), year, "weekly data fetched");

        Ok(rows
            .iter()
            .map(|row| WeeklyDataPoint {
                metric_id: row.get("metric_id"),
                week_number: row.get::<i32, _>("week_number") as u32,
                year: row.get("year"),
                actual_value: row.get("actual_value"),
            })
            .collect())
    }

    async fn upsert_weekly_data(&self, point: &WeeklyDataPoint) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO advisor_scorecard.weekly_data (metric_id, week_number, year, actual_value)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (metric_id, week_number, year) DO UPDATE
            SET actual_value = EXCLUDED.actual_value, updated_at = now()
            "#,
        )
        .bind(point.metric_id)
        .bind(point.week_number as i32)
        .bind(point.year)
        .bind(point.actual_value)
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "failed to save week {} of {} for metric {}",
                point.week_number, point.year, point.metric_id
            )
        })?;
        Ok(())
    }

    async fn upsert_metric_goal(&self, metric_id: Uuid, goal: f64) -> anyhow::Result<()> {
        let result =
            sqlx::query("UPDATE advisor_scorecard.metrics SET goal_value = $2 WHERE id = $1")
                .bind(metric_id)
                .bind(goal)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update goal for metric {metric_id}"))?;

        if result.rows_affected() == 0 {
            bail!("metric {metric_id} does not exist");
        }
        Ok(())
    }

    async fn get_monthly_summaries(
        &self,
        role_ids: &[Uuid],
        month: u32,
        year: i32,
    ) -> anyhow::Result<Vec<MonthlySummary>> {
        let headers = sqlx::query(
            r#"
            SELECT role_id, month, year, average_grade_percentage, average_grade, computed_at
            FROM advisor_scorecard.monthly_summaries
            WHERE role_id = ANY($1) AND month = $2 AND year = $3
            "#,
        )
        .bind(role_ids)
        .bind(month as i32)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch monthly summaries")?;

        let score_rows = sqlx::query(
            r#"
            SELECT role_id, metric_id, metric_name, metric_type, goal_value, actual_value,
                   percentage_of_goal, grade
            FROM advisor_scorecard.monthly_metric_scores
            WHERE role_id = ANY($1) AND month = $2 AND year = $3
            ORDER BY role_id, position
            "#,
        )
        .bind(role_ids)
        .bind(month as i32)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch monthly metric scores")?;

        let mut scores: HashMap<Uuid, Vec<MetricScore>> = HashMap::new();
        for row in score_rows.iter() {
            scores
                .entry(row.get("role_id"))
                .or_default()
                .push(MetricScore {
                    metric_id: row.get("metric_id"),
                    metric_name: row.get("metric_name"),
                    metric_type: parse_metric_type(row)?,
                    goal_value: row.get("goal_value"),
                    actual_value: row.get("actual_value"),
                    percentage_of_goal: row.get("percentage_of_goal"),
                    grade: parse_grade(row, "grade")?,
                });
        }

        let mut summaries = Vec::new();
        for row in headers.iter() {
            let role_id: Uuid = row.get("role_id");
            summaries.push(MonthlySummary {
                role_id,
                month: row.get::<i32, _>("month") as u32,
                year: row.get("year"),
                average_grade_percentage: row.get("average_grade_percentage"),
                average_grade: parse_grade(row, "average_grade")?,
                metric_scores: scores.remove(&role_id).unwrap_or_default(),
                computed_at: row.get("computed_at"),
            });
        }

        Ok(summaries)
    }

    async fn summary_months(
        &self,
        owner_id: Uuid,
        role_ids: &[Uuid],
    ) -> anyhow::Result<Vec<(u32, i32)>> {
        let rows = sqlx::query(
            r#"
            SELECT month, year FROM advisor_scorecard.monthly_summaries
            WHERE role_id = ANY($1)
            UNION
            SELECT month, year FROM advisor_scorecard.company_summaries
            WHERE owner_id = $2
            ORDER BY year, month
            "#,
        )
        .bind(role_ids)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list summary months")?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<i32, _>("month") as u32, row.get("year")))
            .collect())
    }

    async fn replace_monthly_summary(&self, summary: &MonthlySummary) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO advisor_scorecard.monthly_summaries
            (role_id, month, year, average_grade_percentage, average_grade, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (role_id, month, year) DO UPDATE
            SET average_grade_percentage = EXCLUDED.average_grade_percentage,
                average_grade = EXCLUDED.average_grade,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(summary.role_id)
        .bind(summary.month as i32)
        .bind(summary.year)
        .bind(summary.average_grade_percentage)
        .bind(summary.average_grade.as_str())
        .bind(summary.computed_at)
        .execute(&mut *tx)
        .await
        .context("failed to write monthly summary")?;

        sqlx::query(
            r#"
            DELETE FROM advisor_scorecard.monthly_metric_scores
            WHERE role_id = $1 AND month = $2 AND year = $3
            "#,
        )
        .bind(summary.role_id)
        .bind(summary.month as i32)
        .bind(summary.year)
        .execute(&mut *tx)
        .await
        .context("failed to clear monthly metric scores")?;

        for (position, score) in summary.metric_scores.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO advisor_scorecard.monthly_metric_scores
                (role_id, month, year, position, metric_id, metric_name, metric_type,
                 goal_value, actual_value, percentage_of_goal, grade)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(summary.role_id)
            .bind(summary.month as i32)
            .bind(summary.year)
            .bind(position as i32)
            .bind(score.metric_id)
            .bind(&score.metric_name)
            .bind(score.metric_type.as_str())
            .bind(score.goal_value)
            .bind(score.actual_value)
            .bind(score.percentage_of_goal)
            .bind(score.grade.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to write score for {}", score.metric_name))?;
        }

        tx.commit().await.context("failed to commit monthly summary")?;
        Ok(())
    }

    async fn get_company_summary(
        &self,
        owner_id: Uuid,
        month: u32,
        year: i32,
    ) -> anyhow::Result<Option<CompanySummary>> {
        let row = sqlx::query(
            r#"
            SELECT owner_id, month, year, company_average, company_grade
            FROM advisor_scorecard.company_summaries
            WHERE owner_id = $1 AND month = $2 AND year = $3
            "#,
        )
        .bind(owner_id)
        .bind(month as i32)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch company summary")?;

        row.map(|row| {
            Ok::<_, anyhow::Error>(CompanySummary {
                owner_id: row.get("owner_id"),
                period: Period::Month(row.get::<i32, _>("month") as u32),
                year: row.get("year"),
                company_average: row.get("company_average"),
                company_grade: parse_grade(&row, "company_grade")?,
            })
        })
        .transpose()
    }

    async fn upsert_company_summary(&self, summary: &CompanySummary) -> anyhow::Result<()> {
        let Period::Month(month) = summary.period else {
            bail!("only month company summaries are stored, got {}", summary.period);
        };

        sqlx::query(
            r#"
            INSERT INTO advisor_scorecard.company_summaries
            (owner_id, month, year, company_average, company_grade)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (owner_id, month, year) DO UPDATE
            SET company_average = EXCLUDED.company_average,
                company_grade = EXCLUDED.company_grade,
                computed_at = now()
            "#,
        )
        .bind(summary.owner_id)
        .bind(month as i32)
        .bind(summary.year)
        .bind(summary.company_average)
        .bind(summary.company_grade.as_str())
        .execute(&self.pool)
        .await
        .context("failed to write company summary")?;
        Ok(())
    }
}
