use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{Result, ScorecardError};
use crate::models::{Metric, MetricType, Role};

/// Behaviors every role is graded on, in the order they are appended.
pub const CORE_BEHAVIOR_METRICS: [&str; 5] =
    ["Effort", "Attitude", "Teamwork", "Innovation", "Results"];

pub const CORE_BEHAVIOR_GOAL: f64 = 5.0;

/// Matches names the same way metric lookups do: trimmed, ASCII case-insensitive.
pub fn is_core_behavior(name: &str) -> bool {
    let name = name.trim();
    CORE_BEHAVIOR_METRICS
        .iter()
        .any(|core| core.eq_ignore_ascii_case(name))
}

/// Stable id for a core metric of a role, shared by placeholders and persisted rows.
pub fn core_metric_id(role_id: Uuid, name: &str) -> Uuid {
    Uuid::new_v5(&role_id, name.as_bytes())
}

/// A role together with its metrics in display order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RoleCatalog {
    pub role: Role,
    pub metrics: Vec<Metric>,
}

impl RoleCatalog {
    pub fn find_metric(&self, name: &str) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|metric| metric.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn next_display_order(&self) -> i32 {
        next_display_order(&self.metrics)
    }
}

fn next_display_order(metrics: &[Metric]) -> i32 {
    metrics
        .iter()
        .map(|metric| metric.display_order)
        .max()
        .map_or(1, |highest| highest + 1)
}

/// Core behavior metrics the role does not have yet, placed after its
/// highest display order.
pub fn missing_core_metrics(role: &Role, metrics: &[Metric]) -> Vec<Metric> {
    let present: HashSet<String> = metrics
        .iter()
        .filter(|metric| metric.role_id == role.id)
        .map(|metric| metric.name.trim().to_ascii_lowercase())
        .collect();
    let mut display_order = next_display_order(metrics);

    CORE_BEHAVIOR_METRICS
        .iter()
        .filter(|name| !present.contains(&name.to_ascii_lowercase()))
        .map(|name| {
            let metric = Metric {
                id: core_metric_id(role.id, name),
                role_id: role.id,
                name: (*name).to_string(),
                metric_type: MetricType::Rating1To5,
                goal_value: CORE_BEHAVIOR_GOAL,
                is_inverted: false,
                display_order,
                is_visible: true,
            };
            display_order += 1;
            metric
        })
        .collect()
}

/// Completes a role's metric list in memory without touching the store.
pub fn with_core_metrics(role: &Role, mut metrics: Vec<Metric>) -> Vec<Metric> {
    let missing = missing_core_metrics(role, &metrics);
    metrics.extend(missing);
    sort_metrics(&mut metrics);
    metrics
}

/// Metrics that appear on a scorecard: visible ones plus every core behavior.
pub fn scored_metrics(metrics: &[Metric]) -> Vec<Metric> {
    metrics
        .iter()
        .filter(|metric| metric.is_visible || is_core_behavior(&metric.name))
        .cloned()
        .collect()
}

pub fn sort_roles(roles: &mut [Role]) {
    roles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

pub fn sort_metrics(metrics: &mut [Metric]) {
    metrics.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.cmp(&b.name))
    });
}

pub fn validate_goal(goal: f64) -> Result<()> {
    if !goal.is_finite() {
        return Err(ScorecardError::Validation(format!(
            "goal must be a finite number, got {goal}"
        )));
    }
    if goal < 0.0 {
        return Err(ScorecardError::Validation(format!(
            "goal must be non-negative, got {goal}"
        )));
    }
    Ok(())
}

pub fn validate_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ScorecardError::Validation(format!("{kind} name is required")));
    }
    Ok(trimmed.to_string())
}
