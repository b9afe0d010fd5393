use uuid::Uuid;

use crate::catalog;
use crate::grading;
use crate::models::{CompanySummary, Grade, MetricScore, Period, Role, RoleScorecard};

fn pool_average(scores: &[MetricScore]) -> (f64, Grade) {
    let average = grading::average_percentage(scores.iter().map(|score| score.percentage_of_goal));
    (average, grading::grade(average))
}

/// Splits scores into core behavior and custom pools and averages each.
///
/// The combined average is taken over every score in both pools, not over
/// the two pool averages.
pub fn compose_role(role: &Role, metrics: Vec<MetricScore>) -> RoleScorecard {
    let (default_metrics, user_metrics): (Vec<MetricScore>, Vec<MetricScore>) = metrics
        .iter()
        .cloned()
        .partition(|score| catalog::is_core_behavior(&score.metric_name));

    let (average_grade_percentage, average_grade) = pool_average(&metrics);
    let (default_metrics_average, default_metrics_grade) = pool_average(&default_metrics);
    let (user_metrics_average, user_metrics_grade) = pool_average(&user_metrics);

    let combined: Vec<MetricScore> = default_metrics
        .iter()
        .chain(user_metrics.iter())
        .cloned()
        .collect();
    let (combined_average, combined_grade) = pool_average(&combined);

    RoleScorecard {
        role_id: role.id,
        role_name: role.name.clone(),
        metrics,
        average_grade_percentage,
        average_grade,
        default_metrics,
        default_metrics_average,
        default_metrics_grade,
        user_metrics,
        user_metrics_average,
        user_metrics_grade,
        combined_average,
        combined_grade,
    }
}

/// Mean of role averages; roles without metrics are left out entirely.
pub fn company_summary(
    owner_id: Uuid,
    period: Period,
    year: i32,
    roles: &[RoleScorecard],
) -> CompanySummary {
    let company_average = grading::average_percentage(
        roles
            .iter()
            .filter(|role| !role.metrics.is_empty())
            .map(|role| role.average_grade_percentage),
    );

    CompanySummary {
        owner_id,
        period,
        year,
        company_average,
        company_grade: grading::grade(company_average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricType;

    fn score(name: &str, percentage: f64) -> MetricScore {
        MetricScore {
            metric_id: Uuid::new_v4(),
            metric_name: name.to_string(),
            metric_type: MetricType::Count,
            goal_value: 100.0,
            actual_value: percentage,
            percentage_of_goal: percentage,
            grade: grading::grade(percentage),
        }
    }

    fn role(name: &str) -> Role {
        Role {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    #[test]
    fn pools_are_split_by_core_names() {
        let card = compose_role(
            &role("Client Services"),
            vec![
                score("Effort", 100.0),
                score("Attitude", 80.0),
                score("Policies Written", 40.0),
            ],
        );

        assert_eq!(card.default_metrics.len(), 2);
        assert_eq!(card.user_metrics.len(), 1);
        assert!((card.default_metrics_average - 90.0).abs() < 0.001);
        assert_eq!(card.default_metrics_grade, Grade::A);
        assert!((card.user_metrics_average - 40.0).abs() < 0.001);
        assert_eq!(card.user_metrics_grade, Grade::F);
    }

    #[test]
    fn lowercase_core_name_joins_default_pool() {
        let card = compose_role(
            &role("Client Services"),
            vec![score("effort", 60.0), score("Calls", 20.0)],
        );
        assert_eq!(card.default_metrics.len(), 1);
        assert_eq!(card.default_metrics[0].metric_name, "effort");
        assert_eq!(card.user_metrics.len(), 1);
    }

    #[test]
    fn combined_average_weights_each_metric() {
        let card = compose_role(
            &role("Client Services"),
            vec![
                score("Effort", 100.0),
                score("Attitude", 100.0),
                score("Teamwork", 100.0),
                score("Calls", 40.0),
            ],
        );
        // Pool-of-averages would give 70; per-metric mean is 85.
        assert!((card.combined_average - 85.0).abs() < 0.001);
        assert_eq!(card.combined_grade, Grade::B);
        assert!((card.average_grade_percentage - 85.0).abs() < 0.001);
    }

    #[test]
    fn empty_pool_averages_zero() {
        let card = compose_role(&role("Intern"), vec![score("Effort", 95.0)]);
        assert_eq!(card.user_metrics_average, 0.0);
        assert_eq!(card.user_metrics_grade, Grade::F);
    }

    #[test]
    fn company_average_skips_roles_without_metrics() {
        let owner_id = Uuid::new_v4();
        let roles = vec![
            compose_role(&role("A"), vec![score("Effort", 90.0)]),
            compose_role(&role("B"), vec![score("Effort", 70.0)]),
            compose_role(&role("C"), Vec::new()),
        ];
        let summary = company_summary(owner_id, Period::Month(1), 2026, &roles);
        assert!((summary.company_average - 80.0).abs() < 0.001);
        assert_eq!(summary.company_grade, Grade::B);
    }
}
