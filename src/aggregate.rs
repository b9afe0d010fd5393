use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::grading;
use crate::models::{Metric, MetricScore, MonthlySummary, Period};
use crate::period::{self, WeekIndex};

/// Goal for the whole period. Rating goals are not additive across months.
pub fn period_goal(metric: &Metric, period: Period) -> f64 {
    if metric.metric_type.is_rating() {
        return metric.goal_value;
    }
    metric.goal_value * period::months(period).len() as f64
}

/// Actual value for the whole period, built from per-month actuals.
pub fn period_actual(index: &WeekIndex, metric: &Metric, period: Period) -> f64 {
    let months = period::months(period);
    let total: f64 = months
        .iter()
        .map(|month| index.month_actual(metric.id, metric.metric_type, *month))
        .sum();

    if metric.metric_type.is_rating() && !months.is_empty() {
        total / months.len() as f64
    } else {
        total
    }
}

pub fn score_metric(metric: &Metric, actual: f64, goal: f64) -> MetricScore {
    let percentage = grading::percentage_of_goal(actual, goal, metric.is_inverted);
    MetricScore {
        metric_id: metric.id,
        metric_name: metric.name.clone(),
        metric_type: metric.metric_type,
        goal_value: goal,
        actual_value: actual,
        percentage_of_goal: percentage,
        grade: grading::grade(percentage),
    }
}

/// Scores each metric for the period, keeping the order of `metrics`.
pub fn score_metrics(metrics: &[Metric], index: &WeekIndex, period: Period) -> Vec<MetricScore> {
    metrics
        .iter()
        .map(|metric| {
            let actual = period_actual(index, metric, period);
            let goal = period_goal(metric, period);
            score_metric(metric, actual, goal)
        })
        .collect()
}

pub fn monthly_summary(
    role_id: Uuid,
    month: u32,
    year: i32,
    metric_scores: Vec<MetricScore>,
    computed_at: DateTime<Utc>,
) -> MonthlySummary {
    let average = grading::average_percentage(
        metric_scores.iter().map(|score| score.percentage_of_goal),
    );
    MonthlySummary {
        role_id,
        month,
        year,
        average_grade_percentage: average,
        average_grade: grading::grade(average),
        metric_scores,
        computed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Grade, MetricType, WeeklyDataPoint};

    fn metric(metric_type: MetricType, goal_value: f64) -> Metric {
        Metric {
            id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            name: "Appointments".to_string(),
            metric_type,
            goal_value,
            is_inverted: false,
            display_order: 1,
            is_visible: true,
        }
    }

    fn point(metric: &Metric, week_number: u32, actual_value: f64) -> WeeklyDataPoint {
        WeeklyDataPoint {
            metric_id: metric.id,
            week_number,
            year: 2026,
            actual_value,
        }
    }

    #[test]
    fn quarter_sums_actuals_and_scales_goal() {
        let metric = metric(MetricType::Count, 50.0);
        let points = vec![
            point(&metric, 1, 100.0),
            point(&metric, 5, 100.0),
            point(&metric, 9, 100.0),
        ];
        let index = WeekIndex::new(&points);

        let scores = score_metrics(&[metric], &index, Period::Quarter(1));
        let score = &scores[0];
        assert!((score.actual_value - 300.0).abs() < 0.001);
        assert!((score.goal_value - 150.0).abs() < 0.001);
        assert!((score.percentage_of_goal - 200.0).abs() < 0.001);
        assert_eq!(score.grade, Grade::A);
    }

    #[test]
    fn rating_goal_does_not_scale() {
        let metric = metric(MetricType::Rating1To5, 5.0);
        assert_eq!(period_goal(&metric, Period::Year), 5.0);
        assert_eq!(period_goal(&metric, Period::Quarter(3)), 5.0);

        let currency = self::metric(MetricType::Currency, 1000.0);
        assert_eq!(period_goal(&currency, Period::Year), 12000.0);
        assert_eq!(period_goal(&currency, Period::Month(6)), 1000.0);
    }

    #[test]
    fn rating_quarter_averages_months() {
        let metric = metric(MetricType::Rating1To5, 5.0);
        let points = vec![
            point(&metric, 13, 4.0),
            point(&metric, 17, 5.0),
            point(&metric, 21, 3.0),
        ];
        let index = WeekIndex::new(&points);
        let actual = period_actual(&index, &metric, Period::Quarter(2));
        assert!((actual - 4.0).abs() < 0.001);
    }

    #[test]
    fn single_rating_entry_is_not_divided() {
        let metric = metric(MetricType::Rating1To5, 5.0);
        let index = WeekIndex::new(&[point(&metric, 1, 40.0)]);
        let scores = score_metrics(&[metric], &index, Period::Month(1));
        assert!((scores[0].actual_value - 40.0).abs() < 0.001);
    }

    #[test]
    fn weekly_rating_entries_are_averaged_over_four_weeks() {
        let metric = metric(MetricType::Rating1To5, 5.0);
        let index = WeekIndex::new(&[point(&metric, 1, 4.0), point(&metric, 2, 4.0)]);
        let actual = period_actual(&index, &metric, Period::Month(1));
        assert!((actual - 2.0).abs() < 0.001);
    }

    #[test]
    fn inverted_metric_with_no_data_scores_zero() {
        let mut metric = metric(MetricType::Duration, 10.0);
        metric.is_inverted = true;
        let scores = score_metrics(&[metric], &WeekIndex::default(), Period::Month(2));
        assert_eq!(scores[0].percentage_of_goal, 0.0);
        assert_eq!(scores[0].grade, Grade::F);
    }

    #[test]
    fn monthly_summary_averages_metric_percentages() {
        let metric = metric(MetricType::Count, 10.0);
        let scores = vec![
            score_metric(&metric, 10.0, 10.0),
            score_metric(&metric, 7.0, 10.0),
        ];
        let summary = monthly_summary(metric.role_id, 1, 2026, scores, Utc::now());
        assert!((summary.average_grade_percentage - 85.0).abs() < 0.001);
        assert_eq!(summary.average_grade, Grade::B);
    }
}
