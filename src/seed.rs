use tracing::info;

use crate::engine::{Caller, NewMetric, ScorecardEngine};
use crate::error::Result;
use crate::models::{MetricType, WeeklyDataPoint};
use crate::store::ScorecardStore;

/// Demo roles, custom metrics and a quarter of weekly entries. Safe to rerun.
pub async fn seed<S: ScorecardStore>(
    engine: &ScorecardEngine<S>,
    caller: &Caller,
    year: i32,
) -> Result<usize> {
    let roles = vec![
        (
            "Marketing Position",
            vec![
                ("Seminar Attendees", MetricType::Count, 40.0, false),
                ("Marketing Spend", MetricType::Currency, 2500.0, true),
                ("Appointments Set", MetricType::Count, 20.0, false),
            ],
        ),
        (
            "Client Services",
            vec![
                ("Paperwork Turnaround Days", MetricType::Duration, 3.0, true),
                ("Client Satisfaction", MetricType::RatingScale, 9.0, false),
                ("Error Rate", MetricType::Percentage, 2.0, true),
            ],
        ),
    ];

    let mut existing = engine.catalog(caller).await?;
    for (role_name, metrics) in roles.iter() {
        let entry = match existing.iter().position(|entry| entry.role.name == *role_name) {
            Some(position) => existing.remove(position),
            None => engine.create_role(caller, role_name).await?,
        };
        engine.ensure_catalog(caller, entry.role.id).await?;

        for (name, metric_type, goal_value, is_inverted) in metrics.iter() {
            if entry.find_metric(name).is_some() {
                continue;
            }
            engine
                .add_metric(
                    caller,
                    entry.role.id,
                    NewMetric {
                        name: (*name).to_string(),
                        metric_type: *metric_type,
                        goal_value: *goal_value,
                        is_inverted: *is_inverted,
                        is_visible: true,
                    },
                )
                .await?;
        }
    }

    // Week values for the first quarter: a monthly entry in week 1 of
    // month 1, weekly entries afterwards.
    let entries: Vec<(&str, &str, Vec<(u32, f64)>)> = vec![
        (
            "Marketing Position",
            "Seminar Attendees",
            vec![(1, 38.0), (5, 9.0), (6, 12.0), (7, 11.0), (8, 14.0), (9, 44.0)],
        ),
        ("Marketing Position", "Marketing Spend", vec![(1, 2300.0), (5, 2900.0), (9, 2450.0)]),
        (
            "Marketing Position",
            "Appointments Set",
            vec![(1, 18.0), (5, 6.0), (6, 5.0), (7, 4.0), (8, 7.0), (9, 21.0)],
        ),
        ("Marketing Position", "Effort", vec![(1, 5.0), (5, 4.0), (9, 5.0)]),
        ("Marketing Position", "Attitude", vec![(1, 4.0), (5, 4.0), (9, 5.0)]),
        ("Client Services", "Paperwork Turnaround Days", vec![(1, 2.5), (5, 4.0), (9, 3.0)]),
        (
            "Client Services",
            "Client Satisfaction",
            vec![(1, 9.0), (5, 8.0), (6, 9.0), (7, 10.0), (8, 9.0)],
        ),
        ("Client Services", "Error Rate", vec![(1, 1.5), (5, 0.0), (9, 2.5)]),
        ("Client Services", "Teamwork", vec![(1, 5.0), (5, 5.0), (9, 4.0)]),
        ("Client Services", "Results", vec![(1, 4.0), (5, 3.0), (9, 4.0)]),
    ];

    let catalog = engine.catalog(caller).await?;
    let mut points = Vec::new();
    for (role_name, metric_name, weeks) in entries {
        let metric = catalog
            .iter()
            .find(|entry| entry.role.name == role_name)
            .and_then(|entry| entry.find_metric(metric_name));
        let Some(metric) = metric else {
            continue;
        };
        for (week_number, actual_value) in weeks {
            points.push(WeeklyDataPoint {
                metric_id: metric.id,
                week_number,
                year,
                actual_value,
            });
        }
    }

    let report = engine.save_weekly_data(caller, points).await?;
    info!(saved = report.succeeded(), year, "seed data written");
    let saved = report.succeeded();
    report.into_result()?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn seed_is_repeatable() {
        let engine = ScorecardEngine::new(MemoryStore::new());
        let caller = Caller::owner(Uuid::new_v4());

        let first = seed(&engine, &caller, 2026).await.unwrap();
        let second = seed(&engine, &caller, 2026).await.unwrap();
        assert_eq!(first, second);

        let catalog = engine.catalog(&caller).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.iter().all(|entry| entry.metrics.len() == 8));
    }

    #[tokio::test]
    async fn seeded_quarter_grades_every_role() {
        let engine = ScorecardEngine::new(MemoryStore::new());
        let caller = Caller::owner(Uuid::new_v4());
        seed(&engine, &caller, 2026).await.unwrap();

        let scorecard = engine
            .get_scorecard(&caller, Period::Quarter(1), 2026)
            .await
            .unwrap();
        assert_eq!(scorecard.role_scorecards.len(), 2);
        assert_eq!(scorecard.role_scorecards[0].role_name, "Client Services");
        for card in scorecard.role_scorecards.iter() {
            assert_eq!(card.default_metrics.len(), 5);
            assert_eq!(card.user_metrics.len(), 3);
        }

        let attendees = scorecard.role_scorecards[1]
            .metrics
            .iter()
            .find(|score| score.metric_name == "Seminar Attendees")
            .unwrap();
        // 38 (monthly) + 46 (weekly sum) + 44 (monthly) against 3 x 40.
        assert!((attendees.actual_value - 128.0).abs() < 0.001);
        assert!((attendees.goal_value - 120.0).abs() < 0.001);
    }
}
