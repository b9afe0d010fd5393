use std::fmt::Write;

use crate::models::{MetricScore, MetricType, RoleScorecard, Scorecard};

fn format_value(metric_type: MetricType, value: f64) -> String {
    match metric_type {
        MetricType::Currency => format!("${value:.2}"),
        MetricType::Percentage => format!("{value:.1}%"),
        MetricType::Duration => format!("{value:.1} days"),
        MetricType::Rating1To5 | MetricType::RatingScale => format!("{value:.1}"),
        MetricType::Count => format!("{value:.0}"),
    }
}

fn write_metric_rows(output: &mut String, scores: &[MetricScore]) {
    let _ = writeln!(output, "| Metric | Actual | Goal | % of Goal | Grade |");
    let _ = writeln!(output, "|---|---|---|---|---|");
    for score in scores {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {:.1}% | {} |",
            score.metric_name,
            format_value(score.metric_type, score.actual_value),
            format_value(score.metric_type, score.goal_value),
            score.percentage_of_goal,
            score.grade
        );
    }
}

fn write_role(output: &mut String, card: &RoleScorecard) {
    let _ = writeln!(output, "## {}", card.role_name);
    let _ = writeln!(
        output,
        "Overall {:.1}% ({}), core behaviors {:.1}% ({}), role metrics {:.1}% ({})",
        card.combined_average,
        card.combined_grade,
        card.default_metrics_average,
        card.default_metrics_grade,
        card.user_metrics_average,
        card.user_metrics_grade
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "### Core Behaviors");
    write_metric_rows(output, &card.default_metrics);
    let _ = writeln!(output);

    let _ = writeln!(output, "### Role Metrics");
    if card.user_metrics.is_empty() {
        let _ = writeln!(output, "No role-specific metrics are tracked.");
    } else {
        write_metric_rows(output, &card.user_metrics);
    }
    let _ = writeln!(output);
}

pub fn build_report(scorecard: &Scorecard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Performance Scorecard");
    let _ = writeln!(output, "Period: {} of {}", scorecard.period, scorecard.year);
    let _ = writeln!(
        output,
        "Company average {:.1}% (grade {})",
        scorecard.company_summary.company_average, scorecard.company_summary.company_grade
    );
    let _ = writeln!(output);

    if scorecard.role_scorecards.is_empty() {
        let _ = writeln!(output, "No roles have been set up yet.");
        return output;
    }

    let mut ranked: Vec<&RoleScorecard> = scorecard.role_scorecards.iter().collect();
    ranked.sort_by(|a, b| {
        b.average_grade_percentage
            .partial_cmp(&a.average_grade_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let _ = writeln!(output, "## Role Ranking");
    for card in ranked.iter() {
        let _ = writeln!(
            output,
            "- {}: {:.1}% ({})",
            card.role_name, card.average_grade_percentage, card.average_grade
        );
    }
    let _ = writeln!(output);

    for card in scorecard.role_scorecards.iter() {
        write_role(&mut output, card);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose;
    use crate::models::{Grade, Period, Role};
    use uuid::Uuid;

    fn score(name: &str, metric_type: MetricType, actual: f64, goal: f64) -> MetricScore {
        let percentage = actual / goal * 100.0;
        MetricScore {
            metric_id: Uuid::new_v4(),
            metric_name: name.to_string(),
            metric_type,
            goal_value: goal,
            actual_value: actual,
            percentage_of_goal: percentage,
            grade: crate::grading::grade(percentage),
        }
    }

    fn scorecard() -> Scorecard {
        let owner_id = Uuid::new_v4();
        let role = |name: &str| Role {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
        };
        let cards = vec![
            compose::compose_role(
                &role("Client Services"),
                vec![score("Effort", MetricType::Rating1To5, 3.0, 5.0)],
            ),
            compose::compose_role(
                &role("Marketing Position"),
                vec![
                    score("Effort", MetricType::Rating1To5, 5.0, 5.0),
                    score("Marketing Spend", MetricType::Currency, 2300.0, 2500.0),
                ],
            ),
        ];
        let company = compose::company_summary(owner_id, Period::Quarter(1), 2026, &cards);
        Scorecard {
            period: Period::Quarter(1),
            year: 2026,
            role_scorecards: cards,
            company_summary: company,
        }
    }

    #[test]
    fn report_ranks_roles_and_lists_metrics() {
        let report = build_report(&scorecard());
        assert!(report.contains("Period: Q1 of 2026"));
        let marketing = report.find("- Marketing Position").unwrap();
        let services = report.find("- Client Services").unwrap();
        assert!(marketing < services);
        assert!(report.contains("| Marketing Spend | $2300.00 | $2500.00 | 92.0% | A |"));
        assert!(report.contains("No role-specific metrics are tracked."));
    }

    #[test]
    fn empty_scorecard_says_so() {
        let mut scorecard = scorecard();
        scorecard.role_scorecards.clear();
        scorecard.company_summary.company_grade = Grade::F;
        let report = build_report(&scorecard);
        assert!(report.contains("No roles have been set up yet."));
    }
}
