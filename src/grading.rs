use crate::models::Grade;

/// Percentage of goal reached. Values above 100 are kept as over-achievement.
///
/// Inverted metrics score `goal / actual`; an actual of zero scores 0 rather
/// than dividing by zero, so a perfect zero-error month grades F.
pub fn percentage_of_goal(actual: f64, goal: f64, inverted: bool) -> f64 {
    if goal == 0.0 {
        return 0.0;
    }

    if inverted {
        if actual == 0.0 {
            return 0.0;
        }
        goal / actual * 100.0
    } else {
        actual / goal * 100.0
    }
}

pub fn grade(percentage: f64) -> Grade {
    match percentage {
        p if p >= 90.0 => Grade::A,
        p if p >= 80.0 => Grade::B,
        p if p >= 70.0 => Grade::C,
        p if p >= 60.0 => Grade::D,
        _ => Grade::F,
    }
}

/// Mean of the finite percentages; 0 when none are left.
pub fn average_percentage<I>(percentages: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = percentages
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_follow_expected_tiers() {
        assert_eq!(grade(90.0), Grade::A);
        assert_eq!(grade(250.0), Grade::A);
        assert_eq!(grade(89.99), Grade::B);
        assert_eq!(grade(80.0), Grade::B);
        assert_eq!(grade(70.0), Grade::C);
        assert_eq!(grade(60.0), Grade::D);
        assert_eq!(grade(59.9), Grade::F);
        assert_eq!(grade(0.0), Grade::F);
        assert_eq!(grade(f64::NAN), Grade::F);
    }

    #[test]
    fn hitting_goal_is_one_hundred_percent() {
        assert!((percentage_of_goal(40.0, 40.0, false) - 100.0).abs() < 0.001);
        assert!((percentage_of_goal(40.0, 40.0, true) - 100.0).abs() < 0.001);
    }

    #[test]
    fn zero_goal_scores_zero() {
        assert_eq!(percentage_of_goal(12.0, 0.0, false), 0.0);
        assert_eq!(percentage_of_goal(12.0, 0.0, true), 0.0);
    }

    #[test]
    fn over_achievement_is_not_clamped() {
        assert!((percentage_of_goal(150.0, 50.0, false) - 300.0).abs() < 0.001);
    }

    #[test]
    fn inverted_zero_actual_scores_worst() {
        let percentage = percentage_of_goal(0.0, 10.0, true);
        assert_eq!(percentage, 0.0);
        assert_eq!(grade(percentage), Grade::F);
    }

    #[test]
    fn inverted_metric_rewards_lower_actuals() {
        assert!((percentage_of_goal(5.0, 10.0, true) - 200.0).abs() < 0.001);
        assert!((percentage_of_goal(20.0, 10.0, true) - 50.0).abs() < 0.001);
    }

    #[test]
    fn grade_is_monotonic_in_actual() {
        let goal = 37.0;
        let mut previous_normal = Grade::F;
        let mut previous_inverted = Grade::A;
        for step in 1..400 {
            let actual = step as f64 * 0.25;
            let normal = grade(percentage_of_goal(actual, goal, false));
            let inverted = grade(percentage_of_goal(actual, goal, true));
            // Grade orders A < F, so "better" means smaller.
            assert!(normal <= previous_normal, "normal grade fell at {actual}");
            assert!(inverted >= previous_inverted, "inverted grade rose at {actual}");
            previous_normal = normal;
            previous_inverted = inverted;
        }
    }

    #[test]
    fn average_skips_non_finite_values() {
        let average = average_percentage([80.0, f64::NAN, 100.0, f64::INFINITY]);
        assert!((average - 90.0).abs() < 0.001);
        assert_eq!(average_percentage(Vec::new()), 0.0);
    }
}
