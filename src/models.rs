use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Count,
    Currency,
    Percentage,
    Duration,
    #[serde(rename = "rating1to5")]
    Rating1To5,
    RatingScale,
}

impl MetricType {
    pub const ALL: [MetricType; 6] = [
        MetricType::Count,
        MetricType::Currency,
        MetricType::Percentage,
        MetricType::Duration,
        MetricType::Rating1To5,
        MetricType::RatingScale,
    ];

    /// Rating metrics are averaged across weeks and months; their goals never scale.
    pub fn is_rating(self) -> bool {
        matches!(self, MetricType::Rating1To5 | MetricType::RatingScale)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Count => "count",
            MetricType::Currency => "currency",
            MetricType::Percentage => "percentage",
            MetricType::Duration => "duration",
            MetricType::Rating1To5 => "rating1to5",
            MetricType::RatingScale => "rating_scale",
        }
    }

    pub fn parse(value: &str) -> Option<MetricType> {
        MetricType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: Uuid,
    pub role_id: Uuid,
    pub name: String,
    pub metric_type: MetricType,
    pub goal_value: f64,
    pub is_inverted: bool,
    pub display_order: i32,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDataPoint {
    pub metric_id: Uuid,
    pub week_number: u32,
    pub year: i32,
    pub actual_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn parse(value: &str) -> Option<Grade> {
        match value.trim() {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "F" => Some(Grade::F),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Month,
    Quarter,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Period {
    Month(u32),
    Quarter(u32),
    Year,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month(month) => write!(f, "month {month}"),
            Period::Quarter(quarter) => write!(f, "Q{quarter}"),
            Period::Year => f.write_str("full year"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric_id: Uuid,
    pub metric_name: String,
    pub metric_type: MetricType,
    pub goal_value: f64,
    pub actual_value: f64,
    pub percentage_of_goal: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub role_id: Uuid,
    pub month: u32,
    pub year: i32,
    pub average_grade_percentage: f64,
    pub average_grade: Grade,
    pub metric_scores: Vec<MetricScore>,
    pub computed_at: DateTime<Utc>,
}

impl MonthlySummary {
    /// Same grades and scores, ignoring when each was computed.
    pub fn same_scores(&self, other: &MonthlySummary) -> bool {
        self.role_id == other.role_id
            && self.month == other.month
            && self.year == other.year
            && self.average_grade == other.average_grade
            && self.average_grade_percentage == other.average_grade_percentage
            && self.metric_scores == other.metric_scores
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub owner_id: Uuid,
    pub period: Period,
    pub year: i32,
    pub company_average: f64,
    pub company_grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleScorecard {
    pub role_id: Uuid,
    pub role_name: String,
    pub metrics: Vec<MetricScore>,
    pub average_grade_percentage: f64,
    pub average_grade: Grade,
    pub default_metrics: Vec<MetricScore>,
    pub default_metrics_average: f64,
    pub default_metrics_grade: Grade,
    pub user_metrics: Vec<MetricScore>,
    pub user_metrics_average: f64,
    pub user_metrics_grade: Grade,
    pub combined_average: f64,
    pub combined_grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub period: Period,
    pub year: i32,
    pub role_scorecards: Vec<RoleScorecard>,
    pub company_summary: CompanySummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_types_parse_from_wire_names() {
        assert_eq!(MetricType::parse("rating1to5"), Some(MetricType::Rating1To5));
        assert_eq!(MetricType::parse("Currency"), Some(MetricType::Currency));
        assert_eq!(MetricType::parse("stars"), None);
        assert!(MetricType::RatingScale.is_rating());
        assert!(!MetricType::Duration.is_rating());
    }

    #[test]
    fn serde_names_match_storage_names() {
        for kind in MetricType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn period_serializes_with_tag() {
        let json = serde_json::to_value(Period::Quarter(2)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "quarter", "value": 2}));
    }
}
