//! Synthetic calendar and the weekly/monthly entry heuristic.
//!
//! A month is exactly four consecutive weeks, so a year covers weeks 1..=48.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use uuid::Uuid;

use crate::error::{Result, ScorecardError};
use crate::models::{MetricType, Period, PeriodType, WeeklyDataPoint};

pub const WEEKS_PER_MONTH: u32 = 4;
pub const MONTHS_PER_YEAR: u32 = 12;
pub const WEEKS_PER_YEAR: u32 = WEEKS_PER_MONTH * MONTHS_PER_YEAR;

pub fn resolve(period_type: PeriodType, value: u32) -> Result<Period> {
    let period = match period_type {
        PeriodType::Month => Period::Month(value),
        PeriodType::Quarter => Period::Quarter(value),
        PeriodType::Year => Period::Year,
    };
    validate(period)?;
    Ok(period)
}

pub fn validate(period: Period) -> Result<()> {
    match period {
        Period::Month(month) if !(1..=MONTHS_PER_YEAR).contains(&month) => Err(
            ScorecardError::Validation(format!("month must be between 1 and 12, got {month}")),
        ),
        Period::Quarter(quarter) if !(1..=4).contains(&quarter) => Err(
            ScorecardError::Validation(format!("quarter must be between 1 and 4, got {quarter}")),
        ),
        _ => Ok(()),
    }
}

pub fn validate_week(week_number: u32) -> Result<()> {
    if (1..=WEEKS_PER_YEAR).contains(&week_number) {
        Ok(())
    } else {
        Err(ScorecardError::Validation(format!(
            "week must be between 1 and {WEEKS_PER_YEAR}, got {week_number}"
        )))
    }
}

pub fn month_start_week(month: u32) -> u32 {
    (month - 1) * WEEKS_PER_MONTH + 1
}

pub fn month_weeks(month: u32) -> RangeInclusive<u32> {
    let start = month_start_week(month);
    start..=start + WEEKS_PER_MONTH - 1
}

pub fn month_of_week(week_number: u32) -> u32 {
    (week_number - 1) / WEEKS_PER_MONTH + 1
}

/// Months a period spans, in calendar order.
pub fn months(period: Period) -> Vec<u32> {
    match period {
        Period::Month(month) => vec![month],
        Period::Quarter(quarter) => {
            let first = (quarter - 1) * 3 + 1;
            (first..first + 3).collect()
        }
        Period::Year => (1..=MONTHS_PER_YEAR).collect(),
    }
}

/// Every week a period touches, so one fetch covers the whole period.
pub fn week_range(period: Period) -> RangeInclusive<u32> {
    let months = months(period);
    let first = months.first().copied().unwrap_or(1);
    let last = months.last().copied().unwrap_or(MONTHS_PER_YEAR);
    month_start_week(first)..=*month_weeks(last).end()
}

/// How the stored rows of one metric-month were interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonthEntry {
    /// Week 1 holds the whole month; later weeks are absent or zero.
    Monthly(f64),
    /// Weeks hold their own values and are summed or averaged.
    Weekly(f64),
    Empty,
}

impl MonthEntry {
    pub fn value(self) -> f64 {
        match self {
            MonthEntry::Monthly(value) | MonthEntry::Weekly(value) => value,
            MonthEntry::Empty => 0.0,
        }
    }
}

/// Classifies the four week slots of a month. `None` means no stored row,
/// which is different from a stored zero.
///
/// One real weekly entry with zeros elsewhere looks exactly like a monthly
/// entry; both resolve to the week 1 value.
pub fn classify_month(weeks: [Option<f64>; 4], metric_type: MetricType) -> MonthEntry {
    let [first, rest @ ..] = weeks;

    if let Some(value) = first {
        if rest.iter().all(|week| week.map_or(true, |v| v == 0.0)) {
            return MonthEntry::Monthly(value);
        }
    }

    if weeks.iter().any(Option::is_some) {
        let total: f64 = weeks.iter().map(|week| week.unwrap_or(0.0)).sum();
        let value = if metric_type.is_rating() {
            total / WEEKS_PER_MONTH as f64
        } else {
            total
        };
        return MonthEntry::Weekly(value);
    }

    MonthEntry::Empty
}

/// Stored rows indexed by metric and week for one year.
#[derive(Debug, Default)]
pub struct WeekIndex {
    values: HashMap<(Uuid, u32), f64>,
}

impl WeekIndex {
    pub fn new(points: &[WeeklyDataPoint]) -> Self {
        let values = points
            .iter()
            .map(|point| ((point.metric_id, point.week_number), point.actual_value))
            .collect();
        Self { values }
    }

    pub fn month_slots(&self, metric_id: Uuid, month: u32) -> [Option<f64>; 4] {
        let start = month_start_week(month);
        std::array::from_fn(|offset| {
            self.values
                .get(&(metric_id, start + offset as u32))
                .copied()
        })
    }

    pub fn month_actual(&self, metric_id: Uuid, metric_type: MetricType, month: u32) -> f64 {
        classify_month(self.month_slots(metric_id, month), metric_type).value()
    }
}
