use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::catalog::RoleCatalog;
use crate::engine::{Caller, ScorecardEngine};
use crate::error::{BatchItemError, BatchReport, ErrorBody, Result, ScorecardError};
use crate::models::WeeklyDataPoint;
use crate::store::ScorecardStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    pub role: String,
    pub metric: String,
    pub week: u32,
    pub year: i32,
    pub value: f64,
}

pub fn read_rows<R: Read>(reader: R) -> anyhow::Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Maps rows to weekly points by role and metric name. Rows that name an
/// unknown role or metric come back as errors keyed by row index.
pub fn resolve(
    rows: &[CsvRow],
    catalog: &[RoleCatalog],
) -> (Vec<(usize, WeeklyDataPoint)>, Vec<BatchItemError<CsvRow>>) {
    let mut points = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let metric = catalog
            .iter()
            .find(|entry| entry.role.name.eq_ignore_ascii_case(row.role.trim()))
            .and_then(|entry| entry.find_metric(&row.metric));

        match metric {
            Some(metric) => points.push((
                index,
                WeeklyDataPoint {
                    metric_id: metric.id,
                    week_number: row.week,
                    year: row.year,
                    actual_value: row.value,
                },
            )),
            None => errors.push(BatchItemError {
                index,
                item: row.clone(),
                error: ErrorBody::from(&ScorecardError::NotFound(format!(
                    "metric {:?} on role {:?}",
                    row.metric, row.role
                ))),
            }),
        }
    }

    (points, errors)
}

/// Imports CSV rows through the engine's weekly batch save.
pub async fn import_rows<S: ScorecardStore>(
    engine: &ScorecardEngine<S>,
    caller: &Caller,
    rows: Vec<CsvRow>,
) -> Result<BatchReport<CsvRow>> {
    let catalog = engine.catalog(caller).await?;
    let (resolved, mut errors) = resolve(&rows, &catalog);

    let (row_indexes, points): (Vec<usize>, Vec<WeeklyDataPoint>) = resolved.into_iter().unzip();
    let saved = engine.save_weekly_data(caller, points).await?;

    for failure in saved.errors {
        let index = row_indexes[failure.index];
        errors.push(BatchItemError {
            index,
            item: rows[index].clone(),
            error: failure.error,
        });
    }

    Ok(BatchReport::new(rows.len(), errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NewMetric;
    use crate::models::MetricType;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    const SAMPLE: &str = "\
role,metric,week,year,value
Advisor,Calls,1,2026,12
advisor , effort ,2,2026,4
Advisor,Unknown Metric,3,2026,1
Advisor,Calls,60,2026,5
";

    #[test]
    fn parses_rows_with_whitespace() {
        let rows = read_rows(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].metric, "effort");
        assert_eq!(rows[0].value, 12.0);
    }

    #[test]
    fn rejects_malformed_numbers() {
        let csv = "role,metric,week,year,value\nAdvisor,Calls,one,2026,3\n";
        let result = read_rows(csv.as_bytes());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn import_reports_rows_it_could_not_save() {
        let engine = ScorecardEngine::new(MemoryStore::new());
        let caller = Caller::owner(Uuid::new_v4());
        let role = engine.create_role(&caller, "Advisor").await.unwrap();
        let calls = engine
            .add_metric(
                &caller,
                role.role.id,
                NewMetric {
                    name: "Calls".to_string(),
                    metric_type: MetricType::Count,
                    goal_value: 10.0,
                    is_inverted: false,
                    is_visible: true,
                },
            )
            .await
            .unwrap();

        let rows = read_rows(SAMPLE.as_bytes()).unwrap();
        let report = import_rows(&engine, &caller, rows).await.unwrap();

        assert_eq!(report.attempted, 4);
        let failed: Vec<(usize, &str)> = report
            .errors
            .iter()
            .map(|error| (error.index, error.error.kind))
            .collect();
        assert_eq!(failed, vec![(2, "not_found"), (3, "validation_error")]);
        assert_eq!(engine.store().weekly_value(calls.id, 1, 2026).await, Some(12.0));

        let effort = role.find_metric("Effort").unwrap();
        assert_eq!(engine.store().weekly_value(effort.id, 2, 2026).await, Some(4.0));
    }
}
