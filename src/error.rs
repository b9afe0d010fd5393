//! Error taxonomy for scorecard operations.
//!
//! Expected failures come back as values: callers get a `Result` (or an
//! [`OperationResult`] at the serialization boundary) and batch operations
//! report per-item failures through a [`BatchReport`].

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScorecardError {
    #[error("no caller identity was supplied")]
    NotAuthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),

    #[error("{failed} of {total} batch items failed")]
    PartialBatchFailure { failed: usize, total: usize },
}

impl ScorecardError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScorecardError::NotAuthenticated => "not_authenticated",
            ScorecardError::NotFound(_) => "not_found",
            ScorecardError::Validation(_) => "validation_error",
            ScorecardError::Persistence(_) => "persistence_error",
            ScorecardError::PartialBatchFailure { .. } => "partial_batch_failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScorecardError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl From<&ScorecardError> for ErrorBody {
    fn from(error: &ScorecardError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// `{success, data}` or `{success, error}` as handed to callers outside the engine.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody::from(&error)),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemError<I> {
    pub index: usize,
    pub item: I,
    pub error: ErrorBody,
}

/// Outcome of a non-atomic batch: successful items stay committed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<I> {
    pub success: bool,
    pub attempted: usize,
    pub errors: Vec<BatchItemError<I>>,
}

impl<I> BatchReport<I> {
    pub fn new(attempted: usize, mut errors: Vec<BatchItemError<I>>) -> Self {
        errors.sort_by_key(|error| error.index);
        Self {
            success: errors.is_empty(),
            attempted,
            errors,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.errors.len()
    }

    pub fn into_result(self) -> Result<usize> {
        if self.success {
            Ok(self.attempted)
        } else {
            Err(ScorecardError::PartialBatchFailure {
                failed: self.errors.len(),
                total: self.attempted,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_result_carries_error_kind() {
        let result: OperationResult<u32> =
            Err(ScorecardError::Validation("goal must be non-negative".to_string())).into();
        assert!(!result.success);
        let body = result.error.unwrap();
        assert_eq!(body.kind, "validation_error");
        assert!(body.message.contains("non-negative"));
    }

    #[test]
    fn batch_report_orders_errors_and_counts() {
        let errors = vec![
            BatchItemError {
                index: 4,
                item: "e",
                error: ErrorBody::from(&ScorecardError::NotFound("e".to_string())),
            },
            BatchItemError {
                index: 1,
                item: "b",
                error: ErrorBody::from(&ScorecardError::NotFound("b".to_string())),
            },
        ];
        let report = BatchReport::new(5, errors);
        assert!(!report.success);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.errors[0].index, 1);
        assert!(matches!(
            report.into_result(),
            Err(ScorecardError::PartialBatchFailure { failed: 2, total: 5 })
        ));
    }
}
