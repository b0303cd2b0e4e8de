use thiserror::Error;

/// Precondition failures reported by analysis queries.
///
/// Malformed cells never produce one of these; they degrade to absent values
/// during cleaning. These errors mean the table lacks something a query needs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("{operation} requires the '{column}' column")]
    MissingColumn {
        column: String,
        operation: &'static str,
    },
    #[error("aggregation '{verb}' requires a value column")]
    MissingValueColumn { verb: &'static str },
    #[error("column '{column}' is {kind} and cannot be aggregated with '{verb}'")]
    NonNumericColumn {
        column: String,
        kind: String,
        verb: &'static str,
    },
    #[error("bin width must be a positive number, got {0}")]
    InvalidBinWidth(f64),
}

impl AnalysisError {
    pub fn missing(column: impl Into<String>, operation: &'static str) -> Self {
        AnalysisError::MissingColumn {
            column: column.into(),
            operation,
        }
    }
}
