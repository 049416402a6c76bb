//! Domain errors raised while loading and cleaning a layoffs table.
//!
//! Setup errors (bad headers, non-numeric cells, broken rule files) stop the
//! pipeline before any cleaning happens. `InvalidDate` is raised by the
//! Standardizer only when the date policy is `abort`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Required column '{0}' is missing from the input header")]
    MissingColumn(&'static str),
    #[error("Unexpected column '{header}' at position {position}")]
    UnexpectedColumn { header: String, position: usize },
    #[error("Column '{0}' appears more than once in the input header")]
    DuplicateColumn(&'static str),
    #[error("Row {row} column '{column}': '{value}' is not a valid number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("Row {row}: '{value}' does not match any accepted date format ({formats})")]
    InvalidDate {
        row: usize,
        value: String,
        formats: String,
    },
    #[error("Invalid {table} rule '{pattern}': {reason}")]
    InvalidRule {
        table: &'static str,
        pattern: String,
        reason: String,
    },
}
