use crate::schema::CanonicalConcept;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error("Input table has no rows")]
    EmptyInput,

    #[error("Input table has rows but no columns")]
    NoColumns,

    #[error("Invalid similarity threshold {0}: must be greater than 0.0 and at most 1.0")]
    InvalidThreshold(f64),

    #[error("Invalid total tolerance {0}: must be a finite, non-negative amount")]
    InvalidTolerance(f64),

    #[error("Concept {0} has no usable synonym patterns")]
    EmptySynonyms(CanonicalConcept),

    #[error("Concept {0} appears more than once in the catalogue")]
    DuplicateConcept(CanonicalConcept),

    #[error("Period row {row} is out of range: table has {rows} data rows")]
    InvalidPeriodRow { row: usize, rows: usize },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconciliationError>;
