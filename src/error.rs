// error.rs - Error types for concordance profiling and scoring

use crate::data::constraints::ConstraintKind;
use thiserror::Error;

/// Errors raised by the concordance engine
#[derive(Error, Debug)]
pub enum ConcordanceError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tabular input error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid FASTA record in '{path}': {message}")]
    Fasta { path: String, message: String },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Structural problem in the partition document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Malformed evidence or configuration input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A statistic needs at least one observation on both sides
    #[error("No evidence for '{statistic}' in subset '{subset}' of spartition '{spartition}'")]
    EmptyEvidence {
        spartition: String,
        statistic: String,
        subset: String,
    },

    #[error("Concordance '{concordance}' is already defined in spartition '{spartition}'")]
    DuplicateConcordance {
        spartition: String,
        concordance: String,
    },

    #[error("Subset '{subset}' is not part of spartition '{spartition}'")]
    UnknownSubset { spartition: String, subset: String },

    #[error("Concordance '{0}' is not defined in any spartition")]
    UnknownConcordance(String),

    #[error("Concordance '{0}' is defined with different attributes across spartitions")]
    ConflictingDefinition(String),

    #[error("{kind} group {group} references unknown individual '{individual}'")]
    UnknownIndividual {
        kind: ConstraintKind,
        group: usize,
        individual: String,
    },

    #[error("{kind} group {group} lists individual '{individual}' more than once")]
    DuplicateIndividual {
        kind: ConstraintKind,
        group: usize,
        individual: String,
    },

    #[error("{kind} group {group} has {size} member(s), at least 2 are required")]
    UndersizedGroup {
        kind: ConstraintKind,
        group: usize,
        size: usize,
    },

    /// The haplotype statistics backend failed
    #[error("Haplotype statistics failed: {0}")]
    Collaborator(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ConcordanceError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        ConcordanceError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ConcordanceError>;
