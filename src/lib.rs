// lib.rs - concordist library root

//! # concordist - Concordance profiling and scoring of species partitions
//!
//! This library measures how well independent lines of evidence agree with
//! candidate partitions of individuals into species-level subsets, and turns
//! that agreement into composite scores per partition.
//!
//! ## Features
//!
//! - **Geography**: convex-hull overlap and co-occurrence distance between subsets
//! - **Molecular**: haplotypes and fields for recombination shared between subsets
//! - **Morphometrics**: Mann-Whitney U tests and range gaps per trait
//! - **Scoring**: CSU, CSW and CSWC scores with configurable weights
//! - **Constraints**: conspecific and heterospecific checks per partition
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use concordist::prelude::*;
//! use std::path::Path;
//!
//! let mut document = SpartDocument::from_file(Path::new("frogs.json"))?;
//! let evidence = Evidence {
//!     coordinates: Some(read_coordinates(Path::new("coordinates.tsv"))?),
//!     ..Evidence::default()
//! };
//! let cancel = CancelToken::new();
//!
//! profile_document(
//!     &mut document,
//!     &evidence,
//!     &ProfileSettings::default(),
//!     &SpartitionFilter::default(),
//!     &SharedHaplotypeStats,
//!     &cancel,
//! )?;
//! score_document(
//!     &mut document,
//!     &ScoringWeights::default(),
//!     &ConstraintSet::default(),
//!     &SpartitionFilter::default(),
//!     &cancel,
//! )?;
//! # Ok::<(), concordist::error::ConcordanceError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod inspector;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{profile_document, score_document, score_spartition};
    pub use crate::core::{
        CancelToken, DistanceMethod, Evidence, HaplotypeStatistics, ProfileSettings,
        ScoringWeights, SharedHaplotypeStats, SpartitionFilter,
    };
    pub use crate::data::{read_coordinates, read_fasta, read_morphometrics};
    pub use crate::data::{ConstraintSet, PartitionScore, SpartDocument, Spartition, Support};
    pub use crate::error::ConcordanceError;
    pub use crate::output::{write_document, write_scores, ScoreFormat};
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use crate::core::{CancelToken, Evidence, ProfileSettings, ScoringWeights};
pub use data::{ConcordanceDefinition, ConcordantLimit, SpartDocument, Spartition};
pub use error::{ConcordanceError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "concordist v{} - Concordance profiling and scoring of species partitions",
        VERSION
    )
}
