// mod.rs - Core logic module

pub mod catalog;
pub mod geodesy;
pub mod geography;
pub mod geometry;
pub mod haplostats;
pub mod molecular;
pub mod morphometrics;
pub mod pipeline;
pub mod ranksum;
pub mod scoring;

// Re-export main types for convenience
pub use catalog::{CatalogEntry, ConcordanceCatalog};
pub use geodesy::DistanceMethod;
pub use haplostats::{
    HaplotypeReport, HaplotypeStatistics, SharedBetweenSubsets, SharedHaplotypeStats,
    SubsetAlleles,
};
pub use pipeline::{
    profile_document, score_document, CancelToken, Evidence, ProfileSettings, ProfileSummary,
    ScoreSummary, SpartitionFilter,
};
pub use ranksum::{mann_whitney_u, RankSumResult};
pub use scoring::{
    conspecific_check, heterospecific_check, score_spartition, ResolvedWeights, ScoringWeights,
};
