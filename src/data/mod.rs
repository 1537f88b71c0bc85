// mod.rs - Data structures module

pub mod constraints;
pub mod evidence;
pub mod loaders;
pub mod spart;

// Re-export main types for convenience
pub use constraints::{ConstraintKind, ConstraintSet, ValidatedConstraints};
pub use evidence::{group_by_subset, SubsetEvidence};
pub use loaders::{
    read_coordinates, read_fasta, read_morphometrics, AlleleSequence, MorphometricTable,
    SequenceSource, TraitMeasurements,
};
pub use spart::{
    ConcordanceDefinition, ConcordanceStore, ConcordantLimit, DataType, DiscriminationDataType,
    DiscriminationType, EvidenceType, Individual, LatLon, PartitionScore, SpartDocument,
    Spartition, Subset, SubsetPair, Support,
};
