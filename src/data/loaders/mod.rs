// mod.rs - Evidence file loaders

pub mod fasta;
pub mod tabular;

pub use fasta::{read_fasta, AlleleSequence, SequenceSource};
pub use tabular::{read_coordinates, read_morphometrics, MorphometricTable, TraitMeasurements};
