// fasta.rs - Allele sequence loading

use crate::error::{ConcordanceError, Result};
use bio::io::fasta;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One allele sequence: identifier plus payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleSequence {
    pub id: String,
    pub payload: String,
}

impl AlleleSequence {
    pub fn new(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }
}

/// Sequences of one input file, labelled by the file stem
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSource {
    pub label: String,
    pub sequences: Vec<AlleleSequence>,
}

/// Read every record of a FASTA file
pub fn read_fasta(path: &Path) -> Result<SequenceSource> {
    let file = File::open(path).map_err(|e| ConcordanceError::io(path, e))?;
    let reader = fasta::Reader::new(BufReader::new(file));

    let mut sequences = Vec::new();
    for record_result in reader.records() {
        let record = record_result.map_err(|e| ConcordanceError::Fasta {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let payload = String::from_utf8_lossy(record.seq()).into_owned();
        sequences.push(AlleleSequence::new(record.id(), payload));
    }

    let label = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sequences")
        .to_string();

    log::info!(
        "Loaded {} allele sequences from {}",
        sequences.len(),
        path.display()
    );
    Ok(SequenceSource { label, sequences })
}
