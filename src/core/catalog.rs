// catalog.rs - Concordance definitions across all spartitions of a document

use crate::data::{ConcordanceDefinition, EvidenceType, SpartDocument};
use crate::error::{ConcordanceError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub definition: ConcordanceDefinition,
    /// Spartitions defining this concordance, in document order
    pub spartitions: Vec<String>,
    pub limits: usize,
}

/// Every concordance label of a document with its (shared) definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcordanceCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl ConcordanceCatalog {
    /// Collect definitions; a label defined with different attributes in two
    /// spartitions is rejected.
    pub fn from_document(document: &SpartDocument) -> Result<Self> {
        let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();
        for spartition in &document.spartitions {
            for definition in &spartition.concordances {
                let limits = spartition
                    .limits
                    .iter()
                    .filter(|l| l.concordance == definition.label)
                    .count();
                match entries.get_mut(&definition.label) {
                    Some(entry) => {
                        if entry.definition != *definition {
                            return Err(ConcordanceError::ConflictingDefinition(
                                definition.label.clone(),
                            ));
                        }
                        entry.spartitions.push(spartition.label.clone());
                        entry.limits += limits;
                    }
                    None => {
                        entries.insert(
                            definition.label.clone(),
                            CatalogEntry {
                                definition: definition.clone(),
                                spartitions: vec![spartition.label.clone()],
                                limits,
                            },
                        );
                    }
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, label: &str) -> Option<&CatalogEntry> {
        self.entries.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by label
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn labels_of_type(&self, evidence_type: EvidenceType) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, e)| e.definition.evidence_type == evidence_type)
            .map(|(k, _)| k.as_str())
    }
}
