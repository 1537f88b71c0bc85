// spart.rs - Partition document model (individuals, spartitions, concordances, scores)

use crate::error::{ConcordanceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::path::Path;
use std::str::FromStr;

/// Kind of evidence a concordance is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceType {
    Geography,
    Molecular,
    Morphology,
}

impl EvidenceType {
    pub const ALL: [EvidenceType; 3] = [
        EvidenceType::Geography,
        EvidenceType::Molecular,
        EvidenceType::Morphology,
    ];
}

impl FromStr for EvidenceType {
    type Err = ConcordanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "geography" | "geographic" => Ok(EvidenceType::Geography),
            "molecular" => Ok(EvidenceType::Molecular),
            "morphology" | "morphometrics" => Ok(EvidenceType::Morphology),
            _ => Err(ConcordanceError::InvalidInput(format!(
                "Unknown evidence type '{}'. Use: geography, molecular, morphology",
                s
            ))),
        }
    }
}

impl Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceType::Geography => write!(f, "Geography"),
            EvidenceType::Molecular => write!(f, "Molecular"),
            EvidenceType::Morphology => write!(f, "Morphology"),
        }
    }
}

/// Nature of the underlying evidence values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Continuous,
    Ordinal,
    Boolean,
}

/// How a concordance discriminates between two subsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscriminationType {
    Overlap,
    Gap,
    Boolean,
    Significance,
    Other,
}

/// Type of the support value recorded in each limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscriminationDataType {
    Continuous,
    Boolean,
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<LatLon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subset {
    pub label: String,
    pub individuals: Vec<String>,
}

/// A named evidence test with its descriptive attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceDefinition {
    pub label: String,
    pub evidence_type: EvidenceType,
    pub data_type: DataType,
    pub discrimination_type: DiscriminationType,
    pub discrimination_data_type: DiscriminationDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl ConcordanceDefinition {
    pub fn new(
        label: impl Into<String>,
        evidence_type: EvidenceType,
        data_type: DataType,
        discrimination_type: DiscriminationType,
        discrimination_data_type: DiscriminationDataType,
    ) -> Self {
        Self {
            label: label.into(),
            evidence_type,
            data_type,
            discrimination_type,
            discrimination_data_type,
            unit: None,
            threshold: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Support value of a pairwise comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Support {
    Boolean(bool),
    Continuous(f64),
}

impl Support {
    /// Booleans are themselves; numbers count as support unless exactly zero
    pub fn is_truthy(&self) -> bool {
        match *self {
            Support::Boolean(b) => b,
            Support::Continuous(v) => v != 0.0,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Support::Continuous(v) => Some(v),
            Support::Boolean(_) => None,
        }
    }
}

impl Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Boolean(b) => write!(f, "{}", b),
            Support::Continuous(v) => write!(f, "{}", v),
        }
    }
}

/// Unordered pair of subset labels, stored in sorted order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsetPair {
    pub first: String,
    pub second: String,
}

impl SubsetPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                first: a.to_string(),
                second: b.to_string(),
            }
        } else {
            Self {
                first: b.to_string(),
                second: a.to_string(),
            }
        }
    }
}

/// Result of comparing two subsets under one concordance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordantLimit {
    pub concordance: String,
    pub subset_a: String,
    pub subset_b: String,
    pub size_a: usize,
    pub size_b: usize,
    pub support: Support,
}

impl ConcordantLimit {
    pub fn pair(&self) -> SubsetPair {
        SubsetPair::new(&self.subset_a, &self.subset_b)
    }
}

/// Composite scores and constraint verdicts of one spartition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartitionScore {
    pub csu: f64,
    pub csw: f64,
    pub cswc: f64,
    pub cc: bool,
    pub hc: bool,
}

/// Definitions and limits produced by the evidence stages for one spartition.
///
/// Stages write here instead of into the document so that a failed or
/// cancelled partition leaves the document untouched.
#[derive(Debug, Clone, Default)]
pub struct ConcordanceStore {
    pub definitions: Vec<ConcordanceDefinition>,
    pub limits: Vec<ConcordantLimit>,
}

impl ConcordanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, spartition: &str, definition: ConcordanceDefinition) -> Result<()> {
        if self.definition(&definition.label).is_some() {
            return Err(ConcordanceError::DuplicateConcordance {
                spartition: spartition.to_string(),
                concordance: definition.label,
            });
        }
        self.definitions.push(definition);
        Ok(())
    }

    pub fn definition(&self, label: &str) -> Option<&ConcordanceDefinition> {
        self.definitions.iter().find(|d| d.label == label)
    }

    pub fn record(
        &mut self,
        concordance: &str,
        (subset_a, size_a): (&str, usize),
        (subset_b, size_b): (&str, usize),
        support: Support,
    ) {
        self.limits.push(ConcordantLimit {
            concordance: concordance.to_string(),
            subset_a: subset_a.to_string(),
            subset_b: subset_b.to_string(),
            size_a,
            size_b,
            support,
        });
    }

    /// Limits recorded for one concordance label
    pub fn limits_for<'a>(&'a self, concordance: &'a str) -> impl Iterator<Item = &'a ConcordantLimit> {
        self.limits.iter().filter(move |l| l.concordance == concordance)
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.limits.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spartition {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub subsets: Vec<Subset>,
    #[serde(default)]
    pub concordances: Vec<ConcordanceDefinition>,
    #[serde(default)]
    pub limits: Vec<ConcordantLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<PartitionScore>,
}

impl Spartition {
    pub fn new(label: impl Into<String>, subsets: Vec<Subset>) -> Self {
        Self {
            label: label.into(),
            remarks: None,
            subsets,
            concordances: Vec::new(),
            limits: Vec::new(),
            score: None,
        }
    }

    pub fn subset(&self, label: &str) -> Option<&Subset> {
        self.subsets.iter().find(|s| s.label == label)
    }

    pub fn definition(&self, label: &str) -> Option<&ConcordanceDefinition> {
        self.concordances.iter().find(|d| d.label == label)
    }

    /// Map individual id -> subset label
    pub fn membership(&self) -> HashMap<&str, &str> {
        let mut map = HashMap::new();
        for subset in &self.subsets {
            for individual in &subset.individuals {
                map.insert(individual.as_str(), subset.label.as_str());
            }
        }
        map
    }

    /// Move staged definitions and limits into the spartition.
    ///
    /// Everything is checked before anything is appended.
    pub fn commit(&mut self, store: ConcordanceStore) -> Result<()> {
        for definition in &store.definitions {
            if self.definition(&definition.label).is_some() {
                return Err(ConcordanceError::DuplicateConcordance {
                    spartition: self.label.clone(),
                    concordance: definition.label.clone(),
                });
            }
        }
        let mut seen = HashSet::new();
        for limit in &store.limits {
            if !seen.insert((limit.concordance.as_str(), limit.pair())) {
                return Err(ConcordanceError::InvalidDocument(format!(
                    "concordance '{}' compares subsets '{}' and '{}' twice in spartition '{}'",
                    limit.concordance, limit.subset_a, limit.subset_b, self.label
                )));
            }
            if store.definition(&limit.concordance).is_none() {
                return Err(ConcordanceError::InvalidDocument(format!(
                    "limit for undefined concordance '{}' in spartition '{}'",
                    limit.concordance, self.label
                )));
            }
            for subset in [&limit.subset_a, &limit.subset_b] {
                if self.subset(subset).is_none() {
                    return Err(ConcordanceError::UnknownSubset {
                        spartition: self.label.clone(),
                        subset: subset.clone(),
                    });
                }
            }
        }
        self.concordances.extend(store.definitions);
        self.limits.extend(store.limits);
        Ok(())
    }
}

/// A whole partition/evidence document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpartDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub individuals: Vec<Individual>,
    pub spartitions: Vec<Spartition>,
}

impl SpartDocument {
    /// Load and validate a document from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConcordanceError::io(path, e))?;
        let document = Self::from_json(&content)?;
        log::info!(
            "Loaded document {}: {} individuals, {} spartitions",
            path.display(),
            document.individuals.len(),
            document.spartitions.len()
        );
        Ok(document)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let document: SpartDocument = serde_json::from_str(content)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn individual_ids(&self) -> HashSet<&str> {
        self.individuals.iter().map(|i| i.id.as_str()).collect()
    }

    /// Coordinates carried by the document itself
    pub fn coordinates(&self) -> HashMap<String, LatLon> {
        self.individuals
            .iter()
            .filter_map(|i| i.coordinates.map(|c| (i.id.clone(), c)))
            .collect()
    }

    pub fn spartition(&self, label: &str) -> Option<&Spartition> {
        self.spartitions.iter().find(|s| s.label == label)
    }

    /// Check the structural invariants of every spartition
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for individual in &self.individuals {
            if !ids.insert(individual.id.as_str()) {
                return Err(ConcordanceError::InvalidDocument(format!(
                    "individual '{}' is listed twice",
                    individual.id
                )));
            }
        }

        let mut labels = HashSet::new();
        for spartition in &self.spartitions {
            if !labels.insert(spartition.label.as_str()) {
                return Err(ConcordanceError::InvalidDocument(format!(
                    "spartition '{}' is listed twice",
                    spartition.label
                )));
            }

            let mut subset_labels = HashSet::new();
            let mut assigned = HashSet::new();
            for subset in &spartition.subsets {
                if !subset_labels.insert(subset.label.as_str()) {
                    return Err(ConcordanceError::InvalidDocument(format!(
                        "subset '{}' appears twice in spartition '{}'",
                        subset.label, spartition.label
                    )));
                }
                if subset.individuals.is_empty() {
                    return Err(ConcordanceError::InvalidDocument(format!(
                        "subset '{}' of spartition '{}' is empty",
                        subset.label, spartition.label
                    )));
                }
                for individual in &subset.individuals {
                    if !ids.contains(individual.as_str()) {
                        return Err(ConcordanceError::InvalidDocument(format!(
                            "subset '{}' of spartition '{}' references unknown individual '{}'",
                            subset.label, spartition.label, individual
                        )));
                    }
                    if !assigned.insert(individual.as_str()) {
                        return Err(ConcordanceError::InvalidDocument(format!(
                            "individual '{}' belongs to more than one subset of spartition '{}'",
                            individual, spartition.label
                        )));
                    }
                }
            }

            let mut concordance_labels = HashSet::new();
            for definition in &spartition.concordances {
                if !concordance_labels.insert(definition.label.as_str()) {
                    return Err(ConcordanceError::DuplicateConcordance {
                        spartition: spartition.label.clone(),
                        concordance: definition.label.clone(),
                    });
                }
            }
            let mut compared = HashSet::new();
            for limit in &spartition.limits {
                if !compared.insert((limit.concordance.as_str(), limit.pair())) {
                    return Err(ConcordanceError::InvalidDocument(format!(
                        "concordance '{}' compares subsets '{}' and '{}' twice in spartition '{}'",
                        limit.concordance, limit.subset_a, limit.subset_b, spartition.label
                    )));
                }
                if limit.subset_a == limit.subset_b {
                    return Err(ConcordanceError::InvalidDocument(format!(
                        "limit for '{}' compares subset '{}' with itself in spartition '{}'",
                        limit.concordance, limit.subset_a, spartition.label
                    )));
                }
                if !concordance_labels.contains(limit.concordance.as_str()) {
                    return Err(ConcordanceError::InvalidDocument(format!(
                        "limit references undefined concordance '{}' in spartition '{}'",
                        limit.concordance, spartition.label
                    )));
                }
                for subset in [&limit.subset_a, &limit.subset_b] {
                    if !subset_labels.contains(subset.as_str()) {
                        return Err(ConcordanceError::UnknownSubset {
                            spartition: spartition.label.clone(),
                            subset: subset.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
