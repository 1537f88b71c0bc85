// constraints.rs - Conspecific/heterospecific constraint groups

use crate::error::{ConcordanceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Display};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Conspecific,
    Heterospecific,
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Conspecific => write!(f, "Conspecific"),
            ConstraintKind::Heterospecific => write!(f, "Heterospecific"),
        }
    }
}

/// Constraint groups as supplied by the user (JSON or TOML)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    #[serde(default)]
    pub conspecific: Vec<Vec<String>>,
    #[serde(default)]
    pub heterospecific: Vec<Vec<String>>,
}

/// Constraint groups that passed validation against a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedConstraints {
    conspecific: Vec<Vec<String>>,
    heterospecific: Vec<Vec<String>>,
}

impl ValidatedConstraints {
    pub fn conspecific(&self) -> &[Vec<String>] {
        &self.conspecific
    }

    pub fn heterospecific(&self) -> &[Vec<String>] {
        &self.heterospecific
    }
}

impl ConstraintSet {
    /// Load constraints; `.toml` files are read as TOML, anything else as JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConcordanceError::io(path, e))?;
        let set: ConstraintSet = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        log::info!(
            "Loaded {} conspecific and {} heterospecific constraint groups from {}",
            set.conspecific.len(),
            set.heterospecific.len(),
            path.display()
        );
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.conspecific.is_empty() && self.heterospecific.is_empty()
    }

    /// Check every group against the known individuals
    pub fn validate(&self, known: &HashSet<&str>) -> Result<ValidatedConstraints> {
        validate_groups(ConstraintKind::Conspecific, &self.conspecific, known)?;
        validate_groups(ConstraintKind::Heterospecific, &self.heterospecific, known)?;
        Ok(ValidatedConstraints {
            conspecific: self.conspecific.clone(),
            heterospecific: self.heterospecific.clone(),
        })
    }
}

fn validate_groups(
    kind: ConstraintKind,
    groups: &[Vec<String>],
    known: &HashSet<&str>,
) -> Result<()> {
    for (index, group) in groups.iter().enumerate() {
        let number = index + 1;
        if group.len() < 2 {
            return Err(ConcordanceError::UndersizedGroup {
                kind,
                group: number,
                size: group.len(),
            });
        }
        let mut seen = HashSet::new();
        for individual in group {
            if !known.contains(individual.as_str()) {
                return Err(ConcordanceError::UnknownIndividual {
                    kind,
                    group: number,
                    individual: individual.clone(),
                });
            }
            if !seen.insert(individual.as_str()) {
                return Err(ConcordanceError::DuplicateIndividual {
                    kind,
                    group: number,
                    individual: individual.clone(),
                });
            }
        }
    }
    Ok(())
}
