// scoring.rs - Composite concordance scores and constraint verdicts

use crate::core::catalog::ConcordanceCatalog;
use crate::data::{
    ConcordantLimit, EvidenceType, PartitionScore, Spartition, SubsetPair, ValidatedConstraints,
};
use crate::error::{ConcordanceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Weight of any concordance or evidence type not listed explicitly
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// User-supplied weights, keyed by concordance label and evidence type name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default)]
    pub concordances: BTreeMap<String, f64>,
    #[serde(default)]
    pub evidence_types: BTreeMap<String, f64>,
    #[serde(default)]
    pub normalize: BTreeMap<String, bool>,
}

/// Weights with every default filled in, checked against a catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWeights {
    concordances: HashMap<String, f64>,
    evidence_types: HashMap<EvidenceType, f64>,
    normalize: HashMap<EvidenceType, bool>,
}

fn check_weight(name: &str, weight: f64) -> Result<f64> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(weight)
    } else {
        Err(ConcordanceError::InvalidInput(format!(
            "weight for '{}' must be a non-negative number, got {}",
            name, weight
        )))
    }
}

impl ScoringWeights {
    pub fn resolve(&self, catalog: &ConcordanceCatalog) -> Result<ResolvedWeights> {
        for (label, &weight) in &self.concordances {
            if !catalog.contains(label) {
                return Err(ConcordanceError::UnknownConcordance(label.clone()));
            }
            check_weight(label, weight)?;
        }
        let concordances = catalog
            .iter()
            .map(|(label, _)| {
                let weight = self.concordances.get(label).copied().unwrap_or(DEFAULT_WEIGHT);
                (label.to_string(), weight)
            })
            .collect();

        let mut evidence_types: HashMap<EvidenceType, f64> =
            EvidenceType::ALL.iter().map(|&t| (t, DEFAULT_WEIGHT)).collect();
        for (name, &weight) in &self.evidence_types {
            let evidence_type: EvidenceType = name.parse()?;
            evidence_types.insert(evidence_type, check_weight(name, weight)?);
        }

        let mut normalize: HashMap<EvidenceType, bool> =
            EvidenceType::ALL.iter().map(|&t| (t, false)).collect();
        for (name, &flag) in &self.normalize {
            normalize.insert(name.parse()?, flag);
        }

        Ok(ResolvedWeights {
            concordances,
            evidence_types,
            normalize,
        })
    }
}

impl ResolvedWeights {
    pub fn concordance(&self, label: &str) -> f64 {
        self.concordances.get(label).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn evidence_type(&self, evidence_type: EvidenceType) -> f64 {
        self.evidence_types
            .get(&evidence_type)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn normalizes(&self, evidence_type: EvidenceType) -> bool {
        self.normalize.get(&evidence_type).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PairAccumulator {
    support_total: f64,
    evidence_count: usize,
}

/// Final weight of every enabled concordance of a spartition
fn enabled_weights(spartition: &Spartition, weights: &ResolvedWeights) -> HashMap<String, f64> {
    let enabled: Vec<(&str, EvidenceType, f64)> = spartition
        .concordances
        .iter()
        .map(|d| (d.label.as_str(), d.evidence_type, weights.concordance(&d.label)))
        .filter(|(_, _, w)| *w > 0.0)
        .collect();

    let mut per_type: HashMap<EvidenceType, f64> =
        EvidenceType::ALL.iter().map(|&t| (t, 0.0)).collect();
    for (_, evidence_type, weight) in &enabled {
        *per_type.entry(*evidence_type).or_insert(0.0) += weight;
    }

    enabled
        .into_iter()
        .map(|(label, evidence_type, weight)| {
            let mut adjusted = weight * weights.evidence_type(evidence_type);
            if weights.normalizes(evidence_type) {
                adjusted /= per_type[&evidence_type];
            }
            (label.to_string(), adjusted)
        })
        .collect()
}

fn all_pairs(spartition: &Spartition) -> BTreeMap<SubsetPair, PairAccumulator> {
    let mut pairs = BTreeMap::new();
    for (i, a) in spartition.subsets.iter().enumerate() {
        for b in &spartition.subsets[i + 1..] {
            pairs.insert(SubsetPair::new(&a.label, &b.label), PairAccumulator::default());
        }
    }
    pairs
}

fn contribution(limit: &ConcordantLimit, final_weight: f64) -> f64 {
    if limit.support.is_truthy() {
        final_weight
    } else {
        0.0
    }
}

/// Score one spartition; `None` when it has fewer than two subsets
pub fn score_spartition(
    spartition: &Spartition,
    weights: &ResolvedWeights,
    constraints: &ValidatedConstraints,
) -> Option<PartitionScore> {
    let subsets = spartition.subsets.len();
    if subsets < 2 {
        return None;
    }
    let total_pairs = (subsets * (subsets - 1) / 2) as f64;

    // Frozen before the limits are visited
    let final_weights = enabled_weights(spartition, weights);
    let enabled = final_weights.len();

    let mut pairs = all_pairs(spartition);
    let mut csu = 0.0;
    for limit in &spartition.limits {
        let Some(&final_weight) = final_weights.get(&limit.concordance) else {
            continue;
        };
        let Some(accumulator) = pairs.get_mut(&limit.pair()) else {
            continue;
        };
        let value = contribution(limit, final_weight);
        accumulator.support_total += value;
        accumulator.evidence_count += 1;
        csu += value;
    }

    let cswc = if enabled == 0 {
        0.0
    } else {
        pairs
            .values()
            .map(|p| p.support_total * (p.evidence_count as f64 / enabled as f64))
            .sum::<f64>()
            / total_pairs
    };

    Some(PartitionScore {
        csu,
        csw: csu / total_pairs,
        cswc,
        cc: conspecific_check(spartition, constraints.conspecific()),
        hc: heterospecific_check(spartition, constraints.heterospecific()),
    })
}

/// Subset of every group member, `None` for members outside the spartition
fn group_subsets<'a>(
    membership: &HashMap<&str, &'a str>,
    group: &[String],
) -> Vec<Option<&'a str>> {
    group
        .iter()
        .map(|member| membership.get(member.as_str()).copied())
        .collect()
}

/// True when no group is split: a member placed in a subset needs every
/// other member of its group in that same subset.
pub fn conspecific_check(spartition: &Spartition, groups: &[Vec<String>]) -> bool {
    let membership = spartition.membership();
    groups.iter().all(|group| {
        let placed = group_subsets(&membership, group);
        match placed.iter().flatten().next() {
            None => true,
            Some(first) => placed.iter().all(|s| *s == Some(*first)),
        }
    })
}

/// True when no two members of any group share a subset
pub fn heterospecific_check(spartition: &Spartition, groups: &[Vec<String>]) -> bool {
    let membership = spartition.membership();
    groups.iter().all(|group| {
        let placed: Vec<&str> = group_subsets(&membership, group).into_iter().flatten().collect();
        placed
            .iter()
            .enumerate()
            .all(|(i, s)| !placed[i + 1..].contains(s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spart::tests::sample_document;
    use crate::data::{
        ConcordanceDefinition, ConcordanceStore, ConstraintSet, DataType, DiscriminationDataType,
        DiscriminationType, SpartDocument, Support,
    };

    const EPS: f64 = 1e-12;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn definition(label: &str, evidence_type: EvidenceType) -> ConcordanceDefinition {
        ConcordanceDefinition::new(
            label,
            evidence_type,
            DataType::Continuous,
            DiscriminationType::Boolean,
            DiscriminationDataType::Boolean,
        )
    }

    /// Spartition "three" with a geographic and a molecular concordance
    fn scored_document(geo: [bool; 3], mol: [bool; 3]) -> SpartDocument {
        let mut document = sample_document();
        let mut store = ConcordanceStore::new();
        store.define("three", definition("geo", EvidenceType::Geography)).unwrap();
        store.define("three", definition("mol", EvidenceType::Molecular)).unwrap();
        let pairs = [("1", "2"), ("1", "3"), ("2", "3")];
        for ((a, b), (g, m)) in pairs.into_iter().zip(geo.into_iter().zip(mol)) {
            store.record("geo", (a, 2), (b, 2), Support::Boolean(g));
            store.record("mol", (b, 2), (a, 2), Support::Boolean(m));
        }
        document.spartitions[1].commit(store).unwrap();
        document
    }

    fn no_constraints() -> ValidatedConstraints {
        ValidatedConstraints::default()
    }

    fn resolve(document: &SpartDocument, weights: &ScoringWeights) -> ResolvedWeights {
        let catalog = ConcordanceCatalog::from_document(document).unwrap();
        weights.resolve(&catalog).unwrap()
    }

    #[test]
    fn test_scores_with_default_weights() {
        let document = scored_document([true, false, true], [true, false, false]);
        let weights = resolve(&document, &ScoringWeights::default());
        let score = score_spartition(&document.spartitions[1], &weights, &no_constraints()).unwrap();

        assert!(approx(score.csu, 3.0));
        assert!(approx(score.csw, 1.0));
        // (1,2): 2 * 2/2 ; (1,3): 0 ; (2,3): 1 * 2/2
        assert!(approx(score.cswc, 1.0));
        assert!(score.cc && score.hc);
    }

    #[test]
    fn test_all_false_scores_zero() {
        let document = scored_document([false; 3], [false; 3]);
        let weights = resolve(&document, &ScoringWeights::default());
        let score = score_spartition(&document.spartitions[1], &weights, &no_constraints()).unwrap();
        assert_eq!(score.csu, 0.0);
        assert_eq!(score.csw, 0.0);
        assert_eq!(score.cswc, 0.0);
    }

    #[test]
    fn test_zero_weight_disables_concordance() {
        let document = scored_document([true; 3], [true; 3]);
        let mut weights = ScoringWeights::default();
        weights.concordances.insert("mol".to_string(), 0.0);
        let resolved = resolve(&document, &weights);
        let score = score_spartition(&document.spartitions[1], &resolved, &no_constraints()).unwrap();
        assert!(approx(score.csu, 3.0));
        // Each pair: 1 * (1/1)
        assert!(approx(score.cswc, 1.0));
    }

    #[test]
    fn test_type_weights_and_normalization() {
        let mut document = scored_document([true; 3], [false; 3]);
        let mut store = ConcordanceStore::new();
        store.define("three", definition("geo2", EvidenceType::Geography)).unwrap();
        store.record("geo2", ("1", 2), ("2", 2), Support::Continuous(4.5));
        document.spartitions[1].commit(store).unwrap();

        let mut weights = ScoringWeights::default();
        weights.evidence_types.insert("geography".to_string(), 2.0);
        let score = score_spartition(
            &document.spartitions[1],
            &resolve(&document, &weights),
            &no_constraints(),
        )
        .unwrap();
        // 4 truthy geographic limits, each weighted 1 * 2
        assert!(approx(score.csu, 8.0));

        weights.normalize.insert("Geography".to_string(), true);
        let score = score_spartition(
            &document.spartitions[1],
            &resolve(&document, &weights),
            &no_constraints(),
        )
        .unwrap();
        // Two enabled geographic definitions share the type weight
        assert!(approx(score.csu, 4.0));
        assert!(approx(score.csw, 4.0 / 3.0));
    }

    #[test]
    fn test_unknown_concordance_weight_rejected() {
        let document = scored_document([true; 3], [true; 3]);
        let catalog = ConcordanceCatalog::from_document(&document).unwrap();
        let mut weights = ScoringWeights::default();
        weights.concordances.insert("nonexistent".to_string(), 1.0);
        assert!(matches!(
            weights.resolve(&catalog),
            Err(ConcordanceError::UnknownConcordance(label)) if label == "nonexistent"
        ));

        let mut weights = ScoringWeights::default();
        weights.concordances.insert("geo".to_string(), -1.0);
        assert!(matches!(
            weights.resolve(&catalog),
            Err(ConcordanceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_single_subset_is_not_scored() {
        let mut document = sample_document();
        document.spartitions[0].subsets.truncate(1);
        let weights = resolve(&document, &ScoringWeights::default());
        assert!(score_spartition(&document.spartitions[0], &weights, &no_constraints()).is_none());
    }

    #[test]
    fn test_no_enabled_definitions() {
        let document = sample_document();
        let weights = resolve(&document, &ScoringWeights::default());
        let score = score_spartition(&document.spartitions[0], &weights, &no_constraints()).unwrap();
        assert_eq!(score.csu, 0.0);
        assert_eq!(score.cswc, 0.0);
    }

    #[test]
    fn test_conspecific_check() {
        let document = sample_document();
        let group = vec![vec!["a".to_string(), "b".to_string()]];
        // "two": a, b in subset 1 with c
        assert!(conspecific_check(&document.spartitions[0], &group));
        let split = vec![vec!["a".to_string(), "d".to_string()]];
        assert!(!conspecific_check(&document.spartitions[0], &split));
    }

    #[test]
    fn test_heterospecific_check() {
        let document = sample_document();
        let apart = vec![vec!["a".to_string(), "d".to_string()]];
        assert!(heterospecific_check(&document.spartitions[0], &apart));
        let together = vec![vec!["a".to_string(), "b".to_string()]];
        assert!(!heterospecific_check(&document.spartitions[0], &together));
    }

    #[test]
    fn test_constraints_flow_into_score() {
        let document = scored_document([true; 3], [true; 3]);
        let set = ConstraintSet {
            conspecific: vec![vec!["a".to_string(), "c".to_string()]],
            heterospecific: vec![vec!["a".to_string(), "e".to_string()]],
        };
        let constraints = set.validate(&document.individual_ids()).unwrap();
        let weights = resolve(&document, &ScoringWeights::default());
        // "three": a in 1, c in 2, e in 3
        let score = score_spartition(&document.spartitions[1], &weights, &constraints).unwrap();
        assert!(!score.cc);
        assert!(score.hc);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let document = scored_document([true, false, true], [false, true, false]);
        let weights = resolve(&document, &ScoringWeights::default());
        let first = score_spartition(&document.spartitions[1], &weights, &no_constraints());
        let second = score_spartition(&document.spartitions[1], &weights, &no_constraints());
        assert_eq!(first, second);
    }
}
