// molecular.rs - Molecular concordances (shared haplotypes and FFRs)

use crate::core::haplostats::{HaplotypeStatistics, SharedBetweenSubsets, SubsetAlleles};
use crate::core::pipeline::CancelToken;
use crate::data::{
    group_by_subset, AlleleSequence, ConcordanceDefinition, ConcordanceStore, DataType,
    DiscriminationDataType, DiscriminationType, EvidenceType, Spartition, Support,
};
use crate::error::{ConcordanceError, Result};
use std::collections::{HashMap, HashSet};

pub const HAPLOTYPES_SHARED: &str = "haplotypes shared between subsets";
pub const FFRS_SHARED: &str = "FFRs shared between subsets";

/// An allele id is the individual id followed by exactly two characters
pub fn allele_owner(id: &str) -> Option<&str> {
    let length = id.chars().count();
    if length <= 2 {
        return None;
    }
    id.char_indices().nth(length - 2).map(|(cut, _)| &id[..cut])
}

/// Allele payloads per individual, in sequence order
pub fn alleles_by_individual<'a>(
    individuals: impl IntoIterator<Item = &'a str>,
    sequences: &[AlleleSequence],
) -> HashMap<String, Vec<String>> {
    let known: HashSet<&str> = individuals.into_iter().collect();
    let mut alleles: HashMap<String, Vec<String>> = HashMap::new();

    for sequence in sequences {
        let Some(owner) = allele_owner(&sequence.id) else {
            continue;
        };
        if known.contains(owner) {
            alleles
                .entry(owner.to_string())
                .or_default()
                .push(sequence.payload.clone());
        }
    }
    alleles
}

/// Concordance label, suffixed with the sequence source when there is one
pub fn concordance_label(base: &str, source: Option<&str>) -> String {
    match source {
        Some(source) => format!("{} [{}]", base, source),
        None => base.to_string(),
    }
}

fn record_shared(
    spartition: &Spartition,
    label: &str,
    shared: &[SharedBetweenSubsets],
    sizes: &HashMap<&str, usize>,
    expected_pairs: usize,
    store: &mut ConcordanceStore,
) -> Result<()> {
    if shared.len() != expected_pairs {
        return Err(ConcordanceError::Collaborator(format!(
            "'{}' in spartition '{}': expected {} subset pairs, got {}",
            label,
            spartition.label,
            expected_pairs,
            shared.len()
        )));
    }
    for entry in shared {
        let size = |subset: &str| {
            sizes.get(subset).copied().ok_or_else(|| {
                ConcordanceError::Collaborator(format!(
                    "unknown subset '{}' reported for spartition '{}'",
                    subset, spartition.label
                ))
            })
        };
        let a = (entry.subset_a.as_str(), size(&entry.subset_a)?);
        let b = (entry.subset_b.as_str(), size(&entry.subset_b)?);
        store.record(label, a, b, Support::Boolean(!entry.common.is_empty()));
    }
    Ok(())
}

/// Record whether subset pairs share haplotypes and fields for recombination.
///
/// Only subsets with at least one allele take part.
pub fn process_haplostats(
    spartition: &Spartition,
    alleles: &HashMap<String, Vec<String>>,
    source: Option<&str>,
    stats: &dyn HaplotypeStatistics,
    cancel: &CancelToken,
    store: &mut ConcordanceStore,
) -> Result<()> {
    let grouped = group_by_subset(spartition, alleles);
    let sizes: HashMap<&str, usize> = grouped
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| (s.label, s.available()))
        .collect();
    let submitted: Vec<SubsetAlleles> = grouped
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| SubsetAlleles {
            subset: s.label.to_string(),
            individuals: s.iter_values().cloned().collect(),
        })
        .collect();

    let haplotypes_label = concordance_label(HAPLOTYPES_SHARED, source);
    let ffrs_label = concordance_label(FFRS_SHARED, source);
    for label in [&haplotypes_label, &ffrs_label] {
        store.define(
            &spartition.label,
            ConcordanceDefinition::new(
                label.as_str(),
                EvidenceType::Molecular,
                DataType::Ordinal,
                DiscriminationType::Boolean,
                DiscriminationDataType::Boolean,
            ),
        )?;
    }

    let report = stats.compute(&submitted, cancel)?;
    let expected_pairs = submitted.len() * submitted.len().saturating_sub(1) / 2;
    record_shared(
        spartition,
        &haplotypes_label,
        &report.haplotypes_shared,
        &sizes,
        expected_pairs,
        store,
    )?;
    record_shared(
        spartition,
        &ffrs_label,
        &report.ffrs_shared,
        &sizes,
        expected_pairs,
        store,
    )?;

    log::debug!(
        "Spartition '{}': {} statistics over {} subsets with sequences",
        spartition.label,
        stats.name(),
        submitted.len()
    );
    Ok(())
}
