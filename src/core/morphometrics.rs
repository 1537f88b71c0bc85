// morphometrics.rs - Morphometric concordances (rank-sum test and range gap per trait)

use crate::core::ranksum::mann_whitney_u;
use crate::data::{
    group_by_subset, ConcordanceDefinition, ConcordanceStore, DataType, DiscriminationDataType,
    DiscriminationType, EvidenceType, MorphometricTable, Spartition, Support, TraitMeasurements,
};
use crate::error::Result;

/// Fewest measurements a subset needs before it is compared
pub const MIN_MEASUREMENTS: usize = 2;

/// Concordance labels derived from one trait name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitLabels {
    pub u: String,
    pub p_value: String,
    pub corrected_p_value: String,
    pub range_gap: String,
}

impl TraitLabels {
    pub fn new(trait_name: &str) -> Self {
        Self {
            u: format!("{} U", trait_name),
            p_value: format!("{} p-value", trait_name),
            corrected_p_value: format!("{} corrected p-value", trait_name),
            range_gap: format!("{} range gap", trait_name),
        }
    }
}

/// Signed distance between two value ranges; negative when they overlap
pub fn range_gap(a: &[f64], b: &[f64]) -> Option<f64> {
    let (min_a, max_a) = min_max(a)?;
    let (min_b, max_b) = min_max(b)?;
    Some(min_a.max(min_b) - max_a.min(max_b))
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Number of pairwise comparisons among `subsets` subsets
pub fn bonferroni_factor(subsets: usize) -> f64 {
    (subsets * subsets.saturating_sub(1) / 2) as f64
}

fn define_trait(
    spartition: &Spartition,
    labels: &TraitLabels,
    significance_threshold: f64,
    store: &mut ConcordanceStore,
) -> Result<()> {
    let definition = |label: &str, discrimination: DiscriminationType| {
        ConcordanceDefinition::new(
            label,
            EvidenceType::Morphology,
            DataType::Continuous,
            discrimination,
            DiscriminationDataType::Continuous,
        )
    };
    store.define(&spartition.label, definition(&labels.u, DiscriminationType::Other))?;
    store.define(
        &spartition.label,
        definition(&labels.p_value, DiscriminationType::Significance)
            .with_threshold(significance_threshold),
    )?;
    store.define(
        &spartition.label,
        definition(&labels.corrected_p_value, DiscriminationType::Significance)
            .with_threshold(significance_threshold),
    )?;
    store.define(&spartition.label, definition(&labels.range_gap, DiscriminationType::Gap))?;
    Ok(())
}

fn process_trait(
    spartition: &Spartition,
    measurements: &TraitMeasurements,
    significance_threshold: f64,
    store: &mut ConcordanceStore,
) -> Result<usize> {
    let labels = TraitLabels::new(&measurements.name);
    define_trait(spartition, &labels, significance_threshold, store)?;

    let grouped = group_by_subset(spartition, &measurements.values);
    let values: Vec<Vec<f64>> = grouped
        .iter()
        .map(|s| s.iter_values().copied().collect())
        .collect();
    let factor = bonferroni_factor(values.iter().filter(|v| !v.is_empty()).count());

    let mut compared = 0;
    for i in 0..grouped.len() {
        for j in (i + 1)..grouped.len() {
            if values[i].len() < MIN_MEASUREMENTS || values[j].len() < MIN_MEASUREMENTS {
                continue;
            }
            let (Some(test), Some(gap)) = (
                mann_whitney_u(&values[i], &values[j]),
                range_gap(&values[i], &values[j]),
            ) else {
                continue;
            };

            let a = (grouped[i].label, values[i].len());
            let b = (grouped[j].label, values[j].len());
            store.record(&labels.u, a, b, Support::Continuous(test.u));
            store.record(&labels.p_value, a, b, Support::Continuous(test.p_value));
            store.record(
                &labels.corrected_p_value,
                a,
                b,
                Support::Continuous(test.p_value * factor),
            );
            store.record(&labels.range_gap, a, b, Support::Continuous(gap));
            compared += 1;
        }
    }
    Ok(compared)
}

/// Compare every subset pair on every trait of the table
pub fn process_morphometrics(
    spartition: &Spartition,
    table: &MorphometricTable,
    significance_threshold: f64,
    store: &mut ConcordanceStore,
) -> Result<()> {
    for measurements in &table.traits {
        let compared = process_trait(spartition, measurements, significance_threshold, store)?;
        log::debug!(
            "Spartition '{}': trait '{}' compared on {} subset pairs",
            spartition.label,
            measurements.name,
            compared
        );
    }
    Ok(())
}
