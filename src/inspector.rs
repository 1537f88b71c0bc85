// inspector.rs - Document inspector: spartitions, concordances and scores

use crate::core::ConcordanceCatalog;
use crate::data::{EvidenceType, SpartDocument, Spartition};
use crate::error::Result;
use std::path::Path;

/// Distinct concordance labels per evidence type
pub fn labels_by_evidence_type(catalog: &ConcordanceCatalog) -> Vec<(EvidenceType, Vec<&str>)> {
    EvidenceType::ALL
        .iter()
        .map(|&t| (t, catalog.labels_of_type(t).collect()))
        .collect()
}

/// Per-spartition counts shown by the inspector
#[derive(Debug, Clone, PartialEq)]
pub struct SpartitionOverview {
    pub label: String,
    pub subsets: usize,
    pub individuals: usize,
    pub concordances: usize,
    pub limits: usize,
    pub scored: bool,
}

impl SpartitionOverview {
    fn new(spartition: &Spartition) -> Self {
        Self {
            label: spartition.label.clone(),
            subsets: spartition.subsets.len(),
            individuals: spartition.subsets.iter().map(|s| s.individuals.len()).sum(),
            concordances: spartition.concordances.len(),
            limits: spartition.limits.len(),
            scored: spartition.score.is_some(),
        }
    }
}

/// Overview of every spartition plus the concordance catalog
pub fn overview(document: &SpartDocument) -> Result<(Vec<SpartitionOverview>, ConcordanceCatalog)> {
    let catalog = ConcordanceCatalog::from_document(document)?;
    let spartitions = document.spartitions.iter().map(SpartitionOverview::new).collect();
    Ok((spartitions, catalog))
}

fn print_spartitions(document: &SpartDocument, spartitions: &[SpartitionOverview]) {
    println!("\n=== SPARTITIONS ===");
    println!(
        "{:<30} {:>8} {:>12} {:>13} {:>8} {:>8}",
        "Spartition", "Subsets", "Individuals", "Concordances", "Limits", "Scored"
    );
    println!("{}", "=".repeat(84));
    for s in spartitions {
        println!(
            "{:<30} {:>8} {:>12} {:>13} {:>8} {:>8}",
            s.label,
            s.subsets,
            s.individuals,
            s.concordances,
            s.limits,
            if s.scored { "yes" } else { "no" }
        );
    }

    let scored: Vec<_> = document
        .spartitions
        .iter()
        .filter_map(|s| s.score.map(|score| (s.label.as_str(), score)))
        .collect();
    if !scored.is_empty() {
        println!("\n=== SCORES ===");
        println!(
            "{:<30} {:>10} {:>10} {:>10} {:>6} {:>6}",
            "Spartition", "CSU", "CSW", "CSWC", "CC", "HC"
        );
        println!("{}", "-".repeat(77));
        for (label, score) in scored {
            println!(
                "{:<30} {:>10.4} {:>10.4} {:>10.4} {:>6} {:>6}",
                label, score.csu, score.csw, score.cswc, score.cc, score.hc
            );
        }
    }
}

fn print_catalog(catalog: &ConcordanceCatalog) {
    println!("\n=== CONCORDANCE CATALOG ===");
    if catalog.is_empty() {
        println!("No concordances defined");
        return;
    }
    for (label, entry) in catalog.iter() {
        let definition = &entry.definition;
        println!("• {}", label);
        println!(
            "    {} / {:?} / {:?} / {:?}",
            definition.evidence_type,
            definition.data_type,
            definition.discrimination_type,
            definition.discrimination_data_type
        );
        if let Some(unit) = &definition.unit {
            println!("    Unit: {}", unit);
        }
        if let Some(threshold) = definition.threshold {
            println!("    Threshold: {}", threshold);
        }
        println!(
            "    Defined in {} spartition(s), {} limits",
            entry.spartitions.len(),
            entry.limits
        );
    }
}

/// Load a document and print its structure
pub fn run_inspector(path: &Path) -> Result<()> {
    println!("🔍 concordist document inspector");
    println!("================================");

    let document = SpartDocument::from_file(path)?;
    let (spartitions, catalog) = overview(&document)?;

    println!("\n=== DOCUMENT SUMMARY ===");
    if let Some(project) = &document.project {
        println!("Project: {}", project);
    }
    if let Some(date) = &document.date {
        println!("Date: {}", date);
    }
    println!("Individuals: {}", document.individuals.len());
    println!(
        "Individuals with coordinates: {}",
        document.coordinates().len()
    );
    println!("Spartitions: {}", document.spartitions.len());
    println!("Distinct concordances: {}", catalog.len());
    for (evidence_type, labels) in labels_by_evidence_type(&catalog) {
        if !labels.is_empty() {
            println!("  {}: {}", evidence_type, labels.join(", "));
        }
    }

    print_spartitions(&document, &spartitions);
    print_catalog(&catalog);

    println!("\n✅ Document inspection completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spart::tests::sample_document;
    use crate::data::{
        ConcordanceDefinition, DataType, DiscriminationDataType, DiscriminationType,
    };

    #[test]
    fn test_overview_counts() {
        let document = sample_document();
        let (spartitions, catalog) = overview(&document).unwrap();
        assert_eq!(spartitions.len(), 2);
        assert_eq!(spartitions[1].subsets, 3);
        assert_eq!(spartitions[1].individuals, 6);
        assert!(!spartitions[0].scored);
        assert!(catalog.is_empty());
        assert!(labels_by_evidence_type(&catalog)
            .iter()
            .all(|(_, labels)| labels.is_empty()));
    }

    #[test]
    fn test_labels_grouped_by_evidence_type() {
        let mut document = sample_document();
        document.spartitions[0].concordances.push(ConcordanceDefinition::new(
            "length range gap",
            EvidenceType::Morphology,
            DataType::Continuous,
            DiscriminationType::Gap,
            DiscriminationDataType::Continuous,
        ));
        let (_, catalog) = overview(&document).unwrap();
        let grouped = labels_by_evidence_type(&catalog);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[2], (EvidenceType::Morphology, vec!["length range gap"]));
        assert!(grouped[0].1.is_empty());
    }
}
