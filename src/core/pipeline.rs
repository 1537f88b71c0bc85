// pipeline.rs - Profile every spartition of a document, then score it

use crate::core::catalog::ConcordanceCatalog;
use crate::core::geodesy::DistanceMethod;
use crate::core::geography::{process_cooccurrences, process_polygons};
use crate::core::haplostats::HaplotypeStatistics;
use crate::core::molecular::{alleles_by_individual, process_haplostats};
use crate::core::morphometrics::process_morphometrics;
use crate::core::scoring::{score_spartition, ScoringWeights};
use crate::data::{
    ConcordanceStore, ConstraintSet, LatLon, MorphometricTable, PartitionScore, SequenceSource,
    SpartDocument, Spartition,
};
use crate::error::{ConcordanceError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_COOCCURRENCE_THRESHOLD_KM: f64 = 5.0;
pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Shared cancellation flag, checked between stages and inside long computations
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ConcordanceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSettings {
    pub cooccurrence_threshold_km: f64,
    pub significance_threshold: f64,
    pub distance_method: DistanceMethod,
    pub show_progress: bool,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            cooccurrence_threshold_km: DEFAULT_COOCCURRENCE_THRESHOLD_KM,
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
            distance_method: DistanceMethod::default(),
            show_progress: false,
        }
    }
}

/// Evidence tables supplied next to the document
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub coordinates: Option<HashMap<String, LatLon>>,
    pub morphometrics: Option<MorphometricTable>,
    pub sequences: Vec<SequenceSource>,
}

impl Evidence {
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_none() && self.morphometrics.is_none() && self.sequences.is_empty()
    }

    /// Use the coordinates stored on the document's individuals
    pub fn with_document_coordinates(mut self, document: &SpartDocument) -> Result<Self> {
        let coordinates = document.coordinates();
        if coordinates.is_empty() {
            return Err(ConcordanceError::InvalidInput(
                "the document stores no coordinates".to_string(),
            ));
        }
        self.coordinates = Some(coordinates);
        Ok(self)
    }
}

/// Include/exclude patterns and label lists on spartition labels
#[derive(Debug, Clone, Default)]
pub struct SpartitionFilter {
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
    pub include_labels: Option<HashSet<String>>,
    pub exclude_labels: Option<HashSet<String>>,
}

impl SpartitionFilter {
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                ConcordanceError::InvalidInput(format!("invalid spartition pattern '{}': {}", pattern, e))
            })
        };
        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
            include_labels: None,
            exclude_labels: None,
        })
    }

    pub fn matches(&self, label: &str) -> bool {
        let included = self.include.as_ref().map_or(true, |r| r.is_match(label))
            && self.include_labels.as_ref().map_or(true, |s| s.contains(label));
        let excluded = self.exclude.as_ref().map_or(false, |r| r.is_match(label))
            || self.exclude_labels.as_ref().map_or(false, |s| s.contains(label));
        included && !excluded
    }

    fn select(&self, document: &SpartDocument) -> Vec<usize> {
        document
            .spartitions
            .iter()
            .enumerate()
            .filter(|(_, s)| self.matches(&s.label))
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileSummary {
    pub spartitions: usize,
    pub definitions: usize,
    pub limits: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    pub scored: usize,
    pub skipped: usize,
}

fn progress_bar(length: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(length as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Per-source allele tables; sources are labelled only when there are several
struct AlleleSource {
    label: Option<String>,
    alleles: HashMap<String, Vec<String>>,
}

struct ProfileInputs<'a> {
    coordinates: Option<&'a HashMap<String, LatLon>>,
    morphometrics: Option<&'a MorphometricTable>,
    alleles: &'a [AlleleSource],
    settings: &'a ProfileSettings,
    stats: &'a dyn HaplotypeStatistics,
    cancel: &'a CancelToken,
}

fn profile_spartition(spartition: &Spartition, inputs: &ProfileInputs) -> Result<ConcordanceStore> {
    let mut store = ConcordanceStore::new();

    if let Some(coordinates) = inputs.coordinates {
        inputs.cancel.check()?;
        process_polygons(spartition, coordinates, &mut store)?;
        inputs.cancel.check()?;
        process_cooccurrences(
            spartition,
            coordinates,
            inputs.settings.cooccurrence_threshold_km,
            inputs.settings.distance_method,
            &mut store,
        )?;
    }

    for source in inputs.alleles {
        inputs.cancel.check()?;
        process_haplostats(
            spartition,
            &source.alleles,
            source.label.as_deref(),
            inputs.stats,
            inputs.cancel,
            &mut store,
        )?;
    }

    if let Some(table) = inputs.morphometrics {
        inputs.cancel.check()?;
        process_morphometrics(spartition, table, inputs.settings.significance_threshold, &mut store)?;
    }

    Ok(store)
}

/// Compute the concordances of every selected spartition.
///
/// Spartitions are processed in parallel into private stores; the document
/// is only modified once all of them succeeded.
pub fn profile_document(
    document: &mut SpartDocument,
    evidence: &Evidence,
    settings: &ProfileSettings,
    filter: &SpartitionFilter,
    stats: &dyn HaplotypeStatistics,
    cancel: &CancelToken,
) -> Result<ProfileSummary> {
    if evidence.is_empty() {
        return Err(ConcordanceError::InvalidInput(
            "no coordinates, morphometrics or sequences to profile".to_string(),
        ));
    }

    let individual_ids = document.individual_ids();
    let labelled = evidence.sequences.len() > 1;
    let alleles: Vec<AlleleSource> = evidence
        .sequences
        .iter()
        .map(|source| {
            let alleles = alleles_by_individual(individual_ids.iter().copied(), &source.sequences);
            log::info!(
                "Sequences '{}': alleles for {} of {} individuals",
                source.label,
                alleles.len(),
                individual_ids.len()
            );
            AlleleSource {
                label: labelled.then(|| source.label.clone()),
                alleles,
            }
        })
        .collect();

    let selected = filter.select(document);
    log::info!(
        "Profiling {} of {} spartitions",
        selected.len(),
        document.spartitions.len()
    );

    let inputs = ProfileInputs {
        coordinates: evidence.coordinates.as_ref(),
        morphometrics: evidence.morphometrics.as_ref(),
        alleles: &alleles,
        settings,
        stats,
        cancel,
    };
    let pb = progress_bar(selected.len(), settings.show_progress);
    let spartitions = &document.spartitions;
    let stores: Vec<(usize, ConcordanceStore)> = selected
        .par_iter()
        .map(|&index| {
            let store = profile_spartition(&spartitions[index], &inputs)?;
            pb.inc(1);
            Ok((index, store))
        })
        .collect::<Result<Vec<_>>>()?;
    pb.finish_and_clear();
    cancel.check()?;

    let mut summary = ProfileSummary::default();
    let mut updated = document.spartitions.clone();
    for (index, store) in stores {
        summary.spartitions += 1;
        summary.definitions += store.definitions.len();
        summary.limits += store.limits.len();
        log::debug!(
            "Spartition '{}': {} concordances, {} limits",
            updated[index].label,
            store.definitions.len(),
            store.limits.len()
        );
        updated[index].commit(store)?;
    }
    document.spartitions = updated;

    log::info!(
        "Profiled {} spartitions: {} concordance definitions, {} limits",
        summary.spartitions,
        summary.definitions,
        summary.limits
    );
    Ok(summary)
}

/// Score every selected spartition from its recorded concordances.
///
/// Constraints and weights are validated before any score is computed, and
/// scores are only written once every spartition has been evaluated.
pub fn score_document(
    document: &mut SpartDocument,
    weights: &ScoringWeights,
    constraints: &ConstraintSet,
    filter: &SpartitionFilter,
    cancel: &CancelToken,
) -> Result<ScoreSummary> {
    let constraints = constraints.validate(&document.individual_ids())?;
    let catalog = ConcordanceCatalog::from_document(document)?;
    let weights = weights.resolve(&catalog)?;
    log::info!(
        "Scoring with {} concordances, {} conspecific and {} heterospecific groups",
        catalog.len(),
        constraints.conspecific().len(),
        constraints.heterospecific().len()
    );

    let selected = filter.select(document);
    let spartitions = &document.spartitions;
    let scores: Vec<(usize, Option<PartitionScore>)> = selected
        .par_iter()
        .map(|&index| {
            cancel.check()?;
            Ok((index, score_spartition(&spartitions[index], &weights, &constraints)))
        })
        .collect::<Result<Vec<_>>>()?;
    cancel.check()?;

    let mut summary = ScoreSummary::default();
    for (index, score) in scores {
        let spartition = &mut document.spartitions[index];
        match score {
            Some(_) => summary.scored += 1,
            None => {
                log::warn!(
                    "Spartition '{}' has {} subset(s), skipped",
                    spartition.label,
                    spartition.subsets.len()
                );
                summary.skipped += 1;
            }
        }
        spartition.score = score;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geography::{COOCCURRENCE_BOOLEAN, POLYGON_OVERLAP_BOOL};
    use crate::core::haplostats::{HaplotypeReport, SharedHaplotypeStats, SubsetAlleles};
    use crate::core::molecular::HAPLOTYPES_SHARED;
    use crate::data::spart::tests::sample_document;
    use crate::data::{AlleleSequence, Support, TraitMeasurements};

    #[derive(Debug)]
    struct FailingStats;

    impl HaplotypeStatistics for FailingStats {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn compute(&self, _subsets: &[SubsetAlleles], _cancel: &CancelToken) -> Result<HaplotypeReport> {
            Err(ConcordanceError::Collaborator("backend unavailable".to_string()))
        }
    }

    fn coordinates() -> HashMap<String, LatLon> {
        [
            ("a", 10.0, 10.0),
            ("b", 10.01, 10.0),
            ("c", 10.0, 10.01),
            ("d", 10.02, 10.0),
            ("e", 12.0, 12.0),
            ("f", 12.01, 12.0),
        ]
        .iter()
        .map(|(id, lat, lon)| (id.to_string(), LatLon::new(*lat, *lon)))
        .collect()
    }

    fn sequences() -> SequenceSource {
        SequenceSource {
            label: "cytb".to_string(),
            sequences: vec![
                AlleleSequence::new("a_1", "ACGT"),
                AlleleSequence::new("d_1", "ACGT"),
                AlleleSequence::new("e_1", "TTTT"),
            ],
        }
    }

    fn evidence() -> Evidence {
        Evidence {
            coordinates: Some(coordinates()),
            morphometrics: None,
            sequences: vec![sequences()],
        }
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(ConcordanceError::Cancelled)));
    }

    #[test]
    fn test_profile_document_commits_all_stages() {
        let mut document = sample_document();
        let summary = profile_document(
            &mut document,
            &evidence(),
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(summary.spartitions, 2);

        let two = document.spartition("two").unwrap();
        assert!(two.definition(POLYGON_OVERLAP_BOOL).is_some());
        assert!(two.definition(COOCCURRENCE_BOOLEAN).is_some());
        // A single source is not labelled
        let shared: Vec<_> = two
            .limits
            .iter()
            .filter(|l| l.concordance == HAPLOTYPES_SHARED)
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].support, Support::Boolean(true));
    }

    #[test]
    fn test_failure_leaves_document_untouched() {
        let mut document = sample_document();
        let before = document.clone();
        let result = profile_document(
            &mut document,
            &evidence(),
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &FailingStats,
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(ConcordanceError::Collaborator(_))));
        assert_eq!(document, before);
    }

    #[test]
    fn test_cancelled_profile_writes_nothing() {
        let mut document = sample_document();
        let before = document.clone();
        let token = CancelToken::new();
        token.cancel();
        let result = profile_document(
            &mut document,
            &evidence(),
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &token,
        );
        assert!(matches!(result, Err(ConcordanceError::Cancelled)));
        assert_eq!(document, before);
    }

    #[test]
    fn test_missing_coordinates_abort_the_run() {
        let mut document = sample_document();
        let before = document.clone();
        let mut table = coordinates();
        table.remove("e");
        table.remove("f");
        let evidence = Evidence {
            coordinates: Some(table),
            ..Evidence::default()
        };
        let result = profile_document(
            &mut document,
            &evidence,
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(ConcordanceError::EmptyEvidence { .. })));
        assert_eq!(document, before);
    }

    #[test]
    fn test_filter_and_labelled_sources() {
        let mut document = sample_document();
        let mut second = sequences();
        second.label = "coi".to_string();
        let evidence = Evidence {
            coordinates: None,
            morphometrics: Some(lengths()),
            sequences: vec![sequences(), second],
        };
        let filter = SpartitionFilter::new(Some("^thr"), None).unwrap();
        profile_document(
            &mut document,
            &evidence,
            &ProfileSettings::default(),
            &filter,
            &SharedHaplotypeStats,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(document.spartition("two").unwrap().concordances.is_empty());
        let three = document.spartition("three").unwrap();
        assert!(three.definition("haplotypes shared between subsets [cytb]").is_some());
        assert!(three.definition("FFRs shared between subsets [coi]").is_some());
        assert!(three.definition("length range gap").is_some());
    }

    fn lengths() -> MorphometricTable {
        MorphometricTable {
            traits: vec![TraitMeasurements {
                name: "length".to_string(),
                values: [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0), ("f", 6.0)]
                    .iter()
                    .map(|(id, v)| (id.to_string(), *v))
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_stored_coordinates_are_ignored_unless_requested() {
        let mut document = sample_document();
        document.individuals[0].coordinates = Some(LatLon::new(10.0, 10.0));
        let evidence = Evidence {
            morphometrics: Some(lengths()),
            ..Evidence::default()
        };
        profile_document(
            &mut document,
            &evidence,
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &CancelToken::new(),
        )
        .unwrap();

        let two = document.spartition("two").unwrap();
        assert!(two.definition("length range gap").is_some());
        assert!(two.definition(COOCCURRENCE_BOOLEAN).is_none());
        assert!(two.definition(POLYGON_OVERLAP_BOOL).is_none());
    }

    #[test]
    fn test_with_document_coordinates() {
        let mut document = sample_document();
        assert!(matches!(
            Evidence::default().with_document_coordinates(&document),
            Err(ConcordanceError::InvalidInput(_))
        ));

        let table = coordinates();
        for individual in document.individuals.iter_mut() {
            individual.coordinates = table.get(&individual.id).copied();
        }
        let evidence = Evidence::default()
            .with_document_coordinates(&document)
            .unwrap();
        assert_eq!(evidence.coordinates.as_ref().map(|c| c.len()), Some(6));

        profile_document(
            &mut document,
            &evidence,
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(document
            .spartition("two")
            .unwrap()
            .definition(COOCCURRENCE_BOOLEAN)
            .is_some());
    }

    #[test]
    fn test_profile_from_loaded_tables() {
        use crate::data::{read_coordinates, read_morphometrics};
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let write = |name: &str, content: &str| {
            let path = dir.path().join(name);
            std::fs::File::create(&path)
                .unwrap()
                .write_all(content.as_bytes())
                .unwrap();
            path
        };
        let coords = write(
            "coords.tsv",
            "id\tlat\tlon\na\t10\t10\nb\t10.01\t10\nc\t10\t10.01\nd\t10.02\t10\ne\t12\t12\nf\t12.01\t12\n",
        );
        let traits = write("traits.csv", "id,length\na,1\nb,2\nc,3\nd,4\ne,5\nf,6\n");

        let evidence = Evidence {
            coordinates: Some(read_coordinates(&coords).unwrap()),
            morphometrics: Some(read_morphometrics(&traits).unwrap()),
            sequences: Vec::new(),
        };
        let mut document = sample_document();
        let summary = profile_document(
            &mut document,
            &evidence,
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(summary.spartitions, 2);
        let three = document.spartition("three").unwrap();
        assert!(three.definition(COOCCURRENCE_BOOLEAN).is_some());
        assert!(three.definition("length range gap").is_some());
    }

    #[test]
    fn test_filter_label_lists() {
        let mut filter = SpartitionFilter::new(None, Some("^draft")).unwrap();
        assert!(filter.matches("asap"));
        assert!(!filter.matches("draft_1"));
        filter.include_labels = Some(["asap".to_string()].into_iter().collect());
        assert!(filter.matches("asap"));
        assert!(!filter.matches("ptp"));
        filter.exclude_labels = Some(["asap".to_string()].into_iter().collect());
        assert!(!filter.matches("asap"));
        assert!(SpartitionFilter::new(Some("("), None).is_err());
    }

    #[test]
    fn test_no_evidence_is_rejected() {
        let mut document = sample_document();
        let result = profile_document(
            &mut document,
            &Evidence::default(),
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(ConcordanceError::InvalidInput(_))));
    }

    #[test]
    fn test_score_document_after_profile() {
        let mut document = sample_document();
        profile_document(
            &mut document,
            &evidence(),
            &ProfileSettings::default(),
            &SpartitionFilter::default(),
            &SharedHaplotypeStats,
            &CancelToken::new(),
        )
        .unwrap();

        let constraints = ConstraintSet {
            conspecific: vec![vec!["a".to_string(), "b".to_string()]],
            heterospecific: vec![],
        };
        let summary = score_document(
            &mut document,
            &ScoringWeights::default(),
            &constraints,
            &SpartitionFilter::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(summary, ScoreSummary { scored: 2, skipped: 0 });

        let first: Vec<_> = document.spartitions.iter().map(|s| s.score).collect();
        score_document(
            &mut document,
            &ScoringWeights::default(),
            &constraints,
            &SpartitionFilter::default(),
            &CancelToken::new(),
        )
        .unwrap();
        let second: Vec<_> = document.spartitions.iter().map(|s| s.score).collect();
        assert_eq!(first, second);

        let score = document.spartition("two").unwrap().score.unwrap();
        assert!(score.cc);
        assert!((score.csw - score.csu).abs() < 1e-12, "one pair");
    }

    #[test]
    fn test_invalid_constraints_abort_scoring() {
        let mut document = sample_document();
        let constraints = ConstraintSet {
            conspecific: vec![vec!["a".to_string(), "zz".to_string()]],
            heterospecific: vec![],
        };
        let result = score_document(
            &mut document,
            &ScoringWeights::default(),
            &constraints,
            &SpartitionFilter::default(),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(ConcordanceError::UnknownIndividual { .. })));
        assert!(document.spartitions.iter().all(|s| s.score.is_none()));
    }
}
