// haplostats.rs - Haplotype statistics between subsets

use crate::core::pipeline::CancelToken;
use crate::error::Result;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

/// Allele payloads of one subset, grouped per individual
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetAlleles {
    pub subset: String,
    pub individuals: Vec<Vec<String>>,
}

/// What two subsets have in common for one statistic
#[derive(Debug, Clone, PartialEq)]
pub struct SharedBetweenSubsets {
    pub subset_a: String,
    pub subset_b: String,
    pub common: BTreeSet<String>,
}

/// Pairwise results for every pair of the submitted subsets, empty ones included
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HaplotypeReport {
    pub haplotypes_shared: Vec<SharedBetweenSubsets>,
    pub ffrs_shared: Vec<SharedBetweenSubsets>,
}

/// Backend computing shared haplotypes and shared fields for recombination
pub trait HaplotypeStatistics: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Must check `cancel` regularly and return `ConcordanceError::Cancelled` when set
    fn compute(&self, subsets: &[SubsetAlleles], cancel: &CancelToken) -> Result<HaplotypeReport>;
}

/// Built-in backend: identical payloads are one haplotype, and individuals
/// linked through any shared haplotype form one field for recombination.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedHaplotypeStats;

fn normalize(payload: &str) -> String {
    payload.trim().to_uppercase()
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb.max(ra)] = ra.min(rb);
        }
    }
}

fn pairwise(
    subsets: &[SubsetAlleles],
    sets: &[BTreeSet<usize>],
    names: &[String],
    cancel: &CancelToken,
) -> Result<Vec<SharedBetweenSubsets>> {
    let mut shared = Vec::new();
    for i in 0..subsets.len() {
        for j in (i + 1)..subsets.len() {
            cancel.check()?;
            let common = sets[i]
                .intersection(&sets[j])
                .map(|&k| names[k].clone())
                .collect();
            shared.push(SharedBetweenSubsets {
                subset_a: subsets[i].subset.clone(),
                subset_b: subsets[j].subset.clone(),
                common,
            });
        }
    }
    Ok(shared)
}

impl HaplotypeStatistics for SharedHaplotypeStats {
    fn name(&self) -> &'static str {
        "shared-haplotypes"
    }

    fn compute(&self, subsets: &[SubsetAlleles], cancel: &CancelToken) -> Result<HaplotypeReport> {
        // Haplotype ids in order of first appearance
        let mut haplotype_ids: HashMap<String, usize> = HashMap::new();
        // (subset index, haplotype ids) per individual
        let mut individuals: Vec<(usize, Vec<usize>)> = Vec::new();

        for (s, subset) in subsets.iter().enumerate() {
            for alleles in &subset.individuals {
                let mut carried = Vec::with_capacity(alleles.len());
                for payload in alleles {
                    let next = haplotype_ids.len();
                    carried.push(*haplotype_ids.entry(normalize(payload)).or_insert(next));
                }
                individuals.push((s, carried));
            }
        }
        cancel.check()?;

        let haplotype_names: Vec<String> =
            (1..=haplotype_ids.len()).map(|n| format!("H{}", n)).collect();

        let mut subset_haplotypes = vec![BTreeSet::new(); subsets.len()];
        for (s, carried) in &individuals {
            subset_haplotypes[*s].extend(carried.iter().copied());
        }

        // Individuals sharing a haplotype belong to the same field
        let mut fields = UnionFind::new(individuals.len());
        let mut first_carrier: Vec<Option<usize>> = vec![None; haplotype_ids.len()];
        for (index, (_, carried)) in individuals.iter().enumerate() {
            for &h in carried {
                let carrier = first_carrier[h];
                match carrier {
                    Some(other) => fields.union(other, index),
                    None => first_carrier[h] = Some(index),
                }
            }
        }
        cancel.check()?;

        let mut field_ids: HashMap<usize, usize> = HashMap::new();
        let mut subset_fields = vec![BTreeSet::new(); subsets.len()];
        for (index, (s, _)) in individuals.iter().enumerate() {
            let root = fields.find(index);
            let next = field_ids.len();
            let field = *field_ids.entry(root).or_insert(next);
            subset_fields[*s].insert(field);
        }
        let field_names: Vec<String> = (1..=field_ids.len()).map(|n| format!("FFR{}", n)).collect();

        log::debug!(
            "{} haplotypes and {} fields for recombination across {} subsets",
            haplotype_names.len(),
            field_names.len(),
            subsets.len()
        );

        Ok(HaplotypeReport {
            haplotypes_shared: pairwise(subsets, &subset_haplotypes, &haplotype_names, cancel)?,
            ffrs_shared: pairwise(subsets, &subset_fields, &field_names, cancel)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConcordanceError;

    fn subset(label: &str, individuals: &[&[&str]]) -> SubsetAlleles {
        SubsetAlleles {
            subset: label.to_string(),
            individuals: individuals
                .iter()
                .map(|alleles| alleles.iter().map(|a| a.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_shared_haplotypes() {
        let subsets = vec![
            subset("1", &[&["AAAA", "CCCC"]]),
            subset("2", &[&["cccc", "GGGG"]]),
            subset("3", &[&["TTTT", "TTTT"]]),
        ];
        let report = SharedHaplotypeStats
            .compute(&subsets, &CancelToken::new())
            .unwrap();

        assert_eq!(report.haplotypes_shared.len(), 3);
        let first = &report.haplotypes_shared[0];
        assert_eq!((first.subset_a.as_str(), first.subset_b.as_str()), ("1", "2"));
        assert_eq!(first.common, BTreeSet::from(["H2".to_string()]));
        assert!(report.haplotypes_shared[1].common.is_empty());
        assert!(report.haplotypes_shared[2].common.is_empty());
    }

    #[test]
    fn test_fields_follow_haplotype_chains() {
        // Subset 3 reaches subset 1 through CCCC; its two individuals are joined by GGGG
        let subsets = vec![
            subset("1", &[&["AAAA", "CCCC"]]),
            subset("2", &[&["TTTT", "TTTT"]]),
            subset("3", &[&["CCCC", "GGGG"], &["GGGG", "ACGT"]]),
        ];
        let report = SharedHaplotypeStats
            .compute(&subsets, &CancelToken::new())
            .unwrap();

        let ffrs: Vec<bool> = report.ffrs_shared.iter().map(|s| !s.common.is_empty()).collect();
        // (1,2) (1,3) (2,3)
        assert_eq!(ffrs, vec![false, true, false]);
        assert_eq!(report.ffrs_shared[1].common.len(), 1);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let subsets = vec![subset("1", &[&["A"]]), subset("2", &[&["A"]])];
        assert!(matches!(
            SharedHaplotypeStats.compute(&subsets, &token),
            Err(ConcordanceError::Cancelled)
        ));
    }
}
