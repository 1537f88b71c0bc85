// evidence.rs - Group per-individual evidence by subset

use crate::data::spart::Spartition;
use std::collections::HashMap;

/// Evidence available for the members of one subset
#[derive(Debug, Clone)]
pub struct SubsetEvidence<'a, V> {
    pub label: &'a str,
    /// (individual id, value) for every member present in the evidence table
    pub values: Vec<(&'a str, &'a V)>,
}

impl<'a, V> SubsetEvidence<'a, V> {
    /// Number of individuals for which evidence was available
    pub fn available(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter_values(&self) -> impl Iterator<Item = &'a V> + '_ {
        self.values.iter().map(|(_, v)| *v)
    }
}

/// Split an evidence table along the subsets of a spartition.
///
/// Members missing from the table are skipped; subsets keep partition order.
pub fn group_by_subset<'a, V>(
    spartition: &'a Spartition,
    table: &'a HashMap<String, V>,
) -> Vec<SubsetEvidence<'a, V>> {
    spartition
        .subsets
        .iter()
        .map(|subset| {
            let values = subset
                .individuals
                .iter()
                .filter_map(|id| table.get(id).map(|v| (id.as_str(), v)))
                .collect();
            SubsetEvidence {
                label: subset.label.as_str(),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spart::tests::sample_document;

    #[test]
    fn test_missing_individuals_are_skipped() {
        let document = sample_document();
        let mut table = HashMap::new();
        table.insert("a".to_string(), 1.0);
        table.insert("c".to_string(), 3.0);
        table.insert("zz".to_string(), 9.0);

        let grouped = group_by_subset(&document.spartitions[0], &table);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].label, "1");
        assert_eq!(grouped[0].available(), 2);
        assert_eq!(grouped[0].iter_values().copied().collect::<Vec<_>>(), vec![1.0, 3.0]);
        assert!(grouped[1].is_empty());
    }
}
