//! Positional features and the store interface used to query them

use crate::ontology;
use genofetch_common::types::Strand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ATTR_ID: &str = "id";
pub const ATTR_PARENT: &str = "Parent";
pub const ATTR_ALLELES: &str = "alleles";
pub const ATTR_CONSEQUENCE: &str = "consequence_type";
pub const ATTR_CLINICAL_SIGNIFICANCE: &str = "clinical_significance";

/// A typed, located annotation on a sequence
///
/// `begin <= end` always holds; direction lives in `strand`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceFeature {
    pub feature_type: String,
    pub description: String,
    pub begin: i64,
    pub end: i64,
    pub strand: Strand,
    pub phase: Option<u8>,
    pub score: Option<f32>,
    pub group: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl SequenceFeature {
    pub fn new(feature_type: impl Into<String>, begin: i64, end: i64) -> Self {
        let (begin, end) = if end < begin { (end, begin) } else { (begin, end) };
        Self {
            feature_type: feature_type.into(),
            description: String::new(),
            begin,
            end,
            strand: Strand::Unknown,
            phase: None,
            score: None,
            group: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute(ATTR_ID)
    }

    pub fn parent(&self) -> Option<&str> {
        self.attribute(ATTR_PARENT)
    }

    /// True when the `Parent` attribute names `owner`, ignoring case
    pub fn has_parent(&self, owner: &str) -> bool {
        self.parent().is_some_and(|p| p.eq_ignore_ascii_case(owner))
    }

    /// True when the `id` attribute names `accession`, ignoring case
    pub fn has_id(&self, accession: &str) -> bool {
        self.id().is_some_and(|id| id.eq_ignore_ascii_case(accession))
    }

    pub fn is_a(&self, term: &str) -> bool {
        ontology::is_a(&self.feature_type, term)
    }

    pub fn len(&self) -> i64 {
        self.end - self.begin + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

/// Read access to the positional features of a sequence
pub trait FeatureStore {
    fn features(&self) -> &[SequenceFeature];

    /// Features whose type is any of `terms` or a subtype of one
    fn features_of_type(&self, terms: &[&str]) -> Vec<&SequenceFeature> {
        self.features()
            .iter()
            .filter(|f| ontology::is_any(&f.feature_type, terms))
            .collect()
    }

    /// Features of the given types owned by `parent`
    fn features_with_parent(&self, terms: &[&str], parent: &str) -> Vec<&SequenceFeature> {
        self.features()
            .iter()
            .filter(|f| f.has_parent(parent) && ontology::is_any(&f.feature_type, terms))
            .collect()
    }
}

impl FeatureStore for [SequenceFeature] {
    fn features(&self) -> &[SequenceFeature] {
        self
    }
}

impl FeatureStore for Vec<SequenceFeature> {
    fn features(&self) -> &[SequenceFeature] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{CDS, EXON};

    #[test]
    fn test_new_orders_bounds() {
        let f = SequenceFeature::new("exon", 20, 10);
        assert_eq!((f.begin, f.end), (10, 20));
        assert_eq!(f.len(), 11);
    }

    #[test]
    fn test_parent_is_case_insensitive() {
        let f = SequenceFeature::new("exon", 1, 10).with_attribute(ATTR_PARENT, "ENST00000288602");
        assert!(f.has_parent("enst00000288602"));
        assert!(!f.has_parent("ENST00000288603"));
        assert!(!SequenceFeature::new("exon", 1, 10).has_parent("ENST00000288602"));
    }

    #[test]
    fn test_store_queries() {
        let features = vec![
            SequenceFeature::new("exon", 1, 10).with_attribute(ATTR_PARENT, "T1"),
            SequenceFeature::new("CDS_predicted", 3, 10).with_attribute(ATTR_PARENT, "T1"),
            SequenceFeature::new("exon", 20, 30).with_attribute(ATTR_PARENT, "T2"),
        ];
        assert_eq!(features.features_of_type(&[EXON]).len(), 2);
        assert_eq!(features.features_of_type(&[CDS]).len(), 1);
        assert_eq!(features.features_with_parent(&[EXON], "t2").len(), 1);
        assert_eq!(features.features_with_parent(&[EXON, CDS], "T1").len(), 2);
    }
}
