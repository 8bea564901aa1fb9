//! Fetched sequences and their chromosome loci

use crate::mapping::CoordinateMap;
use crate::model::dbref::DbRef;
use crate::model::feature::{FeatureStore, SequenceFeature};
use serde::{Deserialize, Serialize};

/// Where a sequence sits on its chromosome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneLoci {
    pub species: String,
    pub assembly: String,
    pub chromosome: String,
    /// Sequence positions onto chromosome positions
    pub map: CoordinateMap,
}

impl GeneLoci {
    pub fn new(
        species: impl Into<String>,
        assembly: impl Into<String>,
        chromosome: impl Into<String>,
        map: CoordinateMap,
    ) -> Self {
        Self {
            species: species.into(),
            assembly: assembly.into(),
            chromosome: chromosome.into(),
            map,
        }
    }
}

impl std::fmt::Display for GeneLoci {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{} {}", self.species, self.assembly, self.chromosome, self.map)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub description: Option<String>,
    pub start: i64,
    pub end: i64,
    residues: String,
    features: Vec<SequenceFeature>,
    db_refs: Vec<DbRef>,
    gene_loci: Option<GeneLoci>,
    product: Option<Box<Sequence>>,
}

impl Sequence {
    /// A sequence numbered from 1
    pub fn new(name: impl Into<String>, residues: impl Into<String>) -> Self {
        Self::with_start(name, residues, 1)
    }

    pub fn with_start(name: impl Into<String>, residues: impl Into<String>, start: i64) -> Self {
        let residues = residues.into();
        let len = residues.len() as i64;
        Self {
            name: name.into(),
            description: None,
            start,
            end: start + len - 1,
            residues,
            features: Vec::new(),
            db_refs: Vec::new(),
            gene_loci: None,
            product: None,
        }
    }

    pub fn residues(&self) -> &str {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Residues between two positions in this sequence's numbering, inclusive
    ///
    /// Positions outside the sequence are clipped.
    pub fn residues_between(&self, begin: i64, end: i64) -> &str {
        let lo = (begin.min(end) - self.start).max(0);
        let hi = (begin.max(end) - self.start + 1).min(self.residues.len() as i64);
        if lo >= hi {
            return "";
        }
        self.residues.get(lo as usize..hi as usize).unwrap_or("")
    }

    pub fn add_feature(&mut self, feature: SequenceFeature) {
        self.features.push(feature);
    }

    pub fn features_mut(&mut self) -> &mut Vec<SequenceFeature> {
        &mut self.features
    }

    /// Drop the features `keep` rejects, returning how many were removed
    pub fn retain_features<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&SequenceFeature) -> bool,
    {
        let before = self.features.len();
        self.features.retain(keep);
        before - self.features.len()
    }

    pub fn db_refs(&self) -> &[DbRef] {
        &self.db_refs
    }

    pub fn db_refs_mut(&mut self) -> &mut Vec<DbRef> {
        &mut self.db_refs
    }

    /// Add a cross-reference unless an equivalent one is already present
    ///
    /// An equivalent reference absorbs any version or mapping it was
    /// missing. Returns whether a new entry was added.
    pub fn add_db_ref(&mut self, db_ref: DbRef) -> bool {
        match self.db_refs.iter_mut().find(|r| r.same_reference(&db_ref)) {
            Some(existing) => {
                existing.merge(db_ref);
                false
            }
            None => {
                self.db_refs.push(db_ref);
                true
            }
        }
    }

    pub fn clear_db_refs(&mut self) {
        self.db_refs.clear();
    }

    pub fn gene_loci(&self) -> Option<&GeneLoci> {
        self.gene_loci.as_ref()
    }

    /// Set loci once; later calls are ignored and return false
    pub fn set_gene_loci(&mut self, loci: GeneLoci) -> bool {
        if self.gene_loci.is_some() {
            return false;
        }
        self.gene_loci = Some(loci);
        true
    }

    pub fn product(&self) -> Option<&Sequence> {
        self.product.as_deref()
    }

    pub fn set_product(&mut self, product: Sequence) {
        self.product = Some(Box::new(product));
    }
}

impl FeatureStore for Sequence {
    fn features(&self) -> &[SequenceFeature] {
        &self.features
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_follow_start() {
        let s = Sequence::with_start("X", "ACGTACGT", 23);
        assert_eq!((s.start, s.end), (23, 30));
        assert_eq!(s.residues_between(24, 26), "CGT");
        assert_eq!(s.residues_between(29, 40), "GT");
        assert_eq!(s.residues_between(1, 5), "");
    }

    #[test]
    fn test_gene_loci_first_writer_wins() {
        let mut s = Sequence::new("G", "ACGT");
        let first = GeneLoci::new(
            "homo_sapiens",
            "GRCh38",
            "7",
            CoordinateMap::contiguous((1, 4), (101, 104)).unwrap(),
        );
        let second = GeneLoci::new(
            "homo_sapiens",
            "GRCh37",
            "7",
            CoordinateMap::contiguous((1, 4), (201, 204)).unwrap(),
        );
        assert!(s.set_gene_loci(first.clone()));
        assert!(!s.set_gene_loci(second));
        assert_eq!(s.gene_loci(), Some(&first));
    }

    #[test]
    fn test_add_db_ref_deduplicates() {
        let mut s = Sequence::new("ENSP00000288602", "MAAL");
        assert!(s.add_db_ref(DbRef::new("ENSEMBL", Some("112".into()), "ENSP00000288602")));
        assert!(!s.add_db_ref(DbRef::new("Ensembl", Some("112".into()), "ensp00000288602")));
        assert!(s.add_db_ref(DbRef::new("UNIPROT", None, "P15056")));
        assert_eq!(s.db_refs().len(), 2);
    }

    #[test]
    fn test_retain_features_counts_removed() {
        let mut s = Sequence::new("G", "ACGTACGT");
        s.add_feature(SequenceFeature::new("exon", 1, 2));
        s.add_feature(SequenceFeature::new("gene", 1, 8));
        assert_eq!(s.retain_features(|f| f.feature_type != "exon"), 1);
        assert_eq!(s.features().len(), 1);
    }
}
