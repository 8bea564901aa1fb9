//! Per coordinate system fetch configuration
//!
//! Each [`SeqVariant`] says which sequence to request, which overlap features
//! to request alongside it, which of those features locate the fetched
//! sequence on the genome, and which are copied onto it.

use crate::accession::{AccessionValidator, CCDS_ACCESSION_PATTERN, ENSEMBL_ACCESSION_PATTERN};
use crate::error::Result;
use crate::model::SequenceFeature;
use crate::ontology::{self, CDS, EXON, GENE};
use genofetch_common::types::{ObjectType, SeqType};

/// Decides whether a feature applies to an accession
pub type FeaturePredicate = fn(&SequenceFeature, &str) -> bool;

#[derive(Clone, Copy)]
pub struct SeqVariant {
    pub name: &'static str,
    pub seq_type: SeqType,
    pub object_type: Option<ObjectType>,
    /// `feature` values for the overlap endpoint
    pub feature_types: &'static [&'static str],
    /// Features that locate the accession on the genome
    pub identify: FeaturePredicate,
    /// Features copied onto the fetched sequence
    pub retain: FeaturePredicate,
    /// Whether a translated product is fetched and mapped
    pub has_product: bool,
    /// Features are taken as already in the fetched sequence's coordinates
    /// when none identify it
    pub self_located: bool,
    /// Empty means any identifier is accepted
    pub accession_patterns: &'static [&'static str],
}

impl std::fmt::Debug for SeqVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeqVariant")
            .field("name", &self.name)
            .field("seq_type", &self.seq_type)
            .field("object_type", &self.object_type)
            .field("feature_types", &self.feature_types)
            .field("has_product", &self.has_product)
            .field("self_located", &self.self_located)
            .finish_non_exhaustive()
    }
}

const ENSEMBL_PATTERNS: &[&str] = &[ENSEMBL_ACCESSION_PATTERN, CCDS_ACCESSION_PATTERN];

impl SeqVariant {
    pub const GENOMIC: SeqVariant = SeqVariant {
        name: "genomic",
        seq_type: SeqType::Genomic,
        object_type: None,
        feature_types: &["transcript", "exon", "cds", "variation"],
        identify: genomic_identifies,
        retain: genomic_retains,
        has_product: true,
        self_located: false,
        accession_patterns: ENSEMBL_PATTERNS,
    };

    pub const CDNA: SeqVariant = SeqVariant {
        name: "cdna",
        seq_type: SeqType::Cdna,
        object_type: Some(ObjectType::Transcript),
        feature_types: &["exon", "cds", "variation"],
        identify: cdna_identifies,
        retain: cdna_retains,
        has_product: true,
        self_located: false,
        accession_patterns: ENSEMBL_PATTERNS,
    };

    pub const CDS: SeqVariant = SeqVariant {
        name: "cds",
        seq_type: SeqType::Cds,
        object_type: Some(ObjectType::Transcript),
        feature_types: &["cds", "variation"],
        identify: cds_identifies,
        retain: cds_retains,
        has_product: true,
        self_located: false,
        accession_patterns: ENSEMBL_PATTERNS,
    };

    pub const PROTEIN: SeqVariant = SeqVariant {
        name: "protein",
        seq_type: SeqType::Protein,
        object_type: None,
        feature_types: &[],
        identify: never,
        retain: never,
        has_product: false,
        self_located: false,
        accession_patterns: ENSEMBL_PATTERNS,
    };

    pub const GENE: SeqVariant = SeqVariant {
        name: "gene",
        seq_type: SeqType::Genomic,
        object_type: Some(ObjectType::Gene),
        feature_types: &["gene", "transcript", "exon", "cds", "variation"],
        identify: gene_identifies,
        retain: gene_retains,
        has_product: false,
        self_located: true,
        accession_patterns: &[],
    };

    /// Variant that fetches sequences of the given type
    pub fn for_seq_type(seq_type: SeqType) -> SeqVariant {
        match seq_type {
            SeqType::Genomic => Self::GENOMIC,
            SeqType::Cdna => Self::CDNA,
            SeqType::Cds => Self::CDS,
            SeqType::Protein => Self::PROTEIN,
        }
    }

    pub fn fetches_features(&self) -> bool {
        !self.feature_types.is_empty()
    }

    pub fn validator(&self) -> Result<AccessionValidator> {
        if self.accession_patterns.is_empty() {
            Ok(AccessionValidator::any())
        } else {
            AccessionValidator::from_patterns(self.accession_patterns)
        }
    }

    /// Features that locate `accession`, in their original order
    pub fn identifying_features<'a>(
        &self,
        features: &'a [SequenceFeature],
        accession: &str,
    ) -> Vec<&'a SequenceFeature> {
        features
            .iter()
            .filter(|f| (self.identify)(f, accession))
            .collect()
    }

    pub fn retains(&self, feature: &SequenceFeature, accession: &str) -> bool {
        (self.retain)(feature, accession)
    }
}

/// No Parent, or a Parent naming the accession
fn may_belong(feature: &SequenceFeature, accession: &str) -> bool {
    feature.parent().is_none() || feature.has_parent(accession)
}

fn never(_: &SequenceFeature, _: &str) -> bool {
    false
}

fn genomic_identifies(feature: &SequenceFeature, accession: &str) -> bool {
    ontology::is_transcript(&feature.feature_type) && feature.has_id(accession)
}

fn genomic_retains(feature: &SequenceFeature, accession: &str) -> bool {
    !ontology::is_transcript(&feature.feature_type) && may_belong(feature, accession)
}

fn cdna_identifies(feature: &SequenceFeature, accession: &str) -> bool {
    feature.is_a(EXON) && feature.has_parent(accession)
}

fn cdna_retains(feature: &SequenceFeature, accession: &str) -> bool {
    !ontology::is_transcript(&feature.feature_type) && may_belong(feature, accession)
}

fn cds_identifies(feature: &SequenceFeature, accession: &str) -> bool {
    feature.is_a(CDS) && feature.has_parent(accession)
}

fn cds_retains(feature: &SequenceFeature, accession: &str) -> bool {
    !feature.is_a(CDS) && may_belong(feature, accession)
}

fn gene_identifies(feature: &SequenceFeature, accession: &str) -> bool {
    feature.is_a(GENE) && feature.has_id(accession)
}

fn gene_retains(feature: &SequenceFeature, accession: &str) -> bool {
    if feature.is_a(GENE) {
        return false;
    }
    if ontology::is_transcript(&feature.feature_type) {
        return feature.has_parent(accession);
    }
    true
}
