//! Built-in subset of the Sequence Ontology
//!
//! Feature types returned by the overlap endpoint are compared by `is-a`
//! rather than by name, so `CDS_predicted` counts as `CDS` and `lincRNA`
//! counts as `transcript`. Terms not listed here only match themselves.

pub const GENE: &str = "gene";
pub const TRANSCRIPT: &str = "transcript";
pub const EXON: &str = "exon";
pub const CDS: &str = "CDS";
pub const SEQUENCE_VARIANT: &str = "sequence_variant";

/// A variant consequence that Ensembl also reports as a transcript feature
pub const NMD_TRANSCRIPT_VARIANT: &str = "NMD_transcript_variant";

// (term, parent)
const IS_A: &[(&str, &str)] = &[
    ("gene", "biological_region"),
    ("ncRNA_gene", "gene"),
    ("snRNA_gene", "ncRNA_gene"),
    ("snoRNA_gene", "ncRNA_gene"),
    ("miRNA_gene", "ncRNA_gene"),
    ("lincRNA_gene", "ncRNA_gene"),
    ("rRNA_gene", "ncRNA_gene"),
    ("protein_coding_gene", "gene"),
    ("pseudogene", "biological_region"),
    ("processed_pseudogene", "pseudogene"),
    ("unitary_pseudogene", "pseudogene"),
    ("transcript", "region"),
    ("primary_transcript", "transcript"),
    ("processed_transcript", "transcript"),
    ("aberrant_processed_transcript", "transcript"),
    ("mature_transcript", "transcript"),
    ("mRNA", "mature_transcript"),
    ("pseudogenic_transcript", "transcript"),
    ("ncRNA", "transcript"),
    ("snRNA", "ncRNA"),
    ("snoRNA", "ncRNA"),
    ("miRNA", "ncRNA"),
    ("lincRNA", "ncRNA"),
    ("lnc_RNA", "ncRNA"),
    ("rRNA", "ncRNA"),
    ("exon", "region"),
    ("coding_exon", "exon"),
    ("noncoding_exon", "exon"),
    ("five_prime_coding_exon", "coding_exon"),
    ("three_prime_coding_exon", "coding_exon"),
    ("mRNA_region", "region"),
    ("CDS", "mRNA_region"),
    ("CDS_predicted", "CDS"),
    ("CDS_fragment", "CDS"),
    ("five_prime_UTR", "mRNA_region"),
    ("three_prime_UTR", "mRNA_region"),
    ("polypeptide", "region"),
    ("sequence_variant", "variant"),
    ("structural_variant", "sequence_variant"),
    ("transcript_variant", "sequence_variant"),
    ("NMD_transcript_variant", "transcript_variant"),
    ("coding_sequence_variant", "transcript_variant"),
    ("missense_variant", "coding_sequence_variant"),
    ("synonymous_variant", "coding_sequence_variant"),
    ("stop_gained", "coding_sequence_variant"),
    ("frameshift_variant", "coding_sequence_variant"),
    ("inframe_insertion", "coding_sequence_variant"),
    ("inframe_deletion", "coding_sequence_variant"),
    ("splice_region_variant", "transcript_variant"),
    ("intron_variant", "transcript_variant"),
    ("5_prime_UTR_variant", "transcript_variant"),
    ("3_prime_UTR_variant", "transcript_variant"),
    ("upstream_gene_variant", "sequence_variant"),
    ("downstream_gene_variant", "sequence_variant"),
];

fn parent_of(term: &str) -> Option<&'static str> {
    IS_A.iter().find(|(t, _)| *t == term).map(|(_, p)| *p)
}

/// True if `term` is `ancestor` or a descendant of it
pub fn is_a(term: &str, ancestor: &str) -> bool {
    let mut current = term;
    // the table is acyclic; the bound only guards against future edits
    for _ in 0..=IS_A.len() {
        if current == ancestor {
            return true;
        }
        match parent_of(current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

/// True if `term` is a descendant of any of `ancestors`
pub fn is_any(term: &str, ancestors: &[&str]) -> bool {
    ancestors.iter().any(|a| is_a(term, a))
}

/// Transcript-like features, including `NMD_transcript_variant`
pub fn is_transcript(term: &str) -> bool {
    term == NMD_TRANSCRIPT_VARIANT || is_a(term, TRANSCRIPT)
}
