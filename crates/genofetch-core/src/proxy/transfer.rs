//! Deriving a genome-to-sequence map from features, and moving features across it

use crate::error::{EnsemblError, Result};
use crate::mapping::{total_len, CoordinateMap, Span};
use crate::model::dbref::ENSEMBL;
use crate::model::feature::ATTR_ALLELES;
use crate::model::{Sequence, SequenceFeature};
use crate::ontology::SEQUENCE_VARIANT;
use crate::proxy::variant::FeaturePredicate;
use tracing::debug;

/// Feature group the service uses for "no source"
const UNNAMED_GROUP: &str = ".";

/// Map the genomic ranges of `identifying` onto `[start, start + len - 1]`
///
/// All features must share a strand; unknown strand counts as forward.
/// Reverse ranges are written `(end, begin)` and ordered high to low.
/// Returns `None` when there are no identifying features.
pub fn genomic_ranges_from_features(
    identifying: &[&SequenceFeature],
    accession: &str,
    start: i64,
) -> Result<Option<CoordinateMap>> {
    if identifying.is_empty() {
        return Ok(None);
    }

    let reverse = identifying.iter().filter(|f| f.strand.is_reverse()).count();
    if reverse != 0 && reverse != identifying.len() {
        return Err(EnsemblError::MixedStrand(accession.to_string()));
    }
    let forward = reverse == 0;

    let mut ranges: Vec<Span> = identifying
        .iter()
        .map(|f| if forward { (f.begin, f.end) } else { (f.end, f.begin) })
        .collect();
    if forward {
        ranges.sort_by_key(|r| r.0);
    } else {
        ranges.sort_by_key(|r| std::cmp::Reverse(r.0));
    }

    let mapped = total_len(&ranges);
    CoordinateMap::new(ranges, vec![(start, start + mapped - 1)], 1, 1).map(Some)
}

/// Copy the features `retain` accepts from genomic coordinates onto `target`
///
/// Features are copied in mapped order: ascending begin on the forward
/// strand, descending end on the reverse. A feature spanning a gap covers
/// everything between its outermost mapped positions. Copies keep their
/// source strand; variants moved through a reverse map get complemented
/// alleles. A group of `.` becomes the Ensembl source name. Returns the
/// number of features copied.
pub fn transfer_features(
    features: &[SequenceFeature],
    target: &mut Sequence,
    map: &CoordinateMap,
    accession: &str,
    retain: FeaturePredicate,
) -> usize {
    let forward = map.is_forward();

    let mut retained: Vec<&SequenceFeature> =
        features.iter().filter(|f| retain(f, accession)).collect();
    if forward {
        retained.sort_by_key(|f| f.begin);
    } else {
        retained.sort_by_key(|f| std::cmp::Reverse(f.end));
    }

    let mut count = 0;
    for feature in retained {
        let Some(pieces) = map.locate_range(feature.begin, feature.end) else {
            continue;
        };
        let begin = pieces.iter().map(|p| p.0.min(p.1)).min().unwrap_or(0);
        let end = pieces.iter().map(|p| p.0.max(p.1)).max().unwrap_or(0);

        let mut copy = feature.clone();
        copy.begin = begin;
        copy.end = end;
        if copy.group.as_deref() == Some(UNNAMED_GROUP) {
            copy.group = Some(ENSEMBL.to_string());
        }
        if !forward && copy.is_a(SEQUENCE_VARIANT) {
            reverse_complement_alleles(&mut copy);
        }
        target.add_feature(copy);
        count += 1;
    }

    debug!(accession = %accession, count, "Transferred features");
    count
}

fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' | 'U' => 'A',
        'G' => 'C',
        'C' => 'G',
        'a' => 't',
        't' | 'u' => 'a',
        'g' => 'c',
        'c' => 'g',
        other => other,
    }
}

fn is_nucleotide_allele(allele: &str) -> bool {
    !allele.is_empty()
        && allele
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T' | 'U' | 'N' | '-'))
}

/// Reverse complement each comma-separated allele, keeping case and gaps
///
/// Tokens that are not nucleotides, such as `HGMD_MUTATION`, are unchanged.
pub fn reverse_complement_allele_list(alleles: &str) -> String {
    alleles
        .split(',')
        .map(|allele| {
            if is_nucleotide_allele(allele) {
                allele.chars().rev().map(complement).collect()
            } else {
                allele.to_string()
            }
        })
        .collect::<Vec<String>>()
        .join(",")
}

/// Complement the `alleles` attribute of a variant and use it as the description
pub fn reverse_complement_alleles(feature: &mut SequenceFeature) {
    let Some(alleles) = feature.attribute(ATTR_ALLELES) else {
        return;
    };
    let complemented = reverse_complement_allele_list(alleles);
    feature.set_attribute(ATTR_ALLELES, complemented.clone());
    feature.description = complemented;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::feature::{ATTR_ID, ATTR_PARENT};
    use crate::model::FeatureStore;
    use crate::proxy::variant::SeqVariant;
    use genofetch_common::types::Strand;

    #[test]
    fn test_reverse_complement_alleles() {
        assert_eq!(reverse_complement_allele_list("G,g,C,T,A"), "C,c,G,A,T");
        assert_eq!(reverse_complement_allele_list("-GATt"), "aATC-");
        assert_eq!(
            reverse_complement_allele_list("C,G,-TAC,HGMD_MUTATION,gac"),
            "G,C,GTA-,HGMD_MUTATION,gtc"
        );
        assert_eq!(reverse_complement_allele_list("A,G"), "T,C");
    }

    #[test]
    fn test_reverse_complement_updates_description() {
        let mut f = SequenceFeature::new("sequence_variant", 5, 5)
            .with_attribute(ATTR_ALLELES, "A,G")
            .with_description("A,G");
        reverse_complement_alleles(&mut f);
        assert_eq!(f.attribute(ATTR_ALLELES), Some("T,C"));
        assert_eq!(f.description, "T,C");

        let mut plain = SequenceFeature::new("sequence_variant", 5, 5).with_description("x");
        reverse_complement_alleles(&mut plain);
        assert_eq!(plain.description, "x");
    }

    #[test]
    fn test_ranges_forward_sorted_and_offset() {
        let acc = "ENST0001";
        let a = SequenceFeature::new("CDS", 20000, 20500).with_strand(Strand::Forward);
        let b = SequenceFeature::new("CDS", 10500, 10600);
        let map = genomic_ranges_from_features(&[&a, &b], acc, 23)
            .unwrap()
            .unwrap();
        assert_eq!(map.from_ranges(), &[(10500, 10600), (20000, 20500)]);
        assert_eq!(map.to_ranges(), &[(23, 624)]);
    }

    #[test]
    fn test_ranges_reverse() {
        let a = SequenceFeature::new("exon", 10500, 10600).with_strand(Strand::Reverse);
        let b = SequenceFeature::new("exon", 20000, 20500).with_strand(Strand::Reverse);
        let map = genomic_ranges_from_features(&[&a, &b], "T", 1).unwrap().unwrap();
        assert_eq!(map.from_ranges(), &[(20500, 20000), (10600, 10500)]);
        assert_eq!(map.to_ranges(), &[(1, 602)]);
        assert!(!map.is_forward());
    }

    #[test]
    fn test_mixed_strands_abort() {
        let a = SequenceFeature::new("exon", 1, 10).with_strand(Strand::Reverse);
        let b = SequenceFeature::new("exon", 20, 30).with_strand(Strand::Forward);
        let err = genomic_ranges_from_features(&[&a, &b], "T1", 1).unwrap_err();
        assert!(matches!(err, EnsemblError::MixedStrand(ref acc) if acc == "T1"));
        assert!(genomic_ranges_from_features(&[], "T1", 1).unwrap().is_none());
    }

    #[test]
    fn test_partial_overlap_is_clipped() {
        let map = CoordinateMap::new(vec![(4, 6), (10, 12)], vec![(1, 6)], 1, 1).unwrap();
        let features = vec![SequenceFeature::new("sequence_variant", 3, 4)];
        let mut target = Sequence::new("T", "ACGTAC");
        let n = transfer_features(&features, &mut target, &map, "T", SeqVariant::CDS.retain);
        assert_eq!(n, 1);
        assert_eq!((target.features()[0].begin, target.features()[0].end), (1, 1));
    }

    #[test]
    fn test_unmapped_features_are_skipped() {
        let map = CoordinateMap::new(vec![(4, 6), (10, 12)], vec![(1, 6)], 1, 1).unwrap();
        let features = vec![SequenceFeature::new("sequence_variant", 7, 9)];
        let mut target = Sequence::new("T", "ACGTAC");
        assert_eq!(
            transfer_features(&features, &mut target, &map, "T", SeqVariant::CDS.retain),
            0
        );
    }

    #[test]
    fn test_feature_spanning_intron_covers_both_exons() {
        let map = CoordinateMap::new(vec![(4, 6), (10, 12)], vec![(1, 6)], 1, 1).unwrap();
        let features = vec![SequenceFeature::new("sequence_variant", 5, 11)];
        let mut target = Sequence::new("T", "ACGTAC");
        transfer_features(&features, &mut target, &map, "T", SeqVariant::CDS.retain);
        assert_eq!((target.features()[0].begin, target.features()[0].end), (2, 5));
    }

    #[test]
    fn test_reverse_transfer_complements_and_orders() {
        let acc = "ENST0001";
        let exon = SequenceFeature::new("exon", 101, 110)
            .with_strand(Strand::Reverse)
            .with_attribute(ATTR_PARENT, acc);
        let map = genomic_ranges_from_features(&[&exon], acc, 1).unwrap().unwrap();

        let features = vec![
            SequenceFeature::new("sequence_variant", 102, 102)
                .with_strand(Strand::Forward)
                .with_attribute(ATTR_ALLELES, "A,G,HGMD_MUTATION")
                .with_attribute(ATTR_ID, "rs1"),
            SequenceFeature::new("sequence_variant", 109, 109)
                .with_strand(Strand::Forward)
                .with_attribute(ATTR_ALLELES, "C,T")
                .with_attribute(ATTR_ID, "rs2"),
            exon.clone(),
        ];
        let mut target = Sequence::new(acc, "ACGTACGTAC");
        let n = transfer_features(&features, &mut target, &map, acc, SeqVariant::CDNA.retain);
        assert_eq!(n, 3);

        let copied = target.features();
        // descending genomic end: exon (110), rs2 (109), rs1 (102)
        assert_eq!(copied[0].feature_type, "exon");
        assert_eq!((copied[0].begin, copied[0].end), (1, 10));
        assert_eq!(copied[0].strand, Strand::Reverse);
        assert_eq!(copied[1].id(), Some("rs2"));
        assert_eq!((copied[1].begin, copied[1].end), (2, 2));
        assert_eq!(copied[1].attribute(ATTR_ALLELES), Some("G,A"));
        assert_eq!(copied[2].id(), Some("rs1"));
        assert_eq!(copied[2].begin, 9);
        assert_eq!(copied[2].description, "T,C,HGMD_MUTATION");
        assert_eq!(copied[2].strand, Strand::Forward);
    }

    #[test]
    fn test_unnamed_group_becomes_source_name() {
        let map = CoordinateMap::contiguous((11, 20), (1, 10)).unwrap();
        let mut unnamed = SequenceFeature::new("exon", 11, 12);
        unnamed.group = Some(".".to_string());
        let mut havana = SequenceFeature::new("exon", 13, 14);
        havana.group = Some("havana".to_string());
        let ungrouped = SequenceFeature::new("exon", 15, 16);

        let mut target = Sequence::new("T", "ACGTACGTAC");
        let features = vec![unnamed, havana, ungrouped];
        transfer_features(&features, &mut target, &map, "T", SeqVariant::CDS.retain);

        let groups: Vec<Option<&str>> = target.features().iter().map(|f| f.group.as_deref()).collect();
        assert_eq!(groups, vec![Some("ENSEMBL"), Some("havana"), None]);
    }
}
