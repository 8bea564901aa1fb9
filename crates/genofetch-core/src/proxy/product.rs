//! Linking a coding sequence to its translated protein

use crate::mapping::{span_len, CoordinateMap, Span};
use crate::model::dbref::{ENSEMBL, UNIPROT};
use crate::model::{DbRef, FeatureStore, Sequence};
use crate::ontology::CDS;
use tracing::{debug, warn};

/// Drop `count` positions from the end of the traversal of `ranges`
fn remove_end_positions(count: i64, ranges: &mut Vec<Span>) {
    let mut left = count;
    while left > 0 {
        let Some(last) = ranges.last_mut() else {
            return;
        };
        let len = span_len(*last);
        if len <= left {
            left -= len;
            ranges.pop();
        } else {
            if last.1 >= last.0 {
                last.1 -= left;
            } else {
                last.1 += left;
            }
            left = 0;
        }
    }
}

/// Map the CDS features of `dna` onto the residues of `protein` at 3:1
///
/// The first CDS's phase is skipped, an incomplete trailing codon is
/// dropped, a leading `X` residue is excluded, and a trailing stop codon is
/// removed when the codon count exceeds the protein length by one. Returns
/// `None` unless codons and residues then agree.
pub fn map_cds_to_protein(dna: &Sequence, protein: &Sequence) -> Option<CoordinateMap> {
    let mut cds = dna.features_of_type(&[CDS]);
    if cds.is_empty() {
        return None;
    }
    cds.sort_by_key(|f| f.begin);

    let mut ranges: Vec<Span> = cds.iter().map(|f| (f.begin, f.end)).collect();
    if let Some(phase) = cds[0].phase.filter(|p| *p > 0) {
        ranges[0].0 += i64::from(phase);
        if ranges[0].0 > ranges[0].1 {
            ranges.remove(0);
        }
    }

    let mapped: i64 = ranges.iter().map(|&r| span_len(r)).sum();
    remove_end_positions(mapped % 3, &mut ranges);
    let mut codons = mapped / 3;

    let mut protein_start = 1;
    let mut protein_len = protein.len() as i64;
    if protein.residues().starts_with('X') {
        protein_start = 2;
        protein_len -= 1;
    }

    if codons == protein_len + 1 {
        codons -= 1;
        remove_end_positions(3, &mut ranges);
    }

    if codons != protein_len || protein_len <= 0 {
        debug!(
            dna = %dna.name,
            protein = %protein.name,
            codons,
            residues = protein_len,
            "CDS length does not match protein"
        );
        return None;
    }

    CoordinateMap::new(
        ranges,
        vec![(protein_start, protein_start + protein_len - 1)],
        3,
        1,
    )
    .ok()
}

/// Attach `protein` as the product of `dna`
///
/// Adds an Ensembl reference to the protein carrying the CDS map, and
/// mirrors every UniProt reference of the protein onto `dna` with the same
/// map. Both are versioned with the Ensembl `data_version`. Returns false,
/// leaving `dna` unchanged, when no map can be derived.
pub fn add_protein_product(dna: &mut Sequence, protein: Sequence, data_version: Option<String>) -> bool {
    let Some(map) = map_cds_to_protein(dna, &protein) else {
        return false;
    };

    dna.add_db_ref(
        DbRef::new(ENSEMBL, data_version.clone(), protein.name.clone()).with_mapping(map.clone()),
    );

    for uniprot in protein.db_refs().iter().filter(|r| r.source() == UNIPROT) {
        let matches: Vec<usize> = dna
            .db_refs()
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.source() == UNIPROT && r.accession().eq_ignore_ascii_case(uniprot.accession())
            })
            .map(|(i, _)| i)
            .collect();

        if matches.len() > 1 {
            warn!(
                dna = %dna.name,
                accession = %uniprot.accession(),
                count = matches.len(),
                "Several matching UniProt references, using the first"
            );
        }

        match matches.first() {
            Some(&i) => {
                let existing = &mut dna.db_refs_mut()[i];
                existing.set_version(data_version.clone());
                existing.set_mapping(Some(map.clone()));
            }
            None => {
                dna.add_db_ref(
                    DbRef::new(UNIPROT, data_version.clone(), uniprot.accession())
                        .with_mapping(map.clone()),
                );
            }
        }
    }

    dna.set_product(protein);
    true
}
