//! Integration tests for gene resolution and transcript splicing

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::MockService;
use genofetch_common::types::Strand;
use genofetch_core::model::feature::{ATTR_ALLELES, ATTR_ID, ATTR_PARENT};
use genofetch_core::model::{FeatureStore, Sequence, SequenceFeature};
use genofetch_core::report::DropReason;
use genofetch_core::rest::RequestContext;
use genofetch_core::service::LookupRecord;
use genofetch_core::GeneOrchestrator;
use std::sync::Arc;

fn gene_sequence(description: &str) -> Sequence {
    let mut gene = Sequence::new("GENE1", "ACGT".repeat(750));
    gene.description = Some(description.to_string());
    gene
}

/// 3000 bases with one two-exon transcript and a variant in the second exon
///
/// There is no `gene` feature, so features are read in gene coordinates.
fn gene_service() -> MockService {
    let features = vec![
        SequenceFeature::new("transcript", 100, 3000)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_ID, "T1")
            .with_attribute(ATTR_PARENT, "GENE1")
            .with_description("BRAF-201"),
        SequenceFeature::new("exon", 100, 200)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T1"),
        SequenceFeature::new("exon", 500, 600)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T1"),
        SequenceFeature::new("sequence_variant", 510, 510)
            .with_attribute(ATTR_ID, "rs1")
            .with_attribute(ATTR_ALLELES, "A,G"),
        SequenceFeature::new("transcript", 700, 900)
            .with_attribute(ATTR_ID, "OTHER_T")
            .with_attribute(ATTR_PARENT, "OTHER_GENE"),
    ];

    MockService::new()
        .with_sequence(gene_sequence("chromosome:GRCh38:7:10001:13000:1"))
        .with_features("GENE1", features)
}

#[tokio::test]
async fn test_fetch_gene_and_transcripts() {
    let orchestrator = GeneOrchestrator::new(Arc::new(gene_service())).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();

    assert_eq!(outcome.genes.len(), 1);
    let annotated = &outcome.genes[0];
    assert_eq!(annotated.gene.len(), 3000);
    assert_eq!(annotated.transcripts.len(), 1);

    let spliced = &annotated.transcripts[0];
    assert_eq!(spliced.sequence.name, "T1");
    assert_eq!(spliced.sequence.len(), 202);
    assert_eq!(spliced.sequence.description.as_deref(), Some("BRAF-201"));
    assert_eq!(spliced.exon_map.from_ranges(), &[(100, 200), (500, 600)]);
    assert_eq!(spliced.exon_map.to_ranges(), &[(1, 202)]);

    // exons and the variant carried over in transcript coordinates
    let exons = spliced.sequence.features_of_type(&["exon"]);
    assert_eq!((exons[1].begin, exons[1].end), (102, 202));
    let variant = spliced.sequence.features_of_type(&["sequence_variant"])[0];
    assert_eq!(variant.begin, 112);

    // gene keeps only the variant once transcripts are built
    let kinds: Vec<&str> = annotated
        .gene
        .features()
        .iter()
        .map(|f| f.feature_type.as_str())
        .collect();
    assert_eq!(kinds, vec!["sequence_variant"]);
}

#[tokio::test]
async fn test_transcript_and_two_exons_only() {
    let features = vec![
        SequenceFeature::new("transcript", 100, 3000)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_ID, "T1")
            .with_attribute(ATTR_PARENT, "GENE1"),
        SequenceFeature::new("exon", 100, 200)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T1"),
        SequenceFeature::new("exon", 500, 600)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T1"),
    ];
    let service = MockService::new()
        .with_sequence(Sequence::new("GENE1", "ACGT".repeat(750)))
        .with_features("GENE1", features);
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();

    assert!(outcome.report.is_empty());
    assert_eq!(outcome.genes.len(), 1);
    assert_eq!(outcome.genes[0].gene.len(), 3000);
    assert_eq!(outcome.genes[0].transcripts.len(), 1);

    let spliced = &outcome.genes[0].transcripts[0];
    assert_eq!(spliced.sequence.len(), 202);
    assert_eq!(spliced.exon_map.from_ranges(), &[(100, 200), (500, 600)]);
    assert_eq!(spliced.exon_map.to_ranges(), &[(1, 202)]);
}

#[tokio::test]
async fn test_gene_feature_places_chromosome_features() {
    let features = vec![
        SequenceFeature::new("gene", 10001, 13000)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_ID, "GENE1"),
        SequenceFeature::new("transcript", 10100, 13000)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_ID, "T1")
            .with_attribute(ATTR_PARENT, "GENE1"),
        SequenceFeature::new("exon", 10100, 10200)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T1"),
        SequenceFeature::new("exon", 10500, 10600)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T1"),
    ];
    let service = MockService::new()
        .with_sequence(Sequence::new("GENE1", "ACGT".repeat(750)))
        .with_features("GENE1", features);
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();

    let spliced = &outcome.genes[0].transcripts[0];
    assert_eq!(spliced.exon_map.from_ranges(), &[(100, 200), (500, 600)]);
    assert_eq!(spliced.sequence.len(), 202);
}

#[tokio::test]
async fn test_cds_only_transcript() {
    let features = vec![
        SequenceFeature::new("transcript", 1000, 1111)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_ID, "T2")
            .with_attribute(ATTR_PARENT, "GENE1"),
        SequenceFeature::new("CDS", 1000, 1011)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T2"),
        SequenceFeature::new("CDS", 1100, 1111)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_PARENT, "T2"),
    ];
    let service = MockService::new()
        .with_sequence(Sequence::new("GENE1", "ACGT".repeat(750)))
        .with_features("GENE1", features)
        .with_protein("T2", Sequence::new("ENSP2", "MKLVAGST"));
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();

    let transcripts = &outcome.genes[0].transcripts;
    assert_eq!(transcripts.len(), 1);
    let spliced = &transcripts[0];
    assert_eq!(spliced.sequence.name, "T2");
    assert_eq!(spliced.sequence.len(), 24);
    assert_eq!(spliced.exon_map.from_ranges(), &[(1000, 1011), (1100, 1111)]);

    let cds = spliced.sequence.features_of_type(&["CDS"]);
    assert_eq!((cds[0].begin, cds[0].end), (1, 12));
    assert_eq!((cds[1].begin, cds[1].end), (13, 24));
    assert_eq!(spliced.sequence.product().map(|p| p.name.as_str()), Some("ENSP2"));
}

#[tokio::test]
async fn test_reverse_strand_gene() {
    // chromosome coordinates; the gene feature maps 13000..10001 onto 1..3000
    let features = vec![
        SequenceFeature::new("gene", 10001, 13000)
            .with_strand(Strand::Reverse)
            .with_attribute(ATTR_ID, "GENE1"),
        SequenceFeature::new("transcript", 10001, 12900)
            .with_strand(Strand::Reverse)
            .with_attribute(ATTR_ID, "T1")
            .with_attribute(ATTR_PARENT, "GENE1"),
        SequenceFeature::new("exon", 12801, 12900)
            .with_strand(Strand::Reverse)
            .with_attribute(ATTR_PARENT, "T1"),
        SequenceFeature::new("exon", 12401, 12500)
            .with_strand(Strand::Reverse)
            .with_attribute(ATTR_PARENT, "T1"),
        SequenceFeature::new("sequence_variant", 12490, 12490)
            .with_strand(Strand::Forward)
            .with_attribute(ATTR_ID, "rs1")
            .with_attribute(ATTR_ALLELES, "A,G"),
    ];
    let service = MockService::new()
        .with_sequence(gene_sequence("chromosome:GRCh38:7:10001:13000:-1"))
        .with_features("GENE1", features);
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();

    let annotated = &outcome.genes[0];
    assert_eq!(annotated.transcripts.len(), 1);
    let spliced = &annotated.transcripts[0];
    assert_eq!(spliced.exon_map.from_ranges(), &[(101, 200), (501, 600)]);
    assert_eq!(spliced.sequence.len(), 200);

    let exons = spliced.sequence.features_of_type(&["exon"]);
    assert!(exons.iter().all(|e| e.strand == Strand::Reverse));

    // complemented once, on the way into the gene
    let variant = spliced.sequence.features_of_type(&["sequence_variant"])[0];
    assert_eq!(variant.begin, 111);
    assert_eq!(variant.attribute(ATTR_ALLELES), Some("T,C"));

    let loci = spliced.sequence.gene_loci().unwrap();
    assert_eq!(loci.map.to_ranges(), &[(12900, 12801), (12500, 12401)]);
}

#[tokio::test]
async fn test_cancellation_after_gene_fetch_keeps_gene() {
    let mut service = gene_service();
    service.cancel_on_lookup = true;
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();
    let ctx = RequestContext::new();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&ctx, "GENE1")
        .await
        .unwrap();

    assert!(ctx.is_cancelled());
    assert_eq!(outcome.genes.len(), 1);
    let annotated = &outcome.genes[0];
    assert_eq!(annotated.transcripts.len(), 1);
    // loci still come from the description
    assert!(annotated.gene.gene_loci().is_some());
    // the gene's own reference carries the release; nothing re-requested it
    assert!(annotated
        .gene
        .db_refs()
        .iter()
        .any(|r| r.accession() == "GENE1" && r.version() == Some("112")));
}

#[tokio::test]
async fn test_transcript_loci_from_description() {
    let orchestrator = GeneOrchestrator::new(Arc::new(gene_service())).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();
    let annotated = &outcome.genes[0];

    let gene_loci = annotated.gene.gene_loci().unwrap();
    assert_eq!(gene_loci.assembly, "GRCh38");
    assert_eq!(gene_loci.map.to_ranges(), &[(10001, 13000)]);

    let loci = annotated.transcripts[0].sequence.gene_loci().unwrap();
    assert_eq!(loci.chromosome, "7");
    assert_eq!(loci.map.from_ranges(), &[(1, 202)]);
    assert_eq!(loci.map.to_ranges(), &[(10100, 10200), (10500, 10600)]);
}

#[tokio::test]
async fn test_lookup_loci_preferred_over_description() {
    let service = gene_service().with_lookup(
        "GENE1",
        LookupRecord {
            id: Some("GENE1".into()),
            object_type: Some("Gene".into()),
            species: Some("homo_sapiens".into()),
            assembly_name: Some("GRCh38".into()),
            seq_region_name: Some("7".into()),
            strand: Some(-1),
            start: Some(50001),
            end: Some(53000),
            ..Default::default()
        },
    );
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();
    let loci = outcome.genes[0].gene.gene_loci().unwrap();
    assert_eq!(loci.species, "homo_sapiens");
    assert_eq!(loci.map.to_ranges(), &[(53000, 50001)]);
}

#[tokio::test]
async fn test_missing_gene_is_reported() {
    let orchestrator = GeneOrchestrator::new(Arc::new(MockService::new())).unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE404")
        .await
        .unwrap();
    assert!(outcome.genes.is_empty());
    assert!(outcome.report.contains("GENE404"));
}

// ============================================================================
// Query resolution
// ============================================================================

fn lookup(object_type: &str, id: &str, parent: Option<&str>) -> LookupRecord {
    LookupRecord {
        id: Some(id.to_string()),
        object_type: Some(object_type.to_string()),
        parent: parent.map(str::to_string),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_resolve_follows_parents_and_symbols() {
    let service = MockService::new()
        .with_lookup("ENSP1", lookup("Translation", "ENSP1", Some("ENST1")))
        .with_lookup("ENST1", lookup("Transcript", "ENST1", Some("ENSG1")))
        .with_lookup("ENSG2", lookup("Gene", "ENSG2", None))
        .with_symbol("human", "BRAF", &["ENSG3"])
        .with_symbol("mouse", "BRAF", &["ENSMUSG3", "ENSG3"]);
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();

    let query = vec!["ENSP1 ENSG2".to_string(), "BRAF ENST1 NOSUCH".to_string()];
    let (genes, report) = orchestrator
        .lookup()
        .resolve(&RequestContext::new(), &query)
        .await
        .unwrap();

    assert_eq!(genes, vec!["ENSG1", "ENSG2", "ENSG3", "ENSMUSG3"]);
    assert_eq!(report.dropped().len(), 1);
    assert_eq!(report.dropped()[0].id, "NOSUCH");
    assert_eq!(report.dropped()[0].reason, DropReason::Unresolved);
}

#[tokio::test]
async fn test_genes_missing_from_primary_come_from_genomes_domain() {
    let primary = MockService::new();
    let genomes = gene_service()
        .with_domain("https://genomes.mock.rest.example")
        .with_lookup("GENE1", lookup("Gene", "GENE1", None))
        .with_symbol("human", "SYM1", &["GENE1"]);
    let orchestrator = GeneOrchestrator::new(Arc::new(primary))
        .unwrap()
        .with_genomes_service(Arc::new(genomes))
        .unwrap();

    let query = vec!["GENE1 SYM1".to_string()];
    let outcome = orchestrator
        .fetch_genes(&RequestContext::new(), &query)
        .await
        .unwrap();

    assert!(outcome.report.is_empty());
    assert_eq!(outcome.genes.len(), 1);
    assert_eq!(outcome.genes[0].gene.name, "GENE1");
    assert_eq!(outcome.genes[0].transcripts.len(), 1);
}

#[tokio::test]
async fn test_genomes_service_on_same_domain_is_ignored() {
    let orchestrator = GeneOrchestrator::new(Arc::new(MockService::new()))
        .unwrap()
        .with_genomes_service(Arc::new(gene_service()))
        .unwrap();

    let outcome = orchestrator
        .fetch_gene_and_transcripts(&RequestContext::new(), "GENE1")
        .await
        .unwrap();
    assert!(outcome.genes.is_empty());
    assert!(outcome.report.contains("GENE1"));
}

#[tokio::test]
async fn test_fetch_genes_reports_unresolved_and_missing() {
    let service = gene_service()
        .with_lookup("GENE1", lookup("Gene", "GENE1", None))
        .with_lookup("GENE2", lookup("Gene", "GENE2", None));
    let orchestrator = GeneOrchestrator::new(Arc::new(service)).unwrap();

    let query = vec!["GENE1 GENE2 NOSUCH".to_string()];
    let outcome = orchestrator
        .fetch_genes(&RequestContext::new(), &query)
        .await
        .unwrap();

    assert_eq!(outcome.genes.len(), 1);
    assert_eq!(outcome.genes[0].gene.name, "GENE1");
    assert!(outcome.report.contains("GENE2"));
    assert!(outcome.report.contains("NOSUCH"));
}
