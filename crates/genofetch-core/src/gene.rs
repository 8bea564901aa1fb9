//! Genes with their spliced transcripts
//!
//! [`GeneOrchestrator`] fetches a gene's genomic sequence with its
//! transcript, exon and CDS features moved into gene coordinates, then
//! splices each transcript out of it. Transcripts get the gene's variants,
//! chromosome loci composed through the gene, cross-references and a
//! protein product.
//!
//! With a genomes service configured, genes the primary domain does not
//! know are looked up and fetched there instead.

use crate::config::ClientConfig;
use crate::error::{EnsemblError, Result};
use crate::lookup::GeneLookup;
use crate::mapping::CoordinateMap;
use crate::model::dbref::ENSEMBL;
use crate::model::{FeatureStore, GeneLoci, Sequence, SequenceFeature};
use crate::ontology::{self, CDS, EXON};
use crate::proxy::{drop_reason, transfer_features, SeqProxy, SeqVariant};
use crate::report::{DropReason, FetchReport};
use crate::rest::RequestContext;
use crate::service::EnsemblService;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A transcript cut out of its gene
#[derive(Debug, Clone, Serialize)]
pub struct SplicedTranscript {
    pub sequence: Sequence,
    /// Gene positions of the exons onto transcript positions
    pub exon_map: CoordinateMap,
}

/// A gene and the transcripts spliced from it
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedGene {
    pub gene: Sequence,
    pub transcripts: Vec<SplicedTranscript>,
}

#[derive(Debug, Default, Serialize)]
pub struct GeneOutcome {
    pub genes: Vec<AnnotatedGene>,
    pub report: FetchReport,
}

#[derive(Debug, Clone)]
pub struct GeneOrchestrator {
    genes: SeqProxy,
    transcripts: SeqProxy,
    lookup: GeneLookup,
    /// Same pipeline against the genomes domain
    genomes: Option<Box<GeneOrchestrator>>,
    max_concurrency: usize,
}

impl GeneOrchestrator {
    pub fn new(service: Arc<dyn EnsemblService>) -> Result<Self> {
        Ok(Self {
            genes: SeqProxy::new(service.clone(), SeqVariant::GENE)?,
            transcripts: SeqProxy::new(service.clone(), SeqVariant::CDNA)?,
            lookup: GeneLookup::new(service),
            genomes: None,
            max_concurrency: crate::config::DEFAULT_MAX_CONCURRENCY,
        })
    }

    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.genes = self.genes.with_config(config);
        self.transcripts = self.transcripts.with_config(config);
        self.lookup = self.lookup.with_config(config);
        self.genomes = self.genomes.map(|g| Box::new((*g).with_config(config)));
        self.max_concurrency = config.max_concurrency.max(1);
        self
    }

    /// Fall back to `service` for genes the primary domain does not have
    ///
    /// A service for the primary domain itself is ignored.
    pub fn with_genomes_service(mut self, service: Arc<dyn EnsemblService>) -> Result<Self> {
        if service.domain() == self.genes.service().domain() {
            return Ok(self);
        }
        let mut genomes = GeneOrchestrator::new(service.clone())?;
        genomes.lookup = genomes
            .lookup
            .with_model_organisms(self.lookup.model_organisms().to_vec());
        genomes.max_concurrency = self.max_concurrency;

        self.lookup = self.lookup.with_genomes_service(service);
        self.genomes = Some(Box::new(genomes));
        Ok(self)
    }

    pub fn lookup(&self) -> &GeneLookup {
        &self.lookup
    }

    /// Resolve `query` to gene ids and fetch each gene with its transcripts
    ///
    /// Unresolved tokens and genes that could not be fetched are reported,
    /// not raised. Only an unavailable service fails the call.
    pub async fn fetch_genes(&self, ctx: &RequestContext, query: &[String]) -> Result<GeneOutcome> {
        let (gene_ids, mut report) = self.lookup.resolve(ctx, query).await?;
        info!(genes = gene_ids.len(), "Resolved gene query");

        let mut genes = Vec::with_capacity(gene_ids.len());
        for (index, gene_id) in gene_ids.iter().enumerate() {
            match self.fetch_gene_and_transcripts(ctx, gene_id).await {
                Ok(outcome) => {
                    genes.extend(outcome.genes);
                    report.extend(outcome.report);
                }
                Err(EnsemblError::ServiceUnavailable(domain)) => {
                    return Err(EnsemblError::ServiceUnavailable(domain));
                }
                Err(e @ EnsemblError::Cancelled(_)) => {
                    warn!(error = %e, "Gene fetch stopped");
                    for skipped in &gene_ids[index..] {
                        report.drop_id(skipped.clone(), DropReason::Cancelled);
                    }
                    break;
                }
                Err(e) => report.drop_id(gene_id.clone(), drop_reason(&e)),
            }
        }

        Ok(GeneOutcome { genes, report })
    }

    /// Fetch one gene and splice its transcripts
    ///
    /// The outcome holds no gene unless exactly one genomic sequence came
    /// back for `gene_id`. A gene missing from the primary domain is tried
    /// on the genomes domain when one is configured.
    pub async fn fetch_gene_and_transcripts(
        &self,
        ctx: &RequestContext,
        gene_id: &str,
    ) -> Result<GeneOutcome> {
        let outcome = self.fetch_from_domain(ctx, gene_id).await?;
        let Some(genomes) = &self.genomes else {
            return Ok(outcome);
        };
        let not_found = outcome.genes.is_empty()
            && outcome
                .report
                .dropped()
                .iter()
                .all(|d| d.reason == DropReason::NotFound);
        if !not_found {
            return Ok(outcome);
        }

        debug!(gene = %gene_id, domain = %genomes.genes.service().domain(), "Trying genomes domain");
        match genomes.fetch_from_domain(ctx, gene_id).await {
            Ok(found) if !found.genes.is_empty() => Ok(found),
            Ok(_) => Ok(outcome),
            Err(e @ EnsemblError::Cancelled(_)) => Err(e),
            Err(e) => {
                warn!(gene = %gene_id, error = %e, "Genomes domain fetch failed");
                Ok(outcome)
            }
        }
    }

    async fn fetch_from_domain(&self, ctx: &RequestContext, gene_id: &str) -> Result<GeneOutcome> {
        let ids = vec![gene_id.to_string()];
        let mut outcome = self.genes.fetch(ctx, &ids).await?;
        let mut report = std::mem::take(&mut outcome.report);

        if outcome.sequences.len() != 1 {
            if !report.contains(gene_id) {
                report.drop_id(gene_id, DropReason::NotFound);
            }
            return Ok(GeneOutcome {
                genes: Vec::new(),
                report,
            });
        }
        let Some(mut gene) = outcome.sequences.pop() else {
            return Ok(GeneOutcome::default());
        };
        let gene_id = gene.name.clone();

        if let Some(loci) = self.gene_loci(ctx, &gene).await {
            gene.set_gene_loci(loci);
        }

        // release recorded when the gene was fetched; no further request
        let data_version = gene
            .db_refs()
            .iter()
            .find(|r| r.source() == ENSEMBL && r.accession().eq_ignore_ascii_case(&gene_id))
            .and_then(|r| r.version().map(str::to_string));
        let spliced: Vec<SplicedTranscript> = gene
            .features()
            .iter()
            .filter(|f| ontology::is_transcript(&f.feature_type) && f.has_parent(&gene_id))
            .filter_map(|t| match splice_transcript(&gene, t) {
                Ok(transcript) => transcript,
                Err(e) => {
                    let id = t.id().unwrap_or(&t.description).to_string();
                    report.drop_id(id, drop_reason(&e));
                    None
                }
            })
            .collect();

        let transcripts: Vec<SplicedTranscript> = stream::iter(
            spliced
                .into_iter()
                .map(|t| self.annotate_transcript(ctx, t, data_version.clone())),
        )
        .buffered(self.max_concurrency)
        .collect()
        .await;

        let removed = gene.retain_features(|f| {
            !(ontology::is_transcript(&f.feature_type) || f.is_a(EXON) || f.is_a(CDS))
        });
        debug!(gene = %gene_id, removed, transcripts = transcripts.len(), "Built gene");

        Ok(GeneOutcome {
            genes: vec![AnnotatedGene { gene, transcripts }],
            report,
        })
    }

    /// Loci from a lookup, else from the sequence description
    async fn gene_loci(&self, ctx: &RequestContext, gene: &Sequence) -> Option<GeneLoci> {
        match self.lookup.gene_loci_for(ctx, &gene.name).await {
            Ok(Some(loci)) => return Some(loci),
            Ok(None) => debug!(gene = %gene.name, "No lookup loci"),
            Err(e) => warn!(gene = %gene.name, error = %e, "Loci lookup failed"),
        }
        gene.description.as_deref().and_then(parse_chromosome_description)
    }

    /// Cross-references and protein product of a spliced transcript
    async fn annotate_transcript(
        &self,
        ctx: &RequestContext,
        mut spliced: SplicedTranscript,
        data_version: Option<String>,
    ) -> SplicedTranscript {
        let transcript = &mut spliced.sequence;
        if let Err(e) = self
            .transcripts
            .attach_cross_references(ctx, transcript, data_version.clone())
            .await
        {
            warn!(transcript = %transcript.name, error = %e, "Cross-references not added");
        }
        if let Err(e) = self
            .transcripts
            .add_product(ctx, transcript, data_version)
            .await
        {
            warn!(transcript = %transcript.name, error = %e, "Protein product not added");
        }
        spliced
    }
}

/// Build the transcript `feature` of `gene` from its exons
///
/// Falls back to CDS features when the transcript has no exons. Returns
/// `None` when it has neither.
pub fn splice_transcript(
    gene: &Sequence,
    feature: &SequenceFeature,
) -> Result<Option<SplicedTranscript>> {
    let Some(transcript_id) = feature.id() else {
        return Ok(None);
    };

    let mut pieces = gene.features_with_parent(&[EXON], transcript_id);
    if pieces.is_empty() {
        pieces = gene.features_with_parent(&[CDS], transcript_id);
    }
    if pieces.is_empty() {
        debug!(transcript = %transcript_id, "No exons or CDS, skipping");
        return Ok(None);
    }
    pieces.sort_by_key(|f| f.begin);

    let ranges: Vec<(i64, i64)> = pieces.iter().map(|f| (f.begin, f.end)).collect();
    let residues: String = ranges
        .iter()
        .map(|&(b, e)| gene.residues_between(b, e))
        .collect();
    let length = residues.len() as i64;
    if length == 0 {
        return Err(EnsemblError::unmappable(format!(
            "exons of {} lie outside the gene",
            transcript_id
        )));
    }

    let map = CoordinateMap::new(ranges, vec![(1, length)], 1, 1)?;
    let mut transcript = Sequence::new(transcript_id, residues);
    transcript.description = Some(percent_decode(&feature.description));

    transfer_features(
        gene.features(),
        &mut transcript,
        &map,
        transcript_id,
        SeqVariant::CDNA.retain,
    );

    if let Some(gene_loci) = gene.gene_loci() {
        match map.invert().compose(&gene_loci.map) {
            Ok(loci_map) => {
                transcript.set_gene_loci(GeneLoci::new(
                    gene_loci.species.clone(),
                    gene_loci.assembly.clone(),
                    gene_loci.chromosome.clone(),
                    loci_map,
                ));
            }
            Err(e) => warn!(transcript = %transcript_id, error = %e, "Transcript loci not derived"),
        }
    }

    Ok(Some(SplicedTranscript {
        sequence: transcript,
        exon_map: map,
    }))
}

fn percent_decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

/// Loci from a `chromosome:ASSEMBLY:CHR:START:END:STRAND` description
pub fn parse_chromosome_description(description: &str) -> Option<GeneLoci> {
    let tokens: Vec<&str> = description.trim().split(':').collect();
    if tokens.len() != 6 || !tokens[0].starts_with("chromosome") {
        return None;
    }
    let start: i64 = tokens[3].parse().ok()?;
    let end: i64 = tokens[4].parse().ok()?;
    let reverse = tokens[5].trim() == "-1";

    let to = if reverse { (end, start) } else { (start, end) };
    let map = CoordinateMap::contiguous((1, end - start + 1), to).ok()?;
    Some(GeneLoci::new("", tokens[1], tokens[2], map))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::feature::{ATTR_ID, ATTR_PARENT};
    use genofetch_common::types::Strand;

    #[test]
    fn test_parse_chromosome_description() {
        let loci = parse_chromosome_description("chromosome:GRCh38:7:140719327:140924929:-1").unwrap();
        assert_eq!(loci.assembly, "GRCh38");
        assert_eq!(loci.chromosome, "7");
        assert_eq!(loci.species, "");
        assert_eq!(loci.map.to_ranges(), &[(140924929, 140719327)]);

        assert!(parse_chromosome_description("ENSEMBL").is_none());
        assert!(parse_chromosome_description("scaffold:GRCh38:7:1:10:1").is_none());
        assert!(parse_chromosome_description("chromosome:GRCh38:7:1:10").is_none());
    }

    #[test]
    fn test_splice_falls_back_to_cds() {
        let mut gene = Sequence::new("G1", "ACGTACGTAC");
        gene.add_feature(SequenceFeature::new("CDS", 3, 5).with_attribute(ATTR_PARENT, "T1"));
        gene.add_feature(SequenceFeature::new("CDS", 8, 9).with_attribute(ATTR_PARENT, "T1"));
        let t = SequenceFeature::new("transcript", 1, 10)
            .with_attribute(ATTR_ID, "T1")
            .with_attribute(ATTR_PARENT, "G1")
            .with_description("BRAF%2D201");

        let spliced = splice_transcript(&gene, &t).unwrap().unwrap();
        let transcript = &spliced.sequence;
        assert_eq!(transcript.residues(), "GTATA");
        assert_eq!(spliced.exon_map.from_ranges(), &[(3, 5), (8, 9)]);
        assert_eq!(transcript.description.as_deref(), Some("BRAF-201"));
    }

    #[test]
    fn test_splice_without_exons_is_skipped() {
        let gene = Sequence::new("G1", "ACGT");
        let t = SequenceFeature::new("transcript", 1, 4).with_attribute(ATTR_ID, "T1");
        assert!(splice_transcript(&gene, &t).unwrap().is_none());
    }

    #[test]
    fn test_splice_composes_loci() {
        let mut gene = Sequence::new("G1", "A".repeat(20));
        gene.set_gene_loci(GeneLoci::new(
            "homo_sapiens",
            "GRCh38",
            "7",
            CoordinateMap::contiguous((1, 20), (1020, 1001)).unwrap(),
        ));
        gene.add_feature(
            SequenceFeature::new("exon", 2, 4)
                .with_strand(Strand::Forward)
                .with_attribute(ATTR_PARENT, "T1"),
        );
        gene.add_feature(SequenceFeature::new("exon", 10, 12).with_attribute(ATTR_PARENT, "T1"));
        let t = SequenceFeature::new("transcript", 2, 12).with_attribute(ATTR_ID, "T1");

        let transcript = splice_transcript(&gene, &t).unwrap().unwrap().sequence;
        let loci = transcript.gene_loci().unwrap();
        assert_eq!(loci.chromosome, "7");
        assert_eq!(loci.map.from_ranges(), &[(1, 6)]);
        assert_eq!(loci.map.to_ranges(), &[(1019, 1017), (1011, 1009)]);
        assert_eq!(transcript.features().len(), 2);
    }
}
