//! Fetch sequences in one coordinate system and annotate them
//!
//! A [`SeqProxy`] is parameterised by a [`SeqVariant`]. `fetch` runs:
//!
//! 1. accession validation and an availability check
//! 2. chunked sequence requests, keeping what arrived before a failed chunk
//! 3. per accession, bounded in parallel: overlap features, the
//!    genome-to-sequence map, feature transfer, the protein product and
//!    cross-references
//!
//! Failures in step 3 drop only the affected accession's annotations; the
//! sequence is still returned and listed as unannotated in the report. The
//! product is only added once features were mapped.

pub mod product;
pub mod transfer;
pub mod variant;

pub use product::{add_protein_product, map_cds_to_protein};
pub use transfer::{
    genomic_ranges_from_features, reverse_complement_allele_list, reverse_complement_alleles,
    transfer_features,
};
pub use variant::SeqVariant;

use crate::accession::AccessionValidator;
use crate::config::ClientConfig;
use crate::error::{EnsemblError, Result};
use crate::mapping::CoordinateMap;
use crate::model::dbref::ENSEMBL;
use crate::model::{DbRef, Sequence, SequenceFeature};
use crate::report::{DropReason, FetchReport};
use crate::rest::RequestContext;
use crate::service::EnsemblService;
use futures::stream::{self, StreamExt};
use genofetch_common::types::SeqType;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sequences fetched by one request and the identifiers that were dropped
#[derive(Debug, Default, Serialize)]
pub struct FetchOutcome {
    pub sequences: Vec<Sequence>,
    pub report: FetchReport,
}

#[derive(Clone)]
pub struct SeqProxy {
    service: Arc<dyn EnsemblService>,
    variant: SeqVariant,
    validator: AccessionValidator,
    max_batch_size: usize,
    max_concurrency: usize,
}

impl std::fmt::Debug for SeqProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeqProxy")
            .field("variant", &self.variant)
            .field("domain", &self.service.domain())
            .field("max_batch_size", &self.max_batch_size)
            .finish_non_exhaustive()
    }
}

impl SeqProxy {
    pub fn new(service: Arc<dyn EnsemblService>, variant: SeqVariant) -> Result<Self> {
        Ok(Self {
            service,
            validator: variant.validator()?,
            variant,
            max_batch_size: crate::config::DEFAULT_MAX_BATCH_SIZE,
            max_concurrency: crate::config::DEFAULT_MAX_CONCURRENCY,
        })
    }

    /// Take batch size and concurrency from `config`
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.max_batch_size = config.max_batch_size.max(1);
        self.max_concurrency = config.max_concurrency.max(1);
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    pub fn variant(&self) -> &SeqVariant {
        &self.variant
    }

    pub fn service(&self) -> &Arc<dyn EnsemblService> {
        &self.service
    }

    /// Fetch and annotate the sequences for `accessions`
    ///
    /// Fails only when the service is unavailable. Anything else that goes
    /// wrong is reported per identifier in the outcome.
    pub async fn fetch(&self, ctx: &RequestContext, accessions: &[String]) -> Result<FetchOutcome> {
        let mut report = FetchReport::new();

        let mut ids: Vec<String> = Vec::with_capacity(accessions.len());
        for accession in accessions {
            match self.validator.check(accession) {
                Ok(valid) => {
                    if !ids.iter().any(|id| id.eq_ignore_ascii_case(valid)) {
                        ids.push(valid.to_string());
                    }
                }
                Err(e) => report.drop_id(accession.trim(), drop_reason(&e)),
            }
        }
        if ids.is_empty() {
            return Ok(FetchOutcome {
                sequences: Vec::new(),
                report,
            });
        }

        if !self.service.is_available(ctx).await? {
            return Err(EnsemblError::ServiceUnavailable(self.service.domain().to_string()));
        }
        let data_version = self.service.data_version(ctx).await?;

        let sequences = self.fetch_chunks(ctx, &ids, &data_version, &mut report).await;
        info!(
            variant = self.variant.name,
            requested = ids.len(),
            fetched = sequences.len(),
            "Fetched sequences"
        );

        let enriched: Vec<(Sequence, FetchReport)> = stream::iter(
            sequences
                .into_iter()
                .map(|seq| self.enrich(ctx, seq, data_version.clone())),
        )
        .buffered(self.max_concurrency)
        .collect()
        .await;

        let mut sequences = Vec::with_capacity(enriched.len());
        for (seq, dropped) in enriched {
            report.extend(dropped);
            sequences.push(seq);
        }

        Ok(FetchOutcome { sequences, report })
    }

    /// Request `ids` in chunks of at most the batch size
    ///
    /// A failed or empty chunk stops the remaining chunks; sequences from
    /// earlier chunks are kept and the unfetched ids are reported.
    async fn fetch_chunks(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        data_version: &Option<String>,
        report: &mut FetchReport,
    ) -> Vec<Sequence> {
        let mut sequences = Vec::new();
        let chunks: Vec<&[String]> = ids.chunks(self.max_batch_size).collect();

        for (index, chunk) in chunks.iter().enumerate() {
            let result = self
                .service
                .fetch_sequences(ctx, chunk, self.variant.seq_type, self.variant.object_type)
                .await
                .and_then(|fetched| {
                    if fetched.is_empty() {
                        Err(EnsemblError::parse(format!(
                            "no data returned for {}",
                            chunk.join(",")
                        )))
                    } else {
                        Ok(fetched)
                    }
                });

            match result {
                Ok(fetched) => {
                    if fetched.len() != chunk.len() {
                        warn!(
                            requested = chunk.len(),
                            fetched = fetched.len(),
                            "Sequence count does not match request"
                        );
                    }
                    for mut seq in fetched {
                        if is_requested(&seq.name, chunk) {
                            seq.add_db_ref(DbRef::new(ENSEMBL, data_version.clone(), seq.name.clone()));
                        }
                        sequences.push(seq);
                    }
                }
                Err(e) => {
                    warn!(
                        chunk = index + 1,
                        of = chunks.len(),
                        error = %e,
                        "Sequence fetch aborted"
                    );
                    let reason = if e.is_fatal() {
                        DropReason::Cancelled
                    } else {
                        DropReason::NotFound
                    };
                    for id in chunks[index..].iter().flat_map(|c| c.iter()) {
                        report.drop_id(id.clone(), reason.clone());
                    }
                    break;
                }
            }
        }

        sequences
    }

    /// Features, product and cross-references for one fetched sequence
    async fn enrich(
        &self,
        ctx: &RequestContext,
        mut seq: Sequence,
        data_version: Option<String>,
    ) -> (Sequence, FetchReport) {
        let mut report = FetchReport::new();
        let accession = seq.name.clone();

        let mapped = if self.variant.fetches_features() {
            match self.add_features(ctx, &mut seq).await {
                Ok(map) => map.is_some(),
                Err(e) => {
                    report.annotation_failed(accession.clone(), drop_reason(&e));
                    false
                }
            }
        } else {
            false
        };

        if self.variant.has_product {
            if !mapped {
                debug!(accession = %accession, "No feature map, protein product skipped");
            } else if let Err(e) = self.add_product(ctx, &mut seq, data_version.clone()).await {
                warn!(accession = %accession, error = %e, "Protein product not added");
            }
        }

        if let Err(e) = self.attach_cross_references(ctx, &mut seq, data_version).await {
            warn!(accession = %accession, error = %e, "Cross-references not added");
        }

        (seq, report)
    }

    /// Fetch overlap features for `seq` and copy the retained ones onto it
    ///
    /// Returns the genome-to-sequence map, or `None` if nothing identified
    /// the sequence. A self-located variant falls back to the identity map
    /// over the sequence's own range.
    pub async fn add_features(
        &self,
        ctx: &RequestContext,
        seq: &mut Sequence,
    ) -> Result<Option<CoordinateMap>> {
        let accession = seq.name.clone();
        let features = self
            .service
            .overlap_features(ctx, &accession, self.variant.feature_types)
            .await?;
        if features.is_empty() {
            debug!(accession = %accession, "No overlap features");
            return Ok(None);
        }

        let Some(map) = self.genome_map(&features, seq)? else {
            debug!(accession = %accession, "No identifying features");
            return Ok(None);
        };
        transfer_features(&features, seq, &map, &accession, self.variant.retain);
        Ok(Some(map))
    }

    fn genome_map(&self, features: &[SequenceFeature], seq: &Sequence) -> Result<Option<CoordinateMap>> {
        let identifying = self.variant.identifying_features(features, &seq.name);
        if identifying.is_empty() && self.variant.self_located && !seq.is_empty() {
            debug!(accession = %seq.name, "No identifying features, using sequence coordinates");
            return CoordinateMap::contiguous((seq.start, seq.end), (seq.start, seq.end)).map(Some);
        }
        genomic_ranges_from_features(&identifying, &seq.name, seq.start)
    }

    /// Fetch the translation of `seq` and link it as the product
    ///
    /// Returns whether a CDS to protein map could be derived.
    pub async fn add_product(
        &self,
        ctx: &RequestContext,
        seq: &mut Sequence,
        data_version: Option<String>,
    ) -> Result<bool> {
        let ids = vec![seq.name.clone()];
        let Some(mut protein) = self
            .service
            .fetch_sequences(ctx, &ids, SeqType::Protein, None)
            .await?
            .into_iter()
            .next()
        else {
            debug!(accession = %seq.name, "No protein product");
            return Ok(false);
        };

        for db_ref in self.service.cross_references(ctx, &protein.name).await? {
            protein.add_db_ref(db_ref);
        }
        Ok(add_protein_product(seq, protein, data_version))
    }

    /// Add the service's cross-references for `seq` plus a self reference
    ///
    /// Safe to repeat: equivalent references are merged, not duplicated.
    pub async fn attach_cross_references(
        &self,
        ctx: &RequestContext,
        seq: &mut Sequence,
        data_version: Option<String>,
    ) -> Result<()> {
        seq.add_db_ref(DbRef::new(ENSEMBL, data_version, seq.name.clone()));
        for db_ref in self.service.cross_references(ctx, &seq.name).await? {
            seq.add_db_ref(db_ref);
        }
        Ok(())
    }
}

/// Name matches a requested id, or is the protein of a requested transcript
fn is_requested(name: &str, ids: &[String]) -> bool {
    let as_transcript = name.replacen("ENSP", "ENST", 1);
    ids.iter()
        .any(|id| id.eq_ignore_ascii_case(name) || id.eq_ignore_ascii_case(&as_transcript))
}

pub(crate) fn drop_reason(error: &EnsemblError) -> DropReason {
    match error {
        EnsemblError::InvalidAccession(_) => DropReason::InvalidAccession,
        EnsemblError::Cancelled(_) => DropReason::Cancelled,
        EnsemblError::ServiceUnavailable(_) => DropReason::ServiceUnavailable,
        EnsemblError::MixedStrand(_)
        | EnsemblError::InvalidMapping(_)
        | EnsemblError::Unmappable(_) => DropReason::Unmapped(error.to_string()),
        other => DropReason::Failed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_requested() {
        let ids = vec!["ENST00000288602".to_string()];
        assert!(is_requested("ENST00000288602", &ids));
        assert!(is_requested("ENSP00000288602", &ids));
        assert!(!is_requested("ENSP00000288603", &ids));
    }

    #[test]
    fn test_drop_reason() {
        assert_eq!(
            drop_reason(&EnsemblError::cancelled("x")),
            DropReason::Cancelled
        );
        assert_eq!(
            drop_reason(&EnsemblError::InvalidAccession("BRAF".into())),
            DropReason::InvalidAccession
        );
        assert!(matches!(
            drop_reason(&EnsemblError::MixedStrand("T1".into())),
            DropReason::Unmapped(_)
        ));
        assert!(matches!(
            drop_reason(&EnsemblError::network("down")),
            DropReason::Failed(_)
        ));
    }
}
