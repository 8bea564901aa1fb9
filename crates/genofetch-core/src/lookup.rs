//! Resolving user queries to gene ids and genes to chromosome loci
//!
//! Every lookup asks the primary service first and the genomes service, if
//! one is set, only when the primary has no answer.

use crate::config::{ClientConfig, DEFAULT_MODEL_ORGANISMS};
use crate::error::Result;
use crate::mapping::CoordinateMap;
use crate::model::GeneLoci;
use crate::report::{DropReason, FetchReport};
use crate::rest::RequestContext;
use crate::service::{EnsemblService, LookupRecord};
use genofetch_common::types::ObjectType;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct GeneLookup {
    service: Arc<dyn EnsemblService>,
    genomes: Option<Arc<dyn EnsemblService>>,
    model_organisms: Vec<String>,
}

impl std::fmt::Debug for GeneLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneLookup")
            .field("domain", &self.service.domain())
            .field("genomes_domain", &self.genomes.as_ref().map(|g| g.domain()))
            .field("model_organisms", &self.model_organisms)
            .finish()
    }
}

impl GeneLookup {
    pub fn new(service: Arc<dyn EnsemblService>) -> Self {
        Self {
            service,
            genomes: None,
            model_organisms: DEFAULT_MODEL_ORGANISMS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.model_organisms = config.model_organisms.clone();
        self
    }

    pub fn with_model_organisms(mut self, organisms: Vec<String>) -> Self {
        self.model_organisms = organisms;
        self
    }

    /// Ask `service` when the primary has nothing
    pub fn with_genomes_service(mut self, service: Arc<dyn EnsemblService>) -> Self {
        if service.domain() != self.service.domain() {
            self.genomes = Some(service);
        }
        self
    }

    pub fn model_organisms(&self) -> &[String] {
        &self.model_organisms
    }

    fn services(&self) -> impl Iterator<Item = &Arc<dyn EnsemblService>> {
        std::iter::once(&self.service).chain(self.genomes.iter())
    }

    /// Gene owning `id`, following transcript and translation parents
    pub async fn gene_id_for(
        &self,
        ctx: &RequestContext,
        id: &str,
        object_type: Option<ObjectType>,
    ) -> Result<Option<String>> {
        for service in self.services() {
            if let Some(gene) = gene_id_from(service.as_ref(), ctx, id, object_type).await? {
                return Ok(Some(gene));
            }
        }
        Ok(None)
    }

    pub async fn species_for(&self, ctx: &RequestContext, id: &str) -> Result<Option<String>> {
        for service in self.services() {
            if let Some(species) = service.lookup(ctx, id, None).await?.and_then(|r| r.species) {
                return Ok(Some(species));
            }
        }
        Ok(None)
    }

    /// Chromosome loci of a gene, from its lookup record
    pub async fn gene_loci_for(&self, ctx: &RequestContext, gene_id: &str) -> Result<Option<GeneLoci>> {
        for service in self.services() {
            let record = service.lookup(ctx, gene_id, Some(ObjectType::Gene)).await?;
            if let Some(loci) = record.and_then(|r| loci_from_record(&r)) {
                return Ok(Some(loci));
            }
        }
        Ok(None)
    }

    /// Gene ids matching `symbol` across every model organism, in first-seen order
    pub async fn gene_ids_for_symbol(&self, ctx: &RequestContext, symbol: &str) -> Result<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        for service in self.services() {
            for species in &self.model_organisms {
                ctx.check()?;
                for id in service.symbol_gene_ids(ctx, species, symbol).await? {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
            if !ids.is_empty() {
                break;
            }
        }
        Ok(ids)
    }

    /// Gene ids for whitespace-separated query tokens
    ///
    /// Each token is looked up as an accession first and searched as a
    /// symbol otherwise. Tokens that resolve to nothing go in the report.
    pub async fn resolve(&self, ctx: &RequestContext, query: &[String]) -> Result<(Vec<String>, FetchReport)> {
        let mut genes: Vec<String> = Vec::new();
        let mut report = FetchReport::new();

        for token in query.iter().flat_map(|q| q.split_whitespace()) {
            ctx.check()?;
            let found = match self.gene_id_for(ctx, token, None).await {
                Ok(Some(gene)) => vec![gene],
                Ok(None) => self.gene_ids_for_symbol(ctx, token).await?,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(token = %token, error = %e, "Lookup failed, trying symbol search");
                    self.gene_ids_for_symbol(ctx, token).await?
                }
            };

            if found.is_empty() {
                report.drop_id(token, DropReason::Unresolved);
            }
            for gene in found {
                if !genes.iter().any(|g| g.eq_ignore_ascii_case(&gene)) {
                    genes.push(gene);
                }
            }
        }

        Ok((genes, report))
    }
}

async fn gene_id_from(
    service: &dyn EnsemblService,
    ctx: &RequestContext,
    id: &str,
    object_type: Option<ObjectType>,
) -> Result<Option<String>> {
    let Some(record) = service.lookup(ctx, id, object_type).await? else {
        return Ok(None);
    };
    match record.kind() {
        Some(ObjectType::Gene) => Ok(record.id.or_else(|| Some(id.to_string()))),
        Some(ObjectType::Transcript) => Ok(record.parent),
        Some(ObjectType::Translation) => {
            let Some(transcript) = record.parent else {
                return Ok(None);
            };
            let parent = service
                .lookup(ctx, &transcript, Some(ObjectType::Transcript))
                .await?;
            Ok(parent.and_then(|r| r.parent))
        }
        None => {
            debug!(id = %id, object_type = ?record.object_type, "Lookup is not a gene, transcript or translation");
            Ok(None)
        }
    }
}

/// `[1, end - start + 1]` onto `[start, end]`, or `[end, start]` on strand -1
pub fn loci_from_record(record: &LookupRecord) -> Option<GeneLoci> {
    let (start, end) = (record.start?, record.end?);
    let len = end - start + 1;
    let to = if record.strand == Some(-1) { (end, start) } else { (start, end) };
    match CoordinateMap::contiguous((1, len), to) {
        Ok(map) => Some(GeneLoci::new(
            record.species.clone().unwrap_or_default(),
            record.assembly_name.clone().unwrap_or_default(),
            record.seq_region_name.clone().unwrap_or_default(),
            map,
        )),
        Err(e) => {
            warn!(id = ?record.id, error = %e, "Lookup coordinates are inconsistent");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_loci_from_record() {
        let record = LookupRecord {
            id: Some("ENSG00000157764".into()),
            species: Some("homo_sapiens".into()),
            assembly_name: Some("GRCh38".into()),
            seq_region_name: Some("7".into()),
            strand: Some(-1),
            start: Some(140719327),
            end: Some(140924929),
            ..Default::default()
        };
        let loci = loci_from_record(&record).unwrap();
        assert_eq!(loci.chromosome, "7");
        assert_eq!(loci.map.from_ranges(), &[(1, 205603)]);
        assert_eq!(loci.map.to_ranges(), &[(140924929, 140719327)]);
    }

    #[test]
    fn test_loci_needs_coordinates() {
        assert!(loci_from_record(&LookupRecord::default()).is_none());
    }
}
