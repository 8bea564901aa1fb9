//! Coordinate conversion through the map endpoints

use crate::error::Result;
use crate::mapping::{CoordinateMap, Span};
use crate::model::GeneLoci;
use crate::rest::{endpoints, RequestContext};
use crate::service::{EnsemblService, HttpEnsemblService};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Transcript-relative coordinate system for id mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMapKind {
    Cds,
    Cdna,
}

impl IdMapKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdMapKind::Cds => "cds",
            IdMapKind::Cdna => "cdna",
        }
    }
}

#[derive(Debug, Deserialize)]
struct MappedRegion {
    start: i64,
    end: i64,
    #[serde(default)]
    strand: i8,
    #[serde(default)]
    assembly_name: Option<String>,
    #[serde(default)]
    seq_region_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OriginalRegion {
    end: i64,
}

#[derive(Debug, Deserialize)]
struct RegionMapping {
    mapped: MappedRegion,
    #[serde(default)]
    original: Option<OriginalRegion>,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    #[serde(default)]
    mappings: Vec<RegionMapping>,
}

impl MappedRegion {
    fn span(&self) -> Span {
        if self.strand < 0 {
            (self.end, self.start)
        } else {
            (self.start, self.end)
        }
    }
}

fn parse_map_response(json: &Value) -> Option<MapResponse> {
    match MapResponse::deserialize(json) {
        Ok(response) => Some(response),
        Err(e) => {
            warn!(error = %e, "Unreadable map response");
            None
        }
    }
}

/// First mapped region of an assembly conversion
fn first_mapped_span(json: &Value) -> Option<Span> {
    parse_map_response(json)?
        .mappings
        .first()
        .map(|m| m.mapped.span())
}

/// Loci for an id mapping; all pieces must share assembly and chromosome
fn loci_from_id_mapping(json: &Value) -> Option<GeneLoci> {
    let response = parse_map_response(json)?;
    let first = response.mappings.first()?;
    let assembly = first.mapped.assembly_name.clone().unwrap_or_default();
    let chromosome = first.mapped.seq_region_name.clone().unwrap_or_default();

    let mut to_ranges = Vec::with_capacity(response.mappings.len());
    let mut from_end = 0;
    for mapping in &response.mappings {
        let region = &mapping.mapped;
        if region.assembly_name.as_deref().unwrap_or_default() != assembly
            || region.seq_region_name.as_deref().unwrap_or_default() != chromosome
        {
            warn!("Id mapping spans more than one assembly or chromosome");
            return None;
        }
        to_ranges.push(region.span());
        if let Some(original) = &mapping.original {
            from_end = from_end.max(original.end);
        }
    }

    match CoordinateMap::new(vec![(1, from_end)], to_ranges, 1, 1) {
        Ok(map) => Some(GeneLoci::new("", assembly, chromosome, map)),
        Err(e) => {
            warn!(error = %e, "Id mapping is inconsistent");
            None
        }
    }
}

impl HttpEnsemblService {
    /// Convert a chromosome region between assemblies
    ///
    /// Returns the first mapped region, written `(end, start)` when it lies
    /// on the reverse strand.
    #[allow(clippy::too_many_arguments)]
    pub async fn map_assembly(
        &self,
        ctx: &RequestContext,
        species: &str,
        from_assembly: &str,
        chromosome: &str,
        start: i64,
        end: i64,
        strand: i8,
        to_assembly: &str,
    ) -> Result<Option<Span>> {
        let url = endpoints::map_assembly_url(
            self.domain(),
            species,
            from_assembly,
            chromosome,
            start,
            end,
            strand,
            to_assembly,
        );
        Ok(self
            .get(ctx, &url)
            .await?
            .and_then(|json| first_mapped_span(&json)))
    }

    /// Genome loci of a transcript- or CDS-relative region of `accession`
    pub async fn map_to_genome(
        &self,
        ctx: &RequestContext,
        kind: IdMapKind,
        accession: &str,
        start: i64,
        end: i64,
    ) -> Result<Option<GeneLoci>> {
        let url = endpoints::map_id_url(
            self.domain(),
            kind.as_str(),
            accession,
            start,
            end,
        );
        Ok(self
            .get(ctx, &url)
            .await?
            .and_then(|json| loci_from_id_mapping(&json)))
    }
}
