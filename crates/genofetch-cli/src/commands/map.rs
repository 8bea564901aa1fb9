//! `genofetch map-assembly` command implementation

use super::build_service;
use crate::error::{CliError, Result};
use crate::output::{print_json, OutputFormat};
use genofetch_core::{ClientConfig, RequestContext};
use serde::Serialize;

/// Chromosome region as written on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub strand: i8,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}..{}:{}", self.chromosome, self.start, self.end, self.strand)
    }
}

/// Parse `CHR:START..END[:STRAND]`; strand defaults to 1
pub fn parse_region(region: &str) -> Result<Region> {
    let invalid = || {
        CliError::invalid_argument(format!(
            "region '{}' must look like CHR:START..END:STRAND",
            region
        ))
    };

    let mut parts = region.trim().split(':');
    let chromosome = parts.next().filter(|c| !c.is_empty()).ok_or_else(invalid)?;
    let (start, end) = parts
        .next()
        .and_then(|span| span.split_once(".."))
        .ok_or_else(invalid)?;
    let start: i64 = start.parse().map_err(|_| invalid())?;
    let end: i64 = end.parse().map_err(|_| invalid())?;
    let strand: i8 = match parts.next() {
        Some(s) => s.parse().map_err(|_| invalid())?,
        None => 1,
    };
    if parts.next().is_some() || start < 1 || end < start || !matches!(strand, 1 | -1) {
        return Err(invalid());
    }

    Ok(Region {
        chromosome: chromosome.to_string(),
        start,
        end,
        strand,
    })
}

#[derive(Debug, Serialize)]
struct MappedView<'a> {
    from_assembly: &'a str,
    to_assembly: &'a str,
    original: &'a Region,
    mapped: &'a Region,
}

pub async fn run(
    ctx: &RequestContext,
    config: &ClientConfig,
    species: &str,
    from: &str,
    region: &str,
    to: &str,
    format: OutputFormat,
) -> Result<()> {
    let original = parse_region(region)?;
    let service = build_service(config)?;

    let (a, b) = service
        .map_assembly(
            ctx,
            species,
            from,
            &original.chromosome,
            original.start,
            original.end,
            original.strand,
            to,
        )
        .await?
        .ok_or_else(|| {
            CliError::no_results(format!("{} has no counterpart in {}", original, to))
        })?;

    // reverse strand spans come back as (end, start)
    let mapped = Region {
        chromosome: original.chromosome.clone(),
        start: a.min(b),
        end: a.max(b),
        strand: if a > b { -1 } else { 1 },
    };

    match format {
        OutputFormat::Json => print_json(&MappedView {
            from_assembly: from,
            to_assembly: to,
            original: &original,
            mapped: &mapped,
        })?,
        _ => println!("{} {}\t{} {}", from, original, to, mapped),
    }
    Ok(())
}
