//! `genofetch gene` command implementation

use super::{build_service, genomes_service};
use crate::error::{CliError, Result};
use crate::output::{format_annotated, format_fasta, format_spans, print_json, print_report, OutputFormat};
use colored::Colorize;
use genofetch_core::{AnnotatedGene, ClientConfig, GeneOrchestrator, RequestContext};

/// Resolve `query` to genes and print each with its spliced transcripts
pub async fn run(
    ctx: &RequestContext,
    config: &ClientConfig,
    query: &[String],
    format: OutputFormat,
) -> Result<()> {
    let service = build_service(config)?;
    let mut orchestrator = GeneOrchestrator::new(service.clone())?;
    if let Some(genomes) = genomes_service(&service) {
        orchestrator = orchestrator.with_genomes_service(genomes)?;
    }
    let orchestrator = orchestrator.with_config(config);

    let outcome = orchestrator.fetch_genes(ctx, query).await?;

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        _ => {
            for gene in &outcome.genes {
                print!("{}", format_gene(gene, format));
            }
            print_report(&outcome.report);
        }
    }

    if outcome.genes.is_empty() {
        return Err(CliError::no_results(format!(
            "no gene found for '{}'",
            query.join(" ")
        )));
    }
    Ok(())
}

pub fn format_gene(gene: &AnnotatedGene, format: OutputFormat) -> String {
    if format == OutputFormat::Fasta {
        return std::iter::once(format_fasta(&gene.gene))
            .chain(gene.transcripts.iter().map(|t| format_fasta(&t.sequence)))
            .collect();
    }

    let mut out = format!(
        "{} {} ({} transcripts)\n",
        "Gene".green().bold(),
        gene.gene.name,
        gene.transcripts.len()
    );
    out.push_str(&format_annotated(&gene.gene));
    for transcript in &gene.transcripts {
        out.push('\n');
        out.push_str(&format!(
            "Exons: {} -> {}\n",
            format_spans(transcript.exon_map.from_ranges()),
            format_spans(transcript.exon_map.to_ranges())
        ));
        out.push_str(&format_annotated(&transcript.sequence));
    }
    out.push('\n');
    out
}
