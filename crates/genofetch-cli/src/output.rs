//! Rendering of fetch results for the terminal
//!
//! `text` prints FASTA followed by feature and cross-reference tables,
//! `fasta` prints residues only, and `json` serializes the full outcome.
//! Dropped identifiers always go to stderr so stdout stays pipeable.

use crate::error::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use genofetch_core::mapping::Span;
use genofetch_core::model::FeatureStore;
use genofetch_core::{FetchReport, Sequence};
use serde::Serialize;

/// Residues per FASTA line
pub const FASTA_LINE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Fasta,
    Json,
}

/// One FASTA record, wrapped at [`FASTA_LINE_WIDTH`]
pub fn format_fasta(seq: &Sequence) -> String {
    let mut out = format!(">{}", seq.name);
    if let Some(description) = seq.description.as_deref().filter(|d| !d.is_empty()) {
        out.push(' ');
        out.push_str(description);
    }
    out.push('\n');

    let residues = seq.residues().as_bytes();
    for line in residues.chunks(FASTA_LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out
}

/// "1..3,7..9"
pub fn format_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|(a, b)| format!("{}..{}", a, b))
        .collect::<Vec<_>>()
        .join(",")
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table
}

pub fn features_table(seq: &Sequence) -> Table {
    let mut table = table();
    table.set_header(vec!["Type", "Begin", "End", "Strand", "Id", "Description"]);
    for feature in seq.features() {
        table.add_row(vec![
            feature.feature_type.clone(),
            feature.begin.to_string(),
            feature.end.to_string(),
            feature.strand.to_string(),
            feature.id().unwrap_or("-").to_string(),
            feature.description.clone(),
        ]);
    }
    table
}

pub fn xrefs_table(seq: &Sequence) -> Table {
    let mut table = table();
    table.set_header(vec!["Source", "Accession", "Version", "Mapping"]);
    for db_ref in seq.db_refs() {
        let mapping = db_ref
            .mapping()
            .map(|m| {
                format!(
                    "{} -> {}",
                    format_spans(m.from_ranges()),
                    format_spans(m.to_ranges())
                )
            })
            .unwrap_or_default();
        table.add_row(vec![
            db_ref.source().to_string(),
            db_ref.accession().to_string(),
            db_ref.version().unwrap_or("-").to_string(),
            mapping,
        ]);
    }
    table
}

/// FASTA plus annotation summary for one sequence
pub fn format_annotated(seq: &Sequence) -> String {
    let mut out = format_fasta(seq);

    if let Some(loci) = seq.gene_loci() {
        out.push_str(&format!("Loci: {}\n", loci));
    }
    if !seq.features().is_empty() {
        out.push_str(&format!("{}\n{}\n", "Features:".cyan().bold(), features_table(seq)));
    }
    if !seq.db_refs().is_empty() {
        out.push_str(&format!("{}\n{}\n", "Cross-references:".cyan().bold(), xrefs_table(seq)));
    }
    if let Some(product) = seq.product() {
        out.push_str(&format!(
            "Product: {} ({} residues)\n",
            product.name,
            product.len()
        ));
    }
    out
}

pub fn format_sequences(sequences: &[&Sequence], format: OutputFormat) -> String {
    let (render, separator): (fn(&Sequence) -> String, &str) = match format {
        OutputFormat::Fasta => (format_fasta, ""),
        _ => (format_annotated, "\n"),
    };
    sequences
        .iter()
        .map(|s| render(s))
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Dropped identifiers, one per line on stderr
pub fn print_report(report: &FetchReport) {
    if report.is_empty() {
        return;
    }
    if !report.dropped().is_empty() {
        eprintln!("{}", "Dropped identifiers:".yellow().bold());
        for dropped in report.dropped() {
            eprintln!("  {}: {}", dropped.id, dropped.reason);
        }
    }
    if !report.unannotated().is_empty() {
        eprintln!("{}", "Returned without annotations:".yellow().bold());
        for partial in report.unannotated() {
            eprintln!("  {}: {}", partial.id, partial.reason);
        }
    }
}
