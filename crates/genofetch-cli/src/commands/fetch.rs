//! `genofetch fetch` command implementation
//!
//! Fetches sequences of one coordinate system with their features,
//! cross-references and protein products.

use super::build_service;
use crate::error::{CliError, Result};
use crate::output::{format_sequences, print_json, print_report, OutputFormat};
use genofetch_common::types::SeqType;
use genofetch_core::{ClientConfig, RequestContext, SeqProxy, SeqVariant};
use tracing::info;

pub async fn run(
    ctx: &RequestContext,
    config: &ClientConfig,
    seq_type: SeqType,
    ids: &[String],
    format: OutputFormat,
) -> Result<()> {
    let service = build_service(config)?;
    let proxy = SeqProxy::new(service, SeqVariant::for_seq_type(seq_type))?.with_config(config);

    let outcome = proxy.fetch(ctx, ids).await?;
    info!(
        requested = ids.len(),
        fetched = outcome.sequences.len(),
        dropped = outcome.report.dropped().len(),
        "Fetch finished"
    );

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        _ => {
            let sequences: Vec<_> = outcome.sequences.iter().collect();
            print!("{}", format_sequences(&sequences, format));
            print_report(&outcome.report);
        }
    }

    if outcome.sequences.is_empty() {
        return Err(CliError::no_results(format!(
            "none of the {} requested {} sequences could be fetched",
            ids.len(),
            seq_type
        )));
    }
    Ok(())
}
