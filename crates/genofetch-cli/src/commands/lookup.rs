//! `genofetch lookup` command implementation
//!
//! Shows the lookup record of an identifier together with the gene that
//! owns it and the gene's chromosome loci.

use super::{build_service, genomes_service};
use crate::error::{CliError, Result};
use crate::output::{print_json, OutputFormat};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use genofetch_common::types::ObjectType;
use genofetch_core::lookup::loci_from_record;
use genofetch_core::service::LookupRecord;
use genofetch_core::{ClientConfig, EnsemblService, GeneLookup, GeneLoci, RequestContext};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct LookupView {
    pub record: LookupRecord,
    pub gene_id: Option<String>,
    pub loci: Option<GeneLoci>,
}

pub async fn run(
    ctx: &RequestContext,
    config: &ClientConfig,
    id: &str,
    object_type: Option<ObjectType>,
    format: OutputFormat,
) -> Result<()> {
    let primary = build_service(config)?;
    let mut services: Vec<Arc<dyn EnsemblService>> = vec![primary.clone()];
    let mut lookup = GeneLookup::new(primary.clone()).with_config(config);
    if let Some(genomes) = genomes_service(&primary) {
        services.push(genomes.clone());
        lookup = lookup.with_genomes_service(genomes);
    }

    let mut found = None;
    for service in &services {
        found = service.lookup(ctx, id, object_type).await?;
        if found.is_some() {
            break;
        }
    }
    let record =
        found.ok_or_else(|| CliError::no_results(format!("'{}' is not a known identifier", id)))?;
    let gene_id = lookup.gene_id_for(ctx, id, record.kind()).await?;
    let view = LookupView {
        loci: loci_from_record(&record),
        record,
        gene_id,
    };

    match format {
        OutputFormat::Json => print_json(&view)?,
        _ => println!("{}", lookup_table(&view)),
    }
    Ok(())
}

pub fn lookup_table(view: &LookupView) -> Table {
    let record = &view.record;
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Id".to_string(), field(record.id.as_deref())]);
    table.add_row(vec!["Object type".to_string(), field(record.object_type.as_deref())]);
    table.add_row(vec!["Species".to_string(), field(record.species.as_deref())]);
    table.add_row(vec!["Parent".to_string(), field(record.parent.as_deref())]);
    table.add_row(vec!["Gene".to_string(), field(view.gene_id.as_deref())]);
    table.add_row(vec![
        "Loci".to_string(),
        view.loci
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_fills_missing_fields() {
        let view = LookupView {
            record: LookupRecord {
                id: Some("ENST00000288602".into()),
                object_type: Some("Transcript".into()),
                parent: Some("ENSG00000157764".into()),
                ..Default::default()
            },
            gene_id: Some("ENSG00000157764".into()),
            loci: None,
        };
        let rendered = lookup_table(&view).to_string();
        assert!(rendered.contains("ENST00000288602"));
        assert!(rendered.contains("Transcript"));
        assert!(rendered.contains("ENSG00000157764"));
    }
}
