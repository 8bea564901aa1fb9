//! `genofetch ping` command implementation
//!
//! Probes the primary and genomes domains and prints their health.

use super::build_service;
use crate::error::Result;
use crate::output::{print_json, OutputFormat};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use genofetch_core::rest::DomainHealth;
use genofetch_core::{ClientConfig, EnsemblError, RequestContext};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct DomainStatus {
    pub domain: String,
    pub health: DomainHealth,
}

/// Fails when the primary domain is unavailable
pub async fn run(ctx: &RequestContext, config: &ClientConfig, format: OutputFormat) -> Result<()> {
    let service = build_service(config)?;
    let client = service.client();

    let mut domains = vec![config.domain.clone()];
    if config.genomes_domain != config.domain {
        domains.push(config.genomes_domain.clone());
    }

    let mut statuses = Vec::with_capacity(domains.len());
    for domain in domains {
        if client.is_available(ctx, &domain).await? {
            client.data_version(ctx, &domain).await?;
        }
        let health = client.domain_health(&domain).await.unwrap_or_default();
        if health.rest_major_mismatch {
            warn!(domain = %domain, version = ?health.rest_version, "REST major version is newer than expected");
        }
        statuses.push(DomainStatus { domain, health });
    }

    match format {
        OutputFormat::Json => print_json(&statuses)?,
        _ => println!("{}", status_table(&statuses)),
    }

    match statuses.first() {
        Some(primary) if !primary.health.available => {
            Err(EnsemblError::ServiceUnavailable(primary.domain.clone()).into())
        }
        _ => Ok(()),
    }
}

pub fn status_table(statuses: &[DomainStatus]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Domain", "Status", "REST", "Data"]);

    for status in statuses {
        let health = &status.health;
        let state = if !health.available {
            "unavailable".red().to_string()
        } else if health.rest_major_mismatch {
            "version mismatch".yellow().to_string()
        } else {
            "ok".green().to_string()
        };
        table.add_row(vec![
            status.domain.clone(),
            state,
            health.rest_version.clone().unwrap_or_else(|| "-".to_string()),
            health.data_version.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}
