//! Command implementations
//!
//! Each command builds its own service from the resolved [`ClientConfig`]
//! and prints in the requested [`OutputFormat`](crate::OutputFormat).

pub mod fetch;
pub mod gene;
pub mod lookup;
pub mod map;
pub mod ping;

use crate::error::Result;
use genofetch_core::{ClientConfig, EnsemblService, HttpEnsemblService, RestClient};
use std::sync::Arc;
use tracing::debug;

/// HTTP service for the primary domain after validating `config`
pub fn build_service(config: &ClientConfig) -> Result<Arc<HttpEnsemblService>> {
    config.validate()?;
    debug!(domain = %config.domain, genomes_domain = %config.genomes_domain, "Building REST client");
    let client = RestClient::new(config.clone())?;
    Ok(Arc::new(HttpEnsemblService::new(client)))
}

/// Service for the genomes domain sharing `primary`'s client, if it differs
pub fn genomes_service(primary: &HttpEnsemblService) -> Option<Arc<HttpEnsemblService>> {
    let client = primary.client();
    let genomes_domain = &client.config().genomes_domain;
    if genomes_domain == primary.domain() {
        return None;
    }
    debug!(domain = %genomes_domain, "Using genomes domain as fallback");
    Some(Arc::new(HttpEnsemblService::for_domain(
        client.clone(),
        genomes_domain.clone(),
    )))
}
