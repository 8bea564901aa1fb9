//! Division discovery through `/info/divisions`

use crate::config::ClientConfig;
use crate::error::Result;
use crate::rest::{endpoints, RequestContext};
use crate::service::{EnsemblService, HttpEnsemblService};

/// Division served by the primary domain
pub const VERTEBRATES_DIVISION: &str = "EnsemblVertebrates";

/// Domain that serves `division`
pub fn domain_for_division<'a>(config: &'a ClientConfig, division: &str) -> &'a str {
    if division == VERTEBRATES_DIVISION {
        &config.domain
    } else {
        &config.genomes_domain
    }
}

impl HttpEnsemblService {
    /// Division names, each paired with the domain that serves it
    pub async fn divisions(&self, ctx: &RequestContext) -> Result<Vec<(String, String)>> {
        let url = endpoints::divisions_url(self.domain());
        let Some(json) = self.get(ctx, &url).await? else {
            return Ok(Vec::new());
        };

        let config = self.client().config();
        Ok(json
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str())
            .map(|division| {
                (
                    division.to_string(),
                    domain_for_division(config, division).to_string(),
                )
            })
            .collect())
    }
}
