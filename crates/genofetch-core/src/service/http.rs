//! [`EnsemblService`] over HTTP

use crate::error::Result;
use crate::model::{dbref, DbRef, Sequence, SequenceFeature};
use crate::rest::{endpoints, RequestContext, RestClient};
use crate::service::features::parse_overlap_features;
use crate::service::{EnsemblService, LookupRecord};
use async_trait::async_trait;
use genofetch_common::types::{ObjectType, SeqType};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SequenceRecord {
    id: String,
    #[serde(default)]
    desc: Option<String>,
    seq: String,
}

#[derive(Debug, Deserialize)]
struct XrefRecord {
    dbname: String,
    primary_id: String,
}

#[derive(Debug, Deserialize)]
struct SymbolRecord {
    id: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Talks to one REST domain through a shared [`RestClient`]
#[derive(Debug, Clone)]
pub struct HttpEnsemblService {
    client: RestClient,
    domain: String,
}

impl HttpEnsemblService {
    /// Service for the client's primary domain
    pub fn new(client: RestClient) -> Self {
        let domain = client.config().domain.clone();
        Self { client, domain }
    }

    /// Service for another domain, sharing the client's health registry
    pub fn for_domain(client: RestClient, domain: impl Into<String>) -> Self {
        Self {
            client,
            domain: domain.into(),
        }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    pub(crate) async fn get(&self, ctx: &RequestContext, url: &str) -> Result<Option<Value>> {
        self.client.get_json(ctx, url).await
    }
}

/// Sequences from a single object or an array of them
pub fn parse_sequences(json: &Value) -> Vec<Sequence> {
    let records: Vec<&Value> = match json {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![json],
        _ => Vec::new(),
    };

    records
        .into_iter()
        .filter_map(|item| match SequenceRecord::deserialize(item) {
            Ok(record) => {
                let mut seq = Sequence::new(record.id, record.seq);
                seq.description = Some(
                    record
                        .desc
                        .filter(|d| !d.is_empty())
                        .unwrap_or_else(|| dbref::ENSEMBL.to_string()),
                );
                Some(seq)
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed sequence record");
                None
            }
        })
        .collect()
}

#[async_trait]
impl EnsemblService for HttpEnsemblService {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn is_available(&self, ctx: &RequestContext) -> Result<bool> {
        self.client.is_available(ctx, &self.domain).await
    }

    async fn data_version(&self, ctx: &RequestContext) -> Result<Option<String>> {
        self.client.data_version(ctx, &self.domain).await
    }

    async fn fetch_sequences(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        seq_type: SeqType,
        object_type: Option<ObjectType>,
    ) -> Result<Vec<Sequence>> {
        let single = match ids {
            [id] => Some(id.as_str()),
            _ => None,
        };
        let url = endpoints::sequence_url(&self.domain, single, seq_type, object_type);
        debug!(ids = ids.len(), seq_type = %seq_type, "Fetching sequences");

        Ok(self
            .client
            .fetch_json(ctx, &url, ids, None)
            .await?
            .map(|json| parse_sequences(&json))
            .unwrap_or_default())
    }

    async fn overlap_features(
        &self,
        ctx: &RequestContext,
        id: &str,
        feature_types: &[&str],
    ) -> Result<Vec<SequenceFeature>> {
        let url = endpoints::overlap_url(&self.domain, id, feature_types);
        Ok(self
            .get(ctx, &url)
            .await?
            .map(|json| parse_overlap_features(&json))
            .unwrap_or_default())
    }

    async fn lookup(
        &self,
        ctx: &RequestContext,
        id: &str,
        object_type: Option<ObjectType>,
    ) -> Result<Option<LookupRecord>> {
        let url = endpoints::lookup_url(&self.domain, id, object_type);
        let Some(json) = self.get(ctx, &url).await? else {
            return Ok(None);
        };
        match LookupRecord::deserialize(&json) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(id = %id, error = %e, "Unreadable lookup response");
                Ok(None)
            }
        }
    }

    async fn cross_references(&self, ctx: &RequestContext, id: &str) -> Result<Vec<DbRef>> {
        let url = endpoints::xrefs_url(&self.domain, id);
        let Some(json) = self.get(ctx, &url).await? else {
            return Ok(Vec::new());
        };

        let refs = json
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| XrefRecord::deserialize(item).ok())
                    .filter(|x| x.dbname != "GO")
                    .map(|x| DbRef::new(&x.dbname, None, x.primary_id))
                    .collect()
            })
            .unwrap_or_default();
        Ok(refs)
    }

    async fn symbol_gene_ids(
        &self,
        ctx: &RequestContext,
        species: &str,
        symbol: &str,
    ) -> Result<Vec<String>> {
        let url = endpoints::symbol_url(&self.domain, species, symbol, Some("gene"));
        let Some(json) = self.get(ctx, &url).await? else {
            return Ok(Vec::new());
        };

        let mut ids: Vec<String> = Vec::new();
        for record in json
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|item| SymbolRecord::deserialize(item).ok())
        {
            if record.kind.as_deref() == Some("gene") && !ids.contains(&record.id) {
                ids.push(record.id);
            }
        }
        Ok(ids)
    }
}
