//! In-memory [`EnsemblService`] for orchestration tests
//!
//! Responses are looked up in plain maps keyed by id. Sequence requests are
//! recorded so tests can assert on chunking.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use genofetch_core::model::{DbRef, Sequence, SequenceFeature};
use genofetch_core::rest::RequestContext;
use genofetch_core::service::{EnsemblService, LookupRecord};
use genofetch_core::{EnsemblError, Result};
use genofetch_common::types::{ObjectType, SeqType};
use std::collections::HashMap;
use std::sync::Mutex;

pub const MOCK_DOMAIN: &str = "https://mock.rest.example";

#[derive(Default)]
pub struct MockService {
    /// Defaults to [`MOCK_DOMAIN`]
    pub domain: Option<String>,
    pub unavailable: bool,
    pub data_version: Option<String>,
    /// Non-protein sequences by id
    pub sequences: HashMap<String, Sequence>,
    /// Protein sequences by transcript id
    pub proteins: HashMap<String, Sequence>,
    pub features: HashMap<String, Vec<SequenceFeature>>,
    pub lookups: HashMap<String, LookupRecord>,
    pub xrefs: HashMap<String, Vec<DbRef>>,
    /// Gene ids by (species, symbol)
    pub symbols: HashMap<(String, String), Vec<String>>,
    /// 1-based index of a sequence request that fails
    pub fail_request: Option<usize>,
    /// Cancel the caller's context when a lookup arrives
    pub cancel_on_lookup: bool,
    pub sequence_requests: Mutex<Vec<Vec<String>>>,
    pub xref_requests: Mutex<Vec<String>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            data_version: Some("112".to_string()),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn with_sequence(mut self, seq: Sequence) -> Self {
        self.sequences.insert(seq.name.clone(), seq);
        self
    }

    pub fn with_features(mut self, id: &str, features: Vec<SequenceFeature>) -> Self {
        self.features.insert(id.to_string(), features);
        self
    }

    pub fn with_protein(mut self, transcript: &str, protein: Sequence) -> Self {
        self.proteins.insert(transcript.to_string(), protein);
        self
    }

    pub fn with_lookup(mut self, id: &str, record: LookupRecord) -> Self {
        self.lookups.insert(id.to_string(), record);
        self
    }

    pub fn with_xrefs(mut self, id: &str, refs: Vec<DbRef>) -> Self {
        self.xrefs.insert(id.to_string(), refs);
        self
    }

    pub fn with_symbol(mut self, species: &str, symbol: &str, genes: &[&str]) -> Self {
        self.symbols.insert(
            (species.to_string(), symbol.to_string()),
            genes.iter().map(|g| g.to_string()).collect(),
        );
        self
    }

    pub fn request_sizes(&self) -> Vec<usize> {
        self.sequence_requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.len())
            .collect()
    }
}

#[async_trait]
impl EnsemblService for MockService {
    fn domain(&self) -> &str {
        self.domain.as_deref().unwrap_or(MOCK_DOMAIN)
    }

    async fn is_available(&self, ctx: &RequestContext) -> Result<bool> {
        ctx.check()?;
        Ok(!self.unavailable)
    }

    async fn data_version(&self, ctx: &RequestContext) -> Result<Option<String>> {
        ctx.check()?;
        Ok(self.data_version.clone())
    }

    async fn fetch_sequences(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        seq_type: SeqType,
        _object_type: Option<ObjectType>,
    ) -> Result<Vec<Sequence>> {
        ctx.check()?;
        if seq_type == SeqType::Protein {
            return Ok(ids
                .iter()
                .filter_map(|id| self.proteins.get(id).cloned())
                .collect());
        }

        let request = {
            let mut requests = self.sequence_requests.lock().unwrap();
            requests.push(ids.to_vec());
            requests.len()
        };
        if self.fail_request == Some(request) {
            return Err(EnsemblError::network("connection reset"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.sequences.get(id).cloned())
            .collect())
    }

    async fn overlap_features(
        &self,
        ctx: &RequestContext,
        id: &str,
        _feature_types: &[&str],
    ) -> Result<Vec<SequenceFeature>> {
        ctx.check()?;
        Ok(self.features.get(id).cloned().unwrap_or_default())
    }

    async fn lookup(
        &self,
        ctx: &RequestContext,
        id: &str,
        _object_type: Option<ObjectType>,
    ) -> Result<Option<LookupRecord>> {
        ctx.check()?;
        if self.cancel_on_lookup {
            ctx.cancel();
        }
        Ok(self.lookups.get(id).cloned())
    }

    async fn cross_references(&self, ctx: &RequestContext, id: &str) -> Result<Vec<DbRef>> {
        ctx.check()?;
        self.xref_requests.lock().unwrap().push(id.to_string());
        Ok(self.xrefs.get(id).cloned().unwrap_or_default())
    }

    async fn symbol_gene_ids(
        &self,
        ctx: &RequestContext,
        species: &str,
        symbol: &str,
    ) -> Result<Vec<String>> {
        ctx.check()?;
        Ok(self
            .symbols
            .get(&(species.to_string(), symbol.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// An Ensembl-shaped transcript accession for index `n`
pub fn transcript_id(n: usize) -> String {
    format!("ENST{:011}", n)
}
