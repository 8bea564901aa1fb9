//! The REST service as seen by the fetchers
//!
//! [`EnsemblService`] is the seam between orchestration and transport.
//! [`HttpEnsemblService`] talks to a real domain; tests substitute an
//! in-memory implementation.

mod features;
pub mod http;
pub mod info;
pub mod map;

pub use features::parse_overlap_features;
pub use http::HttpEnsemblService;

use crate::error::Result;
use crate::model::{DbRef, Sequence, SequenceFeature};
use crate::rest::RequestContext;
use async_trait::async_trait;
use genofetch_common::types::{ObjectType, SeqType};
use serde::{Deserialize, Serialize};

/// Record returned by the lookup endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(rename = "Parent", default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub assembly_name: Option<String>,
    #[serde(default)]
    pub seq_region_name: Option<String>,
    #[serde(default)]
    pub strand: Option<i8>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl LookupRecord {
    /// Object type, if it is one the fetchers know
    pub fn kind(&self) -> Option<ObjectType> {
        self.object_type.as_deref().and_then(|t| t.parse().ok())
    }
}

#[async_trait]
pub trait EnsemblService: Send + Sync {
    /// Domain this service talks to, used in diagnostics
    fn domain(&self) -> &str;

    async fn is_available(&self, ctx: &RequestContext) -> Result<bool>;

    /// Data release of the domain, used as the version of self references
    async fn data_version(&self, ctx: &RequestContext) -> Result<Option<String>>;

    /// Sequences for one chunk of ids; callers chunk to the batch size
    async fn fetch_sequences(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        seq_type: SeqType,
        object_type: Option<ObjectType>,
    ) -> Result<Vec<Sequence>>;

    /// Features overlapping the genomic region of `id`, in genomic coordinates
    async fn overlap_features(
        &self,
        ctx: &RequestContext,
        id: &str,
        feature_types: &[&str],
    ) -> Result<Vec<SequenceFeature>>;

    async fn lookup(
        &self,
        ctx: &RequestContext,
        id: &str,
        object_type: Option<ObjectType>,
    ) -> Result<Option<LookupRecord>>;

    async fn cross_references(&self, ctx: &RequestContext, id: &str) -> Result<Vec<DbRef>>;

    /// Gene ids whose cross-references match `symbol` in one species
    async fn symbol_gene_ids(
        &self,
        ctx: &RequestContext,
        species: &str,
        symbol: &str,
    ) -> Result<Vec<String>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_record_deserializes() {
        let record: LookupRecord = serde_json::from_str(
            r#"{"object_type":"Translation","id":"ENSP00000288602","Parent":"ENST00000288602",
                "species":"homo_sapiens","start":140719327,"end":140924929,"length":766}"#,
        )
        .unwrap();
        assert_eq!(record.kind(), Some(ObjectType::Translation));
        assert_eq!(record.parent.as_deref(), Some("ENST00000288602"));
        assert_eq!(record.strand, None);
    }

    #[test]
    fn test_unknown_object_type() {
        let record = LookupRecord {
            object_type: Some("Exon".into()),
            ..Default::default()
        };
        assert_eq!(record.kind(), None);
    }
}
