//! Overlap endpoint response parsing

use crate::model::feature::{
    ATTR_ALLELES, ATTR_CLINICAL_SIGNIFICANCE, ATTR_CONSEQUENCE, ATTR_ID, ATTR_PARENT,
};
use crate::model::SequenceFeature;
use crate::ontology;
use crate::rest::scalar_string;
use genofetch_common::types::Strand;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct OverlapFeature {
    feature_type: String,
    start: i64,
    end: i64,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    strand: Option<Value>,
    #[serde(default)]
    phase: Option<Value>,
    #[serde(default)]
    alleles: Option<Vec<String>>,
    #[serde(default)]
    clinical_significance: Option<Vec<String>>,
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "Parent", default)]
    parent: Option<String>,
    #[serde(default)]
    consequence_type: Option<String>,
    #[serde(default)]
    external_name: Option<String>,
}

fn normalize_type(feature_type: &str) -> String {
    if feature_type == "variation" {
        ontology::SEQUENCE_VARIANT.to_string()
    } else if feature_type.eq_ignore_ascii_case("cds") {
        ontology::CDS.to_string()
    } else {
        feature_type.to_string()
    }
}

impl From<OverlapFeature> for SequenceFeature {
    fn from(raw: OverlapFeature) -> Self {
        let strand = match raw.strand.as_ref().and_then(scalar_string).as_deref() {
            Some("1") => Strand::Forward,
            _ => Strand::Reverse,
        };
        let phase = raw
            .phase
            .as_ref()
            .and_then(Value::as_u64)
            .filter(|p| *p <= 2)
            .map(|p| p as u8);
        let alleles = raw.alleles.as_ref().map(|a| a.join(","));

        let description = alleles
            .clone()
            .or_else(|| raw.external_name.clone())
            .or_else(|| raw.id.clone())
            .unwrap_or_default();

        let mut feature = SequenceFeature::new(normalize_type(&raw.feature_type), raw.start, raw.end)
            .with_strand(strand)
            .with_description(description);
        feature.phase = phase;
        feature.group = raw.source;

        let attributes = [
            (ATTR_ID, raw.id),
            (ATTR_PARENT, raw.parent),
            (ATTR_CONSEQUENCE, raw.consequence_type),
            (ATTR_ALLELES, alleles),
            (
                ATTR_CLINICAL_SIGNIFICANCE,
                raw.clinical_significance.map(|c| c.join(",")),
            ),
        ];
        for (key, value) in attributes {
            if let Some(value) = value {
                feature.set_attribute(key, value);
            }
        }
        feature
    }
}

/// Parse an overlap response, skipping entries that are not features
pub fn parse_overlap_features(json: &Value) -> Vec<SequenceFeature> {
    let Some(items) = json.as_array() else {
        warn!("Overlap response is not an array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match OverlapFeature::deserialize(item) {
            Ok(raw) => Some(SequenceFeature::from(raw)),
            Err(e) => {
                warn!(error = %e, "Skipping malformed feature");
                None
            }
        })
        .collect()
}
