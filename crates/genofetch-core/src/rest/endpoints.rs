//! REST endpoint URL builders

use genofetch_common::types::{ObjectType, SeqType};
use urlencoding::encode;

const JSON: &str = "content-type=application/json";

pub fn ping_url(domain: &str) -> String {
    format!("{}/info/ping?{}", domain, JSON)
}

pub fn rest_version_url(domain: &str) -> String {
    format!("{}/info/rest?{}", domain, JSON)
}

pub fn data_version_url(domain: &str) -> String {
    format!("{}/info/data?{}", domain, JSON)
}

pub fn divisions_url(domain: &str) -> String {
    format!("{}/info/divisions?{}", domain, JSON)
}

/// Sequence endpoint; `id` is `None` for a batch POST
pub fn sequence_url(
    domain: &str,
    id: Option<&str>,
    seq_type: SeqType,
    object_type: Option<ObjectType>,
) -> String {
    let mut url = match id {
        Some(id) => format!("{}/sequence/id/{}", domain, encode(id.trim())),
        None => format!("{}/sequence/id", domain),
    };
    url.push_str(&format!(
        "?type={}&Accept=application/json&{}",
        seq_type.as_str(),
        JSON
    ));
    if let Some(object_type) = object_type {
        url.push_str(&format!("&object_type={}", object_type.as_str()));
    }
    url
}

/// Features overlapping the gene region of `id`
pub fn overlap_url(domain: &str, id: &str, feature_types: &[&str]) -> String {
    let mut url = format!("{}/overlap/id/{}?object_type=Gene", domain, encode(id.trim()));
    for feature in feature_types {
        url.push_str(&format!("&feature={}", feature));
    }
    url.push('&');
    url.push_str(JSON);
    url
}

pub fn lookup_url(domain: &str, id: &str, object_type: Option<ObjectType>) -> String {
    let mut url = format!("{}/lookup/id/{}?{}", domain, encode(id.trim()), JSON);
    if let Some(object_type) = object_type {
        url.push_str(&format!("&object_type={}", object_type.as_str()));
    }
    url
}

pub fn xrefs_url(domain: &str, id: &str) -> String {
    format!("{}/xrefs/id/{}?{}&all_levels=1", domain, encode(id.trim()), JSON)
}

pub fn symbol_url(domain: &str, species: &str, symbol: &str, object_type: Option<&str>) -> String {
    let mut url = format!(
        "{}/xrefs/symbol/{}/{}?{}",
        domain,
        encode(species),
        encode(symbol.trim()),
        JSON
    );
    if let Some(object_type) = object_type {
        url.push_str(&format!("&object_type={}", object_type));
    }
    url
}

/// Region conversion between two assemblies of one species
#[allow(clippy::too_many_arguments)]
pub fn map_assembly_url(
    domain: &str,
    species: &str,
    from_assembly: &str,
    chromosome: &str,
    start: i64,
    end: i64,
    strand: i8,
    to_assembly: &str,
) -> String {
    format!(
        "{}/map/{}/{}/{}:{}..{}:{}/{}?{}",
        domain,
        encode(species),
        encode(from_assembly),
        encode(chromosome),
        start,
        end,
        strand,
        encode(to_assembly),
        JSON
    )
}

/// Transcript-relative (`cdna`) or CDS-relative (`cds`) region onto the genome
pub fn map_id_url(domain: &str, kind: &str, accession: &str, start: i64, end: i64) -> String {
    format!(
        "{}/map/{}/{}/{}..{}?include_original_region=1&{}",
        domain,
        kind,
        encode(accession.trim()),
        start,
        end,
        JSON
    )
}
