//! Cross-references between accessions in different databases

use crate::mapping::CoordinateMap;
use serde::{Deserialize, Serialize};

pub const ENSEMBL: &str = "ENSEMBL";
pub const UNIPROT: &str = "UNIPROT";
pub const PDB: &str = "PDB";

/// Normalize the database name spellings the REST service uses
pub fn canonical_source(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "uniprot/swissprot" | "uniprot/sptrembl" | "uniprotkb/swiss-prot" | "uniprotkb/trembl"
        | "uniprot" => UNIPROT.to_string(),
        "pdb" => PDB.to_string(),
        "ensembl" | "ensembl-tr" | "ensembl-gn" => ENSEMBL.to_string(),
        _ => trimmed.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRef {
    source: String,
    version: Option<String>,
    accession: String,
    mapping: Option<CoordinateMap>,
}

impl DbRef {
    pub fn new(source: &str, version: Option<String>, accession: impl Into<String>) -> Self {
        Self {
            source: canonical_source(source),
            version,
            accession: accession.into(),
            mapping: None,
        }
    }

    pub fn with_mapping(mut self, mapping: CoordinateMap) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn accession(&self) -> &str {
        &self.accession
    }

    pub fn mapping(&self) -> Option<&CoordinateMap> {
        self.mapping.as_ref()
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    pub fn set_mapping(&mut self, mapping: Option<CoordinateMap>) {
        self.mapping = mapping;
    }

    /// Same canonical source and accession, with compatible versions
    ///
    /// A missing version is compatible with any version.
    pub fn same_reference(&self, other: &DbRef) -> bool {
        self.source.eq_ignore_ascii_case(&other.source)
            && self.accession.eq_ignore_ascii_case(&other.accession)
            && match (&self.version, &other.version) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }

    /// Fill in whatever `other` knows that this reference does not
    pub fn merge(&mut self, other: DbRef) {
        if self.version.is_none() {
            self.version = other.version;
        }
        if self.mapping.is_none() {
            self.mapping = other.mapping;
        }
    }
}

impl std::fmt::Display for DbRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{} ({})", self.source, self.accession, v),
            None => write!(f, "{}:{}", self.source, self.accession),
        }
    }
}
