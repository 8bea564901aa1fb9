//! Value types shared across genofetch
//!
//! These are the small enums that appear both in REST URLs and in user-facing
//! output, so they carry both a wire form (`as_str`) and `FromStr`.

mod version;

pub use version::ReleaseVersion;

use crate::error::CommonError;
use serde::{Deserialize, Serialize};

/// Strand of a positional feature relative to the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unknown,
}

impl Strand {
    /// Unknown strand is read as forward when deriving mapping direction
    pub fn is_reverse(self) -> bool {
        matches!(self, Strand::Reverse)
    }

    /// Signed direction, treating unknown as forward
    pub fn direction(self) -> i8 {
        if self.is_reverse() {
            -1
        } else {
            1
        }
    }
}

impl std::str::FromStr for Strand {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "1" | "+1" | "+" => Ok(Strand::Forward),
            "-1" | "-" => Ok(Strand::Reverse),
            "0" | "." | "?" | "" => Ok(Strand::Unknown),
            other => Err(CommonError::invalid_value("strand", other)),
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// Sequence type requested from the sequence endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeqType {
    Genomic,
    Cdna,
    Cds,
    Protein,
}

impl SeqType {
    /// Value of the `type` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            SeqType::Genomic => "genomic",
            SeqType::Cdna => "cdna",
            SeqType::Cds => "cds",
            SeqType::Protein => "protein",
        }
    }

    pub fn is_nucleotide(self) -> bool {
        !matches!(self, SeqType::Protein)
    }
}

impl std::str::FromStr for SeqType {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "genomic" | "genome" => Ok(SeqType::Genomic),
            "cdna" => Ok(SeqType::Cdna),
            "cds" => Ok(SeqType::Cds),
            "protein" | "peptide" => Ok(SeqType::Protein),
            _ => Err(CommonError::invalid_value("sequence type", s)),
        }
    }
}

impl std::fmt::Display for SeqType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of object an identifier refers to in lookup and sequence queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Gene,
    Transcript,
    Translation,
}

impl ObjectType {
    /// Value of the `object_type` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Gene => "Gene",
            ObjectType::Transcript => "Transcript",
            ObjectType::Translation => "Translation",
        }
    }
}

impl std::str::FromStr for ObjectType {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gene" => Ok(ObjectType::Gene),
            "transcript" => Ok(ObjectType::Transcript),
            "translation" => Ok(ObjectType::Translation),
            _ => Err(CommonError::invalid_value("object type", s)),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
