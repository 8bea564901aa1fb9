//! Accession validation

use crate::error::{EnsemblError, Result};
use regex::{Regex, RegexBuilder};

/// Ensembl gene, transcript, exon and protein stable ids
pub const ENSEMBL_ACCESSION_PATTERN: &str = r"^ENS([A-Z]{3})?[GTEP][0-9]{11}$";

/// Consensus CDS ids
pub const CCDS_ACCESSION_PATTERN: &str = r"^CCDS[0-9.]{3,}$";

/// Decides which identifiers a fetcher will send to the service
#[derive(Debug, Clone)]
pub struct AccessionValidator {
    patterns: Vec<Regex>,
}

impl AccessionValidator {
    /// Accepts Ensembl stable ids and CCDS ids, ignoring case
    pub fn ensembl() -> Result<Self> {
        Self::from_patterns(&[ENSEMBL_ACCESSION_PATTERN, CCDS_ACCESSION_PATTERN])
    }

    /// Accepts any non-empty identifier
    pub fn any() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn from_patterns(patterns: &[&str]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_valid(&self, accession: &str) -> bool {
        let accession = accession.trim();
        !accession.is_empty()
            && (self.patterns.is_empty() || self.patterns.iter().any(|p| p.is_match(accession)))
    }

    /// The trimmed accession, or [`EnsemblError::InvalidAccession`]
    pub fn check<'a>(&self, accession: &'a str) -> Result<&'a str> {
        let trimmed = accession.trim();
        if self.is_valid(trimmed) {
            Ok(trimmed)
        } else {
            Err(EnsemblError::InvalidAccession(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensembl_accessions() {
        let validator = AccessionValidator::ensembl().unwrap();
        assert!(validator.is_valid("ENSG00000157764"));
        assert!(validator.is_valid("ENST00000288602"));
        assert!(validator.is_valid("ENSP00000288602"));
        assert!(validator.is_valid("ENSMUSG00000002413"));
        assert!(validator.is_valid("enst00000288602"));
        assert!(validator.is_valid("CCDS5863.1"));
        assert!(!validator.is_valid("ENSG0000015776"));
        assert!(!validator.is_valid("ENSX00000157764"));
        assert!(!validator.is_valid("BRAF"));
        assert!(!validator.is_valid("P15056"));
    }

    #[test]
    fn test_any_accepts_non_empty() {
        let validator = AccessionValidator::any();
        assert!(validator.is_valid("BRAF"));
        assert!(!validator.is_valid("  "));
    }

    #[test]
    fn test_check_trims_or_rejects() {
        let validator = AccessionValidator::ensembl().unwrap();
        assert_eq!(validator.check(" ENST00000288602 ").unwrap(), "ENST00000288602");
        let err = validator.check("BRAF ").unwrap_err();
        assert!(matches!(err, EnsemblError::InvalidAccession(ref id) if id == "BRAF"));
        assert_eq!(err.to_string(), "Invalid accession 'BRAF'");
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        assert!(AccessionValidator::from_patterns(&["(unclosed"]).is_err());
    }
}
