use crate::error::CommonError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Dotted numeric release version reported by the REST service, e.g. `15.2`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseVersion {
    parts: Vec<u32>,
}

impl ReleaseVersion {
    /// Leading component, compared to detect incompatible service releases
    pub fn major(&self) -> u32 {
        self.parts.first().copied().unwrap_or(0)
    }

    fn part(&self, i: usize) -> u32 {
        self.parts.get(i).copied().unwrap_or(0)
    }
}

impl std::str::FromStr for ReleaseVersion {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CommonError::InvalidVersion(s.to_string()));
        }
        let parts = trimmed
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| CommonError::InvalidVersion(s.to_string()))?;
        Ok(Self { parts })
    }
}

impl std::fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        f.write_str(&joined.join("."))
    }
}

// Missing trailing components compare as zero, so 15 == 15.0
impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.part(i).cmp(&other.part(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
