//! Diagnostics for identifiers that produced no result

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    /// Rejected by the accession pattern before any request
    InvalidAccession,
    /// The service returned nothing for it
    NotFound,
    /// Neither a lookup nor a symbol search produced a gene id
    Unresolved,
    /// Features could not be mapped onto it
    Unmapped(String),
    /// The request was cancelled or timed out first
    Cancelled,
    /// The service failed its availability probe
    ServiceUnavailable,
    Failed(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::InvalidAccession => write!(f, "not a valid accession"),
            DropReason::NotFound => write!(f, "no data returned"),
            DropReason::Unresolved => write!(f, "could not be resolved to a gene"),
            DropReason::Unmapped(why) => write!(f, "features not mapped: {}", why),
            DropReason::Cancelled => write!(f, "request cancelled"),
            DropReason::ServiceUnavailable => write!(f, "service unavailable"),
            DropReason::Failed(why) => write!(f, "{}", why),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedId {
    pub id: String,
    pub reason: DropReason,
}

/// Identifiers dropped during one request, in the order they were dropped
///
/// `dropped` ids have no sequence in the outcome. `unannotated` ids do have
/// one, but its features or product could not be added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    dropped: Vec<DroppedId>,
    unannotated: Vec<DroppedId>,
}

impl FetchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a dropped identifier
    pub fn drop_id(&mut self, id: impl Into<String>, reason: DropReason) {
        let id = id.into();
        warn!(id = %id, reason = %reason, "Identifier dropped");
        self.dropped.push(DroppedId { id, reason });
    }

    /// Record and log a returned sequence whose annotations were lost
    pub fn annotation_failed(&mut self, id: impl Into<String>, reason: DropReason) {
        let id = id.into();
        warn!(id = %id, reason = %reason, "Annotations dropped");
        self.unannotated.push(DroppedId { id, reason });
    }

    pub fn dropped(&self) -> &[DroppedId] {
        &self.dropped
    }

    pub fn unannotated(&self) -> &[DroppedId] {
        &self.unannotated
    }

    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty() && self.unannotated.is_empty()
    }

    /// Whether `id` was dropped; unannotated ids are not
    pub fn contains(&self, id: &str) -> bool {
        self.dropped.iter().any(|d| d.id.eq_ignore_ascii_case(id))
    }

    pub fn extend(&mut self, other: FetchReport) {
        self.dropped.extend(other.dropped);
        self.unannotated.extend(other.unannotated);
    }
}
