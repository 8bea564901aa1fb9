//! Data model for fetched sequences
//!
//! Only the fields the fetchers read or write are modelled: residues,
//! numbering, positional features, cross-references, chromosome loci and the
//! translated product of a coding sequence.

pub mod dbref;
pub mod feature;
pub mod sequence;

pub use dbref::{canonical_source, DbRef};
pub use feature::{FeatureStore, SequenceFeature};
pub use sequence::{GeneLoci, Sequence};
