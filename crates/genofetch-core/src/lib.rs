//! Genofetch Core
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! A client for Ensembl-style genomic REST services that returns sequences
//! annotated in their own coordinate system.
//!
//! # Overview
//!
//! - [`rest`]: HTTP transport with 429 backoff, domain health and cancellation
//! - [`service`]: the [`service::EnsemblService`] seam and its HTTP implementation
//! - [`mapping`]: piecewise coordinate maps between genome, transcript and protein
//! - [`proxy`]: per coordinate system fetch, feature transfer and protein products
//! - [`gene`]: genes with spliced transcripts and chromosome loci
//! - [`lookup`]: resolving accessions and symbols to gene ids
//!
//! # Example
//!
//! ```no_run
//! use genofetch_core::{ClientConfig, GeneOrchestrator, HttpEnsemblService, RequestContext, RestClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> genofetch_core::Result<()> {
//! let config = ClientConfig::from_env();
//! let client = RestClient::new(config.clone())?;
//! let service = Arc::new(HttpEnsemblService::new(client));
//! let genes = GeneOrchestrator::new(service)?.with_config(&config);
//!
//! let outcome = genes
//!     .fetch_genes(&RequestContext::new(), &["BRAF".to_string()])
//!     .await?;
//! for gene in &outcome.genes {
//!     println!("{} has {} transcripts", gene.gene.name, gene.transcripts.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod accession;
pub mod config;
pub mod error;
pub mod gene;
pub mod lookup;
pub mod mapping;
pub mod model;
pub mod ontology;
pub mod proxy;
pub mod report;
pub mod rest;
pub mod service;

pub use accession::AccessionValidator;
pub use config::ClientConfig;
pub use error::{EnsemblError, Result};
pub use gene::{AnnotatedGene, GeneOrchestrator, GeneOutcome, SplicedTranscript};
pub use lookup::GeneLookup;
pub use mapping::CoordinateMap;
pub use model::{DbRef, GeneLoci, Sequence, SequenceFeature};
pub use proxy::{FetchOutcome, SeqProxy, SeqVariant};
pub use report::{DropReason, FetchReport};
pub use rest::{RequestContext, RestClient};
pub use service::{EnsemblService, HttpEnsemblService};
