//! Genofetch CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line front end for the genofetch REST client.
//!
//! # Overview
//!
//! - **Sequences**: fetch annotated sequences by accession (`genofetch fetch`)
//! - **Genes**: resolve a query to genes with spliced transcripts (`genofetch gene`)
//! - **Lookup**: show what an identifier is and which gene owns it (`genofetch lookup`)
//! - **Assembly mapping**: convert a region between assemblies (`genofetch map-assembly`)
//! - **Health**: probe the configured domains (`genofetch ping`)

pub mod commands;
pub mod error;
pub mod output;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use output::OutputFormat;

use clap::{Parser, Subcommand, ValueEnum};
use genofetch_common::types::{ObjectType, SeqType};
use genofetch_core::rest::RequestContext;
use genofetch_core::ClientConfig;
use std::time::Duration;

/// genofetch - annotated sequences from Ensembl-style REST services
#[derive(Parser, Debug)]
#[command(name = "genofetch")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Primary REST domain
    #[arg(long, global = true, env = "GENOFETCH_DOMAIN")]
    pub domain: Option<String>,

    /// Domain for non-vertebrate divisions, defaults to the primary domain
    #[arg(long, global = true, env = "GENOFETCH_GENOMES_DOMAIN")]
    pub genomes_domain: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Give up after this many seconds, keeping what was fetched
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch annotated sequences by accession
    Fetch {
        /// Coordinate system of the sequences
        #[arg(short = 't', long = "type", value_enum, default_value_t = SeqTypeArg::Cdna)]
        seq_type: SeqTypeArg,

        /// Ensembl or CCDS accessions
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Fetch genes with their transcripts from accessions or symbols
    Gene {
        /// Gene, transcript or protein accessions, or gene symbols
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Look up an identifier
    Lookup {
        id: String,

        /// Restrict the lookup to one object type
        #[arg(long, value_enum)]
        object_type: Option<ObjectTypeArg>,
    },

    /// Convert a region between assemblies
    MapAssembly {
        /// Species name, e.g. "human"
        species: String,

        /// Source assembly, e.g. "GRCh37"
        from: String,

        /// Region as CHR:START..END:STRAND
        region: String,

        /// Target assembly, e.g. "GRCh38"
        to: String,
    },

    /// Check availability and versions of the configured domains
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeqTypeArg {
    Genomic,
    Cdna,
    Cds,
    Protein,
}

impl From<SeqTypeArg> for SeqType {
    fn from(arg: SeqTypeArg) -> Self {
        match arg {
            SeqTypeArg::Genomic => SeqType::Genomic,
            SeqTypeArg::Cdna => SeqType::Cdna,
            SeqTypeArg::Cds => SeqType::Cds,
            SeqTypeArg::Protein => SeqType::Protein,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ObjectTypeArg {
    Gene,
    Transcript,
    Translation,
}

impl From<ObjectTypeArg> for ObjectType {
    fn from(arg: ObjectTypeArg) -> Self {
        match arg {
            ObjectTypeArg::Gene => ObjectType::Gene,
            ObjectTypeArg::Transcript => ObjectType::Transcript,
            ObjectTypeArg::Translation => ObjectType::Translation,
        }
    }
}

impl Cli {
    /// Environment configuration with the domain flags applied
    ///
    /// Without a genomes domain the primary domain serves every division.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();

        if let Some(domain) = &self.domain {
            config.domain = domain.trim_end_matches('/').to_string();
        }
        config.genomes_domain = match &self.genomes_domain {
            Some(genomes) => genomes.trim_end_matches('/').to_string(),
            None => config.domain.clone(),
        };
        config
    }

    /// Request context honouring `--timeout`
    pub fn request_context(&self) -> RequestContext {
        match self.timeout {
            Some(secs) => RequestContext::with_timeout(Duration::from_secs(secs)),
            None => RequestContext::new(),
        }
    }
}
