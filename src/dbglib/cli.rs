use crate::dbglib::{AssemblyParams, Passes, SimplifyParams, MIN_KMER};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Clone, Debug)]
#[command(name = "dbga")]
#[command(about = "de Bruijn Graph Assembly of short reads")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

pub trait DbgaParams: std::fmt::Debug {
    fn validate(&self) -> bool;
    fn debug(&self) -> bool;
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(about = "Assemble reads into contigs")]
    Assemble(AssembleArgs),

    #[command(about = "Count the kmers of reads")]
    Kmers(KmerArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AssembleArgs {
    #[command(flatten)]
    pub io: IOParams,

    #[command(flatten)]
    pub asm: AsmParams,
}

#[derive(clap::Args, Clone, Debug)]
pub struct IOParams {
    /// Reads to assemble (.fastq or .fasta)
    #[arg(short, long, help_heading = "I/O")]
    pub input: PathBuf,

    /// Output contigs fasta (default stdout)
    #[arg(short, long, help_heading = "I/O")]
    pub output: Option<PathBuf>,

    /// Write the simplified graph as graphviz dot
    #[arg(long, help_heading = "I/O")]
    pub dot: Option<PathBuf>,

    /// Write assembly statistics as json
    #[arg(long, help_heading = "I/O")]
    pub stats: Option<PathBuf>,

    /// Number of threads
    #[arg(short, long, default_value_t = 1, help_heading = "I/O")]
    pub threads: usize,

    /// Reads per batch handed to a counting thread
    #[arg(long, default_value_t = 10000, help_heading = "I/O")]
    pub chunk_size: usize,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(clap::Args, Serialize, Deserialize, Clone, Debug)]
pub struct AsmParams {
    /// Kmer size
    #[arg(short, long, default_value_t = 22, help_heading = "Assembly")]
    pub kmer: usize,

    /// Longest dead-end path to clip, in kmers (0 = 2 * kmer)
    #[arg(long, default_value_t = 0, help_heading = "Simplification")]
    pub max_tip_len: usize,

    /// Longest bubble branch to compare, in kmers (0 = 2 * kmer)
    #[arg(long, default_value_t = 0, help_heading = "Simplification")]
    pub max_bubble_len: usize,

    /// Largest length difference between bubble branches, in kmers
    #[arg(long, default_value_t = 1, help_heading = "Simplification")]
    pub bubble_len_slack: usize,

    /// Maximum rounds of tip clipping and bubble popping
    #[arg(long, default_value_t = 64, help_heading = "Simplification")]
    pub max_rounds: usize,

    /// Don't clip tips
    #[arg(long, default_value_t = false, help_heading = "Simplification")]
    pub no_tips: bool,

    /// Don't pop bubbles
    #[arg(long, default_value_t = false, help_heading = "Simplification")]
    pub no_bubbles: bool,
}

impl AsmParams {
    pub fn passes(&self) -> Passes {
        let mut passes = Passes::all();
        if self.no_tips {
            passes.remove(Passes::TIPS);
        }
        if self.no_bubbles {
            passes.remove(Passes::BUBBLES);
        }
        passes
    }

    /// Core parameters with zeroed lengths filled in from the kmer size
    pub fn to_assembly(&self, threads: usize, chunk_size: usize) -> AssemblyParams {
        let defaults = SimplifyParams::for_kmer(self.kmer);
        AssemblyParams {
            kmer: self.kmer,
            threads,
            chunk_size,
            simplify: SimplifyParams {
                passes: self.passes(),
                max_tip_len: if self.max_tip_len == 0 {
                    defaults.max_tip_len
                } else {
                    self.max_tip_len
                },
                max_bubble_len: if self.max_bubble_len == 0 {
                    defaults.max_bubble_len
                } else {
                    self.max_bubble_len
                },
                bubble_len_slack: self.bubble_len_slack,
                max_rounds: self.max_rounds,
            },
        }
    }
}

impl DbgaParams for AssembleArgs {
    fn debug(&self) -> bool {
        self.io.debug
    }

    /// Validate command line arguments
    fn validate(&self) -> bool {
        let mut is_ok = true;

        is_ok &= validate_file(&self.io.input, "--input");
        is_ok &= validate_kmer(self.asm.kmer);

        if self.io.threads < 1 {
            error!("--threads must be at least 1");
            is_ok = false;
        }

        if self.io.chunk_size < 1 {
            error!("--chunk-size must be at least 1");
            is_ok = false;
        }

        if self.asm.max_rounds < 1 {
            error!("--max-rounds must be at least 1");
            is_ok = false;
        }

        if self.asm.no_tips && self.asm.no_bubbles {
            warn!("graph simplification is disabled; expect fragmented contigs");
        }

        is_ok
    }
}

#[derive(Parser, Serialize, Deserialize, Debug, Clone)]
pub struct KmerArgs {
    /// Reads to count (.fastq or .fasta)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output kmer counts tsv (default stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Kmer size
    #[arg(short, long, default_value_t = 22)]
    pub kmer: usize,

    /// Minimum count of kmers to report
    #[arg(long, default_value_t = 1)]
    pub min_count: u64,

    /// Number of threads
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Reads per batch handed to a counting thread
    #[arg(long, default_value_t = 10000)]
    pub chunk_size: usize,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl DbgaParams for KmerArgs {
    fn debug(&self) -> bool {
        self.debug
    }

    fn validate(&self) -> bool {
        let mut is_ok = true;

        is_ok &= validate_file(&self.input, "--input");
        is_ok &= validate_kmer(self.kmer);

        if self.threads < 1 {
            error!("--threads must be at least 1");
            is_ok = false;
        }

        if self.chunk_size < 1 {
            error!("--chunk-size must be at least 1");
            is_ok = false;
        }

        is_ok
    }
}

/// Helper function to validate a file's existence and type
fn validate_file(path: &Path, label: &str) -> bool {
    if !path.exists() {
        error!("{} does not exist", label);
        return false;
    }
    if !path.is_file() {
        error!("{} is not a file", label);
        return false;
    }
    true
}

fn validate_kmer(kmer: usize) -> bool {
    if kmer < MIN_KMER {
        error!("--kmer must be at least {}", MIN_KMER);
        return false;
    }
    if kmer > 64 {
        warn!("--kmer above 64 is unusual for short reads");
    }
    true
}
