mod assemble_main;
pub use crate::dbglib::assemble_main::{assemble_main, read_spinner};

mod assembler;
pub use crate::dbglib::assembler::{
    n50, Assembler, Assembly, AssemblyParams, AssemblyStats, MIN_KMER,
};

mod cli;
pub use crate::dbglib::cli::{AsmParams, AssembleArgs, Cli, Commands, DbgaParams, IOParams, KmerArgs};

mod contigs;
pub use crate::dbglib::contigs::{extract_contigs, get_sink_nodes, get_starting_nodes, Contig};

mod contigwriter;
pub use crate::dbglib::contigwriter::{open_output, ContigWriter, LINE_WIDTH};

mod counter;
pub use crate::dbglib::counter::{count_kmers, KmerCounts, ReadTally};

mod dot;
pub use crate::dbglib::dot::{to_dot, to_petgraph};

mod errors;
pub use crate::dbglib::errors::DbgError;

mod graph;
pub use crate::dbglib::graph::{DbGraph, NodeId};

mod kmer;
pub use crate::dbglib::kmer::{cut_kmers, normalize_read};

mod kmers_main;
pub use crate::dbglib::kmers_main::kmers_main;

mod readparser;
pub use crate::dbglib::readparser::ReadParser;

mod simplify;
pub use crate::dbglib::simplify::{
    clip_tips, pop_bubbles, simplify, Passes, SimplifyParams, SimplifyReport,
};
