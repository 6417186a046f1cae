use crate::dbglib::{
    count_kmers, extract_contigs, simplify, Contig, DbGraph, DbgError, KmerCounts, ReadTally,
    SimplifyParams, SimplifyReport,
};
use serde::Serialize;

/// Shortest kmer that still leaves two bases of overlap between nodes
pub const MIN_KMER: usize = 3;

#[derive(Debug, Clone)]
pub struct AssemblyParams {
    pub kmer: usize,
    pub threads: usize,
    pub chunk_size: usize,
    pub simplify: SimplifyParams,
}

impl AssemblyParams {
    pub fn new(kmer: usize) -> Self {
        Self {
            kmer,
            threads: 1,
            chunk_size: 10_000,
            simplify: SimplifyParams::for_kmer(kmer),
        }
    }

    pub fn validate(&self) -> Result<(), DbgError> {
        if self.kmer < MIN_KMER {
            return Err(DbgError::InvalidK {
                k: self.kmer,
                reason: format!("must be at least {}", MIN_KMER),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct AssemblyStats {
    pub kmer: usize,
    pub reads: ReadTally,
    pub distinct_kmers: usize,
    pub nodes: usize,
    pub edges: usize,
    pub simplify: SimplifyReport,
    pub contigs: usize,
    pub total_length: usize,
    pub longest: usize,
    pub n50: usize,
}

#[derive(Debug)]
pub struct Assembly {
    /// Longest first
    pub contigs: Vec<Contig>,
    /// The simplified graph the contigs were walked from
    pub graph: DbGraph,
    pub stats: AssemblyStats,
}

/// Length such that contigs at least this long hold half of the assembled bases
pub fn n50(lengths: &[usize]) -> usize {
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let half = sorted.iter().sum::<usize>().div_ceil(2);
    let mut running = 0;
    for len in sorted {
        running += len;
        if running >= half {
            return len;
        }
    }
    0
}

/// Reads in, contigs out. Holds no state between runs
pub struct Assembler {
    params: AssemblyParams,
}

impl Assembler {
    pub fn new(params: AssemblyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AssemblyParams {
        &self.params
    }

    pub fn assemble<I, S>(&self, reads: I) -> Result<Assembly, DbgError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.params.validate()?;
        let counts = count_kmers(
            reads,
            self.params.kmer,
            self.params.threads,
            self.params.chunk_size,
        );
        self.assemble_counts(counts)
    }

    /// Assemble from already counted kmers
    pub fn assemble_counts(&self, counts: KmerCounts) -> Result<Assembly, DbgError> {
        self.params.validate()?;
        let tally = counts.tally.clone();
        info!(
            "{} reads: {} used, {} invalid, {} shorter than kmer",
            tally.total, tally.used, tally.invalid, tally.short
        );
        if tally.used == 0 || counts.is_empty() {
            if tally.short > 0 {
                return Err(DbgError::InvalidK {
                    k: self.params.kmer,
                    reason: format!("longer than every read (longest {})", tally.longest),
                });
            }
            return Err(DbgError::EmptyInput {
                total: tally.total,
                skipped: tally.skipped(),
            });
        }

        let mut stats = AssemblyStats {
            kmer: self.params.kmer,
            reads: tally,
            distinct_kmers: counts.len(),
            ..Default::default()
        };

        let mut graph = DbGraph::from_counts(&counts);
        drop(counts);
        info!(
            "built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        stats.simplify = simplify(&mut graph, &self.params.simplify)?;
        stats.nodes = graph.node_count();
        stats.edges = graph.edge_count();
        info!(
            "simplified graph: {} tips, {} bubbles removed; {} nodes and {} edges remain",
            stats.simplify.tips_removed, stats.simplify.bubbles_removed, stats.nodes, stats.edges
        );

        let mut contigs = extract_contigs(&graph);
        contigs.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.seq.cmp(&b.seq)));

        let lengths: Vec<usize> = contigs.iter().map(|c| c.len()).collect();
        stats.contigs = contigs.len();
        stats.total_length = lengths.iter().sum();
        stats.longest = lengths.first().copied().unwrap_or(0);
        stats.n50 = n50(&lengths);
        info!(
            "{} contigs, {} bp, N50 {}",
            stats.contigs, stats.total_length, stats.n50
        );

        Ok(Assembly {
            contigs,
            graph,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n50() {
        assert_eq!(n50(&[]), 0);
        assert_eq!(n50(&[10]), 10);
        assert_eq!(n50(&[2, 3, 4, 5, 6, 7, 8]), 6);
        assert_eq!(n50(&[5, 5]), 5);
    }

    #[test]
    fn test_bad_kmer() {
        let asm = Assembler::new(AssemblyParams::new(2));
        assert!(matches!(
            asm.assemble(["ACGTACGT"]),
            Err(DbgError::InvalidK { k: 2, .. })
        ));
    }

    #[test]
    fn test_kmer_longer_than_reads() {
        let asm = Assembler::new(AssemblyParams::new(5));
        assert!(matches!(
            asm.assemble(["ACG"]),
            Err(DbgError::InvalidK { k: 5, .. })
        ));
    }

    #[test]
    fn test_empty() {
        let asm = Assembler::new(AssemblyParams::new(3));
        let none: Vec<&str> = vec![];
        assert!(matches!(
            asm.assemble(none),
            Err(DbgError::EmptyInput { total: 0, .. })
        ));
        assert!(matches!(
            asm.assemble(["ACNGT"]),
            Err(DbgError::EmptyInput {
                total: 1,
                skipped: 1
            })
        ));
    }

    #[test]
    fn test_bad_reads_skipped() {
        let asm = Assembler::new(AssemblyParams::new(3));
        let result = asm.assemble(["TCAGCGAT", "ACNNGT", "AC"]).unwrap();
        assert_eq!(result.stats.reads.used, 1);
        assert_eq!(result.stats.reads.skipped(), 2);
        assert_eq!(result.contigs.len(), 1);
        assert_eq!(result.contigs[0].seq, "TCAGCGAT");
        assert_eq!(result.stats.n50, 8);
    }
}
