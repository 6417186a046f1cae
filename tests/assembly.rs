use dbga::{
    assemble_main, Assembler, AssemblyParams, Cli, Commands, Contig, DbgError, Passes,
};
use clap::Parser;
use std::collections::HashSet;

/// Deterministic pseudo-random genome (xorshift64*)
fn genome(len: usize, seed: u64) -> String {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            let r = state.wrapping_mul(0x2545_F491_4F6C_DD1D);
            b"ACGT"[(r >> 62) as usize] as char
        })
        .collect()
}

/// Windows of `len` every `step` bases, the last one flush with the end
fn tile(seq: &str, len: usize, step: usize) -> Vec<String> {
    let mut starts: Vec<usize> = (0..=seq.len() - len).step_by(step).collect();
    if starts.last() != Some(&(seq.len() - len)) {
        starts.push(seq.len() - len);
    }
    starts.iter().map(|&s| seq[s..s + len].to_string()).collect()
}

fn substitute(read: &str, pos: usize) -> String {
    let mut bytes = read.as_bytes().to_vec();
    bytes[pos] = match bytes[pos] {
        b'A' => b'C',
        b'C' => b'G',
        b'G' => b'T',
        _ => b'A',
    };
    String::from_utf8(bytes).unwrap()
}

fn kmers_of(seq: &str, k: usize) -> Vec<String> {
    seq.as_bytes()
        .windows(k)
        .map(|w| String::from_utf8(w.to_vec()).unwrap())
        .collect()
}

fn contig_kmers(contigs: &[Contig], k: usize) -> Vec<String> {
    contigs.iter().flat_map(|c| kmers_of(&c.seq, k)).collect()
}

#[test]
fn round_trip_error_free() {
    let seq = genome(500, 42);
    let reads = tile(&seq, 50, 5);
    let result = Assembler::new(AssemblyParams::new(21))
        .assemble(&reads)
        .unwrap();
    assert_eq!(result.contigs.len(), 1);
    assert_eq!(result.contigs[0].seq, seq);
    assert_eq!(result.stats.simplify.tips_removed, 0);
    assert_eq!(result.stats.simplify.bubbles_removed, 0);
    assert_eq!(result.stats.n50, 500);
}

#[test]
fn tip_is_clipped() {
    let k = 21;
    let seq = genome(500, 7);
    let mut reads = tile(&seq, 50, 5);
    // read starting at 200 gets a bad last base
    let bad_idx = 40;
    reads[bad_idx] = substitute(&reads[bad_idx], 49);
    let bad_kmer = kmers_of(&reads[bad_idx], k).pop().unwrap();

    let result = Assembler::new(AssemblyParams::new(k))
        .assemble(&reads)
        .unwrap();
    assert_eq!(result.stats.simplify.tips_removed, 1);
    assert_eq!(result.contigs.len(), 1);
    assert_eq!(result.contigs[0].seq, seq);
    assert!(!contig_kmers(&result.contigs, k).contains(&bad_kmer));
}

#[test]
fn tip_kept_without_simplification() {
    let k = 21;
    let seq = genome(500, 7);
    let mut reads = tile(&seq, 50, 5);
    reads[40] = substitute(&reads[40], 49);

    let mut params = AssemblyParams::new(k);
    params.simplify.passes = Passes::empty();
    let result = Assembler::new(params).assemble(&reads).unwrap();
    // main path is split at the branch, plus the one-kmer tip
    assert_eq!(result.contigs.len(), 3);
    assert!(result.contigs.iter().any(|c| c.len() == k));
}

#[test]
fn bubble_is_popped() {
    let k = 21;
    let seq = genome(500, 1234);
    let mut reads = tile(&seq, 50, 5);
    reads[40] = substitute(&reads[40], 25);
    let true_kmers: HashSet<String> = kmers_of(&seq, k).into_iter().collect();
    let private: Vec<String> = kmers_of(&reads[40], k)
        .into_iter()
        .filter(|km| !true_kmers.contains(km))
        .collect();
    assert_eq!(private.len(), k);

    let result = Assembler::new(AssemblyParams::new(k))
        .assemble(&reads)
        .unwrap();
    assert_eq!(result.stats.simplify.bubbles_removed, 1);
    assert_eq!(result.contigs.len(), 1);
    assert_eq!(result.contigs[0].seq, seq);
    let out: HashSet<String> = contig_kmers(&result.contigs, k).into_iter().collect();
    assert!(private.iter().all(|km| !out.contains(km)));
}

#[test]
fn contigs_cover_surviving_kmers_once() {
    let k = 15;
    let seq = genome(800, 99);
    let mut reads = tile(&seq, 40, 4);
    reads[30] = substitute(&reads[30], 39);
    reads[80] = substitute(&reads[80], 20);
    // an unrelated fragment makes a second component
    reads.push(genome(60, 5));

    let result = Assembler::new(AssemblyParams::new(k))
        .assemble(&reads)
        .unwrap();
    let mut from_contigs = contig_kmers(&result.contigs, k);
    let n_total = from_contigs.len();
    from_contigs.sort();
    from_contigs.dedup();
    assert_eq!(n_total, from_contigs.len(), "kmer used by two contigs");

    let graph_kmers: Vec<String> = result
        .graph
        .kmers()
        .into_iter()
        .map(|(km, _)| String::from_utf8(km).unwrap())
        .collect();
    assert_eq!(from_contigs, graph_kmers);

    for contig in result.contigs.iter() {
        assert!(contig.len() >= k - 1);
        assert_eq!(contig.len(), k - 1 + contig.edges);
    }
}

#[test]
fn tandem_repeat_is_one_cycle() {
    let unit = "ACGTTGCAT";
    let seq = unit.repeat(6);
    let reads = tile(&seq, 20, 1);
    let result = Assembler::new(AssemblyParams::new(5))
        .assemble(&reads)
        .unwrap();
    assert_eq!(result.contigs.len(), 1);
    assert_eq!(result.contigs[0].seq, "ACGTTGCATACGT");
    assert_eq!(result.contigs[0].edges, unit.len());
}

#[test]
fn unique_prefix_into_repeat_is_kept() {
    let k = 7;
    let seq = format!("{}{}{}", genome(12, 8), "ACGTTGCAT".repeat(8), genome(40, 9));
    let reads = tile(&seq, 30, 1);
    let result = Assembler::new(AssemblyParams::new(k))
        .assemble(&reads)
        .unwrap();
    assert_eq!(result.stats.simplify.tips_removed, 0);
    assert_eq!(result.stats.simplify.bubbles_removed, 0);

    let mut expected = kmers_of(&seq, k);
    expected.sort();
    expected.dedup();
    let mut from_contigs = contig_kmers(&result.contigs, k);
    from_contigs.sort();
    assert_eq!(from_contigs, expected);
    assert!(result.contigs.iter().any(|c| c.seq.starts_with(&seq[..12])));
}

#[test]
fn deterministic_across_threads() {
    let seq = genome(1000, 3);
    let mut reads = tile(&seq, 60, 3);
    reads[100] = substitute(&reads[100], 30);
    reads[200] = substitute(&reads[200], 59);
    // shuffle deterministically so read order differs too
    let mut shuffled = reads.clone();
    shuffled.reverse();

    let base = Assembler::new(AssemblyParams::new(19))
        .assemble(&reads)
        .unwrap();
    for threads in [2, 4] {
        let mut params = AssemblyParams::new(19);
        params.threads = threads;
        params.chunk_size = 7;
        let other = Assembler::new(params).assemble(&shuffled).unwrap();
        assert_eq!(base.contigs, other.contigs);
        assert_eq!(base.graph.kmers(), other.graph.kmers());
    }
}

#[test]
fn short_read_fails() {
    let result = Assembler::new(AssemblyParams::new(21)).assemble(["ACGTACGT"]);
    assert!(matches!(result, Err(DbgError::InvalidK { k: 21, .. })));
}

#[test]
fn lowercase_reads_assemble() {
    let seq = genome(200, 11);
    let reads: Vec<String> = tile(&seq, 40, 4)
        .into_iter()
        .map(|r| r.to_ascii_lowercase())
        .collect();
    let result = Assembler::new(AssemblyParams::new(17))
        .assemble(&reads)
        .unwrap();
    assert_eq!(result.contigs.len(), 1);
    assert_eq!(result.contigs[0].seq, seq);
}

#[test]
fn assemble_fastq_file() {
    let seq = genome(300, 21);
    let reads = tile(&seq, 50, 5);
    let dir = tempfile::tempdir().unwrap();
    let fq = dir.path().join("reads.fq");
    let fa = dir.path().join("contigs.fasta");
    let stats = dir.path().join("stats.json");
    let dot = dir.path().join("graph.dot");

    let text: String = reads
        .iter()
        .enumerate()
        .map(|(i, r)| format!("@read{}\n{}\n+\n{}\n", i, r, "I".repeat(r.len())))
        .collect();
    std::fs::write(&fq, text).unwrap();

    let cli = Cli::try_parse_from([
        "dbga",
        "assemble",
        "-i",
        fq.to_str().unwrap(),
        "-o",
        fa.to_str().unwrap(),
        "-k",
        "21",
        "--stats",
        stats.to_str().unwrap(),
        "--dot",
        dot.to_str().unwrap(),
    ])
    .unwrap();
    let Commands::Assemble(args) = cli.command else {
        panic!("wrong subcommand");
    };
    assemble_main(args).unwrap();

    let fasta = std::fs::read_to_string(&fa).unwrap();
    let mut lines = fasta.lines();
    assert_eq!(lines.next(), Some(">contig_0 len=300"));
    let body: String = lines.collect();
    assert_eq!(body, seq);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&stats).unwrap()).unwrap();
    assert_eq!(json["stats"]["contigs"], 1);
    assert_eq!(json["params"]["kmer"], 21);
    assert!(std::fs::read_to_string(&dot).unwrap().starts_with("digraph"));
}
