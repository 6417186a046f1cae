use crate::dbglib::{count_kmers, open_output, read_spinner, DbgError, KmerArgs, ReadParser};
use std::io::Write;

/// Count every kmer of the reads and write `kmer\tcount`, sorted by kmer
pub fn kmers_main(args: KmerArgs) -> Result<(), DbgError> {
    let parser = ReadParser::from_path(&args.input)?;

    let mut failure: Option<DbgError> = None;
    let pbar = read_spinner();
    let reads = pbar.wrap_iter(parser.map_while(|read| match read {
        Ok(seq) => Some(seq),
        Err(e) => {
            failure = Some(e);
            None
        }
    }));

    let mut counts = count_kmers(reads, args.kmer, args.threads, args.chunk_size);
    pbar.finish_and_clear();
    if let Some(e) = failure {
        return Err(e);
    }
    info!(
        "{} reads: {} used, {} skipped",
        counts.tally.total,
        counts.tally.used,
        counts.tally.skipped()
    );
    if counts.tally.used == 0 {
        return Err(DbgError::EmptyInput {
            total: counts.tally.total,
            skipped: counts.tally.skipped(),
        });
    }

    let distinct = counts.len();
    counts.retain_min(args.min_count);
    info!(
        "{} distinct kmers, {} seen at least {} times",
        distinct,
        counts.len(),
        args.min_count
    );

    let mut writer = open_output(&args.output)?;
    for (kmer, cnt) in counts.iter() {
        writer.write_all(kmer)?;
        writeln!(writer, "\t{}", cnt)?;
    }
    writer.flush()?;
    Ok(())
}
