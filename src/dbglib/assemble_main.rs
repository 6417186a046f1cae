use crate::dbglib::{
    to_dot, AsmParams, AssembleArgs, Assembler, AssemblyStats, ContigWriter, DbgError, ReadParser,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Serialize)]
struct Summary<'a> {
    params: &'a AsmParams,
    stats: &'a AssemblyStats,
}

pub fn read_spinner() -> ProgressBar {
    let sty = ProgressStyle::with_template(" [{elapsed_precise}] {spinner} {pos} reads")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    ProgressBar::new_spinner().with_style(sty)
}

pub fn assemble_main(args: AssembleArgs) -> Result<(), DbgError> {
    let parser = ReadParser::from_path(&args.io.input)?;
    let assembler = Assembler::new(args.asm.to_assembly(args.io.threads, args.io.chunk_size));
    debug!("assembly params: {:#?}", assembler.params());

    // Stop at the first unreadable record and report it once the reads are consumed
    let mut failure: Option<DbgError> = None;
    let pbar = read_spinner();
    let reads = pbar.wrap_iter(parser.map_while(|read| match read {
        Ok(seq) => Some(seq),
        Err(e) => {
            failure = Some(e);
            None
        }
    }));

    info!("assembling with k={}", args.asm.kmer);
    let result = assembler.assemble(reads);
    pbar.finish_and_clear();
    if let Some(e) = failure {
        return Err(e);
    }
    let assembly = result?;

    let mut writer = ContigWriter::new(&args.io.output)?;
    writer.write_all(&assembly.contigs)?;
    info!("wrote {} contigs", writer.n_written);

    if let Some(path) = &args.io.dot {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(to_dot(&assembly.graph).as_bytes())?;
        out.flush()?;
        info!("wrote graph to {}", path.display());
    }

    if let Some(path) = &args.io.stats {
        let out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(
            out,
            &Summary {
                params: &args.asm,
                stats: &assembly.stats,
            },
        )?;
    }

    info!("assembly stats: {:#?}", assembly.stats);
    Ok(())
}
