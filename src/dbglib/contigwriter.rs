use crate::dbglib::{Contig, DbgError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Bases per fasta sequence line
pub const LINE_WIDTH: usize = 80;

/// Buffered handle on a file, or stdout when no path is given
pub fn open_output(out_path: &Option<PathBuf>) -> Result<Box<dyn Write>, DbgError> {
    let writer: Box<dyn Write> = match out_path {
        Some(path) => {
            let m_page = page_size::get() * 1000;
            let file = File::create(path)?;
            Box::new(BufWriter::with_capacity(m_page, file))
        }
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    Ok(writer)
}

pub struct ContigWriter {
    writer: Box<dyn Write>,
    pub n_written: usize,
}

impl ContigWriter {
    pub fn new(out_path: &Option<PathBuf>) -> Result<Self, DbgError> {
        Ok(Self::from_writer(open_output(out_path)?))
    }

    pub fn from_writer(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            n_written: 0,
        }
    }

    /// `>contig_{i} len={len}` followed by the wrapped sequence
    pub fn write_contig(&mut self, contig: &Contig) -> Result<(), DbgError> {
        writeln!(
            self.writer,
            ">contig_{} len={}",
            self.n_written,
            contig.len()
        )?;
        for line in contig.seq.as_bytes().chunks(LINE_WIDTH) {
            self.writer.write_all(line)?;
            self.writer.write_all(b"\n")?;
        }
        self.n_written += 1;
        Ok(())
    }

    pub fn write_all(&mut self, contigs: &[Contig]) -> Result<(), DbgError> {
        for contig in contigs {
            self.write_contig(contig)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Writer the test can still read after handing it off
    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn contig(seq: &str) -> Contig {
        Contig {
            seq: seq.to_string(),
            edges: seq.len() - 2,
            coverage: 1.0,
        }
    }

    #[test]
    fn test_save_contigs() {
        let buf = Shared::default();
        let mut writer = ContigWriter::from_writer(Box::new(buf.clone()));
        writer
            .write_all(&[contig("TCAGCGAT"), contig("ACAGCGAA")])
            .unwrap();
        let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert_eq!(
            text,
            ">contig_0 len=8\nTCAGCGAT\n>contig_1 len=8\nACAGCGAA\n"
        );
        assert_eq!(writer.n_written, 2);
    }

    #[test]
    fn test_wrapping() {
        let buf = Shared::default();
        let mut writer = ContigWriter::from_writer(Box::new(buf.clone()));
        let seq = "A".repeat(LINE_WIDTH * 2 + 5);
        writer.write_all(&[contig(&seq)]).unwrap();
        let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], format!(">contig_0 len={}", LINE_WIDTH * 2 + 5));
        assert_eq!(lines[1].len(), LINE_WIDTH);
        assert_eq!(lines[3].len(), 5);
    }
}
