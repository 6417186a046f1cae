use crate::dbglib::DbgError;
use bio::io::{fasta, fastq};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

enum Records<B: BufRead> {
    Fastq(fastq::Records<B>),
    Fasta(fasta::Records<B>),
    /// First non-blank byte was neither '@' nor '>'
    Unrecognized(u8),
    Done,
}

/// Pulls read sequences out of FASTQ or FASTA, whichever the first record looks like.
/// Headers and qualities are dropped; sequences come back untouched
pub struct ReadParser<B: BufRead> {
    records: Records<B>,
    n_read: usize,
}

impl ReadParser<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DbgError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

/// Skip leading whitespace and peek at the first byte left
fn first_byte<B: BufRead>(reader: &mut B) -> Result<Option<u8>, DbgError> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let byte = buf[pos];
                reader.consume(pos);
                return Ok(Some(byte));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

impl<B: BufRead> ReadParser<B> {
    pub fn new(mut reader: B) -> Result<Self, DbgError> {
        let records = match first_byte(&mut reader)? {
            Some(b'@') => Records::Fastq(fastq::Reader::from_bufread(reader).records()),
            Some(b'>') => Records::Fasta(fasta::Reader::from_bufread(reader).records()),
            Some(other) => Records::Unrecognized(other),
            None => Records::Done,
        };
        Ok(Self {
            records,
            n_read: 0,
        })
    }
}

fn malformed(record: usize, msg: String) -> DbgError {
    DbgError::MalformedInput { record, msg }
}

impl<B: BufRead> Iterator for ReadParser<B> {
    type Item = Result<String, DbgError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.n_read + 1;
        let seq = match &mut self.records {
            Records::Fastq(records) => match records.next()? {
                Ok(rec) => Ok(rec.seq().to_vec()),
                Err(e) => Err(malformed(record, e.to_string())),
            },
            Records::Fasta(records) => match records.next()? {
                Ok(rec) => Ok(rec.seq().to_vec()),
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    Err(malformed(record, e.to_string()))
                }
                Err(e) => Err(DbgError::Io(e)),
            },
            Records::Unrecognized(byte) => {
                let msg = format!(
                    "input is neither fastq nor fasta (starts with {:?})",
                    *byte as char
                );
                self.records = Records::Done;
                return Some(Err(malformed(record, msg)));
            }
            Records::Done => return None,
        };

        // one bad record ends the stream
        let seq = match seq {
            Ok(seq) => seq,
            Err(e) => {
                self.records = Records::Done;
                return Some(Err(e));
            }
        };
        self.n_read += 1;
        Some(Ok(String::from_utf8_lossy(&seq).into_owned()))
    }
}
