use crate::dbglib::DbgError;
use std::slice::Windows;

#[inline]
fn normalize_nuc(nuc: u8) -> Option<u8> {
    match nuc.to_ascii_uppercase() {
        b'A' => Some(b'A'),
        b'C' => Some(b'C'),
        b'G' => Some(b'G'),
        b'T' => Some(b'T'),
        _ => None,
    }
}

/// Upper-case a read, rejecting anything outside of ACGT
pub fn normalize_read(read: &[u8]) -> Result<Vec<u8>, DbgError> {
    read.iter()
        .enumerate()
        .map(|(pos, &nuc)| {
            normalize_nuc(nuc).ok_or_else(|| {
                DbgError::MalformedRead(format!(
                    "invalid character {:?} at position {}",
                    nuc as char, pos
                ))
            })
        })
        .collect()
}

/// Lazily cut a normalized read into its L-k+1 overlapping kmers, left to right
pub fn cut_kmers(read: &[u8], kmer: usize) -> Result<Windows<'_, u8>, DbgError> {
    // Must be at least one kmer long
    if kmer < 2 || read.len() < kmer {
        return Err(DbgError::MalformedRead(format!(
            "read length {} is shorter than kmer {}",
            read.len(),
            kmer
        )));
    }
    Ok(read.windows(kmer))
}
