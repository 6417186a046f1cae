use crate::dbglib::{cut_kmers, normalize_read, DbgError};
use crossbeam_channel::{bounded, Receiver, Sender};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::thread::{self, JoinHandle};

type InputType = Option<Vec<Vec<u8>>>;
type OutputType = KmerCounts;

/// What happened to the reads that went through a counter
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReadTally {
    pub total: u64,
    pub used: u64,
    pub invalid: u64,
    pub short: u64,
    pub longest: usize,
}

impl ReadTally {
    pub fn skipped(&self) -> u64 {
        self.invalid + self.short
    }

    fn merge(&mut self, other: &ReadTally) {
        self.total += other.total;
        self.used += other.used;
        self.invalid += other.invalid;
        self.short += other.short;
        self.longest = self.longest.max(other.longest);
    }
}

/// Occurrence count of every distinct kmer seen
#[derive(Debug, Clone)]
pub struct KmerCounts {
    pub kmer: usize,
    pub counts: IndexMap<Vec<u8>, u64>,
    pub tally: ReadTally,
}

impl KmerCounts {
    pub fn new(kmer: usize) -> Self {
        Self {
            kmer,
            counts: IndexMap::new(),
            tally: ReadTally::default(),
        }
    }

    /// Count a read's kmers. Malformed reads are tallied and skipped
    pub fn add_read(&mut self, read: &[u8]) {
        self.tally.total += 1;
        let seq = match normalize_read(read) {
            Ok(seq) => seq,
            Err(e) => {
                debug!("skipping read {}: {}", self.tally.total, e);
                self.tally.invalid += 1;
                return;
            }
        };
        self.tally.longest = self.tally.longest.max(seq.len());

        match cut_kmers(&seq, self.kmer) {
            Ok(kmers) => {
                for kmer in kmers {
                    // get_mut first so repeated kmers don't allocate
                    if let Some(cnt) = self.counts.get_mut(kmer) {
                        *cnt += 1;
                    } else {
                        self.counts.insert(kmer.to_vec(), 1);
                    }
                }
                self.tally.used += 1;
            }
            Err(e) => {
                debug!("skipping read {}: {}", self.tally.total, e);
                self.tally.short += 1;
            }
        }
    }

    /// Sum another set of counts into this one
    pub fn merge(&mut self, other: KmerCounts) {
        for (kmer, cnt) in other.counts {
            *self.counts.entry(kmer).or_insert(0) += cnt;
        }
        self.tally.merge(&other.tally);
    }

    /// Put kmers in lexicographic order so downstream ids don't depend on read order
    pub fn sort(&mut self) {
        self.counts.sort_keys();
    }

    /// Drop kmers seen fewer than `min_count` times
    pub fn retain_min(&mut self, min_count: u64) {
        self.counts.retain(|_, cnt| *cnt >= min_count);
    }

    pub fn get(&self, kmer: &[u8]) -> Option<u64> {
        self.counts.get(kmer).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        self.counts.iter().map(|(k, v)| (k.as_slice(), *v))
    }
}

/// Count kmers over all reads. With more than one thread, batches of `chunk_size` reads
/// are counted by workers and merged here, the only place shared counts are written.
/// Counts come back sorted so every thread count gives the same result.
pub fn count_kmers<I, S>(reads: I, kmer: usize, threads: usize, chunk_size: usize) -> KmerCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut result = if threads <= 1 {
        let mut counts = KmerCounts::new(kmer);
        for read in reads {
            counts.add_read(read.as_ref());
        }
        counts
    } else {
        parallel_count(reads, kmer, threads, chunk_size.max(1))
    };
    result.sort();
    result
}

fn parallel_count<I, S>(reads: I, kmer: usize, threads: usize, chunk_size: usize) -> KmerCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    // Bounded so the reader can't get too far ahead of the workers
    let (task_sender, task_receiver): (Sender<InputType>, Receiver<InputType>) =
        bounded(threads * 2);
    let (result_sender, result_receiver): (Sender<OutputType>, Receiver<OutputType>) =
        bounded(threads);

    debug!("spawning {} counting threads", threads);
    let task_handles: Vec<JoinHandle<()>> = (0..threads)
        .map(|_| {
            let m_receiver = task_receiver.clone();
            let m_result_sender = result_sender.clone();
            thread::spawn(move || {
                let mut local = KmerCounts::new(kmer);
                loop {
                    match m_receiver.recv() {
                        Ok(None) | Err(_) => break,
                        Ok(Some(chunk)) => {
                            for read in chunk {
                                local.add_read(&read);
                            }
                        }
                    }
                }
                let _ = m_result_sender.send(local);
            })
        })
        .collect();
    drop(task_receiver);
    drop(result_sender);

    for chunk in &reads.into_iter().chunks(chunk_size) {
        let batch: Vec<Vec<u8>> = chunk.map(|r| r.as_ref().to_vec()).collect();
        if task_sender.send(Some(batch)).is_err() {
            break;
        }
    }

    // Signal worker threads to exit
    for _ in 0..threads {
        let _ = task_sender.send(None);
    }

    let mut merged = KmerCounts::new(kmer);
    for local in result_receiver.iter() {
        merged.merge(local);
    }

    join_workers(task_handles);
    merged
}

/// Wait on every worker, raising a worker's panic again on this thread
fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(payload) = handle.join() {
            error!("kmer counting thread panicked");
            std::panic::resume_unwind(payload);
        }
    }
}
