//! Reference access and window extraction around candidate cut sites.
//!
//! A [`ReferenceSource`] answers two questions: how long is a chromosome, and
//! what bases lie in a half-open range of it. Two implementations are provided:
//!
//! - [`InMemoryReference`] reads every record of a FASTA file up front;
//! - [`IndexedReference`] seeks through a samtools `.fai` index and only reads
//!   the requested ranges.
//!
//! Both take `&self`, so one reference can be shared across threads.
//!
//! ### Example
//! ```rust
//! use sitehomology::{extract_window, InMemoryReference};
//! let reference = InMemoryReference::from_pairs([("chr1", b"ACGTACGTAC".to_vec())]);
//! let w = extract_window(&reference, "chr1", 5, 3).unwrap();
//! assert_eq!(w.seq, b"GTACGT".to_vec());
//! assert!(!w.truncated);
//! let edge = extract_window(&reference, "chr1", 1, 3).unwrap();
//! assert_eq!((edge.start, edge.end), (0, 4));
//! assert!(edge.truncated);
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Mutex;

use bio::io::fasta;
use log::debug;

use crate::common::{reverse_complement, HomologyError, Strand};

/// Random access to reference sequence by chromosome name and range.
pub trait ReferenceSource: Send + Sync {
    /// Length of `chrom`, or `None` if the reference does not contain it.
    fn chrom_len(&self, chrom: &str) -> Option<u64>;

    /// Uppercased bases of `chrom` in `[start, end)`. The range must lie
    /// within the chromosome.
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>, HomologyError>;
}

/// Whole reference held in memory, keyed by record id.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReference {
    seqs: HashMap<String, Vec<u8>>,
}

impl InMemoryReference {
    /// Load every record of a FASTA file.
    pub fn from_fasta_file<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Self, HomologyError> {
        let reader = fasta::Reader::from_file(&path)
            .map_err(|e| HomologyError::Reference(format!("open {:?}: {e}", path)))?;
        Self::from_records(reader.records())
    }

    /// Load every record from any FASTA byte stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, HomologyError> {
        Self::from_records(fasta::Reader::new(reader).records())
    }

    fn from_records<B: std::io::BufRead>(records: fasta::Records<B>) -> Result<Self, HomologyError> {
        let mut seqs = HashMap::new();
        for rec in records {
            let rec = rec.map_err(|e| HomologyError::Reference(format!("parse FASTA: {e}")))?;
            seqs.insert(rec.id().to_string(), rec.seq().to_ascii_uppercase());
        }
        if seqs.is_empty() {
            return Err(HomologyError::Reference("reference FASTA contains no records".into()));
        }
        Ok(Self { seqs })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let seqs = pairs.into_iter().map(|(k, v)| (k.into(), v.to_ascii_uppercase())).collect();
        Self { seqs }
    }
}

impl ReferenceSource for InMemoryReference {
    fn chrom_len(&self, chrom: &str) -> Option<u64> {
        self.seqs.get(chrom).map(|s| s.len() as u64)
    }

    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>, HomologyError> {
        let seq = self
            .seqs
            .get(chrom)
            .ok_or_else(|| HomologyError::ChromosomeNotFound { chrom: chrom.to_string() })?;
        let (s, e) = (start as usize, end as usize);
        seq.get(s..e).map(<[u8]>::to_vec).ok_or_else(|| {
            HomologyError::Reference(format!("range {chrom}:{start}-{end} outside {} bp", seq.len()))
        })
    }
}

/// Reference read lazily through a `.fai` index.
pub struct IndexedReference<R: Read + Seek = File> {
    reader: Mutex<fasta::IndexedReader<R>>,
    lens: HashMap<String, u64>,
}

impl IndexedReference<File> {
    /// Open `path`, expecting the index at `path.fai`.
    pub fn from_file<P: AsRef<Path> + std::fmt::Debug>(path: &P) -> Result<Self, HomologyError> {
        let reader = fasta::IndexedReader::from_file(path)
            .map_err(|e| HomologyError::Reference(format!("open indexed {:?}: {e}", path)))?;
        Ok(Self::wrap(reader))
    }
}

impl<R: Read + Seek + Send> IndexedReference<R> {
    /// Build from an open FASTA stream and its `.fai` contents.
    pub fn from_readers<I: Read>(fasta: R, fai: I) -> Result<Self, HomologyError> {
        let reader = fasta::IndexedReader::new(fasta, fai)
            .map_err(|e| HomologyError::Reference(format!("parse .fai: {e}")))?;
        Ok(Self::wrap(reader))
    }

    fn wrap(reader: fasta::IndexedReader<R>) -> Self {
        let lens = reader.index.sequences().into_iter().map(|s| (s.name, s.len)).collect();
        Self { reader: Mutex::new(reader), lens }
    }
}

impl<R: Read + Seek + Send> ReferenceSource for IndexedReference<R> {
    fn chrom_len(&self, chrom: &str) -> Option<u64> {
        self.lens.get(chrom).copied()
    }

    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>, HomologyError> {
        if !self.lens.contains_key(chrom) {
            return Err(HomologyError::ChromosomeNotFound { chrom: chrom.to_string() });
        }
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| HomologyError::Reference("indexed reader lock poisoned".into()))?;
        let mut seq = Vec::with_capacity((end - start) as usize);
        reader.fetch(chrom, start, end)?;
        reader.read(&mut seq)?;
        seq.make_ascii_uppercase();
        Ok(seq)
    }
}

/// A stretch of reference around a cut site, on one strand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub chrom: String,
    /// 0-based inclusive genomic start of the forward-strand sequence.
    pub start: u64,
    /// 0-based exclusive genomic end.
    pub end: u64,
    pub strand: Strand,
    /// Bases in reading order for `strand` (reverse complemented for `-`).
    pub seq: Vec<u8>,
    /// The window was clipped at a chromosome boundary.
    pub truncated: bool,
}

impl Window {
    /// Forward-strand window over an explicit sequence.
    pub fn from_sequence(chrom: impl Into<String>, start: u64, seq: Vec<u8>) -> Self {
        let end = start + seq.len() as u64;
        Self { chrom: chrom.into(), start, end, strand: Strand::Forward, seq: seq.to_ascii_uppercase(), truncated: false }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// The same genomic interval read from the opposite strand.
    pub fn reverse_complement(&self) -> Window {
        let strand = match self.strand {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        };
        Window { seq: reverse_complement(&self.seq), strand, ..self.clone() }
    }

    /// Leftmost genomic coordinate covered by the frame at `offset`.
    pub fn frame_genomic_start(&self, offset: usize, frame_len: usize) -> u64 {
        match self.strand {
            Strand::Forward => self.start + offset as u64,
            Strand::Reverse => self.end - (offset + frame_len) as u64,
        }
    }
}

/// Fetch `[position - radius, position + radius)` of `chrom`, clipped to the
/// chromosome.
pub fn extract_window<R: ReferenceSource + ?Sized>(
    reference: &R,
    chrom: &str,
    position: u64,
    radius: u64,
) -> Result<Window, HomologyError> {
    let len = reference
        .chrom_len(chrom)
        .ok_or_else(|| HomologyError::ChromosomeNotFound { chrom: chrom.to_string() })?;
    let start = position.saturating_sub(radius).min(len);
    let end = position.saturating_add(radius).min(len);
    let truncated = end - start < radius.saturating_mul(2);
    if truncated {
        debug!("window {chrom}:{start}-{end} clipped at chromosome boundary ({len} bp)");
    }
    let seq = reference.fetch(chrom, start, end)?;
    Ok(Window { chrom: chrom.to_string(), start, end, strand: Strand::Forward, seq, truncated })
}
