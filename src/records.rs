//! Input and output records: candidate sites (TSV), guides (FASTA) and the
//! homology table (TSV).
//!
//! Readers validate every record and skip the bad ones with a warning naming
//! the offending site or guide; only I/O failures of the stream itself are
//! returned as errors.
//!
//! ### Candidate table
//! ```text
//! chr     start   end     strand  site_id
//! chr1    1050    1051    .       site_001
//! ```
//! The cut-site position is the midpoint `(start + end) / 2`.
//!
//! ### Output table
//! ```text
//! site_id guide_id strand genome_offset mm_total mm_seed score pam_present aln_guide aln_locus
//! ```

use std::collections::HashSet;
use std::io::{Read, Write};

use bio::io::fasta;
use log::warn;

use crate::common::{is_canonical_base, HomologyError, Strand};

/// Output column names, in order.
pub const OUTPUT_HEADER: [&str; 10] = [
    "site_id",
    "guide_id",
    "strand",
    "genome_offset",
    "mm_total",
    "mm_seed",
    "score",
    "pam_present",
    "aln_guide",
    "aln_locus",
];

const CANDIDATE_COLUMNS: [&str; 5] = ["chr", "start", "end", "strand", "site_id"];
const DEFAULT_COLUMNS: [usize; 5] = [0, 1, 2, 3, 4];

/// One row of the candidate table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSite {
    pub site_id: String,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// Placeholder column; both strands are always searched.
    pub strand: String,
    /// Nominal cut-site coordinate.
    pub position: u64,
}

impl CandidateSite {
    pub fn new(site_id: impl Into<String>, chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            site_id: site_id.into(),
            chrom: chrom.into(),
            start,
            end,
            strand: ".".to_string(),
            position: (start + end) / 2,
        }
    }
}

/// A guide (protospacer without PAM), uppercased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guide {
    pub id: String,
    pub seq: Vec<u8>,
}

impl Guide {
    /// Validate and normalise a guide sequence.
    pub fn new(id: impl Into<String>, seq: &[u8], guide_len: usize) -> Result<Self, HomologyError> {
        let id = id.into();
        let malformed = |reason: String| HomologyError::MalformedRecord { record: format!("guide {id}"), reason };
        if seq.len() != guide_len {
            return Err(malformed(format!("length {} (expected {guide_len})", seq.len())));
        }
        if let Some(&bad) = seq.iter().find(|&&b| !is_canonical_base(b)) {
            return Err(malformed(format!("non-nucleotide character {:?}", bad as char)));
        }
        Ok(Self { seq: seq.to_ascii_uppercase(), id })
    }
}

/// The best hit of one guide at one site; one output row.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentHit {
    pub site_id: String,
    pub guide_id: String,
    pub strand: Strand,
    /// Frame index within the strand-oriented window.
    pub offset: usize,
    /// Leftmost frame coordinate minus the cut-site position.
    pub genome_offset: i64,
    pub mm_total: usize,
    pub mm_seed: usize,
    pub score: f64,
    pub pam_present: bool,
    pub aligned_guide: String,
    pub aligned_locus: String,
}

impl AlignmentHit {
    /// Fields in [`OUTPUT_HEADER`] order.
    pub fn to_record(&self) -> [String; 10] {
        [
            self.site_id.clone(),
            self.guide_id.clone(),
            self.strand.to_string(),
            self.genome_offset.to_string(),
            self.mm_total.to_string(),
            self.mm_seed.to_string(),
            format_score(self.score),
            u8::from(self.pam_present).to_string(),
            self.aligned_guide.clone(),
            self.aligned_locus.clone(),
        ]
    }
}

/// Round to two decimals; always print at least one (`20.0`, `15.2`, `14.35`).
pub fn format_score(score: f64) -> String {
    let s = format!("{:.2}", (score * 100.0).round() / 100.0);
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Read the five-column candidate table.
///
/// With `has_header`, the first non-comment line is the header. A header
/// naming `chr`, `start`, `end` and `site_id` (optionally prefixed by `#`,
/// as in BED files) may reorder the columns. A first line that is no header
/// but parses as a candidate is read as data. Any other first line is
/// reported and skipped. Later lines starting with `#` are comments.
pub fn read_candidates<R: Read>(reader: R, has_header: bool) -> Result<Vec<CandidateSite>, HomologyError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut cols = DEFAULT_COLUMNS;
    let mut header_pending = has_header;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for rec in rdr.byte_records() {
        let rec = match rec {
            Ok(rec) => rec,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!("skipping candidate line {}: {e}", e.position().map_or(0, |p| p.line()));
                continue;
            }
        };
        let line = rec.position().map_or(0, |p| p.line());
        let comment = rec.get(0).is_some_and(|f| f.starts_with(b"#"));
        if header_pending {
            if let Some(named) = header_columns(&rec) {
                cols = named;
                header_pending = false;
                continue;
            }
            if comment {
                continue;
            }
            header_pending = false;
            if parse_candidate(&rec, &cols).is_ok() {
                warn!("candidate line {line} is not a header; reading it as data");
            } else {
                warn!(
                    "skipping candidate line {line}: unrecognised header \"{}\"; assuming columns {}",
                    rec.iter().map(String::from_utf8_lossy).collect::<Vec<_>>().join(" "),
                    CANDIDATE_COLUMNS.join(" ")
                );
                continue;
            }
        } else if comment {
            continue;
        }
        match parse_candidate(&rec, &cols) {
            Ok(site) if !seen.insert(site.site_id.clone()) => {
                warn!("skipping candidate line {line}: duplicate site_id {}", site.site_id);
            }
            Ok(site) => out.push(site),
            Err(reason) => {
                let id = rec.get(cols[4]).map_or("?".into(), String::from_utf8_lossy);
                let err = HomologyError::MalformedRecord { record: format!("candidate line {line} ({id})"), reason };
                warn!("skipping {err}");
            }
        }
    }
    Ok(out)
}

/// Column positions named by a header row, if it is one.
fn header_columns(rec: &csv::ByteRecord) -> Option<[usize; 5]> {
    let names: Vec<&[u8]> = rec
        .iter()
        .enumerate()
        .map(|(i, f)| if i == 0 { f.strip_prefix(b"#").unwrap_or(f) } else { f })
        .collect();
    let find = |aliases: &[&str]| {
        names.iter().position(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a.as_bytes())))
    };
    Some([
        find(&["chr", "chrom"])?,
        find(&["start"])?,
        find(&["end"])?,
        find(&["strand"]).unwrap_or(usize::MAX),
        find(&["site_id"])?,
    ])
}

fn parse_candidate(rec: &csv::ByteRecord, cols: &[usize; 5]) -> Result<CandidateSite, String> {
    if rec.len() != CANDIDATE_COLUMNS.len() {
        return Err(format!("expected {} columns, found {}", CANDIDATE_COLUMNS.len(), rec.len()));
    }
    let field = |idx: usize, name: &str| -> Result<&str, String> {
        match rec.get(idx).map(std::str::from_utf8) {
            Some(Ok(v)) if !v.is_empty() => Ok(v),
            Some(Err(_)) => Err(format!("{name} is not valid UTF-8")),
            _ => Err(format!("missing {name}")),
        }
    };
    let coord = |name: &str, idx: usize| -> Result<i64, String> {
        let raw = field(idx, name)?;
        raw.parse::<i64>().map_err(|_| format!("{name} is not an integer: {raw:?}"))
    };
    let chrom = field(cols[0], "chr")?;
    let start = coord("start", cols[1])?;
    let end = coord("end", cols[2])?;
    let site_id = field(cols[4], "site_id")?;
    if start < 0 || end <= 0 {
        return Err(format!("non-positive coordinates {start}-{end}"));
    }
    if end < start {
        return Err(format!("end {end} before start {start}"));
    }
    let mut site = CandidateSite::new(site_id, chrom, start as u64, end as u64);
    if let Ok(strand) = field(cols[3], "strand") {
        site.strand = strand.to_string();
    }
    Ok(site)
}

/// Read guides from FASTA, validating each against `guide_len`.
pub fn read_guides<R: Read>(reader: R, guide_len: usize) -> Result<Vec<Guide>, HomologyError> {
    let mut out: Vec<Guide> = Vec::new();
    for rec in fasta::Reader::new(reader).records() {
        let rec = rec?;
        match Guide::new(rec.id(), rec.seq(), guide_len) {
            Ok(g) if out.iter().any(|o| o.id == g.id) => warn!("skipping duplicate guide {}", g.id),
            Ok(g) => out.push(g),
            Err(e) => warn!("skipping {e}"),
        }
    }
    Ok(out)
}

/// Write the homology table, header first.
pub fn write_hits<W: Write>(writer: W, hits: &[AlignmentHit]) -> Result<(), HomologyError> {
    let mut w = csv::WriterBuilder::new().delimiter(b'\t').has_headers(false).from_writer(writer);
    w.write_record(OUTPUT_HEADER)?;
    for h in hits {
        w.write_record(h.to_record())?;
    }
    w.flush()?;
    Ok(())
}
