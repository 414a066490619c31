//! Common types shared by the scoring pipeline: the error enum, strands,
//! nucleotide helpers, and the scoring/search configuration.
//!
//! ## Scoring
//! [`ScoringParams`] describes a DNA match/mismatch scheme with affine gap
//! penalties. Gap penalties are positive magnitudes that are *subtracted*:
//! a gap of length `k` costs `gap_open + (k - 1) * gap_extend`.
//!
//! Fractional parameters are mapped onto an integer grid by multiplying with
//! `scale` and rounding, so that alignment scores compare exactly. The default
//! `scale` of 10 represents `0.8` and `0.5` without loss.
//!
//! ## Examples
//! ```rust
//! use sitehomology::{reverse_complement, SearchParams};
//! assert_eq!(reverse_complement(b"AACGT"), b"ACGTT".to_vec());
//! let params = SearchParams::default();
//! assert_eq!(params.radius, 100);
//! assert!(params.validate().is_ok());
//! ```

use std::fmt;

/// Errors that can be returned by the scoring pipeline.
#[derive(thiserror::Error, Debug)]
pub enum HomologyError {
    /// The reference has no sequence with this name.
    #[error("chromosome not found in reference: {chrom}")]
    ChromosomeNotFound { chrom: String },
    /// A candidate or guide record failed validation.
    #[error("malformed record {record}: {reason}")]
    MalformedRecord { record: String, reason: String },
    /// The (clipped) window cannot hold a single guide-length frame.
    #[error("window for site {site_id} is {len} bp, shorter than the {guide_len} bp guide")]
    WindowTooShort { site_id: String, len: usize, guide_len: usize },
    /// Inconsistent configuration.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// Nothing left to score after validation.
    #[error("no usable input: {0}")]
    NoUsableInput(String),
    /// The reference could not be opened or read.
    #[error("reference error: {0}")]
    Reference(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl HomologyError {
    /// Errors that only affect a single record; the run continues past them.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            HomologyError::ChromosomeNotFound { .. }
                | HomologyError::MalformedRecord { .. }
                | HomologyError::WindowTooShort { .. }
        )
    }
}

/// Genomic strand a guide was matched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Complement a single base; anything outside `ACGTN` becomes `N`.
pub fn complement(b: u8) -> u8 {
    match b.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => b'N',
    }
}

/// Reverse complement of a nucleotide byte sequence.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// `true` if `b` is one of the canonical bases `A`, `C`, `G`, `T` (any case).
pub fn is_canonical_base(b: u8) -> bool {
    matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// DNA scoring scheme with affine gaps.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringParams {
    /// Score for an identical base pair.
    pub match_score: f32,
    /// Score for a substitution (normally negative).
    pub mismatch: f32,
    /// Penalty for the first column of a gap.
    pub gap_open: f32,
    /// Penalty for every further column of the same gap.
    pub gap_extend: f32,
    /// Integer scale factor applied before rounding (10.0 maps 0.8→8, 0.5→5).
    pub scale: f32,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self { match_score: 1.0, mismatch: -1.0, gap_open: 0.8, gap_extend: 0.5, scale: 10.0 }
    }
}

/// Integer form of [`ScoringParams`] used inside the DP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaledScoring {
    pub match_score: i32,
    pub mismatch: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl ScoringParams {
    /// Multiply by `scale` and round onto the integer grid.
    pub fn scaled(&self) -> ScaledScoring {
        let s = self.scale;
        ScaledScoring {
            match_score: (self.match_score * s).round() as i32,
            mismatch: (self.mismatch * s).round() as i32,
            gap_open: (self.gap_open * s).round() as i32,
            gap_extend: (self.gap_extend * s).round() as i32,
        }
    }

    /// Convert an integer DP score back to the user's units.
    pub fn unscale(&self, score: i32) -> f64 {
        f64::from(score) / f64::from(self.scale)
    }
}

/// Largest accepted window half-width (1 Gb).
pub const MAX_RADIUS: u64 = 1_000_000_000;

/// Search configuration for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchParams {
    /// Half-width of the window around each cut site.
    pub radius: u64,
    /// Number of leading aligned columns treated as the seed region.
    pub seed_len: usize,
    /// Expected guide length (no PAM).
    pub guide_len: usize,
    pub scoring: ScoringParams,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { radius: 100, seed_len: 8, guide_len: 20, scoring: ScoringParams::default() }
    }
}

impl SearchParams {
    /// Reject settings that cannot produce meaningful hits.
    pub fn validate(&self) -> Result<(), HomologyError> {
        if self.guide_len == 0 {
            return Err(HomologyError::InvalidParams("guide length must be > 0".into()));
        }
        if self.seed_len > self.guide_len {
            return Err(HomologyError::InvalidParams(format!(
                "seed length {} exceeds guide length {}",
                self.seed_len, self.guide_len
            )));
        }
        if self.radius == 0 || self.radius > MAX_RADIUS {
            return Err(HomologyError::InvalidParams(format!(
                "radius must be in 1..={MAX_RADIUS} (got {})",
                self.radius
            )));
        }
        let sc = &self.scoring;
        if !(sc.scale.is_finite() && sc.scale >= 1.0) {
            return Err(HomologyError::InvalidParams(format!("scale must be >= 1 (got {})", sc.scale)));
        }
        if sc.gap_open < 0.0 || sc.gap_extend < 0.0 {
            return Err(HomologyError::InvalidParams("gap penalties are positive magnitudes".into()));
        }
        if sc.scaled().match_score <= 0 {
            return Err(HomologyError::InvalidParams("match score must be positive".into()));
        }
        Ok(())
    }
}
