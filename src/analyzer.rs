//! Mismatch and PAM analysis of a chosen guide/locus alignment.
//!
//! A column counts as a mismatch when the guide row carries a base that is
//! not paired with the identical locus base: a substitution, or a gap in the
//! locus opposite a guide base. Columns where the guide row holds a gap (an
//! extra locus base, or padding) belong to no guide position and are not
//! counted, which keeps `seed <= total <= guide length`.
//!
//! The seed region is the first `seed_len` aligned columns.
//!
//! ### Example
//! ```rust
//! use sitehomology::{count_mismatches, is_pam};
//! let mm = count_mismatches(b"ACGTACGTAC", b"ACGAACGTAG", 4);
//! assert_eq!((mm.total, mm.seed), (2, 1));
//! assert!(is_pam(b"TGG") && is_pam(b"CAG") && !is_pam(b"GGA"));
//! ```

use crate::gotoh::GAP;

/// Total and seed-region mismatch counts of one alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MismatchCounts {
    pub total: usize,
    pub seed: usize,
}

/// Count mismatched guide bases over the full rendered alignment and over its
/// first `seed_len` columns.
pub fn count_mismatches(aligned_guide: &[u8], aligned_locus: &[u8], seed_len: usize) -> MismatchCounts {
    aligned_guide
        .iter()
        .zip(aligned_locus)
        .enumerate()
        .filter(|&(_, (g, l))| *g != GAP && g != l)
        .fold(MismatchCounts::default(), |acc, (col, _)| MismatchCounts {
            total: acc.total + 1,
            seed: acc.seed + usize::from(col < seed_len),
        })
}

/// `true` for an `NGG` or `NAG` triplet.
pub fn is_pam(triplet: &[u8]) -> bool {
    matches!(triplet, [_, b'G' | b'A', b'G'])
}

/// Check for a PAM directly 3′ of the frame ending (exclusively) at
/// `frame_end` in `strand_seq`. A triplet running off the window is absent.
pub fn pam_after(strand_seq: &[u8], frame_end: usize) -> bool {
    strand_seq.get(frame_end..frame_end + 3).is_some_and(is_pam)
}
