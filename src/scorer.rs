//! Strand-aware frame scan: the guide is aligned against every guide-length
//! frame of a window and of its reverse complement.
//!
//! Each placement yields a [`FrameHit`]; the best one is chosen with
//! [`better_hit`], a pure comparison applied as a fold over all placements.
//! Ranking, most important first:
//!
//! 1. higher alignment score;
//! 2. fewer total mismatches;
//! 3. fewer seed mismatches;
//! 4. lower frame offset;
//! 5. forward strand before reverse.
//!
//! ### Example
//! ```rust
//! use sitehomology::{best_hit, SearchParams, Strand, Window};
//! let guide = b"GAGTCCGAGCAGAAGAAGAA";
//! let mut seq = b"ACGTTACG".to_vec();
//! seq.extend_from_slice(guide);
//! seq.extend_from_slice(b"TGGCATCA");
//! let window = Window::from_sequence("chr1", 1000, seq);
//! let hit = best_hit(&window, guide, &SearchParams::default()).unwrap();
//! assert_eq!((hit.strand, hit.offset), (Strand::Forward, 8));
//! assert_eq!(hit.mismatches.total, 0);
//! assert!(hit.pam_present);
//! ```

use std::cmp::Ordering;

use crate::analyzer::{count_mismatches, pam_after, MismatchCounts};
use crate::common::{SearchParams, Strand};
use crate::gotoh::{local_align, LocalAlignment};
use crate::window::Window;

/// The alignment of a guide to one frame of one strand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameHit {
    pub strand: Strand,
    /// Frame start within the strand-oriented window sequence.
    pub offset: usize,
    /// Leftmost genomic coordinate covered by the frame.
    pub genome_start: u64,
    pub alignment: LocalAlignment,
    pub mismatches: MismatchCounts,
    pub pam_present: bool,
}

impl FrameHit {
    /// Integer-grid alignment score.
    pub fn score(&self) -> i32 {
        self.alignment.score
    }
}

/// Ranks two hits; `Ordering::Greater` means `a` is the better hit.
pub fn hit_order(a: &FrameHit, b: &FrameHit) -> Ordering {
    a.score()
        .cmp(&b.score())
        .then_with(|| b.mismatches.total.cmp(&a.mismatches.total))
        .then_with(|| b.mismatches.seed.cmp(&a.mismatches.seed))
        .then_with(|| b.offset.cmp(&a.offset))
        .then_with(|| b.strand.cmp(&a.strand))
}

/// The better of two hits; on a full tie the first argument is kept.
pub fn better_hit(a: FrameHit, b: FrameHit) -> FrameHit {
    match hit_order(&b, &a) {
        Ordering::Greater => b,
        _ => a,
    }
}

/// Align `guide` against every frame of one strand-oriented window.
pub fn scan_strand<'a>(
    window: &'a Window,
    guide: &'a [u8],
    params: &'a SearchParams,
) -> impl Iterator<Item = FrameHit> + 'a {
    let k = guide.len();
    let sc = params.scoring.scaled();
    let last = window.len().checked_sub(k);
    (0..last.map_or(0, |l| l + 1)).map(move |offset| {
        let frame = &window.seq[offset..offset + k];
        let alignment = local_align(guide, frame, &sc);
        let mismatches = count_mismatches(&alignment.aligned_query, &alignment.aligned_target, params.seed_len);
        FrameHit {
            strand: window.strand,
            offset,
            genome_start: window.frame_genomic_start(offset, k),
            pam_present: pam_after(&window.seq, offset + k),
            mismatches,
            alignment,
        }
    })
}

/// Best placement of `guide` on either strand of `window`, or `None` if the
/// window is shorter than the guide.
pub fn best_hit(window: &Window, guide: &[u8], params: &SearchParams) -> Option<FrameHit> {
    let other = window.reverse_complement();
    scan_strand(window, guide, params)
        .chain(scan_strand(&other, guide, params))
        .reduce(better_hit)
}
