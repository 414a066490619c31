//! # sitehomology
//!
//! Seed-aware guide/locus homology scoring for CRISPR off-target candidate
//! sites.
//!
//! For every (candidate site, guide) pair the crate takes a window of
//! reference sequence around the putative cut site, slides a guide-length
//! frame across both strands of it, aligns the guide to each frame with an
//! affine-gap local alignment, and keeps the best placement. Each kept hit
//! reports its score, total and seed-region mismatches, and whether an
//! `NGG`/`NAG` PAM follows the frame.
//!
//! ## Pipeline
//! 1. [`extract_window`]: `[position - radius, position + radius)`, clipped
//!    to the chromosome.
//! 2. [`scan_strand`] / [`best_hit`]: Gotoh local alignment per frame
//!    ([`local_align`]) and a deterministic best-hit fold ([`better_hit`]).
//! 3. [`count_mismatches`] / [`pam_after`]: mismatch and PAM analysis.
//! 4. [`score_site`] / [`score_candidates`]: one row per pair, in input
//!    order.
//!
//! ## Defaults
//! match `+1`, mismatch `-1`, gap open `0.8`, gap extend `0.5`, radius `100`,
//! seed length `8`, guide length `20`.
//!
//! ### Example
//! ```
//! use sitehomology::*;
//! let guide = Guide::new("g1", b"GAGTCCGAGCAGAAGAAGAA", 20).unwrap();
//! let mut chr = b"ACCTTAGCATTAGGACTACA".repeat(5);
//! chr.extend_from_slice(b"GAGTCCGAGCAGAAGAAGAATGG");
//! chr.extend(b"ACCTTAGCATTAGGACTACA".repeat(5));
//! let reference = InMemoryReference::from_pairs([("chr1", chr)]);
//! let site = CandidateSite::new("site_1", "chr1", 117, 118);
//! let (rows, summary) = score_candidates(&reference, &[site], &[guide], &SearchParams::default()).unwrap();
//! assert_eq!(summary.rows, 1);
//! assert_eq!((rows[0].mm_total, rows[0].mm_seed, rows[0].pam_present), (0, 0, true));
//! assert_eq!(format_score(rows[0].score), "20.0");
//! ```
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod aggregate;
pub mod analyzer;
pub mod common;
pub mod gotoh;
pub mod records;
pub mod scorer;
pub mod window;

pub use aggregate::*;
pub use analyzer::*;
pub use common::*;
pub use gotoh::*;
pub use records::*;
pub use scorer::*;
pub use window::*;
