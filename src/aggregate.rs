//! Per-site scoring and run-level aggregation.
//!
//! [`score_site`] is the independent unit of work: one window, every guide.
//! [`score_candidates`] walks the candidate list, skips sites whose errors
//! are per-record, and returns rows in canonical order (candidate input
//! order, then guide input order). Callers that shard sites across threads
//! or processes can tag rows with [`TaggedHit`] and restore that order with
//! [`resequence`].

use log::{info, warn};

use crate::common::{HomologyError, SearchParams};
use crate::records::{AlignmentHit, CandidateSite, Guide};
use crate::scorer::{best_hit, FrameHit};
use crate::window::{extract_window, ReferenceSource};

/// A row tagged with its canonical position.
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedHit {
    pub site_index: usize,
    pub guide_index: usize,
    pub hit: AlignmentHit,
}

/// Counts reported at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sites_total: usize,
    pub sites_scored: usize,
    pub sites_skipped: usize,
    pub truncated_windows: usize,
    pub rows: usize,
}

fn to_row(site: &CandidateSite, guide: &Guide, hit: FrameHit, params: &SearchParams) -> AlignmentHit {
    AlignmentHit {
        site_id: site.site_id.clone(),
        guide_id: guide.id.clone(),
        strand: hit.strand,
        offset: hit.offset,
        genome_offset: hit.genome_start as i64 - site.position as i64,
        mm_total: hit.mismatches.total,
        mm_seed: hit.mismatches.seed,
        score: params.scoring.unscale(hit.score()),
        pam_present: hit.pam_present,
        aligned_guide: String::from_utf8_lossy(&hit.alignment.aligned_query).into_owned(),
        aligned_locus: String::from_utf8_lossy(&hit.alignment.aligned_target).into_owned(),
    }
}

/// Best hit of every guide at one site, in guide order. The second value
/// tells whether the window was clipped at a chromosome end.
pub fn score_site<R: ReferenceSource + ?Sized>(
    reference: &R,
    site: &CandidateSite,
    guides: &[Guide],
    params: &SearchParams,
) -> Result<(Vec<AlignmentHit>, bool), HomologyError> {
    check_guide_lengths(guides, params.guide_len)?;
    let window = extract_window(reference, &site.chrom, site.position, params.radius)?;
    let too_short = || HomologyError::WindowTooShort {
        site_id: site.site_id.clone(),
        len: window.len(),
        guide_len: params.guide_len,
    };
    if window.len() < params.guide_len {
        return Err(too_short());
    }
    let rows = guides
        .iter()
        .map(|g| best_hit(&window, &g.seq, params).map(|h| to_row(site, g, h, params)).ok_or_else(&too_short))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((rows, window.truncated))
}

/// Every guide must have the configured length; a mismatch is a caller error.
fn check_guide_lengths(guides: &[Guide], guide_len: usize) -> Result<(), HomologyError> {
    match guides.iter().find(|g| g.seq.len() != guide_len) {
        Some(g) => Err(HomologyError::InvalidParams(format!(
            "guide {} is {} bp but the guide length is {guide_len}",
            g.id,
            g.seq.len()
        ))),
        None => Ok(()),
    }
}

/// Restore canonical order: by site, then by guide.
pub fn resequence(mut tagged: Vec<TaggedHit>) -> Vec<AlignmentHit> {
    tagged.sort_by_key(|t| (t.site_index, t.guide_index));
    tagged.into_iter().map(|t| t.hit).collect()
}

/// Score every candidate against every guide.
///
/// Per-record failures are logged and skipped; an empty candidate or guide
/// set and reference/I-O failures end the run.
pub fn score_candidates<R: ReferenceSource + ?Sized>(
    reference: &R,
    sites: &[CandidateSite],
    guides: &[Guide],
    params: &SearchParams,
) -> Result<(Vec<AlignmentHit>, RunSummary), HomologyError> {
    params.validate()?;
    if sites.is_empty() {
        return Err(HomologyError::NoUsableInput("candidate set is empty".into()));
    }
    if guides.is_empty() {
        return Err(HomologyError::NoUsableInput("guide set is empty".into()));
    }
    check_guide_lengths(guides, params.guide_len)?;
    info!("scoring {} candidate sites against {} guides", sites.len(), guides.len());

    let mut summary = RunSummary { sites_total: sites.len(), ..Default::default() };
    let mut tagged: Vec<TaggedHit> = Vec::with_capacity(sites.len() * guides.len());
    for (site_index, site) in sites.iter().enumerate() {
        if site_index % 100 == 0 {
            info!("processing site {}/{}", site_index + 1, sites.len());
        }
        match score_site(reference, site, guides, params) {
            Ok((rows, truncated)) => {
                summary.sites_scored += 1;
                summary.truncated_windows += usize::from(truncated);
                tagged.extend(rows.into_iter().enumerate().map(|(guide_index, hit)| TaggedHit {
                    site_index,
                    guide_index,
                    hit,
                }));
            }
            Err(e) if e.is_per_record() => {
                warn!("skipping site {}: {e}", site.site_id);
                summary.sites_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    let rows = resequence(tagged);
    summary.rows = rows.len();
    Ok((rows, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Strand;
    use crate::window::InMemoryReference;

    const GUIDE: &[u8] = b"GAGTCCGAGCAGAAGAAGAA";

    fn filler(len: usize) -> Vec<u8> {
        b"CATTCGATCCAGTTAGCTCA".iter().copied().cycle().take(len).collect()
    }

    fn reference() -> InMemoryReference {
        // chr1: guide + TGG starting at 300
        let mut chr1 = filler(300);
        chr1.extend_from_slice(GUIDE);
        chr1.extend_from_slice(b"TGG");
        chr1.extend(filler(300));
        // chr2: guide + AGG 10 bp from the start
        let mut chr2 = filler(10);
        chr2.extend_from_slice(b"GAGTCCGAGCAGAACTAGAA");
        chr2.extend_from_slice(b"AGG");
        chr2.extend(filler(40));
        InMemoryReference::from_pairs([("chr1", chr1), ("chr2", chr2), ("tiny", b"ACGT".to_vec())])
    }

    fn guides() -> Vec<Guide> {
        vec![
            Guide::new("g1", GUIDE, 20).unwrap(),
            Guide::new("g2", b"TTTTTTTTTTGGGGGGGGGG", 20).unwrap(),
        ]
    }

    #[test]
    fn exact_site_reports_offset_from_cut_site() {
        let site = CandidateSite::new("s1", "chr1", 317, 318);
        let (rows, truncated) = score_site(&reference(), &site, &guides(), &SearchParams::default()).unwrap();
        assert!(!truncated);
        assert_eq!(rows.len(), 2);
        let r = &rows[0];
        assert_eq!((r.guide_id.as_str(), r.strand), ("g1", Strand::Forward));
        assert_eq!((r.mm_total, r.mm_seed, r.pam_present), (0, 0, true));
        assert_eq!(r.score, 20.0);
        assert_eq!(r.genome_offset, 300 - 317);
        assert_eq!(r.offset, 83);
        assert_eq!(rows[1].guide_id, "g2");
    }

    #[test]
    fn site_near_chromosome_start_uses_short_window() {
        let site = CandidateSite::new("edge", "chr2", 15, 16);
        let (rows, truncated) = score_site(&reference(), &site, &guides(), &SearchParams::default()).unwrap();
        assert!(truncated);
        let r = &rows[0];
        assert_eq!((r.mm_total, r.mm_seed, r.pam_present), (2, 0, true));
        assert_eq!(r.offset, 10);
        assert_eq!(r.genome_offset, 10 - 15);
    }

    #[test]
    fn bad_sites_are_skipped_and_order_is_kept() {
        let sites = vec![
            CandidateSite::new("a", "chr1", 317, 318),
            CandidateSite::new("missing", "chrUn", 10, 11),
            CandidateSite::new("short", "tiny", 2, 3),
            CandidateSite::new("b", "chr2", 15, 16),
        ];
        let (rows, summary) = score_candidates(&reference(), &sites, &guides(), &SearchParams::default()).unwrap();
        let order: Vec<(&str, &str)> = rows.iter().map(|r| (r.site_id.as_str(), r.guide_id.as_str())).collect();
        assert_eq!(order, vec![("a", "g1"), ("a", "g2"), ("b", "g1"), ("b", "g2")]);
        assert_eq!(
            summary,
            RunSummary { sites_total: 4, sites_scored: 2, sites_skipped: 2, truncated_windows: 1, rows: 4 }
        );
        assert!(rows.iter().all(|r| r.mm_seed <= r.mm_total && r.mm_total <= 20));
    }

    #[test]
    fn empty_inputs_are_fatal() {
        let sites = vec![CandidateSite::new("a", "chr1", 317, 318)];
        let err = score_candidates(&reference(), &[], &guides(), &SearchParams::default()).unwrap_err();
        assert!(matches!(err, HomologyError::NoUsableInput(_)));
        let err = score_candidates(&reference(), &sites, &[], &SearchParams::default()).unwrap_err();
        assert!(matches!(err, HomologyError::NoUsableInput(_)));
    }

    #[test]
    fn guide_of_wrong_length_is_rejected() {
        let mut seq = GUIDE.to_vec();
        seq.extend_from_slice(b"TGG");
        let long = vec![Guide::new("long", &seq, 23).unwrap()];
        let site = CandidateSite::new("s1", "chr1", 317, 318);
        let err = score_candidates(&reference(), &[site.clone()], &long, &SearchParams::default()).unwrap_err();
        assert!(matches!(err, HomologyError::InvalidParams(ref m) if m.contains("guide long")));
        assert!(score_site(&reference(), &site, &long, &SearchParams::default()).is_err());
    }

    #[test]
    fn resequence_restores_input_order() {
        let (rows, _) = score_candidates(
            &reference(),
            &[CandidateSite::new("a", "chr1", 317, 318), CandidateSite::new("b", "chr2", 15, 16)],
            &guides(),
            &SearchParams::default(),
        )
        .unwrap();
        let mut tagged: Vec<TaggedHit> = rows
            .iter()
            .enumerate()
            .map(|(i, h)| TaggedHit { site_index: i / 2, guide_index: i % 2, hit: h.clone() })
            .collect();
        tagged.reverse();
        tagged.swap(0, 2);
        assert_eq!(resequence(tagged), rows);
    }
}
