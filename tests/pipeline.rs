use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sitehomology::*;

const GUIDE: &[u8] = b"GAGTCCGAGCAGAAGAAGAA";
const LINE: usize = 60;

fn random_dna(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

fn splice(seq: &mut [u8], at: usize, insert: &[u8]) {
    seq[at..at + insert.len()].copy_from_slice(insert);
}

/// Write `records` as FASTA with 60-column lines plus a matching `.fai`.
fn write_indexed_fasta(path: &Path, records: &[(&str, Vec<u8>)]) {
    let mut fa = Vec::new();
    let mut fai = String::new();
    for (name, seq) in records {
        writeln!(fa, ">{name}").unwrap();
        let offset = fa.len();
        for chunk in seq.chunks(LINE) {
            fa.extend_from_slice(chunk);
            fa.push(b'\n');
        }
        fai.push_str(&format!("{name}\t{}\t{offset}\t{LINE}\t{}\n", seq.len(), LINE + 1));
    }
    fs::write(path, fa).unwrap();
    let mut fai_path = path.as_os_str().to_owned();
    fai_path.push(".fai");
    fs::write(PathBuf::from(fai_path), fai).unwrap();
}

struct Fixture {
    _dir: tempfile::TempDir,
    fasta: PathBuf,
    guides: Vec<Guide>,
    sites: Vec<CandidateSite>,
}

fn fixture() -> Fixture {
    let mut rng = StdRng::seed_from_u64(17);
    let mut chr1 = random_dna(&mut rng, 1000);
    let mut exact = GUIDE.to_vec();
    exact.extend_from_slice(b"TGG");
    splice(&mut chr1, 400, &exact);
    let mut two_off = b"GAGTCCGAGCAGAACTAGAA".to_vec();
    two_off.extend_from_slice(b"AGG");
    splice(&mut chr1, 700, &two_off);

    let mut chr2 = random_dna(&mut rng, 150);
    let mut rev = GUIDE.to_vec();
    rev.extend_from_slice(b"CGG");
    splice(&mut chr2, 20, &reverse_complement(&rev));

    let dir = tempfile::tempdir().unwrap();
    let fasta = dir.path().join("ref.fa");
    write_indexed_fasta(&fasta, &[("chr1", chr1), ("chr2", chr2)]);

    let guides_fa = format!(">g1\n{}\n>g2\nTTTTGGGGCCCCAAAATTTT\n", String::from_utf8_lossy(GUIDE));
    let guides = read_guides(guides_fa.as_bytes(), 20).unwrap();

    let tsv = "chr\tstart\tend\tstrand\tsite_id\n\
               chr1\t410\t411\t.\texact\n\
               chrUn\t100\t101\t.\tunknown_chrom\n\
               chr1\t700\t730\t.\ttwo_mismatch\n\
               chr2\t30\t31\t.\tnear_start\n";
    let sites = read_candidates(tsv.as_bytes(), true).unwrap();
    Fixture { _dir: dir, fasta, guides, sites }
}

fn render(rows: &[AlignmentHit]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_hits(&mut buf, rows).unwrap();
    buf
}

#[test]
fn full_run_reports_expected_hits() {
    let fx = fixture();
    let reference = InMemoryReference::from_fasta_file(&fx.fasta).unwrap();
    let (rows, summary) = score_candidates(&reference, &fx.sites, &fx.guides, &SearchParams::default()).unwrap();
    assert_eq!(summary.sites_total, 4);
    assert_eq!(summary.sites_skipped, 1);
    assert_eq!(summary.rows, 6);

    let g1: Vec<&AlignmentHit> = rows.iter().filter(|r| r.guide_id == "g1").collect();
    assert_eq!(g1.iter().map(|r| r.site_id.as_str()).collect::<Vec<_>>(), ["exact", "two_mismatch", "near_start"]);

    let exact = g1[0];
    assert_eq!((exact.mm_total, exact.mm_seed, exact.pam_present), (0, 0, true));
    assert_eq!(format_score(exact.score), "20.0");
    assert_eq!(exact.strand, Strand::Forward);
    assert_eq!(exact.genome_offset, 400 - 410);

    let two = g1[1];
    assert_eq!((two.mm_total, two.mm_seed, two.pam_present), (2, 0, true));
    assert_eq!(two.genome_offset, 700 - 715);

    let rev = g1[2];
    assert_eq!(rev.strand, Strand::Reverse);
    assert_eq!((rev.mm_total, rev.mm_seed, rev.pam_present), (0, 0, true));
    assert_eq!(rev.genome_offset, 23 - 30);

    for r in &rows {
        assert!(r.mm_seed <= r.mm_total && r.mm_total <= 20);
        assert_eq!(r.aligned_guide.len(), r.aligned_locus.len());
    }
}

#[test]
fn indexed_reference_gives_identical_output() {
    let fx = fixture();
    let params = SearchParams::default();
    let mem = InMemoryReference::from_fasta_file(&fx.fasta).unwrap();
    let idx = IndexedReference::from_file(&fx.fasta).unwrap();
    let (a, _) = score_candidates(&mem, &fx.sites, &fx.guides, &params).unwrap();
    let (b, _) = score_candidates(&idx, &fx.sites, &fx.guides, &params).unwrap();
    assert_eq!(render(&a), render(&b));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let fx = fixture();
    let reference = InMemoryReference::from_fasta_file(&fx.fasta).unwrap();
    let params = SearchParams::default();
    let first = render(&score_candidates(&reference, &fx.sites, &fx.guides, &params).unwrap().0);
    let second = render(&score_candidates(&reference, &fx.sites, &fx.guides, &params).unwrap().0);
    assert_eq!(first, second);
}

#[test]
fn sharded_results_resequence_to_canonical_order() {
    let fx = fixture();
    let reference = InMemoryReference::from_fasta_file(&fx.fasta).unwrap();
    let params = SearchParams::default();
    let (canonical, _) = score_candidates(&reference, &fx.sites, &fx.guides, &params).unwrap();

    let mut tagged = Vec::new();
    for (site_index, site) in fx.sites.iter().enumerate() {
        if let Ok((rows, _)) = score_site(&reference, site, &fx.guides, &params) {
            for (guide_index, hit) in rows.into_iter().enumerate() {
                tagged.push(TaggedHit { site_index, guide_index, hit });
            }
        }
    }
    tagged.shuffle(&mut StdRng::seed_from_u64(5));
    assert_eq!(resequence(tagged), canonical);
}
