//! CLI subcommand for `sitehomology score` (candidate sites × guides).
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::Args;
use log::info;
use sitehomology::*;

use crate::scoring_args::ScoringArgs;

/// Options for the `score` subcommand.
#[derive(Debug, Args)]
pub struct ScoreCmd {
    /// FASTA file of guide sequences (protospacers without PAM).
    #[arg(long, value_name="FILE")]
    pub guides: PathBuf,
    /// Candidate table: chr, start, end, strand, site_id (tab-separated).
    #[arg(long, value_name="FILE")]
    pub candidates: PathBuf,
    /// Reference genome FASTA. `<FILE>.fai` is used for random access when present.
    #[arg(long, value_name="FILE")]
    pub fasta: PathBuf,
    /// Output TSV (`-` for stdout).
    #[arg(long, default_value="homology.tsv")]
    pub out: PathBuf,
    /// Half-width of the window searched around each cut site.
    #[arg(long, default_value_t=100)]
    pub radius: u64,
    /// Number of leading aligned guide positions treated as the seed.
    #[arg(long, default_value_t=8)]
    pub seed_len: usize,
    /// Expected guide length; guides of other lengths are skipped.
    #[arg(long, default_value_t=20)]
    pub guide_len: usize,
    /// The candidate table has no header row.
    #[arg(long, default_value_t=false)]
    pub no_header: bool,
    #[command(flatten)]
    pub scoring: ScoringArgs,
}

fn open_reference(path: &Path) -> Result<Box<dyn ReferenceSource>> {
    let mut fai = path.as_os_str().to_owned();
    fai.push(".fai");
    if Path::new(&fai).exists() {
        info!("reading reference through index {}", Path::new(&fai).display());
        Ok(Box::new(IndexedReference::from_file(&path)?))
    } else {
        info!("no .fai next to {}; loading reference into memory", path.display());
        Ok(Box::new(InMemoryReference::from_fasta_file(path)?))
    }
}

pub fn run(cmd: ScoreCmd) -> Result<()> {
    let params = SearchParams {
        radius: cmd.radius,
        seed_len: cmd.seed_len,
        guide_len: cmd.guide_len,
        scoring: cmd.scoring.params(),
    };
    params.validate()?;

    let guides = File::open(&cmd.guides).with_context(|| format!("open guides: {}", cmd.guides.display()))?;
    let guides = read_guides(guides, params.guide_len)
        .with_context(|| format!("read guides: {}", cmd.guides.display()))?;
    let sites = File::open(&cmd.candidates).with_context(|| format!("open candidates: {}", cmd.candidates.display()))?;
    let sites = read_candidates(sites, !cmd.no_header)
        .with_context(|| format!("read candidates: {}", cmd.candidates.display()))?;
    info!("loaded {} guides and {} candidate sites", guides.len(), sites.len());

    let reference = open_reference(&cmd.fasta).with_context(|| format!("open reference: {}", cmd.fasta.display()))?;
    let (rows, summary) = score_candidates(&*reference, &sites, &guides, &params)?;

    let out: Box<dyn Write> = if cmd.out.as_os_str() == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(File::create(&cmd.out).with_context(|| format!("create {}", cmd.out.display()))?))
    };
    write_hits(out, &rows).with_context(|| format!("write {}", cmd.out.display()))?;

    info!(
        "{} of {} sites scored ({} skipped, {} clipped windows); {} rows written to {}",
        summary.sites_scored, summary.sites_total, summary.sites_skipped,
        summary.truncated_windows, summary.rows, cmd.out.display()
    );
    Ok(())
}
