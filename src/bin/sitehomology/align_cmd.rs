//! CLI subcommand for `sitehomology align` (one guide against one sequence).
use std::io::{self, Write};
use anyhow::Result;
use clap::Args;
use sitehomology::*;

use crate::scoring_args::ScoringArgs;

/// Options for the `align` subcommand.
#[derive(Debug, Args)]
pub struct AlignCmd {
    /// Guide sequence (no PAM).
    #[arg(long)]
    pub guide: String,
    /// Sequence searched on both strands, as if it were a window.
    #[arg(long)]
    pub sequence: String,
    /// Number of leading aligned guide positions treated as the seed.
    #[arg(long, default_value_t=8)]
    pub seed_len: usize,
    #[command(flatten)]
    pub scoring: ScoringArgs,
}

pub fn run(cmd: AlignCmd) -> Result<()> {
    let guide = Guide::new("guide", cmd.guide.as_bytes(), cmd.guide.len())?;
    let params = SearchParams {
        seed_len: cmd.seed_len,
        guide_len: guide.seq.len(),
        scoring: cmd.scoring.params(),
        ..Default::default()
    };
    params.validate()?;
    let window = Window::from_sequence("sequence", 0, cmd.sequence.into_bytes());
    let hit = best_hit(&window, &guide.seq, &params)
        .ok_or_else(|| anyhow::anyhow!("sequence ({} bp) is shorter than the guide ({} bp)", window.len(), guide.seq.len()))?;

    let mut f = io::stdout().lock();
    writeln!(f, "Strand: {}   Offset: {}   Score: {}", hit.strand, hit.offset, format_score(params.scoring.unscale(hit.score())))?;
    writeln!(f, "Mismatches: {}   Seed mismatches: {}   PAM: {}", hit.mismatches.total, hit.mismatches.seed, if hit.pam_present { "yes" } else { "no" })?;
    writeln!(f, "CIGAR: {}", hit.alignment.cigar)?;
    writeln!(f)?;
    let a = &hit.alignment.aligned_query;
    let b = &hit.alignment.aligned_target;
    let mid: String = a.iter().zip(b.iter()).map(|(&x, &y)| {
        if x == GAP || y == GAP { ' ' } else if x == y { '|' } else { '.' }
    }).collect();
    writeln!(f, "G {}", String::from_utf8_lossy(a))?;
    writeln!(f, "  {}", mid)?;
    writeln!(f, "L {}", String::from_utf8_lossy(b))?;
    Ok(())
}
