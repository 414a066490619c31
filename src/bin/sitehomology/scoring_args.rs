//! Scoring flags shared by the subcommands.
use clap::Args;
use sitehomology::ScoringParams;

#[derive(Debug, Args)]
pub struct ScoringArgs {
    /// Score for an identical base pair.
    #[arg(long, default_value_t=1.0)]
    pub match_score: f32,
    /// Score for a substitution (negative).
    #[arg(long, default_value_t=-1.0, allow_negative_numbers=true)]
    pub mismatch: f32,
    /// Gap open penalty (first gap column, subtracted).
    #[arg(long, default_value_t=0.8)]
    pub gapopen: f32,
    /// Gap extension penalty (each further gap column, subtracted).
    #[arg(long, default_value_t=0.5)]
    pub gapextend: f32,
    /// Integer scale factor applied to all scores before alignment.
    #[arg(long, default_value_t=10.0)]
    pub scale: f32,
}

impl ScoringArgs {
    pub fn params(&self) -> ScoringParams {
        ScoringParams {
            match_score: self.match_score,
            mismatch: self.mismatch,
            gap_open: self.gapopen,
            gap_extend: self.gapextend,
            scale: self.scale,
        }
    }
}
