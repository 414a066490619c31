//! Smith–Waterman local alignment with affine gaps (Gotoh), over byte slices.
//!
//! Three DP matrices are filled on the integer grid of [`ScaledScoring`]:
//! `H` (best score ending at a cell), `E` (ending in a gap in the query) and
//! `F` (ending in a gap in the target). The first cell, in query-major order,
//! that reaches the maximum score ends the alignment; traceback follows the
//! state that produced each value, preferring the diagonal, then a gap in the
//! target, then a gap in the query.
//!
//! The returned alignment is rendered over the **whole** of both inputs: the
//! unaligned prefixes are right-justified in front of the local core and the
//! unaligned suffixes are left-justified after it, padded with `-`. When no
//! gap is opened and the core sits on the diagonal, the rendering is simply
//! the two input sequences stacked.
//!
//! ### Example
//! ```rust
//! use sitehomology::{local_align, ScoringParams};
//! let sc = ScoringParams::default().scaled();
//! let aln = local_align(b"ACGTTGCA", b"ACGATGCA", &sc);
//! assert_eq!(aln.score, 60); // 7 matches, 1 mismatch, scaled by 10
//! assert_eq!(aln.aligned_query, b"ACGTTGCA".to_vec());
//! assert_eq!(aln.aligned_target, b"ACGATGCA".to_vec());
//! ```

use crate::common::ScaledScoring;

/// Gap symbol used in rendered alignments.
pub const GAP: u8 = b'-';

/// A local alignment rendered over the full query and target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalAlignment {
    /// Best local score on the integer grid.
    pub score: i32,
    /// Half-open query range covered by the local core.
    pub query_range: (usize, usize),
    /// Half-open target range covered by the local core.
    pub target_range: (usize, usize),
    /// Query row, including `-` for gaps and padding.
    pub aligned_query: Vec<u8>,
    /// Target row, same length as `aligned_query`.
    pub aligned_target: Vec<u8>,
    /// CIGAR-like operations of the core (`M`, `D` = query base over a target
    /// gap, `I` = target base under a query gap).
    pub cigar: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    H,
    E,
    F,
}

/// Align `query` against `target` locally with affine gaps.
pub fn local_align(query: &[u8], target: &[u8], sc: &ScaledScoring) -> LocalAlignment {
    let n = query.len();
    let m = target.len();
    let (go, ge) = (sc.gap_open, sc.gap_extend);
    let pair = |x: u8, y: u8| if x == y { sc.match_score } else { sc.mismatch };

    let neg_inf = i32::MIN / 4;
    let mut h = vec![vec![0i32; m + 1]; n + 1];
    let mut e = vec![vec![neg_inf; m + 1]; n + 1];
    let mut f = vec![vec![neg_inf; m + 1]; n + 1];

    let (mut best, mut bi, mut bj) = (0i32, 0usize, 0usize);
    for i in 1..=n {
        for j in 1..=m {
            e[i][j] = (h[i][j - 1] - go).max(e[i][j - 1] - ge);
            f[i][j] = (h[i - 1][j] - go).max(f[i - 1][j] - ge);
            let diag = h[i - 1][j - 1] + pair(query[i - 1], target[j - 1]);
            let val = 0.max(diag).max(e[i][j]).max(f[i][j]);
            h[i][j] = val;
            if val > best {
                best = val;
                bi = i;
                bj = j;
            }
        }
    }

    // Traceback from the best cell until H drops to zero.
    let (mut i, mut j) = (bi, bj);
    let mut state = State::H;
    let mut core_q: Vec<u8> = Vec::new();
    let mut core_t: Vec<u8> = Vec::new();
    let mut ops: Vec<(char, usize)> = Vec::new();
    while i > 0 && j > 0 {
        match state {
            State::H => {
                let here = h[i][j];
                if here == 0 {
                    break;
                }
                if here == h[i - 1][j - 1] + pair(query[i - 1], target[j - 1]) {
                    core_q.push(query[i - 1]);
                    core_t.push(target[j - 1]);
                    push_cigar(&mut ops, 'M');
                    i -= 1;
                    j -= 1;
                } else if here == f[i][j] {
                    state = State::F;
                } else {
                    state = State::E;
                }
            }
            State::F => {
                core_q.push(query[i - 1]);
                core_t.push(GAP);
                push_cigar(&mut ops, 'D');
                let opened = f[i][j] == h[i - 1][j] - go;
                i -= 1;
                if opened {
                    state = State::H;
                }
            }
            State::E => {
                core_q.push(GAP);
                core_t.push(target[j - 1]);
                push_cigar(&mut ops, 'I');
                let opened = e[i][j] == h[i][j - 1] - go;
                j -= 1;
                if opened {
                    state = State::H;
                }
            }
        }
    }
    core_q.reverse();
    core_t.reverse();
    ops.reverse();
    let cigar = ops.into_iter().map(|(op, len)| format!("{len}{op}")).collect::<String>();

    let (qs, ts) = if best == 0 { (0, 0) } else { (i, j) };
    let (qe, te) = if best == 0 { (0, 0) } else { (bi, bj) };
    let (aligned_query, aligned_target) = render(query, target, (qs, qe), (ts, te), &core_q, &core_t);

    LocalAlignment {
        score: best,
        query_range: (qs, qe),
        target_range: (ts, te),
        aligned_query,
        aligned_target,
        cigar,
    }
}

fn render(
    query: &[u8],
    target: &[u8],
    (qs, qe): (usize, usize),
    (ts, te): (usize, usize),
    core_q: &[u8],
    core_t: &[u8],
) -> (Vec<u8>, Vec<u8>) {
    let pre = qs.max(ts);
    let post = (query.len() - qe).max(target.len() - te);
    let width = pre + core_q.len() + post;
    let mut aq = Vec::with_capacity(width);
    let mut at = Vec::with_capacity(width);

    aq.resize(pre - qs, GAP);
    aq.extend_from_slice(&query[..qs]);
    at.resize(pre - ts, GAP);
    at.extend_from_slice(&target[..ts]);

    aq.extend_from_slice(core_q);
    at.extend_from_slice(core_t);

    aq.extend_from_slice(&query[qe..]);
    aq.resize(width, GAP);
    at.extend_from_slice(&target[te..]);
    at.resize(width, GAP);
    (aq, at)
}

fn push_cigar(ops: &mut Vec<(char, usize)>, op: char) {
    if let Some(last) = ops.last_mut() {
        if last.0 == op {
            last.1 += 1;
            return;
        }
    }
    ops.push((op, 1));
}
