use std::collections::HashMap;
use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::error::CompareError;
use crate::model::{Atom, DiffOptions, EditOp};

/// Side length from which very frequent atoms are left out of the match index.
const POPULAR_MIN_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// Atoms of one top-level block.
#[derive(Debug, Clone)]
struct Segment {
    range: Range<usize>,
    segment_key: u64,
}

#[derive(Debug, Clone)]
enum Chunk {
    Copy(EditOp),
    Gap { a: Range<usize>, b: Range<usize> },
}

/// Compute the edit script turning `a` into `b`.
///
/// Top-level blocks are aligned first; runs of unmatched blocks are then
/// diffed atom by atom around anchors (longest common runs).
pub fn diff_atoms(a: &[Atom], b: &[Atom], options: &DiffOptions) -> Vec<EditOp> {
    let a_keys = a.iter().map(|atom| atom.key).collect::<Vec<_>>();
    let b_keys = b.iter().map(|atom| atom.key).collect::<Vec<_>>();

    let chunks = align_segments(a, b, &a_keys, &b_keys);
    let gaps = chunks
        .iter()
        .filter(|chunk| matches!(chunk, Chunk::Gap { .. }))
        .count();
    debug!(
        chunks = chunks.len(),
        gaps,
        parallel = options.parallel,
        "aligned top-level blocks"
    );

    let threshold = options.detail_threshold;
    let diff_chunk = |chunk: &Chunk| match chunk {
        Chunk::Copy(op) => vec![*op],
        Chunk::Gap { a, b } => diff_gap(&a_keys, &b_keys, a.clone(), b.clone(), threshold),
    };

    let pieces: Vec<Vec<EditOp>> = if options.parallel {
        chunks.par_iter().map(diff_chunk).collect()
    } else {
        chunks.iter().map(diff_chunk).collect()
    };

    normalize_ops(pieces.into_iter().flatten())
}

/// Check that `ops` partition `0..a_len` and `0..b_len` exactly and in order.
pub fn verify_partition(ops: &[EditOp], a_len: usize, b_len: usize) -> Result<(), CompareError> {
    let mut i = 0usize;
    let mut j = 0usize;

    for (idx, op) in ops.iter().enumerate() {
        if op.is_empty() {
            return Err(CompareError::InvariantViolation(format!(
                "edit {idx} is empty"
            )));
        }
        match *op {
            EditOp::Copy {
                a_start,
                b_start,
                len,
            } => {
                if a_start != i || b_start != j {
                    return Err(out_of_order(idx, i, j));
                }
                i += len;
                j += len;
            }
            EditOp::Delete { a_start, len } => {
                if a_start != i {
                    return Err(out_of_order(idx, i, j));
                }
                i += len;
            }
            EditOp::Insert { b_start, len } => {
                if b_start != j {
                    return Err(out_of_order(idx, i, j));
                }
                j += len;
            }
        }
    }

    if i != a_len || j != b_len {
        return Err(CompareError::InvariantViolation(format!(
            "edit script covers {i}/{a_len} original and {j}/{b_len} modified atoms"
        )));
    }
    Ok(())
}

fn out_of_order(idx: usize, i: usize, j: usize) -> CompareError {
    CompareError::InvariantViolation(format!(
        "edit {idx} does not continue at original {i} / modified {j}"
    ))
}

fn align_segments(a: &[Atom], b: &[Atom], a_keys: &[u64], b_keys: &[u64]) -> Vec<Chunk> {
    let a_segments = build_segments(a, a_keys);
    let b_segments = build_segments(b, b_keys);

    let ops = compute_ops(
        &a_segments
            .iter()
            .map(|segment| segment.segment_key)
            .collect::<Vec<_>>(),
        &b_segments
            .iter()
            .map(|segment| segment.segment_key)
            .collect::<Vec<_>>(),
    );

    let mut chunks = Vec::new();
    let mut i = 0usize;
    let mut j = 0usize;
    let mut gap_a = 0..0;
    let mut gap_b = 0..0;

    let flush_gap = |chunks: &mut Vec<Chunk>, gap_a: &mut Range<usize>, gap_b: &mut Range<usize>| {
        if !Range::is_empty(gap_a) || !Range::is_empty(gap_b) {
            chunks.push(Chunk::Gap {
                a: gap_a.clone(),
                b: gap_b.clone(),
            });
        }
        *gap_a = gap_a.end..gap_a.end;
        *gap_b = gap_b.end..gap_b.end;
    };

    for op in ops {
        match op {
            Op::Equal => {
                let left = &a_segments[i];
                let right = &b_segments[j];
                i += 1;
                j += 1;

                // Segment keys are hashes; equal keys still need equal atoms.
                if a_keys[left.range.clone()] != b_keys[right.range.clone()] {
                    gap_a.end = left.range.end;
                    gap_b.end = right.range.end;
                    continue;
                }

                flush_gap(&mut chunks, &mut gap_a, &mut gap_b);
                chunks.push(Chunk::Copy(EditOp::Copy {
                    a_start: left.range.start,
                    b_start: right.range.start,
                    len: left.range.len(),
                }));
                gap_a = left.range.end..left.range.end;
                gap_b = right.range.end..right.range.end;
            }
            Op::Delete => {
                gap_a.end = a_segments[i].range.end;
                i += 1;
            }
            Op::Insert => {
                gap_b.end = b_segments[j].range.end;
                j += 1;
            }
        }
    }

    flush_gap(&mut chunks, &mut gap_a, &mut gap_b);
    chunks
}

fn build_segments(atoms: &[Atom], keys: &[u64]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut start = 0usize;

    for idx in 1..=atoms.len() {
        let boundary = idx == atoms.len() || root_of(&atoms[idx]) != root_of(&atoms[start]);
        if boundary {
            let bytes = keys[start..idx]
                .iter()
                .flat_map(|key| key.to_le_bytes())
                .collect::<Vec<_>>();
            segments.push(Segment {
                range: start..idx,
                segment_key: xxhash_rust::xxh3::xxh3_64(&bytes),
            });
            start = idx;
        }
    }

    segments
}

fn root_of(atom: &Atom) -> Option<usize> {
    atom.path.blocks.0.first().copied()
}

/// Diff one gap around anchors; `a` and `b` are absolute ranges.
fn diff_gap(
    a_keys: &[u64],
    b_keys: &[u64],
    a: Range<usize>,
    b: Range<usize>,
    threshold: usize,
) -> Vec<EditOp> {
    let min_anchor = threshold.max(1);
    let mut blocks: Vec<(usize, usize, usize)> = Vec::new();

    let prefix = a
        .clone()
        .zip(b.clone())
        .take_while(|&(i, j)| a_keys[i] == b_keys[j])
        .count();
    let (mut alo, mut blo) = (a.start, b.start);
    if prefix >= min_anchor {
        blocks.push((alo, blo, prefix));
        alo += prefix;
        blo += prefix;
    }

    let suffix = (alo..a.end)
        .rev()
        .zip((blo..b.end).rev())
        .take_while(|&(i, j)| a_keys[i] == b_keys[j])
        .count();
    let (mut ahi, mut bhi) = (a.end, b.end);
    if suffix >= min_anchor {
        ahi -= suffix;
        bhi -= suffix;
        blocks.push((ahi, bhi, suffix));
    }

    if alo < ahi && blo < bhi {
        let index = MatchIndex::new(b_keys, blo..bhi);
        let mut queue = vec![(alo, ahi, blo, bhi)];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, len) = index.longest_match(a_keys, b_keys, alo..ahi, blo..bhi);
            if len < min_anchor {
                continue;
            }
            blocks.push((i, j, len));
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + len < ahi && j + len < bhi {
                queue.push((i + len, ahi, j + len, bhi));
            }
        }
    }

    blocks.sort_unstable();

    let mut ops = Vec::with_capacity(blocks.len() * 3 + 2);
    let (mut i, mut j) = (a.start, b.start);
    for (bi, bj, len) in blocks.into_iter().chain(std::iter::once((a.end, b.end, 0))) {
        if i < bi {
            ops.push(EditOp::Delete {
                a_start: i,
                len: bi - i,
            });
        }
        if j < bj {
            ops.push(EditOp::Insert {
                b_start: j,
                len: bj - j,
            });
        }
        if len > 0 {
            ops.push(EditOp::Copy {
                a_start: bi,
                b_start: bj,
                len,
            });
        }
        i = bi + len;
        j = bj + len;
    }
    ops
}

/// Positions of each key in one side of a gap, without popular keys.
struct MatchIndex {
    positions: HashMap<u64, Vec<usize>>,
}

impl MatchIndex {
    fn new(keys: &[u64], range: Range<usize>) -> Self {
        let len = range.len();
        let mut positions: HashMap<u64, Vec<usize>> = HashMap::new();
        for idx in range {
            positions.entry(keys[idx]).or_default().push(idx);
        }
        if len >= POPULAR_MIN_LEN {
            let limit = len / 100 + 1;
            positions.retain(|_, hits| hits.len() <= limit);
        }
        Self { positions }
    }

    /// Longest common run of `a[ar]` and `b[br]`: earliest in `a`, then in `b`.
    fn longest_match(
        &self,
        a_keys: &[u64],
        b_keys: &[u64],
        ar: Range<usize>,
        br: Range<usize>,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_len) = (ar.start, br.start, 0usize);
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

        for i in ar.clone() {
            let mut next_runs = HashMap::new();
            if let Some(hits) = self.positions.get(&a_keys[i]) {
                for &j in hits {
                    if j < br.start {
                        continue;
                    }
                    if j >= br.end {
                        break;
                    }
                    let len = j
                        .checked_sub(1)
                        .and_then(|prev| run_ending_at.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_runs.insert(j, len);
                    if len > best_len {
                        best_i = i + 1 - len;
                        best_j = j + 1 - len;
                        best_len = len;
                    }
                }
            }
            run_ending_at = next_runs;
        }

        // Popular keys are not indexed; absorb them at both ends of the match.
        while best_i > ar.start && best_j > br.start && a_keys[best_i - 1] == b_keys[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ar.end
            && best_j + best_len < br.end
            && a_keys[best_i + best_len] == b_keys[best_j + best_len]
        {
            best_len += 1;
        }

        (best_i, best_j, best_len)
    }
}

/// Merge contiguous same-kind operations and order deletes before inserts
/// between two copies.
pub(crate) fn normalize_ops(ops: impl IntoIterator<Item = EditOp>) -> Vec<EditOp> {
    let mut out: Vec<EditOp> = Vec::new();
    let mut deletes: Vec<EditOp> = Vec::new();
    let mut inserts: Vec<EditOp> = Vec::new();

    for op in ops.into_iter().filter(|op| !op.is_empty()) {
        match op {
            EditOp::Copy { .. } => {
                for pending in deletes.drain(..).chain(inserts.drain(..)) {
                    push_merged(&mut out, pending);
                }
                push_merged(&mut out, op);
            }
            EditOp::Delete { .. } => deletes.push(op),
            EditOp::Insert { .. } => inserts.push(op),
        }
    }
    for pending in deletes.into_iter().chain(inserts) {
        push_merged(&mut out, pending);
    }

    out
}

fn push_merged(out: &mut Vec<EditOp>, op: EditOp) {
    if let Some(last) = out.last_mut()
        && let Some(merged) = last.merge(&op)
    {
        *last = merged;
        return;
    }
    out.push(op);
}

/// Myers edit script over segment keys in linear space: each step finds the
/// middle snake of the remaining range and recurses on both halves.
fn compute_ops(a: &[u64], b: &[u64]) -> Vec<Op> {
    let max_d = (a.len() + b.len() + 1) / 2 + 1;
    let mut vf = Diagonals::new(max_d);
    let mut vb = Diagonals::new(max_d);
    let mut ops = Vec::with_capacity(a.len() + b.len());
    conquer(a, 0..a.len(), b, 0..b.len(), &mut vf, &mut vb, &mut ops);
    ops
}

/// Furthest-reaching x per diagonal `k`, indexed by `k` in `-max_d..max_d`.
struct Diagonals {
    offset: isize,
    v: Vec<usize>,
}

impl Diagonals {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            v: vec![0; 2 * max_d],
        }
    }
}

impl std::ops::Index<isize> for Diagonals {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.v[(k + self.offset) as usize]
    }
}

impl std::ops::IndexMut<isize> for Diagonals {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.v[(k + self.offset) as usize]
    }
}

fn conquer(
    a: &[u64],
    mut a_range: Range<usize>,
    b: &[u64],
    mut b_range: Range<usize>,
    vf: &mut Diagonals,
    vb: &mut Diagonals,
    ops: &mut Vec<Op>,
) {
    let prefix = common_prefix_len(a, a_range.clone(), b, b_range.clone());
    ops.extend(std::iter::repeat_n(Op::Equal, prefix));
    a_range.start += prefix;
    b_range.start += prefix;

    let suffix = common_suffix_len(a, a_range.clone(), b, b_range.clone());
    a_range.end -= suffix;
    b_range.end -= suffix;

    if Range::is_empty(&b_range) {
        ops.extend(std::iter::repeat_n(Op::Delete, a_range.len()));
    } else if Range::is_empty(&a_range) {
        ops.extend(std::iter::repeat_n(Op::Insert, b_range.len()));
    } else if let Some((x, y)) = middle_snake(a, a_range.clone(), b, b_range.clone(), vf, vb) {
        conquer(a, a_range.start..x, b, b_range.start..y, vf, vb, ops);
        conquer(a, x..a_range.end, b, y..b_range.end, vf, vb, ops);
    } else {
        ops.extend(std::iter::repeat_n(Op::Delete, a_range.len()));
        ops.extend(std::iter::repeat_n(Op::Insert, b_range.len()));
    }

    ops.extend(std::iter::repeat_n(Op::Equal, suffix));
}

/// Start of a middle snake of an optimal path through `a_range` x `b_range`,
/// as absolute positions.
fn middle_snake(
    a: &[u64],
    a_range: Range<usize>,
    b: &[u64],
    b_range: Range<usize>,
    vf: &mut Diagonals,
    vb: &mut Diagonals,
) -> Option<(usize, usize)> {
    let n = a_range.len();
    let m = b_range.len();
    let delta = n as isize - m as isize;
    let odd = delta & 1 == 1;
    let d_max = (n + m + 1) / 2 + 1;

    vf[1] = 0;
    vb[1] = 0;

    for d in 0..d_max as isize {
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                vf[k + 1]
            } else {
                vf[k - 1] + 1
            };
            let y = (x as isize - k) as usize;
            let (x0, y0) = (x, y);
            if x < n && y < m {
                x += common_prefix_len(
                    a,
                    a_range.start + x..a_range.end,
                    b,
                    b_range.start + y..b_range.end,
                );
            }
            vf[k] = x;

            if odd && (k - delta).abs() <= d - 1 && vf[k] + vb[-(k - delta)] >= n {
                return Some((a_range.start + x0, b_range.start + y0));
            }
        }

        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                vb[k + 1]
            } else {
                vb[k - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            if x < n && y < m {
                let advance = common_suffix_len(
                    a,
                    a_range.start..a_range.start + n - x,
                    b,
                    b_range.start..b_range.start + m - y,
                );
                x += advance;
                y += advance;
            }
            vb[k] = x;

            if !odd && (k - delta).abs() <= d && vb[k] + vf[-(k - delta)] >= n {
                return Some((a_range.start + n - x, b_range.start + m - y));
            }
        }
    }

    None
}

fn common_prefix_len(a: &[u64], a_range: Range<usize>, b: &[u64], b_range: Range<usize>) -> usize {
    a[a_range]
        .iter()
        .zip(&b[b_range])
        .take_while(|(left, right)| left == right)
        .count()
}

fn common_suffix_len(a: &[u64], a_range: Range<usize>, b: &[u64], b_range: Range<usize>) -> usize {
    a[a_range]
        .iter()
        .rev()
        .zip(b[b_range].iter().rev())
        .take_while(|(left, right)| left == right)
        .count()
}
