//! Picking a turn out of scored candidates.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::Rng;

use crate::search::Candidate;
use crate::Coord;

/// Heap entry. Higher progress first; equal progress pops in insertion order.
struct Ranked {
    progress: f64,
    seq: usize,
    path: Vec<Coord>,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.progress
            .total_cmp(&other.progress)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Progress in hundredths, the resolution at which two scores tie.
#[inline]
fn rounded(progress: f64) -> i64 {
    (progress * 100.0).round() as i64
}

/// Take the best-scoring path, breaking ties uniformly at random.
///
/// Scores are compared after rounding to two decimals, so 3.0 and 3.004 tie
/// while 3.0 and 3.02 do not.
pub fn choose_best<R: Rng + ?Sized>(candidates: Vec<Candidate>, rng: &mut R) -> Option<Vec<Coord>> {
    let mut heap: BinaryHeap<Ranked> = candidates
        .into_iter()
        .enumerate()
        .map(|(seq, c)| Ranked {
            progress: c.progress,
            seq,
            path: c.path,
        })
        .collect();

    let best = heap.pop()?;
    let top = rounded(best.progress);
    let mut pool = vec![best.path];
    while let Some(next) = heap.pop() {
        if rounded(next.progress) != top {
            break;
        }
        pool.push(next.path);
    }
    let pick = rng.random_range(0..pool.len());
    Some(pool.swap_remove(pick))
}

/// The `k` highest-scoring candidates, best first. Equal scores keep their
/// input order.
pub fn top_k(mut candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.progress.total_cmp(&a.progress));
    candidates.truncate(k);
    candidates
}
