//! Broadphase candidate gathering
//!
//! Both strategies return the same pairs: index pairs `(i, j)` with `i < j`
//! whose boxes overlap on closed intervals, sorted ascending.

use std::cmp::Ordering;

use fdl_math::Aabb;

use crate::config::BroadphaseStrategy;

/// Overlapping box pairs
pub fn candidate_pairs(boxes: &[Aabb], strategy: BroadphaseStrategy) -> Vec<(usize, usize)> {
    let mut pairs = match strategy {
        BroadphaseStrategy::BruteForce => brute_force(boxes),
        BroadphaseStrategy::SweepAndPrune => sweep_and_prune(boxes),
    };
    pairs.sort_unstable();
    log::trace!("broadphase ({strategy:?}): {} box(es), {} pair(s)", boxes.len(), pairs.len());
    pairs
}

fn brute_force(boxes: &[Aabb]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            if boxes[i].intersects(&boxes[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn sweep_and_prune(boxes: &[Aabb]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        boxes[a]
            .min
            .x
            .partial_cmp(&boxes[b].min.x)
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut pairs = Vec::new();
    for (n, &i) in order.iter().enumerate() {
        let max_x = boxes[i].max.x;
        for &j in &order[n + 1..] {
            // sorted by min.x: nothing further along can reach back
            if boxes[j].min.x > max_x {
                break;
            }
            if boxes[i].intersects(&boxes[j]) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs
}
