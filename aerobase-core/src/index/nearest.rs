//! Best-first branch-and-bound nearest-neighbour search on the sphere.
//!
//! The R\*-tree's own nearest-neighbour iterator measures planar distance in
//! degrees, which disagrees with great-circle distance away from the equator
//! and across the antimeridian. Instead, nodes are visited in order of a
//! spherical lower bound derived from their envelope, and leaves are scored
//! with the exact haversine distance. A node is only expanded while its bound
//! does not exceed the current k-th best distance.

use std::{cmp::Ordering, collections::BinaryHeap};

use geo::{Coord, Rect};
use rstar::{ParentNode, RTree, RTreeNode};

use super::{IndexEntry, by_distance_then_slot};
use crate::{
    distance::{haversine_nm, min_distance_to_rect_nm},
    model::Coordinate,
};

/// Slack subtracted from node bounds so rounding never prunes a true answer.
const BOUND_SLACK_NM: f64 = 1e-6;

struct Pending<'a> {
    bound: f64,
    node: &'a ParentNode<IndexEntry>,
}

impl PartialEq for Pending<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending<'_> {}

impl PartialOrd for Pending<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending<'_> {
    // Reversed so the max-heap pops the smallest bound first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.bound.total_cmp(&self.bound)
    }
}

/// Running set of the `k` best `(distance, slot)` pairs, kept sorted.
struct Best {
    k: usize,
    hits: Vec<(f64, usize)>,
}

impl Best {
    fn offer(&mut self, hit: (f64, usize)) {
        if self.hits.len() == self.k {
            match self.hits.last() {
                Some(worst) if by_distance_then_slot(&hit, worst) == Ordering::Less => {
                    self.hits.pop();
                }
                _ => return,
            }
        }
        let at = self
            .hits
            .partition_point(|held| by_distance_then_slot(held, &hit) == Ordering::Less);
        self.hits.insert(at, hit);
    }

    /// Whether a node with this lower bound could still hold a better hit.
    fn admits(&self, bound: f64) -> bool {
        self.hits.len() < self.k || self.hits.last().is_some_and(|worst| bound <= worst.0)
    }
}

fn node_bound(center: Coordinate, node: &ParentNode<IndexEntry>) -> f64 {
    let envelope = node.envelope();
    let [min_x, min_y] = envelope.lower();
    let [max_x, max_y] = envelope.upper();
    let rect = Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y });
    (min_distance_to_rect_nm(center, &rect) - BOUND_SLACK_NM).max(0.0)
}

/// The `k` closest slots to `center`, sorted by distance then slot.
pub(super) fn k_nearest(
    tree: &RTree<IndexEntry>,
    center: Coordinate,
    k: usize,
    position_of: impl Fn(usize) -> Coordinate,
) -> Vec<(f64, usize)> {
    if k == 0 || tree.size() == 0 {
        return Vec::new();
    }

    let mut best = Best {
        k,
        hits: Vec::with_capacity(k.min(tree.size())),
    };
    let mut frontier = BinaryHeap::new();
    frontier.push(Pending {
        bound: 0.0,
        node: tree.root(),
    });

    while let Some(Pending { bound, node }) = frontier.pop() {
        if !best.admits(bound) {
            break;
        }
        for child in node.children() {
            match child {
                RTreeNode::Leaf(entry) => {
                    let distance = haversine_nm(center, position_of(entry.slot));
                    best.offer((distance, entry.slot));
                }
                RTreeNode::Parent(parent) => {
                    let bound = node_bound(center, parent);
                    if best.admits(bound) {
                        frontier.push(Pending {
                            bound,
                            node: parent,
                        });
                    }
                }
            }
        }
    }

    best.hits
}
