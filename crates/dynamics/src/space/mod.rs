//! # Broad-Phase Spaces
//!
//! A space groups geoms (and other spaces) and reports the pairs of members
//! whose bounding boxes overlap. The indexing strategy is pluggable through
//! [`BroadPhase`]; every strategy must report each overlapping pair exactly
//! once, so the flat list can serve as an oracle for the others.

mod flat;
mod hash;
mod quadtree;

pub use flat::FlatList;
pub use hash::HashGrid;
pub use quadtree::QuadTree;

use glam::Vec3;

use crate::arena::{GeomHandle, SpaceHandle};
use crate::geometry::Aabb;

/// Strategy interface for candidate pair discovery.
pub trait BroadPhase: Send + Sync {
    fn name(&self) -> &'static str;

    /// Appends every index pair `(i, j)`, `i < j`, whose boxes overlap.
    /// No pair may be reported twice. Extra non-overlapping pairs are
    /// allowed but every overlapping pair must be present.
    fn find_pairs(&mut self, boxes: &[Aabb], pairs: &mut Vec<(usize, usize)>);
}

/// Strategy selection when creating a space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpaceKind {
    Flat,
    /// Cells of size `2^level` for `level` in `min_level..=max_level`.
    HashGrid { min_level: i32, max_level: i32 },
    /// Quadtree over the box `center +- extents`, ignoring `up_axis`.
    QuadTree {
        center: Vec3,
        extents: Vec3,
        depth: u32,
        up_axis: usize,
    },
}

impl SpaceKind {
    /// Hash grid with the default level range.
    #[must_use]
    pub fn hash_grid() -> Self {
        Self::HashGrid {
            min_level: -3,
            max_level: 10,
        }
    }

    pub(crate) fn strategy(self) -> Box<dyn BroadPhase> {
        match self {
            Self::Flat => Box::new(FlatList),
            Self::HashGrid {
                min_level,
                max_level,
            } => Box::new(HashGrid::new(min_level, max_level)),
            Self::QuadTree {
                center,
                extents,
                depth,
                up_axis,
            } => Box::new(QuadTree::new(center, extents, depth, up_axis)),
        }
    }
}

/// Something a space can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Geom(GeomHandle),
    Space(SpaceHandle),
}

pub struct Space {
    pub(crate) kind: SpaceKind,
    pub(crate) strategy: Box<dyn BroadPhase>,
    pub(crate) members: Vec<Member>,
    pub(crate) parent: Option<SpaceHandle>,
}

impl std::fmt::Debug for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Space")
            .field("kind", &self.kind)
            .field("strategy", &self.strategy.name())
            .field("members", &self.members.len())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Space {
    pub(crate) fn new(kind: SpaceKind) -> Self {
        Self {
            kind,
            strategy: kind.strategy(),
            members: Vec::new(),
            parent: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SpaceKind {
        self.kind
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[must_use]
    pub fn parent(&self) -> Option<SpaceHandle> {
        self.parent
    }

    pub(crate) fn remove_member(&mut self, member: Member) {
        self.members.retain(|m| *m != member);
    }
}

/// Pairs `(i, j)` with `left[i]` overlapping `right[j]`, found by sweeping
/// both lists along x. Used between the leaves of two overlapping members
/// of a space.
pub(crate) fn cross_pairs(left: &[Aabb], right: &[Aabb], pairs: &mut Vec<(usize, usize)>) {
    // (min x, side, index); side 0 is `left`
    let mut starts: Vec<(f32, usize, usize)> = left
        .iter()
        .enumerate()
        .map(|(i, b)| (b.min.x, 0, i))
        .chain(right.iter().enumerate().map(|(j, b)| (b.min.x, 1, j)))
        .collect();
    starts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let lists = [left, right];
    let mut active: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (x, side, index) in starts {
        let other = 1 - side;
        active[other].retain(|&k| lists[other][k].max.x >= x);
        let current = &lists[side][index];
        for &k in &active[other] {
            if current.overlaps(&lists[other][k]) {
                pairs.push(if side == 0 { (index, k) } else { (k, index) });
            }
        }
        active[side].push(index);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Random boxes of mixed sizes, including some far larger than the rest.
    pub(crate) fn random_boxes(seed: u64, count: usize) -> Vec<Aabb> {
        let rng = fastrand::Rng::with_seed(seed);
        (0..count)
            .map(|i| {
                let center = Vec3::new(
                    rng.f32() * 20.0 - 10.0,
                    rng.f32() * 4.0,
                    rng.f32() * 20.0 - 10.0,
                );
                let scale = if i % 17 == 0 { 6.0 } else { 0.9 };
                let half = Vec3::new(rng.f32(), rng.f32(), rng.f32()) * scale + Vec3::splat(0.05);
                Aabb::from_center(center, half)
            })
            .collect()
    }

    pub(crate) fn oracle(boxes: &[Aabb]) -> HashSet<(usize, usize)> {
        let mut set = HashSet::new();
        for i in 0..boxes.len() {
            for j in i + 1..boxes.len() {
                if boxes[i].overlaps(&boxes[j]) {
                    set.insert((i, j));
                }
            }
        }
        set
    }

    /// Runs a strategy and checks soundness and uniqueness against the oracle.
    pub(crate) fn check_against_oracle(strategy: &mut dyn BroadPhase, boxes: &[Aabb]) {
        let mut pairs = Vec::new();
        strategy.find_pairs(boxes, &mut pairs);
        let mut seen = HashSet::new();
        for &(i, j) in &pairs {
            assert!(i < j, "{} reported unordered pair ({i}, {j})", strategy.name());
            assert!(seen.insert((i, j)), "{} reported ({i}, {j}) twice", strategy.name());
        }
        let expected = oracle(boxes);
        let missing: Vec<_> = expected.difference(&seen).collect();
        println!(
            "{}: {} boxes, {} oracle pairs, {} reported",
            strategy.name(),
            boxes.len(),
            expected.len(),
            pairs.len()
        );
        assert!(missing.is_empty(), "{} missed pairs {:?}", strategy.name(), missing);
    }

    #[test]
    fn cross_pairs_match_the_oracle_between_two_lists() {
        for seed in 0..4 {
            let boxes = random_boxes(seed, 120);
            let (left, right) = boxes.split_at(50);
            let mut pairs = Vec::new();
            cross_pairs(left, right, &mut pairs);

            let found: HashSet<_> = pairs.iter().copied().collect();
            assert_eq!(found.len(), pairs.len(), "duplicate cross pair");
            let expected: HashSet<_> = oracle(&boxes)
                .into_iter()
                .filter(|&(i, j)| i < 50 && j >= 50)
                .map(|(i, j)| (i, j - 50))
                .collect();
            assert_eq!(found, expected, "seed {seed}");
        }
    }
}
