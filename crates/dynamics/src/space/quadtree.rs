use glam::{Vec2, Vec3};

use super::BroadPhase;
use crate::geometry::Aabb;

#[derive(Debug, Clone)]
struct Node {
    min: Vec2,
    max: Vec2,
    children: Option<[usize; 4]>,
    members: Vec<usize>,
}

impl Node {
    fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min,
            max,
            children: None,
            members: Vec::new(),
        }
    }

    /// Strict containment: a box touching a cell border stays in the parent,
    /// so boxes in sibling cells can never touch.
    fn strictly_contains(&self, min: Vec2, max: Vec2) -> bool {
        min.x > self.min.x && min.y > self.min.y && max.x < self.max.x && max.y < self.max.y
    }
}

/// Region quadtree over a fixed rectangle, ignoring one world axis.
///
/// Each box is stored at the deepest node whose cell strictly contains its
/// projection. Overlaps can then only occur between boxes in the same node
/// or between a node and its descendants.
#[derive(Debug, Clone)]
pub struct QuadTree {
    center: Vec3,
    extents: Vec3,
    depth: u32,
    axes: [usize; 2],
    nodes: Vec<Node>,
}

impl QuadTree {
    /// `up_axis` (0, 1 or 2) is the axis that is ignored; larger values are
    /// clamped to 2.
    #[must_use]
    pub fn new(center: Vec3, extents: Vec3, depth: u32, up_axis: usize) -> Self {
        let axes = match up_axis.min(2) {
            0 => [1, 2],
            1 => [0, 2],
            _ => [0, 1],
        };
        Self {
            center,
            extents,
            depth,
            axes,
            nodes: Vec::new(),
        }
    }

    fn project(&self, v: Vec3) -> Vec2 {
        Vec2::new(v[self.axes[0]], v[self.axes[1]])
    }

    fn reset(&mut self) {
        self.nodes.clear();
        let c = self.project(self.center);
        let e = self.project(self.extents);
        self.nodes.push(Node::new(c - e, c + e));
    }

    fn split(&mut self, node: usize) -> [usize; 4] {
        if let Some(children) = self.nodes[node].children {
            return children;
        }
        let Node { min, max, .. } = self.nodes[node];
        let mid = (min + max) * 0.5;
        let first = self.nodes.len();
        self.nodes.push(Node::new(min, mid));
        self.nodes.push(Node::new(Vec2::new(mid.x, min.y), Vec2::new(max.x, mid.y)));
        self.nodes.push(Node::new(Vec2::new(min.x, mid.y), Vec2::new(mid.x, max.y)));
        self.nodes.push(Node::new(mid, max));
        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[node].children = Some(children);
        children
    }

    fn insert(&mut self, index: usize, aabb: &Aabb) {
        let min = self.project(aabb.min);
        let max = self.project(aabb.max);
        let mut node = 0;
        for _ in 0..self.depth {
            if !self.nodes[node].strictly_contains(min, max) {
                break;
            }
            let children = self.split(node);
            match children.into_iter().find(|&c| self.nodes[c].strictly_contains(min, max)) {
                Some(child) => node = child,
                None => break,
            }
        }
        self.nodes[node].members.push(index);
    }

    /// Tests the members of `node` against each other and against everything
    /// below it, returning the members of the whole subtree.
    fn collect(&self, node: usize, boxes: &[Aabb], pairs: &mut Vec<(usize, usize)>) -> Vec<usize> {
        let mut below = Vec::new();
        if let Some(children) = self.nodes[node].children {
            for child in children {
                below.extend(self.collect(child, boxes, pairs));
            }
        }
        let own = &self.nodes[node].members;
        let mut push = |i: usize, j: usize| {
            if boxes[i].overlaps(&boxes[j]) {
                pairs.push((i.min(j), i.max(j)));
            }
        };
        for (k, &a) in own.iter().enumerate() {
            for &b in &own[k + 1..] {
                push(a, b);
            }
            for &b in &below {
                push(a, b);
            }
        }
        below.extend_from_slice(own);
        below
    }
}

impl BroadPhase for QuadTree {
    fn name(&self) -> &'static str {
        "quadtree"
    }

    fn find_pairs(&mut self, boxes: &[Aabb], pairs: &mut Vec<(usize, usize)>) {
        self.reset();
        for (index, aabb) in boxes.iter().enumerate() {
            self.insert(index, aabb);
        }
        self.collect(0, boxes, pairs);
    }
}
