use super::BroadPhase;
use crate::geometry::Aabb;

/// Brute force O(n^2) box tests. Used for small spaces and as the oracle.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatList;

impl BroadPhase for FlatList {
    fn name(&self) -> &'static str {
        "flat list"
    }

    fn find_pairs(&mut self, boxes: &[Aabb], pairs: &mut Vec<(usize, usize)>) {
        for (i, a) in boxes.iter().enumerate() {
            for (j, b) in boxes.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    pairs.push((i, j));
                }
            }
        }
    }
}
