use std::collections::{HashMap, HashSet};

use super::BroadPhase;
use crate::geometry::Aabb;

type CellKey = (i32, i64, i64, i64);

/// Multi-resolution uniform grid.
///
/// Each box lives at the smallest level whose cell size `2^level` is at least
/// its largest extent, so it touches at most two cells per axis there. A box
/// then probes its own level and every coarser level, which catches every
/// overlap with boxes of equal or larger size. Boxes too large for the
/// coarsest level (or unbounded ones) are tested against everything.
#[derive(Debug, Clone)]
pub struct HashGrid {
    min_level: i32,
    max_level: i32,
    cells: HashMap<CellKey, Vec<usize>>,
    big: Vec<usize>,
}

impl HashGrid {
    #[must_use]
    pub fn new(min_level: i32, max_level: i32) -> Self {
        let (min_level, max_level) = if min_level <= max_level {
            (min_level, max_level)
        } else {
            (max_level, min_level)
        };
        Self {
            min_level,
            max_level,
            cells: HashMap::new(),
            big: Vec::new(),
        }
    }

    #[must_use]
    pub fn levels(&self) -> (i32, i32) {
        (self.min_level, self.max_level)
    }

    fn cell_size(level: i32) -> f32 {
        2.0_f32.powi(level)
    }

    /// Level a box is stored at, or `None` when it goes to the big list.
    fn level_for(&self, aabb: &Aabb) -> Option<i32> {
        if !aabb.is_finite() {
            return None;
        }
        let size = aabb.extent().max_element();
        let mut level = self.min_level;
        while level < self.max_level && Self::cell_size(level) < size {
            level += 1;
        }
        (Self::cell_size(level) >= size).then_some(level)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_range(aabb: &Aabb, level: i32) -> ([i64; 3], [i64; 3]) {
        let size = Self::cell_size(level);
        let lo = (aabb.min / size).floor();
        let hi = (aabb.max / size).floor();
        (
            [lo.x as i64, lo.y as i64, lo.z as i64],
            [hi.x as i64, hi.y as i64, hi.z as i64],
        )
    }

    fn visit_cells(aabb: &Aabb, level: i32, mut visit: impl FnMut(CellKey)) {
        let (lo, hi) = Self::cell_range(aabb, level);
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    visit((level, x, y, z));
                }
            }
        }
    }
}

impl BroadPhase for HashGrid {
    fn name(&self) -> &'static str {
        "hash grid"
    }

    fn find_pairs(&mut self, boxes: &[Aabb], pairs: &mut Vec<(usize, usize)>) {
        self.cells.clear();
        self.big.clear();

        let levels: Vec<Option<i32>> = boxes.iter().map(|b| self.level_for(b)).collect();
        for (index, (aabb, level)) in boxes.iter().zip(&levels).enumerate() {
            match level {
                Some(level) => {
                    let cells = &mut self.cells;
                    Self::visit_cells(aabb, *level, |key| cells.entry(key).or_default().push(index));
                }
                None => self.big.push(index),
            }
        }

        let mut checked = HashSet::new();
        let mut report = |i: usize, j: usize, pairs: &mut Vec<(usize, usize)>| {
            let pair = (i.min(j), i.max(j));
            if i != j && boxes[i].overlaps(&boxes[j]) && checked.insert(pair) {
                pairs.push(pair);
            }
        };

        for (i, level) in levels.iter().enumerate() {
            let Some(level) = *level else {
                continue;
            };
            for probe in level..=self.max_level {
                Self::visit_cells(&boxes[i], probe, |key| {
                    if let Some(list) = self.cells.get(&key) {
                        for &j in list {
                            report(i, j, pairs);
                        }
                    }
                });
            }
        }

        for &i in &self.big {
            for j in 0..boxes.len() {
                report(i, j, pairs);
            }
        }
    }
}
