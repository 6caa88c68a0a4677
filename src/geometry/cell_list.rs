//! Cell list for O(N) neighbor search
//!
//! Atoms are hashed into cubic cells whose edge equals the query cutoff, so
//! every pair within the cutoff lies in the same cell or in adjacent cells.
//! Each unordered cell pair is visited once through the 13 "forward"
//! neighbor offsets.

use std::collections::HashMap;

type CellIndex = (i32, i32, i32);

/// Spatial hash of coordinates with a fixed cutoff
pub struct CellList {
    cutoff: f32,
    origin: [f32; 3],
    cells: HashMap<CellIndex, Vec<usize>>,
}

impl CellList {
    /// Hash `coords` into cells of edge `cutoff`
    pub fn new(coords: &[[f32; 3]], cutoff: f32) -> Self {
        let mut origin = [f32::MAX; 3];
        for c in coords {
            for k in 0..3 {
                origin[k] = origin[k].min(c[k]);
            }
        }
        if coords.is_empty() {
            origin = [0.0; 3];
        }

        let mut list = Self {
            cutoff,
            origin,
            cells: HashMap::new(),
        };
        for (idx, c) in coords.iter().enumerate() {
            let cell = list.cell_of(c);
            list.cells.entry(cell).or_default().push(idx);
        }
        list
    }

    /// Number of occupied cells
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, c: &[f32; 3]) -> CellIndex {
        let axis = |k: usize| ((c[k] - self.origin[k]) / self.cutoff).floor() as i32;
        (axis(0), axis(1), axis(2))
    }

    /// Call `visit(i, j, dist_sq)` for every pair with `i < j` and
    /// distance <= cutoff. `coords` must be the slice the list was built from.
    pub fn for_each_pair<F>(&self, coords: &[[f32; 3]], mut visit: F)
    where
        F: FnMut(usize, usize, f32),
    {
        let cutoff_sq = self.cutoff * self.cutoff;
        let mut check = |a: usize, b: usize| {
            let d2 = distance_squared(&coords[a], &coords[b]);
            if d2 <= cutoff_sq {
                visit(a.min(b), a.max(b), d2);
            }
        };

        for (&(x, y, z), members) in &self.cells {
            for (n, &a) in members.iter().enumerate() {
                for &b in &members[n + 1..] {
                    check(a, b);
                }
            }

            for (dx, dy, dz) in forward_offsets() {
                let Some(others) = self.cells.get(&(x + dx, y + dy, z + dz)) else {
                    continue;
                };
                for &a in members {
                    for &b in others {
                        check(a, b);
                    }
                }
            }
        }
    }
}

/// The 13 neighbor offsets lexicographically greater than (0, 0, 0)
fn forward_offsets() -> impl Iterator<Item = CellIndex> {
    (-1..=1)
        .flat_map(|dx| (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| (dx, dy, dz))))
        .filter(|&offset| offset > (0, 0, 0))
}

/// Squared distance between two 3D points
#[inline]
pub fn distance_squared(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// All `(i, j, dist_sq)` pairs with `i < j` within `cutoff` (inclusive)
pub fn pairs_within_cutoff(coords: &[[f32; 3]], cutoff: f32) -> Vec<(usize, usize, f32)> {
    let mut pairs = Vec::new();
    if coords.len() < 2 || cutoff.is_nan() || cutoff <= 0.0 {
        return pairs;
    }
    CellList::new(coords, cutoff).for_each_pair(coords, |i, j, d2| pairs.push((i, j, d2)));
    pairs
}
