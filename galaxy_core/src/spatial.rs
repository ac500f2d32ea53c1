//! Fixed-cell spatial grid for near-constant-time neighbor queries.
//!
//! Items are bucketed by `floor(coord / cell_size)`; a neighbor query only
//! scans the cells within `ceil(max_distance / cell_size)` of the query
//! cell instead of the whole item set. This is what keeps gate-network
//! construction tractable at thousands of stars.

use std::collections::HashMap;

/// An indexed item: opaque id plus its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridItem {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

/// A neighbor-query hit, carrying the true Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub distance: f64,
}

pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<GridItem>>,
    len: usize,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0);
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Build an index from items in one pass.
    pub fn build<I: IntoIterator<Item = GridItem>>(items: I, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for item in items {
            grid.insert(item);
        }
        grid
    }

    pub fn insert(&mut self, item: GridItem) {
        let key = self.cell_key(item.x, item.y);
        self.cells.entry(key).or_default().push(item);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All items within `max_distance` of `(x, y)`, sorted ascending by
    /// distance. `exclude` drops one item by id (typically the query item
    /// itself).
    pub fn neighbors(&self, x: f64, y: f64, max_distance: f64, exclude: Option<u64>) -> Vec<Neighbor> {
        let (cell_x, cell_y) = self.cell_key(x, y);
        let cell_radius = (max_distance / self.cell_size).ceil() as i64;

        let mut found = Vec::new();
        for dx in -cell_radius..=cell_radius {
            for dy in -cell_radius..=cell_radius {
                let Some(bucket) = self.cells.get(&(cell_x + dx, cell_y + dy)) else {
                    continue;
                };
                for item in bucket {
                    if exclude == Some(item.id) {
                        continue;
                    }
                    let ox = item.x - x;
                    let oy = item.y - y;
                    let distance = (ox * ox + oy * oy).sqrt();
                    if distance <= max_distance {
                        found.push(Neighbor {
                            id: item.id,
                            x: item.x,
                            y: item.y,
                            distance,
                        });
                    }
                }
            }
        }

        found.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        found
    }

    /// Whether any item lies strictly closer than `min_distance`.
    /// Used by point generators to enforce spacing during placement.
    pub fn has_item_within(&self, x: f64, y: f64, min_distance: f64) -> bool {
        let (cell_x, cell_y) = self.cell_key(x, y);
        let cell_radius = (min_distance / self.cell_size).ceil() as i64;
        let limit_sq = min_distance * min_distance;

        for dx in -cell_radius..=cell_radius {
            for dy in -cell_radius..=cell_radius {
                let Some(bucket) = self.cells.get(&(cell_x + dx, cell_y + dy)) else {
                    continue;
                };
                for item in bucket {
                    let ox = item.x - x;
                    let oy = item.y - y;
                    if ox * ox + oy * oy < limit_sq {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn cell_key(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_of(points: &[(u64, f64, f64)], cell_size: f64) -> SpatialGrid {
        SpatialGrid::build(
            points.iter().map(|&(id, x, y)| GridItem { id, x, y }),
            cell_size,
        )
    }

    #[test]
    fn neighbors_sorted_by_distance() {
        let grid = grid_of(&[(1, 0.0, 3.0), (2, 0.0, 1.0), (3, 0.0, 2.0)], 4.0);
        let hits = grid.neighbors(0.0, 0.0, 10.0, None);
        let ids: Vec<u64> = hits.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!((hits[0].distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn neighbors_respect_max_distance() {
        let grid = grid_of(&[(1, 5.0, 0.0), (2, 11.0, 0.0)], 4.0);
        let hits = grid.neighbors(0.0, 0.0, 10.0, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn exclude_drops_query_item() {
        let grid = grid_of(&[(1, 2.0, 2.0), (2, 3.0, 3.0)], 4.0);
        let hits = grid.neighbors(2.0, 2.0, 10.0, Some(1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn finds_items_across_cell_boundaries() {
        // Two items in adjacent cells, closer to each other than to their
        // own cell centers.
        let grid = grid_of(&[(1, 3.9, 0.0), (2, 4.1, 0.0)], 4.0);
        let hits = grid.neighbors(3.9, 0.0, 1.0, Some(1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn has_item_within_is_strict() {
        let grid = grid_of(&[(1, 0.0, 5.0)], 4.0);
        assert!(grid.has_item_within(0.0, 0.0, 5.1));
        assert!(!grid.has_item_within(0.0, 0.0, 5.0));
    }

    #[test]
    fn empty_grid_has_no_neighbors() {
        let grid = SpatialGrid::new(8.0);
        assert!(grid.is_empty());
        assert!(grid.neighbors(10.0, 10.0, 100.0, None).is_empty());
    }
}
