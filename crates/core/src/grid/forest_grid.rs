//! Flat, array-backed forest grid
//!
//! Trees are stored as `Vec<Option<Cell>>` indexed by `y * width + x`. Empty
//! positions hold `None` and never take part in traversal or neighbour
//! queries. The grid owns its cells outright; neighbour access is index
//! arithmetic.

use super::neighborhood::Neighborhood;
use crate::core_types::{Cell, Position, TransitionRules};
use rand::Rng;

/// Sparse `width × height` grid of trees.
#[derive(Debug, Clone)]
pub struct ForestGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<Cell>>,
    /// Flat indices of occupied positions, ascending
    occupied: Vec<usize>,
}

impl ForestGrid {
    /// Create an empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
            occupied: Vec::new(),
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of trees placed on the grid.
    pub fn tree_count(&self) -> usize {
        self.occupied.len()
    }

    /// Whether `position` lies within the grid bounds.
    pub fn in_bounds(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Flat index of an in-bounds position.
    #[inline]
    pub fn index_of(&self, position: Position) -> usize {
        position.y * self.width + position.x
    }

    /// Place a tree at its own position, replacing any tree already there.
    ///
    /// Returns `false` (and drops the tree) if the position is out of bounds.
    pub fn insert(&mut self, cell: Cell) -> bool {
        let position = cell.position();
        if !self.in_bounds(position) {
            return false;
        }
        let index = self.index_of(position);
        if self.cells[index].is_none() {
            let at = self.occupied.partition_point(|&i| i < index);
            self.occupied.insert(at, index);
        }
        self.cells[index] = Some(cell);
        true
    }

    /// Tree at `position`, if any.
    pub fn get(&self, position: Position) -> Option<&Cell> {
        if !self.in_bounds(position) {
            return None;
        }
        self.cells[self.index_of(position)].as_ref()
    }

    /// Mutable tree at `position`, if any.
    pub fn get_mut(&mut self, position: Position) -> Option<&mut Cell> {
        if !self.in_bounds(position) {
            return None;
        }
        let index = self.index_of(position);
        self.cells[index].as_mut()
    }

    /// Flat indices of all trees, ascending.
    pub fn occupied_indices(&self) -> &[usize] {
        &self.occupied
    }

    /// All trees in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.occupied
            .iter()
            .filter_map(move |&index| self.cells[index].as_ref())
    }

    /// Trees adjacent to `position`, in neighbourhood order.
    pub fn neighbors(&self, position: Position) -> impl Iterator<Item = &Cell> + '_ {
        Neighborhood::new(position, self.width, self.height)
            .filter_map(move |p| self.cells[self.index_of(p)].as_ref())
    }

    /// Run one tree's transition against its neighbours.
    ///
    /// The tree is lifted out of its slot for the duration of the step so its
    /// neighbours can be borrowed mutably alongside it. Empty slots are a no-op.
    pub fn step_cell<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rules: &TransitionRules,
        rng: &mut R,
    ) {
        let Some(mut cell) = self.cells[index].take() else {
            return;
        };
        let neighborhood = Neighborhood::new(cell.position(), self.width, self.height);
        let neighbors = NeighborsMut::new(&mut self.cells, neighborhood, self.width);
        cell.step(neighbors, rules, rng);
        self.cells[index] = Some(cell);
    }
}

/// Mutable iterator over the trees of a neighbourhood.
///
/// Relies on neighbourhood indices being strictly increasing: each yielded
/// tree is split off the front of the remaining slice, so borrows never
/// overlap.
struct NeighborsMut<'a> {
    rest: &'a mut [Option<Cell>],
    consumed: usize,
    neighborhood: Neighborhood,
    width: usize,
}

impl<'a> NeighborsMut<'a> {
    fn new(cells: &'a mut [Option<Cell>], neighborhood: Neighborhood, width: usize) -> Self {
        Self {
            rest: cells,
            consumed: 0,
            neighborhood,
            width,
        }
    }
}

impl<'a> Iterator for NeighborsMut<'a> {
    type Item = &'a mut Cell;

    fn next(&mut self) -> Option<&'a mut Cell> {
        loop {
            let position = self.neighborhood.next()?;
            let index = position.y * self.width + position.x;

            let rest = std::mem::take(&mut self.rest);
            let (_, tail) = rest.split_at_mut(index - self.consumed);
            let (slot, tail) = tail.split_first_mut()?;
            self.rest = tail;
            self.consumed = index + 1;

            if let Some(cell) = slot.as_mut() {
                return Some(cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{FireState, SpreadModel};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn full_grid(width: usize, height: usize, flamability: f64) -> ForestGrid {
        let mut grid = ForestGrid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                grid.insert(Cell::new(Position::new(x, y), flamability, true));
            }
        }
        grid
    }

    #[test]
    fn test_index_is_row_major() {
        let grid = ForestGrid::new(4, 3);
        assert_eq!(grid.index_of(Position::new(3, 2)), 11);
        assert_eq!(grid.index_of(Position::new(0, 1)), 4);
    }

    #[test]
    fn test_insert_keeps_occupied_sorted() {
        let mut grid = ForestGrid::new(3, 3);
        assert!(grid.insert(Cell::new(Position::new(2, 2), 0.1, false)));
        assert!(grid.insert(Cell::new(Position::new(0, 0), 0.1, false)));
        assert!(grid.insert(Cell::new(Position::new(1, 1), 0.1, false)));
        // Replacing does not duplicate
        assert!(grid.insert(Cell::new(Position::new(1, 1), 0.2, false)));
        assert!(!grid.insert(Cell::new(Position::new(3, 0), 0.1, false)));

        assert_eq!(grid.occupied_indices(), &[0, 4, 8]);
        assert_eq!(grid.tree_count(), 3);
        assert_eq!(grid.get(Position::new(1, 1)).unwrap().flamability(), 0.2);
        assert!(grid.get(Position::new(1, 0)).is_none());
        assert!(grid.get(Position::new(9, 9)).is_none());
    }

    #[test]
    fn test_neighbors_skip_empty_positions() {
        let mut grid = ForestGrid::new(3, 3);
        grid.insert(Cell::new(Position::new(0, 0), 0.1, false));
        grid.insert(Cell::new(Position::new(2, 2), 0.1, false));

        let found: Vec<Position> = grid
            .neighbors(Position::new(1, 1))
            .map(Cell::position)
            .collect();
        assert_eq!(found, vec![Position::new(0, 0), Position::new(2, 2)]);
        assert_eq!(grid.neighbors(Position::new(0, 0)).count(), 0);
    }

    #[test]
    fn test_burning_center_reaches_all_neighbors() {
        let mut grid = full_grid(3, 3, 1.0);
        grid.get_mut(Position::new(1, 1)).unwrap().ignite();
        let rules = TransitionRules::new(SpreadModel::Compounding, 0.02, 90);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let center = grid.index_of(Position::new(1, 1));
        grid.step_cell(center, &rules, &mut rng);

        assert_eq!(
            grid.get(Position::new(1, 1)).unwrap().state(),
            FireState::BurnedOut
        );
        let lit = grid
            .cells()
            .filter(|c| c.state() == FireState::OnFire)
            .count();
        assert_eq!(lit, 8);
        assert!(grid
            .cells()
            .filter(|c| c.position() != Position::new(1, 1))
            .all(|c| c.neighbor_fire_pressure() == 1));
    }

    #[test]
    fn test_corner_fire_stays_local() {
        let mut grid = full_grid(4, 4, 1.0);
        grid.get_mut(Position::new(0, 0)).unwrap().ignite();
        let rules = TransitionRules::new(SpreadModel::Compounding, 0.02, 90);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        grid.step_cell(0, &rules, &mut rng);

        let pressured: Vec<Position> = grid
            .cells()
            .filter(|c| c.neighbor_fire_pressure() > 0)
            .map(Cell::position)
            .collect();
        assert_eq!(
            pressured,
            vec![Position::new(1, 0), Position::new(0, 1), Position::new(1, 1)]
        );
    }

    #[test]
    fn test_step_empty_slot_is_noop() {
        let mut grid = ForestGrid::new(2, 2);
        let rules = TransitionRules::new(SpreadModel::Compounding, 0.02, 90);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        grid.step_cell(3, &rules, &mut rng);
        assert_eq!(grid.tree_count(), 0);
    }
}
