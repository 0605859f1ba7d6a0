//! Moore neighbourhood on a bounded, non-wrapping grid
//!
//! Interior positions have 8 neighbours, edge positions 5 and corners 3.
//! Iteration is row-major (`dy = -1, 0, 1`, each with `dx = -1, 0, 1`, centre
//! skipped), so neighbour flat indices come out strictly increasing. Random
//! draws made per neighbour follow this order.

use crate::core_types::Position;

/// `(dx, dy)` offsets in iteration order.
const OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterator over the in-bounds positions adjacent to a centre position.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    center: Position,
    width: usize,
    height: usize,
    next: usize,
}

impl Neighborhood {
    /// Neighbourhood of `center` on a `width × height` grid.
    pub fn new(center: Position, width: usize, height: usize) -> Self {
        Self {
            center,
            width,
            height,
            next: 0,
        }
    }
}

impl Iterator for Neighborhood {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        while self.next < OFFSETS.len() {
            let (dx, dy) = OFFSETS[self.next];
            self.next += 1;

            let x = self.center.x.checked_add_signed(dx);
            let y = self.center.y.checked_add_signed(dy);
            if let (Some(x), Some(y)) = (x, y) {
                if x < self.width && y < self.height {
                    return Some(Position::new(x, y));
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(OFFSETS.len() - self.next))
    }
}
