//! Fixed lattice of placement cells and their occupancy.

use glam::Vec2;
use lane_defence_core::{ArenaConfig, CellCoord, PlacementError};

/// Single placement slot within the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCell {
    coord: CellCoord,
    center: Vec2,
    occupied: bool,
}

impl GridCell {
    /// Grid coordinates of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// World-space center of the cell.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Reports whether a placed defender holds the cell.
    #[must_use]
    pub const fn occupied(&self) -> bool {
        self.occupied
    }
}

/// Registry owning every placement cell for the lifetime of a session.
///
/// The lattice is built once from the arena configuration and never resized.
/// Occupancy only changes through [`GridRegistry::occupy`] and
/// [`GridRegistry::free`], which the world calls while applying placement,
/// removal and collision commands.
#[derive(Clone, Debug)]
pub struct GridRegistry {
    columns: u32,
    rows: u32,
    side: f32,
    cells: Vec<GridCell>,
}

impl GridRegistry {
    /// Builds the lattice described by the arena configuration.
    #[must_use]
    pub fn new(arena: &ArenaConfig) -> Self {
        let capacity = (arena.rows as usize).saturating_mul(arena.columns as usize);
        let mut cells = Vec::with_capacity(capacity);
        for row in 0..arena.rows {
            for column in 0..arena.columns {
                let coord = CellCoord::new(column, row);
                cells.push(GridCell {
                    coord,
                    center: arena.cell_center(coord),
                    occupied: false,
                });
            }
        }

        Self {
            columns: arena.columns,
            rows: arena.rows,
            side: arena.cell_side,
            cells,
        }
    }

    /// Number of columns in the lattice.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the lattice.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of every cell.
    #[must_use]
    pub const fn side(&self) -> f32 {
        self.side
    }

    /// Every cell in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Looks up a single cell.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&GridCell> {
        self.index(coord).map(|index| &self.cells[index])
    }

    /// Reports whether the cell exists and holds no defender.
    #[must_use]
    pub fn is_free(&self, coord: CellCoord) -> bool {
        self.cell(coord).is_some_and(|cell| !cell.occupied)
    }

    /// Marks a free cell as occupied.
    pub fn occupy(&mut self, coord: CellCoord) -> Result<(), PlacementError> {
        let index = self.index(coord).ok_or(PlacementError::OutOfBounds)?;
        let cell = &mut self.cells[index];
        if cell.occupied {
            return Err(PlacementError::Occupied);
        }
        cell.occupied = true;
        Ok(())
    }

    /// Clears the occupancy flag, reporting whether the cell was occupied.
    pub fn free(&mut self, coord: CellCoord) -> bool {
        match self.index(coord) {
            Some(index) => std::mem::replace(&mut self.cells[index].occupied, false),
            None => false,
        }
    }

    /// Cell whose square footprint contains `point`, if any.
    #[must_use]
    pub fn cell_containing_point(&self, point: Vec2) -> Option<CellCoord> {
        let half = self.side / 2.0;
        self.cells
            .iter()
            .find(|cell| {
                let delta = (point - cell.center).abs();
                delta.x <= half && delta.y <= half
            })
            .map(|cell| cell.coord)
    }

    /// Cell whose center lies closest to `point`, with that distance.
    #[must_use]
    pub fn cell_nearest_to(&self, point: Vec2) -> Option<(CellCoord, f32)> {
        nearest(self.cells.iter(), point)
    }

    /// Closest free cell whose center lies within `tolerance` of `point`.
    #[must_use]
    pub fn nearest_free_within(&self, point: Vec2, tolerance: f32) -> Option<CellCoord> {
        nearest(self.cells.iter().filter(|cell| !cell.occupied), point)
            .filter(|(_, distance)| *distance <= tolerance)
            .map(|(coord, _)| coord)
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        if coord.column() >= self.columns || coord.row() >= self.rows {
            return None;
        }
        Some((coord.row() * self.columns + coord.column()) as usize)
    }
}

fn nearest<'a>(
    cells: impl Iterator<Item = &'a GridCell>,
    point: Vec2,
) -> Option<(CellCoord, f32)> {
    cells
        .map(|cell| (cell.coord, cell.center.distance(point)))
        .min_by(|left, right| left.1.total_cmp(&right.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_matches_configured_dimensions() {
        let grid = GridRegistry::new(&ArenaConfig::default());

        assert_eq!(grid.cells().len(), 20);
        assert!(grid.cells().iter().all(|cell| !cell.occupied()));
        assert_eq!(
            grid.cell(CellCoord::new(3, 4)).map(GridCell::coord),
            Some(CellCoord::new(3, 4)),
        );
        assert!(grid.cell(CellCoord::new(4, 0)).is_none());
    }

    #[test]
    fn occupy_refuses_double_occupancy() {
        let mut grid = GridRegistry::new(&ArenaConfig::default());
        let cell = CellCoord::new(1, 2);

        assert_eq!(grid.occupy(cell), Ok(()));
        assert_eq!(grid.occupy(cell), Err(PlacementError::Occupied));
        assert!(!grid.is_free(cell));

        assert!(grid.free(cell));
        assert!(!grid.free(cell));
        assert!(grid.is_free(cell));
    }

    #[test]
    fn out_of_bounds_cells_are_never_free() {
        let mut grid = GridRegistry::new(&ArenaConfig::default());
        let outside = CellCoord::new(0, 9);

        assert!(!grid.is_free(outside));
        assert_eq!(grid.occupy(outside), Err(PlacementError::OutOfBounds));
    }

    #[test]
    fn containing_point_uses_square_footprint() {
        let arena = ArenaConfig::default();
        let grid = GridRegistry::new(&arena);
        let center = arena.cell_center(CellCoord::new(2, 1));

        assert_eq!(
            grid.cell_containing_point(center + Vec2::new(40.0, -40.0)),
            Some(CellCoord::new(2, 1)),
        );
        assert_eq!(grid.cell_containing_point(center + Vec2::new(50.0, 0.0)), None);
    }

    #[test]
    fn nearest_free_cell_honours_tolerance_and_occupancy() {
        let arena = ArenaConfig::default();
        let mut grid = GridRegistry::new(&arena);
        let target = CellCoord::new(0, 0);
        let center = arena.cell_center(target);

        assert_eq!(
            grid.nearest_free_within(center + Vec2::new(10.0, 0.0), 15.0),
            Some(target),
        );
        assert_eq!(grid.nearest_free_within(center + Vec2::new(20.0, 0.0), 15.0), None);

        grid.occupy(target).expect("cell starts free");
        assert_eq!(grid.nearest_free_within(center, 15.0), None);

        let (nearest, distance) = grid.cell_nearest_to(center).expect("grid is not empty");
        assert_eq!(nearest, target);
        assert_eq!(distance, 0.0);
    }
}
