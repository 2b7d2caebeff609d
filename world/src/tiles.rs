//! Tile grid that validates tower placement.

use waypoint_defence_core::{
    distance_to_segment, PlacementError, Size, TileCoord, TileSnapshot, TileState, Vec2,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Base {
    Empty,
    Occupied,
    Blocked,
    Invalid,
}

#[derive(Clone, Copy, Debug)]
struct Cell {
    base: Base,
    highlighted: bool,
    preparation_blocked: bool,
}

/// Grid of square tiles centered inside the viewport.
///
/// The outermost ring of tiles is permanently invalid; tiles near the enemy
/// path are blocked. Highlights are purely presentational and never change
/// whether a tile accepts a tower.
#[derive(Clone, Debug)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    offset: Vec2,
    cells: Vec<Cell>,
}

impl TileGrid {
    /// Grid without any tiles, used before configuration.
    #[must_use]
    pub(crate) fn empty() -> Self {
        Self {
            columns: 0,
            rows: 0,
            tile_length: 0.0,
            offset: Vec2::ZERO,
            cells: Vec::new(),
        }
    }

    /// Lays out `columns` tiles per row and as many rows as fit the viewport.
    #[must_use]
    pub(crate) fn new(viewport: Size, columns: u32, tile_length: f32) -> Self {
        if !(tile_length > 0.0) || !(viewport.height() > 0.0) {
            return Self::empty();
        }
        let rows = (viewport.height() / tile_length).floor() as u32;
        let extent = Vec2::new(columns as f32 * tile_length, rows as f32 * tile_length);
        let offset = Vec2::new(
            (viewport.width() - extent.x()) / 2.0,
            (viewport.height() - extent.y()) / 2.0,
        );

        let mut cells = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows {
            for column in 0..columns {
                let border = column == 0 || row == 0 || column + 1 == columns || row + 1 == rows;
                cells.push(Cell {
                    base: if border { Base::Invalid } else { Base::Empty },
                    highlighted: false,
                    preparation_blocked: false,
                });
            }
        }

        Self {
            columns,
            rows,
            tile_length,
            offset,
            cells,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge length of a tile in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// World position of the grid's top-left corner.
    #[must_use]
    pub const fn offset(&self) -> Vec2 {
        self.offset
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column() >= self.columns || tile.row() >= self.rows {
            return None;
        }
        Some(tile.row() as usize * self.columns as usize + tile.column() as usize)
    }

    fn cell(&self, tile: TileCoord) -> Option<&Cell> {
        self.index(tile).and_then(|index| self.cells.get(index))
    }

    fn cell_mut(&mut self, tile: TileCoord) -> Option<&mut Cell> {
        self.index(tile).and_then(move |index| self.cells.get_mut(index))
    }

    fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.columns).map(move |column| TileCoord::new(column, row)))
    }

    /// World-space center of a tile.
    #[must_use]
    pub fn center(&self, tile: TileCoord) -> Option<Vec2> {
        let _ = self.index(tile)?;
        let half = self.tile_length / 2.0;
        Some(Vec2::new(
            self.offset.x() + tile.column() as f32 * self.tile_length + half,
            self.offset.y() + tile.row() as f32 * self.tile_length + half,
        ))
    }

    /// Maps a world position onto the nearest interior tile.
    ///
    /// Returns `None` when the point lies outside the grid or the grid has no
    /// interior tiles.
    #[must_use]
    pub fn world_to_tile(&self, point: Vec2) -> Option<TileCoord> {
        if self.columns < 3 || self.rows < 3 || !point.is_finite() {
            return None;
        }
        let local = point - self.offset;
        let width = self.columns as f32 * self.tile_length;
        let height = self.rows as f32 * self.tile_length;
        if local.x() < 0.0 || local.y() < 0.0 || local.x() > width || local.y() > height {
            return None;
        }

        let half = self.tile_length / 2.0;
        let snap = |value: f32, count: u32| -> u32 {
            let nearest = ((value - half) / self.tile_length).round().max(0.0) as u32;
            nearest.clamp(1, count - 2)
        };
        Some(TileCoord::new(
            snap(local.x(), self.columns),
            snap(local.y(), self.rows),
        ))
    }

    /// Presentation state of a tile.
    #[must_use]
    pub fn state(&self, tile: TileCoord) -> Option<TileState> {
        let cell = self.cell(tile)?;
        Some(match cell.base {
            Base::Invalid => TileState::Invalid,
            Base::Occupied => TileState::Occupied,
            Base::Blocked => TileState::Blocked,
            Base::Empty if cell.preparation_blocked => TileState::PreparationBlocked,
            Base::Empty if cell.highlighted => TileState::Highlighted,
            Base::Empty => TileState::Empty,
        })
    }

    /// Reports whether a tower may be built on the tile.
    #[must_use]
    pub fn can_place(&self, tile: TileCoord) -> bool {
        self.cell(tile)
            .is_some_and(|cell| cell.base == Base::Empty && !cell.preparation_blocked)
    }

    /// Marks an empty tile as occupied.
    pub(crate) fn place(&mut self, tile: TileCoord) -> Result<(), PlacementError> {
        if !self.can_place(tile) {
            return Err(match self.cell(tile) {
                Some(_) => PlacementError::TileUnavailable,
                None => PlacementError::NoTile,
            });
        }
        if let Some(cell) = self.cell_mut(tile) {
            cell.base = Base::Occupied;
            cell.highlighted = false;
        }
        Ok(())
    }

    /// Returns an occupied tile to the empty state.
    pub(crate) fn release(&mut self, tile: TileCoord) -> bool {
        match self.cell_mut(tile) {
            Some(cell) if cell.base == Base::Occupied => {
                cell.base = Base::Empty;
                true
            }
            _ => false,
        }
    }

    /// Blocks every empty tile whose center lies within `clearance` of the
    /// path. Tiles blocked by a previous path are freed first.
    pub(crate) fn mark_path(&mut self, waypoints: &[Vec2], clearance: f32) -> usize {
        for cell in &mut self.cells {
            if cell.base == Base::Blocked {
                cell.base = Base::Empty;
            }
        }

        let blocked: Vec<TileCoord> = self
            .coords()
            .filter(|tile| self.cell(*tile).is_some_and(|cell| cell.base == Base::Empty))
            .filter(|tile| {
                self.center(*tile).is_some_and(|center| {
                    near_path(center, waypoints, clearance)
                })
            })
            .collect();

        for tile in &blocked {
            if let Some(cell) = self.cell_mut(*tile) {
                cell.base = Base::Blocked;
            }
        }
        blocked.len()
    }

    /// Highlights a tile for the drag preview.
    pub(crate) fn highlight(&mut self, tile: TileCoord) -> bool {
        match self.cell_mut(tile) {
            Some(cell) => {
                cell.highlighted = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear_highlights(&mut self) {
        for cell in &mut self.cells {
            cell.highlighted = false;
        }
    }

    /// Blocks every tile whose center lies within `radius` of `around`.
    pub(crate) fn set_preparation_blocked(&mut self, around: Vec2, radius: f32) -> usize {
        let tiles: Vec<TileCoord> = self
            .coords()
            .filter(|tile| {
                self.center(*tile)
                    .is_some_and(|center| center.distance(around) <= radius)
            })
            .collect();
        for tile in &tiles {
            if let Some(cell) = self.cell_mut(*tile) {
                cell.preparation_blocked = true;
            }
        }
        tiles.len()
    }

    pub(crate) fn clear_preparation_blocks(&mut self) {
        for cell in &mut self.cells {
            cell.preparation_blocked = false;
        }
    }

    /// Captures every tile in row-major order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<TileSnapshot> {
        self.coords()
            .filter_map(|tile| {
                Some(TileSnapshot {
                    tile,
                    center: self.center(tile)?,
                    state: self.state(tile)?,
                })
            })
            .collect()
    }
}

fn near_path(point: Vec2, waypoints: &[Vec2], clearance: f32) -> bool {
    match waypoints {
        [] => false,
        [single] => single.distance(point) <= clearance,
        _ => waypoints
            .windows(2)
            .any(|segment| distance_to_segment(point, segment[0], segment[1]) <= clearance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        TileGrid::new(Size::new(800.0, 600.0), 20, 40.0)
    }

    #[test]
    fn rows_follow_viewport_height_and_grid_is_centered() {
        let grid = TileGrid::new(Size::new(820.0, 610.0), 20, 40.0);
        assert_eq!(grid.rows(), 15);
        assert_eq!(grid.offset(), Vec2::new(10.0, 5.0));
        assert_eq!(grid.center(TileCoord::new(0, 0)), Some(Vec2::new(30.0, 25.0)));
        assert_eq!(grid.center(TileCoord::new(20, 0)), None);
    }

    #[test]
    fn outer_ring_is_invalid() {
        let grid = grid();
        assert_eq!(grid.state(TileCoord::new(0, 5)), Some(TileState::Invalid));
        assert_eq!(grid.state(TileCoord::new(19, 5)), Some(TileState::Invalid));
        assert_eq!(grid.state(TileCoord::new(5, 14)), Some(TileState::Invalid));
        assert_eq!(grid.state(TileCoord::new(5, 5)), Some(TileState::Empty));
        assert!(!grid.can_place(TileCoord::new(0, 0)));
    }

    #[test]
    fn world_positions_snap_to_interior_tiles() {
        let grid = grid();
        assert_eq!(
            grid.world_to_tile(Vec2::new(215.0, 139.0)),
            Some(TileCoord::new(5, 3))
        );
        assert_eq!(grid.world_to_tile(Vec2::new(2.0, 2.0)), Some(TileCoord::new(1, 1)));
        assert_eq!(
            grid.world_to_tile(Vec2::new(799.0, 599.0)),
            Some(TileCoord::new(18, 13))
        );
        assert_eq!(grid.world_to_tile(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(grid.world_to_tile(Vec2::new(10.0, 601.0)), None);
    }

    #[test]
    fn tiny_grids_have_no_interior() {
        let grid = TileGrid::new(Size::new(80.0, 80.0), 2, 40.0);
        assert_eq!(grid.world_to_tile(Vec2::new(40.0, 40.0)), None);
        assert!(TileGrid::empty().snapshots().is_empty());
    }

    #[test]
    fn placement_requires_an_empty_tile() {
        let mut grid = grid();
        let tile = TileCoord::new(4, 4);

        assert_eq!(grid.place(tile), Ok(()));
        assert_eq!(grid.state(tile), Some(TileState::Occupied));
        assert_eq!(grid.place(tile), Err(PlacementError::TileUnavailable));
        assert_eq!(grid.place(TileCoord::new(40, 4)), Err(PlacementError::NoTile));

        assert!(grid.release(tile));
        assert!(!grid.release(tile));
        assert!(grid.can_place(tile));
    }

    #[test]
    fn path_blocks_nearby_tiles() {
        let mut grid = grid();
        let path = [Vec2::new(0.0, 280.0), Vec2::new(800.0, 280.0)];
        assert!(grid.mark_path(&path, 30.0) > 0);

        assert_eq!(grid.state(TileCoord::new(5, 7)), Some(TileState::Blocked));
        assert_eq!(grid.state(TileCoord::new(5, 6)), Some(TileState::Blocked));
        assert_eq!(grid.state(TileCoord::new(5, 5)), Some(TileState::Empty));
        assert_eq!(grid.state(TileCoord::new(5, 8)), Some(TileState::Empty));
        assert_eq!(grid.state(TileCoord::new(0, 7)), Some(TileState::Invalid));

        let moved = [Vec2::new(0.0, 100.0), Vec2::new(800.0, 100.0)];
        let _ = grid.mark_path(&moved, 30.0);
        assert_eq!(grid.state(TileCoord::new(5, 7)), Some(TileState::Empty));
    }

    #[test]
    fn highlights_never_change_legality() {
        let mut grid = grid();
        let tile = TileCoord::new(3, 3);

        assert!(grid.highlight(tile));
        assert_eq!(grid.state(tile), Some(TileState::Highlighted));
        assert!(grid.can_place(tile));

        grid.clear_highlights();
        assert_eq!(grid.state(tile), Some(TileState::Empty));
    }

    #[test]
    fn preparation_blocks_are_temporary() {
        let mut grid = grid();
        let entry = grid.center(TileCoord::new(2, 7)).expect("tile exists");
        let blocked = grid.set_preparation_blocked(entry, 80.0);
        assert!(blocked >= 5);

        assert_eq!(grid.state(TileCoord::new(4, 7)), Some(TileState::PreparationBlocked));
        assert!(!grid.can_place(TileCoord::new(4, 7)));
        assert!(grid.can_place(TileCoord::new(5, 7)));

        grid.clear_preparation_blocks();
        assert!(grid.can_place(TileCoord::new(4, 7)));
    }
}
