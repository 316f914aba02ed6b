//! Walkability grid built from room rectangles.
//!
//! The world is cut into square cells. Every cell starts walkable; each room
//! then walls off its cell-aligned perimeter except for the door cells at the
//! midpoint of each wall. The grid never changes after construction.

use serde::{Deserialize, Serialize};

use crate::geometry::{Room, WorldPos};

/// Integer grid coordinate. May lie outside the grid; see [`Grid::in_bounds`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance: 1 for every one of the eight neighbours.
    pub fn chebyshev(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Inclusive cell-aligned bounding box of a room, already clamped to a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl CellBox {
    pub fn mid_x(&self) -> i32 {
        (self.x0 + self.x1) / 2
    }

    pub fn mid_y(&self) -> i32 {
        (self.y0 + self.y1) / 2
    }

    pub fn is_perimeter(&self, cell: CellPos) -> bool {
        cell.x == self.x0 || cell.x == self.x1 || cell.y == self.y0 || cell.y == self.y1
    }

    pub fn is_door(&self, cell: CellPos) -> bool {
        self.is_perimeter(cell) && (cell.x == self.mid_x() || cell.y == self.mid_y())
    }

    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        (self.y0..=self.y1).flat_map(move |y| (self.x0..=self.x1).map(move |x| CellPos::new(x, y)))
    }
}

/// Row-major walkability matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    cell_size: f32,
    walkable: Vec<bool>,
}

impl Grid {
    /// A fully walkable grid. Mostly useful for tests and hand-built fixtures.
    pub fn open(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            walkable: vec![true; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn in_bounds(&self, cell: CellPos) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Out-of-bounds cells are never walkable.
    pub fn is_walkable(&self, cell: CellPos) -> bool {
        self.in_bounds(cell) && self.walkable[self.index(cell)]
    }

    /// Ignored for out-of-bounds cells.
    pub fn set_walkable(&mut self, cell: CellPos, walkable: bool) {
        if self.in_bounds(cell) {
            let idx = self.index(cell);
            self.walkable[idx] = walkable;
        }
    }

    /// Cell containing a world position (floor division, may be out of bounds).
    /// Non-finite coordinates land on `i32::MIN`, which is never in bounds.
    pub fn cell_of(&self, pos: WorldPos) -> CellPos {
        let axis = |v: f32| {
            let c = (v / self.cell_size).floor();
            if c.is_finite() {
                c as i32
            } else {
                i32::MIN
            }
        };
        CellPos::new(axis(pos.x), axis(pos.y))
    }

    pub fn cell_center(&self, cell: CellPos) -> WorldPos {
        WorldPos::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|w| **w).count()
    }

    /// Cell-aligned box of a room clamped to the grid, or `None` when the
    /// room is degenerate or lies entirely outside the grid.
    pub fn room_box(&self, room: &Room) -> Option<CellBox> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let x0 = (room.x / self.cell_size).floor() as i64;
        let y0 = (room.y / self.cell_size).floor() as i64;
        let x1 = (room.max_x() / self.cell_size).ceil() as i64 - 1;
        let y1 = (room.max_y() / self.cell_size).ceil() as i64 - 1;
        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        if x1 < x0 || y1 < y0 || x1 < 0 || y1 < 0 || x0 > max_x || y0 > max_y {
            return None;
        }
        Some(CellBox {
            x0: x0.clamp(0, max_x) as i32,
            y0: y0.clamp(0, max_y) as i32,
            x1: x1.clamp(0, max_x) as i32,
            y1: y1.clamp(0, max_y) as i32,
        })
    }

    /// Door cells of a room (perimeter cells on a wall midpoint).
    pub fn door_cells(&self, room: &Room) -> Vec<CellPos> {
        match self.room_box(room) {
            Some(b) => b.cells().filter(|c| b.is_door(*c)).collect(),
            None => Vec::new(),
        }
    }

    /// Walkable cells on a room's perimeter. Non-empty for every room the
    /// builder has seen, because door cells are never walled.
    pub fn walkable_perimeter(&self, room: &Room) -> Vec<CellPos> {
        match self.room_box(room) {
            Some(b) => b
                .cells()
                .filter(|c| b.is_perimeter(*c) && self.is_walkable(*c))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Closest walkable cell by ring distance; ties go to the lowest `(y, x)`.
    pub fn nearest_walkable(&self, cell: CellPos) -> Option<CellPos> {
        if self.is_walkable(cell) {
            return Some(cell);
        }
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let max_radius = self.width.max(self.height) as i32;
        let clamped = CellPos::new(
            cell.x.clamp(0, self.width as i32 - 1),
            cell.y.clamp(0, self.height as i32 - 1),
        );
        if clamped.chebyshev(&cell) > max_radius as u32 {
            return None;
        }
        for r in 1..=max_radius {
            for y in (cell.y - r)..=(cell.y + r) {
                for x in (cell.x - r)..=(cell.x + r) {
                    let candidate = CellPos::new(x, y);
                    if candidate.chebyshev(&cell) == r as u32 && self.is_walkable(candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    /// One character per cell, `.` walkable and `#` blocked. Debug aid.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if self.walkable[y * self.width + x] { '.' } else { '#' });
            }
            out.push('\n');
        }
        out
    }

    fn index(&self, cell: CellPos) -> usize {
        cell.y as usize * self.width + cell.x as usize
    }
}

/// Build the walkability grid for a world of the given size.
///
/// Rooms partly outside the world are clamped; rooms entirely outside, or
/// with non-positive size, are skipped.
pub fn build_grid(world_width: f32, world_height: f32, cell_size: f32, rooms: &[Room]) -> Grid {
    let width = (world_width / cell_size).ceil().max(0.0) as usize;
    let height = (world_height / cell_size).ceil().max(0.0) as usize;
    let mut grid = Grid::open(width, height, cell_size);

    for room in rooms {
        let Some(cell_box) = grid.room_box(room) else {
            log::warn!("room '{}' does not cover any grid cell, skipped", room.id);
            continue;
        };
        for cell in cell_box.cells() {
            if cell_box.is_perimeter(cell) && !cell_box.is_door(cell) {
                grid.set_walkable(cell, false);
            }
        }
    }

    log::debug!(
        "built {}×{} grid, {} of {} cells walkable",
        width,
        height,
        grid.walkable_count(),
        width * height
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_room_grid() -> (Grid, Room) {
        // 10×10 cells of 10 units; room covers cells 2..=6 on both axes.
        let room = Room::new("r", "R", 20.0, 20.0, 50.0, 50.0);
        let grid = build_grid(100.0, 100.0, 10.0, std::slice::from_ref(&room));
        (grid, room)
    }

    #[test]
    fn dimensions_round_up() {
        let grid = build_grid(105.0, 95.0, 10.0, &[]);
        assert_eq!(grid.width(), 11);
        assert_eq!(grid.height(), 10);
        assert_eq!(grid.walkable_count(), 110);
    }

    #[test]
    fn walls_and_doors() {
        let (grid, room) = single_room_grid();
        let b = grid.room_box(&room).unwrap();
        assert_eq!(b, CellBox { x0: 2, y0: 2, x1: 6, y1: 6 });
        assert_eq!((b.mid_x(), b.mid_y()), (4, 4));

        // Corners and ordinary wall cells are blocked.
        assert!(!grid.is_walkable(CellPos::new(2, 2)));
        assert!(!grid.is_walkable(CellPos::new(3, 2)));
        assert!(!grid.is_walkable(CellPos::new(6, 5)));
        // Doors at each wall midpoint.
        for door in [(4, 2), (4, 6), (2, 4), (6, 4)] {
            assert!(grid.is_walkable(CellPos::new(door.0, door.1)), "door {door:?}");
        }
        // Interior and exterior are open.
        assert!(grid.is_walkable(CellPos::new(3, 3)));
        assert!(grid.is_walkable(CellPos::new(5, 5)));
        assert!(grid.is_walkable(CellPos::new(0, 0)));
        assert!(grid.is_walkable(CellPos::new(9, 9)));
        // 16 perimeter cells, 4 doors.
        assert_eq!(grid.walkable_count(), 100 - 12);
    }

    #[test]
    fn door_cells_listed() {
        let (grid, room) = single_room_grid();
        let mut doors = grid.door_cells(&room);
        doors.sort();
        assert_eq!(
            doors,
            vec![
                CellPos::new(2, 4),
                CellPos::new(4, 2),
                CellPos::new(4, 6),
                CellPos::new(6, 4)
            ]
        );
        assert_eq!(grid.walkable_perimeter(&room).len(), 4);
    }

    #[test]
    fn room_clamped_to_grid() {
        let room = Room::new("edge", "Edge", 70.0, -30.0, 100.0, 60.0);
        let grid = build_grid(100.0, 100.0, 10.0, std::slice::from_ref(&room));
        let b = grid.room_box(&room).unwrap();
        assert_eq!(b, CellBox { x0: 7, y0: 0, x1: 9, y1: 2 });
        assert!(!grid.walkable_perimeter(&room).is_empty());
    }

    #[test]
    fn room_outside_world_is_skipped() {
        let room = Room::new("far", "Far", 500.0, 500.0, 40.0, 40.0);
        let grid = build_grid(100.0, 100.0, 10.0, &[room]);
        assert_eq!(grid.walkable_count(), 100);
    }

    #[test]
    fn cell_conversions() {
        let grid = Grid::open(10, 10, 20.0);
        assert_eq!(grid.cell_of(WorldPos::new(45.0, 19.9)), CellPos::new(2, 0));
        assert_eq!(grid.cell_of(WorldPos::new(-1.0, 5.0)), CellPos::new(-1, 0));
        let nan = grid.cell_of(WorldPos::new(f32::NAN, 5.0));
        assert_eq!(nan, CellPos::new(i32::MIN, 0));
        assert!(!grid.in_bounds(nan));
        assert!(!grid.in_bounds(grid.cell_of(WorldPos::new(5.0, f32::INFINITY))));
        assert_eq!(grid.cell_center(CellPos::new(2, 0)), WorldPos::new(50.0, 10.0));
        assert!(!grid.in_bounds(CellPos::new(-1, 0)));
        assert!(!grid.in_bounds(CellPos::new(10, 0)));
        assert!(!grid.is_walkable(CellPos::new(0, 10)));
    }

    #[test]
    fn nearest_walkable_prefers_lowest_y_then_x() {
        let (grid, _) = single_room_grid();
        // Wall cell (3, 2): ring 1 holds (2,1),(3,1),(4,1) above; (2,1) wins.
        assert_eq!(
            grid.nearest_walkable(CellPos::new(3, 2)),
            Some(CellPos::new(2, 1))
        );
        assert_eq!(
            grid.nearest_walkable(CellPos::new(5, 5)),
            Some(CellPos::new(5, 5))
        );
    }

    #[test]
    fn nearest_walkable_on_blocked_grid() {
        let mut grid = Grid::open(3, 3, 1.0);
        for cell in (CellBox { x0: 0, y0: 0, x1: 2, y1: 2 }).cells() {
            grid.set_walkable(cell, false);
        }
        assert_eq!(grid.nearest_walkable(CellPos::new(1, 1)), None);
    }

    #[test]
    fn nearest_walkable_off_map() {
        let grid = Grid::open(4, 4, 10.0);
        assert_eq!(grid.nearest_walkable(CellPos::new(-1, 2)), Some(CellPos::new(0, 1)));
        assert_eq!(grid.nearest_walkable(CellPos::new(i32::MIN, 0)), None);
        assert_eq!(grid.nearest_walkable(CellPos::new(0, i32::MAX)), None);
    }

    #[test]
    fn ascii_render_marks_walls() {
        let (grid, _) = single_room_grid();
        let ascii = grid.render_ascii();
        let rows: Vec<&str> = ascii.lines().collect();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[2], "..##.##...");
        assert_eq!(rows[3], "..#...#...");
        assert_eq!(rows[4], "..........");
    }
}
