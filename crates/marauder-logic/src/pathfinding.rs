//! A* pathfinding over the walkability grid.
//!
//! Eight-connected search: cardinal steps cost 1, diagonal steps 1.4 (scaled
//! to integers 10 and 14). A diagonal step is only taken when both cells it
//! squeezes between are walkable, so paths never clip a wall corner. The
//! heuristic is Manhattan distance; it is not admissible once diagonals are
//! involved, so returned paths are good but not guaranteed optimal.
//!
//! Tie-breaking: the open set is a binary heap ordered by `(f, h, y, x)`, so
//! among equal `f` the node closer to the goal wins, then the lowest row,
//! then the lowest column. Which of several equal-cost paths comes back is
//! an implementation detail, not part of the contract.
//!
//! `Navigator` wraps a grid with a bounded path cache keyed by
//! `(start cell, goal cell)`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use serde::Serialize;
use thiserror::Error;

use crate::constants::{CARDINAL_COST, DIAGONAL_COST, PATH_CACHE_CAPACITY};
use crate::geometry::WorldPos;
use crate::grid::{CellPos, Grid};

/// Why a path could not be produced. Callers hold position and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("start cell ({x}, {y}) is not walkable")]
    StartBlocked { x: i32, y: i32 },
    #[error("goal cell ({x}, {y}) is not walkable")]
    GoalBlocked { x: i32, y: i32 },
    #[error("goal unreachable after exploring {explored} cells")]
    Unreachable { explored: usize },
}

/// Flat success/path/message view of a search, for debug overlays and
/// other consumers that do not want a `Result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub success: bool,
    pub path: Vec<WorldPos>,
    pub message: Option<String>,
}

impl From<Result<Vec<WorldPos>, PathError>> for PathResult {
    fn from(result: Result<Vec<WorldPos>, PathError>) -> Self {
        match result {
            Ok(path) => Self {
                success: true,
                path,
                message: None,
            },
            Err(e) => Self {
                success: false,
                path: Vec::new(),
                message: Some(e.to_string()),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

/// (dx, dy, cost) for the eight neighbours, cardinals first.
const NEIGHBORS: [(i32, i32, u32); 8] = [
    (0, -1, CARDINAL_COST),
    (1, 0, CARDINAL_COST),
    (0, 1, CARDINAL_COST),
    (-1, 0, CARDINAL_COST),
    (1, -1, DIAGONAL_COST),
    (1, 1, DIAGONAL_COST),
    (-1, 1, DIAGONAL_COST),
    (-1, -1, DIAGONAL_COST),
];

fn heuristic(a: CellPos, b: CellPos) -> u32 {
    a.manhattan(&b) * CARDINAL_COST
}

/// Find a path between two world positions.
///
/// On success the path holds world-space cell centres from the start cell to
/// the goal cell, both included.
pub fn find_path(grid: &Grid, start: WorldPos, goal: WorldPos) -> Result<Vec<WorldPos>, PathError> {
    let cells = find_cell_path(grid, grid.cell_of(start), grid.cell_of(goal))?;
    Ok(cells.into_iter().map(|c| grid.cell_center(c)).collect())
}

/// Cell-space A*. Same contract as [`find_path`].
pub fn find_cell_path(grid: &Grid, start: CellPos, goal: CellPos) -> Result<Vec<CellPos>, PathError> {
    for cell in [start, goal] {
        if !grid.in_bounds(cell) {
            return Err(PathError::OutOfBounds { x: cell.x, y: cell.y });
        }
    }
    if !grid.is_walkable(start) {
        return Err(PathError::StartBlocked { x: start.x, y: start.y });
    }
    if !grid.is_walkable(goal) {
        return Err(PathError::GoalBlocked { x: goal.x, y: goal.y });
    }
    if start == goal {
        return Ok(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut closed: HashSet<CellPos> = HashSet::new();
    let mut g_score: HashMap<CellPos, u32> = HashMap::new();
    let mut came_from: HashMap<CellPos, CellPos> = HashMap::new();

    let h = heuristic(start, goal);
    open_set.push(Reverse(OpenNode { f: h, h, y: start.y, x: start.x }));
    g_score.insert(start, 0);

    while let Some(Reverse(node)) = open_set.pop() {
        let current = CellPos::new(node.x, node.y);
        // Stale heap entries stand in for a decrease-key operation.
        if !closed.insert(current) {
            continue;
        }
        if current == goal {
            return Ok(reconstruct_path(&came_from, start, goal));
        }
        let Some(&cur_g) = g_score.get(&current) else {
            continue;
        };

        for (dx, dy, cost) in NEIGHBORS {
            let next = CellPos::new(current.x + dx, current.y + dy);
            if closed.contains(&next) || !grid.is_walkable(next) {
                continue;
            }
            if dx != 0
                && dy != 0
                && !(grid.is_walkable(CellPos::new(current.x + dx, current.y))
                    && grid.is_walkable(CellPos::new(current.x, current.y + dy)))
            {
                continue;
            }
            let tentative = cur_g + cost;
            if tentative < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                let h = heuristic(next, goal);
                open_set.push(Reverse(OpenNode {
                    f: tentative + h,
                    h,
                    y: next.y,
                    x: next.x,
                }));
            }
        }
    }

    Err(PathError::Unreachable {
        explored: closed.len(),
    })
}

fn reconstruct_path(came_from: &HashMap<CellPos, CellPos>, start: CellPos, goal: CellPos) -> Vec<CellPos> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Total step cost of a cell path in the same integer units the search uses.
pub fn path_cost(cells: &[CellPos]) -> u32 {
    cells
        .windows(2)
        .map(|w| {
            if w[0].x != w[1].x && w[0].y != w[1].y {
                DIAGONAL_COST
            } else {
                CARDINAL_COST
            }
        })
        .sum()
}

/// Grid plus a bounded path cache. Failed searches are not cached.
pub struct Navigator {
    grid: Grid,
    cache: HashMap<(CellPos, CellPos), Vec<WorldPos>>,
    /// Insertion order, oldest first, for eviction.
    order: VecDeque<(CellPos, CellPos)>,
    cache_capacity: usize,
    hits: u64,
    misses: u64,
}

impl Navigator {
    pub fn new(grid: Grid) -> Self {
        Self::with_cache(grid, PATH_CACHE_CAPACITY)
    }

    /// A capacity of zero disables caching.
    pub fn with_cache(grid: Grid, cache_capacity: usize) -> Self {
        Self {
            grid,
            cache: HashMap::new(),
            order: VecDeque::new(),
            cache_capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// [`find_path`] with caching.
    pub fn route(&mut self, start: WorldPos, goal: WorldPos) -> Result<Vec<WorldPos>, PathError> {
        let key = (self.grid.cell_of(start), self.grid.cell_of(goal));
        if let Some(cached) = self.cache.get(&key) {
            self.hits += 1;
            return Ok(cached.clone());
        }
        self.misses += 1;

        let path = find_path(&self.grid, start, goal)?;
        if self.cache_capacity > 0 {
            if self.cache.len() >= self.cache_capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.cache.remove(&oldest);
                }
            }
            self.cache.insert(key, path.clone());
            self.order.push_back(key);
        }
        Ok(path)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.order.clear();
    }

    /// (hits, misses) since construction.
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
