use bevy::prelude::*;
use std::collections::VecDeque;

use crate::area::config::PassabilityConfig;
use crate::area::grid::{PassabilitySource, CELL_HEIGHT, CELL_WIDTH};
use crate::area::profiling::profile;
use super::types::{Cell, Orientation, Route, Waypoint, BLOCKED, COST_CAP, UNVISITED};

/// Flood expansion order. Diagonals are charged the base step cost, orthogonals
/// the base plus the extra orthogonal cost.
const DIAGONAL_STEPS: [(isize, isize); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];
const ORTHOGONAL_STEPS: [(isize, isize); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Backtrace scan order: S, E, W, N, SW, SE, NE, NW. The first of several equal
/// descents wins.
const DESCENT_STEPS: [(isize, isize); 8] = [
    (0, 1),
    (1, 0),
    (-1, 0),
    (0, -1),
    (-1, 1),
    (1, 1),
    (1, -1),
    (-1, -1),
];

/// Per-area route finder.
///
/// Floods a cost field outward from the goal with a FIFO frontier until the
/// start cell is dequeued, then walks downhill from the start back to the goal.
/// The result is a good route, not a guaranteed shortest one.
///
/// # Example
///
/// ```rust
/// use bevy::math::IVec2;
/// use tilewalk::area::{PassabilityConfig, PassabilityGrid, PathFinder};
///
/// let grid = PassabilityGrid::filled(4, 4, 1);
/// let mut finder = PathFinder::new(PassabilityConfig::default());
/// finder.configure(4, 4);
///
/// let route = finder.find_path(&grid, IVec2::new(0, 0), IVec2::new(48, 36));
/// assert_eq!(route.len(), 4);
/// ```
#[derive(Resource, Clone, Debug)]
pub struct PathFinder {
    config: PassabilityConfig,
    width: usize,
    height: usize,
    costs: Vec<u16>,
    frontier: VecDeque<Cell>,
}

impl PathFinder {
    pub fn new(config: PassabilityConfig) -> Self {
        Self {
            config,
            width: 0,
            height: 0,
            costs: Vec::new(),
            frontier: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &PassabilityConfig {
        &self.config
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Size the cost buffer for a `width` x `height` grid, dropping the old one.
    pub fn configure(&mut self, width: usize, height: usize) {
        debug_assert!(width > 0 && height > 0, "search map must have cells");
        self.width = width;
        self.height = height;
        self.costs = vec![UNVISITED; width * height];
        self.frontier = VecDeque::with_capacity(width.max(height) * 4);
        debug!("PathFinder configured for {}x{} cells", width, height);
    }

    /// Cost assigned to a cell by the most recent flood.
    pub fn cost_at(&self, cell: Cell) -> u16 {
        self.costs[self.index(cell)]
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        cell.y * self.width + cell.x
    }

    /// Pixel position to cell, clamped onto the grid.
    pub fn pixel_to_cell(&self, pixel: IVec2) -> Cell {
        let x = (pixel.x.max(0) / CELL_WIDTH) as usize;
        let y = (pixel.y.max(0) / CELL_HEIGHT) as usize;
        Cell::new(
            x.min(self.width.saturating_sub(1)),
            y.min(self.height.saturating_sub(1)),
        )
    }

    fn is_passable<G: PassabilitySource>(&self, grid: &G, cell: Cell) -> bool {
        self.config.is_passable(grid.class_at(cell.x, cell.y))
    }

    /// Compute a route between two pixel positions.
    ///
    /// Never fails: when the goal is unreachable within the cost cap the route
    /// holds only the start cell, facing the goal.
    #[profile(2)]
    pub fn find_path<G: PassabilitySource>(&mut self, grid: &G, start: IVec2, goal: IVec2) -> Route {
        let start_cell = self.pixel_to_cell(start);
        let mut goal_cell = self.pixel_to_cell(goal);

        if self.costs.is_empty() {
            warn!("[PATHFINDING] find_path called before configure, returning start only");
            return Route::starting_at(Waypoint {
                cell: start_cell,
                orientation: Orientation::between(start_cell, goal_cell),
            });
        }
        if (grid.width(), grid.height()) != (self.width, self.height) {
            warn!(
                "[PATHFINDING] Grid is {}x{} but finder is configured for {}x{}, returning start only",
                grid.width(),
                grid.height(),
                self.width,
                self.height
            );
            return Route::starting_at(Waypoint {
                cell: start_cell,
                orientation: Orientation::between(start_cell, goal_cell),
            });
        }

        self.costs.fill(UNVISITED);
        self.frontier.clear();

        if !self.is_passable(grid, goal_cell) {
            if let Some(adjusted) = self.adjust_position(grid, goal_cell) {
                trace!("[PATHFINDING] Goal {:?} blocked, moved to {:?}", goal_cell, adjusted);
                goal_cell = adjusted;
            }
        }

        let reached = self.flood(grid, start_cell, goal_cell);
        // Leave the frontier empty whichever way the flood ended.
        self.frontier.clear();

        let mut route = Route::starting_at(Waypoint {
            cell: start_cell,
            orientation: Orientation::between(start_cell, goal_cell),
        });
        if !reached {
            debug!("[PATHFINDING] No route from {:?} to {:?}", start_cell, goal_cell);
            return route;
        }

        self.backtrace(&mut route, start_cell, goal_cell);
        route
    }

    /// Spread costs outward from `goal` until `start` is dequeued.
    ///
    /// Returns false when the frontier empties or the cost cap is hit first.
    fn flood<G: PassabilitySource>(&mut self, grid: &G, start: Cell, goal: Cell) -> bool {
        let goal_idx = self.index(goal);
        self.costs[goal_idx] = 1;
        self.frontier.push_back(goal);

        let base = self.config.base_step_cost;
        let extra = self.config.extra_orthogonal_cost;

        while let Some(current) = self.frontier.pop_front() {
            if current == start {
                return true;
            }

            let cost = (self.cost_at(current) as u32).saturating_add(base);
            if cost > COST_CAP {
                return false;
            }

            for (dx, dy) in DIAGONAL_STEPS {
                self.setup_node(grid, current, dx, dy, cost);
            }
            for (dx, dy) in ORTHOGONAL_STEPS {
                self.setup_node(grid, current, dx, dy, cost.saturating_add(extra));
            }
        }
        false
    }

    fn setup_node<G: PassabilitySource>(&mut self, grid: &G, from: Cell, dx: isize, dy: isize, cost: u32) {
        let Some(cell) = from.offset(dx, dy, self.width, self.height) else {
            return;
        };
        let idx = self.index(cell);
        if self.costs[idx] != UNVISITED {
            return;
        }
        if !self.is_passable(grid, cell) {
            self.costs[idx] = BLOCKED;
            return;
        }
        self.costs[idx] = cost.min(BLOCKED as u32 - 1) as u16;
        self.frontier.push_back(cell);
    }

    /// Walk downhill through the cost field from `start` to `goal`.
    ///
    /// Stops early, keeping the partial route, if no neighbor is cheaper.
    fn backtrace(&self, route: &mut Route, start: Cell, goal: Cell) {
        let mut current = start;
        while current != goal {
            let level = self.cost_at(current);
            let mut best: Option<(Cell, u16)> = None;

            for (dx, dy) in DESCENT_STEPS {
                let Some(cell) = current.offset(dx, dy, self.width, self.height) else {
                    continue;
                };
                let cost = self.cost_at(cell);
                if cost == UNVISITED || cost == BLOCKED || cost >= level {
                    continue;
                }
                let descent = level - cost;
                if best.map_or(true, |(_, best_descent)| descent > best_descent) {
                    best = Some((cell, descent));
                }
            }

            let Some((next, _)) = best else {
                debug!("[PATHFINDING] Backtrace stalled at {:?}, returning partial route", current);
                return;
            };
            route.push(Waypoint {
                cell: next,
                orientation: Orientation::between(current, next),
            });
            current = next;
        }
    }

    /// Nearest passable cell to a blocked goal.
    ///
    /// Scans square rings of growing radius: first the rows above and below the
    /// goal across the ring's width, then the columns left and right of it. The
    /// first passable cell in that order wins. `None` if the grid has no
    /// passable cell at all.
    pub fn adjust_position<G: PassabilitySource>(&self, grid: &G, goal: Cell) -> Option<Cell> {
        let width = grid.width();
        let height = grid.height();
        if width == 0 || height == 0 {
            return None;
        }
        let gx = goal.x.min(width - 1);
        let gy = goal.y.min(height - 1);
        let max_radius = width.max(height);

        for radius in 1..=max_radius {
            let min_x = gx.saturating_sub(radius);
            let max_x = (gx + radius + 1).min(width);
            for x in min_x..max_x {
                if gy >= radius && self.is_passable(grid, Cell::new(x, gy - radius)) {
                    return Some(Cell::new(x, gy - radius));
                }
                if gy + radius < height && self.is_passable(grid, Cell::new(x, gy + radius)) {
                    return Some(Cell::new(x, gy + radius));
                }
            }

            let min_y = gy.saturating_sub(radius);
            let max_y = (gy + radius + 1).min(height);
            for y in min_y..max_y {
                if gx >= radius && self.is_passable(grid, Cell::new(gx - radius, y)) {
                    return Some(Cell::new(gx - radius, y));
                }
                if gx + radius < width && self.is_passable(grid, Cell::new(gx + radius, y)) {
                    return Some(Cell::new(gx + radius, y));
                }
            }
        }

        warn!("[PATHFINDING] No passable cell anywhere near {:?}", goal);
        None
    }
}
