/// Tests for route computation
///
/// Cover the flood/backtrace behaviour, goal relocation around obstacles and the
/// orientation table that animation code depends on.

use super::*;
use crate::area::config::PassabilityConfig;
use crate::area::grid::{PassabilityGrid, PassabilitySource, CELL_HEIGHT, CELL_WIDTH};
use bevy::math::IVec2;

const WALKABLE: u8 = 1;
const WALL: u8 = 0;

fn open_grid(width: usize, height: usize) -> PassabilityGrid {
    PassabilityGrid::filled(width, height, WALKABLE)
}

fn finder_for(grid: &PassabilityGrid) -> PathFinder {
    finder_with(grid, PassabilityConfig::default())
}

fn finder_with(grid: &PassabilityGrid, config: PassabilityConfig) -> PathFinder {
    let mut finder = PathFinder::new(config);
    finder.configure(grid.width(), grid.height());
    finder
}

/// Top-left pixel of a cell.
fn px(x: usize, y: usize) -> IVec2 {
    IVec2::new(x as i32 * CELL_WIDTH, y as i32 * CELL_HEIGHT)
}

fn chebyshev(a: Cell, b: Cell) -> usize {
    a.x.abs_diff(b.x).max(a.y.abs_diff(b.y))
}

/// Every consecutive pair must be neighbors, descend the cost field and carry
/// the orientation of the step.
fn assert_route_well_formed(finder: &PathFinder, grid: &PassabilityGrid, route: &Route) {
    for pair in route.as_slice().windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        assert_eq!(chebyshev(prev.cell, next.cell), 1, "{:?} -> {:?} is not a single step", prev.cell, next.cell);
        assert!(
            finder.cost_at(next.cell) < finder.cost_at(prev.cell),
            "route climbs from {:?} to {:?}",
            prev.cell,
            next.cell
        );
        assert_eq!(next.orientation, Orientation::between(prev.cell, next.cell));
        assert!(
            finder.config().is_passable(grid.class_at(next.cell.x, next.cell.y)),
            "route enters blocked cell {:?}",
            next.cell
        );
    }
}

#[test]
fn test_orientation_sign_table() {
    let origin = Cell::new(5, 5);
    let cases = [
        ((6, 6), 6),
        ((6, 5), 4),
        ((6, 4), 2),
        ((5, 6), 8),
        ((5, 4), 0),
        ((4, 6), 10),
        ((4, 5), 12),
        ((4, 4), 14),
    ];
    for ((x, y), code) in cases {
        let orientation = Orientation::between(origin, Cell::new(x, y));
        assert_eq!(orientation.code(), code, "delta to ({}, {})", x, y);
    }

    // Only the sign matters, not the magnitude.
    assert_eq!(Orientation::between(origin, Cell::new(9, 0)), Orientation::NorthEast);
    // No movement reports code 0.
    assert_eq!(Orientation::between(origin, origin).code(), 0);
}

#[test]
fn test_orientation_codes_are_even_and_distinct() {
    let codes: Vec<u8> = Orientation::ALL.iter().map(|o| o.code()).collect();
    assert_eq!(codes, vec![0, 2, 4, 6, 8, 10, 12, 14]);
}

#[test]
fn test_diagonal_route_across_open_grid() {
    let grid = open_grid(4, 4);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, IVec2::new(0, 0), IVec2::new(48, 36));

    let cells: Vec<Cell> = route.cells().collect();
    assert_eq!(
        cells,
        vec![Cell::new(0, 0), Cell::new(1, 1), Cell::new(2, 2), Cell::new(3, 3)]
    );
    for waypoint in &route {
        assert_eq!(waypoint.orientation.code(), 6, "waypoint {:?}", waypoint.cell);
    }

    // Three diagonal steps at base cost 10 from the goal's seed cost of 1.
    assert_eq!(finder.cost_at(Cell::new(3, 3)), 1);
    assert_eq!(finder.cost_at(Cell::new(2, 2)), 11);
    assert_eq!(finder.cost_at(Cell::new(1, 1)), 21);
    assert_eq!(finder.cost_at(Cell::new(0, 0)), 31);
}

#[test]
fn test_diagonal_steps_are_cheaper_than_orthogonal_steps() {
    let grid = open_grid(5, 5);
    let mut finder = finder_for(&grid);

    finder.find_path(&grid, px(0, 0), px(2, 2));

    assert_eq!(finder.cost_at(Cell::new(1, 1)), 11, "diagonal neighbor pays the base cost");
    assert_eq!(finder.cost_at(Cell::new(2, 1)), 15, "orthogonal neighbor pays base + extra");
    assert_eq!(finder.cost_at(Cell::new(1, 2)), 15);
}

#[test]
fn test_straight_corridor_uses_orthogonal_steps() {
    let grid = open_grid(4, 1);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, px(0, 0), px(3, 0));

    let cells: Vec<Cell> = route.cells().collect();
    assert_eq!(cells, vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0), Cell::new(3, 0)]);
    assert!(route.iter().all(|w| w.orientation == Orientation::East));
    assert_eq!(finder.cost_at(Cell::new(0, 0)), 43);
}

#[test]
fn test_same_cell_yields_single_waypoint() {
    let grid = open_grid(4, 4);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, IVec2::new(3, 2), IVec2::new(12, 10));

    assert_eq!(route.len(), 1);
    assert_eq!(route.start().cell, Cell::new(0, 0));
    assert_eq!(route.start().orientation, Orientation::North);
}

#[test]
fn test_route_around_wall_reaches_goal() {
    let mut grid = open_grid(10, 10);
    // Wall at x = 5 from the top edge down to y = 7, open below.
    grid.fill_rect(5, 0, 1, 8, WALL);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, px(2, 2), px(8, 2));

    assert_eq!(route.start().cell, Cell::new(2, 2));
    assert_eq!(route.last().cell, Cell::new(8, 2), "route should arrive at the goal");
    assert!(route.cells().all(|c| !(c.x == 5 && c.y < 8)), "route must not cross the wall");
    assert!(route.cells().any(|c| c.x == 5 && c.y >= 8), "route must pass below the wall");
    assert_route_well_formed(&finder, &grid, &route);
}

#[test]
fn test_blocked_goal_relocates_to_first_ring_cell() {
    let mut grid = open_grid(5, 5);
    grid.set_class(2, 2, WALL);
    // Whole row above the goal and the bottom-left ring cell are walls.
    grid.fill_rect(1, 1, 3, 1, WALL);
    grid.set_class(1, 3, WALL);
    let mut finder = finder_for(&grid);

    // Scan order for radius 1: (1,1), (1,3), (2,1), (2,3), ...
    assert_eq!(finder.adjust_position(&grid, Cell::new(2, 2)), Some(Cell::new(2, 3)));

    let route = finder.find_path(&grid, px(2, 4), px(2, 2));
    let cells: Vec<Cell> = route.cells().collect();
    assert_eq!(cells, vec![Cell::new(2, 4), Cell::new(2, 3)]);
    assert_eq!(route.last().orientation, Orientation::North);
}

#[test]
fn test_blocked_goal_surrounded_except_right_column() {
    let mut grid = open_grid(5, 5);
    grid.fill_rect(1, 1, 3, 3, WALL);
    grid.set_class(3, 2, WALKABLE);
    let finder = finder_for(&grid);

    // Rows at y = 1 and y = 3 are all walls, so the column scan must find the
    // opening on the right-hand column.
    assert_eq!(finder.adjust_position(&grid, Cell::new(2, 2)), Some(Cell::new(3, 2)));
}

#[test]
fn test_adjust_position_reaches_far_corner() {
    let mut grid = PassabilityGrid::filled(6, 3, WALL);
    grid.set_class(5, 2, WALKABLE);
    let finder = finder_for(&grid);

    assert_eq!(finder.adjust_position(&grid, Cell::new(0, 0)), Some(Cell::new(5, 2)));
}

#[test]
fn test_adjust_position_on_solid_grid_gives_up() {
    let grid = PassabilityGrid::filled(4, 4, WALL);
    let finder = finder_for(&grid);

    assert_eq!(finder.adjust_position(&grid, Cell::new(1, 1)), None);
}

#[test]
fn test_adjust_position_always_finds_passable_cell() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..200 {
        let width = rng.usize(1..12);
        let height = rng.usize(2..12);
        let mut grid = PassabilityGrid::filled(width, height, WALL);
        for y in 0..height {
            for x in 0..width {
                if rng.u8(0..10) < 2 {
                    grid.set_class(x, y, WALKABLE);
                }
            }
        }
        let goal = Cell::new(rng.usize(0..width), rng.usize(0..height));
        grid.set_class(goal.x, goal.y, WALL);
        // Guarantee at least one passable cell other than the goal.
        let mut open = Cell::new(rng.usize(0..width), rng.usize(0..height));
        while open == goal {
            open = Cell::new(rng.usize(0..width), rng.usize(0..height));
        }
        grid.set_class(open.x, open.y, WALKABLE);
        let finder = finder_for(&grid);

        let found = finder
            .adjust_position(&grid, goal)
            .expect("a passable cell exists, so relocation must succeed");

        assert_eq!(grid.class_at(found.x, found.y), WALKABLE);
        assert!(chebyshev(goal, found) >= 1);
        assert!(chebyshev(goal, found) <= width.max(height));
    }
}

#[test]
fn test_enclosed_goal_returns_start_only() {
    let mut grid = open_grid(7, 7);
    // Ring of walls hugging the goal at (3, 3).
    grid.fill_rect(2, 2, 3, 3, WALL);
    grid.set_class(3, 3, WALKABLE);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, px(0, 0), px(3, 3));

    assert_eq!(route.len(), 1);
    assert_eq!(route.start().cell, Cell::new(0, 0));
    assert_eq!(route.start().orientation, Orientation::SouthEast, "start faces the goal");
}

#[test]
fn test_blocked_start_returns_start_only() {
    let mut grid = open_grid(5, 5);
    grid.set_class(0, 0, WALL);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, px(0, 0), px(4, 4));

    assert_eq!(route.len(), 1);
    assert_eq!(route.start().cell, Cell::new(0, 0));
    assert_eq!(finder.cost_at(Cell::new(0, 0)), BLOCKED);
}

#[test]
fn test_cost_cap_stops_flood() {
    let grid = open_grid(8, 1);
    let expensive = PassabilityConfig {
        base_step_cost: 30_000,
        ..PassabilityConfig::default()
    };
    let mut finder = finder_with(&grid, expensive);

    // Costs run 1 -> 30005 -> 60009, and the next expansion would pass the cap.
    let route = finder.find_path(&grid, px(0, 0), px(3, 0));

    assert_eq!(route.len(), 1, "start is three cells out, beyond the cost cap");
    assert_eq!(finder.cost_at(Cell::new(1, 0)), 60_009);
    assert_eq!(finder.cost_at(Cell::new(0, 0)), UNVISITED);

    // Same request with default costs is well inside the cap.
    let mut cheap = finder_for(&grid);
    assert_eq!(cheap.find_path(&grid, px(0, 0), px(3, 0)).len(), 4);
}

#[test]
fn test_huge_step_costs_saturate_instead_of_overflowing() {
    let grid = open_grid(4, 1);

    let huge_base = PassabilityConfig {
        base_step_cost: u32::MAX,
        ..PassabilityConfig::default()
    };
    let mut finder = finder_with(&grid, huge_base);
    assert_eq!(finder.find_path(&grid, px(0, 0), px(3, 0)).len(), 1);
    assert_eq!(finder.find_path(&grid, px(2, 0), px(2, 0)).len(), 1);

    let huge_extra = PassabilityConfig {
        extra_orthogonal_cost: u32::MAX,
        ..PassabilityConfig::default()
    };
    let mut finder = finder_with(&grid, huge_extra);
    let route = finder.find_path(&grid, px(0, 0), px(3, 0));
    assert_eq!(route.len(), 1);
    assert_eq!(finder.cost_at(Cell::new(2, 0)), BLOCKED - 1, "stored cost stays below the blocked marker");
}

#[test]
fn test_equal_descents_take_first_in_scan_order() {
    // With the centre walled off, south and east of the start sit at the same
    // cost, so the backtrace has to fall back on scan order.
    let mut grid = open_grid(3, 3);
    grid.set_class(1, 1, WALL);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, px(0, 0), px(2, 2));

    assert_eq!(finder.cost_at(Cell::new(0, 1)), finder.cost_at(Cell::new(1, 0)));
    assert_eq!(finder.cost_at(Cell::new(0, 0)), 39);
    assert_eq!(finder.cost_at(Cell::new(0, 1)), 25);
    assert_eq!(
        route.cells().collect::<Vec<_>>(),
        vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 2), Cell::new(2, 2)],
        "south is scanned before east"
    );
    let orientations: Vec<_> = route.iter().map(|w| w.orientation).collect();
    assert_eq!(
        orientations,
        vec![Orientation::SouthEast, Orientation::South, Orientation::SouthEast, Orientation::East]
    );
}

#[test]
fn test_mismatched_grid_returns_start_only() {
    let grid = open_grid(4, 4);
    let mut finder = finder_for(&grid);

    let empty = PassabilityGrid::filled(0, 0, WALKABLE);
    let route = finder.find_path(&empty, px(0, 0), px(3, 3));
    assert_eq!(route.len(), 1);

    let larger = open_grid(6, 6);
    let route = finder.find_path(&larger, px(0, 0), px(5, 5));
    assert_eq!(route.len(), 1);
    assert_eq!(route.start().orientation, Orientation::SouthEast);
}

#[test]
fn test_pixels_outside_grid_clamp_to_edge() {
    let grid = open_grid(4, 4);
    let mut finder = finder_for(&grid);

    let route = finder.find_path(&grid, IVec2::new(-20, -5), IVec2::new(1000, 1000));

    assert_eq!(route.start().cell, Cell::new(0, 0));
    assert_eq!(route.last().cell, Cell::new(3, 3));
}

#[test]
fn test_find_path_before_configure_returns_start_only() {
    let grid = open_grid(4, 4);
    let mut finder = PathFinder::new(PassabilityConfig::default());

    let route = finder.find_path(&grid, px(0, 0), px(3, 3));

    assert_eq!(route.len(), 1);
}

#[test]
fn test_reconfigure_replaces_cost_buffer() {
    let small = open_grid(4, 4);
    let mut finder = finder_for(&small);
    finder.find_path(&small, px(0, 0), px(3, 3));

    let wide = open_grid(9, 2);
    finder.configure(9, 2);
    assert_eq!(finder.dimensions(), (9, 2));

    let route = finder.find_path(&wide, px(0, 0), px(8, 1));
    assert_eq!(route.start().cell, Cell::new(0, 0));
    assert_eq!(route.last().cell, Cell::new(8, 1));
    assert_route_well_formed(&finder, &wide, &route);
}

#[test]
fn test_repeated_requests_are_deterministic() {
    let mut grid = open_grid(12, 12);
    grid.fill_rect(3, 3, 6, 1, WALL);
    grid.fill_rect(8, 3, 1, 6, WALL);
    let mut finder = finder_for(&grid);

    let first = finder.find_path(&grid, px(1, 10), px(10, 1));
    // An unrelated request in between must not leak state into the next one.
    finder.find_path(&grid, px(0, 0), px(11, 11));
    let second = finder.find_path(&grid, px(1, 10), px(10, 1));

    assert_eq!(first, second);
}

#[test]
fn test_random_grids_produce_well_formed_routes() {
    let mut rng = fastrand::Rng::with_seed(42);
    let mut reached = 0;

    for _ in 0..150 {
        let width = rng.usize(2..20);
        let height = rng.usize(2..20);
        let mut grid = open_grid(width, height);
        for y in 0..height {
            for x in 0..width {
                if rng.u8(0..100) < 25 {
                    grid.set_class(x, y, WALL);
                }
            }
        }
        let start = Cell::new(rng.usize(0..width), rng.usize(0..height));
        let goal = Cell::new(rng.usize(0..width), rng.usize(0..height));
        grid.set_class(start.x, start.y, WALKABLE);
        grid.set_class(goal.x, goal.y, WALKABLE);

        let mut finder = finder_for(&grid);
        let route = finder.find_path(&grid, px(start.x, start.y), px(goal.x, goal.y));

        assert_eq!(route.start().cell, start);
        assert_route_well_formed(&finder, &grid, &route);
        if route.len() > 1 || start == goal {
            assert_eq!(route.last().cell, goal, "a flood that reached the start must lead back to the goal");
            reached += 1;
        }
    }

    println!("{} of 150 random requests were reachable", reached);
    assert!(reached > 0);
}
