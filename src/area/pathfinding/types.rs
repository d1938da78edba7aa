use serde::{Deserialize, Serialize};

/// Cost of a cell the flood has not reached yet.
pub const UNVISITED: u16 = 0;

/// Cost marking a cell whose terrain was found impassable during this flood.
pub const BLOCKED: u16 = u16::MAX;

/// Floods stop once the next expansion cost would exceed this.
pub const COST_CAP: u32 = 65_500;

/// Grid cell coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbor at a signed offset, or `None` when it would leave the grid.
    #[inline]
    pub fn offset(self, dx: isize, dy: isize, width: usize, height: usize) -> Option<Cell> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < width && y < height).then_some(Cell { x, y })
    }
}

/// Eight-way facing, named on screen axes (+x east, +y south).
///
/// The discriminants are the engine's orientation codes and are what animation
/// tables index by, so they must not be renumbered.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Orientation {
    #[default]
    North = 0,
    NorthEast = 2,
    East = 4,
    SouthEast = 6,
    South = 8,
    SouthWest = 10,
    West = 12,
    NorthWest = 14,
}

impl Orientation {
    /// Direction of travel from one cell to another, from the signs of the delta.
    ///
    /// A zero delta reports `North`.
    pub fn between(from: Cell, to: Cell) -> Self {
        let dx = to.x as isize - from.x as isize;
        let dy = to.y as isize - from.y as isize;
        match (dx.signum(), dy.signum()) {
            (1, 1) => Orientation::SouthEast,
            (1, 0) => Orientation::East,
            (1, _) => Orientation::NorthEast,
            (0, 1) => Orientation::South,
            (0, _) => Orientation::North,
            (_, 1) => Orientation::SouthWest,
            (_, 0) => Orientation::West,
            _ => Orientation::NorthWest,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub const ALL: [Orientation; 8] = [
        Orientation::North,
        Orientation::NorthEast,
        Orientation::East,
        Orientation::SouthEast,
        Orientation::South,
        Orientation::SouthWest,
        Orientation::West,
        Orientation::NorthWest,
    ];
}

/// One step of a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub cell: Cell,
    /// Direction of travel into this cell from the previous waypoint. The first
    /// waypoint faces the goal.
    pub orientation: Orientation,
}

/// Start-first sequence of waypoints produced by [`PathFinder::find_path`](super::PathFinder::find_path).
///
/// Never empty: the start cell is always present, even when the goal could not
/// be reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub(super) fn starting_at(start: Waypoint) -> Self {
        Self { waypoints: vec![start] }
    }

    pub(super) fn push(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
    }

    pub fn start(&self) -> Waypoint {
        self.waypoints[0]
    }

    pub fn last(&self) -> Waypoint {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Never true for a route built by the finder.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.waypoints.iter()
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.waypoints.iter().map(|w| w.cell)
    }

    pub fn as_slice(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

impl std::ops::Index<usize> for Route {
    type Output = Waypoint;

    fn index(&self, index: usize) -> &Waypoint {
        &self.waypoints[index]
    }
}

impl<'a> IntoIterator for &'a Route {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}
