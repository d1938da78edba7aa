mod finder;
mod types;

#[cfg(test)]
mod tests;

pub use finder::PathFinder;
pub use types::{Cell, Orientation, Route, Waypoint, BLOCKED, COST_CAP, UNVISITED};
