/// Resource definitions for the area runtime.

use bevy::prelude::*;
use crate::area::config::PassabilityConfig;
use crate::area::grid::{PassabilityGrid, PassabilitySource};
use crate::area::pathfinding::PathFinder;

/// The current area's search map.
///
/// Inserted by whoever loads the area; replacing it reconfigures the
/// [`PathFinder`] on the next update.
#[derive(Resource, Clone, Debug)]
pub struct AreaGrid(pub PassabilityGrid);

impl AreaGrid {
    /// Whether the cell under a pixel position is impassable. Off-map positions
    /// count as blocked.
    pub fn blocked_at(&self, config: &PassabilityConfig, pixel: IVec2) -> bool {
        match self.0.pixel_to_cell(pixel) {
            Some((x, y)) => !config.is_passable(self.0.class_at(x, y)),
            None => true,
        }
    }
}

/// Entities in the order the last frame processed them.
#[derive(Resource, Default, Debug)]
pub struct FrameOrder(pub Vec<Entity>);

/// Number of frames run so far.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct FrameTick(pub u64);

/// Keep the [`PathFinder`] resource in step with the grid and config.
pub(crate) fn sync_path_finder(
    mut commands: Commands,
    grid: Option<Res<AreaGrid>>,
    config: Option<Res<PassabilityConfig>>,
    finder: Option<ResMut<PathFinder>>,
) {
    let (Some(grid), Some(config)) = (grid, config) else {
        return;
    };
    let (width, height) = (grid.0.width(), grid.0.height());
    if width == 0 || height == 0 {
        warn_once!("Area grid is empty, pathfinding disabled");
        if finder.is_some() {
            commands.remove_resource::<PathFinder>();
        }
        return;
    }

    match finder {
        Some(mut finder) if !config.is_changed() => {
            if grid.is_changed() {
                info!("Area grid changed, reconfiguring pathfinder for {}x{}", width, height);
                finder.configure(width, height);
            }
        }
        _ => {
            info!("Creating pathfinder for {}x{} area", width, height);
            let mut finder = PathFinder::new(*config);
            finder.configure(width, height);
            commands.insert_resource(finder);
        }
    }
}

pub(crate) fn advance_frame_tick(mut tick: ResMut<FrameTick>) {
    tick.0 += 1;
}
