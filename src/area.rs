use bevy::prelude::*;

pub mod actors;
pub mod config;
pub mod grid;
pub mod pathfinding;
pub mod profiling;
pub mod resources;
pub mod scheduling;

pub use actors::{Activity, Actor, ActorSnapshot, Facing, PixelPosition, WalkPath, PathRequest, find_actor_by_name, actors_in_rect};
pub use config::{PassabilityConfig, PassabilityTable, Passability, PASSABILITY_CONFIG_PATH};
pub use grid::{PassabilityGrid, PassabilitySource, CELL_WIDTH, CELL_HEIGHT};
pub use pathfinding::{PathFinder, Route, Waypoint, Orientation, Cell};
pub use resources::{AreaGrid, FrameOrder, FrameTick};
pub use scheduling::{FrameScheduler, Tier, EntityKey, EntityList, Scheduled};

/// Wires the pathfinder and the frame scheduler into an app.
///
/// The surrounding game inserts an [`AreaGrid`] once the area's search map is
/// decoded; the plugin keeps a [`PathFinder`] configured for it, answers
/// [`PathRequest`] messages and runs the per-frame tier loop over actors.
pub struct AreaPlugin;

impl Plugin for AreaPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PathRequest>();
        app.init_resource::<FrameScheduler>();
        app.init_resource::<FrameOrder>();
        app.init_resource::<FrameTick>();
        app.add_systems(Startup, config::load_passability_config);
        app.add_systems(
            Update,
            (
                resources::sync_path_finder,
                actors::process_path_requests,
                actors::run_frame,
                resources::advance_frame_tick,
            )
                .chain(),
        );
    }
}
