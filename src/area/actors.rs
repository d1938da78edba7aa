/// Actor components and the per-frame systems that drive them.
///
/// `process_path_requests` turns [`PathRequest`] messages into [`WalkPath`]s;
/// `run_frame` walks the scheduler tiers and steps every actor in depth order.

use bevy::prelude::*;
use crate::area::grid::PassabilityGrid;
use crate::area::pathfinding::{Cell, Orientation, PathFinder, Route};
use crate::area::profiling::profile;
use crate::area::resources::{AreaGrid, FrameOrder, FrameTick};
use crate::area::scheduling::{EntityKey, FrameScheduler, Scheduled, Tier};
use crate::profile_log;

// ============================================================================
// Components
// ============================================================================

/// A creature placed in the area.
#[derive(Component, Debug, Clone)]
#[require(Activity, PixelPosition, Facing)]
pub struct Actor {
    /// Script name, matched case-insensitively.
    pub name: String,
    /// Disabled actors stay in the area but are skipped every frame.
    pub enabled: bool,
    /// Despawned the next time the frame loop reaches this actor.
    pub delete_requested: bool,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            delete_requested: false,
        }
    }
}

/// Coarse behaviour used to pick the actor's scheduling tier.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Awake,
    Dormant,
}

/// Position in area pixels; `y` doubles as the depth key.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelPosition(pub IVec2);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Facing(pub Orientation);

/// Route being followed, one waypoint per frame.
#[derive(Component, Debug, Clone)]
pub struct WalkPath {
    pub route: Route,
    /// Index of the next waypoint to step onto. Waypoint 0 is where the actor
    /// already stands.
    pub next: usize,
}

impl WalkPath {
    pub fn new(route: Route) -> Self {
        Self { route, next: 1 }
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.route.len()
    }

    /// Last cell of the route.
    pub fn destination(&self) -> Cell {
        self.route.last().cell
    }
}

/// Ask for a route from an actor's current position to a pixel goal.
#[derive(Message, Debug, Clone)]
pub struct PathRequest {
    pub entity: Entity,
    pub goal: IVec2,
}

// ============================================================================
// Frame snapshot
// ============================================================================

/// What the scheduler sees of one actor this frame.
#[derive(Clone, Copy, Debug)]
pub struct ActorSnapshot {
    pub entity: Entity,
    pub key: EntityKey,
}

impl Scheduled for ActorSnapshot {
    fn entity_key(&self) -> EntityKey {
        self.key
    }
}

// ============================================================================
// Systems
// ============================================================================

#[profile(2)]
pub(crate) fn process_path_requests(
    mut path_requests: MessageReader<PathRequest>,
    mut commands: Commands,
    grid: Option<Res<AreaGrid>>,
    finder: Option<ResMut<PathFinder>>,
    positions: Query<&PixelPosition>,
) {
    if path_requests.is_empty() {
        return;
    }

    let (Some(grid), Some(mut finder)) = (grid, finder) else {
        warn!("[PATHFINDING] Dropping {} path requests, no area loaded", path_requests.len());
        path_requests.clear();
        return;
    };

    for request in path_requests.read() {
        let Ok(position) = positions.get(request.entity) else {
            warn!("[PATHFINDING] Path request for {:?} which has no position", request.entity);
            continue;
        };

        let route = finder.find_path(&grid.0, position.0, request.goal);
        if route.len() == 1 {
            debug!(
                "[PATHFINDING] {:?} cannot leave {:?} toward {:?}",
                request.entity,
                route.start().cell,
                request.goal
            );
        }
        let facing = Facing(route.start().orientation);
        commands
            .entity(request.entity)
            .try_insert((WalkPath::new(route), facing));
    }
}

/// One frame of the area: drain every tier in depth order and process each actor.
#[profile(4)]
pub(crate) fn run_frame(
    mut commands: Commands,
    mut scheduler: ResMut<FrameScheduler>,
    mut order: ResMut<FrameOrder>,
    tick: Res<FrameTick>,
    mut actors: Query<(Entity, &Actor, &Activity, &mut PixelPosition, &mut Facing, Option<&mut WalkPath>)>,
) {
    let snapshot: Vec<ActorSnapshot> = actors
        .iter()
        .map(|(entity, _, activity, position, _, _)| ActorSnapshot {
            entity,
            key: EntityKey {
                vertical_position: position.0.y,
                dormant: *activity == Activity::Dormant,
            },
        })
        .collect();

    order.0.clear();
    let mut deleted = 0usize;

    for tier in Tier::ALL {
        scheduler.generate_queue(tier, &snapshot);
        while let Some(index) = scheduler.get_root(tier) {
            let entity = snapshot[index].entity;
            let Ok((_, actor, _, mut position, mut facing, walk)) = actors.get_mut(entity) else {
                continue;
            };
            if !actor.enabled {
                continue;
            }
            if actor.delete_requested {
                commands.entity(entity).despawn();
                deleted += 1;
                continue;
            }

            if let Some(mut walk) = walk {
                if let Some(waypoint) = walk.route.get(walk.next).copied() {
                    position.0 = PassabilityGrid::cell_center(waypoint.cell.x, waypoint.cell.y);
                    facing.0 = waypoint.orientation;
                    walk.next += 1;
                }
                if walk.is_finished() {
                    commands.entity(entity).remove::<WalkPath>();
                }
            }
            order.0.push(entity);
        }
    }

    if deleted > 0 {
        // Entity count dropped; make every tier start from a fresh buffer.
        scheduler.invalidate();
    }

    trace!("[FRAME] {}: {} actors processed, {} deleted", tick.0, order.0.len(), deleted);
    profile_log!(tick, "[FRAME] {} of {} actors processed", order.0.len(), snapshot.len());
}

// ============================================================================
// Lookups
// ============================================================================

/// First actor whose script name matches, ignoring ASCII case. Disabled
/// actors are found too, so scripts can re-enable them by name.
pub fn find_actor_by_name<'a>(
    actors: impl IntoIterator<Item = (Entity, &'a Actor)>,
    name: &str,
) -> Option<Entity> {
    actors
        .into_iter()
        .find(|(_, actor)| actor.name.eq_ignore_ascii_case(name))
        .map(|(entity, _)| entity)
}

/// Enabled actors standing inside a pixel rectangle (edges inclusive).
pub fn actors_in_rect<'a>(
    actors: impl IntoIterator<Item = (Entity, &'a Actor, &'a PixelPosition)>,
    rect: IRect,
) -> Vec<Entity> {
    actors
        .into_iter()
        .filter(|(_, actor, position)| actor.enabled && rect.contains(position.0))
        .map(|(entity, _, _)| entity)
        .collect()
}
