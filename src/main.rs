use bevy::prelude::*;
use rand::Rng;

use tilewalk::area::{
    Activity, Actor, AreaGrid, AreaPlugin, FrameOrder, PassabilityGrid, PathRequest, PixelPosition,
    CELL_HEIGHT, CELL_WIDTH,
};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DEMO_WIDTH: usize = 40;
const DEMO_HEIGHT: usize = 30;
const DEMO_ACTORS: usize = 12;
const DEMO_FRAMES: usize = 90;

const LOG_DIR: &str = "logs";
const LOG_PREFIX: &str = "tilewalk_";
const LOGS_KEPT: usize = 25;

/// Send logs to stdout and to a fresh timestamped file under `logs/`.
///
/// Returns the path of the new log file.
fn setup_file_logging() -> PathBuf {
    let log_dir = Path::new(LOG_DIR);
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Failed to create {}: {}", log_dir.display(), e);
    }
    prune_logs(log_dir, LOGS_KEPT);

    let log_name = format!("{}{}.log", LOG_PREFIX, chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, &log_name);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,bevy_app=info,tilewalk=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
        .init();

    log_dir.join(log_name)
}

/// Delete all but the `keep` most recently modified tilewalk logs.
fn prune_logs(log_dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(LOG_PREFIX) && name.ends_with(".log")
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .collect();

    // Newest first, so everything past `keep` goes.
    logs.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, path) in logs.into_iter().skip(keep) {
        if let Err(e) = fs::remove_file(&path) {
            eprintln!("Failed to remove old log {}: {}", path.display(), e);
        }
    }
}

/// A walled courtyard with a gate, plus a pond of class-8 terrain.
fn demo_grid() -> PassabilityGrid {
    let mut grid = PassabilityGrid::filled(DEMO_WIDTH, DEMO_HEIGHT, 1);
    grid.fill_rect(10, 5, 20, 1, 0);
    grid.fill_rect(10, 24, 20, 1, 0);
    grid.fill_rect(10, 5, 1, 20, 0);
    grid.fill_rect(29, 5, 1, 20, 0);
    // Gate on the south wall.
    grid.fill_rect(18, 24, 3, 1, 1);
    grid.fill_rect(15, 12, 6, 4, 8);
    grid
}

fn random_pixel(rng: &mut impl Rng) -> IVec2 {
    IVec2::new(
        rng.random_range(0..DEMO_WIDTH as i32 * CELL_WIDTH),
        rng.random_range(0..DEMO_HEIGHT as i32 * CELL_HEIGHT),
    )
}

fn spawn_demo_actors(mut commands: Commands, mut requests: MessageWriter<PathRequest>) {
    let mut rng = rand::rng();
    for i in 0..DEMO_ACTORS {
        let activity = if rng.random_bool(0.3) { Activity::Dormant } else { Activity::Awake };
        let entity = commands
            .spawn((
                Actor::new(format!("actor_{:02}", i)),
                activity,
                PixelPosition(random_pixel(&mut rng)),
            ))
            .id();
        if activity == Activity::Awake {
            requests.write(PathRequest { entity, goal: random_pixel(&mut rng) });
        }
    }
    info!("Spawned {} demo actors", DEMO_ACTORS);
}

fn main() {
    let log_file = setup_file_logging();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  tilewalk demo - Logging to file                         ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file.display().to_string());
    println!("╚══════════════════════════════════════════════════════════╝");

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(AreaPlugin)
        .insert_resource(AreaGrid(demo_grid()))
        .add_systems(Startup, spawn_demo_actors);

    for _ in 0..DEMO_FRAMES {
        app.update();
    }

    let world = app.world_mut();
    let order = world.resource::<FrameOrder>().0.clone();
    let mut actors = world.query::<(&Actor, &Activity, &PixelPosition)>();
    for entity in order {
        if let Ok((actor, activity, position)) = actors.get(world, entity) {
            info!("{:<10} {:?} at {:?}", actor.name, activity, position.0);
        }
    }
}
