//! Flipline entry point
//!
//! Runs the simulation headless at a fixed step with a scripted input and
//! logs what happens. Usage: `flipline [level.json] [config.json] [ticks]`

use std::process::ExitCode;

use glam::IVec2;

use flipline::consts::*;
use flipline::sim::{Level, TickInput, TileTransition, World, tick};
use flipline::{Error, SimConfig, TileSet};

/// Bundled level used when no path is given
const DEMO_LEVEL: &str = include_str!("../assets/levels/demo.json");
/// Ten seconds at the fixed rate
const DEFAULT_TICKS: u64 = 10 * SIM_HZ as u64;

/// Walk right, strike every quarter second, jump every two thirds of a second
fn scripted_input(t: u64) -> TickInput {
    TickInput {
        move_x: 1,
        jump: t % 40 == 0,
        strike: t % 15 == 0,
    }
}

fn run() -> Result<(), Error> {
    let mut args = std::env::args().skip(1);
    let level = match args.next() {
        Some(path) => Level::load(path)?,
        None => Level::from_json(DEMO_LEVEL)?,
    };
    let config = match args.next() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let ticks = match args.next() {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            log::warn!("Invalid tick count {:?}, using {}", arg, DEFAULT_TICKS);
            DEFAULT_TICKS
        }),
        None => DEFAULT_TICKS,
    };

    let spawn = IVec2::new(2 * TILE_SIZE, 6 * TILE_SIZE);
    let mut world = World::new(level, TileSet::builtin()?, config, spawn)?;
    world.add_follower(spawn - IVec2::new(TILE_SIZE, 0));
    log::info!(
        "Initial draw list: {} commands, {} animated tiles",
        world.draw_commands().len(),
        world.registry.len()
    );

    let mut consumed = 0;
    for t in 0..ticks {
        let report = tick(&mut world, &scripted_input(t));
        for activation in report.activations.iter().filter(|a| a.fresh) {
            log::info!(
                "[{}] body {} activated {:?} at {:?}",
                t,
                activation.body,
                activation.kind,
                activation.pos
            );
        }
        consumed += report
            .transitions
            .iter()
            .filter(|tr| matches!(tr, TileTransition::Consumed(_)))
            .count();
        if let Some(room) = report.room_switch {
            log::info!("[{}] entered room {}", t, room);
        }
    }

    let commands = world.draw_commands();
    log::info!(
        "Ran {} ticks: room {}, primary at {:?}, polarity {:?}, beam row {}, {} tiles consumed",
        ticks,
        world.room_index(),
        world.primary.rect.pos,
        world.gravity.polarity,
        world.gravity.beam_row,
        consumed
    );
    log::info!(
        "Final frame: {} draw commands, {} animated tiles ({} mirrored)",
        commands.len(),
        world.registry.len(),
        world.tile_frames().iter().filter(|f| f.mirrored).count()
    );
    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Flipline starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("flipline: {err}");
            ExitCode::FAILURE
        }
    }
}
