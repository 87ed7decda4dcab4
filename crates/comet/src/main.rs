//! Comet — a minimal simulation driving the pulse_engine scheduler
//!
//! Registers input, gameplay, physics and render systems, enables the
//! feature tags the world should run, and drives the variable-rate clock
//! from a plain frame loop while the fixed clock ticks in the background.

mod systems;

use pulse_engine::prelude::*;
use std::time::Duration;
use systems::{InputSystem, PhysicsSystem, RenderSystem, ShipSystem};

const FRAME_BUDGET: Duration = Duration::from_millis(8);
const FRAMES_TO_RUN: u32 = 240;

fn main() -> Result<(), EngineError> {
    env_logger::init();

    let config = match EngineConfig::from_toml_file("comet.toml") {
        Ok(config) => config,
        Err(ConfigError::Io(_)) => EngineConfig::default(),
        Err(err) => {
            log::error!("bad comet.toml: {err}");
            return Ok(());
        }
    };

    let mut engine = Engine::new(config)?;

    // Opt the world into the demo's feature tags before the first
    // linearization so their stages survive the bucket filter.
    engine.world().add_tag("physics");
    engine.world().add_tag("render");

    engine.register_systems(&[
        SystemRegistration::new("InputSystem", InputSystem::new),
        SystemRegistration::new("ShipSystem", ShipSystem::new),
        SystemRegistration::new("PhysicsSystem", PhysicsSystem::new),
        SystemRegistration::new("RenderSystem", RenderSystem::new),
    ])?;

    engine.start()?;

    let mut run_time = Stopwatch::start_new();
    for _ in 0..FRAMES_TO_RUN {
        engine.frame();
        std::thread::sleep(FRAME_BUDGET);
    }
    run_time.stop();

    log::info!(
        "ran {} frames in {:.2}s ({:.1} fps avg), {} fixed ticks",
        engine.timer().frame_count(),
        run_time.elapsed_secs(),
        engine.timer().average_fps(),
        engine.world().fixed_frame_id()
    );

    engine.shutdown();
    Ok(())
}
