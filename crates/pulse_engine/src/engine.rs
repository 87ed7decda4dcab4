//! Core engine implementation

use crate::{
    core::config::{ConfigError, EngineConfig},
    ecs::{GroupRegistry, SchedulerError, SystemRegistration, SystemScheduler, World},
    foundation::time::Timer,
};
use std::sync::Arc;
use thiserror::Error;

/// Main engine struct
///
/// The engine owns the world and the scheduler, and drives the
/// variable-rate clock from the caller's loop. The fixed clock runs on the
/// scheduler's own thread once [`Engine::start`] is called.
pub struct Engine {
    world: Arc<World>,
    scheduler: SystemScheduler,
    timer: Timer,
    running: bool,
}

impl Engine {
    /// Create an engine with the standard stage set
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_registry(config, GroupRegistry::with_default_groups())
    }

    /// Create an engine with a custom stage registry
    ///
    /// All stages must be registered before this point; the registry is
    /// frozen once the scheduler owns it.
    pub fn with_registry(
        config: EngineConfig,
        registry: GroupRegistry,
    ) -> Result<Self, EngineError> {
        config.scheduler.validate()?;
        log::info!("Initializing engine...");

        let world = Arc::new(World::new());
        let scheduler = SystemScheduler::new(Arc::clone(&world), registry, &config.scheduler)?;

        Ok(Self {
            world,
            scheduler,
            timer: Timer::new(),
            running: false,
        })
    }

    /// Register candidate system types from a discovery pass
    pub fn register_systems(
        &mut self,
        candidates: &[SystemRegistration],
    ) -> Result<(), EngineError> {
        self.scheduler.register_systems(candidates)?;
        Ok(())
    }

    /// Initialize all systems and start the fixed clock
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.scheduler.initialize_all_systems()?;
        self.scheduler.start()?;
        self.running = true;
        log::info!("Engine started");
        Ok(())
    }

    /// Advance the variable-rate clock by one frame
    ///
    /// Returns the frame's delta time in seconds. Worker-dispatched tasks
    /// may still be executing when this returns; the caller's loop paces
    /// the next frame.
    pub fn frame(&mut self) -> f32 {
        self.timer.update();
        let dt = self.timer.delta_time();
        self.scheduler.update_normal(dt);
        dt
    }

    /// Stop both clocks and join the scheduler's threads
    pub fn shutdown(&mut self) {
        if self.running {
            log::info!("Engine shutdown requested");
        }
        self.scheduler.shutdown();
        self.running = false;
    }

    /// Whether [`Engine::start`] has run and shutdown has not
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get the world
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Get the scheduler
    pub fn scheduler(&self) -> &SystemScheduler {
        &self.scheduler
    }

    /// Get mutable access to the scheduler
    pub fn scheduler_mut(&mut self) -> &mut SystemScheduler {
        &mut self.scheduler
    }

    /// Get the frame timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scheduler setup or startup error
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}
