//! # Pulse Engine
//!
//! A modular game engine core built around a dual-clock system scheduler.
//!
//! ## Features
//!
//! - **Dual-Clock Scheduling**: Independent variable-rate and fixed-rate
//!   update loops, each with its own worker pool
//! - **Dependency-Ordered Systems**: Update methods declare stages and
//!   before/after edges; execution order is derived by topological sort
//! - **World Tags**: Worlds opt whole groups of work in and out by tag
//! - **Main-Thread Stages**: Selected stages run inline on the driving
//!   thread and act as completion barriers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulse_engine::prelude::*;
//! use std::sync::Arc;
//!
//! struct Heartbeat;
//!
//! impl System for Heartbeat {
//!     fn update_methods(&self) -> &'static [UpdateMethod] {
//!         const METHODS: &[UpdateMethod] = &[UpdateMethod::new("beat", stages::GAMEPLAY)];
//!         METHODS
//!     }
//!
//!     fn invoke(&self, method: &str, dt: f32) {
//!         if method == "beat" {
//!             log::info!("beat, dt = {dt}");
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.register_systems(&[SystemRegistration::new("Heartbeat", |_world| {
//!         Arc::new(Heartbeat)
//!     })])?;
//!     engine.start()?;
//!     engine.frame();
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod ecs;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineError,
        core::config::{ConfigError, EngineConfig, SchedulerConfig},
        ecs::{
            stages, Clock, GroupRegistry, System, SystemRegistration, SystemScheduler,
            UpdateMethod, World,
        },
        foundation::time::{Stopwatch, Timer},
    };
}
