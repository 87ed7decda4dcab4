//! Comet demo systems
//!
//! Small stand-ins for real engine subsystems: each one owns a bit of
//! state behind its own synchronization and declares where in the frame it
//! wants to run. The update bodies only simulate work; rendering and
//! physics proper are out of scope for the demo.

use pulse_engine::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Polls "input" at the top of every frame, on the main thread
pub struct InputSystem {
    polls: AtomicU64,
    steering: Mutex<f32>,
}

impl InputSystem {
    pub fn new(_world: &Arc<World>) -> Arc<dyn System> {
        Arc::new(Self {
            polls: AtomicU64::new(0),
            steering: Mutex::new(0.0),
        })
    }
}

impl System for InputSystem {
    fn update_methods(&self) -> &'static [UpdateMethod] {
        const METHODS: &[UpdateMethod] = &[UpdateMethod::new("poll", stages::INPUT)];
        METHODS
    }

    fn invoke(&self, method: &str, _dt: f32) {
        if method == "poll" {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst);
            // Fake a slowly oscillating stick, smoothed against last frame
            let mut steering = self.steering.lock().unwrap();
            *steering = 0.5 * *steering + 0.5 * (polls as f32 * 0.1).sin();
        }
    }

    fn init(&self) {
        log::info!("input ready");
    }
}

/// Variable-rate gameplay: steers the ship after input, animates before
/// render
pub struct ShipSystem {
    heading: Mutex<f32>,
    frames_animated: AtomicU64,
}

impl ShipSystem {
    pub fn new(_world: &Arc<World>) -> Arc<dyn System> {
        Arc::new(Self {
            heading: Mutex::new(0.0),
            frames_animated: AtomicU64::new(0),
        })
    }
}

impl System for ShipSystem {
    fn update_methods(&self) -> &'static [UpdateMethod] {
        const METHODS: &[UpdateMethod] = &[
            UpdateMethod::new("steer", stages::GAMEPLAY).after(&["InputSystem::poll"]),
            UpdateMethod::new("animate", stages::BEFORE_RENDER).after(&["ShipSystem::steer"]),
        ];
        METHODS
    }

    fn invoke(&self, method: &str, dt: f32) {
        match method {
            "steer" => {
                *self.heading.lock().unwrap() += dt;
            }
            "animate" => {
                let frames = self.frames_animated.fetch_add(1, Ordering::SeqCst) + 1;
                if frames % 120 == 0 {
                    log::debug!(
                        "heading {:.2} after {frames} animated frames",
                        *self.heading.lock().unwrap()
                    );
                }
            }
            _ => {}
        }
    }
}

/// Fixed-rate physics: prepare, step, settle, in declared order
pub struct PhysicsSystem {
    world: Arc<World>,
    steps: AtomicU64,
    velocity: Mutex<f32>,
}

impl PhysicsSystem {
    pub fn new(world: &Arc<World>) -> Arc<dyn System> {
        Arc::new(Self {
            world: Arc::clone(world),
            steps: AtomicU64::new(0),
            velocity: Mutex::new(0.0),
        })
    }
}

impl System for PhysicsSystem {
    fn tag(&self) -> &'static str {
        "physics"
    }

    fn update_methods(&self) -> &'static [UpdateMethod] {
        const METHODS: &[UpdateMethod] = &[
            UpdateMethod::new("prepare", stages::BEFORE_PHYSICS),
            UpdateMethod::new("step", stages::PHYSICS).after(&["PhysicsSystem::prepare"]),
            UpdateMethod::new("settle", stages::AFTER_PHYSICS).after(&["PhysicsSystem::step"]),
        ];
        METHODS
    }

    fn invoke(&self, method: &str, dt: f32) {
        match method {
            "prepare" => {
                // Gravity for the tick
                *self.velocity.lock().unwrap() -= 9.81 * dt;
            }
            "step" => {
                let steps = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
                if steps % 300 == 0 {
                    log::debug!(
                        "physics step {steps}, velocity {:.2}",
                        *self.velocity.lock().unwrap()
                    );
                }
            }
            "settle" => {
                // Tell the sync point the simulation moved this tick
                self.world.mark_changed();
            }
            _ => {}
        }
    }

    fn init(&self) {
        log::info!("physics ready");
    }
}

/// Draws the frame on the main thread after animation has run
pub struct RenderSystem {
    frames_drawn: AtomicU64,
}

impl RenderSystem {
    pub fn new(_world: &Arc<World>) -> Arc<dyn System> {
        Arc::new(Self {
            frames_drawn: AtomicU64::new(0),
        })
    }
}

impl System for RenderSystem {
    fn tag(&self) -> &'static str {
        "render"
    }

    fn update_methods(&self) -> &'static [UpdateMethod] {
        const METHODS: &[UpdateMethod] = &[
            UpdateMethod::new("draw", stages::RENDER).after(&["ShipSystem::animate"]),
        ];
        METHODS
    }

    fn invoke(&self, method: &str, _dt: f32) {
        if method == "draw" {
            let frame = self.frames_drawn.fetch_add(1, Ordering::SeqCst);
            if frame % 60 == 0 {
                log::debug!("drew frame {frame}");
            }
        }
    }
}
