//! Entity-Component-System scheduling core
//!
//! Systems declare named update methods bound to stages; the scheduler
//! builds a dependency graph per clock, linearizes it into per-stage
//! buckets, and executes the result across two timing domains.

pub mod graph;
pub mod scheduler;
pub mod system;
pub mod task;
pub mod update_groups;
pub mod world;

pub use graph::{DependencyGraph, GraphError};
pub use scheduler::{SchedulerError, SystemScheduler};
pub use system::{System, SystemRegistration, UpdateMethod};
pub use task::Task;
pub use update_groups::{stages, Clock, GroupId, GroupRegistry, UpdateGroup};
pub use world::World;
