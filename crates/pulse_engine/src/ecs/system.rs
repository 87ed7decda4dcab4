//! System trait and registration descriptors
//!
//! Systems expose their schedulable work through static [`UpdateMethod`]
//! descriptors instead of runtime reflection: each descriptor names a
//! method, the stage it runs in, and its ordering edges relative to other
//! tasks. The scheduler turns every descriptor into one task.

use crate::ecs::world::World;
use std::sync::Arc;

/// Static descriptor of one schedulable update method
#[derive(Debug, Clone, Copy)]
pub struct UpdateMethod {
    /// Method name, unique within the owning system type
    pub name: &'static str,
    /// Name of the update group this method runs in
    pub stage: &'static str,
    /// Task names that must run before this method
    pub after: &'static [&'static str],
    /// Task names that must run after this method
    pub before: &'static [&'static str],
}

impl UpdateMethod {
    /// Create a descriptor with no ordering edges
    pub const fn new(name: &'static str, stage: &'static str) -> Self {
        Self {
            name,
            stage,
            after: &[],
            before: &[],
        }
    }

    /// Declare tasks that must run before this method
    pub const fn after(mut self, tasks: &'static [&'static str]) -> Self {
        self.after = tasks;
        self
    }

    /// Declare tasks that must run after this method
    pub const fn before(mut self, tasks: &'static [&'static str]) -> Self {
        self.before = tasks;
        self
    }
}

/// A schedulable engine system
///
/// Update methods may be invoked concurrently from worker threads; systems
/// guard their own state (atomics, locks). The scheduler provides ordering
/// primitives, not data isolation.
pub trait System: Send + Sync {
    /// Tag identifying the logical feature this system belongs to; worlds
    /// opt in and out of whole tags at once
    fn tag(&self) -> &'static str {
        "base"
    }

    /// The update methods this system wants scheduled
    fn update_methods(&self) -> &'static [UpdateMethod];

    /// Invoke one update method by name
    ///
    /// Called with the names returned from [`System::update_methods`];
    /// implementations ignore names they do not recognize.
    fn invoke(&self, method: &str, dt: f32);

    /// One-time initialization, called after the first task order build
    fn init(&self) {}
}

/// One candidate system type handed to the scheduler by the discovery layer
///
/// The scheduler constructs at most one instance per `type_name`; handing
/// the same type in again (in the same or a later discovery pass) is a
/// no-op.
#[derive(Clone, Copy)]
pub struct SystemRegistration {
    /// Type name used to derive task names and deduplicate discovery passes
    pub type_name: &'static str,
    /// Constructor for the system instance
    pub construct: fn(&Arc<World>) -> Arc<dyn System>,
}

impl SystemRegistration {
    /// Create a registration entry
    pub const fn new(
        type_name: &'static str,
        construct: fn(&Arc<World>) -> Arc<dyn System>,
    ) -> Self {
        Self {
            type_name,
            construct,
        }
    }
}
