//! Update groups and the stage registry
//!
//! An update group is a named phase in the per-tick execution order. Each
//! group belongs to one of the two clocks and may be marked main-thread-only,
//! in which case its tasks run inline on the driving thread instead of being
//! handed to a worker pool.

use std::collections::HashMap;

/// Timing domain an update group runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clock {
    /// Variable-rate clock driven by the caller's frame loop
    Variable,
    /// Fixed-rate clock driven by a dedicated background thread
    Fixed,
}

/// Handle to a registered update group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

/// A named execution stage
#[derive(Debug, Clone)]
pub struct UpdateGroup {
    name: &'static str,
    clock: Clock,
    main_thread_only: bool,
}

impl UpdateGroup {
    /// Stage name, unique within a registry
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Which clock this stage runs on
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Whether tasks in this stage must run on the driving thread
    pub fn main_thread_only(&self) -> bool {
        self.main_thread_only
    }
}

/// Standard stage names used by the engine's default group set
pub mod stages {
    /// Input polling, main thread
    pub const INPUT: &str = "INPUT";
    /// Frame setup after input, main thread
    pub const BEGIN: &str = "BEGIN";
    /// Variable-rate gameplay logic
    pub const GAMEPLAY: &str = "GAMEPLAY";
    /// Render preparation
    pub const BEFORE_RENDER: &str = "BEFORE_RENDER";
    /// Render command generation, main thread
    pub const RENDER: &str = "RENDER";
    /// Post-render work
    pub const AFTER_RENDER: &str = "AFTER_RENDER";
    /// End of the variable-rate frame, main thread
    pub const END: &str = "END";
    /// Fixed-rate work preceding the physics step
    pub const BEFORE_PHYSICS: &str = "BEFORE_PHYSICS";
    /// Fixed-rate physics step
    pub const PHYSICS: &str = "PHYSICS";
    /// Fixed-rate work following the physics step
    pub const AFTER_PHYSICS: &str = "AFTER_PHYSICS";
}

/// Registry of update groups defining the global stage order
///
/// Registration order is the global execution order. The registry is built
/// once at startup, before any system is registered with the scheduler, and
/// is frozen once handed to it.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<UpdateGroup>,
    by_name: HashMap<&'static str, GroupId>,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated with the engine's standard stages
    pub fn with_default_groups() -> Self {
        let mut registry = Self::new();
        registry.register(stages::INPUT, Clock::Variable, true);
        registry.register(stages::BEGIN, Clock::Variable, true);
        registry.register(stages::GAMEPLAY, Clock::Variable, false);
        registry.register(stages::BEFORE_PHYSICS, Clock::Fixed, false);
        registry.register(stages::PHYSICS, Clock::Fixed, false);
        registry.register(stages::AFTER_PHYSICS, Clock::Fixed, false);
        registry.register(stages::BEFORE_RENDER, Clock::Variable, false);
        registry.register(stages::RENDER, Clock::Variable, true);
        registry.register(stages::AFTER_RENDER, Clock::Variable, false);
        registry.register(stages::END, Clock::Variable, true);
        registry
    }

    /// Register a group at the end of the global order
    ///
    /// Re-registering an existing name returns the original handle and
    /// leaves the registry unchanged.
    pub fn register(&mut self, name: &'static str, clock: Clock, main_thread_only: bool) -> GroupId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = GroupId(self.groups.len());
        self.groups.push(UpdateGroup {
            name,
            clock,
            main_thread_only,
        });
        self.by_name.insert(name, id);
        id
    }

    /// Look up a group by name
    ///
    /// Unknown names yield `None`; callers skip unknown stages rather than
    /// failing the tick.
    pub fn lookup(&self, name: &str) -> Option<&UpdateGroup> {
        self.by_name.get(name).map(|&GroupId(index)| &self.groups[index])
    }

    /// Iterate groups in global execution order
    pub fn global_order(&self) -> impl Iterator<Item = &UpdateGroup> {
        self.groups.iter()
    }

    /// Number of registered groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_unknown_returns_none() {
        let registry = GroupRegistry::with_default_groups();
        assert!(registry.lookup("NO_SUCH_STAGE").is_none());
    }

    #[test]
    fn test_default_groups_order() {
        let registry = GroupRegistry::with_default_groups();
        let order: Vec<_> = registry.global_order().map(UpdateGroup::name).collect();
        assert_eq!(order[0], stages::INPUT);
        assert!(
            order.iter().position(|&n| n == stages::PHYSICS).unwrap()
                < order.iter().position(|&n| n == stages::RENDER).unwrap()
        );
        assert_eq!(*order.last().unwrap(), stages::END);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = GroupRegistry::new();
        let first = registry.register("X", Clock::Variable, false);
        let second = registry.register("X", Clock::Fixed, true);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        // First registration wins
        assert_eq!(registry.lookup("X").unwrap().clock(), Clock::Variable);
    }

    #[test]
    fn test_main_thread_flags() {
        let registry = GroupRegistry::with_default_groups();
        assert!(registry.lookup(stages::INPUT).unwrap().main_thread_only());
        assert!(registry.lookup(stages::RENDER).unwrap().main_thread_only());
        assert!(!registry.lookup(stages::PHYSICS).unwrap().main_thread_only());
    }
}
