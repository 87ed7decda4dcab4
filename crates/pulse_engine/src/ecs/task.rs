//! Task data model
//!
//! A task is the immutable binding of a system instance to one of its
//! update methods, plus the scheduling metadata (stage, tag, ordering
//! edges) the graph builder needs.

use crate::ecs::system::{System, UpdateMethod};
use std::sync::{Arc, Weak};

/// One schedulable unit of work
///
/// Tasks hold their system weakly; system lifetime belongs to the world.
/// Invoking a task whose system has been dropped is a silent no-op.
pub struct Task {
    name: String,
    system: Weak<dyn System>,
    method: &'static str,
    stage: &'static str,
    tag: &'static str,
    dependencies: Vec<String>,
    dependents: Vec<String>,
}

impl Task {
    /// Bind a system's update method into a task
    pub fn new(type_name: &'static str, system: &Arc<dyn System>, method: &UpdateMethod) -> Self {
        Self {
            name: format!("{}::{}", type_name, method.name),
            system: Arc::downgrade(system),
            method: method.name,
            stage: method.stage,
            tag: system.tag(),
            dependencies: method.after.iter().map(|name| (*name).to_string()).collect(),
            dependents: method.before.iter().map(|name| (*name).to_string()).collect(),
        }
    }

    /// Unique task name, `<system-type>::<method>`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the stage this task runs in
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Logical feature tag inherited from the owning system
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Task names that must run before this one
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Task names that must run after this one
    pub fn dependents(&self) -> &[String] {
        &self.dependents
    }

    /// Invoke the bound update method
    pub fn invoke(&self, dt: f32) {
        if let Some(system) = self.system.upgrade() {
            system.invoke(self.method, dt);
        } else {
            log::trace!("task {} skipped: system dropped", self.name);
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Transient queue entry pairing a task with the tick's delta time
#[derive(Debug, Clone)]
pub(crate) struct TaskItem {
    pub task: Arc<Task>,
    pub dt: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::update_groups::stages;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        count: AtomicUsize,
    }

    impl System for Counter {
        fn update_methods(&self) -> &'static [UpdateMethod] {
            const METHODS: &[UpdateMethod] = &[UpdateMethod::new("count", stages::GAMEPLAY)];
            METHODS
        }

        fn invoke(&self, method: &str, _dt: f32) {
            if method == "count" {
                self.count.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_task_name_and_metadata() {
        let system: Arc<dyn System> = Arc::new(Counter {
            count: AtomicUsize::new(0),
        });
        let task = Task::new("Counter", &system, &system.update_methods()[0]);
        assert_eq!(task.name(), "Counter::count");
        assert_eq!(task.stage(), stages::GAMEPLAY);
        assert_eq!(task.tag(), "base");
    }

    #[test]
    fn test_invoke_reaches_system() {
        let counter = Arc::new(Counter {
            count: AtomicUsize::new(0),
        });
        let system: Arc<dyn System> = counter.clone();
        let task = Task::new("Counter", &system, &system.update_methods()[0]);
        task.invoke(0.016);
        assert_eq!(counter.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invoke_after_system_dropped_is_noop() {
        let system: Arc<dyn System> = Arc::new(Counter {
            count: AtomicUsize::new(0),
        });
        let task = Task::new("Counter", &system, &system.update_methods()[0]);
        drop(system);
        // Must not panic; the scheduler never owns system lifetime
        task.invoke(0.016);
    }
}
