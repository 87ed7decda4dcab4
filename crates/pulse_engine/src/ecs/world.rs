//! World state shared with the scheduler
//!
//! The world owns system instances and the feature-tag set the linearizer
//! filters against. It is shared across the scheduler's threads behind an
//! `Arc`, so all state here carries its own synchronization.

use crate::ecs::system::System;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// A game world: system owner and feature-toggle authority
pub struct World {
    tags: RwLock<HashSet<String>>,
    pending_tag_edits: Mutex<Vec<TagEdit>>,
    systems: Mutex<Vec<Arc<dyn System>>>,
    fixed_frame_id: AtomicU64,
    changed: AtomicBool,
}

enum TagEdit {
    Add(String),
    Remove(String),
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a world wanting only the `"base"` tag
    pub fn new() -> Self {
        let mut tags = HashSet::new();
        tags.insert("base".to_string());
        Self {
            tags: RwLock::new(tags),
            pending_tag_edits: Mutex::new(Vec::new()),
            systems: Mutex::new(Vec::new()),
            fixed_frame_id: AtomicU64::new(0),
            changed: AtomicBool::new(false),
        }
    }

    /// Enable a feature tag immediately
    pub fn add_tag(&self, tag: &str) {
        self.tags.write().unwrap().insert(tag.to_string());
    }

    /// Disable a feature tag immediately, returning whether it was set
    pub fn remove_tag(&self, tag: &str) -> bool {
        self.tags.write().unwrap().remove(tag)
    }

    /// Whether a feature tag is currently enabled
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.read().unwrap().contains(tag)
    }

    /// Drop every feature tag
    pub fn clear_tags(&self) {
        self.tags.write().unwrap().clear();
    }

    /// The feature-toggle query used when filtering stage buckets
    pub fn wants(&self, tag: &str) -> bool {
        self.has_tag(tag)
    }

    /// Request a tag change from a task; applied at the next fixed-tick
    /// sync point rather than mid-tick
    pub fn queue_add_tag(&self, tag: &str) {
        self.pending_tag_edits
            .lock()
            .unwrap()
            .push(TagEdit::Add(tag.to_string()));
        self.mark_changed();
    }

    /// Request a tag removal from a task; applied at the next fixed-tick
    /// sync point
    pub fn queue_remove_tag(&self, tag: &str) {
        self.pending_tag_edits
            .lock()
            .unwrap()
            .push(TagEdit::Remove(tag.to_string()));
        self.mark_changed();
    }

    /// Flag that a task changed world state this tick
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }

    /// End-of-tick synchronization hook for the fixed clock
    ///
    /// Applies deferred tag edits, consumes the changed marker and advances
    /// the fixed frame counter. Returns whether any task reported a change
    /// during the tick.
    pub fn end_fixed_tick(&self) -> bool {
        let edits = std::mem::take(&mut *self.pending_tag_edits.lock().unwrap());
        if !edits.is_empty() {
            let mut tags = self.tags.write().unwrap();
            for edit in edits {
                match edit {
                    TagEdit::Add(tag) => {
                        tags.insert(tag);
                    }
                    TagEdit::Remove(tag) => {
                        tags.remove(&tag);
                    }
                }
            }
        }
        self.fixed_frame_id.fetch_add(1, Ordering::AcqRel);
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Monotonically increasing count of completed fixed ticks
    pub fn fixed_frame_id(&self) -> u64 {
        self.fixed_frame_id.load(Ordering::Acquire)
    }

    /// Hand a system instance to the world; the world is the sole owner
    pub fn add_system(&self, system: Arc<dyn System>) {
        self.systems.lock().unwrap().push(system);
    }

    /// Run one-time initialization on every owned system
    pub fn init_systems(&self) {
        let systems: Vec<_> = self.systems.lock().unwrap().clone();
        for system in systems {
            system.init();
        }
    }

    /// Number of systems the world owns
    pub fn system_count(&self) -> usize {
        self.systems.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_world_wants_base() {
        let world = World::new();
        assert!(world.wants("base"));
        assert!(!world.wants("physics"));
    }

    #[test]
    fn test_tag_add_remove() {
        let world = World::new();
        world.add_tag("physics");
        assert!(world.has_tag("physics"));
        assert!(world.remove_tag("physics"));
        assert!(!world.has_tag("physics"));
        assert!(!world.remove_tag("physics"));
    }

    #[test]
    fn test_queued_edits_apply_at_sync_point() {
        let world = World::new();
        world.queue_add_tag("ragdoll");
        // Invisible until the tick ends
        assert!(!world.has_tag("ragdoll"));
        assert!(world.end_fixed_tick());
        assert!(world.has_tag("ragdoll"));
        // Marker was consumed
        assert!(!world.end_fixed_tick());
    }

    #[test]
    fn test_fixed_frame_id_advances() {
        let world = World::new();
        assert_eq!(world.fixed_frame_id(), 0);
        world.end_fixed_tick();
        world.end_fixed_tick();
        assert_eq!(world.fixed_frame_id(), 2);
    }
}
