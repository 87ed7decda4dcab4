//! Dependency graph construction and linearization
//!
//! One graph exists per clock. Edges come from the `after`/`before` lists
//! on update methods; linearization is Kahn's algorithm with the ready
//! queue seeded and tie-broken in task discovery order, so rebuilds of an
//! unchanged graph produce identical orderings.

use crate::ecs::task::Task;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

/// Per-stage task buckets, keyed by stage name
///
/// Concatenating the buckets in global stage order reproduces a valid
/// topological order of the whole graph.
pub type StageBuckets = HashMap<&'static str, Vec<Arc<Task>>>;

/// Structural errors detected while linearizing the graph
///
/// Both variants are fatal: they indicate a programming error in system
/// declarations and must abort scheduler setup before any tick runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains at least one dependency cycle
    #[error("cycle detected in task dependency graph ({unordered} of {total} tasks unorderable)")]
    CycleDetected {
        /// Tasks that could not be placed in the linear order
        unordered: usize,
        /// Total registered tasks
        total: usize,
    },

    /// An edge references a task name that was never registered
    #[error("task dependency references unknown task '{0}'")]
    UnresolvedTask(String),
}

/// Directed dependency graph over the tasks of one clock
#[derive(Default)]
pub struct DependencyGraph {
    tasks: HashMap<String, Arc<Task>>,
    adjacency: HashMap<String, Vec<String>>,
    in_degree: HashMap<String, usize>,
    discovery: Vec<String>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the graph has no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Insert a task and its declared edges
    ///
    /// Returns `false` without touching the graph if a task of the same
    /// name already exists; duplicate discovery of a system type must not
    /// create duplicate tasks. Edge targets may name tasks that have not
    /// been registered yet; they resolve lazily and are validated by
    /// [`DependencyGraph::build_task_order`].
    pub fn add_task(&mut self, task: Task) -> bool {
        let name = task.name().to_string();
        if self.tasks.contains_key(&name) {
            return false;
        }

        self.adjacency.entry(name.clone()).or_default();
        self.in_degree.entry(name.clone()).or_insert(0);

        for dep in task.dependencies() {
            self.adjacency.entry(dep.clone()).or_default().push(name.clone());
            *self.in_degree.entry(name.clone()).or_insert(0) += 1;
        }
        for dep in task.dependents() {
            self.adjacency.entry(name.clone()).or_default().push(dep.clone());
            *self.in_degree.entry(dep.clone()).or_insert(0) += 1;
        }

        self.discovery.push(name.clone());
        self.tasks.insert(name, Arc::new(task));
        true
    }

    /// Topologically sort the graph and partition the order into stage
    /// buckets
    ///
    /// `wants` is the world's feature-toggle query: a stage bucket survives
    /// only if the world wants the tag of its first task. Filtering never
    /// reorders surviving buckets.
    ///
    /// The graph itself is not consumed; rebuilding an unchanged graph
    /// yields the same buckets in the same order.
    pub fn build_task_order(
        &self,
        wants: impl Fn(&str) -> bool,
    ) -> Result<StageBuckets, GraphError> {
        self.check_edges_resolve()?;

        let mut degrees = self.in_degree.clone();
        let mut ready: VecDeque<&str> = self
            .discovery
            .iter()
            .map(String::as_str)
            .filter(|name| degrees[*name] == 0)
            .collect();
        let mut order: Vec<&Arc<Task>> = Vec::with_capacity(self.tasks.len());

        while let Some(current) = ready.pop_front() {
            order.push(&self.tasks[current]);

            if let Some(successors) = self.adjacency.get(current) {
                for successor in successors {
                    let degree = degrees
                        .get_mut(successor.as_str())
                        .expect("edge target validated above");
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(successor);
                    }
                }
            }
        }

        if order.len() != self.tasks.len() {
            return Err(GraphError::CycleDetected {
                unordered: self.tasks.len() - order.len(),
                total: self.tasks.len(),
            });
        }

        let mut buckets = StageBuckets::new();
        for task in order {
            buckets
                .entry(task.stage())
                .or_insert_with(Vec::new)
                .push(Arc::clone(task));
        }

        buckets.retain(|_, tasks| wants(tasks[0].tag()));
        Ok(buckets)
    }

    /// Verify that every edge endpoint names a registered task
    fn check_edges_resolve(&self) -> Result<(), GraphError> {
        for (from, successors) in &self.adjacency {
            if !self.tasks.contains_key(from) {
                return Err(GraphError::UnresolvedTask(from.clone()));
            }
            for to in successors {
                if !self.tasks.contains_key(to) {
                    return Err(GraphError::UnresolvedTask(to.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::system::{System, UpdateMethod};
    use crate::ecs::update_groups::stages;

    struct Stub {
        methods: &'static [UpdateMethod],
        tag: &'static str,
    }

    impl System for Stub {
        fn tag(&self) -> &'static str {
            self.tag
        }

        fn update_methods(&self) -> &'static [UpdateMethod] {
            self.methods
        }

        fn invoke(&self, _method: &str, _dt: f32) {}
    }

    fn task(
        type_name: &'static str,
        method: &'static UpdateMethod,
        tag: &'static str,
    ) -> (Task, Arc<dyn System>) {
        let system: Arc<dyn System> = Arc::new(Stub {
            methods: std::slice::from_ref(method),
            tag,
        });
        (Task::new(type_name, &system, method), system)
    }

    // Keeps the stub systems alive for the duration of a test so Weak
    // upgrades inside tasks stay valid.
    struct Fixture {
        graph: DependencyGraph,
        _systems: Vec<Arc<dyn System>>,
    }

    fn build(specs: &[(&'static str, &'static UpdateMethod, &'static str)]) -> Fixture {
        let mut graph = DependencyGraph::new();
        let mut systems = Vec::new();
        for &(type_name, method, tag) in specs {
            let (t, s) = task(type_name, method, tag);
            graph.add_task(t);
            systems.push(s);
        }
        Fixture {
            graph,
            _systems: systems,
        }
    }

    fn flatten(buckets: &StageBuckets, stage_order: &[&str]) -> Vec<String> {
        let mut names = Vec::new();
        for stage in stage_order {
            if let Some(tasks) = buckets.get(stage) {
                names.extend(tasks.iter().map(|t| t.name().to_string()));
            }
        }
        names
    }

    static POLL: UpdateMethod = UpdateMethod::new("poll", stages::INPUT);
    static STEP: UpdateMethod = UpdateMethod {
        name: "step",
        stage: stages::PHYSICS,
        after: &["Input::poll"],
        before: &[],
    };
    static DRAW: UpdateMethod = UpdateMethod {
        name: "draw",
        stage: stages::RENDER,
        after: &["Physics::step"],
        before: &[],
    };

    #[test]
    fn test_linear_chain_orders_across_stages() {
        // Scenario A: Input::poll -> Physics::step -> Render::draw
        let fixture = build(&[
            ("Input", &POLL, "base"),
            ("Physics", &STEP, "base"),
            ("Render", &DRAW, "base"),
        ]);
        let buckets = fixture.graph.build_task_order(|_| true).unwrap();
        let names = flatten(&buckets, &[stages::INPUT, stages::PHYSICS, stages::RENDER]);
        assert_eq!(names, vec!["Input::poll", "Physics::step", "Render::draw"]);
    }

    #[test]
    fn test_independent_tasks_share_a_stage() {
        // Scenario B: two edge-free tasks in the same stage both appear once
        static A: UpdateMethod = UpdateMethod::new("tick", stages::GAMEPLAY);
        static B: UpdateMethod = UpdateMethod::new("tock", stages::GAMEPLAY);
        let fixture = build(&[("A", &A, "base"), ("B", &B, "base")]);
        let buckets = fixture.graph.build_task_order(|_| true).unwrap();
        let bucket = &buckets[stages::GAMEPLAY];
        assert_eq!(bucket.len(), 2);
        let names: Vec<_> = bucket.iter().map(|t| t.name()).collect();
        assert!(names.contains(&"A::tick"));
        assert!(names.contains(&"B::tock"));
    }

    #[test]
    fn test_dependents_edge_orders_like_dependency() {
        // Scenario C: the edge is declared on A via `before`, not on B
        static A: UpdateMethod = UpdateMethod {
            name: "produce",
            stage: stages::GAMEPLAY,
            after: &[],
            before: &["B::consume"],
        };
        static B: UpdateMethod = UpdateMethod::new("consume", stages::BEFORE_RENDER);
        let fixture = build(&[("B", &B, "base"), ("A", &A, "base")]);
        let buckets = fixture.graph.build_task_order(|_| true).unwrap();
        let names = flatten(&buckets, &[stages::GAMEPLAY, stages::BEFORE_RENDER]);
        assert_eq!(names, vec!["A::produce", "B::consume"]);
    }

    #[test]
    fn test_cycle_is_fatal_and_deterministic() {
        // Scenario D: A -> B -> C -> A
        static A: UpdateMethod = UpdateMethod {
            name: "a",
            stage: stages::GAMEPLAY,
            after: &["C::c"],
            before: &[],
        };
        static B: UpdateMethod = UpdateMethod {
            name: "b",
            stage: stages::GAMEPLAY,
            after: &["A::a"],
            before: &[],
        };
        static C: UpdateMethod = UpdateMethod {
            name: "c",
            stage: stages::GAMEPLAY,
            after: &["B::b"],
            before: &[],
        };
        let fixture = build(&[("A", &A, "base"), ("B", &B, "base"), ("C", &C, "base")]);
        let first = fixture.graph.build_task_order(|_| true).unwrap_err();
        let second = fixture.graph.build_task_order(|_| true).unwrap_err();
        assert_eq!(
            first,
            GraphError::CycleDetected {
                unordered: 3,
                total: 3
            }
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_task_is_a_no_op() {
        let mut graph = DependencyGraph::new();
        let (first, _s1) = task("Input", &POLL, "base");
        let (second, _s2) = task("Input", &POLL, "base");
        assert!(graph.add_task(first));
        assert!(!graph.add_task(second));
        assert_eq!(graph.len(), 1);
        let buckets = graph.build_task_order(|_| true).unwrap();
        assert_eq!(buckets[stages::INPUT].len(), 1);
    }

    #[test]
    fn test_unresolved_edge_is_reported_not_a_cycle() {
        static LONELY: UpdateMethod = UpdateMethod {
            name: "run",
            stage: stages::GAMEPLAY,
            after: &["Ghost::haunt"],
            before: &[],
        };
        let fixture = build(&[("Lonely", &LONELY, "base")]);
        assert_eq!(
            fixture.graph.build_task_order(|_| true).unwrap_err(),
            GraphError::UnresolvedTask("Ghost::haunt".to_string())
        );
    }

    #[test]
    fn test_tag_filter_drops_exactly_that_bucket() {
        static SIM: UpdateMethod = UpdateMethod::new("simulate", stages::PHYSICS);
        static DRAW2: UpdateMethod = UpdateMethod::new("draw", stages::RENDER);
        let fixture = build(&[("Sim", &SIM, "physics"), ("Draw", &DRAW2, "render")]);

        let all = fixture.graph.build_task_order(|_| true).unwrap();
        assert!(all.contains_key(stages::PHYSICS));
        assert!(all.contains_key(stages::RENDER));

        let no_physics = fixture.graph.build_task_order(|tag| tag != "physics").unwrap();
        assert!(!no_physics.contains_key(stages::PHYSICS));
        // Surviving buckets are untouched
        let before: Vec<_> = all[stages::RENDER].iter().map(|t| t.name()).collect();
        let after: Vec<_> = no_physics[stages::RENDER].iter().map(|t| t.name()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_tie_break_is_discovery_order() {
        static FIRST: UpdateMethod = UpdateMethod::new("first", stages::GAMEPLAY);
        static SECOND: UpdateMethod = UpdateMethod::new("second", stages::GAMEPLAY);
        static THIRD: UpdateMethod = UpdateMethod::new("third", stages::GAMEPLAY);
        let fixture = build(&[
            ("Zeta", &FIRST, "base"),
            ("Alpha", &SECOND, "base"),
            ("Mid", &THIRD, "base"),
        ]);
        for _ in 0..3 {
            let buckets = fixture.graph.build_task_order(|_| true).unwrap();
            let names: Vec<_> = buckets[stages::GAMEPLAY].iter().map(|t| t.name()).collect();
            assert_eq!(names, vec!["Zeta::first", "Alpha::second", "Mid::third"]);
        }
    }

    #[test]
    fn test_topological_validity_with_cross_edges() {
        static A: UpdateMethod = UpdateMethod {
            name: "a",
            stage: stages::GAMEPLAY,
            after: &[],
            before: &["C::c", "D::d"],
        };
        static B: UpdateMethod = UpdateMethod::new("b", stages::GAMEPLAY);
        static C: UpdateMethod = UpdateMethod {
            name: "c",
            stage: stages::AFTER_RENDER,
            after: &["B::b"],
            before: &[],
        };
        static D: UpdateMethod = UpdateMethod {
            name: "d",
            stage: stages::AFTER_RENDER,
            after: &["C::c"],
            before: &[],
        };
        let fixture = build(&[
            ("D", &D, "base"),
            ("C", &C, "base"),
            ("B", &B, "base"),
            ("A", &A, "base"),
        ]);
        let buckets = fixture.graph.build_task_order(|_| true).unwrap();
        let names = flatten(&buckets, &[stages::GAMEPLAY, stages::AFTER_RENDER]);
        let pos = |n: &str| names.iter().position(|x| x == n).unwrap();
        // Every declared edge holds in the flattened order
        assert!(pos("A::a") < pos("C::c"));
        assert!(pos("A::a") < pos("D::d"));
        assert!(pos("B::b") < pos("C::c"));
        assert!(pos("C::c") < pos("D::d"));
        assert_eq!(names.len(), 4);
    }
}
