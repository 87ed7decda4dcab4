//! Dual-clock system scheduler
//!
//! Discovered systems are turned into tasks, linearized per clock, and
//! executed across two timing domains: a variable-rate clock driven by the
//! caller's frame loop and a fixed-rate clock driven by a dedicated
//! background thread. Each clock has its own worker pool and queue; tasks
//! in main-thread-only stages bypass the pools and run inline on the
//! driving thread.
//!
//! A single mutex guards the bucket cache and both queues, so dispatch is
//! mutually exclusive across clocks while execution on workers proceeds
//! concurrently once items are queued.

use crate::core::config::SchedulerConfig;
use crate::ecs::graph::{DependencyGraph, GraphError, StageBuckets};
use crate::ecs::system::{System, SystemRegistration};
use crate::ecs::task::{Task, TaskItem};
use crate::ecs::update_groups::{Clock, GroupRegistry};
use crate::ecs::world::World;
use crate::foundation::time::FixedStep;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Bound on condition-variable waits; keeps workers and the barrier
/// responsive to shutdown without busy-spinning
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Errors surfaced while building or running the scheduler
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Structural error in the task dependency graph
    #[error("task graph error: {0}")]
    Graph(#[from] GraphError),

    /// A scheduler thread could not be spawned
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Bucket cache and task queues for both clocks, guarded as one unit
struct DispatchState {
    variable_buckets: StageBuckets,
    fixed_buckets: StageBuckets,
    normal_queue: VecDeque<TaskItem>,
    fixed_queue: VecDeque<TaskItem>,
}

impl DispatchState {
    fn buckets(&self, clock: Clock) -> &StageBuckets {
        match clock {
            Clock::Variable => &self.variable_buckets,
            Clock::Fixed => &self.fixed_buckets,
        }
    }

    fn queue_mut(&mut self, clock: Clock) -> &mut VecDeque<TaskItem> {
        match clock {
            Clock::Variable => &mut self.normal_queue,
            Clock::Fixed => &mut self.fixed_queue,
        }
    }
}

/// In-flight counter plus condition variable for the fixed clock
///
/// The counter is incremented at enqueue time and decremented once a worker
/// finishes invoking the task, so a zero counter implies the fixed queue
/// has drained as well.
struct CompletionBarrier {
    in_flight: Mutex<usize>,
    drained: Condvar,
}

impl CompletionBarrier {
    fn new() -> Self {
        Self {
            in_flight: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    fn add(&self, count: usize) {
        *self.in_flight.lock().unwrap() += count;
    }

    fn task_finished(&self) {
        let mut in_flight = self.in_flight.lock().unwrap();
        *in_flight -= 1;
        if *in_flight == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_for_drain(&self, running: &AtomicBool) {
        let mut in_flight = self.in_flight.lock().unwrap();
        while *in_flight > 0 {
            if !running.load(Ordering::Acquire) {
                break;
            }
            let (guard, _) = self.drained.wait_timeout(in_flight, WAIT_SLICE).unwrap();
            in_flight = guard;
        }
    }

    fn in_flight(&self) -> usize {
        *self.in_flight.lock().unwrap()
    }
}

/// State shared between the driving threads and the worker pools
struct Shared {
    registry: Arc<GroupRegistry>,
    world: Arc<World>,
    dispatch: Mutex<DispatchState>,
    normal_ready: Condvar,
    fixed_ready: Condvar,
    barrier: CompletionBarrier,
    running: AtomicBool,
}

impl Shared {
    /// Walk the global stage order for one clock and dispatch every bucket
    ///
    /// Main-thread-only buckets run inline, in order, on the calling
    /// thread and therefore act as completion barriers; all other buckets
    /// are enqueued for the clock's workers. Workers are signalled after
    /// the walk. Dispatch order always follows the global stage order, but
    /// worker-executed tasks from different stages may overlap; callers
    /// needing completion-before-start encode a task edge or use a
    /// main-thread stage.
    fn dispatch_clock(&self, clock: Clock, dt: f32) {
        for group in self.registry.global_order() {
            if group.clock() != clock {
                continue;
            }

            if group.main_thread_only() {
                let bucket = {
                    let state = self.dispatch.lock().unwrap();
                    state.buckets(clock).get(group.name()).cloned()
                };
                if let Some(tasks) = bucket {
                    for task in &tasks {
                        task.invoke(dt);
                    }
                }
            } else {
                let mut state = self.dispatch.lock().unwrap();
                let items: Vec<TaskItem> = state
                    .buckets(clock)
                    .get(group.name())
                    .map(|tasks| {
                        tasks
                            .iter()
                            .map(|task| TaskItem {
                                task: Arc::clone(task),
                                dt,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                if !items.is_empty() {
                    if clock == Clock::Fixed {
                        self.barrier.add(items.len());
                    }
                    state.queue_mut(clock).extend(items);
                }
            }
        }

        match clock {
            Clock::Variable => self.normal_ready.notify_all(),
            Clock::Fixed => self.fixed_ready.notify_all(),
        }
    }

    /// One full fixed tick: dispatch, drain, synchronize
    fn run_fixed_tick(&self, dt: f32) {
        self.dispatch_clock(Clock::Fixed, dt);
        self.barrier.wait_for_drain(&self.running);
        self.world.end_fixed_tick();
    }

    /// Worker thread body for one clock's pool
    fn worker_loop(&self, clock: Clock) {
        loop {
            let mut state = self.dispatch.lock().unwrap();
            let item = loop {
                if let Some(item) = state.queue_mut(clock).pop_front() {
                    break Some(item);
                }
                if !self.running.load(Ordering::Acquire) {
                    break None;
                }
                let ready = match clock {
                    Clock::Variable => &self.normal_ready,
                    Clock::Fixed => &self.fixed_ready,
                };
                let (guard, _) = ready.wait_timeout(state, WAIT_SLICE).unwrap();
                state = guard;
            };
            drop(state);

            match item {
                Some(item) => {
                    item.task.invoke(item.dt);
                    if clock == Clock::Fixed {
                        self.barrier.task_finished();
                    }
                }
                None => break,
            }
        }
        log::debug!("{:?}-clock worker exiting", clock);
    }

    /// Fixed-clock driver thread body
    fn fixed_driver_loop(&self, rate: f32) {
        log::debug!("fixed clock running at {} Hz", rate);
        let mut step = FixedStep::from_rate(rate);
        while self.running.load(Ordering::Acquire) {
            if let Some(dt) = step.tick() {
                self.run_fixed_tick(dt);
            } else {
                thread::sleep(step.remaining().min(WAIT_SLICE));
            }
        }
    }
}

/// The dual-clock system scheduler
///
/// Owns both worker pools and the fixed-clock driver thread. System
/// instances are owned by the world; the scheduler holds only weak
/// references through its tasks.
pub struct SystemScheduler {
    shared: Arc<Shared>,
    config: SchedulerConfig,
    variable_graph: DependencyGraph,
    fixed_graph: DependencyGraph,
    registered_types: HashSet<&'static str>,
    fixed_driver: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl SystemScheduler {
    /// Create a scheduler and spawn its worker pools
    ///
    /// The group registry is frozen here; stages registered afterwards
    /// would never be walked. The fixed-clock driver thread is not started
    /// until [`SystemScheduler::start`].
    pub fn new(
        world: Arc<World>,
        registry: GroupRegistry,
        config: &SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        let shared = Arc::new(Shared {
            registry: Arc::new(registry),
            world,
            dispatch: Mutex::new(DispatchState {
                variable_buckets: StageBuckets::new(),
                fixed_buckets: StageBuckets::new(),
                normal_queue: VecDeque::new(),
                fixed_queue: VecDeque::new(),
            }),
            normal_ready: Condvar::new(),
            fixed_ready: Condvar::new(),
            barrier: CompletionBarrier::new(),
            running: AtomicBool::new(true),
        });

        let mut workers = Vec::with_capacity(config.normal_worker_count + config.fixed_worker_count);
        for index in 0..config.normal_worker_count {
            let shared_clone = Arc::clone(&shared);
            workers.push(
                thread::Builder::new()
                    .name(format!("normal-worker-{index}"))
                    .spawn(move || shared_clone.worker_loop(Clock::Variable))?,
            );
        }
        // Fixed-clock workers are the time-critical pool
        for index in 0..config.fixed_worker_count {
            let shared_clone = Arc::clone(&shared);
            workers.push(
                thread::Builder::new()
                    .name(format!("fixed-worker-{index}"))
                    .spawn(move || shared_clone.worker_loop(Clock::Fixed))?,
            );
        }

        log::info!(
            "scheduler ready: {} normal worker(s), {} fixed worker(s)",
            config.normal_worker_count,
            config.fixed_worker_count
        );

        Ok(Self {
            shared,
            config: config.clone(),
            variable_graph: DependencyGraph::new(),
            fixed_graph: DependencyGraph::new(),
            registered_types: HashSet::new(),
            fixed_driver: None,
            workers,
        })
    }

    /// Register candidate system types from a discovery pass
    ///
    /// Types seen in an earlier pass are skipped without constructing a
    /// second instance. Both clock orderings are rebuilt afterwards; a
    /// structural error aborts setup before any tick runs.
    pub fn register_systems(
        &mut self,
        candidates: &[SystemRegistration],
    ) -> Result<(), SchedulerError> {
        for registration in candidates {
            if !self.registered_types.insert(registration.type_name) {
                log::debug!("system type {} already registered", registration.type_name);
                continue;
            }
            let system = (registration.construct)(&self.shared.world);
            self.install_system(registration.type_name, &system);
        }
        self.refresh_task_order()
    }

    /// Register a pre-built system instance under an explicit type name
    pub fn register_system_instance(
        &mut self,
        type_name: &'static str,
        system: Arc<dyn System>,
    ) -> Result<(), SchedulerError> {
        if self.registered_types.insert(type_name) {
            self.install_system(type_name, &system);
        }
        self.refresh_task_order()
    }

    fn install_system(&mut self, type_name: &'static str, system: &Arc<dyn System>) {
        self.shared.world.add_system(Arc::clone(system));

        let mut method_count = 0usize;
        for method in system.update_methods() {
            let Some(group) = self.shared.registry.lookup(method.stage) else {
                log::warn!(
                    "skipping {}::{}: unknown stage '{}'",
                    type_name,
                    method.name,
                    method.stage
                );
                continue;
            };
            let graph = match group.clock() {
                Clock::Variable => &mut self.variable_graph,
                Clock::Fixed => &mut self.fixed_graph,
            };
            if graph.add_task(Task::new(type_name, system, method)) {
                method_count += 1;
            }
        }
        log::info!(
            "registered system {} with {} update method(s)",
            type_name,
            method_count
        );
    }

    /// Rebuild the linear task order and call `init` on every system
    pub fn initialize_all_systems(&mut self) -> Result<(), SchedulerError> {
        self.refresh_task_order()?;
        self.shared.world.init_systems();
        Ok(())
    }

    /// Re-linearize both graphs and refresh the cached stage buckets
    ///
    /// Also the way tag changes become visible to dispatch: the bucket
    /// filter consults the world's current tag set.
    pub fn refresh_task_order(&self) -> Result<(), SchedulerError> {
        let world = Arc::clone(&self.shared.world);
        let variable_buckets = self.variable_graph.build_task_order(|tag| world.wants(tag))?;
        let fixed_buckets = self.fixed_graph.build_task_order(|tag| world.wants(tag))?;

        let mut state = self.shared.dispatch.lock().unwrap();
        state.variable_buckets = variable_buckets;
        state.fixed_buckets = fixed_buckets;
        Ok(())
    }

    /// Start the fixed-clock driver thread
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.fixed_driver.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let rate = self.config.fixed_update_rate;
        self.fixed_driver = Some(
            thread::Builder::new()
                .name("fixed-clock".to_string())
                .spawn(move || shared.fixed_driver_loop(rate))?,
        );
        Ok(())
    }

    /// Dispatch one variable-rate frame
    ///
    /// Main-thread-only stages run inline on the calling thread; everything
    /// else is handed to the normal worker pool. Returns without waiting
    /// for worker completion; the caller's loop paces the next frame.
    pub fn update_normal(&self, dt: f32) {
        self.shared.dispatch_clock(Clock::Variable, dt);
    }

    /// Run one fixed tick to completion
    ///
    /// Dispatches the fixed stages, blocks until the whole batch has
    /// drained, then runs the world's end-of-tick sync hook and advances
    /// the fixed frame counter. The driver thread calls this once per
    /// elapsed step; it is public so embedders and tests can step the
    /// fixed clock deterministically.
    pub fn update_fixed(&self, dt: f32) {
        self.shared.run_fixed_tick(dt);
    }

    /// The world this scheduler dispatches for
    pub fn world(&self) -> &Arc<World> {
        &self.shared.world
    }

    /// The frozen stage registry
    pub fn registry(&self) -> &GroupRegistry {
        &self.shared.registry
    }

    /// Stop both clocks and join every scheduler thread
    ///
    /// Tasks already dequeued run to completion; nothing is interrupted.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.shared.normal_ready.notify_all();
        self.shared.fixed_ready.notify_all();
        self.shared.barrier.drained.notify_all();

        if let Some(driver) = self.fixed_driver.take() {
            let _ = driver.join();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        log::info!("scheduler shutdown complete");
    }
}

impl Drop for SystemScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
