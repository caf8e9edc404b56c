//! Load screen scheduling.
//!
//! The scheduler owns the task queue and progress counters of a load screen.
//! It never touches resources itself; [`ResourceManager`](crate::ResourceManager)
//! pops tasks and reports back after running each one.
//!
//! Mode transitions:
//!
//! ```text
//! Instant --prepare--> Preparing --start--> Running --queue drained--> Instant
//!                                              |  ^
//!                                      prepare |  | start
//!                                              v  |
//!                                       RunningPrepareNext
//! ```
//!
//! Any mode other than `Instant` can be cancelled back to `Instant`.

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{AssetError, AssetResult};
use crate::manager::ResourceManager;
use crate::resource::ResourceId;

/// Default wall-clock time spent per [`ResourceManager::tick`].
pub const DEFAULT_TICK_BUDGET: Duration = Duration::from_millis(16);

/// Progress callback, receiving progress in `0.0..=1.0` and the current category.
pub type ProgressCallback = Box<dyn FnMut(f32, &str)>;

/// Deferred work executed on a load screen.
pub type TaskCallback = Box<dyn FnOnce(&mut ResourceManager)>;

/// Scheduler mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchedulerMode {
    /// Loads run synchronously on the caller's stack.
    #[default]
    Instant,
    /// Loads are queued; the load screen has not started.
    Preparing,
    /// The load screen is draining its queue.
    Running,
    /// A second batch is being queued while the first one drains.
    RunningPrepareNext,
}

impl SchedulerMode {
    /// Whether loads requested in this mode are queued instead of executed.
    pub fn defers_loads(self) -> bool {
        matches!(self, SchedulerMode::Preparing | SchedulerMode::RunningPrepareNext)
    }

    /// Whether ticks process queued tasks in this mode.
    pub fn is_running(self) -> bool {
        matches!(self, SchedulerMode::Running | SchedulerMode::RunningPrepareNext)
    }
}

pub(crate) enum Task {
    Load(ResourceId),
    Callback(TaskCallback),
    Category(String),
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Load(id) => f.debug_tuple("Load").field(id).finish(),
            Task::Callback(_) => f.write_str("Callback"),
            Task::Category(name) => f.debug_tuple("Category").field(name).finish(),
        }
    }
}

pub(crate) struct LoadScheduler {
    mode: SchedulerMode,
    tasks: VecDeque<Task>,
    /// Counted tasks queued since the screen was prepared.
    to_load: usize,
    /// Counted tasks finished, including failed loads.
    loaded: usize,
    min: f32,
    max: f32,
    /// Last reported progress; reports never go below it.
    progress: f32,
    category: String,
    tick_budget: Duration,
    callback: Option<ProgressCallback>,
}

impl LoadScheduler {
    pub(crate) fn new(tick_budget: Duration) -> Self {
        Self {
            mode: SchedulerMode::Instant,
            tasks: VecDeque::new(),
            to_load: 0,
            loaded: 0,
            min: 0.0,
            max: 1.0,
            progress: 0.0,
            category: String::new(),
            tick_budget,
            callback: None,
        }
    }

    pub(crate) fn mode(&self) -> SchedulerMode {
        self.mode
    }

    pub(crate) fn tick_budget(&self) -> Duration {
        self.tick_budget
    }

    pub(crate) fn set_tick_budget(&mut self, budget: Duration) {
        self.tick_budget = budget;
    }

    pub(crate) fn set_callback(&mut self, callback: Option<ProgressCallback>) {
        self.callback = callback;
    }

    pub(crate) fn have_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub(crate) fn to_load(&self) -> usize {
        self.to_load
    }

    pub(crate) fn loaded(&self) -> usize {
        self.loaded
    }

    pub(crate) fn category(&self) -> &str {
        &self.category
    }

    fn require_deferring(&self, operation: &'static str) -> AssetResult<()> {
        if self.mode.defers_loads() {
            Ok(())
        } else {
            Err(AssetError::InvalidMode {
                operation,
                mode: self.mode,
            })
        }
    }

    pub(crate) fn prepare(&mut self, min: f32, max: f32) -> AssetResult<()> {
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            return Err(AssetError::InvalidProgressRange { min, max });
        }

        match self.mode {
            SchedulerMode::Instant => {
                self.tasks.clear();
                self.to_load = 0;
                self.loaded = 0;
                self.min = min;
                self.max = max;
                self.progress = min;
                self.category.clear();
                self.mode = SchedulerMode::Preparing;
                Ok(())
            }
            SchedulerMode::Running => {
                // One continuous sweep: keep the counters and the lower bound.
                self.max = self.max.max(max);
                self.mode = SchedulerMode::RunningPrepareNext;
                Ok(())
            }
            mode => Err(AssetError::InvalidMode {
                operation: "prepare_load_screen",
                mode,
            }),
        }
    }

    /// Switch to `Running`. Returns `true` if there is nothing left to do.
    pub(crate) fn start(&mut self, category: Option<&str>) -> AssetResult<bool> {
        if !self.mode.defers_loads() {
            return Err(AssetError::InvalidMode {
                operation: "start_load_screen",
                mode: self.mode,
            });
        }

        if let Some(category) = category {
            self.category = category.to_string();
        } else if let Some(Task::Category(name)) = self.tasks.front() {
            self.category = name.clone();
            self.tasks.pop_front();
        }
        self.mode = SchedulerMode::Running;
        // A drained screen reports once, from `finish`.
        let done = self.to_load == self.loaded;
        if !done {
            self.report();
        }
        Ok(done)
    }

    pub(crate) fn push_load(&mut self, id: ResourceId, operation: &'static str) -> AssetResult<()> {
        self.require_deferring(operation)?;
        self.tasks.push_back(Task::Load(id));
        self.to_load += 1;
        Ok(())
    }

    pub(crate) fn push_callback(&mut self, callback: TaskCallback) -> AssetResult<()> {
        self.require_deferring("add_task")?;
        self.tasks.push_back(Task::Callback(callback));
        self.to_load += 1;
        Ok(())
    }

    pub(crate) fn push_category(&mut self, name: &str) -> AssetResult<()> {
        self.require_deferring("add_task_category")?;
        self.tasks.push_back(Task::Category(name.to_string()));
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub(crate) fn set_category(&mut self, name: String) {
        self.category = name;
        self.report();
    }

    pub(crate) fn complete_task(&mut self) {
        self.loaded += 1;
        self.report();
    }

    /// Current progress, clamped so it never decreases within a screen.
    pub(crate) fn progress(&self) -> f32 {
        let current = if self.loaded >= self.to_load {
            self.max
        } else {
            self.min + (self.max - self.min) * self.loaded as f32 / self.to_load as f32
        };
        current.max(self.progress)
    }

    fn report(&mut self) {
        self.progress = self.progress();
        if let Some(callback) = self.callback.as_mut() {
            callback(self.progress, &self.category);
        }
    }

    /// End a drained screen, firing the final callback at the upper bound.
    pub(crate) fn finish(&mut self) {
        self.tasks.clear();
        self.progress = self.max;
        if let Some(callback) = self.callback.as_mut() {
            callback(self.max, &self.category);
        }
        self.mode = SchedulerMode::Instant;
    }

    /// Drop all queued tasks, returning the resources that were waiting to load.
    pub(crate) fn cancel(&mut self) -> Vec<ResourceId> {
        let pending = self
            .tasks
            .drain(..)
            .filter_map(|task| match task {
                Task::Load(id) => Some(id),
                _ => None,
            })
            .collect();
        self.mode = SchedulerMode::Instant;
        pending
    }
}
