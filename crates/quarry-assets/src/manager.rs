//! The resource manager: registry, loaders and load screen in one place.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use quarry_core::profiling::{profile_function, profile_scope};

use crate::config::ResourceConfig;
use crate::device::{AudioDevice, RenderDevice};
use crate::error::{AssetError, AssetResult};
use crate::event::{ResourceEvent, ResourceEventBuffer};
use crate::handle::{Handle, Mesh, ResourceKind};
use crate::loader::{self, Devices};
use crate::registry::ResourceRegistry;
use crate::resource::{Resource, ResourceId, ResourceState, ResourceType};
use crate::scheduler::{LoadScheduler, SchedulerMode, Task, DEFAULT_TICK_BUDGET};

/// Coordinates resource registration, loading and load screens.
///
/// In `Instant` mode every load runs immediately. Between
/// [`prepare_load_screen`](Self::prepare_load_screen) and
/// [`start_load_screen`](Self::start_load_screen) loads are queued instead, and
/// [`tick`](Self::tick) drains the queue a time slice at a time.
///
/// # Example
///
/// ```ignore
/// let mut manager = ResourceManager::new(render, audio);
/// manager.add_dir("data", true)?;
/// manager.add_pak("data.pak", Some("key"))?;
///
/// manager.prepare_load_screen(0.0, 1.0)?;
/// manager.add_task_category("textures")?;
/// let grass = manager.load::<Texture>("grass.png")?;
/// manager.start_load_screen(None)?;
///
/// while manager.is_load_screen() {
///     manager.tick();
///     // draw the loading screen...
/// }
/// let texture = manager.payload(grass);
/// ```
pub struct ResourceManager {
    registry: ResourceRegistry,
    devices: Devices,
    scheduler: LoadScheduler,
    events: ResourceEventBuffer,
}

impl ResourceManager {
    /// Create a manager with no registered resources.
    pub fn new(render: Arc<dyn RenderDevice>, audio: Arc<dyn AudioDevice>) -> Self {
        Self {
            registry: ResourceRegistry::new(),
            devices: Devices { render, audio },
            scheduler: LoadScheduler::new(DEFAULT_TICK_BUDGET),
            events: ResourceEventBuffer::new(),
        }
    }

    /// Create a manager and mount the configured sources.
    pub fn with_config(
        render: Arc<dyn RenderDevice>,
        audio: Arc<dyn AudioDevice>,
        config: &ResourceConfig,
    ) -> AssetResult<Self> {
        let mut manager = Self::new(render, audio);
        manager.mount(config)?;
        Ok(manager)
    }

    /// Register the directories and archives of a config, in order.
    ///
    /// Stops at the first source that fails to register.
    pub fn mount(&mut self, config: &ResourceConfig) -> AssetResult<()> {
        self.scheduler.set_tick_budget(config.tick_budget);
        for dir in &config.directories {
            self.add_dir(&dir.path, dir.recursive)?;
        }
        for pak in &config.archives {
            self.add_pak(&pak.path, pak.key.as_deref())?;
        }
        Ok(())
    }

    /// Register every file of a directory.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>, recursive: bool) -> AssetResult<usize> {
        let dir = dir.as_ref();
        self.registry.add_dir(dir, recursive).inspect_err(|err| {
            tracing::error!("Failed to add directory '{}': {}", dir.display(), err);
        })
    }

    /// Open an archive and register its entries.
    pub fn add_pak(&mut self, path: impl AsRef<Path>, key: Option<&str>) -> AssetResult<usize> {
        let path = path.as_ref();
        self.registry.add_pak(path, key).inspect_err(|err| {
            tracing::error!("Failed to add pak '{}': {}", path.display(), err);
        })
    }

    /// Map a file extension to a resource type for later registrations.
    pub fn register_extension(&mut self, ext: &str, kind: ResourceType) {
        self.registry.register_extension(ext, kind);
    }

    /// Add a caller-built resource that is already loaded.
    ///
    /// Returns `None` if the filename is already registered.
    pub fn insert_loaded<T: ResourceKind>(&mut self, filename: &str, value: T::Payload) -> Option<Handle<T>> {
        self.registry
            .insert_loaded(filename, T::TYPE, T::wrap(value))
            .map(Handle::new)
    }

    /// The underlying registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Look up a resource that must exist with the requested type.
    pub fn get<T: ResourceKind>(&self, filename: &str) -> AssetResult<Handle<T>> {
        self.registry.get(filename)
    }

    /// Look up an optional resource.
    pub fn try_get<T: ResourceKind>(&self, filename: &str) -> Option<Handle<T>> {
        self.registry.try_get(filename)
    }

    /// Borrow the record behind a handle.
    pub fn resource<T: ResourceKind>(&self, handle: Handle<T>) -> &Resource {
        self.registry.resource(handle)
    }

    /// Load state of a resource.
    pub fn state<T: ResourceKind>(&self, handle: Handle<T>) -> ResourceState {
        self.registry.resource(handle).state()
    }

    /// The decoded value, once loaded.
    ///
    /// Meshes also expose their metadata after [`load_mesh_metadata`](Self::load_mesh_metadata).
    pub fn payload<T: ResourceKind>(&self, handle: Handle<T>) -> Option<&T::Payload> {
        T::payload(self.registry.resource(handle).payload())
    }

    /// Path used in messages for a resource.
    pub fn display_path<T: ResourceKind>(&self, handle: Handle<T>) -> String {
        self.registry.display_path(handle)
    }

    /// Load a resource now, or queue it while a load screen is being prepared.
    ///
    /// Fails if the resource is missing, has another type, or fails to decode
    /// while loading immediately. Queued failures are reported through events.
    pub fn load<T: ResourceKind>(&mut self, filename: &str) -> AssetResult<Handle<T>> {
        let handle = self.registry.get::<T>(filename)?;
        self.request(handle.id(), "load")?;
        Ok(handle)
    }

    /// Like [`load`](Self::load), returning `None` for missing resources.
    ///
    /// A decode failure still returns the handle; the resource stays `NotLoaded`.
    pub fn try_load<T: ResourceKind>(&mut self, filename: &str) -> Option<Handle<T>> {
        let handle = self.registry.try_get::<T>(filename)?;
        // Failures are already logged and pushed as events.
        let _ = self.request(handle.id(), "try_load");
        Some(handle)
    }

    /// Load a resource immediately, whatever the scheduler mode.
    pub fn load_instant<T: ResourceKind>(&mut self, filename: &str) -> AssetResult<Handle<T>> {
        let handle = self.registry.get::<T>(filename)?;
        self.ensure_loaded(handle.id())?;
        Ok(handle)
    }

    /// Like [`load_instant`](Self::load_instant), returning `None` for missing resources.
    pub fn try_load_instant<T: ResourceKind>(&mut self, filename: &str) -> Option<Handle<T>> {
        let handle = self.registry.try_get::<T>(filename)?;
        let _ = self.ensure_loaded(handle.id());
        Some(handle)
    }

    /// Load an already looked up resource, honouring the scheduler mode.
    pub fn load_handle<T: ResourceKind>(&mut self, handle: Handle<T>) -> AssetResult<()> {
        self.request(handle.id(), "load_handle")
    }

    /// Decode only the header and attachment points of a mesh.
    ///
    /// Always runs immediately. A later full load reuses the metadata, which is
    /// available through [`payload`](Self::payload) in the meantime.
    pub fn load_mesh_metadata(&mut self, filename: &str) -> AssetResult<Handle<Mesh>> {
        let handle = self.registry.get::<Mesh>(filename)?;
        loader::load_mesh_metadata(&mut self.registry, handle.id()).inspect_err(|err| {
            tracing::error!("{}", err);
        })?;
        Ok(handle)
    }

    fn request(&mut self, id: ResourceId, operation: &'static str) -> AssetResult<()> {
        if !self.scheduler.mode().defers_loads() {
            return self.ensure_loaded(id);
        }

        let resource = self.registry.resource_mut(id);
        if resource.state != ResourceState::NotLoaded {
            return Ok(());
        }
        resource.state = ResourceState::Loading;
        self.scheduler.push_load(id, operation)
    }

    /// Decode a resource unless it is already loaded.
    fn ensure_loaded(&mut self, id: ResourceId) -> AssetResult<()> {
        if self.registry.resource(id).state() == ResourceState::Loaded {
            return Ok(());
        }

        let kind = self.registry.resource(id).kind();
        match loader::load_resource(&mut self.registry, &self.devices, id) {
            Ok(()) => {
                tracing::trace!("Loaded {} '{}'", kind, self.registry.display_path(id));
                self.events.push(ResourceEvent::Loaded { id, kind });
                Ok(())
            }
            Err(err) => {
                tracing::error!("Failed to load {}: {}", kind, err);
                self.events.push(ResourceEvent::LoadFailed {
                    id,
                    kind,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Begin queuing a load screen whose progress sweeps `min..=max`.
    ///
    /// While a screen is running this starts a second batch on the same queue;
    /// progress continues from where it is and never moves backwards.
    pub fn prepare_load_screen(&mut self, min: f32, max: f32) -> AssetResult<()> {
        let previous = self.scheduler.mode();
        self.scheduler.prepare(min, max)?;
        if previous == SchedulerMode::Running {
            tracing::debug!("Preparing next load screen batch");
        } else {
            tracing::debug!("Preparing load screen ({}..{})", min, max);
        }
        Ok(())
    }

    /// Queue a label shown while the following tasks run.
    pub fn add_task_category(&mut self, name: &str) -> AssetResult<()> {
        self.scheduler.push_category(name)
    }

    /// Queue arbitrary work. Counts as one unit of progress.
    pub fn add_task(&mut self, task: impl FnOnce(&mut ResourceManager) + 'static) -> AssetResult<()> {
        self.scheduler.push_callback(Box::new(task))
    }

    /// Start draining the queue.
    ///
    /// `category` overrides a leading [`add_task_category`](Self::add_task_category).
    pub fn start_load_screen(&mut self, category: Option<&str>) -> AssetResult<()> {
        let done = self.scheduler.start(category)?;
        tracing::info!(
            "Load screen started ({} tasks)",
            self.scheduler.to_load() - self.scheduler.loaded()
        );
        if done {
            self.finish_load_screen();
        }
        Ok(())
    }

    /// Drop all queued tasks and return to `Instant` mode.
    ///
    /// With `cleanup`, resources that were queued go back to `NotLoaded`.
    /// Without it they stay `Loading`: immediate loads still decode them, but
    /// queued loads skip them.
    pub fn cancel_load_screen(&mut self, cleanup: bool) {
        if self.scheduler.mode() == SchedulerMode::Instant {
            return;
        }

        let pending = self.scheduler.cancel();
        if cleanup {
            for id in &pending {
                let resource = self.registry.resource_mut(*id);
                if resource.state == ResourceState::Loading {
                    resource.state = ResourceState::NotLoaded;
                }
            }
        }
        tracing::info!("Load screen cancelled ({} queued loads dropped)", pending.len());
    }

    /// Set the callback that receives load screen progress.
    pub fn set_progress_callback(&mut self, callback: impl FnMut(f32, &str) + 'static) {
        self.scheduler.set_callback(Some(Box::new(callback)));
    }

    /// Remove the progress callback.
    pub fn clear_progress_callback(&mut self) {
        self.scheduler.set_callback(None);
    }

    /// Set the wall-clock time spent per [`tick`](Self::tick).
    pub fn set_tick_budget(&mut self, budget: Duration) {
        self.scheduler.set_tick_budget(budget);
    }

    /// Run queued tasks until the tick budget is spent.
    ///
    /// Runs at least one task per call. Does nothing unless a load screen is
    /// running. Returns `true` while the load screen is still active.
    pub fn tick(&mut self) -> bool {
        profile_function!();
        if !self.scheduler.mode().is_running() {
            return self.is_load_screen();
        }

        let started = Instant::now();
        let budget = self.scheduler.tick_budget();
        while let Some(task) = self.scheduler.pop() {
            self.run_task(task);
            if started.elapsed() >= budget {
                break;
            }
        }

        if !self.scheduler.have_tasks() && self.scheduler.mode() == SchedulerMode::Running {
            self.finish_load_screen();
        }
        self.is_load_screen()
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Category(name) => {
                tracing::debug!("Load screen category '{}'", name);
                self.scheduler.set_category(name);
            }
            Task::Load(id) => {
                profile_scope!("load_task");
                // Errors are logged and pushed as events; the task still counts.
                let _ = self.ensure_loaded(id);
                self.scheduler.complete_task();
            }
            Task::Callback(callback) => {
                profile_scope!("callback_task");
                callback(self);
                // The callback may have cancelled the screen.
                if self.scheduler.mode().is_running() {
                    self.scheduler.complete_task();
                }
            }
        }
    }

    fn finish_load_screen(&mut self) {
        tracing::info!("Load screen finished ({} tasks)", self.scheduler.loaded());
        self.scheduler.finish();
    }

    /// Tick until the running load screen completes.
    ///
    /// In `RunningPrepareNext` mode this stops once the queue is empty, since
    /// the screen only ends after the next batch is started.
    pub fn run_load_screen(&mut self) -> AssetResult<()> {
        let mode = self.scheduler.mode();
        if !mode.is_running() {
            return Err(AssetError::InvalidMode {
                operation: "run_load_screen",
                mode,
            });
        }

        while self.tick() {
            if !self.scheduler.have_tasks() {
                break;
            }
        }
        Ok(())
    }

    /// Current scheduler mode.
    pub fn mode(&self) -> SchedulerMode {
        self.scheduler.mode()
    }

    /// Check if any tasks are queued.
    pub fn have_tasks(&self) -> bool {
        self.scheduler.have_tasks()
    }

    /// Number of progress-counted tasks queued for the current load screen.
    pub fn load_tasks_count(&self) -> usize {
        self.scheduler.to_load()
    }

    /// Check if a load screen is being prepared or is running.
    pub fn is_load_screen(&self) -> bool {
        self.scheduler.mode() != SchedulerMode::Instant
    }

    /// Last progress value of the current or most recent load screen.
    pub fn progress(&self) -> f32 {
        self.scheduler.progress()
    }

    /// Label of the current load screen category.
    pub fn category(&self) -> &str {
        self.scheduler.category()
    }

    /// Drain the load events produced since the last call.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ResourceEvent> + '_ {
        self.events.drain()
    }
}
