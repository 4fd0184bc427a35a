//! Dispatch kernel
//!
//! One handler loop drains a FIFO queue of events and launches a task per
//! event. Each task runs [`Kernel::dispatch`]: parse the text, look the
//! command up under the dispatch lock, release the lock, run the handler,
//! flush replies to the event's origin and signal completion.
//!
//! The dispatch lock is the command-registry mutex. It makes lookup atomic
//! with respect to module loading and is never held while a handler runs, so
//! events execute in parallel.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use zbot_core::{error_line, Error, Result};
use zbot_store::Store;

use crate::bus::Bus;
use crate::config::Config;
use crate::event::Event;
use crate::module::{Module, ModuleCatalog};
use crate::registry::{CommandFn, CommandRegistry};
use crate::task::{panic_message, Task, Tasks};

struct KernelInner {
    config: Config,
    store: Arc<Store>,
    commands: Mutex<CommandRegistry>,
    catalog: ModuleCatalog,
    modules: Mutex<BTreeMap<String, Module>>,
    packages: Mutex<Vec<String>>,
    queue: Mutex<VecDeque<Option<Event>>>,
    queue_ready: Condvar,
    stopped: Mutex<bool>,
    stopped_cond: Condvar,
    running: AtomicBool,
    tasks: Tasks,
    bus: Bus,
    started: Instant,
}

/// The event kernel. Clones are handles to the same kernel.
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<KernelInner>,
}

/// Non-owning kernel handle for closures the kernel itself stores.
#[derive(Clone)]
pub struct WeakKernel {
    inner: Weak<KernelInner>,
}

impl WeakKernel {
    /// The kernel, if it is still alive.
    pub fn upgrade(&self) -> Option<Kernel> {
        self.inner.upgrade().map(|inner| Kernel { inner })
    }

    /// Like [`upgrade`](Self::upgrade), as a command failure when gone.
    pub fn get(&self) -> Result<Kernel> {
        self.upgrade()
            .ok_or_else(|| Error::command("kernel has been dropped"))
    }
}

impl Kernel {
    /// Create a kernel over `store` with the shipped modules in its catalog.
    pub fn new(config: Config, store: Arc<Store>) -> Self {
        let catalog = ModuleCatalog::new();
        crate::modules::register(&catalog);
        Self::with_catalog(config, store, catalog)
    }

    /// Create a kernel with an explicit module catalog.
    pub fn with_catalog(config: Config, store: Arc<Store>, catalog: ModuleCatalog) -> Self {
        let packages = config.packages.clone();
        Self {
            inner: Arc::new(KernelInner {
                config,
                store,
                commands: Mutex::new(CommandRegistry::new()),
                catalog,
                modules: Mutex::new(BTreeMap::new()),
                packages: Mutex::new(packages),
                queue: Mutex::new(VecDeque::new()),
                queue_ready: Condvar::new(),
                stopped: Mutex::new(false),
                stopped_cond: Condvar::new(),
                running: AtomicBool::new(false),
                tasks: Tasks::new(),
                bus: Bus::new(),
                started: Instant::now(),
            }),
        }
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakKernel {
        WeakKernel {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The object store
    pub fn store(&self) -> &Arc<Store> {
        &self.inner.store
    }

    /// Reply outputs
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Task launcher and live-task table
    pub fn tasks(&self) -> &Tasks {
        &self.inner.tasks
    }

    /// Module catalog
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.inner.catalog
    }

    /// Time since the kernel was created
    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Sorted names of registered commands
    pub fn commands(&self) -> Vec<String> {
        self.inner.commands.lock().names()
    }

    // ========================================================================
    // Commands and modules
    // ========================================================================

    /// Register a single command, replacing any earlier handler of that name.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        let handler: CommandFn = Arc::new(handler);
        self.inner.commands.lock().insert(name, handler);
    }

    /// Loaded modules, by qualified name
    pub fn modules(&self) -> Vec<Module> {
        self.inner.modules.lock().values().cloned().collect()
    }

    /// Package prefixes used to resolve short module names
    pub fn packages(&self) -> Vec<String> {
        self.inner.packages.lock().clone()
    }

    /// Build the module registered as `name` and merge its commands.
    pub fn load_module(&self, name: &str) -> Result<Module> {
        let factory = self
            .inner
            .catalog
            .resolve(name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))?;
        let module = factory(self);
        self.inner
            .commands
            .lock()
            .extend(module.commands().iter().cloned());
        debug!(module = %name, commands = module.commands().len(), "module loaded");
        self.inner
            .modules
            .lock()
            .insert(name.to_string(), module.clone());
        Ok(module)
    }

    /// Load each named module and run its initializer.
    ///
    /// Short names are tried under every known package, then as given.
    /// Names that resolve nowhere are skipped. Initializers run on their own
    /// tasks; this returns once all of them have finished.
    pub fn init<S: AsRef<str>>(&self, names: &[S]) -> Vec<Module> {
        let packages = self.packages();
        let mut modules = Vec::new();
        let mut inits: Vec<Task> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let qualified = packages
                .iter()
                .map(|package| format!("{}.{}", package, name))
                .find(|qualified| self.inner.catalog.contains(qualified))
                .or_else(|| self.inner.catalog.contains(name).then(|| name.to_string()));
            let Some(qualified) = qualified else {
                debug!(module = %name, "no such module, skipping");
                continue;
            };
            let module = match self.load_module(&qualified) {
                Ok(module) => module,
                Err(e) => {
                    warn!(module = %qualified, "{}", error_line(&e));
                    continue;
                }
            };
            if let Some(init) = module.init().cloned() {
                let kernel = self.clone();
                let task_name = format!("{}.init", qualified);
                inits.push(self.inner.tasks.launch(task_name, move || {
                    if let Err(e) = init(&kernel) {
                        error!(module = %qualified, "init failed: {}", error_line(&e));
                    }
                }));
            }
            modules.push(module);
        }
        for task in inits {
            task.join();
        }
        modules
    }

    /// Load every module of each package and remember the packages.
    pub fn walk<S: AsRef<str>>(&self, packages: &[S]) -> Vec<Module> {
        let mut modules = Vec::new();
        for package in packages {
            let package = package.as_ref();
            let names = self.inner.catalog.submodules(package);
            if names.is_empty() {
                continue;
            }
            for name in names {
                match self.load_module(&name) {
                    Ok(module) => modules.push(module),
                    Err(e) => warn!(module = %name, "{}", error_line(&e)),
                }
            }
            let mut known = self.inner.packages.lock();
            if !known.iter().any(|p| p == package) {
                known.push(package.to_string());
            }
        }
        modules
    }

    // ========================================================================
    // Queue and dispatch
    // ========================================================================

    /// Queue an event for the handler loop.
    pub fn submit(&self, event: Event) {
        self.push(Some(event));
    }

    fn push(&self, item: Option<Event>) {
        self.inner.queue.lock().push_back(item);
        self.inner.queue_ready.notify_one();
    }

    /// Run one event to completion on the calling thread.
    ///
    /// Handler errors and panics are logged; replies gathered before the
    /// failure are still flushed and the event always becomes ready.
    pub fn dispatch(&self, event: &Event) {
        event.parse();
        let cmd = event.cmd();
        let handler = self.inner.commands.lock().get(&cmd);
        match handler {
            Some(handler) => {
                match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!(command = %cmd, "{}", error_line(&e)),
                    Err(payload) => {
                        error!(command = %cmd, "handler panicked: {}", panic_message(&*payload))
                    }
                }
            }
            None => debug!(command = %cmd, "no such command"),
        }
        self.flush(event);
        event.set_ready();
    }

    fn flush(&self, event: &Event) {
        let Some(origin) = event.origin() else {
            return;
        };
        let channel = event.channel();
        for txt in event.result() {
            if !self.inner.bus.say(&origin, &channel, &txt) {
                debug!(origin = %origin, "no output for origin, dropping replies");
                return;
            }
        }
    }

    /// Drain the queue until the stop sentinel arrives.
    pub fn handler_loop(&self) {
        loop {
            let item = {
                let mut queue = self.inner.queue.lock();
                loop {
                    if let Some(item) = queue.pop_front() {
                        break item;
                    }
                    self.inner.queue_ready.wait(&mut queue);
                }
            };
            let Some(event) = item else {
                debug!("handler loop stopped");
                break;
            };
            let txt = event.txt();
            let Some(name) = txt.split_whitespace().next() else {
                event.set_ready();
                continue;
            };
            let kernel = self.clone();
            let pending = event.clone();
            let task = self
                .inner
                .tasks
                .launch(name, move || kernel.dispatch(&pending));
            if !task.is_spawned() {
                event.set_ready();
            }
        }
        self.inner.running.store(false, AtomicOrdering::SeqCst);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Initialize the configured modules and launch the handler loop.
    ///
    /// Fails with `StoreUnconfigured` when the store has no working directory.
    /// Fails with `CommandFailed` while a handler loop is already running.
    pub fn start(&self) -> Result<Task> {
        self.inner.store.workdir()?;
        if self.inner.running.swap(true, AtomicOrdering::SeqCst) {
            return Err(Error::command("kernel already started"));
        }
        *self.inner.stopped.lock() = false;
        let mods = self.inner.config.mods.clone();
        let loaded = self.init(&mods);
        info!(modules = loaded.len(), commands = self.commands().len(), "kernel started");
        let kernel = self.clone();
        let handler = self.inner.tasks.launch("handler", move || kernel.handler_loop());
        if !handler.is_spawned() {
            self.inner.running.store(false, AtomicOrdering::SeqCst);
        }
        Ok(handler)
    }

    /// Stop the handler loop after the events already queued.
    pub fn stop(&self) {
        let mut stopped = self.inner.stopped.lock();
        *stopped = true;
        self.push(None);
        self.inner.stopped_cond.notify_all();
    }

    /// Whether [`stop`](Self::stop) has been called
    pub fn is_stopped(&self) -> bool {
        *self.inner.stopped.lock()
    }

    /// Block until the kernel is stopped.
    pub fn wait(&self) {
        let mut stopped = self.inner.stopped.lock();
        while !*stopped {
            self.inner.stopped_cond.wait(&mut stopped);
        }
    }

    /// Dispatch `txt` synchronously and return the completed event.
    pub fn cmd(&self, txt: impl Into<String>) -> Event {
        let event = Event::new(txt);
        self.dispatch(&event);
        event
    }

    /// Queue `txt` from `origin` and return the event to wait on.
    pub fn submit_text(&self, origin: &str, txt: impl Into<String>) -> Event {
        let event = Event::new(txt).with_origin(origin);
        self.submit(event.clone());
        event
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("packages", &self.packages())
            .field("commands", &self.commands().len())
            .field("tasks", &self.inner.tasks)
            .finish()
    }
}
