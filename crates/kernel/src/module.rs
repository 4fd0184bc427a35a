//! Modules and the module catalog
//!
//! A [`Module`] is a bundle of commands plus an optional initializer. Modules
//! are not discovered at runtime: each one is registered in a
//! [`ModuleCatalog`] under a qualified `package.module` name together with a
//! factory that builds it for a given kernel. Loading a module is a catalog
//! lookup followed by merging its commands into the command registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use zbot_core::Result;

use crate::event::Event;
use crate::kernel::Kernel;
use crate::registry::CommandFn;

/// Module initializer, run once per [`Kernel::init`] on its own task.
pub type InitFn = Arc<dyn Fn(&Kernel) -> Result<()> + Send + Sync>;

/// Builds a module for a kernel.
pub type ModuleFactory = Arc<dyn Fn(&Kernel) -> Module + Send + Sync>;

/// A loadable bundle of commands
#[derive(Clone)]
pub struct Module {
    name: String,
    version: String,
    commands: Vec<(String, CommandFn)>,
    init: Option<InitFn>,
}

impl Module {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            commands: Vec::new(),
            init: None,
        }
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a command handler.
    pub fn with_command<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        self.commands.push((name.into(), Arc::new(handler)));
        self
    }

    /// Set the initializer.
    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&Kernel) -> Result<()> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }

    /// Qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last component of the name
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Version string, empty when unset
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Commands in registration order
    pub fn commands(&self) -> &[(String, CommandFn)] {
        &self.commands
    }

    /// Command names in registration order
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Initializer, if any
    pub fn init(&self) -> Option<&InitFn> {
        self.init.as_ref()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("commands", &self.command_names())
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// Qualified module name to factory table. Clones share the table.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    factories: Arc<Mutex<BTreeMap<String, ModuleFactory>>>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any earlier one.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Kernel) -> Module + Send + Sync + 'static,
    {
        self.factories.lock().insert(name.into(), Arc::new(factory));
    }

    /// Factory registered under `name`
    pub fn resolve(&self, name: &str) -> Option<ModuleFactory> {
        self.factories.lock().get(name).cloned()
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.lock().contains_key(name)
    }

    /// All registered names in order
    pub fn names(&self) -> Vec<String> {
        self.factories.lock().keys().cloned().collect()
    }

    /// Direct submodules of `package`, e.g. `zbot.basic` for `zbot`.
    pub fn submodules(&self, package: &str) -> Vec<String> {
        let prefix = format!("{}.", package);
        self.factories
            .lock()
            .keys()
            .filter(|name| {
                name.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('.'))
            })
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("modules", &self.names())
            .finish()
    }
}
