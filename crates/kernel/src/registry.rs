//! Command registry
//!
//! Name to handler table. Updates are additive and the last registration of a
//! name wins. The registry itself is not synchronized; the kernel keeps it
//! behind the dispatch lock.

use std::collections::HashMap;
use std::sync::Arc;

use zbot_core::Result;

use crate::event::Event;

/// A command handler. Output goes through [`Event::reply`]; an `Err` is logged
/// by the dispatcher and never reaches the submitter.
pub type CommandFn = Arc<dyn Fn(&Event) -> Result<()> + Send + Sync>;

/// Live command table
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandFn>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, returning the handler it replaced.
    pub fn insert(&mut self, name: impl Into<String>, handler: CommandFn) -> Option<CommandFn> {
        self.commands.insert(name.into(), handler)
    }

    /// Merge a batch of commands, later entries winning.
    pub fn extend<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = (String, CommandFn)>,
    {
        self.commands.extend(commands);
    }

    /// Handler registered under `name`
    pub fn get(&self, name: &str) -> Option<CommandFn> {
        self.commands.get(name).cloned()
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Sorted command names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}
