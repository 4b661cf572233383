//! The registry contract and a table-backed registry.

use std::collections::{BTreeMap, BTreeSet};

use conch_types::{CmdDesc, Result};

use crate::command::{Command, CommandTable};
use crate::session::Session;
use crate::system::SystemCompleter;

/// An independently authored set of commands mounted into the shell.
pub trait Registry {
    /// Name shown as the registry's header in `help`.
    fn name(&self) -> &str;

    /// Canonical command names.
    fn command_names(&self) -> BTreeSet<String>;

    /// Snapshot of the alias map (alias -> canonical name).
    fn command_aliases(&self) -> BTreeMap<String, String>;

    /// Short info for a command or alias; `None` if unknown here.
    fn command_info(&self, command: &str) -> Option<Vec<String>>;

    /// True if `command` is a canonical name or an alias.
    fn has_command(&self, command: &str) -> bool;

    /// Per-command completers plus the alias map, not yet compiled.
    fn compile_completers(&self) -> SystemCompleter;

    /// Run a command. Callers check [`Registry::has_command`] first.
    fn execute(&self, session: &Session, command: &str, args: &[String]) -> Result<()>;

    /// Static description of a command, independent of the input line.
    fn command_description(&self, command: &str) -> CmdDesc;

    /// Add an alias for an existing command.
    fn alias(&mut self, alias: &str, command: &str) -> Result<()>;

    /// Remove an alias. Fails if `alias` is not one.
    fn unalias(&mut self, alias: &str) -> Result<()>;

    /// Rename a canonical command.
    fn rename(&mut self, command: &str, new_name: &str) -> Result<()>;
}

/// A named registry backed by a [`CommandTable`].
#[derive(Debug)]
pub struct TableRegistry {
    name: String,
    table: CommandTable,
}

impl TableRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: CommandTable::new(),
        }
    }

    /// Builder-style registration.
    pub fn with_command(mut self, command: Command) -> Result<Self> {
        self.table.register(command)?;
        Ok(self)
    }

    pub fn register(&mut self, command: Command) -> Result<()> {
        self.table.register(command)
    }
}

impl Registry for TableRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn command_names(&self) -> BTreeSet<String> {
        self.table.command_names()
    }

    fn command_aliases(&self) -> BTreeMap<String, String> {
        self.table.aliases()
    }

    fn command_info(&self, command: &str) -> Option<Vec<String>> {
        self.table.command_info(command)
    }

    fn has_command(&self, command: &str) -> bool {
        self.table.has_command(command)
    }

    fn compile_completers(&self) -> SystemCompleter {
        self.table.compile_completers()
    }

    fn execute(&self, session: &Session, command: &str, args: &[String]) -> Result<()> {
        self.table.execute(session, command, args)
    }

    fn command_description(&self, command: &str) -> CmdDesc {
        self.table.command_description(command)
    }

    fn alias(&mut self, alias: &str, command: &str) -> Result<()> {
        self.table.alias(alias, command)
    }

    fn unalias(&mut self, alias: &str) -> Result<()> {
        self.table.unalias(alias)
    }

    fn rename(&mut self, command: &str, new_name: &str) -> Result<()> {
        self.table.rename(command, new_name)
    }
}
