//! Command definitions and the per-registry command table.
//!
//! A [`CommandTable`] owns the canonical commands and the alias map of one
//! registry. Lookups always resolve aliases first. Executors return their
//! failure directly; there is no shared error slot to clear between calls.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use conch_types::{CmdDesc, ConchError, Result, StyledLine};

use crate::completer::{self, Completer};
use crate::session::Session;
use crate::system::SystemCompleter;

/// Input handed to a command executor.
pub struct CommandInput<'a> {
    /// Canonical command name (aliases are already resolved).
    pub command: &'a str,
    pub args: &'a [String],
    pub session: &'a Session,
}

type Executor = Box<dyn Fn(&CommandInput<'_>) -> Result<()>>;
type CompleterFactory = Box<dyn Fn(&str) -> Vec<Arc<dyn Completer>>>;

/// A named command: executor, completer factory, and help text.
pub struct Command {
    name: String,
    info: Vec<String>,
    executor: Executor,
    completer: CompleterFactory,
    description: Option<CmdDesc>,
}

impl Command {
    /// New command without argument completion.
    pub fn new(
        name: impl Into<String>,
        executor: impl Fn(&CommandInput<'_>) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            info: Vec::new(),
            executor: Box::new(executor),
            completer: Box::new(|_| vec![completer::null()]),
            description: None,
        }
    }

    /// Append a line of short info. The first line is the `help` summary.
    pub fn info(mut self, line: impl Into<String>) -> Self {
        self.info.push(line.into());
        self
    }

    /// Set the factory producing this command's argument completers.
    pub fn completer(
        mut self,
        factory: impl Fn(&str) -> Vec<Arc<dyn Completer>> + 'static,
    ) -> Self {
        self.completer = Box::new(factory);
        self
    }

    /// Static tool-tip description. Defaults to the info lines.
    pub fn description(mut self, desc: CmdDesc) -> Self {
        self.description = Some(desc);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Canonical commands plus the alias map of one registry.
///
/// Invariants: every alias target is a canonical command, and no token is
/// both a canonical name and an alias.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: BTreeMap<String, Command>,
    aliases: BTreeMap<String, String>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, command: Command) -> Result<()> {
        if self.aliases.contains_key(&command.name) {
            return Err(ConchError::Command(format!(
                "'{}' is already an alias",
                command.name
            )));
        }
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    /// Add or repoint `alias` to `command` (itself possibly an alias).
    pub fn alias(&mut self, alias: &str, command: &str) -> Result<()> {
        let target = self
            .canonical(command)
            .ok_or_else(|| ConchError::UnknownCommand(command.to_string()))?
            .to_string();
        if self.commands.contains_key(alias) {
            return Err(ConchError::Command(format!(
                "'{alias}' is already a command"
            )));
        }
        self.aliases.insert(alias.to_string(), target);
        Ok(())
    }

    /// Remove an alias.
    pub fn unalias(&mut self, alias: &str) -> Result<()> {
        self.aliases
            .remove(alias)
            .map(|_| ())
            .ok_or_else(|| ConchError::Command(format!("{alias}: not aliased")))
    }

    /// Rename a canonical command. Aliases pointing at it follow the rename.
    pub fn rename(&mut self, command: &str, new_name: &str) -> Result<()> {
        if self.has_command(new_name) {
            return Err(ConchError::Command(format!("'{new_name}' is already in use")));
        }
        let mut cmd = self
            .commands
            .remove(command)
            .ok_or_else(|| ConchError::UnknownCommand(command.to_string()))?;
        cmd.name = new_name.to_string();
        self.commands.insert(new_name.to_string(), cmd);
        for target in self.aliases.values_mut() {
            if target == command {
                *target = new_name.to_string();
            }
        }
        Ok(())
    }

    /// Resolve a token to its canonical command name.
    pub fn canonical(&self, token: &str) -> Option<&str> {
        if let Some((name, _)) = self.commands.get_key_value(token) {
            return Some(name);
        }
        self.aliases.get(token).map(String::as_str)
    }

    pub fn has_command(&self, token: &str) -> bool {
        self.commands.contains_key(token) || self.aliases.contains_key(token)
    }

    pub fn command_names(&self) -> BTreeSet<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.aliases.clone()
    }

    pub fn command_info(&self, token: &str) -> Option<Vec<String>> {
        let name = self.canonical(token)?;
        self.commands.get(name).map(|c| c.info.clone())
    }

    /// Every command's completers, plus the (unresolved) alias map.
    pub fn compile_completers(&self) -> SystemCompleter {
        let mut out = SystemCompleter::new();
        for (name, cmd) in &self.commands {
            out.add(name, (cmd.completer)(name));
        }
        out.add_aliases(&self.aliases);
        out
    }

    /// Run `token` with `args`. Callers check [`has_command`] first.
    ///
    /// [`has_command`]: CommandTable::has_command
    pub fn execute(&self, session: &Session, token: &str, args: &[String]) -> Result<()> {
        let cmd = self
            .canonical(token)
            .and_then(|name| self.commands.get(name))
            .ok_or_else(|| ConchError::UnknownCommand(token.to_string()))?;
        log::debug!("executing '{}' ({} args)", cmd.name, args.len());
        (cmd.executor)(&CommandInput {
            command: &cmd.name,
            args,
            session,
        })
    }

    /// Static description: the explicit one, else the info lines.
    pub fn command_description(&self, token: &str) -> CmdDesc {
        let Some(cmd) = self.canonical(token).and_then(|n| self.commands.get(n)) else {
            return CmdDesc::invalid();
        };
        match &cmd.description {
            Some(desc) => desc.clone(),
            None => CmdDesc::from_main(cmd.info.iter().map(StyledLine::plain).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn echo() -> Command {
        Command::new("echo", |input| {
            input.session.write_line(&input.args.join(" "))
        })
        .info("print arguments")
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn register_and_lookup() {
        let mut table = CommandTable::new();
        table.register(echo()).unwrap();
        assert!(table.has_command("echo"));
        assert!(!table.has_command("ech"));
        assert_eq!(table.canonical("echo"), Some("echo"));
        assert_eq!(table.command_info("echo").unwrap(), vec!["print arguments"]);
    }

    #[test]
    fn alias_resolves_everywhere() {
        let mut table = CommandTable::new();
        table.register(echo()).unwrap();
        table.alias("say", "echo").unwrap();
        assert!(table.has_command("say"));
        assert_eq!(table.canonical("say"), Some("echo"));
        assert_eq!(table.command_info("say"), table.command_info("echo"));
        assert!(!table.command_names().contains("say"));

        let (session, out) = Session::capture();
        table.execute(&session, "say", &args(&["hi"])).unwrap();
        table.execute(&session, "echo", &args(&["hi"])).unwrap();
        assert_eq!(out.contents(), "hi\nhi\n");
    }

    #[test]
    fn alias_of_alias_points_at_canonical() {
        let mut table = CommandTable::new();
        table.register(echo()).unwrap();
        table.alias("say", "echo").unwrap();
        table.alias("yell", "say").unwrap();
        assert_eq!(table.aliases()["yell"], "echo");
    }

    #[test]
    fn alias_to_unknown_rejected() {
        let mut table = CommandTable::new();
        let err = table.alias("x", "missing").unwrap_err();
        assert!(matches!(err, ConchError::UnknownCommand(_)));
    }

    #[test]
    fn alias_cannot_shadow_command() {
        let mut table = CommandTable::new();
        table.register(echo()).unwrap();
        table
            .register(Command::new("print", |_| Ok(())))
            .unwrap();
        assert!(table.alias("print", "echo").is_err());
        table.alias("say", "echo").unwrap();
        assert!(table.register(Command::new("say", |_| Ok(()))).is_err());
    }

    #[test]
    fn unalias_removes() {
        let mut table = CommandTable::new();
        table.register(echo()).unwrap();
        table.alias("say", "echo").unwrap();
        table.unalias("say").unwrap();
        assert!(!table.has_command("say"));
        assert!(table.unalias("say").is_err());
    }

    #[test]
    fn rename_moves_command_and_aliases() {
        let mut table = CommandTable::new();
        table.register(echo()).unwrap();
        table.alias("say", "echo").unwrap();
        table.rename("echo", "print").unwrap();
        assert!(!table.has_command("echo"));
        assert_eq!(table.canonical("say"), Some("print"));
        assert!(table.rename("print", "say").is_err());
        assert!(table.rename("missing", "other").is_err());
    }

    #[test]
    fn executor_failure_is_returned() {
        let mut table = CommandTable::new();
        table
            .register(Command::new("fail", |_| {
                Err(ConchError::Command("nope".into()))
            }))
            .unwrap();
        let (session, _) = Session::capture();
        let err = table.execute(&session, "fail", &[]).unwrap_err();
        assert_eq!(format!("{err}"), "command error: nope");
    }

    #[test]
    fn failure_does_not_leak_into_next_call() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut table = CommandTable::new();
        table
            .register(Command::new("flaky", move |_| {
                counter.set(counter.get() + 1);
                if counter.get() == 1 {
                    Err(ConchError::Command("first call fails".into()))
                } else {
                    Ok(())
                }
            }))
            .unwrap();
        let (session, _) = Session::capture();
        assert!(table.execute(&session, "flaky", &[]).is_err());
        assert!(table.execute(&session, "flaky", &[]).is_ok());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn executor_sees_canonical_name() {
        let mut table = CommandTable::new();
        table
            .register(Command::new("who", |input| {
                input.session.write_line(input.command)
            }))
            .unwrap();
        table.alias("w", "who").unwrap();
        let (session, out) = Session::capture();
        table.execute(&session, "w", &[]).unwrap();
        assert_eq!(out.contents(), "who\n");
    }

    #[test]
    fn unknown_execute_is_error() {
        let table = CommandTable::new();
        let (session, _) = Session::capture();
        assert!(matches!(
            table.execute(&session, "nope", &[]),
            Err(ConchError::UnknownCommand(_))
        ));
    }

    #[test]
    fn description_defaults_to_info() {
        let mut table = CommandTable::new();
        table.register(echo()).unwrap();
        let desc = table.command_description("echo");
        assert!(desc.is_valid());
        assert_eq!(desc.main_desc()[0].text, "print arguments");
        assert!(!table.command_description("missing").is_valid());
    }

    #[test]
    fn explicit_description_wins() {
        let mut table = CommandTable::new();
        table
            .register(echo().description(CmdDesc::from_args(conch_types::ArgDesc::names(&["text"]))))
            .unwrap();
        let desc = table.command_description("echo");
        assert!(desc.main_desc().is_empty());
        assert_eq!(desc.arg_desc()[0].name, "text");
    }
}
